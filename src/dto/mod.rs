pub mod quote_request_dto;
