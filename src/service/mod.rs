pub mod quote_request_service;
