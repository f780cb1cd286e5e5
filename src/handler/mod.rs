pub mod quote_request_handler;
