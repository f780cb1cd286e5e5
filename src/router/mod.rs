pub mod quote_request_router;
