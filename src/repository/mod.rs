pub mod quote_request_repo;
pub mod repository_error;
