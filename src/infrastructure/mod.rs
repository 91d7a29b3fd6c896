// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod delimited_source;
pub mod http_response;
pub mod spreadsheet_source;
pub mod upload_source;
