// Domain layer - Pure data types and formatting, no I/O
pub mod error;
pub mod report;
pub mod table;
pub mod time_format;
pub mod window;
