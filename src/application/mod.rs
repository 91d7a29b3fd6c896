// Application layer - Use cases and the rolling peak engine
pub mod peak_service;
pub mod rolling_peak;
pub mod table_source;
