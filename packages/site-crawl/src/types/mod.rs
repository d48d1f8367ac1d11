pub mod config;
pub mod raw;
pub mod record;
pub mod request;
pub mod result;
pub mod status;
