pub mod data_uri;
pub mod log;
pub mod response;
