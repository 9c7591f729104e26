pub mod delay;
pub mod download;
pub mod http;
