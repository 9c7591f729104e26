pub mod config;
pub mod models;
pub mod parsers;
pub mod pipeline;
pub mod reconcile;
pub mod scrapers;
pub mod storage;
pub mod utils;
