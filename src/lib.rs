pub mod climate;
pub mod config;
pub mod error;
pub mod output;
pub mod render;
pub mod report;
pub mod store;
