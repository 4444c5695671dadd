pub mod assembly;
pub mod config;
pub mod dates;
pub mod error;
pub mod filter;
pub mod reports;
pub mod service;
pub mod source;
pub mod types;
