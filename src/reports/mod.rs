pub mod formatters;
pub mod generator;

pub use formatters::{display_name, lifespan, JsonFormatter, ReportFormatter, TextFormatter};
pub use generator::ReportGenerator;
