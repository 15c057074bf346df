pub mod contracts;
pub mod models;
pub mod tracer;
pub mod utils;
