pub mod core;
pub mod driver;
pub mod telemetry;
