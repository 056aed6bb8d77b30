pub mod constants;
pub mod error;
pub mod file_utils;
pub mod schemas;
pub mod telemetry;
pub mod trace_context;
pub mod url_utils;

#[cfg(test)]
mod unit_tests;
