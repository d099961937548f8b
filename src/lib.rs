pub mod analytics;
pub mod config;
pub mod dashboard;
pub mod ingest;
pub mod models;
pub mod source;
#[cfg(test)]
pub mod test_helpers;
