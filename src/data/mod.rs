pub mod fetcher;
pub mod merge;
pub mod socrata;
pub mod types;
