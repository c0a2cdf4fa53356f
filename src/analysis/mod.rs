pub mod change;
pub mod filter;
pub mod pipeline;
pub mod summary;
pub mod types;
