pub mod config;
pub mod decisions;
pub mod generate;
pub mod output;
pub mod policies;
pub mod store;
