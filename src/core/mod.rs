pub mod chunker;
pub mod config;
pub mod error;
pub mod progress;
pub mod state;
