pub mod config;
pub mod diagnostics;
pub mod error;
pub mod sample_format;
pub mod state;
