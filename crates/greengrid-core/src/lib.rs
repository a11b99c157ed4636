pub mod config;
pub mod types;

pub use config::GreenGridConfig;
pub use types::*;
