pub mod config;
pub mod error;
pub mod ident;
pub mod types;

pub use config::Config;
pub use error::{HarvestError, Result};
pub use ident::{extract_id, is_platform_url, UNKNOWN_ID};
pub use types::*;
