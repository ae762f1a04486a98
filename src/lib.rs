pub mod browser;
pub mod config;
pub mod error;
pub mod extractors;
pub mod harvest;
pub mod materialize;
pub mod results;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::HarvestConfig;
pub use error::{AssetError, HarvestError};
pub use harvest::{Harvest, extract_all};
pub use materialize::{ContentHashTable, Materializer};
pub use results::PipelineResult;
