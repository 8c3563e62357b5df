pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{BackendClient, InMemoryListingStore};
pub use config::toml_config::TomlConfig;
pub use core::feed::{ListingFeed, LoadState};
pub use core::filter::FilterSpec;
pub use core::session::BrowseSession;
pub use core::sort::SortKey;
pub use domain::model::{Listing, ServiceResponse};
pub use utils::error::{MarketError, Result};
