pub mod account;
pub mod availability;
pub mod conversations;
pub mod feed;
pub mod filter;
pub mod pipeline;
pub mod rating;
pub mod session;
pub mod sort;

pub use crate::domain::model::{Listing, Price};
pub use crate::domain::ports::{BackendSettings, ListingStore, ObjectStorage, ReviewStore};
pub use crate::utils::error::Result;
