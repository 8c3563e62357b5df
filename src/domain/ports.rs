use crate::core::filter::FilterSpec;
use crate::domain::model::{
    Listing, ListingId, ListingUpdate, NewListing, NewReview, ProfileRow, RatingSummary, Review,
    StoredObject,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Read/write access to skill listings.
///
/// `fetch_listings` may narrow results on the server, but it must never drop a
/// listing that `core::filter::apply_filters` would keep for the same spec.
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn fetch_listings(&self, spec: &FilterSpec) -> Result<Vec<Listing>>;
    async fn fetch_listing(&self, id: ListingId) -> Result<Listing>;
    async fn listings_by_owner(&self, owner_id: &str) -> Result<Vec<Listing>>;
    async fn create_listing(&self, listing: NewListing) -> Result<Listing>;
    async fn update_listing(&self, id: ListingId, update: ListingUpdate) -> Result<Listing>;
    /// Soft delete: the row stays, `is_active` is cleared.
    async fn deactivate_listing(&self, id: ListingId) -> Result<()>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn reviews_for_listing(&self, listing_id: ListingId) -> Result<Vec<Review>>;
    async fn reviews_by_user(&self, reviewer_id: &str) -> Result<Vec<Review>>;
    async fn reviews_for_user(&self, reviewee_id: &str) -> Result<Vec<Review>>;
    async fn create_review(&self, review: NewReview) -> Result<Review>;
    async fn listing_rating(&self, listing_id: ListingId) -> Result<RatingSummary>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn fetch_profile(&self, user_id: &str) -> Result<ProfileRow>;
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload_avatar(&self, user_id: &str, file_name: &str, data: Vec<u8>)
        -> Result<StoredObject>;
    async fn upload_listing_image(
        &self,
        listing_id: ListingId,
        file_name: &str,
        index: usize,
        data: Vec<u8>,
    ) -> Result<StoredObject>;
    async fn delete_file(&self, bucket: &str, path: &str) -> Result<()>;
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// Settings the backend client needs, whatever file or flag they came from.
pub trait BackendSettings: Send + Sync {
    fn backend_url(&self) -> &str;
    fn anon_key(&self) -> &str;
    fn timeout_seconds(&self) -> u64;
    fn storage_bucket(&self) -> &str;
    fn cache_control_seconds(&self) -> u64;
}
