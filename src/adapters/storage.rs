use crate::adapters::backend::BackendClient;
use crate::domain::model::{ListingId, StoredObject};
use crate::domain::ports::ObjectStorage;
use crate::utils::error::{BackendService, MarketError, Result};
use async_trait::async_trait;
use std::path::Path;

pub fn avatar_path(user_id: &str, extension: &str) -> String {
    format!("avatars/{}/avatar.{}", user_id, extension)
}

pub fn listing_image_path(listing_id: ListingId, index: usize, extension: &str) -> String {
    format!("skill-images/{}/image_{}.{}", listing_id, index, extension)
}

fn file_extension(file_name: &str) -> Result<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(str::to_lowercase)
        .ok_or_else(|| MarketError::invalid_value("file_name", file_name, "File must have an extension"))
}

fn content_type(extension: &str) -> &'static str {
    match extension {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

impl BackendClient {
    /// Upload (or overwrite) `path` in the configured bucket.
    async fn upload_object(&self, path: &str, extension: &str, data: Vec<u8>) -> Result<StoredObject> {
        let url = self.storage_url(&format!("object/{}/{}", self.bucket, path));
        tracing::debug!("Uploading {} bytes to {}", data.len(), url);

        let request = self
            .client
            .post(&url)
            .header("content-type", content_type(extension))
            .header("cache-control", format!("max-age={}", self.cache_control_seconds))
            .header("x-upsert", "true")
            .body(data);
        self.send(BackendService::Storage, request).await?;

        let stored = StoredObject {
            path: path.to_string(),
            url: self.public_url(&self.bucket, path),
        };
        tracing::info!("Stored {}", stored.url);
        Ok(stored)
    }
}

#[async_trait]
impl ObjectStorage for BackendClient {
    async fn upload_avatar(&self, user_id: &str, file_name: &str, data: Vec<u8>) -> Result<StoredObject> {
        let extension = file_extension(file_name)?;
        self.upload_object(&avatar_path(user_id, &extension), &extension, data)
            .await
    }

    async fn upload_listing_image(
        &self,
        listing_id: ListingId,
        file_name: &str,
        index: usize,
        data: Vec<u8>,
    ) -> Result<StoredObject> {
        let extension = file_extension(file_name)?;
        self.upload_object(&listing_image_path(listing_id, index, &extension), &extension, data)
            .await
    }

    async fn delete_file(&self, bucket: &str, path: &str) -> Result<()> {
        let url = self.storage_url(&format!("object/{}", bucket));
        let request = self
            .client
            .delete(&url)
            .json(&serde_json::json!({ "prefixes": [path] }));
        self.send(BackendService::Storage, request).await?;

        tracing::info!("Deleted {}/{}", bucket, path);
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.storage_url(&format!("object/public/{}/{}", bucket, path))
    }
}
