use crate::adapters::backend::{single_row, BackendClient};
use crate::core::filter::{apply_filters, FilterSpec};
use crate::domain::model::{Listing, ListingId, ListingRow, ListingUpdate, NewListing};
use crate::domain::ports::ListingStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::Utc;

const SKILLS_TABLE: &str = "skills";

/// Listing columns plus the owner profile and review ratings embedded.
pub const LISTING_SELECT: &str = "*,owner:profiles!skills_owner_id_fkey(id,username,full_name,avatar_url,university,major,reputation_points),reviews(rating)";

/// Query parameters for the part of `spec` the server can evaluate with the
/// same meaning as the client. Everything else stays client-side.
pub fn pushdown_params(spec: &FilterSpec) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("select", LISTING_SELECT.to_string()),
        ("is_active", "eq.true".to_string()),
    ];

    if !spec.categories.is_empty() {
        let slugs: Vec<&str> = spec.categories.iter().map(|c| c.slug()).collect();
        params.push(("category", format!("in.({})", slugs.join(","))));
    }

    // 免費是 0 元，不是 null，所以 is.null 只會留下以物易物
    if spec.barter_only {
        params.push(("price", "is.null".to_string()));
    }

    if spec.available_only {
        params.push(("is_available", "eq.true".to_string()));
    }

    params.push(("order", "created_at.desc".to_string()));
    params
}

/// Decode rows. A row with an unknown category, level or price is logged and
/// skipped; the rest still come through.
fn into_listings(rows: Vec<ListingRow>) -> Vec<Listing> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            match Listing::try_from(row) {
                Ok(listing) => Some(listing),
                Err(e) => {
                    tracing::warn!("Skipping listing {}: {}", id, e);
                    None
                }
            }
        })
        .collect()
}

#[async_trait]
impl ListingStore for BackendClient {
    async fn fetch_listings(&self, spec: &FilterSpec) -> Result<Vec<Listing>> {
        let rows: Vec<ListingRow> = self.select(SKILLS_TABLE, &pushdown_params(spec)).await?;
        let fetched = rows.len();
        let listings = apply_filters(&into_listings(rows), spec);

        tracing::info!(
            "Fetched {} listings, {} after client-side filtering",
            fetched,
            listings.len()
        );
        Ok(listings)
    }

    async fn fetch_listing(&self, id: ListingId) -> Result<Listing> {
        let params = [
            ("select", LISTING_SELECT.to_string()),
            ("id", format!("eq.{}", id)),
        ];
        let rows: Vec<ListingRow> = self.select(SKILLS_TABLE, &params).await?;
        Listing::try_from(single_row(rows, "Skill", id)?)
    }

    async fn listings_by_owner(&self, owner_id: &str) -> Result<Vec<Listing>> {
        let params = [
            ("select", LISTING_SELECT.to_string()),
            ("owner_id", format!("eq.{}", owner_id)),
            ("order", "created_at.desc".to_string()),
        ];
        let rows: Vec<ListingRow> = self.select(SKILLS_TABLE, &params).await?;
        Ok(into_listings(rows))
    }

    async fn create_listing(&self, listing: NewListing) -> Result<Listing> {
        let params = [("select", LISTING_SELECT.to_string())];
        let rows: Vec<ListingRow> = self.insert(SKILLS_TABLE, &params, &listing).await?;
        let created = Listing::try_from(single_row(rows, "Skill", &listing.title)?)?;

        tracing::info!("Created listing {} ({})", created.id, created.title);
        Ok(created)
    }

    async fn update_listing(&self, id: ListingId, mut update: ListingUpdate) -> Result<Listing> {
        update.updated_at = Some(Utc::now());
        let params = [
            ("select", LISTING_SELECT.to_string()),
            ("id", format!("eq.{}", id)),
        ];
        let rows: Vec<ListingRow> = self.update(SKILLS_TABLE, &params, &update).await?;
        Listing::try_from(single_row(rows, "Skill", id)?)
    }

    async fn deactivate_listing(&self, id: ListingId) -> Result<()> {
        let update = ListingUpdate {
            is_active: Some(false),
            ..Default::default()
        };
        self.update_listing(id, update).await?;
        tracing::info!("Deactivated listing {}", id);
        Ok(())
    }
}
