use crate::core::filter::{apply_filters, FilterSpec};
use crate::domain::model::{
    Category, Creator, Listing, ListingId, ListingUpdate, NewListing, Price, PriceUnit, SkillLevel,
};
use crate::domain::ports::ListingStore;
use crate::utils::error::{MarketError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredListing {
    listing: Listing,
    owner_id: String,
    active: bool,
}

/// Listing store backed by a vector. Used for offline browsing and tests; it
/// filters with the same rules as the client pipeline.
#[derive(Debug)]
pub struct InMemoryListingStore {
    listings: RwLock<Vec<StoredListing>>,
}

impl InMemoryListingStore {
    pub fn new(listings: Vec<Listing>) -> Self {
        let listings = listings
            .into_iter()
            .map(|listing| StoredListing {
                owner_id: listing.creator.id.clone(),
                listing,
                active: true,
            })
            .collect();
        Self {
            listings: RwLock::new(listings),
        }
    }

    pub fn with_sample_data() -> Self {
        Self::new(sample_listings())
    }

    fn apply_update(listing: &mut Listing, update: ListingUpdate) -> Result<()> {
        if let Some(title) = update.title {
            listing.title = title;
        }
        if let Some(description) = update.description {
            listing.description = description;
        }
        if let Some(category) = update.category {
            listing.category = category;
        }
        if let Some(tags) = update.tags {
            listing.tags = tags;
        }
        if let Some(price) = update.price {
            let unit = update.price_unit.unwrap_or(PriceUnit::Hour);
            listing.price = match price {
                None => Price::Barter,
                Some(amount) if amount == 0.0 => Price::Free,
                Some(amount) => Price::fixed(amount, unit)?,
            };
        }
        if let Some(available) = update.is_available {
            listing.available = available;
        }
        Ok(())
    }
}

#[async_trait]
impl ListingStore for InMemoryListingStore {
    async fn fetch_listings(&self, spec: &FilterSpec) -> Result<Vec<Listing>> {
        let listings = self.listings.read().await;
        let active: Vec<Listing> = listings
            .iter()
            .filter(|stored| stored.active)
            .map(|stored| stored.listing.clone())
            .collect();
        Ok(apply_filters(&active, spec))
    }

    async fn fetch_listing(&self, id: ListingId) -> Result<Listing> {
        let listings = self.listings.read().await;
        listings
            .iter()
            .find(|stored| stored.listing.id == id)
            .map(|stored| stored.listing.clone())
            .ok_or_else(|| MarketError::not_found("Skill", id))
    }

    async fn listings_by_owner(&self, owner_id: &str) -> Result<Vec<Listing>> {
        let listings = self.listings.read().await;
        let mut owned: Vec<Listing> = listings
            .iter()
            .filter(|stored| stored.owner_id == owner_id)
            .map(|stored| stored.listing.clone())
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn create_listing(&self, new: NewListing) -> Result<Listing> {
        let mut listings = self.listings.write().await;
        let id = listings.iter().map(|s| s.listing.id).max().unwrap_or(0) + 1;
        let price = match new.price {
            None => Price::Barter,
            Some(amount) if amount == 0.0 => Price::Free,
            Some(amount) => Price::fixed(amount, new.price_unit.unwrap_or(PriceUnit::Hour))?,
        };

        let listing = Listing {
            id,
            title: new.title,
            description: new.description,
            category: new.category,
            tags: new.tags,
            price,
            level: new.level,
            creator: Creator {
                id: new.owner_id.clone(),
                name: "Unknown".to_string(),
                university: String::new(),
                major: String::new(),
                reputation: 0.0,
                skills_offered: 0,
                exchanges_completed: 0,
            },
            rating: 0.0,
            review_count: 0,
            available: new.is_available,
            created_at: Utc::now(),
        };

        tracing::debug!("Created in-memory listing {}", id);
        listings.push(StoredListing {
            listing: listing.clone(),
            owner_id: new.owner_id,
            active: true,
        });
        Ok(listing)
    }

    async fn update_listing(&self, id: ListingId, update: ListingUpdate) -> Result<Listing> {
        let mut listings = self.listings.write().await;
        let stored = listings
            .iter_mut()
            .find(|stored| stored.listing.id == id)
            .ok_or_else(|| MarketError::not_found("Skill", id))?;

        if let Some(active) = update.is_active {
            stored.active = active;
        }
        Self::apply_update(&mut stored.listing, update)?;
        Ok(stored.listing.clone())
    }

    async fn deactivate_listing(&self, id: ListingId) -> Result<()> {
        self.update_listing(
            id,
            ListingUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .map(|_| ())
    }
}

fn seeded_at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 1, 9, 0, 0).single().unwrap_or_default()
        + Duration::days(i64::from(day))
}

fn creator(id: &str, name: &str, university: &str, major: &str, reputation: f32, offered: u32) -> Creator {
    Creator {
        id: id.to_string(),
        name: name.to_string(),
        university: university.to_string(),
        major: major.to_string(),
        reputation,
        skills_offered: offered,
        exchanges_completed: 0,
    }
}

fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|t| t.to_string()).collect()
}

fn hourly(amount: f64) -> Price {
    Price::Fixed {
        amount,
        unit: PriceUnit::Hour,
    }
}

/// The starter catalogue shown when no backend is configured.
pub fn sample_listings() -> Vec<Listing> {
    vec![
        Listing {
            id: 1,
            title: "React Development Bootcamp".to_string(),
            description: "Learn modern React development with hooks, context, and best practices. \
                          Perfect for beginners to intermediate developers."
                .to_string(),
            category: Category::Programming,
            tags: tags(&["React", "JavaScript", "Frontend", "Web Development"]),
            price: hourly(25.0),
            level: SkillLevel::Intermediate,
            creator: creator("u-1", "Sarah Chen", "Stanford University", "Computer Science", 4.9, 8),
            rating: 4.8,
            review_count: 24,
            available: true,
            created_at: seeded_at(1),
        },
        Listing {
            id: 2,
            title: "UI/UX Design Fundamentals".to_string(),
            description: "Master the principles of user interface and user experience design. \
                          Learn Figma, prototyping, and design thinking."
                .to_string(),
            category: Category::Design,
            tags: tags(&["UI/UX", "Figma", "Design", "Prototyping"]),
            price: hourly(30.0),
            level: SkillLevel::Beginner,
            creator: creator("u-2", "Mike Rodriguez", "MIT", "Design", 4.8, 5),
            rating: 4.9,
            review_count: 18,
            available: true,
            created_at: seeded_at(2),
        },
        Listing {
            id: 3,
            title: "Spanish Conversation Practice".to_string(),
            description: "Native Spanish speaker offering conversation practice sessions. \
                          Improve your fluency and confidence."
                .to_string(),
            category: Category::Language,
            tags: tags(&["Spanish", "Conversation", "Language Exchange"]),
            price: Price::Barter,
            level: SkillLevel::AllLevels,
            creator: creator("u-3", "Maria Garcia", "UC Berkeley", "International Studies", 4.7, 3),
            rating: 4.7,
            review_count: 31,
            available: false,
            created_at: seeded_at(3),
        },
        Listing {
            id: 4,
            title: "Digital Marketing Strategy".to_string(),
            description: "Learn effective digital marketing strategies including SEO, social media \
                          marketing, and content creation."
                .to_string(),
            category: Category::Marketing,
            tags: tags(&["Marketing", "SEO", "Social Media", "Content"]),
            price: hourly(35.0),
            level: SkillLevel::Intermediate,
            creator: creator("u-4", "Alex Johnson", "Harvard University", "Business Administration", 4.6, 6),
            rating: 4.6,
            review_count: 22,
            available: true,
            created_at: seeded_at(4),
        },
        Listing {
            id: 5,
            title: "Guitar Lessons for Beginners".to_string(),
            description: "Learn to play guitar from scratch. Covers basic chords, strumming \
                          patterns, and popular songs."
                .to_string(),
            category: Category::Music,
            tags: tags(&["Guitar", "Music", "Beginner", "Acoustic"]),
            price: hourly(20.0),
            level: SkillLevel::Beginner,
            creator: creator("u-5", "David Kim", "Caltech", "Music", 4.8, 4),
            rating: 4.8,
            review_count: 15,
            available: true,
            created_at: seeded_at(5),
        },
        Listing {
            id: 6,
            title: "Photography Basics".to_string(),
            description: "Learn the fundamentals of photography including composition, lighting, \
                          and camera settings."
                .to_string(),
            category: Category::Photography,
            tags: tags(&["Photography", "Camera", "Composition", "Lighting"]),
            price: hourly(28.0),
            level: SkillLevel::Beginner,
            creator: creator("u-6", "Emma Wilson", "NYU", "Visual Arts", 4.5, 7),
            rating: 4.5,
            review_count: 12,
            available: true,
            created_at: seeded_at(6),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deactivated_listing_is_hidden_from_browse() {
        let store = InMemoryListingStore::with_sample_data();
        store.deactivate_listing(4).await.unwrap();

        let listings = store.fetch_listings(&FilterSpec::default()).await.unwrap();
        assert_eq!(listings.len(), 5);
        assert!(listings.iter().all(|l| l.id != 4));

        // 直接讀取仍然可以取得
        assert_eq!(store.fetch_listing(4).await.unwrap().id, 4);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let store = InMemoryListingStore::with_sample_data();
        let err = store.fetch_listing(404).await.unwrap_err();
        assert!(matches!(err, MarketError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_create_and_update_listing() {
        let store = InMemoryListingStore::with_sample_data();
        let created = store
            .create_listing(NewListing::new("u-9", "Chess Openings", Category::Tutoring, Price::Free))
            .await
            .unwrap();
        assert_eq!(created.id, 7);
        assert_eq!(created.price, Price::Free);

        let updated = store
            .update_listing(7, ListingUpdate::default().with_price(Price::Barter))
            .await
            .unwrap();
        assert_eq!(updated.price, Price::Barter);

        let owned = store.listings_by_owner("u-9").await.unwrap();
        assert_eq!(owned.len(), 1);
    }

    #[test]
    fn test_sample_data_shape() {
        let listings = sample_listings();
        assert_eq!(listings.len(), 6);
        assert_eq!(listings.iter().filter(|l| l.price.is_barter()).count(), 1);
    }
}
