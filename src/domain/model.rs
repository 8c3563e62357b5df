use crate::utils::error::{MarketError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type ListingId = i64;
pub type UserId = String;

/// Marketplace category. The slug is what the backend stores and what filter
/// selections use; the label is what people see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Programming,
    Design,
    Marketing,
    Writing,
    Language,
    Music,
    Tutoring,
    Business,
    Photography,
    Other,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Programming,
        Category::Design,
        Category::Marketing,
        Category::Writing,
        Category::Language,
        Category::Music,
        Category::Tutoring,
        Category::Business,
        Category::Photography,
        Category::Other,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Category::Programming => "programming",
            Category::Design => "design",
            Category::Marketing => "marketing",
            Category::Writing => "writing",
            Category::Language => "language",
            Category::Music => "music",
            Category::Tutoring => "tutoring",
            Category::Business => "business",
            Category::Photography => "photography",
            Category::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Programming => "Programming",
            Category::Design => "Design",
            Category::Marketing => "Marketing",
            Category::Writing => "Writing",
            Category::Language => "Language",
            Category::Music => "Music",
            Category::Tutoring => "Tutoring",
            Category::Business => "Business",
            Category::Photography => "Photography",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.slug() == wanted)
            .ok_or_else(|| {
                MarketError::invalid_value(
                    "category",
                    s,
                    format!(
                        "Unknown category. Valid categories: {}",
                        Category::ALL.map(|c| c.slug()).join(", ")
                    ),
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
    AllLevels,
}

impl SkillLevel {
    pub fn slug(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "beginner",
            SkillLevel::Intermediate => "intermediate",
            SkillLevel::Advanced => "advanced",
            SkillLevel::Expert => "expert",
            SkillLevel::AllLevels => "all-levels",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "Beginner",
            SkillLevel::Intermediate => "Intermediate",
            SkillLevel::Advanced => "Advanced",
            SkillLevel::Expert => "Expert",
            SkillLevel::AllLevels => "All Levels",
        }
    }
}

impl FromStr for SkillLevel {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace(' ', "-").as_str() {
            "beginner" => Ok(SkillLevel::Beginner),
            "intermediate" => Ok(SkillLevel::Intermediate),
            "advanced" => Ok(SkillLevel::Advanced),
            "expert" => Ok(SkillLevel::Expert),
            "all-levels" => Ok(SkillLevel::AllLevels),
            _ => Err(MarketError::invalid_value(
                "level",
                s,
                "Valid levels: beginner, intermediate, advanced, expert, all-levels",
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceUnit {
    Hour,
    Session,
    Project,
}

impl fmt::Display for PriceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self {
            PriceUnit::Hour => "hour",
            PriceUnit::Session => "session",
            PriceUnit::Project => "project",
        };
        f.write_str(unit)
    }
}

/// How a listing is paid for. Exactly one of these holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase", try_from = "PriceRepr")]
pub enum Price {
    Fixed { amount: f64, unit: PriceUnit },
    Barter,
    Free,
}

/// Wire shape of `Price`, checked through `Price::fixed` before use.
#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum PriceRepr {
    Fixed { amount: f64, unit: PriceUnit },
    Barter,
    Free,
}

impl TryFrom<PriceRepr> for Price {
    type Error = MarketError;

    fn try_from(repr: PriceRepr) -> Result<Self> {
        match repr {
            PriceRepr::Fixed { amount, unit } => Price::fixed(amount, unit),
            PriceRepr::Barter => Ok(Price::Barter),
            PriceRepr::Free => Ok(Price::Free),
        }
    }
}

impl Price {
    pub fn fixed(amount: f64, unit: PriceUnit) -> Result<Self> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(MarketError::invalid_value(
                "price",
                amount,
                "Fixed price must be a positive amount",
            ));
        }
        Ok(Price::Fixed { amount, unit })
    }

    /// Numeric price for range checks and price sorting. Free counts as 0,
    /// barter has none.
    pub fn amount(&self) -> Option<f64> {
        match self {
            Price::Fixed { amount, .. } => Some(*amount),
            Price::Free => Some(0.0),
            Price::Barter => None,
        }
    }

    pub fn is_barter(&self) -> bool {
        matches!(self, Price::Barter)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Price::Fixed { amount, unit } => write!(f, "${}/{}", amount, unit),
            Price::Barter => f.write_str("Barter only"),
            Price::Free => f.write_str("Free"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creator {
    pub id: UserId,
    pub name: String,
    pub university: String,
    pub major: String,
    pub reputation: f32,
    pub skills_offered: u32,
    pub exchanges_completed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub price: Price,
    pub level: SkillLevel,
    pub creator: Creator,
    pub rating: f32,
    pub review_count: u32,
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub average_rating: f32,
    pub total_reviews: u32,
}

// ---- 後端資料表的資料形狀 ----

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: UserId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub university: Option<String>,
    #[serde(default)]
    pub major: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub reputation_points: Option<f32>,
    #[serde(default)]
    pub skills_offered: Option<u32>,
    #[serde(default)]
    pub exchanges_completed: Option<u32>,
}

impl ProfileRow {
    pub fn display_name(&self) -> String {
        self.full_name
            .clone()
            .or_else(|| self.username.clone())
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

impl From<ProfileRow> for Creator {
    fn from(row: ProfileRow) -> Self {
        Creator {
            name: row.display_name(),
            id: row.id,
            university: row.university.unwrap_or_default(),
            major: row.major.unwrap_or_default(),
            reputation: row.reputation_points.unwrap_or(0.0),
            skills_offered: row.skills_offered.unwrap_or(0),
            exchanges_completed: row.exchanges_completed.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingRow {
    pub rating: u8,
}

/// A row of the `skills` table with the owner profile and review ratings embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingRow {
    pub id: ListingId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub price: Option<f64>,
    #[serde(default)]
    pub price_unit: Option<PriceUnit>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub owner: Option<ProfileRow>,
    #[serde(default)]
    pub reviews: Vec<RatingRow>,
}

fn default_true() -> bool {
    true
}

impl TryFrom<ListingRow> for Listing {
    type Error = MarketError;

    fn try_from(row: ListingRow) -> Result<Self> {
        let category: Category = row.category.parse()?;
        let unit = row.price_unit.unwrap_or(PriceUnit::Hour);
        let price = match row.price {
            None => Price::Barter,
            Some(amount) if amount == 0.0 => Price::Free,
            Some(amount) => Price::fixed(amount, unit)?,
        };
        let level = match row.level.as_deref() {
            Some(level) => level.parse()?,
            None => SkillLevel::AllLevels,
        };
        let ratings: Vec<u8> = row.reviews.iter().map(|r| r.rating).collect();
        let summary = crate::core::rating::summarize(&ratings);
        let creator = row
            .owner
            .map(Creator::from)
            .unwrap_or_else(|| Creator::from(ProfileRow {
                id: row.owner_id.clone(),
                ..ProfileRow::default()
            }));

        Ok(Listing {
            id: row.id,
            title: row.title,
            description: row.description,
            category,
            tags: row.tags,
            price,
            level,
            creator,
            rating: summary.average_rating,
            review_count: summary.total_reviews,
            available: row.is_available,
            created_at: row.created_at,
        })
    }
}

/// Insert payload for the `skills` table.
#[derive(Debug, Clone, Serialize)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub price: Option<f64>,
    pub price_unit: Option<PriceUnit>,
    pub level: SkillLevel,
    pub owner_id: UserId,
    pub is_available: bool,
}

impl NewListing {
    pub fn new(owner_id: &str, title: &str, category: Category, price: Price) -> Self {
        let (price, price_unit) = price_columns(&price);
        Self {
            title: title.to_string(),
            description: String::new(),
            category,
            tags: Vec::new(),
            price,
            price_unit,
            level: SkillLevel::AllLevels,
            owner_id: owner_id.to_string(),
            is_available: true,
        }
    }
}

/// Partial update for the `skills` table; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// `Some(None)` clears the price, turning the listing into barter-only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_unit: Option<PriceUnit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ListingUpdate {
    pub fn with_price(mut self, price: Price) -> Self {
        let (amount, unit) = price_columns(&price);
        self.price = Some(amount);
        self.price_unit = unit;
        self
    }
}

fn price_columns(price: &Price) -> (Option<f64>, Option<PriceUnit>) {
    match price {
        Price::Fixed { amount, unit } => (Some(*amount), Some(*unit)),
        Price::Free => (Some(0.0), None),
        Price::Barter => (None, None),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub skill_id: ListingId,
    pub reviewer_id: UserId,
    pub reviewee_id: UserId,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub reviewer: Option<ProfileRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewReview {
    pub skill_id: ListingId,
    pub reviewer_id: UserId,
    pub reviewee_id: UserId,
    pub rating: u8,
    pub comment: Option<String>,
}

/// A file stored in object storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredObject {
    pub path: String,
    pub url: String,
}

/// Uniform `{success, data | error}` shape handed to the view layer.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> From<Result<T>> for ServiceResponse<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => ServiceResponse {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(e) => {
                tracing::debug!("Converting error into service response: {}", e);
                ServiceResponse {
                    success: false,
                    data: None,
                    error: Some(e.user_friendly_message()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(price: Option<f64>) -> ListingRow {
        serde_json::from_value(serde_json::json!({
            "id": 7,
            "title": "Guitar Lessons",
            "category": "music",
            "price": price,
            "owner_id": "u-5",
            "created_at": "2024-05-01T10:00:00Z",
            "reviews": [{"rating": 5}, {"rating": 4}, {"rating": 4}]
        }))
        .unwrap()
    }

    #[test]
    fn test_price_column_maps_to_price_variant() {
        let barter = Listing::try_from(row(None)).unwrap();
        assert_eq!(barter.price, Price::Barter);

        let free = Listing::try_from(row(Some(0.0))).unwrap();
        assert_eq!(free.price, Price::Free);

        let fixed = Listing::try_from(row(Some(20.0))).unwrap();
        assert_eq!(
            fixed.price,
            Price::Fixed {
                amount: 20.0,
                unit: PriceUnit::Hour
            }
        );
    }

    #[test]
    fn test_row_aggregates_review_ratings() {
        let listing = Listing::try_from(row(Some(20.0))).unwrap();
        assert_eq!(listing.review_count, 3);
        assert_eq!(listing.rating, 4.3);
        assert_eq!(listing.creator.id, "u-5");
        assert_eq!(listing.creator.name, "Unknown");
    }

    #[test]
    fn test_negative_price_row_is_rejected() {
        assert!(Listing::try_from(row(Some(-5.0))).is_err());
    }

    #[test]
    fn test_price_deserialize_checks_amount() {
        let negative = serde_json::json!({"kind": "fixed", "amount": -5.0, "unit": "hour"});
        assert!(serde_json::from_value::<Price>(negative).is_err());

        let zero = serde_json::json!({"kind": "fixed", "amount": 0.0, "unit": "session"});
        assert!(serde_json::from_value::<Price>(zero).is_err());

        let fixed = Price::fixed(25.0, PriceUnit::Hour).unwrap();
        let parsed: Price = serde_json::from_value(serde_json::to_value(fixed).unwrap()).unwrap();
        assert_eq!(parsed, fixed);
        assert_eq!(
            serde_json::from_value::<Price>(serde_json::json!({"kind": "barter"})).unwrap(),
            Price::Barter
        );
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        assert!("cooking".parse::<Category>().is_err());
        assert_eq!("Design".parse::<Category>().unwrap(), Category::Design);
    }

    #[test]
    fn test_update_serializes_only_set_fields() {
        let update = ListingUpdate {
            title: Some("New title".to_string()),
            ..Default::default()
        }
        .with_price(Price::Barter);

        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["title"], "New title");
        assert!(json["price"].is_null());
        assert!(json.get("price").is_some());
        assert!(json.get("description").is_none());
    }

    #[test]
    fn test_service_response_from_error() {
        let response: ServiceResponse<()> =
            Err(MarketError::not_found("Skill", 99)).into();
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("Skill not found"));
    }
}
