use crate::domain::model::{Category, Listing, SkillLevel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Inclusive price bounds. The range is active as soon as either bound is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PriceRange {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl PriceRange {
    pub fn is_active(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    pub fn contains(&self, amount: f64) -> bool {
        let min = self.min.unwrap_or(0.0);
        let max = self.max.unwrap_or(f64::INFINITY);
        amount >= min && amount <= max
    }
}

/// Every filter dimension the marketplace understands. The default value
/// filters nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct FilterSpec {
    pub query: Option<String>,
    pub categories: BTreeSet<Category>,
    pub universities: BTreeSet<String>,
    pub majors: BTreeSet<String>,
    pub skill_levels: BTreeSet<SkillLevel>,
    pub price: PriceRange,
    pub barter_only: bool,
    pub available_only: bool,
}

impl FilterSpec {
    /// Parse a spec from JSON, rejecting keys that are not filter dimensions.
    pub fn from_json(value: serde_json::Value) -> crate::utils::error::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query = Some(query.to_string());
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.categories.insert(category);
        self
    }

    pub fn with_university(mut self, university: &str) -> Self {
        self.universities.insert(university.to_string());
        self
    }

    pub fn with_major(mut self, major: &str) -> Self {
        self.majors.insert(major.to_string());
        self
    }

    pub fn with_skill_level(mut self, level: SkillLevel) -> Self {
        self.skill_levels.insert(level);
        self
    }

    pub fn with_price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.price = PriceRange { min, max };
        self
    }

    pub fn barter_only(mut self) -> Self {
        self.barter_only = true;
        self
    }

    pub fn available_only(mut self) -> Self {
        self.available_only = true;
        self
    }

    /// Trimmed, lower-cased query, or `None` when there is nothing to match.
    pub fn normalized_query(&self) -> Option<String> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    pub fn is_empty(&self) -> bool {
        self.normalized_query().is_none()
            && self.categories.is_empty()
            && self.universities.is_empty()
            && self.majors.is_empty()
            && self.skill_levels.is_empty()
            && !self.price.is_active()
            && !self.barter_only
            && !self.available_only
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        if let Some(query) = self.normalized_query() {
            if !matches_query(listing, &query) {
                return false;
            }
        }

        if !self.categories.is_empty() && !self.categories.contains(&listing.category) {
            return false;
        }

        if !self.universities.is_empty()
            && !matches_any_affiliation(&listing.creator.university, &self.universities)
        {
            return false;
        }

        if !self.majors.is_empty() && !matches_any_affiliation(&listing.creator.major, &self.majors)
        {
            return false;
        }

        if !self.skill_levels.is_empty() && !self.skill_levels.contains(&listing.level) {
            return false;
        }

        if self.price.is_active() {
            // 以物易物沒有金額，任何價格區間都排除
            match listing.price.amount() {
                Some(amount) if self.price.contains(amount) => {}
                _ => return false,
            }
        }

        if self.barter_only && !listing.price.is_barter() {
            return false;
        }

        if self.available_only && !listing.available {
            return false;
        }

        true
    }
}

fn matches_query(listing: &Listing, query: &str) -> bool {
    let contains = |field: &str| field.to_lowercase().contains(query);

    contains(&listing.title)
        || contains(&listing.description)
        || contains(listing.category.label())
        || contains(&listing.creator.name)
        || listing.tags.iter().any(|tag| contains(tag))
}

/// Selected affiliation values are slugs such as `uc-berkeley`; a hyphen
/// stands for a space.
fn matches_any_affiliation(field: &str, selected: &BTreeSet<String>) -> bool {
    let field = field.to_lowercase();
    selected
        .iter()
        .any(|value| field.contains(&value.to_lowercase().replace('-', " ")))
}

/// Keep the listings that satisfy every dimension of `spec`, in input order.
pub fn apply_filters(listings: &[Listing], spec: &FilterSpec) -> Vec<Listing> {
    if spec.is_empty() {
        return listings.to_vec();
    }

    listings
        .iter()
        .filter(|listing| spec.matches(listing))
        .cloned()
        .collect()
}
