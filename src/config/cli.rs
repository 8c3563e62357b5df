use crate::core::filter::FilterSpec;
use crate::core::sort::SortKey;
use crate::domain::model::{Category, SkillLevel};
use crate::utils::error::{MarketError, Result};
use crate::utils::validation::{validate_positive_number, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "skillswap")]
#[command(about = "Browse the SkillSwap student skill marketplace")]
pub struct CliConfig {
    #[arg(long, default_value = "skillswap.toml")]
    pub config: String,

    #[arg(long, help = "Browse the built-in sample listings instead of the backend")]
    pub offline: bool,

    #[arg(long, short)]
    pub query: Option<String>,

    #[arg(long, value_delimiter = ',')]
    pub category: Vec<Category>,

    #[arg(long, value_delimiter = ',')]
    pub university: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    pub major: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    pub level: Vec<SkillLevel>,

    #[arg(long)]
    pub min_price: Option<f64>,

    #[arg(long)]
    pub max_price: Option<f64>,

    #[arg(long)]
    pub barter_only: bool,

    #[arg(long)]
    pub available_only: bool,

    /// relevance, newest, price-low, price-high, rating, popular
    #[arg(long)]
    pub sort: Option<SortKey>,

    #[arg(long, default_value = "1", help = "Number of pages to show")]
    pub page: usize,

    #[arg(long, help = "Print the result as JSON")]
    pub json: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl CliConfig {
    pub fn filter_spec(&self) -> FilterSpec {
        let mut spec = FilterSpec {
            query: self.query.clone(),
            categories: self.category.iter().copied().collect(),
            universities: self.university.iter().cloned().collect(),
            majors: self.major.iter().cloned().collect(),
            skill_levels: self.level.iter().copied().collect(),
            ..FilterSpec::default()
        };
        if self.min_price.is_some() || self.max_price.is_some() {
            spec = spec.with_price_range(self.min_price, self.max_price);
        }
        spec.barter_only = self.barter_only;
        spec.available_only = self.available_only;
        spec
    }

    /// Sort from the command line, falling back to `default`.
    pub fn sort_key(&self, default: SortKey) -> SortKey {
        self.sort.unwrap_or(default)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_positive_number("page", self.page, 1)?;

        for (field, value) in [("min_price", self.min_price), ("max_price", self.max_price)] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(MarketError::invalid_value(field, v, "Price cannot be negative"));
                }
            }
        }

        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(MarketError::ConfigValidation {
                    field: "min_price".to_string(),
                    message: format!("Minimum price {} is above maximum price {}", min, max),
                });
            }
        }

        Ok(())
    }
}
