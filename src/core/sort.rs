use crate::domain::model::Listing;
use crate::utils::error::{MarketError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Source order, untouched.
    #[default]
    Relevance,
    Newest,
    #[serde(rename = "price-low")]
    PriceLowToHigh,
    #[serde(rename = "price-high")]
    PriceHighToLow,
    Rating,
    Popular,
}

impl SortKey {
    pub const ALL: [SortKey; 6] = [
        SortKey::Relevance,
        SortKey::Newest,
        SortKey::PriceLowToHigh,
        SortKey::PriceHighToLow,
        SortKey::Rating,
        SortKey::Popular,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            SortKey::Relevance => "relevance",
            SortKey::Newest => "newest",
            SortKey::PriceLowToHigh => "price-low",
            SortKey::PriceHighToLow => "price-high",
            SortKey::Rating => "rating",
            SortKey::Popular => "popular",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Relevance => "Most Relevant",
            SortKey::Newest => "Newest First",
            SortKey::PriceLowToHigh => "Price: Low to High",
            SortKey::PriceHighToLow => "Price: High to Low",
            SortKey::Rating => "Highest Rated",
            SortKey::Popular => "Most Popular",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for SortKey {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        SortKey::ALL
            .iter()
            .copied()
            .find(|key| key.id() == s.trim())
            .ok_or_else(|| {
                MarketError::invalid_value(
                    "sort",
                    s,
                    format!(
                        "Unknown sort key. Valid keys: {}",
                        SortKey::ALL.map(|k| k.id()).join(", ")
                    ),
                )
            })
    }
}

/// Barter listings go last in both directions; priced listings (free = 0)
/// compare by amount.
fn compare_price(a: &Listing, b: &Listing, descending: bool) -> Ordering {
    match (a.price.amount(), b.price.amount()) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) if descending => y.total_cmp(&x),
        (Some(x), Some(y)) => x.total_cmp(&y),
    }
}

/// Stable reordering of `listings` by `key`.
pub fn apply_sort(listings: &[Listing], key: SortKey) -> Vec<Listing> {
    let mut sorted = listings.to_vec();

    match key {
        SortKey::Relevance => {}
        SortKey::Newest => sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::PriceLowToHigh => sorted.sort_by(|a, b| compare_price(a, b, false)),
        SortKey::PriceHighToLow => sorted.sort_by(|a, b| compare_price(a, b, true)),
        SortKey::Rating => sorted.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
        SortKey::Popular => sorted.sort_by(|a, b| b.review_count.cmp(&a.review_count)),
    }

    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::sample_listings;
    use crate::domain::model::{Price, PriceUnit};

    fn ids(listings: &[Listing]) -> Vec<i64> {
        listings.iter().map(|l| l.id).collect()
    }

    fn priced(amount: f64) -> Price {
        Price::fixed(amount, PriceUnit::Hour).unwrap()
    }

    /// $25, $30, free, $20 and one barter listing.
    fn price_fixture() -> Vec<Listing> {
        let base = sample_listings();
        let prices = [priced(25.0), priced(30.0), Price::Free, priced(20.0), Price::Barter];
        prices
            .iter()
            .enumerate()
            .map(|(i, price)| {
                let mut listing = base[i].clone();
                listing.price = *price;
                listing
            })
            .collect()
    }

    #[test]
    fn test_price_ascending_puts_barter_last() {
        let sorted = apply_sort(&price_fixture(), SortKey::PriceLowToHigh);
        let amounts: Vec<Option<f64>> = sorted.iter().map(|l| l.price.amount()).collect();
        assert_eq!(
            amounts,
            vec![Some(0.0), Some(20.0), Some(25.0), Some(30.0), None]
        );
    }

    #[test]
    fn test_price_descending_still_puts_barter_last() {
        let mut listings = price_fixture();
        listings.swap(0, 4);
        let sorted = apply_sort(&listings, SortKey::PriceHighToLow);
        let amounts: Vec<Option<f64>> = sorted.iter().map(|l| l.price.amount()).collect();
        assert_eq!(
            amounts,
            vec![Some(30.0), Some(25.0), Some(20.0), Some(0.0), None]
        );
    }

    #[test]
    fn test_barter_listings_keep_relative_order() {
        let mut listings = sample_listings();
        listings[0].price = Price::Barter;
        for key in [SortKey::PriceLowToHigh, SortKey::PriceHighToLow] {
            let sorted = apply_sort(&listings, key);
            let tail: Vec<i64> = ids(&sorted).into_iter().rev().take(2).collect();
            assert_eq!(tail, vec![3, 1]);
        }
    }

    #[test]
    fn test_relevance_preserves_source_order() {
        let listings = sample_listings();
        assert_eq!(apply_sort(&listings, SortKey::Relevance), listings);
    }

    #[test]
    fn test_newest_first() {
        let sorted = apply_sort(&sample_listings(), SortKey::Newest);
        assert_eq!(ids(&sorted), vec![6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_newest_is_stable_for_equal_timestamps() {
        let mut listings = sample_listings();
        let stamp = listings[0].created_at;
        for listing in listings.iter_mut() {
            listing.created_at = stamp;
        }
        assert_eq!(ids(&apply_sort(&listings, SortKey::Newest)), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_rating_and_popularity() {
        let listings = sample_listings();
        assert_eq!(ids(&apply_sort(&listings, SortKey::Rating)), vec![2, 1, 5, 3, 4, 6]);
        assert_eq!(ids(&apply_sort(&listings, SortKey::Popular)), vec![3, 1, 4, 2, 5, 6]);
    }

    #[test]
    fn test_sort_is_a_permutation() {
        let listings = sample_listings();
        for key in SortKey::ALL {
            let sorted = apply_sort(&listings, key);
            assert_eq!(sorted.len(), listings.len());
            let mut a = ids(&sorted);
            let mut b = ids(&listings);
            a.sort();
            b.sort();
            assert_eq!(a, b, "{} changed the multiset", key);
        }
    }

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!("price-low".parse::<SortKey>().unwrap(), SortKey::PriceLowToHigh);
        assert_eq!("popular".parse::<SortKey>().unwrap(), SortKey::Popular);
        assert!("cheapest".parse::<SortKey>().is_err());
    }
}
