use crate::domain::model::RatingSummary;

/// Arithmetic mean of review ratings rounded to one decimal place.
/// No reviews means a 0.0 average.
pub fn summarize(ratings: &[u8]) -> RatingSummary {
    if ratings.is_empty() {
        return RatingSummary {
            average_rating: 0.0,
            total_reviews: 0,
        };
    }

    let total: u32 = ratings.iter().map(|&r| u32::from(r)).sum();
    let mean = f64::from(total) / ratings.len() as f64;

    RatingSummary {
        average_rating: ((mean * 10.0).round() / 10.0) as f32,
        total_reviews: ratings.len() as u32,
    }
}
