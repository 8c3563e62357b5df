use crate::adapters::backend::{single_row, BackendClient};
use crate::core::rating::summarize;
use crate::domain::model::{ListingId, NewReview, ProfileRow, RatingRow, RatingSummary, Review};
use crate::domain::ports::{ProfileStore, ReviewStore};
use crate::utils::error::{MarketError, Result};
use crate::utils::validation::validate_range;
use async_trait::async_trait;

const REVIEWS_TABLE: &str = "reviews";
const PROFILES_TABLE: &str = "profiles";
const REVIEW_SELECT: &str = "*,reviewer:profiles!reviews_reviewer_id_fkey(id,username,full_name,avatar_url)";

impl BackendClient {
    async fn reviews_where(&self, column: &'static str, value: String) -> Result<Vec<Review>> {
        let params = [
            ("select", REVIEW_SELECT.to_string()),
            (column, format!("eq.{}", value)),
            ("order", "created_at.desc".to_string()),
        ];
        self.select(REVIEWS_TABLE, &params).await
    }
}

#[async_trait]
impl ReviewStore for BackendClient {
    async fn reviews_for_listing(&self, listing_id: ListingId) -> Result<Vec<Review>> {
        self.reviews_where("skill_id", listing_id.to_string()).await
    }

    async fn reviews_by_user(&self, reviewer_id: &str) -> Result<Vec<Review>> {
        self.reviews_where("reviewer_id", reviewer_id.to_string()).await
    }

    async fn reviews_for_user(&self, reviewee_id: &str) -> Result<Vec<Review>> {
        self.reviews_where("reviewee_id", reviewee_id.to_string()).await
    }

    async fn create_review(&self, review: NewReview) -> Result<Review> {
        validate_range("rating", f64::from(review.rating), 1.0, 5.0)?;
        if review.reviewer_id == review.reviewee_id {
            return Err(MarketError::invalid_value(
                "reviewee_id",
                &review.reviewee_id,
                "You cannot review yourself",
            ));
        }

        let params = [("select", REVIEW_SELECT.to_string())];
        let rows: Vec<Review> = self.insert(REVIEWS_TABLE, &params, &review).await?;
        let created = single_row(rows, "Review", review.skill_id)?;

        tracing::info!("Review {} added to listing {}", created.id, created.skill_id);
        Ok(created)
    }

    async fn listing_rating(&self, listing_id: ListingId) -> Result<RatingSummary> {
        let params = [
            ("select", "rating".to_string()),
            ("skill_id", format!("eq.{}", listing_id)),
        ];
        let rows: Vec<RatingRow> = self.select(REVIEWS_TABLE, &params).await?;
        let ratings: Vec<u8> = rows.iter().map(|r| r.rating).collect();
        Ok(summarize(&ratings))
    }
}

#[async_trait]
impl ProfileStore for BackendClient {
    async fn fetch_profile(&self, user_id: &str) -> Result<ProfileRow> {
        let params = [("select", "*".to_string()), ("id", format!("eq.{}", user_id))];
        let rows: Vec<ProfileRow> = self.select(PROFILES_TABLE, &params).await?;
        single_row(rows, "Profile", user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::backend::tests::client_for;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_listing_rating_is_rounded_mean() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/rest/v1/reviews")
                .query_param("select", "rating")
                .query_param("skill_id", "eq.3");
            then.status(200)
                .json_body(serde_json::json!([{"rating": 5}, {"rating": 4}, {"rating": 5}]));
        });

        let summary = client_for(&server).listing_rating(3).await.unwrap();
        mock.assert();
        assert_eq!(summary.total_reviews, 3);
        assert_eq!(summary.average_rating, 4.7);
    }

    #[tokio::test]
    async fn test_out_of_range_rating_is_rejected_locally() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/rest/v1/reviews");
            then.status(201);
        });

        let review = NewReview {
            skill_id: 1,
            reviewer_id: "u-2".to_string(),
            reviewee_id: "u-1".to_string(),
            rating: 6,
            comment: None,
        };
        let err = client_for(&server).create_review(review).await.unwrap_err();

        mock.assert_hits(0);
        assert!(matches!(err, MarketError::InvalidValue { .. }));
    }

    #[tokio::test]
    async fn test_missing_profile_is_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/rest/v1/profiles")
                .query_param("id", "eq.ghost");
            then.status(200).json_body(serde_json::json!([]));
        });

        let err = client_for(&server).fetch_profile("ghost").await.unwrap_err();
        assert_eq!(err.user_friendly_message(), "Profile not found");
    }
}
