use crate::core::filter::{apply_filters, FilterSpec};
use crate::core::sort::{apply_sort, SortKey};
use crate::domain::model::Listing;

/// Filter, then sort. Pure: the same inputs always give the same output, and
/// running it again over its own output changes nothing.
pub fn run_pipeline(listings: &[Listing], spec: &FilterSpec, key: SortKey) -> Vec<Listing> {
    let filtered = apply_filters(listings, spec);
    tracing::debug!(
        "Pipeline kept {} of {} listings, sorting by {}",
        filtered.len(),
        listings.len(),
        key
    );
    apply_sort(&filtered, key)
}
