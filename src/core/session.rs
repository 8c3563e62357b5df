use crate::core::filter::{FilterSpec, PriceRange};
use crate::core::pipeline::run_pipeline;
use crate::core::sort::SortKey;
use crate::domain::model::{Category, Listing, SkillLevel};
use serde::Serialize;
use std::collections::BTreeSet;

pub const DEFAULT_PAGE_SIZE: usize = 12;

/// One removable chip in the "active filters" row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ActiveFilter {
    Search(String),
    Category(Category),
    University(String),
    Major(String),
    SkillLevel(SkillLevel),
    PriceRange(PriceRange),
    BarterOnly,
    AvailableOnly,
}

impl ActiveFilter {
    pub fn label(&self) -> String {
        match self {
            ActiveFilter::Search(query) => format!("\"{}\"", query),
            ActiveFilter::Category(category) => category.label().to_string(),
            ActiveFilter::University(value) | ActiveFilter::Major(value) => value.clone(),
            ActiveFilter::SkillLevel(level) => level.label().to_string(),
            ActiveFilter::PriceRange(range) => format!(
                "${} - ${}",
                range.min.map_or_else(|| "0".to_string(), |v| v.to_string()),
                range.max.map_or_else(|| "∞".to_string(), |v| v.to_string()),
            ),
            ActiveFilter::BarterOnly => "Barter Only".to_string(),
            ActiveFilter::AvailableOnly => "Available Now".to_string(),
        }
    }
}

/// The visible slice of a browse result.
#[derive(Debug, Clone, Serialize)]
pub struct BrowsePage {
    pub items: Vec<Listing>,
    pub total: usize,
    pub has_more: bool,
}

/// Filter and sort state for one visit to the marketplace. Dropped on
/// navigation away; nothing here is persisted.
#[derive(Debug, Clone)]
pub struct BrowseSession {
    spec: FilterSpec,
    sort: SortKey,
    page_size: usize,
    visible: usize,
}

impl Default for BrowseSession {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl BrowseSession {
    pub fn new(page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            spec: FilterSpec::default(),
            sort: SortKey::default(),
            page_size,
            visible: page_size,
        }
    }

    pub fn with_spec(mut self, spec: FilterSpec, sort: SortKey) -> Self {
        self.spec = spec;
        self.sort = sort;
        self
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    fn reset_window(&mut self) {
        self.visible = self.page_size;
    }

    pub fn set_query(&mut self, query: &str) {
        let query = query.trim();
        self.spec.query = (!query.is_empty()).then(|| query.to_string());
        self.reset_window();
    }

    pub fn toggle_category(&mut self, category: Category) {
        toggle(&mut self.spec.categories, category);
        self.reset_window();
    }

    pub fn toggle_university(&mut self, university: &str) {
        toggle(&mut self.spec.universities, university.to_string());
        self.reset_window();
    }

    pub fn toggle_major(&mut self, major: &str) {
        toggle(&mut self.spec.majors, major.to_string());
        self.reset_window();
    }

    pub fn toggle_skill_level(&mut self, level: SkillLevel) {
        toggle(&mut self.spec.skill_levels, level);
        self.reset_window();
    }

    pub fn set_price_range(&mut self, min: Option<f64>, max: Option<f64>) {
        self.spec.price = PriceRange { min, max };
        self.reset_window();
    }

    pub fn set_barter_only(&mut self, on: bool) {
        self.spec.barter_only = on;
        self.reset_window();
    }

    pub fn set_available_only(&mut self, on: bool) {
        self.spec.available_only = on;
        self.reset_window();
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.sort = sort;
        self.reset_window();
    }

    /// Drop every filter. The sort order is kept.
    pub fn clear_all(&mut self) {
        self.spec = FilterSpec::default();
        self.reset_window();
    }

    pub fn remove_filter(&mut self, filter: &ActiveFilter) {
        match filter {
            ActiveFilter::Search(_) => self.spec.query = None,
            ActiveFilter::Category(category) => {
                self.spec.categories.remove(category);
            }
            ActiveFilter::University(value) => {
                self.spec.universities.remove(value);
            }
            ActiveFilter::Major(value) => {
                self.spec.majors.remove(value);
            }
            ActiveFilter::SkillLevel(level) => {
                self.spec.skill_levels.remove(level);
            }
            ActiveFilter::PriceRange(_) => self.spec.price = PriceRange::default(),
            ActiveFilter::BarterOnly => self.spec.barter_only = false,
            ActiveFilter::AvailableOnly => self.spec.available_only = false,
        }
        self.reset_window();
    }

    pub fn active_filters(&self) -> Vec<ActiveFilter> {
        let mut chips = Vec::new();

        if let Some(query) = self.spec.query.as_deref().map(str::trim) {
            if !query.is_empty() {
                chips.push(ActiveFilter::Search(query.to_string()));
            }
        }
        chips.extend(self.spec.categories.iter().copied().map(ActiveFilter::Category));
        chips.extend(self.spec.universities.iter().cloned().map(ActiveFilter::University));
        chips.extend(self.spec.majors.iter().cloned().map(ActiveFilter::Major));
        chips.extend(self.spec.skill_levels.iter().copied().map(ActiveFilter::SkillLevel));
        if self.spec.price.is_active() {
            chips.push(ActiveFilter::PriceRange(self.spec.price));
        }
        if self.spec.barter_only {
            chips.push(ActiveFilter::BarterOnly);
        }
        if self.spec.available_only {
            chips.push(ActiveFilter::AvailableOnly);
        }

        chips
    }

    /// Grow the visible window by one page.
    pub fn load_more(&mut self) {
        self.visible += self.page_size;
    }

    pub fn view(&self, listings: &[Listing]) -> BrowsePage {
        let results = run_pipeline(listings, &self.spec, self.sort);
        let total = results.len();
        let items: Vec<Listing> = results.into_iter().take(self.visible).collect();

        BrowsePage {
            has_more: items.len() < total,
            items,
            total,
        }
    }
}

fn toggle<T: Ord>(set: &mut BTreeSet<T>, value: T) {
    if !set.remove(&value) {
        set.insert(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::sample_listings;

    #[test]
    fn test_new_session_shows_everything() {
        let session = BrowseSession::default();
        let page = session.view(&sample_listings());
        assert_eq!(page.total, 6);
        assert_eq!(page.items.len(), 6);
        assert!(!page.has_more);
        assert!(session.active_filters().is_empty());
    }

    #[test]
    fn test_toggle_twice_removes() {
        let mut session = BrowseSession::default();
        session.toggle_category(Category::Design);
        assert_eq!(session.view(&sample_listings()).total, 1);
        session.toggle_category(Category::Design);
        assert_eq!(session.view(&sample_listings()).total, 6);
    }

    #[test]
    fn test_paging_window() {
        let mut session = BrowseSession::new(4);
        let listings = sample_listings();

        let first = session.view(&listings);
        assert_eq!(first.items.len(), 4);
        assert!(first.has_more);

        session.load_more();
        let second = session.view(&listings);
        assert_eq!(second.items.len(), 6);
        assert!(!second.has_more);

        session.set_sort(SortKey::Rating);
        assert_eq!(session.view(&listings).items.len(), 4);
    }

    #[test]
    fn test_active_filter_chips_and_labels() {
        let mut session = BrowseSession::default();
        session.set_query("guitar");
        session.toggle_university("uc-berkeley");
        session.toggle_major("Computer Science");
        session.set_price_range(Some(10.0), None);
        session.set_available_only(true);

        let labels: Vec<String> = session.active_filters().iter().map(|c| c.label()).collect();
        assert_eq!(
            labels,
            vec!["\"guitar\"", "uc-berkeley", "Computer Science", "$10 - $∞", "Available Now"]
        );
        assert_eq!(ActiveFilter::SkillLevel(SkillLevel::AllLevels).label(), "All Levels");
    }

    #[test]
    fn test_remove_filter_and_clear_all() {
        let mut session = BrowseSession::default();
        session.set_barter_only(true);
        session.toggle_category(Category::Language);
        session.set_sort(SortKey::Newest);

        session.remove_filter(&ActiveFilter::BarterOnly);
        assert_eq!(session.active_filters(), vec![ActiveFilter::Category(Category::Language)]);

        session.clear_all();
        assert!(session.active_filters().is_empty());
        assert_eq!(session.sort(), SortKey::Newest);
    }

    #[test]
    fn test_empty_query_clears_search() {
        let mut session = BrowseSession::default();
        session.set_query("react");
        session.set_query("  ");
        assert!(session.spec().query.is_none());
    }
}
