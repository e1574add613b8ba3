use std::time::Duration;

// --- Run constants ---

pub const CATALOG_BASE: &str = "https://jobs.mchire.com/jobs";
pub const PAGE_SIZE: u32 = 10;
/// Roughly 5,000 listings at ten per page.
pub const PAGE_COUNT: u32 = 509;
pub const MAX_ATTEMPTS: u32 = 3;

pub const CATALOG_WAIT: Duration = Duration::from_secs(10);
pub const DETAIL_WAIT: Duration = Duration::from_secs(20);

/// One page of the paginated catalog, 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPage {
    pub index: u32,
    pub url: String,
}

impl CatalogPage {
    pub fn new(base: &str, page_size: u32, index: u32) -> Self {
        let url = format!(
            "{}?page_size={}&page_number={}&sort_by=headline&sort_order=ASC",
            base, page_size, index
        );
        Self { index, url }
    }
}

/// Structural selectors for the catalog and detail pages.
#[derive(Debug, Clone)]
pub struct Selectors {
    pub listing_item: String,
    pub item_address: String,
    pub item_title: String,
    pub detail_fragment: String,
    pub detail_heading: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            listing_item: "ul.results-list.front > li.results-list__item".to_string(),
            item_address: "span.results-list__item-street--label".to_string(),
            item_title: "a.results-list__item-title".to_string(),
            detail_fragment: "p".to_string(),
            detail_heading: "h1._6c7f10".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub catalog_base: String,
    pub page_size: u32,
    pub page_count: u32,
    pub catalog_wait: Duration,
    pub detail_wait: Duration,
    pub attempts: u32,
    pub selectors: Selectors,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            catalog_base: CATALOG_BASE.to_string(),
            page_size: PAGE_SIZE,
            page_count: PAGE_COUNT,
            catalog_wait: CATALOG_WAIT,
            detail_wait: DETAIL_WAIT,
            attempts: MAX_ATTEMPTS,
            selectors: Selectors::default(),
        }
    }
}

impl CrawlConfig {
    /// Catalog pages in traversal order.
    pub fn pages(&self) -> impl Iterator<Item = CatalogPage> + '_ {
        (1..=self.page_count).map(|i| CatalogPage::new(&self.catalog_base, self.page_size, i))
    }

    pub fn expected_listings(&self) -> u32 {
        self.page_count * self.page_size
    }
}
