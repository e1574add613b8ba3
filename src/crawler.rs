use log::{error, info, warn};
use scraper::ElementRef;
use url::Url;

use crate::browser::{parse_selector, rendered_text, PageSnapshot, RenderingSession};
use crate::config::{CatalogPage, CrawlConfig, Selectors};
use crate::error::{CrawlError, SessionError};
use crate::extract::{scan_fragments, DetailFields};
use crate::models::{JobDetail, JobRecord, ListingSummary, ResultSet};
use crate::retry::{Retry, Verdict};

/// One crawl over the catalog: owns the session and the results.
pub struct CrawlRun<S: RenderingSession> {
    session: S,
    config: CrawlConfig,
    results: ResultSet,
}

impl<S: RenderingSession> CrawlRun<S> {
    pub fn new(session: S, config: CrawlConfig) -> Self {
        Self {
            session,
            config,
            results: ResultSet::new(),
        }
    }

    pub fn run(&mut self) {
        info!(
            "Starting web scrape of {} McDonalds job listing pages, with {} job listings",
            self.config.page_count,
            self.config.expected_listings()
        );

        let pages: Vec<CatalogPage> = self.config.pages().collect();
        for page in &pages {
            if let Err(e) = self.crawl_page(page) {
                error!("Skipping page {}: {}", page.index, e);
            }
        }

        info!(
            "Completed scraping McDonald's job listings. {} jobs found",
            self.results.len()
        );
    }

    /// Crawls one catalog page, appending a record per listing item.
    /// Returns the number of records added.
    pub fn crawl_page(&mut self, page: &CatalogPage) -> Result<usize, CrawlError> {
        if self.session.has_secondary() {
            error!("Secondary context still open before page {}; closing it", page.index);
            if let Err(e) = self.session.close_secondary() {
                warn!("Could not close stale secondary context: {}", e);
            }
        }

        let snapshot = self.load_catalog(&page.url)?;
        let listings = parse_listings(&snapshot, &self.config.selectors)?;

        let mut added = 0;
        for listing in listings {
            let fields = self.fetch_detail(listing.link.as_str());
            let detail = JobDetail {
                link: listing.link,
                title: listing.title,
                description: fields.description,
                hourly_rate: fields.hourly_rate,
                types: fields.types,
            };
            self.results.push(JobRecord::single(listing.address, detail));
            added += 1;
        }
        Ok(added)
    }

    fn load_catalog(&mut self, url: &str) -> Result<PageSnapshot, CrawlError> {
        let session = &mut self.session;
        let selector = self.config.selectors.listing_item.as_str();
        let wait = self.config.catalog_wait;
        let label = format!("Loading page {}:", url);
        let mut tried = 0;

        Retry::new(self.config.attempts, &label)
            .run_classified(
                |attempt| {
                    tried = attempt;
                    session.open(url)?;
                    session.wait_for(selector, wait)?;
                    session.snapshot()
                },
                |e| match e {
                    SessionError::Selector { .. } => Verdict::Abort,
                    _ => Verdict::Retry,
                },
            )
            .map_err(|e| CrawlError::page_load(url, tried, e))
    }

    /// Retrieves description, rate and types for one detail page. Exhausted
    /// retries give empty fields rather than an error.
    pub fn fetch_detail(&mut self, url: &str) -> DetailFields {
        let label = format!("Job details at {}:", url);
        let retry = Retry::new(self.config.attempts, &label);

        match retry.run(|_| self.detail_attempt(url)) {
            Ok(fields) => fields,
            Err(e) => {
                error!(
                    "Failed to get job details after {} attempts: {}",
                    retry.attempts(),
                    e
                );
                DetailFields::default()
            }
        }
    }

    fn detail_attempt(&mut self, url: &str) -> Result<DetailFields, CrawlError> {
        let outcome = self
            .session
            .open_secondary(url)
            .and_then(|_| self.read_detail())
            .map_err(|source| CrawlError::DetailTimeout {
                url: url.to_string(),
                source,
            });

        if let Err(e) = self.session.close_secondary() {
            warn!("Could not close detail tab for {}: {}", url, e);
        }
        outcome
    }

    fn read_detail(&self) -> Result<DetailFields, SessionError> {
        let selectors = &self.config.selectors;
        self.session
            .wait_for(&selectors.detail_fragment, self.config.detail_wait)?;

        let snapshot = self.session.snapshot()?;
        let mut fields = scan_fragments(&snapshot.texts(&selectors.detail_fragment)?);

        match snapshot.first_text(&selectors.detail_heading) {
            Ok(Some(heading)) => fields.apply_heading(&heading),
            Ok(None) => warn!("Error parsing job details: no heading on {}", snapshot.url()),
            Err(e) => warn!("Error parsing job details: {}", e),
        }
        Ok(fields)
    }

    pub fn into_results(self) -> ResultSet {
        self.results
    }
}

/// Extracts one summary per listing item, skipping items with a missing
/// field.
fn parse_listings(
    snapshot: &PageSnapshot,
    selectors: &Selectors,
) -> Result<Vec<ListingSummary>, CrawlError> {
    let base = Url::parse(snapshot.url())
        .map_err(|e| CrawlError::field("page url", format!("{}: {}", snapshot.url(), e)))?;
    let items = snapshot
        .elements(&selectors.listing_item)
        .map_err(|e| CrawlError::field("listing items", e.to_string()))?;

    let mut listings = Vec::with_capacity(items.len());
    for item in items {
        match parse_listing(item, &base, selectors) {
            Ok(listing) => listings.push(listing),
            Err(e) => warn!("Missing data in job listing: {}", e),
        }
    }
    Ok(listings)
}

fn parse_listing(
    item: ElementRef<'_>,
    base: &Url,
    selectors: &Selectors,
) -> Result<ListingSummary, CrawlError> {
    let address = rendered_text(first_match(item, &selectors.item_address, "address")?);
    let header = first_match(item, &selectors.item_title, "title")?;
    let href = header
        .value()
        .attr("href")
        .ok_or_else(|| CrawlError::field("link", "title has no href"))?;
    let link = base
        .join(href)
        .map_err(|e| CrawlError::field("link", format!("{}: {}", href, e)))?;

    Ok(ListingSummary {
        address,
        link,
        title: rendered_text(header),
    })
}

fn first_match<'a>(
    item: ElementRef<'a>,
    css: &str,
    field: &'static str,
) -> Result<ElementRef<'a>, CrawlError> {
    let selector = parse_selector(css).map_err(|e| CrawlError::field(field, e.to_string()))?;
    item.select(&selector)
        .next()
        .ok_or_else(|| CrawlError::field(field, format!("nothing matches `{}`", css)))
}
