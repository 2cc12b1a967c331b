//! Course catalog integration for the room usage aggregator.
//!
//! Crawls the university schedule of classes and turns every listed meeting
//! into a [`UsageRecord`]:
//! - Fetch the department list from the catalog index page
//! - Fetch each department's schedule page, a bounded number at a time
//! - Scan the pages for meeting days, times, and locations
//!
//! The crawler never touches a [`ru_core::Registry`]. Callers apply the
//! returned records themselves, from a single writer.

mod parse;

use std::time::Duration;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::{JoinError, JoinSet};

use ru_core::UsageRecord;

pub use parse::{parse_departments, parse_schedule};

const INDEX_PATH: &str = "index.jsp";
const SCHEDULE_PATH: &str = "soc.jsp";

/// Width of the department field the schedule search expects.
const DEPARTMENT_FIELD_WIDTH: usize = 6;

/// Catalog client errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog settings are unusable.
    #[error("invalid catalog config: {reason}")]
    InvalidConfig { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The catalog answered with a non-success status.
    #[error("catalog returned status {status} for {url}")]
    Status { url: String, status: u16 },
    /// The index page listed no departments.
    #[error("no departments found on the catalog index page")]
    NoDepartments,
}

/// Where and how to crawl the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Catalog root, e.g. `http://classes.iastate.edu`.
    pub base_url: String,
    /// Term code, e.g. `S2013`.
    pub term: String,
    /// Maximum number of department pages fetched at once.
    pub concurrency: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "http://classes.iastate.edu".to_string(),
            term: "S2013".to_string(),
            concurrency: 8,
            timeout_secs: 30,
        }
    }
}

/// Outcome of a full catalog crawl.
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Usage records from every page that was fetched.
    pub records: Vec<UsageRecord>,
    /// Number of department pages fetched successfully.
    pub pages: usize,
    /// Departments whose page could not be fetched, sorted.
    pub failed: Vec<String>,
}

/// Course catalog HTTP client.
///
/// # Thread Safety
///
/// The client is cheap to clone and safe to share across threads. Each clone
/// shares the underlying HTTP connection pool.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    config: CatalogConfig,
}

impl CatalogClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or term is blank, if concurrency is
    /// zero, or if the HTTP client fails to build.
    pub fn new(config: CatalogConfig) -> Result<Self, CatalogError> {
        if config.base_url.trim().is_empty() {
            return Err(CatalogError::InvalidConfig {
                reason: "base URL cannot be empty",
            });
        }
        if config.term.trim().is_empty() {
            return Err(CatalogError::InvalidConfig {
                reason: "term cannot be empty",
            });
        }
        if config.concurrency == 0 {
            return Err(CatalogError::InvalidConfig {
                reason: "concurrency must be at least 1",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(CatalogError::ClientBuild)?;

        Ok(Self { http, config })
    }

    /// Fetches the department codes listed on the catalog index page.
    pub async fn fetch_departments(&self) -> Result<Vec<String>, CatalogError> {
        let body = fetch_text(self.index_request()).await?;
        let departments = parse_departments(&body);
        if departments.is_empty() {
            return Err(CatalogError::NoDepartments);
        }
        tracing::debug!(count = departments.len(), "found departments");
        Ok(departments)
    }

    /// Fetches the raw schedule page for one department.
    pub async fn fetch_department(&self, department: &str) -> Result<String, CatalogError> {
        fetch_text(self.department_request(department)).await
    }

    /// Crawls every department and returns the usage records found.
    ///
    /// Pages are fetched with at most `concurrency` requests in flight and
    /// scanned in parallel. A department that fails to load is logged and
    /// listed in [`CrawlReport::failed`] without aborting the crawl.
    pub async fn crawl(&self) -> Result<CrawlReport, CatalogError> {
        let departments = self.fetch_departments().await?;
        let limit = self.config.concurrency;
        tracing::info!(departments = departments.len(), limit, "crawling catalog");

        let mut pending = departments.into_iter();
        let mut tasks = JoinSet::new();
        let mut fetched = Fetched::default();

        loop {
            while tasks.len() < limit {
                let Some(department) = pending.next() else {
                    break;
                };
                let client = self.clone();
                tasks.spawn(async move {
                    let result = client.fetch_department(&department).await;
                    (department, result)
                });
            }

            let Some(joined) = tasks.join_next().await else {
                break;
            };
            fetched.record(joined);
        }

        let Fetched {
            mut pages,
            mut failed,
        } = fetched;
        pages.sort_by(|a, b| a.0.cmp(&b.0));
        failed.sort();

        let records: Vec<UsageRecord> = pages
            .par_iter()
            .flat_map_iter(|(department, body)| {
                let records = parse_schedule(body);
                tracing::debug!(%department, records = records.len(), "scanned schedule page");
                records
            })
            .collect();

        Ok(CrawlReport {
            records,
            pages: pages.len(),
            failed,
        })
    }

    fn index_request(&self) -> reqwest::RequestBuilder {
        self.http.get(self.url(INDEX_PATH))
    }

    fn department_request(&self, department: &str) -> reqwest::RequestBuilder {
        let department = format!("{department:<width$}", width = DEPARTMENT_FIELD_WIDTH);
        let term = self.config.term.as_str();
        self.http.get(self.url(SCHEDULE_PATH)).query(&[
            ("term", term),
            ("dept", department.as_str()),
            ("term2", term),
            ("dept2", department.as_str()),
            ("course", ""),
            // Search window: every meeting between 6:00am and 11:55pm
            ("shour", "06"),
            ("sminute", "00"),
            ("sampm", "am"),
            ("ehour", "11"),
            ("eminute", "55"),
            ("eampm", "pm"),
            ("credit", " "),
            ("instructor", ""),
            ("title", ""),
            ("edreq", ""),
            ("spclcourse", ""),
            ("partterm", "2006-01-012006-12-31"),
            ("smonth", "01"),
            ("sday", "01"),
            ("emonth", "12"),
            ("eday", "31"),
        ])
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }
}

/// Department pages collected while a crawl is in progress.
#[derive(Debug, Default)]
struct Fetched {
    pages: Vec<(String, String)>,
    failed: Vec<String>,
}

impl Fetched {
    /// Files one finished fetch task. A task that panicked is logged and
    /// dropped; its department name is lost with it.
    fn record(&mut self, joined: Result<(String, Result<String, CatalogError>), JoinError>) {
        match joined {
            Ok((department, Ok(body))) => self.pages.push((department, body)),
            Ok((department, Err(e))) => {
                tracing::warn!(%department, error = %e, "failed to fetch department");
                self.failed.push(department);
            }
            Err(e) => tracing::warn!(error = %e, "department fetch task failed"),
        }
    }
}

async fn fetch_text(request: reqwest::RequestBuilder) -> Result<String, CatalogError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(CatalogError::Status {
            url: response.url().to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.text().await?)
}
