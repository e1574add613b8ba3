use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmploymentType {
    #[serde(rename = "Part Time")]
    PartTime,
    #[serde(rename = "Full Time")]
    FullTime,
}

/// One listing item as it appears on a catalog page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSummary {
    pub address: String,
    pub link: Url,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetail {
    #[serde(rename = "jobLink")]
    pub link: Url,
    pub title: String,
    pub description: String,
    pub hourly_rate: String, // empty when no rate was found
    pub types: Vec<EmploymentType>,
}

/// An address paired with the job found there.
///
/// `jobs` always holds exactly one entry: records that share an address are
/// not merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub address: String,
    pub jobs: Vec<JobDetail>,
}

impl JobRecord {
    pub fn single(address: String, detail: JobDetail) -> Self {
        Self {
            address,
            jobs: vec![detail],
        }
    }
}

/// Records in crawl order. Append-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet(Vec<JobRecord>);

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: JobRecord) {
        self.0.push(record);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn records(&self) -> &[JobRecord] {
        &self.0
    }
}
