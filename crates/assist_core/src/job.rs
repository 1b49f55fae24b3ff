use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// A job posting as read from a job site's page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JobPosting {
    pub title: String,
    pub company: String,
    pub location: String,
    pub url: String,
}

impl JobPosting {
    /// Title and company are the only required fields.
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.company.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Saved,
}

/// Entry of the persisted `trackedJobs` list. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub url: String,
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub status: JobStatus,
}

impl JobRecord {
    pub fn saved(posting: JobPosting, saved_at: DateTime<Utc>) -> Self {
        Self {
            title: posting.title.trim().to_string(),
            company: posting.company.trim().to_string(),
            location: posting.location.trim().to_string(),
            url: posting.url,
            saved_at,
            status: JobStatus::Saved,
        }
    }

    pub fn dedupe_key(&self) -> String {
        normalize_url_for_dedupe(&self.url)
    }
}

/// Comparison key for job URLs: scheme and host lowercased, fragment dropped,
/// trailing slash trimmed. The query is kept since some sites carry the job id there.
pub fn normalize_url_for_dedupe(raw: &str) -> String {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(mut url) => {
            url.set_fragment(None);
            let mut normalized = url.to_string();
            if url.query().is_none() {
                while normalized.ends_with('/') {
                    normalized.pop();
                }
            }
            normalized
        }
        Err(_) => trimmed.trim_end_matches('/').to_ascii_lowercase(),
    }
}
