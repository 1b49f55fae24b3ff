use std::path::PathBuf;

use assist_core::AuthCookiePolicy;
use assist_logging::LogSettings;
use serde::Deserialize;

use crate::fetch::FetchSettings;
use crate::observe::ObserverMode;

/// What SAVE_JOB does when a job with the same URL is already tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum DuplicatePolicy {
    /// Always append; the tracked list may hold the same posting twice.
    #[default]
    Append,
    /// Keep the existing record when the normalized URL matches.
    SkipSameUrl,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtensionConfig {
    pub auth: AuthCookiePolicy,
    pub duplicate_policy: DuplicatePolicy,
    pub observer: ObserverMode,
    pub storage_path: PathBuf,
    pub fetch: FetchSettings,
    pub logging: LogSettings,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            auth: AuthCookiePolicy::default(),
            duplicate_policy: DuplicatePolicy::default(),
            observer: ObserverMode::default(),
            storage_path: PathBuf::from("./assist_store.ron"),
            fetch: FetchSettings::default(),
            logging: LogSettings::default(),
        }
    }
}
