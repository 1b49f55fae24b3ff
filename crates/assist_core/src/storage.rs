/// Keys of the extension's persisted key-value store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageKey {
    Resumes,
    SelectedResumeId,
    TrackedJobs,
    IsAuthenticated,
}

impl StorageKey {
    pub const ALL: [StorageKey; 4] = [
        StorageKey::Resumes,
        StorageKey::SelectedResumeId,
        StorageKey::TrackedJobs,
        StorageKey::IsAuthenticated,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StorageKey::Resumes => "resumes",
            StorageKey::SelectedResumeId => "selectedResumeId",
            StorageKey::TrackedJobs => "trackedJobs",
            StorageKey::IsAuthenticated => "isAuthenticated",
        }
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
