use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use assist_core::{
    normalize_url_for_dedupe, AuthCookiePolicy, AuthState, AutofillRequest, Cookie, CookieChange,
    Envelope, EnvelopeError, FillFormRequest, JobPosting, JobRecord, Message, Response,
    ResumeRecord, StorageKey, TabId, TabTarget,
};
use assist_logging::{assist_debug, assist_error, assist_info, assist_warn};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::config::{DuplicatePolicy, ExtensionConfig};
use crate::store::{load, save, KeyValueStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessagingError {
    #[error("Could not reach tab {0}")]
    TabUnavailable(TabId),
    #[error("Tab {0} sent no response")]
    NoResponse(TabId),
    #[error("Could not open the resume picker")]
    PopupUnavailable,
    #[error("Messaging channel closed")]
    Closed,
}

#[derive(Debug, thiserror::Error)]
pub enum BackgroundError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Messaging(#[from] MessagingError),
}

/// Delivery of messages from the background to tabs and the popup.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_to_tab(&self, tab: TabId, message: Message) -> Result<Response, MessagingError>;
    /// Fire-and-forget to every tab and the popup.
    async fn broadcast(&self, message: Message) -> Result<(), MessagingError>;
    async fn open_popup(&self) -> Result<(), MessagingError>;
}

/// Read access to the browser's cookie store.
#[async_trait]
pub trait CookieJar: Send + Sync {
    async fn cookies(&self, domain: &str) -> Vec<Cookie>;
}

#[derive(Debug, Default)]
pub struct MemoryCookieJar {
    cookies: Mutex<Vec<Cookie>>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a change the way the browser would before notifying listeners.
    pub fn apply(&self, change: &CookieChange) {
        let mut cookies = self.cookies.lock().unwrap_or_else(PoisonError::into_inner);
        cookies.retain(|c| !(c.name == change.cookie.name && c.domain == change.cookie.domain));
        if !change.removed {
            cookies.push(change.cookie.clone());
        }
    }
}

#[async_trait]
impl CookieJar for MemoryCookieJar {
    async fn cookies(&self, domain: &str) -> Vec<Cookie> {
        let domain = domain.trim_start_matches('.');
        let cookies = self.cookies.lock().unwrap_or_else(PoisonError::into_inner);
        cookies
            .iter()
            .filter(|c| c.domain.trim_start_matches('.').ends_with(domain))
            .cloned()
            .collect()
    }
}

/// Who sent a message to the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSource {
    Tab(TabId),
    Popup,
}

impl MessageSource {
    pub fn tab(self) -> Option<TabId> {
        match self {
            MessageSource::Tab(tab) => Some(tab),
            MessageSource::Popup => None,
        }
    }
}

impl fmt::Display for MessageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageSource::Tab(tab) => write!(f, "tab {tab}"),
            MessageSource::Popup => f.write_str("popup"),
        }
    }
}

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Background half of the extension: routes messages, owns persisted state
/// and relays auth changes.
pub struct BackgroundCoordinator {
    store: Arc<dyn KeyValueStore>,
    messenger: Arc<dyn Messenger>,
    cookies: Arc<dyn CookieJar>,
    auth_policy: AuthCookiePolicy,
    duplicate_policy: DuplicatePolicy,
    clock: Clock,
    picker_tab: Mutex<Option<TabId>>,
    // Serializes the read-modify-write of `trackedJobs`.
    jobs_lock: tokio::sync::Mutex<()>,
}

impl BackgroundCoordinator {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        messenger: Arc<dyn Messenger>,
        cookies: Arc<dyn CookieJar>,
        config: &ExtensionConfig,
    ) -> Self {
        Self {
            store,
            messenger,
            cookies,
            auth_policy: config.auth.clone(),
            duplicate_policy: config.duplicate_policy,
            clock: Arc::new(Utc::now),
            picker_tab: Mutex::new(None),
            jobs_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Tab the resume picker was last opened from.
    pub fn picker_tab(&self) -> Option<TabId> {
        *self.picker_tab.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Route one message. `None` means the sender gets no reply.
    pub async fn handle(&self, source: MessageSource, message: Message) -> Option<Response> {
        let kind = message.kind();
        let delivery = message.delivery();
        assist_debug!("background <- {} from {} ({:?})", kind, source, delivery);

        let result = match message {
            Message::GetResumeData => self.get_resume_data().await,
            Message::OpenResumePicker => self.open_resume_picker(source).await,
            Message::AutofillApplication(request) => self.autofill(source, request).await,
            Message::SaveJob(posting) => self.save_job(posting).await,
            Message::FillForm(request) => {
                let target = request.tab_id.or(source.tab());
                self.forward(target, Message::FillForm(request)).await
            }
            Message::ExtractJobData(target) => {
                let tab = target.tab_id.or(source.tab());
                self.forward(tab, Message::ExtractJobData(target)).await
            }
            Message::AuthStateChanged(state) => {
                self.relay(Message::AuthStateChanged(state)).await;
                Ok(Response::success())
            }
            Message::GetTrackedJobs => self.get_tracked_jobs().await,
            Message::GetAuthState => self.get_auth_state().await,
        };

        let reply = result.unwrap_or_else(|err| {
            assist_error!("{} from {} failed: {}", kind, source, err);
            Response::error(err.to_string())
        });
        delivery.expects_reply().then_some(reply)
    }

    pub async fn handle_envelope(
        &self,
        source: MessageSource,
        envelope: &Envelope,
    ) -> Option<Response> {
        match Message::from_envelope(envelope) {
            Ok(message) => self.handle(source, message).await,
            Err(EnvelopeError::UnknownType(kind)) => {
                assist_warn!("Unknown message type {:?} from {}", kind, source);
                Some(Response::unknown_type())
            }
            Err(err) => {
                assist_warn!("Rejected message from {}: {}", source, err);
                Some(Response::error(err.to_string()))
            }
        }
    }

    async fn get_resume_data(&self) -> Result<Response, BackgroundError> {
        let resumes = self
            .store
            .get(StorageKey::Resumes)
            .await?
            .filter(|value| !value.is_null())
            .unwrap_or_else(|| Value::Array(Vec::new()));
        let selected = self
            .store
            .get(StorageKey::SelectedResumeId)
            .await?
            .unwrap_or(Value::Null);
        Ok(Response::default()
            .with("resumes", resumes)
            .with("selectedResumeId", selected))
    }

    async fn open_resume_picker(&self, source: MessageSource) -> Result<Response, BackgroundError> {
        if let Some(tab) = source.tab() {
            *self.picker_tab.lock().unwrap_or_else(PoisonError::into_inner) = Some(tab);
        }
        self.messenger.open_popup().await?;
        Ok(Response::success())
    }

    async fn autofill(
        &self,
        source: MessageSource,
        request: AutofillRequest,
    ) -> Result<Response, BackgroundError> {
        let selected: Option<String> = load(&*self.store, StorageKey::SelectedResumeId).await?;
        let Some(resume_id) = request.resume_id.clone().or(selected) else {
            return Ok(Response::failure("No resume selected"));
        };
        let Some(resume) = self.find_resume(&resume_id).await? else {
            assist_warn!("Resume {:?} not found", resume_id);
            return Ok(Response::failure("Resume not found"));
        };
        if request.resume_id.is_some() {
            save(&*self.store, StorageKey::SelectedResumeId, &resume_id).await?;
        }

        let Some(tab) = request.tab_id.or(self.picker_tab()).or(source.tab()) else {
            return Ok(Response::failure("No target tab"));
        };
        assist_info!("Autofilling tab {} with resume {}", tab, resume.id);
        let fill = FillFormRequest {
            tab_id: Some(tab),
            details: resume.personal_details,
        };
        Ok(self.messenger.send_to_tab(tab, Message::FillForm(fill)).await?)
    }

    /// Entries that do not parse as a resume are skipped, not fatal.
    async fn find_resume(&self, resume_id: &str) -> Result<Option<ResumeRecord>, BackgroundError> {
        let resumes: Vec<Value> = load(&*self.store, StorageKey::Resumes)
            .await?
            .unwrap_or_default();
        Ok(resumes
            .into_iter()
            .filter_map(|value| serde_json::from_value::<ResumeRecord>(value).ok())
            .find(|resume| resume.id == resume_id))
    }

    async fn save_job(&self, posting: JobPosting) -> Result<Response, BackgroundError> {
        if !posting.is_complete() {
            return Ok(Response::failure("Invalid job data"));
        }
        let record = JobRecord::saved(posting, (self.clock)());

        let _guard = self.jobs_lock.lock().await;
        // Kept as raw values so entries written by the web app survive untouched.
        let mut jobs: Vec<Value> = load(&*self.store, StorageKey::TrackedJobs)
            .await?
            .unwrap_or_default();

        if self.duplicate_policy == DuplicatePolicy::SkipSameUrl {
            let key = record.dedupe_key();
            let existing = jobs.iter().find(|job| {
                job.get("url")
                    .and_then(Value::as_str)
                    .is_some_and(|url| normalize_url_for_dedupe(url) == key)
            });
            if let Some(existing) = existing {
                assist_info!("Job {} already tracked", record.url);
                return Ok(Response::success()
                    .with("job", existing)
                    .with("duplicate", true));
            }
        }

        let value = serde_json::to_value(&record)
            .map_err(|err| StoreError::Encode(err.to_string()))?;
        jobs.push(value);
        save(&*self.store, StorageKey::TrackedJobs, &jobs).await?;
        assist_info!(
            "Saved job {:?} at {:?} ({} tracked)",
            record.title,
            record.company,
            jobs.len()
        );
        Ok(Response::success().with("job", record))
    }

    async fn forward(
        &self,
        tab: Option<TabId>,
        message: Message,
    ) -> Result<Response, BackgroundError> {
        let Some(tab) = tab else {
            return Ok(Response::failure("No target tab"));
        };
        Ok(self.messenger.send_to_tab(tab, message).await?)
    }

    async fn relay(&self, message: Message) {
        if let Err(err) = self.messenger.broadcast(message).await {
            assist_warn!("Broadcast failed: {}", err);
        }
    }

    async fn get_tracked_jobs(&self) -> Result<Response, BackgroundError> {
        let jobs: Vec<Value> = load(&*self.store, StorageKey::TrackedJobs)
            .await?
            .unwrap_or_default();
        Ok(Response::default().with("jobs", jobs))
    }

    async fn get_auth_state(&self) -> Result<Response, BackgroundError> {
        let flag: bool = load(&*self.store, StorageKey::IsAuthenticated)
            .await?
            .unwrap_or(false);
        Ok(Response::default().with("isAuthenticated", flag))
    }

    /// Cookie listener. Returns the new flag when the change concerned a watched cookie.
    pub async fn on_cookie_changed(
        &self,
        change: &CookieChange,
    ) -> Result<Option<bool>, BackgroundError> {
        if !self.auth_policy.watches(change) {
            return Ok(None);
        }
        assist_debug!(
            "Auth cookie {} {}",
            change.cookie.name,
            if change.removed { "removed" } else { "set" }
        );
        self.refresh_auth().await.map(Some)
    }

    /// Re-derive the auth flag from the cookie jar, persist it and tell every tab.
    pub async fn refresh_auth(&self) -> Result<bool, BackgroundError> {
        let cookies = self.cookies.cookies(&self.auth_policy.domain).await;
        let is_authenticated = self.auth_policy.is_authenticated(&cookies);
        save(&*self.store, StorageKey::IsAuthenticated, &is_authenticated).await?;
        assist_info!("Authenticated: {}", is_authenticated);
        self.relay(Message::AuthStateChanged(AuthState { is_authenticated }))
            .await;
        Ok(is_authenticated)
    }

    /// "Save job to tracker": pull the posting from the tab and save it.
    pub async fn on_context_menu_clicked(&self, tab: TabId) -> Response {
        self.save_from_tab(tab).await.unwrap_or_else(|err| {
            assist_error!("Context menu save on tab {} failed: {}", tab, err);
            Response::error(err.to_string())
        })
    }

    async fn save_from_tab(&self, tab: TabId) -> Result<Response, BackgroundError> {
        let extract = Message::ExtractJobData(TabTarget { tab_id: Some(tab) });
        let reply = self.messenger.send_to_tab(tab, extract).await?;
        match reply.field::<JobPosting>("job") {
            Some(job) if reply.is_success() => self.save_job(job).await,
            _ => Ok(reply),
        }
    }
}
