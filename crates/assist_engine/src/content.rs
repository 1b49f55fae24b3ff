use assist_core::{Envelope, EnvelopeError, JobPosting, Message, Response, TabId};
use assist_logging::{assist_debug, assist_info, assist_warn};
use ego_tree::NodeId;

use crate::dom::{EventKind, PageDocument, PageError};
use crate::fill::{FillReport, FormFiller};
use crate::inject::{action_for, find_button, ButtonAction, Injection, UiInjector, MARKER_ID};
use crate::observe::{ObserverMode, ScopedObserver};
use crate::site::SiteAdapter;

/// Page-side half of the extension for one tab.
///
/// Owns the tab's document; everything it needs is handed in at boot, so two
/// tabs never share state.
#[derive(Debug)]
pub struct ContentScript {
    tab_id: TabId,
    page: PageDocument,
    adapter: SiteAdapter,
    injector: UiInjector,
    filler: FormFiller,
    observer: ScopedObserver,
    authenticated: Option<bool>,
}

impl ContentScript {
    /// `None` when the page's site has no adapter.
    pub fn boot(tab_id: TabId, page: PageDocument, mode: ObserverMode) -> Option<Self> {
        let adapter = SiteAdapter::for_hostname(page.hostname())?;
        assist_info!(
            "Content script booted for tab {} on {} ({})",
            tab_id,
            page.href(),
            adapter.kind().name()
        );
        Some(Self {
            tab_id,
            page,
            adapter,
            injector: UiInjector::new(),
            filler: FormFiller::new(),
            observer: ScopedObserver::new(mode),
            authenticated: None,
        })
    }

    pub fn tab_id(&self) -> TabId {
        self.tab_id
    }

    pub fn page(&self) -> &PageDocument {
        &self.page
    }

    /// Host-side access for re-renders driven by the site itself.
    pub fn page_mut(&mut self) -> &mut PageDocument {
        &mut self.page
    }

    pub fn adapter(&self) -> &SiteAdapter {
        &self.adapter
    }

    pub fn observer(&self) -> &ScopedObserver {
        &self.observer
    }

    pub fn is_authenticated(&self) -> Option<bool> {
        self.authenticated
    }

    /// Initial render pass after the document loaded.
    pub fn start(&mut self) -> Result<Injection, PageError> {
        self.page.take_mutations();
        self.refresh()
    }

    /// Process pending DOM mutations. `None` when none were in scope.
    pub fn on_mutations(&mut self) -> Result<Option<Injection>, PageError> {
        let mutations = self.page.take_mutations();
        // A lost button group is rendered again wherever the change happened.
        let lost_buttons = !mutations.is_empty() && self.page.find_by_id(MARKER_ID).is_none();
        if !lost_buttons && !self.observer.is_relevant(&self.page, &mutations) {
            return Ok(None);
        }
        self.refresh().map(Some)
    }

    fn refresh(&mut self) -> Result<Injection, PageError> {
        let injection = self
            .injector
            .ensure_buttons_present(&mut self.page, &self.adapter)?;
        self.observer.rescope(&self.page, &self.adapter);
        // Our own insertion must not retrigger the observer.
        self.page.take_mutations();
        Ok(injection)
    }

    pub fn detect_job(&self) -> Option<JobPosting> {
        self.adapter.detect_job(&self.page)
    }

    pub fn button(&self, action: ButtonAction) -> Option<NodeId> {
        find_button(&self.page, action)
    }

    /// Handle a click; returns the message to send to the background, if any.
    pub fn click(&mut self, node: NodeId) -> Option<Message> {
        self.page.dispatch_event(node, EventKind::Click);
        match action_for(&self.page, node)? {
            ButtonAction::Autofill => Some(Message::OpenResumePicker),
            ButtonAction::SaveJob => match self.detect_job() {
                Some(job) => Some(Message::SaveJob(job)),
                None => {
                    assist_warn!("Nothing to save on {}", self.page.href());
                    None
                }
            },
        }
    }

    /// Dispatch a message from the background. `None` means no reply is sent.
    pub fn route(&mut self, message: Message) -> Option<Response> {
        assist_debug!("tab {} <- {}", self.tab_id, message.kind());
        let delivery = message.delivery();
        let reply = match message {
            Message::FillForm(request) => {
                let report = self.filler.fill(&mut self.page, &request.details);
                fill_response(&report)
            }
            Message::ExtractJobData(_) => match self.detect_job() {
                Some(job) => Response::success().with("job", job),
                None => Response::failure("No job data found"),
            },
            Message::AuthStateChanged(state) => {
                self.authenticated = Some(state.is_authenticated);
                Response::success()
            }
            Message::GetResumeData
            | Message::OpenResumePicker
            | Message::AutofillApplication(_)
            | Message::SaveJob(_)
            | Message::GetTrackedJobs
            | Message::GetAuthState => Response::unknown_type(),
        };
        delivery.expects_reply().then_some(reply)
    }

    pub fn route_envelope(&mut self, envelope: &Envelope) -> Option<Response> {
        match Message::from_envelope(envelope) {
            Ok(message) => self.route(message),
            Err(EnvelopeError::UnknownType(kind)) => {
                assist_warn!("tab {}: unknown message type {:?}", self.tab_id, kind);
                Some(Response::unknown_type())
            }
            Err(err) => Some(Response::error(err.to_string())),
        }
    }
}

fn fill_response(report: &FillReport) -> Response {
    Response::success()
        .with("filled", report.filled())
        .with("skipped", report.skipped())
}
