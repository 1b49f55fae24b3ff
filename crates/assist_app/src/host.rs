//! In-process stand-in for the browser: owns the tabs and their content
//! scripts, the popup and the background coordinator, and pumps messages
//! between them.
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use anyhow::{anyhow, bail};
use assist_core::{AutofillRequest, CookieChange, Message, Response, TabId};
use assist_engine::{
    BackgroundCoordinator, ButtonAction, ContentScript, ExtensionConfig, KeyValueStore, Manifest,
    MemoryCookieJar, MessageSource, MessagingError, ObserverMode, PageDocument,
};
use assist_logging::{assist_debug, assist_info, assist_warn};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::messaging::{ChannelMessenger, HostEvent};

pub(crate) struct Host {
    background: BackgroundCoordinator,
    store: Arc<dyn KeyValueStore>,
    cookies: Arc<MemoryCookieJar>,
    inbox: mpsc::UnboundedReceiver<HostEvent>,
    tabs: Tabs,
    manifest: Manifest,
    observer: ObserverMode,
}

/// Tab side of the host; serves requests the background sends while it works.
#[derive(Default)]
struct Tabs {
    scripts: BTreeMap<TabId, ContentScript>,
    next_id: TabId,
    popup_open: bool,
}

impl Tabs {
    fn serve(&mut self, event: HostEvent) {
        match event {
            HostEvent::TabRequest {
                tab,
                message,
                reply,
            } => {
                let result = match self.scripts.get_mut(&tab) {
                    Some(script) => script.route(message).ok_or(MessagingError::NoResponse(tab)),
                    None => Err(MessagingError::TabUnavailable(tab)),
                };
                // The requester may have given up; nothing to do then.
                let _ = reply.send(result);
            }
            HostEvent::Broadcast(message) => {
                assist_debug!("Broadcast {} to {} tab(s)", message.kind(), self.scripts.len());
                for script in self.scripts.values_mut() {
                    script.route(message.clone());
                }
            }
            HostEvent::PopupOpened => self.popup_open = true,
        }
    }
}

impl Host {
    pub(crate) fn new(
        store: Arc<dyn KeyValueStore>,
        config: &ExtensionConfig,
    ) -> anyhow::Result<Self> {
        let (messenger, inbox) = ChannelMessenger::new();
        let cookies = Arc::new(MemoryCookieJar::new());
        let background =
            BackgroundCoordinator::new(store.clone(), Arc::new(messenger), cookies.clone(), config);
        Ok(Self {
            background,
            store,
            cookies,
            inbox,
            tabs: Tabs::default(),
            manifest: Manifest::job_assist()?,
            observer: config.observer,
        })
    }

    pub(crate) fn store(&self) -> &dyn KeyValueStore {
        &*self.store
    }

    pub(crate) fn tab(&self, tab: TabId) -> Option<&ContentScript> {
        self.tabs.scripts.get(&tab)
    }

    /// Open `page` in a new tab and boot its content script.
    pub(crate) fn open_tab(&mut self, page: PageDocument) -> anyhow::Result<TabId> {
        if !self.manifest.content_script_matches(page.href()) {
            bail!("no content script runs on {}", page.href());
        }
        self.tabs.next_id += 1;
        let tab = self.tabs.next_id;
        let mut script = ContentScript::boot(tab, page, self.observer)
            .ok_or_else(|| anyhow!("no site adapter for tab {tab}"))?;
        let injection = script.start()?;
        assist_debug!("Tab {} started: {:?}", tab, injection);
        self.tabs.scripts.insert(tab, script);
        Ok(tab)
    }

    /// Run a background future while serving the tab requests it makes.
    async fn drive<F: Future>(
        inbox: &mut mpsc::UnboundedReceiver<HostEvent>,
        tabs: &mut Tabs,
        work: F,
    ) -> F::Output {
        tokio::pin!(work);
        loop {
            tokio::select! {
                biased;
                Some(event) = inbox.recv() => tabs.serve(event),
                output = &mut work => return output,
            }
        }
    }

    /// Deliver `message` as if sent by `source`; then drain pending broadcasts.
    pub(crate) async fn send(&mut self, source: MessageSource, message: Message) -> Option<Response> {
        let reply = Self::drive(
            &mut self.inbox,
            &mut self.tabs,
            self.background.handle(source, message),
        )
        .await;
        self.flush();
        reply
    }

    fn flush(&mut self) {
        while let Ok(event) = self.inbox.try_recv() {
            self.tabs.serve(event);
        }
    }

    /// Click an injected button in `tab` and deliver what it sends.
    pub(crate) async fn click(
        &mut self,
        tab: TabId,
        action: ButtonAction,
    ) -> anyhow::Result<Option<Response>> {
        let script = self
            .tabs
            .scripts
            .get_mut(&tab)
            .ok_or_else(|| anyhow!("tab {tab} is not open"))?;
        let button = script
            .button(action)
            .ok_or_else(|| anyhow!("the {:?} button is not on the page", action.label()))?;
        let Some(message) = script.click(button) else {
            return Ok(None);
        };
        Ok(self.send(MessageSource::Tab(tab), message).await)
    }

    pub(crate) fn take_popup_open(&mut self) -> bool {
        std::mem::take(&mut self.tabs.popup_open)
    }

    /// The popup's part of autofill: read resumes, pick one, request the fill.
    pub(crate) async fn popup_autofill(
        &mut self,
        resume_id: Option<String>,
    ) -> anyhow::Result<Response> {
        let data = self
            .send(MessageSource::Popup, Message::GetResumeData)
            .await
            .ok_or_else(|| anyhow!("no reply to GET_RESUME_DATA"))?;
        let resume_id = resume_id
            .or_else(|| data.field::<String>("selectedResumeId"))
            .or_else(|| first_resume_id(data.get("resumes")));
        assist_info!("Popup picked resume {:?}", resume_id);

        let request = AutofillRequest {
            resume_id,
            tab_id: None,
        };
        self.send(MessageSource::Popup, Message::AutofillApplication(request))
            .await
            .ok_or_else(|| anyhow!("no reply to AUTOFILL_APPLICATION"))
    }

    pub(crate) async fn context_save(&mut self, tab: TabId) -> Response {
        let reply = Self::drive(
            &mut self.inbox,
            &mut self.tabs,
            self.background.on_context_menu_clicked(tab),
        )
        .await;
        self.flush();
        reply
    }

    pub(crate) async fn cookie_changed(&mut self, change: CookieChange) -> anyhow::Result<Option<bool>> {
        self.cookies.apply(&change);
        let outcome = Self::drive(
            &mut self.inbox,
            &mut self.tabs,
            self.background.on_cookie_changed(&change),
        )
        .await?;
        self.flush();
        if outcome.is_none() {
            assist_warn!("Cookie {} is not an auth cookie; ignored", change.cookie.name);
        }
        Ok(outcome)
    }
}

fn first_resume_id(resumes: Option<&Value>) -> Option<String> {
    resumes?
        .as_array()?
        .iter()
        .find_map(|resume| resume.get("id")?.as_str().map(str::to_string))
}
