//! Job assist engine: the page model, site adapters, the content-script and
//! background routers, persistence and page loading.
mod background;
mod config;
mod content;
mod decode;
mod dom;
mod fetch;
mod fill;
mod inject;
mod manifest;
mod observe;
mod persist;
mod site;
mod store;

pub use background::{
    BackgroundCoordinator, BackgroundError, Clock, CookieJar, MemoryCookieJar, MessageSource,
    Messenger, MessagingError,
};
pub use config::{DuplicatePolicy, ExtensionConfig};
pub use content::ContentScript;
pub use decode::{decode_html, DecodeError, DecodedHtml};
pub use dom::{DomEvent, EventKind, Mutation, PageDocument, PageError};
pub use fetch::{
    load_page, FailureKind, FetchError, FetchOutput, FetchSettings, LoadError, PageFetcher,
    ReqwestFetcher,
};
pub use fill::{FieldOutcome, FillReport, FormFiller};
pub use inject::{
    action_for, find_button, ButtonAction, ButtonStyle, Injection, UiInjector, ACTION_ATTR,
    MARKER_ID,
};
pub use manifest::{
    ContentScriptRule, ContextMenuItem, Manifest, MatchPattern, PatternError, SAVE_JOB_MENU_ITEM,
};
pub use observe::{ObserveScope, ObserverMode, ScopedObserver};
pub use persist::{ensure_parent_dir, write_atomically, PersistError};
pub use site::{Indeed, JobSite, LinkedIn, SiteAdapter, SiteKind};
pub use store::{load, save, FileStore, KeyValueStore, MemoryStore, StoreError};
