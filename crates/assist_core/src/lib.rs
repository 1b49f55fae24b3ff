//! Job assist core: data model and the typed message protocol shared by the
//! content script, the background coordinator and the popup.
mod auth;
mod job;
mod msg;
mod response;
mod resume;
mod storage;

pub use auth::{AuthCookiePolicy, Cookie, CookieChange};
pub use job::{normalize_url_for_dedupe, JobPosting, JobRecord, JobStatus};
pub use msg::{
    AuthState, AutofillRequest, Delivery, Envelope, EnvelopeError, FillFormRequest, Message,
    MessageType, TabId, TabTarget,
};
pub use response::{Response, UNKNOWN_MESSAGE_TYPE};
pub use resume::{FormField, PersonalDetails, ResumeRecord};
pub use storage::StorageKey;
