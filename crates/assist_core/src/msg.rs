use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{JobPosting, PersonalDetails};

pub type TabId = u32;

/// Wire shape of every message: `{ "type": "...", "data": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Envelope {
    pub fn new(kind: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    #[error("Unknown message type")]
    UnknownType(String),
    #[error("Invalid {kind} payload: {reason}")]
    InvalidPayload { kind: MessageType, reason: String },
}

/// How a handler delivers its answer to the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Answered before the handler yields.
    Immediate,
    /// Answered later, after storage or a forwarded round-trip.
    Deferred,
    /// Fire-and-forget broadcast.
    NoReply,
}

impl Delivery {
    /// Whether the sender waits for a response at all.
    pub fn expects_reply(self) -> bool {
        self != Delivery::NoReply
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    GetResumeData,
    OpenResumePicker,
    AutofillApplication,
    SaveJob,
    FillForm,
    ExtractJobData,
    AuthStateChanged,
    GetTrackedJobs,
    GetAuthState,
}

impl MessageType {
    pub const ALL: [MessageType; 9] = [
        MessageType::GetResumeData,
        MessageType::OpenResumePicker,
        MessageType::AutofillApplication,
        MessageType::SaveJob,
        MessageType::FillForm,
        MessageType::ExtractJobData,
        MessageType::AuthStateChanged,
        MessageType::GetTrackedJobs,
        MessageType::GetAuthState,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::GetResumeData => "GET_RESUME_DATA",
            MessageType::OpenResumePicker => "OPEN_RESUME_PICKER",
            MessageType::AutofillApplication => "AUTOFILL_APPLICATION",
            MessageType::SaveJob => "SAVE_JOB",
            MessageType::FillForm => "FILL_FORM",
            MessageType::ExtractJobData => "EXTRACT_JOB_DATA",
            MessageType::AuthStateChanged => "AUTH_STATE_CHANGED",
            MessageType::GetTrackedJobs => "GET_TRACKED_JOBS",
            MessageType::GetAuthState => "GET_AUTH_STATE",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AutofillRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<TabId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FillFormRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<TabId>,
    #[serde(flatten)]
    pub details: PersonalDetails,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TabTarget {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<TabId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub is_authenticated: bool,
}

/// Every message exchanged between content scripts, the background and the popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    GetResumeData,
    OpenResumePicker,
    AutofillApplication(AutofillRequest),
    SaveJob(JobPosting),
    FillForm(FillFormRequest),
    ExtractJobData(TabTarget),
    AuthStateChanged(AuthState),
    GetTrackedJobs,
    GetAuthState,
}

impl Message {
    pub fn kind(&self) -> MessageType {
        match self {
            Message::GetResumeData => MessageType::GetResumeData,
            Message::OpenResumePicker => MessageType::OpenResumePicker,
            Message::AutofillApplication(_) => MessageType::AutofillApplication,
            Message::SaveJob(_) => MessageType::SaveJob,
            Message::FillForm(_) => MessageType::FillForm,
            Message::ExtractJobData(_) => MessageType::ExtractJobData,
            Message::AuthStateChanged(_) => MessageType::AuthStateChanged,
            Message::GetTrackedJobs => MessageType::GetTrackedJobs,
            Message::GetAuthState => MessageType::GetAuthState,
        }
    }

    /// Delivery class of the handler for this message. Routers drop the reply of `NoReply` messages.
    pub fn delivery(&self) -> Delivery {
        match self {
            Message::OpenResumePicker => Delivery::Immediate,
            Message::AuthStateChanged(_) => Delivery::NoReply,
            Message::GetResumeData
            | Message::AutofillApplication(_)
            | Message::SaveJob(_)
            | Message::FillForm(_)
            | Message::ExtractJobData(_)
            | Message::GetTrackedJobs
            | Message::GetAuthState => Delivery::Deferred,
        }
    }

    /// Decode an envelope. Payloads only get presence checks here.
    pub fn from_envelope(envelope: &Envelope) -> Result<Self, EnvelopeError> {
        let kind = MessageType::parse(&envelope.kind)
            .ok_or_else(|| EnvelopeError::UnknownType(envelope.kind.clone()))?;
        let data = envelope.data.as_ref().filter(|value| !value.is_null());

        let message = match kind {
            MessageType::GetResumeData => Message::GetResumeData,
            MessageType::OpenResumePicker => Message::OpenResumePicker,
            MessageType::AutofillApplication => {
                Message::AutofillApplication(optional_payload(kind, data)?)
            }
            MessageType::SaveJob => Message::SaveJob(required_payload(kind, data)?),
            MessageType::FillForm => Message::FillForm(required_payload(kind, data)?),
            MessageType::ExtractJobData => Message::ExtractJobData(optional_payload(kind, data)?),
            MessageType::AuthStateChanged => {
                Message::AuthStateChanged(required_payload(kind, data)?)
            }
            MessageType::GetTrackedJobs => Message::GetTrackedJobs,
            MessageType::GetAuthState => Message::GetAuthState,
        };
        Ok(message)
    }

    pub fn to_envelope(&self) -> Envelope {
        let data = match self {
            Message::GetResumeData
            | Message::OpenResumePicker
            | Message::GetTrackedJobs
            | Message::GetAuthState => None,
            Message::AutofillApplication(request) => to_data(request),
            Message::SaveJob(posting) => to_data(posting),
            Message::FillForm(request) => to_data(request),
            Message::ExtractJobData(target) => to_data(target),
            Message::AuthStateChanged(state) => to_data(state),
        };
        Envelope::new(self.kind().as_str(), data)
    }
}

fn required_payload<T: DeserializeOwned>(
    kind: MessageType,
    data: Option<&Value>,
) -> Result<T, EnvelopeError> {
    let data = data.ok_or_else(|| EnvelopeError::InvalidPayload {
        kind,
        reason: "missing data".to_string(),
    })?;
    decode(kind, data)
}

fn optional_payload<T: DeserializeOwned + Default>(
    kind: MessageType,
    data: Option<&Value>,
) -> Result<T, EnvelopeError> {
    match data {
        Some(data) => decode(kind, data),
        None => Ok(T::default()),
    }
}

fn decode<T: DeserializeOwned>(kind: MessageType, data: &Value) -> Result<T, EnvelopeError> {
    T::deserialize(data).map_err(|err| EnvelopeError::InvalidPayload {
        kind,
        reason: err.to_string(),
    })
}

fn to_data<T: Serialize>(payload: &T) -> Option<Value> {
    serde_json::to_value(payload).ok()
}
