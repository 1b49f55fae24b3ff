use std::sync::Once;

use assist_core::{
    AutofillRequest, Delivery, Envelope, EnvelopeError, FillFormRequest, JobPosting, Message,
    MessageType, Response, TabTarget, UNKNOWN_MESSAGE_TYPE,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(assist_logging::initialize_for_tests);
}

fn envelope(value: serde_json::Value) -> Envelope {
    serde_json::from_value(value).expect("envelope shape")
}

#[test]
fn unknown_type_is_rejected_with_canonical_error() {
    init_logging();
    let err = Message::from_envelope(&envelope(json!({"type": "DO_MAGIC"}))).unwrap_err();

    assert_eq!(err, EnvelopeError::UnknownType("DO_MAGIC".to_string()));
    assert_eq!(err.to_string(), UNKNOWN_MESSAGE_TYPE);
    assert_eq!(
        Response::unknown_type().into_json(),
        json!({"error": "Unknown message type"})
    );
}

#[test]
fn save_job_payload_is_decoded_with_location_default() {
    init_logging();
    let message = Message::from_envelope(&envelope(json!({
        "type": "SAVE_JOB",
        "data": {"title": "Engineer", "company": "Acme", "url": "https://www.linkedin.com/jobs/view/1"}
    })))
    .unwrap();

    assert_eq!(
        message,
        Message::SaveJob(JobPosting {
            title: "Engineer".into(),
            company: "Acme".into(),
            location: String::new(),
            url: "https://www.linkedin.com/jobs/view/1".into(),
        })
    );
}

#[test]
fn payload_presence_is_checked() {
    init_logging();
    let err = Message::from_envelope(&envelope(json!({"type": "SAVE_JOB"}))).unwrap_err();
    assert_eq!(
        err,
        EnvelopeError::InvalidPayload {
            kind: MessageType::SaveJob,
            reason: "missing data".into()
        }
    );

    let err = Message::from_envelope(&envelope(json!({"type": "AUTH_STATE_CHANGED", "data": {}})))
        .unwrap_err();
    assert!(err.to_string().starts_with("Invalid AUTH_STATE_CHANGED payload"));
}

#[test]
fn optional_payloads_default_when_absent() {
    init_logging();
    let message = Message::from_envelope(&envelope(json!({"type": "AUTOFILL_APPLICATION"}))).unwrap();
    assert_eq!(message, Message::AutofillApplication(AutofillRequest::default()));

    let message =
        Message::from_envelope(&envelope(json!({"type": "EXTRACT_JOB_DATA", "data": null}))).unwrap();
    assert_eq!(message, Message::ExtractJobData(TabTarget::default()));
}

#[test]
fn fill_form_carries_target_tab_next_to_details() {
    init_logging();
    let message = Message::from_envelope(&envelope(json!({
        "type": "FILL_FORM",
        "data": {"tabId": 7, "firstName": "Ada", "email": "ada@example.com"}
    })))
    .unwrap();

    let Message::FillForm(FillFormRequest { tab_id, details }) = message else {
        panic!("expected FILL_FORM");
    };
    assert_eq!(tab_id, Some(7));
    assert_eq!(details.first_name.as_deref(), Some("Ada"));
    assert_eq!(details.email.as_deref(), Some("ada@example.com"));
}

#[test]
fn envelope_serialization_uses_type_tag_and_omits_empty_data() {
    init_logging();
    let value = serde_json::to_value(Message::GetResumeData.to_envelope()).unwrap();
    assert_eq!(value, json!({"type": "GET_RESUME_DATA"}));

    let value = serde_json::to_value(
        Message::AutofillApplication(AutofillRequest {
            resume_id: Some("r1".into()),
            tab_id: None,
        })
        .to_envelope(),
    )
    .unwrap();
    assert_eq!(
        value,
        json!({"type": "AUTOFILL_APPLICATION", "data": {"resumeId": "r1"}})
    );
}

#[test]
fn delivery_classes_follow_handler_kind() {
    init_logging();
    assert_eq!(Message::OpenResumePicker.delivery(), Delivery::Immediate);
    assert_eq!(Message::GetResumeData.delivery(), Delivery::Deferred);
    assert_eq!(
        Message::SaveJob(JobPosting::default()).delivery(),
        Delivery::Deferred
    );
    assert_eq!(
        Message::AuthStateChanged(assist_core::AuthState {
            is_authenticated: true
        })
        .delivery(),
        Delivery::NoReply
    );
    assert!(Delivery::Immediate.expects_reply());
    assert!(Delivery::Deferred.expects_reply());
    assert!(!Delivery::NoReply.expects_reply());
}

#[test]
fn every_message_type_tag_parses_back() {
    for kind in MessageType::ALL {
        assert_eq!(MessageType::parse(kind.as_str()), Some(kind));
    }
    assert_eq!(MessageType::parse("save_job"), None);
}

#[test]
fn response_helpers_shape_json() {
    let response = Response::success().with("filled", vec!["email"]);
    assert!(response.is_success());
    assert_eq!(response.field::<Vec<String>>("filled"), Some(vec!["email".to_string()]));

    let failure = Response::failure("No job data found");
    assert!(!failure.is_success());
    assert_eq!(failure.error_message(), Some("No job data found"));
    assert_eq!(
        failure.into_json(),
        json!({"success": false, "error": "No job data found"})
    );
}
