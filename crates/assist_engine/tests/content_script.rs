use assist_core::{
    AuthState, Envelope, FillFormRequest, JobPosting, Message, PersonalDetails, TabTarget,
    UNKNOWN_MESSAGE_TYPE,
};
use assist_engine::{
    ButtonAction, ContentScript, Injection, ObserveScope, ObserverMode, PageDocument, MARKER_ID,
};
use pretty_assertions::assert_eq;
use scraper::Selector;
use serde_json::json;

const URL: &str = "https://www.linkedin.com/jobs/view/42/";

fn page_html(apply_area: &str) -> String {
    format!(
        r#"<html><body>
        <div class="jobs-unified-top-card">
          <h1 class="jobs-unified-top-card__job-title">Platform Engineer</h1>
          <span class="jobs-unified-top-card__company-name">Globex</span>
          <span class="jobs-unified-top-card__bullet">Springfield</span>
          <div class="jobs-s-apply">{apply_area}</div>
        </div>
        <form><input name="firstName"><input type="email" name="email" value="kept@example.com"></form>
        </body></html>"#
    )
}

fn booted(apply_area: &str) -> ContentScript {
    let page = PageDocument::parse(URL, &page_html(apply_area)).unwrap();
    let mut script = ContentScript::boot(7, page, ObserverMode::ApplyContainer).unwrap();
    script.start().unwrap();
    script
}

fn marker_count(script: &ContentScript) -> usize {
    let selector = Selector::parse(&format!("#{MARKER_ID}")).unwrap();
    script.page().query_all(&selector).len()
}

#[test]
fn boot_refuses_unsupported_sites() {
    let page = PageDocument::parse("https://example.org/jobs/1", "<html></html>").unwrap();
    assert!(ContentScript::boot(1, page, ObserverMode::default()).is_none());
}

#[test]
fn start_injects_and_scopes_observer() {
    let script = booted(r#"<button class="jobs-apply-button">Apply</button>"#);

    assert_eq!(marker_count(&script), 1);
    let container = script
        .page()
        .query(&Selector::parse(".jobs-unified-top-card").unwrap())
        .unwrap();
    assert_eq!(script.observer().scope(), ObserveScope::Container(container));
}

#[test]
fn late_apply_button_is_picked_up_on_mutation() {
    let mut script = booted("");
    assert_eq!(marker_count(&script), 0);

    let apply_area = script
        .page()
        .query(&Selector::parse(".jobs-s-apply").unwrap())
        .unwrap();
    script
        .page_mut()
        .append_html(apply_area, r#"<button class="jobs-apply-button">Apply</button>"#)
        .unwrap();

    let injection = script.on_mutations().unwrap();
    assert!(matches!(injection, Some(Injection::Inserted { .. })));
    assert_eq!(marker_count(&script), 1);

    // Our own insertion does not count as a pending change.
    assert_eq!(script.on_mutations().unwrap(), None);
}

#[test]
fn re_render_of_apply_area_restores_buttons_once() {
    let mut script = booted(r#"<button class="jobs-apply-button">Apply</button>"#);
    let apply_area = script
        .page()
        .query(&Selector::parse(".jobs-s-apply").unwrap())
        .unwrap();

    for _ in 0..3 {
        script
            .page_mut()
            .replace_children(apply_area, r#"<button class="jobs-apply-button">Apply</button>"#)
            .unwrap();
        script.on_mutations().unwrap();
        assert_eq!(marker_count(&script), 1);
    }
}

fn boot_at(url: &str, html: &str) -> ContentScript {
    let page = PageDocument::parse(url, html).unwrap();
    let mut script = ContentScript::boot(9, page, ObserverMode::ApplyContainer).unwrap();
    script.start().unwrap();
    script
}

fn node(script: &ContentScript, css: &str) -> ego_tree::NodeId {
    script.page().query(&Selector::parse(css).unwrap()).unwrap()
}

#[test]
fn apply_area_beside_the_top_card_is_observed_and_restored() {
    let mut script = boot_at(
        URL,
        r#"<html><body>
        <div class="jobs-unified-top-card">
          <h1 class="jobs-unified-top-card__job-title">Platform Engineer</h1>
          <span class="jobs-unified-top-card__company-name">Globex</span>
        </div>
        <div class="jobs-s-apply"><button class="jobs-apply-button">Apply</button></div>
        </body></html>"#,
    );
    let apply_area = node(&script, ".jobs-s-apply");
    assert_eq!(script.observer().scope(), ObserveScope::Container(apply_area));
    assert_eq!(marker_count(&script), 1);

    script
        .page_mut()
        .replace_children(apply_area, r#"<button class="jobs-apply-button">Apply</button>"#)
        .unwrap();

    let injection = script.on_mutations().unwrap();
    assert!(matches!(injection, Some(Injection::Inserted { .. })));
    assert_eq!(marker_count(&script), 1);
}

#[test]
fn unlisted_apply_wrapper_falls_back_to_the_button_parent() {
    let mut script = boot_at(
        URL,
        r#"<html><body>
        <div class="jobs-unified-top-card"><h1>Platform Engineer</h1></div>
        <section id="actions"><button class="jobs-apply-button">Apply</button></section>
        </body></html>"#,
    );
    let actions = node(&script, "#actions");
    assert_eq!(script.observer().scope(), ObserveScope::Container(actions));

    script
        .page_mut()
        .replace_children(actions, r#"<button class="jobs-apply-button">Apply</button>"#)
        .unwrap();
    script.on_mutations().unwrap();
    assert_eq!(marker_count(&script), 1);
}

#[test]
fn detached_container_is_replaced_by_the_re_rendered_one() {
    const CARD: &str = r#"<div class="jobs-unified-top-card">
          <h1 class="jobs-unified-top-card__job-title">Platform Engineer</h1>
          <div class="jobs-s-apply"><button class="jobs-apply-button">Apply</button></div>
        </div>"#;
    let mut script = boot_at(
        URL,
        &format!(r#"<html><body><main id="view">{CARD}</main></body></html>"#),
    );
    let old_card = node(&script, ".jobs-unified-top-card");
    assert_eq!(script.observer().scope(), ObserveScope::Container(old_card));

    let view = node(&script, "#view");
    script.page_mut().replace_children(view, CARD).unwrap();

    let injection = script.on_mutations().unwrap();
    assert!(matches!(injection, Some(Injection::Inserted { .. })));
    assert_eq!(marker_count(&script), 1);
    let new_card = node(&script, ".jobs-unified-top-card");
    assert_ne!(new_card, old_card);
    assert_eq!(script.observer().scope(), ObserveScope::Container(new_card));
}

#[test]
fn indeed_buttons_return_after_re_render() {
    let mut script = boot_at(
        "https://www.indeed.com/viewjob?jk=abc",
        r#"<html><body>
        <h1 class="jobsearch-JobInfoHeader-title">Data Analyst</h1>
        <div id="jobsearch-ViewJobButtons-container">
          <button id="indeedApplyButton">Apply now</button>
        </div>
        <aside id="ads"></aside>
        </body></html>"#,
    );
    let buttons = node(&script, "#jobsearch-ViewJobButtons-container");
    assert_eq!(script.observer().scope(), ObserveScope::Container(buttons));
    assert_eq!(marker_count(&script), 1);

    let ads = node(&script, "#ads");
    script.page_mut().append_html(ads, "<p>banner</p>").unwrap();
    assert_eq!(script.on_mutations().unwrap(), None);

    script
        .page_mut()
        .replace_children(buttons, r#"<button id="indeedApplyButton">Apply now</button>"#)
        .unwrap();
    let injection = script.on_mutations().unwrap();
    assert!(matches!(injection, Some(Injection::Inserted { .. })));
    assert_eq!(marker_count(&script), 1);
}

#[test]
fn clicking_injected_buttons_produces_messages() {
    let mut script = booted(r#"<button class="jobs-apply-button">Apply</button>"#);

    let autofill = script.button(ButtonAction::Autofill).unwrap();
    assert_eq!(script.click(autofill), Some(Message::OpenResumePicker));

    let save = script.button(ButtonAction::SaveJob).unwrap();
    assert_eq!(
        script.click(save),
        Some(Message::SaveJob(JobPosting {
            title: "Platform Engineer".to_string(),
            company: "Globex".to_string(),
            location: "Springfield".to_string(),
            url: URL.to_string(),
        }))
    );
}

#[test]
fn clicks_elsewhere_produce_nothing() {
    let mut script = booted(r#"<button class="jobs-apply-button">Apply</button>"#);
    let apply = script
        .page()
        .query(&Selector::parse(".jobs-apply-button").unwrap())
        .unwrap();
    assert_eq!(script.click(apply), None);
}

#[test]
fn fill_form_reports_filled_and_skipped_fields() {
    let mut script = booted("");
    let request = FillFormRequest {
        tab_id: Some(7),
        details: PersonalDetails {
            first_name: Some("Ada".to_string()),
            email: Some("ada@example.com".to_string()),
            phone: Some("555".to_string()),
            ..PersonalDetails::default()
        },
    };

    let reply = script.route(Message::FillForm(request)).unwrap();

    assert!(reply.is_success());
    assert_eq!(reply.get("filled"), Some(&json!(["firstName"])));
    assert_eq!(reply.get("skipped"), Some(&json!(["email", "phone"])));
}

#[test]
fn extract_job_data_replies_with_posting_or_failure() {
    let mut script = booted("");
    let reply = script
        .route(Message::ExtractJobData(TabTarget::default()))
        .unwrap();
    assert!(reply.is_success());
    assert_eq!(
        reply.field::<JobPosting>("job").map(|job| job.company),
        Some("Globex".to_string())
    );

    let page = PageDocument::parse(URL, "<html><body><h1>Feed</h1></body></html>").unwrap();
    let mut empty = ContentScript::boot(8, page, ObserverMode::Body).unwrap();
    let reply = empty
        .route(Message::ExtractJobData(TabTarget::default()))
        .unwrap();
    assert!(!reply.is_success());
    assert_eq!(reply.error_message(), Some("No job data found"));
}

#[test]
fn auth_broadcast_is_recorded_without_reply() {
    let mut script = booted("");
    assert_eq!(script.is_authenticated(), None);

    let reply = script.route(Message::AuthStateChanged(AuthState {
        is_authenticated: true,
    }));

    assert_eq!(reply, None);
    assert_eq!(script.is_authenticated(), Some(true));
}

#[test]
fn background_only_and_unknown_messages_are_rejected() {
    let mut script = booted("");

    let reply = script.route(Message::GetResumeData).unwrap();
    assert_eq!(reply.error_message(), Some(UNKNOWN_MESSAGE_TYPE));

    let reply = script
        .route_envelope(&Envelope::new("DELETE_EVERYTHING", None))
        .unwrap();
    assert_eq!(reply.into_json(), json!({ "error": "Unknown message type" }));

    let reply = script
        .route_envelope(&Envelope::new("FILL_FORM", None))
        .unwrap();
    assert_eq!(
        reply.error_message(),
        Some("Invalid FILL_FORM payload: missing data")
    );
}
