use assist_core::{FormField, JobPosting, PersonalDetails};
use assist_engine::{
    find_button, ButtonAction, EventKind, FieldOutcome, FormFiller, Injection, ObserveScope,
    ObserverMode, PageDocument, ScopedObserver, SiteAdapter, SiteKind, UiInjector, MARKER_ID,
};
use pretty_assertions::assert_eq;
use scraper::Selector;

const LINKEDIN_URL: &str = "https://www.linkedin.com/jobs/view/3912345678/";

fn linkedin_page(extra: &str) -> PageDocument {
    let html = format!(
        r#"<html><body>
        <div class="job-details-jobs-unified-top-card__container--two-pane">
          <h1 class="job-details-jobs-unified-top-card__job-title">Engineer</h1>
          <div class="job-details-jobs-unified-top-card__company-name"><a href="/company/acme">Acme</a></div>
          <div class="jobs-s-apply"><button class="jobs-apply-button">Easy Apply</button></div>
        </div>
        {extra}
        </body></html>"#
    );
    PageDocument::parse(LINKEDIN_URL, &html).unwrap()
}

fn node(page: &PageDocument, css: &str) -> ego_tree::NodeId {
    page.query(&Selector::parse(css).unwrap()).unwrap()
}

#[test]
fn linkedin_posting_is_detected_with_empty_location() {
    let page = linkedin_page("");
    let adapter = SiteAdapter::for_hostname(page.hostname()).unwrap();

    assert_eq!(adapter.kind(), SiteKind::LinkedIn);
    assert_eq!(
        adapter.detect_job(&page),
        Some(JobPosting {
            title: "Engineer".to_string(),
            company: "Acme".to_string(),
            location: String::new(),
            url: LINKEDIN_URL.to_string(),
        })
    );
}

#[test]
fn indeed_posting_uses_first_matching_selector() {
    let html = r#"<html><body>
        <h1 class="jobsearch-JobInfoHeader-title"><span>Data   Analyst</span></h1>
        <div data-testid="inlineHeader-companyName"><a>Initech</a></div>
        <div data-testid="inlineHeader-companyLocation">Austin, TX</div>
        </body></html>"#;
    let page = PageDocument::parse("https://uk.indeed.com/viewjob?jk=abc", html).unwrap();
    let adapter = SiteAdapter::for_hostname(page.hostname()).unwrap();

    let job = adapter.detect_job(&page).unwrap();
    assert_eq!(adapter.kind(), SiteKind::Indeed);
    assert_eq!(job.title, "Data Analyst");
    assert_eq!(job.company, "Initech");
    assert_eq!(job.location, "Austin, TX");
    assert_eq!(job.url, "https://uk.indeed.com/viewjob?jk=abc");
}

#[test]
fn missing_company_yields_no_posting() {
    let html = r#"<html><body>
        <h1 class="job-details-jobs-unified-top-card__job-title">Engineer</h1>
        <div class="job-details-jobs-unified-top-card__company-name">   </div>
        </body></html>"#;
    let page = PageDocument::parse(LINKEDIN_URL, html).unwrap();
    let adapter = SiteAdapter::for_hostname(page.hostname()).unwrap();

    assert_eq!(adapter.detect_job(&page), None);
}

#[test]
fn unsupported_host_has_no_adapter() {
    assert!(SiteAdapter::for_hostname("jobs.example.org").is_none());
}

#[test]
fn buttons_are_injected_once_after_apply_button() {
    let mut page = linkedin_page("");
    let adapter = SiteAdapter::for_hostname(page.hostname()).unwrap();
    let injector = UiInjector::new();

    let first = injector.ensure_buttons_present(&mut page, &adapter).unwrap();
    let Injection::Inserted { group } = first else {
        panic!("expected insertion, got {first:?}");
    };
    for _ in 0..5 {
        assert_eq!(
            injector.ensure_buttons_present(&mut page, &adapter).unwrap(),
            Injection::AlreadyPresent
        );
    }

    let markers = page.query_all(&Selector::parse(&format!("#{MARKER_ID}")).unwrap());
    assert_eq!(markers, vec![group]);

    let apply = node(&page, ".jobs-apply-button");
    assert_eq!(page.parent(group), page.parent(apply));
    let html = page.outer_html();
    let apply_at = html.find("Easy Apply").unwrap();
    let group_at = html.find(MARKER_ID).unwrap();
    assert!(apply_at < group_at, "group must follow the apply button");

    let autofill = find_button(&page, ButtonAction::Autofill).unwrap();
    let save = find_button(&page, ButtonAction::SaveJob).unwrap();
    assert_eq!(page.text(autofill).as_deref(), Some("Autofill with Resume"));
    assert_eq!(page.text(save).as_deref(), Some("Save Job"));
}

#[test]
fn nothing_is_injected_without_an_apply_button() {
    let html = r#"<html><body>
        <h1 class="job-details-jobs-unified-top-card__job-title">Engineer</h1>
        </body></html>"#;
    let mut page = PageDocument::parse(LINKEDIN_URL, html).unwrap();
    let adapter = SiteAdapter::for_hostname(page.hostname()).unwrap();

    let injection = UiInjector::new()
        .ensure_buttons_present(&mut page, &adapter)
        .unwrap();

    assert_eq!(injection, Injection::NoAnchor);
    assert!(page.find_by_id(MARKER_ID).is_none());
}

const APPLICATION_FORM: &str = r#"
    <form>
      <input type="hidden" name="firstName_token" value="">
      <input name="firstName" id="first">
      <input name="lastName" value="Existing">
      <input type="email" name="email">
      <input type="email" name="email_confirm">
      <input name="city_input" id="city">
      <textarea name="summary"></textarea>
    </form>"#;

fn details() -> PersonalDetails {
    PersonalDetails {
        first_name: Some("Ada".to_string()),
        last_name: Some("Lovelace".to_string()),
        email: Some("ada@example.com".to_string()),
        phone: Some("+44 20 7946 0000".to_string()),
        city: Some("London".to_string()),
        summary: Some("Analytical engines.".to_string()),
    }
}

#[test]
fn filler_fills_empty_inputs_and_dispatches_events() {
    let mut page = linkedin_page(APPLICATION_FORM);
    let report = FormFiller::new().fill(&mut page, &details());

    let first = node(&page, "#first");
    assert_eq!(page.value(first), "Ada");
    assert_eq!(page.value(node(&page, "input[name=\"email\"]")), "ada@example.com");
    // One target per field: the confirmation input stays empty.
    assert_eq!(page.value(node(&page, "input[name=\"email_confirm\"]")), "");
    assert_eq!(page.value(node(&page, "#city")), "London");
    assert_eq!(page.value(node(&page, "textarea")), "Analytical engines.");

    let kinds: Vec<EventKind> = page
        .events()
        .iter()
        .filter(|event| event.target == first)
        .map(|event| event.kind)
        .collect();
    assert_eq!(kinds, vec![EventKind::Input, EventKind::Change]);
    assert!(page.events().iter().all(|event| event.bubbles));

    assert_eq!(report.outcome(FormField::FirstName), Some(FieldOutcome::Filled(first)));
}

#[test]
fn filler_never_overwrites_existing_values() {
    let mut page = linkedin_page(APPLICATION_FORM);
    let filler = FormFiller::new();
    let report = filler.fill(&mut page, &details());

    assert_eq!(page.value(node(&page, "input[name=\"lastName\"]")), "Existing");
    assert_eq!(
        report.outcome(FormField::LastName),
        Some(FieldOutcome::NoTarget)
    );
    assert!(report.skipped().contains(&FormField::Phone));

    // A second pass finds nothing empty left to fill for the filled fields.
    let mut changed = details();
    changed.first_name = Some("Grace".to_string());
    filler.fill(&mut page, &changed);
    assert_eq!(page.value(node(&page, "#first")), "Ada");
}

#[test]
fn hidden_inputs_are_not_fill_targets() {
    let mut page = linkedin_page(APPLICATION_FORM);
    FormFiller::new().fill(&mut page, &details());

    assert_eq!(page.value(node(&page, "input[type=\"hidden\"]")), "");
}

#[test]
fn hidden_type_is_matched_case_insensitively() {
    let mut page = linkedin_page(
        r#"<form><input type="HIDDEN" name="firstName"><input name="first_name"></form>"#,
    );
    let report = FormFiller::new().fill(&mut page, &details());

    assert_eq!(page.value(node(&page, "input[name=\"firstName\"]")), "");
    let visible = node(&page, "input[name=\"first_name\"]");
    assert_eq!(page.value(visible), "Ada");
    assert_eq!(
        report.outcome(FormField::FirstName),
        Some(FieldOutcome::Filled(visible))
    );
}

#[test]
fn missing_values_are_reported_separately_from_missing_targets() {
    let mut page = linkedin_page(APPLICATION_FORM);
    let report = FormFiller::new().fill(&mut page, &PersonalDetails::default());

    assert!(report.filled().is_empty());
    assert!(report.skipped().is_empty());
    assert_eq!(
        report.outcome(FormField::Email),
        Some(FieldOutcome::NoValue)
    );
}

#[test]
fn observer_narrows_to_apply_container_and_ignores_outside_changes() {
    let mut page = linkedin_page("<aside id=\"ads\"></aside>");
    let adapter = SiteAdapter::for_hostname(page.hostname()).unwrap();
    let mut observer = ScopedObserver::new(ObserverMode::ApplyContainer);
    observer.rescope(&page, &adapter);

    let container = node(&page, ".job-details-jobs-unified-top-card__container--two-pane");
    assert_eq!(observer.scope(), ObserveScope::Container(container));

    page.take_mutations();
    let ads = node(&page, "#ads");
    page.append_html(ads, "<p>banner</p>").unwrap();
    let mutations = page.take_mutations();
    assert!(!observer.is_relevant(&page, &mutations));

    let apply_wrapper = node(&page, ".jobs-s-apply");
    page.replace_children(apply_wrapper, "<button class=\"jobs-apply-button\">Apply</button>")
        .unwrap();
    let mutations = page.take_mutations();
    assert!(observer.is_relevant(&page, &mutations));
}

#[test]
fn body_mode_sees_every_change() {
    let mut page = linkedin_page("<aside id=\"ads\"></aside>");
    let adapter = SiteAdapter::for_hostname(page.hostname()).unwrap();
    let mut observer = ScopedObserver::new(ObserverMode::Body);
    observer.rescope(&page, &adapter);
    assert_eq!(observer.scope(), ObserveScope::Body);

    page.take_mutations();
    let ads = node(&page, "#ads");
    page.append_html(ads, "<p>banner</p>").unwrap();
    let mutations = page.take_mutations();
    assert!(observer.is_relevant(&page, &mutations));
}

#[test]
fn detached_container_counts_as_a_re_render() {
    let mut page = PageDocument::parse(
        LINKEDIN_URL,
        r#"<html><body><main id="view">
        <div class="jobs-unified-top-card">
          <div class="jobs-s-apply"><button class="jobs-apply-button">Apply</button></div>
        </div>
        </main></body></html>"#,
    )
    .unwrap();
    let adapter = SiteAdapter::for_hostname(page.hostname()).unwrap();
    let mut observer = ScopedObserver::new(ObserverMode::ApplyContainer);
    observer.rescope(&page, &adapter);
    let card = node(&page, ".jobs-unified-top-card");
    assert_eq!(observer.scope(), ObserveScope::Container(card));

    page.take_mutations();
    let view = node(&page, "#view");
    page.replace_children(view, "<p>loading</p>").unwrap();
    let mutations = page.take_mutations();

    assert!(!page.is_attached(card));
    assert!(observer.is_relevant(&page, &mutations));

    observer.rescope(&page, &adapter);
    assert_eq!(observer.scope(), ObserveScope::Body);
}

#[test]
fn container_without_the_apply_button_is_not_the_scope() {
    let page = PageDocument::parse(
        LINKEDIN_URL,
        r#"<html><body>
        <div class="jobs-unified-top-card"><h1>Engineer</h1></div>
        <div class="jobs-s-apply"><button class="jobs-apply-button">Apply</button></div>
        </body></html>"#,
    )
    .unwrap();
    let adapter = SiteAdapter::for_hostname(page.hostname()).unwrap();

    assert_eq!(adapter.observe_root(&page), Some(node(&page, ".jobs-s-apply")));
}
