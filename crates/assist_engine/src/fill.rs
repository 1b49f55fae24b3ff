use assist_core::{FormField, PersonalDetails};
use assist_logging::{assist_debug, assist_info};
use ego_tree::NodeId;
use scraper::Selector;

use crate::dom::{compile_selectors, EventKind, PageDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOutcome {
    Filled(NodeId),
    /// No value for this field in the personal details.
    NoValue,
    /// No empty candidate input on the page.
    NoTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FillReport {
    pub outcomes: Vec<(FormField, FieldOutcome)>,
}

impl FillReport {
    pub fn filled(&self) -> Vec<FormField> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, FieldOutcome::Filled(_)))
            .map(|(field, _)| *field)
            .collect()
    }

    pub fn skipped(&self) -> Vec<FormField> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == FieldOutcome::NoTarget)
            .map(|(field, _)| *field)
            .collect()
    }

    pub fn outcome(&self, field: FormField) -> Option<FieldOutcome> {
        self.outcomes
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, outcome)| *outcome)
    }
}

fn candidate_selectors(field: FormField) -> &'static [&'static str] {
    match field {
        FormField::FirstName => &[
            "input[autocomplete=\"given-name\"]",
            "input[name*=\"firstName\"]",
            "input[name*=\"first_name\"]",
            "input[name*=\"first-name\"]",
            "input[id*=\"firstName\"]",
            "input[id*=\"first_name\"]",
            "input[id*=\"first-name\"]",
            "input[placeholder*=\"First\"]",
        ],
        FormField::LastName => &[
            "input[autocomplete=\"family-name\"]",
            "input[name*=\"lastName\"]",
            "input[name*=\"last_name\"]",
            "input[name*=\"last-name\"]",
            "input[id*=\"lastName\"]",
            "input[id*=\"last_name\"]",
            "input[id*=\"last-name\"]",
            "input[placeholder*=\"Last\"]",
        ],
        FormField::Email => &[
            "input[type=\"email\"]",
            "input[autocomplete=\"email\"]",
            "input[name*=\"email\"]",
            "input[id*=\"email\"]",
        ],
        FormField::Phone => &[
            "input[type=\"tel\"]",
            "input[autocomplete=\"tel\"]",
            "input[name*=\"phone\"]",
            "input[id*=\"phone\"]",
        ],
        FormField::City => &[
            "input[autocomplete=\"address-level2\"]",
            "input[name*=\"city\"]",
            "input[id*=\"city\"]",
            "input[name*=\"location\"]",
            "input[id*=\"location\"]",
        ],
        FormField::Summary => &[
            "textarea[name*=\"summary\"]",
            "textarea[id*=\"summary\"]",
            "textarea[name*=\"cover\"]",
            "textarea[id*=\"cover\"]",
            "textarea[name*=\"message\"]",
        ],
    }
}

/// Writes personal details into application forms, one input per field.
#[derive(Debug)]
pub struct FormFiller {
    candidates: Vec<(FormField, Vec<Selector>)>,
}

impl FormFiller {
    pub fn new() -> Self {
        let candidates = FormField::ALL
            .into_iter()
            .map(|field| (field, compile_selectors(candidate_selectors(field))))
            .collect();
        Self { candidates }
    }

    /// Fill each field into the first empty candidate. Non-empty inputs are never touched.
    pub fn fill(&self, page: &mut PageDocument, details: &PersonalDetails) -> FillReport {
        let mut report = FillReport::default();
        for (field, selectors) in &self.candidates {
            let outcome = match details.value(*field) {
                None => FieldOutcome::NoValue,
                Some(value) => match find_empty_target(page, selectors) {
                    Some(target) => {
                        write_value(page, target, value);
                        FieldOutcome::Filled(target)
                    }
                    None => {
                        assist_debug!("No empty input for {} on {}", field.as_str(), page.href());
                        FieldOutcome::NoTarget
                    }
                },
            };
            report.outcomes.push((*field, outcome));
        }
        assist_info!(
            "Filled {} field(s) on {}",
            report.filled().len(),
            page.href()
        );
        report
    }
}

impl Default for FormFiller {
    fn default() -> Self {
        Self::new()
    }
}

fn find_empty_target(page: &PageDocument, selectors: &[Selector]) -> Option<NodeId> {
    selectors.iter().find_map(|selector| {
        page.query_all(selector)
            .into_iter()
            .find(|node| !is_hidden_input(page, *node) && page.value(*node).trim().is_empty())
    })
}

/// `type` values are ASCII case-insensitive and the parser keeps the source casing.
fn is_hidden_input(page: &PageDocument, node: NodeId) -> bool {
    page.attr(node, "type")
        .is_some_and(|kind| kind.trim().eq_ignore_ascii_case("hidden"))
}

fn write_value(page: &mut PageDocument, target: NodeId, value: &str) {
    if page.set_value(target, value).is_ok() {
        // Framework-bound listeners only notice programmatic changes through events.
        page.dispatch_event(target, EventKind::Input);
        page.dispatch_event(target, EventKind::Change);
    }
}
