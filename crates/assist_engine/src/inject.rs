use assist_logging::{assist_debug, assist_info};
use ego_tree::NodeId;

use crate::dom::{PageDocument, PageError};
use crate::site::SiteAdapter;

/// Id of the injected button group; its presence makes injection a no-op.
pub const MARKER_ID: &str = "job-assist-actions";
pub const ACTION_ATTR: &str = "data-job-assist-action";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Autofill,
    SaveJob,
}

impl ButtonAction {
    pub const ALL: [ButtonAction; 2] = [ButtonAction::Autofill, ButtonAction::SaveJob];

    pub fn attr_value(self) -> &'static str {
        match self {
            ButtonAction::Autofill => "autofill",
            ButtonAction::SaveJob => "save-job",
        }
    }

    pub fn from_attr(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.attr_value() == value)
    }

    pub fn label(self) -> &'static str {
        match self {
            ButtonAction::Autofill => "Autofill with Resume",
            ButtonAction::SaveJob => "Save Job",
        }
    }
}

/// Inline CSS for the button group and its two buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonStyle {
    pub group: &'static str,
    pub primary: &'static str,
    pub secondary: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Injection {
    AlreadyPresent,
    /// The site's apply control is not rendered (yet).
    NoAnchor,
    Inserted { group: NodeId },
}

#[derive(Debug, Default)]
pub struct UiInjector;

impl UiInjector {
    pub fn new() -> Self {
        Self
    }

    /// Insert the button group after the site's apply control unless it is already there.
    pub fn ensure_buttons_present(
        &self,
        page: &mut PageDocument,
        adapter: &SiteAdapter,
    ) -> Result<Injection, PageError> {
        if page.find_by_id(MARKER_ID).is_some() {
            return Ok(Injection::AlreadyPresent);
        }
        let Some(apply_button) = adapter.apply_button(page) else {
            assist_debug!("{}: apply button not rendered yet", adapter.kind().name());
            return Ok(Injection::NoAnchor);
        };

        let markup = button_group_markup(adapter);
        let inserted = page.insert_after(apply_button, &markup)?;
        let group = inserted
            .into_iter()
            .find(|id| page.attr(*id, "id") == Some(MARKER_ID))
            .ok_or(PageError::UnknownNode)?;

        assist_info!("Injected action buttons on {}", page.href());
        Ok(Injection::Inserted { group })
    }
}

/// Action of the injected button `node` belongs to, if any.
pub fn action_for(page: &PageDocument, node: NodeId) -> Option<ButtonAction> {
    let group = page.find_by_id(MARKER_ID)?;
    if !page.contains(group, node) {
        return None;
    }
    // Walk up from the click target, e.g. from a label span to its button.
    let mut current = Some(node);
    while let Some(id) = current {
        if let Some(action) = page.attr(id, ACTION_ATTR).and_then(ButtonAction::from_attr) {
            return Some(action);
        }
        current = if id == group { None } else { page.parent(id) };
    }
    None
}

/// The injected button for `action`.
pub fn find_button(page: &PageDocument, action: ButtonAction) -> Option<NodeId> {
    let selector =
        scraper::Selector::parse(&format!("#{MARKER_ID} [{ACTION_ATTR}=\"{}\"]", action.attr_value()))
            .ok()?;
    page.query(&selector)
}

fn button_group_markup(adapter: &SiteAdapter) -> String {
    let style = adapter.button_style();
    format!(
        concat!(
            "<div id=\"{marker}\" style=\"{group}\">",
            "<button type=\"button\" {attr}=\"{autofill}\" style=\"{primary}\">{autofill_label}</button>",
            "<button type=\"button\" {attr}=\"{save}\" style=\"{secondary}\">{save_label}</button>",
            "</div>"
        ),
        marker = MARKER_ID,
        group = style.group,
        attr = ACTION_ATTR,
        autofill = ButtonAction::Autofill.attr_value(),
        primary = style.primary,
        autofill_label = ButtonAction::Autofill.label(),
        save = ButtonAction::SaveJob.attr_value(),
        secondary = style.secondary,
        save_label = ButtonAction::SaveJob.label(),
    )
}
