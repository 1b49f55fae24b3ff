use assist_core::JobPosting;
use assist_logging::assist_debug;
use ego_tree::NodeId;
use scraper::Selector;

use crate::dom::{compile_selectors, PageDocument};
use crate::inject::ButtonStyle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteKind {
    LinkedIn,
    Indeed,
}

impl SiteKind {
    /// Pick the site by hostname substring.
    pub fn from_hostname(hostname: &str) -> Option<Self> {
        let hostname = hostname.to_ascii_lowercase();
        if hostname.contains("linkedin.com") {
            Some(SiteKind::LinkedIn)
        } else if hostname.contains("indeed.com") {
            Some(SiteKind::Indeed)
        } else {
            None
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SiteKind::LinkedIn => "LinkedIn",
            SiteKind::Indeed => "Indeed",
        }
    }
}

/// Selector tables and styling for one job site. Each list is tried in order.
pub trait JobSite: Send + Sync {
    fn kind(&self) -> SiteKind;
    fn title_selectors(&self) -> &'static [&'static str];
    fn company_selectors(&self) -> &'static [&'static str];
    fn location_selectors(&self) -> &'static [&'static str];
    fn apply_button_selectors(&self) -> &'static [&'static str];
    /// Element the apply control renders in; the scope for mutation observation.
    fn container_selectors(&self) -> &'static [&'static str];
    fn button_style(&self) -> ButtonStyle;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LinkedIn;

impl JobSite for LinkedIn {
    fn kind(&self) -> SiteKind {
        SiteKind::LinkedIn
    }

    fn title_selectors(&self) -> &'static [&'static str] {
        &[
            ".job-details-jobs-unified-top-card__job-title",
            ".jobs-unified-top-card__job-title",
            ".top-card-layout__title",
            "h1.t-24",
        ]
    }

    fn company_selectors(&self) -> &'static [&'static str] {
        &[
            ".job-details-jobs-unified-top-card__company-name",
            ".jobs-unified-top-card__company-name",
            ".topcard__org-name-link",
        ]
    }

    fn location_selectors(&self) -> &'static [&'static str] {
        &[
            ".job-details-jobs-unified-top-card__bullet",
            ".jobs-unified-top-card__bullet",
            ".topcard__flavor--bullet",
        ]
    }

    fn apply_button_selectors(&self) -> &'static [&'static str] {
        &[
            ".jobs-apply-button--top-card",
            ".jobs-apply-button",
            ".jobs-s-apply button",
        ]
    }

    fn container_selectors(&self) -> &'static [&'static str] {
        &[
            ".job-details-jobs-unified-top-card__container--two-pane",
            ".jobs-unified-top-card",
            ".jobs-s-apply",
        ]
    }

    fn button_style(&self) -> ButtonStyle {
        ButtonStyle {
            group: "display:inline-flex;gap:8px;margin-left:8px;vertical-align:middle",
            primary: "background:#0a66c2;color:#fff;border:none;border-radius:16px;padding:6px 16px;font-weight:600;cursor:pointer",
            secondary: "background:#fff;color:#0a66c2;border:1px solid #0a66c2;border-radius:16px;padding:6px 16px;font-weight:600;cursor:pointer",
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Indeed;

impl JobSite for Indeed {
    fn kind(&self) -> SiteKind {
        SiteKind::Indeed
    }

    fn title_selectors(&self) -> &'static [&'static str] {
        &[
            ".jobsearch-JobInfoHeader-title",
            "h1[data-testid=\"jobsearch-JobInfoHeader-title\"]",
            "h2[data-testid=\"jobsearch-JobInfoHeader-title\"]",
        ]
    }

    fn company_selectors(&self) -> &'static [&'static str] {
        &[
            "[data-testid=\"inlineHeader-companyName\"]",
            "[data-company-name=\"true\"]",
            ".jobsearch-CompanyInfoContainer a",
        ]
    }

    fn location_selectors(&self) -> &'static [&'static str] {
        &[
            "[data-testid=\"inlineHeader-companyLocation\"]",
            "[data-testid=\"job-location\"]",
            ".jobsearch-JobInfoHeader-subtitle > div:last-child",
        ]
    }

    fn apply_button_selectors(&self) -> &'static [&'static str] {
        &[
            "#indeedApplyButton",
            ".jobsearch-IndeedApplyButton-newDesign",
            "button[aria-label*=\"Apply\"]",
        ]
    }

    fn container_selectors(&self) -> &'static [&'static str] {
        &[
            "#jobsearch-ViewJobButtons-container",
            ".jobsearch-ViewJobButtons-container",
            ".jobsearch-InfoHeaderContainer",
        ]
    }

    fn button_style(&self) -> ButtonStyle {
        ButtonStyle {
            group: "display:flex;gap:8px;margin-top:8px",
            primary: "background:#2557a7;color:#fff;border:none;border-radius:8px;padding:10px 16px;font-weight:700;cursor:pointer",
            secondary: "background:#fff;color:#2557a7;border:1px solid #2557a7;border-radius:8px;padding:10px 16px;font-weight:700;cursor:pointer",
        }
    }
}

/// Compiled selector tables for the site a content script runs on.
#[derive(Debug)]
pub struct SiteAdapter {
    kind: SiteKind,
    title: Vec<Selector>,
    company: Vec<Selector>,
    location: Vec<Selector>,
    apply_button: Vec<Selector>,
    container: Vec<Selector>,
    style: ButtonStyle,
}

impl SiteAdapter {
    pub fn new(site: &dyn JobSite) -> Self {
        Self {
            kind: site.kind(),
            title: compile_selectors(site.title_selectors()),
            company: compile_selectors(site.company_selectors()),
            location: compile_selectors(site.location_selectors()),
            apply_button: compile_selectors(site.apply_button_selectors()),
            container: compile_selectors(site.container_selectors()),
            style: site.button_style(),
        }
    }

    pub fn for_hostname(hostname: &str) -> Option<Self> {
        let adapter = match SiteKind::from_hostname(hostname)? {
            SiteKind::LinkedIn => Self::new(&LinkedIn),
            SiteKind::Indeed => Self::new(&Indeed),
        };
        Some(adapter)
    }

    pub fn kind(&self) -> SiteKind {
        self.kind
    }

    pub fn button_style(&self) -> ButtonStyle {
        self.style
    }

    /// Read the posting on the page. `None` unless both title and company are found.
    pub fn detect_job(&self, page: &PageDocument) -> Option<JobPosting> {
        let Some(title) = page.first_text(&self.title) else {
            assist_debug!("{}: no job title on {}", self.kind.name(), page.href());
            return None;
        };
        let Some(company) = page.first_text(&self.company) else {
            assist_debug!("{}: no company on {}", self.kind.name(), page.href());
            return None;
        };
        let location = page.first_text(&self.location).unwrap_or_default();

        Some(JobPosting {
            title,
            company,
            location,
            url: page.href().to_string(),
        })
    }

    pub fn apply_button(&self, page: &PageDocument) -> Option<NodeId> {
        page.first_match(&self.apply_button)
    }

    /// The listed container that holds the current apply button, else the button's parent.
    ///
    /// `None` while no apply button is rendered.
    pub fn observe_root(&self, page: &PageDocument) -> Option<NodeId> {
        let button = self.apply_button(page)?;
        self.container
            .iter()
            .flat_map(|selector| page.query_all(selector))
            .find(|root| page.contains(*root, button))
            .or_else(|| page.parent(button))
    }
}
