use assist_logging::assist_trace;
use ego_tree::NodeId;
use serde::Deserialize;

use crate::dom::{Mutation, PageDocument};
use crate::site::SiteAdapter;

/// What part of the page the content script watches for re-renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ObserverMode {
    /// Whole document body, indefinitely.
    Body,
    /// The container holding the site's apply button when rendered, the body otherwise.
    #[default]
    ApplyContainer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserveScope {
    Body,
    Container(NodeId),
}

#[derive(Debug, Clone)]
pub struct ScopedObserver {
    mode: ObserverMode,
    scope: ObserveScope,
}

impl ScopedObserver {
    pub fn new(mode: ObserverMode) -> Self {
        Self {
            mode,
            scope: ObserveScope::Body,
        }
    }

    pub fn scope(&self) -> ObserveScope {
        self.scope
    }

    /// Narrow to the site's container when the mode allows and it is rendered.
    pub fn rescope(&mut self, page: &PageDocument, adapter: &SiteAdapter) {
        self.scope = match self.mode {
            ObserverMode::Body => ObserveScope::Body,
            ObserverMode::ApplyContainer => adapter
                .observe_root(page)
                .map(ObserveScope::Container)
                .unwrap_or(ObserveScope::Body),
        };
        assist_trace!("Observer scope is now {:?}", self.scope);
    }

    /// Whether any record in `mutations` falls inside the observed scope.
    pub fn is_relevant(&self, page: &PageDocument, mutations: &[Mutation]) -> bool {
        if mutations.is_empty() {
            return false;
        }
        match self.scope {
            ObserveScope::Body => match page.body() {
                Some(body) => mutations.iter().any(|m| page.contains(body, m.target)),
                None => true,
            },
            // A detached container means the view was re-rendered around it.
            ObserveScope::Container(container) if !page.is_attached(container) => true,
            ObserveScope::Container(container) => {
                mutations.iter().any(|m| page.contains(container, m.target))
            }
        }
    }
}
