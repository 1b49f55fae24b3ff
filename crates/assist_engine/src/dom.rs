use std::collections::HashMap;
use std::fmt;

use assist_logging::assist_warn;
use ego_tree::{NodeId, NodeMut, NodeRef};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("invalid page url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("node is not part of the document")]
    UnknownNode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Input,
    Change,
    Click,
}

/// A synthetic event dispatched on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomEvent {
    pub target: NodeId,
    pub kind: EventKind,
    pub bubbles: bool,
}

/// Child-list change under `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mutation {
    pub target: NodeId,
}

/// Live document of one tab.
///
/// The parsed tree is mutated in place for structural changes (injected
/// markup, re-rendered containers). Form control values live in a side table,
/// like the `value` property of a real DOM input shadows its attribute.
pub struct PageDocument {
    url: Url,
    html: Html,
    values: HashMap<NodeId, String>,
    events: Vec<DomEvent>,
    mutations: Vec<Mutation>,
}

impl fmt::Debug for PageDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageDocument")
            .field("url", &self.url.as_str())
            .field("values", &self.values.len())
            .field("events", &self.events.len())
            .field("pending_mutations", &self.mutations.len())
            .finish()
    }
}

impl PageDocument {
    pub fn parse(page_url: &str, html: &str) -> Result<Self, PageError> {
        let url = Url::parse(page_url).map_err(|err| PageError::InvalidUrl {
            url: page_url.to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self {
            url,
            html: Html::parse_document(html),
            values: HashMap::new(),
            events: Vec::new(),
            mutations: Vec::new(),
        })
    }

    pub fn href(&self) -> &str {
        self.url.as_str()
    }

    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Attached elements matching `selector`, in document order.
    pub fn query_all(&self, selector: &Selector) -> Vec<NodeId> {
        self.html
            .root_element()
            .select(selector)
            .map(|element| element.id())
            .collect()
    }

    pub fn query(&self, selector: &Selector) -> Option<NodeId> {
        self.html
            .root_element()
            .select(selector)
            .next()
            .map(|element| element.id())
    }

    /// First element matched by the earliest selector in `selectors` that matches anything.
    pub fn first_match(&self, selectors: &[Selector]) -> Option<NodeId> {
        selectors.iter().find_map(|selector| self.query(selector))
    }

    /// First non-empty text found by walking `selectors` in order.
    pub fn first_text(&self, selectors: &[Selector]) -> Option<String> {
        selectors.iter().find_map(|selector| {
            self.query_all(selector)
                .into_iter()
                .filter_map(|id| self.text(id))
                .find(|text| !text.is_empty())
        })
    }

    pub fn find_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.html
            .tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|element| element.value().attr("id") == Some(element_id))
            .map(|element| element.id())
    }

    pub fn body(&self) -> Option<NodeId> {
        self.html
            .root_element()
            .children()
            .filter_map(ElementRef::wrap)
            .find(|element| element.value().name() == "body")
            .map(|element| element.id())
    }

    /// Text content with whitespace runs collapsed to single spaces.
    pub fn text(&self, node: NodeId) -> Option<String> {
        let element = self.element(node)?;
        let words: Vec<&str> = element.text().flat_map(str::split_whitespace).collect();
        Some(words.join(" "))
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?.value().attr(name)
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|element| element.value().name())
    }

    /// Current value of a form control.
    pub fn value(&self, node: NodeId) -> String {
        if let Some(value) = self.values.get(&node) {
            return value.clone();
        }
        match self.element(node) {
            Some(element) if element.value().name() == "textarea" => element.text().collect(),
            Some(element) => element.value().attr("value").unwrap_or_default().to_string(),
            None => String::new(),
        }
    }

    pub fn set_value(&mut self, node: NodeId, value: impl Into<String>) -> Result<(), PageError> {
        if self.element(node).is_none() {
            return Err(PageError::UnknownNode);
        }
        self.values.insert(node, value.into());
        Ok(())
    }

    pub fn dispatch_event(&mut self, target: NodeId, kind: EventKind) {
        self.events.push(DomEvent {
            target,
            kind,
            bubbles: true,
        });
    }

    pub fn events(&self) -> &[DomEvent] {
        &self.events
    }

    /// Insert parsed `markup` right after `anchor`; returns the new top-level nodes.
    pub fn insert_after(&mut self, anchor: NodeId, markup: &str) -> Result<Vec<NodeId>, PageError> {
        let parent = self.parent_of(anchor)?;
        let fragment = Html::parse_fragment(markup);

        let mut inserted = Vec::new();
        let mut previous = anchor;
        for source in fragment.root_element().children() {
            let mut sibling = self.html.tree.get_mut(previous).ok_or(PageError::UnknownNode)?;
            let mut copy = sibling.insert_after(source.value().clone());
            graft_children(&mut copy, source);
            previous = copy.id();
            inserted.push(previous);
        }

        self.mutations.push(Mutation { target: parent });
        Ok(inserted)
    }

    /// Append parsed `markup` as the last children of `parent`.
    pub fn append_html(&mut self, parent: NodeId, markup: &str) -> Result<Vec<NodeId>, PageError> {
        let fragment = Html::parse_fragment(markup);
        let mut parent_mut = self.html.tree.get_mut(parent).ok_or(PageError::UnknownNode)?;

        let mut inserted = Vec::new();
        for source in fragment.root_element().children() {
            let mut copy = parent_mut.append(source.value().clone());
            graft_children(&mut copy, source);
            inserted.push(copy.id());
        }

        self.mutations.push(Mutation { target: parent });
        Ok(inserted)
    }

    /// Swap out all children of `parent`, the way a single-page app re-renders a view.
    pub fn replace_children(
        &mut self,
        parent: NodeId,
        markup: &str,
    ) -> Result<Vec<NodeId>, PageError> {
        let children: Vec<NodeId> = self
            .html
            .tree
            .get(parent)
            .ok_or(PageError::UnknownNode)?
            .children()
            .map(|child| child.id())
            .collect();
        for child in children {
            if let Some(mut node) = self.html.tree.get_mut(child) {
                node.detach();
            }
        }
        self.append_html(parent, markup)
    }

    pub fn remove(&mut self, node: NodeId) -> Result<(), PageError> {
        let parent = self.parent_of(node)?;
        let mut node_mut = self.html.tree.get_mut(node).ok_or(PageError::UnknownNode)?;
        node_mut.detach();
        self.mutations.push(Mutation { target: parent });
        Ok(())
    }

    /// Drain mutation records accumulated since the last call.
    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.mutations)
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        let root = self.html.tree.root().id();
        match self.html.tree.get(node) {
            Some(node_ref) => node == root || node_ref.ancestors().any(|a| a.id() == root),
            None => false,
        }
    }

    /// True if `node` is `ancestor` or lies in its subtree.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        if ancestor == node {
            return true;
        }
        self.html
            .tree
            .get(node)
            .map(|node_ref| node_ref.ancestors().any(|a| a.id() == ancestor))
            .unwrap_or(false)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.html
            .tree
            .get(node)
            .and_then(|node_ref| node_ref.parent())
            .map(|parent| parent.id())
    }

    pub fn outer_html(&self) -> String {
        self.html.root_element().html()
    }

    fn element(&self, node: NodeId) -> Option<ElementRef<'_>> {
        self.html.tree.get(node).and_then(ElementRef::wrap)
    }

    fn parent_of(&self, node: NodeId) -> Result<NodeId, PageError> {
        self.parent(node).ok_or(PageError::UnknownNode)
    }
}

fn graft_children(dest: &mut NodeMut<'_, Node>, source: NodeRef<'_, Node>) {
    for child in source.children() {
        let mut copy = dest.append(child.value().clone());
        graft_children(&mut copy, child);
    }
}

/// Compile a static selector table, dropping entries the parser rejects.
pub(crate) fn compile_selectors(raw: &[&str]) -> Vec<Selector> {
    raw.iter()
        .filter_map(|source| match Selector::parse(source) {
            Ok(selector) => Some(selector),
            Err(err) => {
                assist_warn!("Ignoring invalid selector {:?}: {:?}", source, err);
                None
            }
        })
        .collect()
}
