//! Parsed document snapshots and the handle bookkeeping shared by page engines.
//!
//! A snapshot flattens one parsed HTML document into an element arena in tree
//! order, so a handle is a slot index plus the generation of the snapshot it
//! came from. [`DocumentState`] keeps the current snapshot plus a back stack.

use std::collections::{HashMap, HashSet};

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use tenderscout_shared::{Result, TenderScoutError};

use super::ElementHandle;

/// Tags whose text never renders.
const HIDDEN_TEXT_TAGS: &[&str] = &["script", "style", "noscript", "template"];

#[derive(Debug)]
enum DomChild {
    Element(usize),
    Text(String),
}

#[derive(Debug)]
struct DomElement {
    tag: String,
    attrs: Vec<(String, String)>,
    parent: Option<usize>,
    children: Vec<DomChild>,
}

/// One parsed document and its element arena.
pub(crate) struct Snapshot {
    url: Url,
    generation: u64,
    html: Html,
    elements: Vec<DomElement>,
}

impl Snapshot {
    fn parse(url: Url, generation: u64, body: &str) -> Self {
        let html = Html::parse_document(body);
        let elements = build_arena(&html);
        Self {
            url,
            generation,
            html,
            elements,
        }
    }

    pub(crate) fn url(&self) -> &Url {
        &self.url
    }

    fn text_of(&self, slot: usize) -> String {
        let mut out = String::new();
        self.collect_text(slot, &mut out);
        out
    }

    fn collect_text(&self, slot: usize, out: &mut String) {
        let Some(element) = self.elements.get(slot) else {
            return;
        };
        for child in &element.children {
            match child {
                DomChild::Text(text) => out.push_str(text),
                DomChild::Element(child_slot) => {
                    out.push(' ');
                    self.collect_text(*child_slot, out);
                    out.push(' ');
                }
            }
        }
    }

    fn select_slots(&self, selector: &Selector) -> Vec<usize> {
        let matched: HashSet<_> = self.html.select(selector).map(|el| el.id()).collect();
        self.html
            .tree
            .root()
            .descendants()
            .filter(|node| node.value().is_element())
            .enumerate()
            .filter(|(_, node)| matched.contains(&node.id()))
            .map(|(slot, _)| slot)
            .collect()
    }
}

/// Flatten the parsed tree into elements in tree order.
fn build_arena(html: &Html) -> Vec<DomElement> {
    let mut slots = HashMap::new();
    let mut elements: Vec<DomElement> = Vec::new();

    for node in html.tree.root().descendants() {
        let parent = node.parent().and_then(|p| slots.get(&p.id()).copied());

        if let Some(el) = ElementRef::wrap(node) {
            let slot = elements.len();
            slots.insert(node.id(), slot);
            elements.push(DomElement {
                tag: el.value().name().to_ascii_lowercase(),
                attrs: el
                    .value()
                    .attrs()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                parent,
                children: Vec::new(),
            });
            if let Some(parent) = parent {
                elements[parent].children.push(DomChild::Element(slot));
            }
        } else if let Some(text) = node.value().as_text() {
            let Some(parent) = parent else { continue };
            if HIDDEN_TEXT_TAGS.contains(&elements[parent].tag.as_str()) {
                continue;
            }
            elements[parent]
                .children
                .push(DomChild::Text((**text).to_owned()));
        }
    }

    elements
}

/// Current snapshot, back stack and generation counter of one page.
#[derive(Default)]
pub(crate) struct DocumentState {
    current: Option<Snapshot>,
    history: Vec<Snapshot>,
    next_generation: u64,
}

impl DocumentState {
    fn issue_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }

    /// Install a freshly navigated document, pushing the previous one onto history.
    pub(crate) fn push(&mut self, url: Url, body: &str) {
        let generation = self.issue_generation();
        let loaded = Snapshot::parse(url, generation, body);
        debug!(url = %loaded.url, generation, elements = loaded.elements.len(), "document loaded");
        if let Some(previous) = self.current.replace(loaded) {
            self.history.push(previous);
        }
    }

    /// Replace the current snapshot after the live DOM changed in place.
    ///
    /// Handles issued on the old snapshot go stale.
    pub(crate) fn refresh(&mut self, url: Url, body: &str) {
        let generation = self.issue_generation();
        let refreshed = Snapshot::parse(url, generation, body);
        debug!(url = %refreshed.url, generation, elements = refreshed.elements.len(), "document re-read");
        self.current = Some(refreshed);
    }

    /// Restore the previous snapshot with its generation.
    pub(crate) fn pop(&mut self) -> Result<()> {
        let previous = self
            .history
            .pop()
            .ok_or_else(|| TenderScoutError::navigation("no previous page in history"))?;
        debug!(url = %previous.url, generation = previous.generation, "navigated back");
        self.current = Some(previous);
        Ok(())
    }

    /// The snapshot `go_back` would restore.
    pub(crate) fn previous(&self) -> Option<&Snapshot> {
        self.history.last()
    }

    pub(crate) fn current_url(&self) -> Option<Url> {
        self.current.as_ref().map(|doc| doc.url.clone())
    }

    pub(crate) fn clear(&mut self) {
        self.current = None;
        self.history.clear();
    }

    fn document(&self) -> Result<&Snapshot> {
        self.current
            .as_ref()
            .ok_or_else(|| TenderScoutError::dom("no document loaded"))
    }

    fn element(&self, handle: ElementHandle) -> Result<(&Snapshot, &DomElement)> {
        let doc = self.document()?;
        if doc.generation != handle.generation() {
            return Err(TenderScoutError::StaleHandle {
                issued: handle.generation(),
                current: doc.generation,
            });
        }
        let element = doc
            .elements
            .get(handle.slot())
            .ok_or_else(|| TenderScoutError::dom(format!("no element at slot {}", handle.slot())))?;
        Ok((doc, element))
    }

    /// Whether the rendered text of the current document matches `pattern`.
    pub(crate) fn text_matches(&self, pattern: &Regex) -> bool {
        self.current
            .as_ref()
            .is_some_and(|doc| !doc.elements.is_empty() && pattern.is_match(&doc.text_of(0)))
    }

    /// Whether any parsable selector in `selectors` matches the current document.
    pub(crate) fn any_selector_matches(&self, selectors: &[String]) -> bool {
        let Some(doc) = self.current.as_ref() else {
            return false;
        };
        selectors.iter().any(|raw| match Selector::parse(raw) {
            Ok(selector) => doc.html.select(&selector).next().is_some(),
            Err(_) => {
                debug!(selector = %raw, "skipping unparsable wait selector");
                false
            }
        })
    }

    pub(crate) fn query_all(&self, selector: &str) -> Result<Vec<ElementHandle>> {
        let doc = self.document()?;
        let parsed = Selector::parse(selector)
            .map_err(|e| TenderScoutError::dom(format!("invalid selector {selector:?}: {e:?}")))?;
        Ok(doc
            .select_slots(&parsed)
            .into_iter()
            .map(|slot| ElementHandle::new(doc.generation, slot))
            .collect())
    }

    pub(crate) fn attribute(&self, element: ElementHandle, name: &str) -> Result<Option<String>> {
        let (_, el) = self.element(element)?;
        Ok(el
            .attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone()))
    }

    pub(crate) fn inner_text(&self, element: ElementHandle) -> Result<String> {
        let (doc, _) = self.element(element)?;
        Ok(doc.text_of(element.slot()))
    }

    pub(crate) fn tag_name(&self, element: ElementHandle) -> Result<String> {
        let (_, el) = self.element(element)?;
        Ok(el.tag.clone())
    }

    pub(crate) fn parent(&self, element: ElementHandle) -> Result<Option<ElementHandle>> {
        let (doc, el) = self.element(element)?;
        Ok(el.parent.map(|slot| ElementHandle::new(doc.generation, slot)))
    }

    /// Absolute http(s) target a click on `element` would follow.
    pub(crate) fn link_target(&self, element: ElementHandle) -> Result<Url> {
        let href = self
            .attribute(element, "href")?
            .ok_or_else(|| TenderScoutError::dom("clicked element has no href"))?;
        let base = self.document()?.url.clone();
        let target = base
            .join(href.trim())
            .map_err(|e| TenderScoutError::navigation(format!("bad href {href:?}: {e}")))?;
        if !matches!(target.scheme(), "http" | "https") {
            return Err(TenderScoutError::navigation(format!(
                "cannot follow non-http link {target}"
            )));
        }
        Ok(target)
    }
}
