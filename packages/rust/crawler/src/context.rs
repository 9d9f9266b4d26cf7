//! Context resolution: the text of the row/card a link sits in.
//!
//! The container heuristic is a [`ContainerStrategy`]; [`AncestorWalk`] is the
//! default. [`resolve_context`] never fails: any DOM error yields an empty
//! string, which callers read as "context unknown".

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use tenderscout_shared::Result;

use crate::page::{ElementHandle, Page};

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

/// Finds the text block describing the entry an element belongs to.
#[allow(async_fn_in_trait)]
pub trait ContainerStrategy {
    /// Raw text of the chosen container.
    async fn container_text<P: Page>(&self, page: &P, element: ElementHandle) -> Result<String>;

    /// Human-readable strategy name for tracing.
    fn name(&self) -> &str;
}

/// Walks up from the element looking for a row/card/item container.
///
/// The first ancestor (within `max_depth`) whose tag or class suggests a
/// container and whose text is longer than `min_text_len` wins. Otherwise the
/// immediate parent's text is used.
#[derive(Debug, Clone)]
pub struct AncestorWalk {
    pub max_depth: usize,
    pub min_text_len: usize,
    pub container_tags: Vec<String>,
    pub class_hints: Vec<String>,
}

impl AncestorWalk {
    pub fn new(container_tags: &[String], class_hints: &[String]) -> Self {
        Self {
            max_depth: 5,
            min_text_len: 50,
            container_tags: container_tags.iter().map(|t| t.to_ascii_lowercase()).collect(),
            class_hints: class_hints.iter().map(|c| c.to_ascii_lowercase()).collect(),
        }
    }

    fn looks_like_container(&self, tag: &str, class: &str) -> bool {
        self.container_tags.iter().any(|t| t == tag)
            || self.class_hints.iter().any(|hint| class.contains(hint.as_str()))
    }
}

impl Default for AncestorWalk {
    fn default() -> Self {
        Self::new(
            &["tr".into(), "li".into()],
            &["row".into(), "card".into(), "item".into()],
        )
    }
}

impl ContainerStrategy for AncestorWalk {
    async fn container_text<P: Page>(&self, page: &P, element: ElementHandle) -> Result<String> {
        let mut current = element;

        for _ in 0..self.max_depth {
            let Some(parent) = page.parent(current).await? else {
                break;
            };
            let tag = page.tag_name(parent).await?;
            let class = page
                .attribute(parent, "class")
                .await?
                .unwrap_or_default()
                .to_lowercase();

            if self.looks_like_container(&tag, &class) {
                let text = collapse_whitespace(&page.inner_text(parent).await?);
                if text.chars().count() > self.min_text_len {
                    return Ok(text);
                }
            }
            current = parent;
        }

        match page.parent(element).await? {
            Some(parent) => page.inner_text(parent).await,
            None => Ok(String::new()),
        }
    }

    fn name(&self) -> &str {
        "ancestor-walk"
    }
}

/// Normalized context text for `element`, or an empty string on any failure.
pub async fn resolve_context<P, S>(page: &P, strategy: &S, element: ElementHandle) -> String
where
    P: Page,
    S: ContainerStrategy,
{
    match strategy.container_text(page, element).await {
        Ok(text) => collapse_whitespace(&text),
        Err(e) => {
            debug!(strategy = strategy.name(), error = %e, "context resolution failed");
            String::new()
        }
    }
}
