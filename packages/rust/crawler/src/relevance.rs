//! Keyword + recency relevance filter over a candidate's context text.

use chrono::NaiveDate;

use crate::dates::{RecencyWindow, extract_dates};

/// Outcome of evaluating one context text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    /// No vocabulary term occurs in the text.
    NoKeyword,
    /// Keywords matched but no date falls inside the recency window.
    NotRecent,
}

/// Accepts texts that mention a vocabulary term and a recent date.
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    keywords: Vec<String>,
    window: RecencyWindow,
}

impl RelevanceFilter {
    /// Build a filter; blank keywords are dropped and the rest lowercased.
    pub fn new(keywords: &[String], recency_months: u32, today: NaiveDate) -> Self {
        Self {
            keywords: keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            window: RecencyWindow::new(today, recency_months),
        }
    }

    /// Case-insensitive substring match against the vocabulary.
    pub fn matches_keyword(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }

    /// Keyword test first, then the date test.
    pub fn evaluate(&self, context_text: &str) -> Verdict {
        if !self.matches_keyword(context_text) {
            return Verdict::NoKeyword;
        }
        let dates = extract_dates(context_text, self.window.today());
        if self.window.any_recent(&dates) {
            Verdict::Accepted
        } else {
            Verdict::NotRecent
        }
    }

    pub fn window(&self) -> &RecencyWindow {
        &self.window
    }
}
