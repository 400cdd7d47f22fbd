//! Track / edit form state
//!
//! The chat platform keeps the form between round-trips; this module only
//! computes the next layout from the submitted values and an action, and
//! turns a final submission into validated pull request references.

pub mod pr_url;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::RevueError;
pub use pr_url::{parse_pr_url, ParsedPr, DEFAULT_GITHUB_HOST};

/// A form input a validation error can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormField {
    UrlSlot(usize),
}

/// One pull request URL input, positioned by `index` (0-based).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlSlot {
    pub index: usize,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    AddSlot,
    RemoveSlot,
}

/// Computes the URL slots after `action`. Always returns at least one slot,
/// indexed 0..n in order, with every surviving value untouched.
pub fn next_form_layout(current: &[UrlSlot], action: FormAction) -> Vec<UrlSlot> {
    let mut values: Vec<String> = current.iter().map(|slot| slot.value.clone()).collect();

    match action {
        FormAction::AddSlot => values.push(String::new()),
        FormAction::RemoveSlot => {
            if values.len() > 1 {
                values.pop();
            }
        }
    }

    to_slots(values)
}

fn to_slots(mut values: Vec<String>) -> Vec<UrlSlot> {
    if values.is_empty() {
        values.push(String::new());
    }
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| UrlSlot { index, value })
        .collect()
}

/// Everything the track/edit modal shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormLayout {
    pub title: String,
    pub slots: Vec<UrlSlot>,
    pub reviewers: Vec<String>,
}

impl FormLayout {
    pub fn new(title: impl Into<String>, urls: Vec<String>, reviewers: Vec<String>) -> Self {
        Self {
            title: title.into(),
            slots: to_slots(urls),
            reviewers,
        }
    }

    /// A fresh form with a single empty URL slot.
    pub fn empty() -> Self {
        Self::new(String::new(), Vec::new(), Vec::new())
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// The next layout; title and reviewers carry forward as-is.
    pub fn apply(&self, action: FormAction) -> FormLayout {
        FormLayout {
            title: self.title.clone(),
            slots: next_form_layout(&self.slots, action),
            reviewers: self.reviewers.clone(),
        }
    }

    /// Validates the whole form. Any bad slot fails the submission with an
    /// error scoped to that slot, so nothing is ever partially committed.
    pub fn submission(&self, github_host: &str) -> Result<TrackSubmission, RevueError> {
        let mut slots: Vec<&UrlSlot> = self.slots.iter().collect();
        slots.sort_by_key(|slot| slot.index);

        let mut seen = HashSet::new();
        let mut prs = Vec::with_capacity(slots.len());
        for slot in slots {
            let pr = parse_pr_url(&slot.value, github_host)
                .map_err(|message| RevueError::validation(FormField::UrlSlot(slot.index), message))?;

            if !seen.insert(pr.key()) {
                return Err(RevueError::validation(
                    FormField::UrlSlot(slot.index),
                    "This pull request is already listed above",
                ));
            }
            prs.push(pr);
        }

        if prs.is_empty() {
            return Err(RevueError::validation(
                FormField::UrlSlot(0),
                "At least one PR URL is required",
            ));
        }

        let mut reviewers = Vec::with_capacity(self.reviewers.len());
        for reviewer in &self.reviewers {
            if !reviewers.contains(reviewer) {
                reviewers.push(reviewer.clone());
            }
        }

        Ok(TrackSubmission {
            title: self.title.trim().to_string(),
            prs,
            reviewers,
        })
    }
}

/// A validated track/edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSubmission {
    pub title: String,
    pub prs: Vec<ParsedPr>,
    pub reviewers: Vec<String>,
}
