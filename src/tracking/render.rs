//! Tracker message rendering
//!
//! A pure projection of persisted rows to Slack mrkdwn. The same function
//! produces the first post and every later update, so identical rows always
//! give an identical message.

use std::collections::BTreeSet;

use crate::database::models::{PrStatus, PullRequest, Tracker, TrackerStatus};

pub const FALLBACK_TITLE: &str = "PR Tracker";
pub const COMPLETED_MARKER: &str = ":tada: Completed";

/// Emoji and label shown for each status.
pub fn status_badge(status: PrStatus) -> (&'static str, &'static str) {
    match status {
        PrStatus::Open => (":white_circle:", "awaiting review"),
        PrStatus::Approved => (":white_check_mark:", "approved"),
        PrStatus::ChangesRequested => (":warning:", "changes requested"),
        PrStatus::Merged => (":large_purple_circle:", "merged"),
        PrStatus::Closed => (":red_circle:", "closed"),
    }
}

pub fn render_title(tracker: &Tracker) -> String {
    let title = tracker.title.trim();
    let title = if title.is_empty() { FALLBACK_TITLE } else { title };

    match tracker.status {
        TrackerStatus::Completed => format!("*{}* {}", title, COMPLETED_MARKER),
        TrackerStatus::Active => format!("*{}*", title),
    }
}

pub fn render_pull_request_line(pr: &PullRequest) -> String {
    let label = if pr.title.trim().is_empty() {
        pr.short_ref()
    } else {
        pr.title.trim().to_string()
    };
    let (glyph, status_label) = status_badge(pr.status);

    let mut line = format!(
        "• <{}|{}> {} {}",
        pr.github_pr_url,
        escape_link_text(&label),
        glyph,
        status_label
    );
    if !pr.status.is_terminal() {
        line.push_str(&format!(
            " ({}/{} approvals)",
            pr.approvals_current, pr.approvals_required
        ));
    }
    line
}

pub fn render_reviewers(reviewers: &BTreeSet<String>) -> String {
    if reviewers.is_empty() {
        return "Reviewers: _none_".to_string();
    }
    let mentions: Vec<String> = reviewers.iter().map(|id| format!("<@{}>", id)).collect();
    format!("Reviewers: {}", mentions.join(" "))
}

pub fn render_tracker(
    tracker: &Tracker,
    pull_requests: &[PullRequest],
    reviewers: &BTreeSet<String>,
) -> String {
    let mut lines = Vec::with_capacity(pull_requests.len() + 3);
    lines.push(render_title(tracker));
    lines.push(String::new());
    lines.extend(pull_requests.iter().map(render_pull_request_line));
    lines.push(String::new());
    lines.push(render_reviewers(reviewers));
    lines.join("\n")
}

// Slack link text ends at '>' and treats '|' as the separator.
fn escape_link_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('|', "¦")
}
