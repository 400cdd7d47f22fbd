//! Block Kit documents: the track/edit modal and the tracker message.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::form::{FormField, FormLayout};

pub const TRACK_CALLBACK_ID: &str = "track_pr";
pub const EDIT_CALLBACK_ID: &str = "edit_tracker";

pub const TITLE_BLOCK: &str = "title_block";
pub const TITLE_ACTION: &str = "title";
pub const REVIEWERS_BLOCK: &str = "reviewers_block";
pub const REVIEWERS_ACTION: &str = "reviewers";
pub const URL_BUTTONS_BLOCK: &str = "pr_url_buttons";
pub const TRACKER_ACTIONS_BLOCK: &str = "tracker_actions";

pub const ADD_URL_ACTION: &str = "add_pr_url";
pub const REMOVE_URL_ACTION: &str = "remove_pr_url";
pub const EDIT_TRACKER_ACTION: &str = "edit_tracker";

pub fn url_block_id(index: usize) -> String {
    format!("pr_url_block_{}", index)
}

pub fn url_action_id(index: usize) -> String {
    format!("pr_url_{}", index)
}

/// Block that a field-scoped validation error is attached to.
pub fn block_id_for(field: FormField) -> String {
    match field {
        FormField::UrlSlot(index) => url_block_id(index),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKind {
    Track,
    Edit,
}

impl ModalKind {
    pub fn from_callback_id(callback_id: &str) -> Option<Self> {
        match callback_id {
            TRACK_CALLBACK_ID => Some(ModalKind::Track),
            EDIT_CALLBACK_ID => Some(ModalKind::Edit),
            _ => None,
        }
    }

    pub fn callback_id(&self) -> &'static str {
        match self {
            ModalKind::Track => TRACK_CALLBACK_ID,
            ModalKind::Edit => EDIT_CALLBACK_ID,
        }
    }

    fn title(&self) -> &'static str {
        match self {
            ModalKind::Track => "Track PRs",
            ModalKind::Edit => "Edit Tracker",
        }
    }

    fn submit(&self) -> &'static str {
        match self {
            ModalKind::Track => "Submit",
            ModalKind::Edit => "Save",
        }
    }
}

fn plain_text(text: &str) -> Value {
    json!({ "type": "plain_text", "text": text })
}

fn button(action_id: &str, text: &str, value: &str) -> Value {
    json!({
        "type": "button",
        "action_id": action_id,
        "text": plain_text(text),
        "value": value,
    })
}

pub fn modal_blocks(layout: &FormLayout) -> Vec<Value> {
    let mut blocks = Vec::with_capacity(layout.slots.len() + 3);

    let mut title = json!({
        "type": "plain_text_input",
        "action_id": TITLE_ACTION,
        "placeholder": plain_text("e.g. Release 1.4"),
    });
    if !layout.title.is_empty() {
        title["initial_value"] = json!(layout.title);
    }
    blocks.push(json!({
        "type": "input",
        "block_id": TITLE_BLOCK,
        "optional": true,
        "label": plain_text("Title"),
        "element": title,
    }));

    for slot in &layout.slots {
        let mut element = json!({
            "type": "plain_text_input",
            "action_id": url_action_id(slot.index),
            "placeholder": plain_text("https://github.com/owner/repo/pull/123"),
        });
        if !slot.value.is_empty() {
            element["initial_value"] = json!(slot.value);
        }
        blocks.push(json!({
            "type": "input",
            "block_id": url_block_id(slot.index),
            "label": plain_text(&format!("PR URL {}", slot.index + 1)),
            "element": element,
        }));
    }

    let mut buttons = vec![button(ADD_URL_ACTION, "Add another PR", "add")];
    if layout.slots.len() > 1 {
        buttons.push(button(REMOVE_URL_ACTION, "Remove last", "remove"));
    }
    blocks.push(json!({
        "type": "actions",
        "block_id": URL_BUTTONS_BLOCK,
        "elements": buttons,
    }));

    let mut reviewers = json!({
        "type": "multi_users_select",
        "action_id": REVIEWERS_ACTION,
        "placeholder": plain_text("Select reviewers"),
    });
    if !layout.reviewers.is_empty() {
        reviewers["initial_users"] = json!(layout.reviewers);
    }
    blocks.push(json!({
        "type": "input",
        "block_id": REVIEWERS_BLOCK,
        "optional": true,
        "label": plain_text("Reviewers"),
        "element": reviewers,
    }));

    blocks
}

/// A complete modal view for `views.open` / `views.update`.
pub fn modal_view(kind: ModalKind, layout: &FormLayout, private_metadata: &str) -> Value {
    json!({
        "type": "modal",
        "callback_id": kind.callback_id(),
        "title": plain_text(kind.title()),
        "submit": plain_text(kind.submit()),
        "close": plain_text("Cancel"),
        "private_metadata": private_metadata,
        "blocks": modal_blocks(layout),
    })
}

/// A chat message: fallback text plus Block Kit blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlackMessage {
    pub text: String,
    pub blocks: Vec<Value>,
}

/// The tracker status message with its Edit button.
pub fn tracker_message(tracker_id: i64, text: &str) -> SlackMessage {
    SlackMessage {
        text: text.to_string(),
        blocks: vec![
            json!({
                "type": "section",
                "text": { "type": "mrkdwn", "text": text },
            }),
            json!({
                "type": "actions",
                "block_id": TRACKER_ACTIONS_BLOCK,
                "elements": [button(EDIT_TRACKER_ACTION, "Edit", &tracker_id.to_string())],
            }),
        ],
    }
}

/// `view_submission` response that keeps the modal open with an error
/// under one block.
pub fn validation_errors(field: FormField, message: &str) -> Value {
    let mut errors = serde_json::Map::new();
    errors.insert(block_id_for(field), json!(message));
    json!({
        "response_action": "errors",
        "errors": errors,
    })
}
