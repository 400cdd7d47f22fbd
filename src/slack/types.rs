use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::form::{FormLayout, UrlSlot};
use crate::slack::blocks;

/// Form-encoded body of a slash command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlashCommand {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub trigger_id: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub user_id: String,
}

/// The JSON document carried in the `payload` field of an interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionPayload {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub trigger_id: Option<String>,
    #[serde(default)]
    pub actions: Vec<BlockAction>,
    #[serde(default)]
    pub view: Option<View>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockAction {
    pub action_id: String,
    #[serde(default)]
    pub block_id: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct View {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub callback_id: String,
    #[serde(default)]
    pub private_metadata: String,
    #[serde(default)]
    pub state: ViewState,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewState {
    #[serde(default)]
    pub values: HashMap<String, HashMap<String, ActionValue>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionValue {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub selected_users: Option<Vec<String>>,
}

impl ViewState {
    fn get(&self, block_id: &str, action_id: &str) -> Option<&ActionValue> {
        self.values.get(block_id).and_then(|block| block.get(action_id))
    }

    fn text(&self, block_id: &str, action_id: &str) -> String {
        self.get(block_id, action_id)
            .and_then(|value| value.value.clone())
            .unwrap_or_default()
    }

    /// Rebuilds the form from submitted state. URL slots are read from
    /// index 0 upward until the first missing block.
    pub fn form_layout(&self) -> FormLayout {
        let mut slots = Vec::new();
        while self.values.contains_key(&blocks::url_block_id(slots.len())) {
            let index = slots.len();
            slots.push(UrlSlot {
                index,
                value: self.text(&blocks::url_block_id(index), &blocks::url_action_id(index)),
            });
        }

        let reviewers = self
            .get(blocks::REVIEWERS_BLOCK, blocks::REVIEWERS_ACTION)
            .and_then(|value| value.selected_users.clone())
            .unwrap_or_default();

        FormLayout {
            title: self.text(blocks::TITLE_BLOCK, blocks::TITLE_ACTION),
            slots,
            reviewers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_form_layout_reads_sequential_slots() {
        let state: ViewState = serde_json::from_value(json!({
            "values": {
                "title_block": { "title": { "type": "plain_text_input", "value": "Sprint" } },
                "pr_url_block_0": { "pr_url_0": { "type": "plain_text_input", "value": "https://github.com/a/b/pull/1" } },
                "pr_url_block_1": { "pr_url_1": { "type": "plain_text_input", "value": null } },
                "pr_url_block_3": { "pr_url_3": { "type": "plain_text_input", "value": "ignored" } },
                "reviewers_block": { "reviewers": { "type": "multi_users_select", "selected_users": ["U1", "U2"] } }
            }
        }))
        .unwrap();

        let layout = state.form_layout();
        assert_eq!(layout.title, "Sprint");
        assert_eq!(layout.slots.len(), 2);
        assert_eq!(layout.slots[0].value, "https://github.com/a/b/pull/1");
        assert_eq!(layout.slots[1].value, "");
        assert_eq!(layout.reviewers, vec!["U1", "U2"]);
    }

    #[test]
    fn test_interaction_payload_decodes_block_actions() {
        let payload: InteractionPayload = serde_json::from_value(json!({
            "type": "block_actions",
            "trigger_id": "T123",
            "actions": [{ "action_id": "edit_tracker", "block_id": "tracker_actions", "value": "7" }],
            "view": null
        }))
        .unwrap();

        assert_eq!(payload.kind, "block_actions");
        assert_eq!(payload.actions[0].value.as_deref(), Some("7"));
        assert!(payload.view.is_none());
    }
}
