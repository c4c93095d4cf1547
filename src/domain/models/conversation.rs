//! Typed conversation histories.
//!
//! Three independent histories exist at different scopes during a run: the
//! top-level user conversation, the supervisor's planning history, and one
//! private history per analyzer unit. Histories are append-only within
//! their scope and cross scope boundaries only by copying text into a new
//! entry.

use serde::{Deserialize, Serialize};

/// One tool invocation requested by an assistant turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation identifier linking the call to its result entry
    pub id: String,
    /// Capability name to invoke
    pub name: String,
    /// JSON arguments for the capability
    pub arguments: serde_json::Value,
}

/// An assistant turn: free text plus zero or more requested tool calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantTurn {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

impl AssistantTurn {
    /// A plain text turn with no tool calls.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }
}

/// A single entry in a conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MessageEntry {
    System(String),
    Human(String),
    Assistant(AssistantTurn),
    ToolResult {
        call_id: String,
        name: String,
        content: String,
    },
}

/// An ordered, append-only sequence of typed entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationHistory {
    entries: Vec<MessageEntry>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a history from initial entries.
    pub fn from_entries(entries: Vec<MessageEntry>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, entry: MessageEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[MessageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recent assistant turn, if any.
    pub fn last_assistant(&self) -> Option<&AssistantTurn> {
        self.entries.iter().rev().find_map(|entry| match entry {
            MessageEntry::Assistant(turn) => Some(turn),
            _ => None,
        })
    }

    /// Render the history as a flat transcript for inclusion in a prompt.
    pub fn buffer_string(&self) -> String {
        self.entries
            .iter()
            .map(|entry| match entry {
                MessageEntry::System(text) => format!("System: {text}"),
                MessageEntry::Human(text) => format!("Human: {text}"),
                MessageEntry::Assistant(turn) => format!("AI: {}", turn.content),
                MessageEntry::ToolResult { name, content, .. } => {
                    format!("Tool ({name}): {content}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Contents of all tool-result entries, in order.
    pub fn tool_result_contents(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                MessageEntry::ToolResult { content, .. } => Some(content.clone()),
                _ => None,
            })
            .collect()
    }

    /// Concatenation of tool-result and assistant contents, in order.
    ///
    /// This is the unmodified raw trail kept alongside every compressed
    /// report for downstream traceability.
    pub fn raw_transcript(&self) -> String {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                MessageEntry::Assistant(turn) => Some(turn.content.clone()),
                MessageEntry::ToolResult { content, .. } => Some(content.clone()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Replace the leading system entry, or insert one if none exists.
    pub fn replace_system(&mut self, content: impl Into<String>) {
        match self.entries.first_mut() {
            Some(MessageEntry::System(text)) => *text = content.into(),
            _ => self.entries.insert(0, MessageEntry::System(content.into())),
        }
    }

    /// Drop the suffix from the end back through (and excluding) the last
    /// assistant turn. With no assistant turn the history is returned
    /// unchanged.
    pub fn drop_through_last_assistant(mut self) -> Self {
        if let Some(pos) = self
            .entries
            .iter()
            .rposition(|entry| matches!(entry, MessageEntry::Assistant(_)))
        {
            self.entries.truncate(pos);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_history() -> ConversationHistory {
        ConversationHistory::from_entries(vec![
            MessageEntry::System("be helpful".into()),
            MessageEntry::Human("analyze the repo".into()),
            MessageEntry::Assistant(AssistantTurn::text("looking at files")),
            MessageEntry::ToolResult {
                call_id: "c1".into(),
                name: "read_file_with_context".into(),
                content: "fn main() {}".into(),
            },
        ])
    }

    #[test]
    fn test_buffer_string_renders_all_roles() {
        let rendered = sample_history().buffer_string();
        assert!(rendered.contains("System: be helpful"));
        assert!(rendered.contains("Human: analyze the repo"));
        assert!(rendered.contains("AI: looking at files"));
        assert!(rendered.contains("Tool (read_file_with_context): fn main() {}"));
    }

    #[test]
    fn test_tool_result_contents_filters_tool_entries() {
        let notes = sample_history().tool_result_contents();
        assert_eq!(notes, vec!["fn main() {}".to_string()]);
    }

    #[test]
    fn test_raw_transcript_includes_assistant_and_tool() {
        let raw = sample_history().raw_transcript();
        assert_eq!(raw, "looking at files\nfn main() {}");
    }

    #[test]
    fn test_replace_system_overwrites_leading_entry() {
        let mut history = sample_history();
        history.replace_system("compress the findings");
        assert_eq!(
            history.entries()[0],
            MessageEntry::System("compress the findings".into())
        );
        assert_eq!(history.len(), 4);
    }

    #[test]
    fn test_replace_system_inserts_when_missing() {
        let mut history = ConversationHistory::from_entries(vec![MessageEntry::Human("hi".into())]);
        history.replace_system("sys");
        assert_eq!(history.len(), 2);
        assert!(matches!(history.entries()[0], MessageEntry::System(_)));
    }

    #[test]
    fn test_drop_through_last_assistant() {
        let pruned = sample_history().drop_through_last_assistant();
        assert_eq!(pruned.len(), 2);
        assert!(matches!(pruned.entries()[1], MessageEntry::Human(_)));
    }

    #[test]
    fn test_drop_through_last_assistant_without_assistant_is_identity() {
        let history = ConversationHistory::from_entries(vec![
            MessageEntry::System("sys".into()),
            MessageEntry::Human("hi".into()),
        ]);
        let pruned = history.clone().drop_through_last_assistant();
        assert_eq!(pruned, history);
    }
}
