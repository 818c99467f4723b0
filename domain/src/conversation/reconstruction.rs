//! Provider history reconstruction
//!
//! Providers reject a tool result that does not answer a tool call announced
//! by the immediately preceding assistant turn. The stored log can violate
//! that (a result appended after an approval, a result whose announcing
//! message was never persisted), so the history is rebuilt before each call.

use super::entities::{Message, Role};
use std::collections::HashSet;

/// Rebuild a provider-safe history from the stored log.
///
/// Messages are scanned in creation order (ties keep append order). A `tool`
/// message is kept only if its correlation id was announced by the most
/// recent assistant tool-call message and no non-tool message has been
/// emitted since; kept results are emitted right before the next non-tool
/// message, in their original order. Everything else of role `tool` is
/// dropped.
pub fn reconstruct_history(messages: &[Message]) -> Vec<&Message> {
    let mut ordered: Vec<&Message> = messages.iter().collect();
    ordered.sort_by_key(|m| m.created_at);

    let mut history = Vec::with_capacity(ordered.len());
    let mut expected: HashSet<&str> = HashSet::new();
    let mut buffered: Vec<&Message> = Vec::new();

    for message in ordered {
        if message.role == Role::Tool {
            let answers_expected = message
                .tool_call_id
                .as_deref()
                .is_some_and(|id| expected.contains(id));
            if answers_expected {
                buffered.push(message);
            }
            continue;
        }

        history.append(&mut buffered);
        expected.clear();

        history.push(message);

        if message.role == Role::Assistant && message.has_tool_calls() {
            expected.extend(message.tool_calls.iter().map(|c| c.id.as_str()));
        }
    }

    history.append(&mut buffered);
    history
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::entities::MessageOptions;
    use crate::core::ids::ConversationId;
    use crate::tool::entities::ToolCall;
    use chrono::{DateTime, Duration, Utc};

    struct LogBuilder {
        conversation_id: ConversationId,
        clock: DateTime<Utc>,
        messages: Vec<Message>,
    }

    impl LogBuilder {
        fn new() -> Self {
            Self {
                conversation_id: ConversationId::new("c1"),
                clock: Utc::now(),
                messages: Vec::new(),
            }
        }

        fn push(mut self, role: Role, content: &str, options: MessageOptions) -> Self {
            self.clock += Duration::milliseconds(1);
            self.messages.push(Message::new(
                self.conversation_id.clone(),
                role,
                content,
                options,
                self.clock,
            ));
            self
        }

        fn user(self, content: &str) -> Self {
            self.push(Role::User, content, MessageOptions::default())
        }

        fn assistant(self, content: &str) -> Self {
            self.push(Role::Assistant, content, MessageOptions::default())
        }

        fn assistant_calls(self, ids: &[&str]) -> Self {
            let calls = ids.iter().map(|id| ToolCall::new(*id, "listTasks")).collect();
            self.push(
                Role::Assistant,
                "",
                MessageOptions::default().with_tool_calls(calls),
            )
        }

        fn tool(self, id: &str) -> Self {
            self.push(
                Role::Tool,
                &format!("result {}", id),
                MessageOptions::default().with_tool_call_id(id),
            )
        }
    }

    fn shape(history: &[&Message]) -> Vec<String> {
        history
            .iter()
            .map(|m| match (&m.role, &m.tool_call_id) {
                (Role::Tool, Some(id)) => format!("tool:{}", id),
                (role, _) => role.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_tool_results_follow_their_assistant_message() {
        let log = LogBuilder::new()
            .user("list my tasks")
            .assistant_calls(&["a", "b"])
            .tool("a")
            .tool("b")
            .assistant("You have two tasks.");

        let history = reconstruct_history(&log.messages);
        assert_eq!(
            shape(&history),
            vec!["user", "assistant", "tool:a", "tool:b", "assistant"]
        );
    }

    #[test]
    fn test_orphan_tool_messages_are_dropped() {
        let log = LogBuilder::new()
            .tool("ghost")
            .user("hi")
            .assistant_calls(&["a"])
            .tool("a")
            .tool("unknown")
            .assistant("done");

        let history = reconstruct_history(&log.messages);
        assert_eq!(shape(&history), vec!["user", "assistant", "tool:a", "assistant"]);
    }

    #[test]
    fn test_late_result_after_final_answer_is_dropped() {
        // An approval appends its result after the turn already closed.
        let log = LogBuilder::new()
            .user("invoice t1")
            .assistant_calls(&["p"])
            .tool("p")
            .assistant("Queued for your confirmation.")
            .tool("p")
            .user("thanks");

        let history = reconstruct_history(&log.messages);
        assert_eq!(
            shape(&history),
            vec!["user", "assistant", "tool:p", "assistant", "user"]
        );
    }

    #[test]
    fn test_trailing_buffer_is_flushed() {
        let log = LogBuilder::new()
            .user("list")
            .assistant_calls(&["a"])
            .tool("a");

        let history = reconstruct_history(&log.messages);
        assert_eq!(shape(&history), vec!["user", "assistant", "tool:a"]);
    }

    #[test]
    fn test_new_tool_call_message_resets_expected_set() {
        let log = LogBuilder::new()
            .user("go")
            .assistant_calls(&["a"])
            .tool("a")
            .assistant_calls(&["b"])
            .tool("a")
            .tool("b");

        let history = reconstruct_history(&log.messages);
        assert_eq!(
            shape(&history),
            vec!["user", "assistant", "tool:a", "assistant", "tool:b"]
        );
    }

    #[test]
    fn test_no_tool_message_precedes_its_announcement() {
        let log = LogBuilder::new()
            .user("u")
            .tool("x")
            .assistant_calls(&["x"])
            .tool("x");

        let history = reconstruct_history(&log.messages);
        for (idx, message) in history.iter().enumerate() {
            if message.role != Role::Tool {
                continue;
            }
            let id = message.tool_call_id.as_deref().unwrap();
            let announced = history[..idx]
                .iter()
                .any(|m| m.tool_calls.iter().any(|c| c.id == id));
            assert!(announced, "tool {} emitted before its assistant message", id);
        }
        assert_eq!(shape(&history), vec!["user", "assistant", "tool:x"]);
    }
}
