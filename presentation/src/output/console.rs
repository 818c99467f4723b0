//! Console output for assistant turns

use super::EventSink;
use chrono::{DateTime, Utc};
use colored::Colorize;
use ledger_application::{ApprovalOutcome, AssistantReply};
use ledger_domain::{
    ActionId, ChatEvent, Conversation, ConversationId, DoneReason, PendingAction,
    PendingActionSummary, ToolArguments,
};
use serde_json::Value;
use std::io::{self, Write};

/// Formats assistant output for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// `key=value` pairs in key order; strings unquoted.
    pub fn format_args(args: &ToolArguments) -> String {
        let mut pairs: Vec<(&String, &Value)> = args.iter().collect();
        pairs.sort_by_key(|(k, _)| *k);
        pairs
            .into_iter()
            .map(|(k, v)| match v {
                Value::String(s) => format!("{}={}", k, s),
                other => format!("{}={}", k, other),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// First eight characters of an action id, enough to select it.
    pub fn short_id(id: &ActionId) -> &str {
        let s = id.as_str();
        s.char_indices().nth(8).map(|(i, _)| &s[..i]).unwrap_or(s)
    }

    pub fn format_tool_use(
        tool_name: &str,
        args: &ToolArguments,
        requires_confirmation: bool,
    ) -> String {
        let marker = if requires_confirmation {
            " (needs confirmation)".yellow().to_string()
        } else {
            String::new()
        };
        format!(
            "  {} {}({}){}",
            "->".cyan(),
            tool_name.bold(),
            Self::format_args(args).dimmed(),
            marker
        )
    }

    pub fn format_tool_result(tool_name: &str, success: bool, error: Option<&str>) -> String {
        if success {
            format!("  {} {}", "v".green(), tool_name)
        } else {
            format!(
                "  {} {}: {}",
                "x".red(),
                tool_name,
                error.unwrap_or("failed").red()
            )
        }
    }

    fn expires_in(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
        let left = expires_at - now;
        if left.num_seconds() <= 0 {
            "expired".to_string()
        } else {
            format!("expires in {}m {:02}s", left.num_minutes(), left.num_seconds() % 60)
        }
    }

    pub fn format_pending(summary: &PendingActionSummary, now: DateTime<Utc>) -> String {
        let args = summary.display_args.as_ref().unwrap_or(&summary.tool_args);
        format!(
            "  {} {} [{}] {}\n      {}",
            "?".yellow().bold(),
            summary.tool_name.bold(),
            Self::short_id(&summary.id).cyan(),
            Self::expires_in(summary.expires_at, now).dimmed(),
            Self::format_args(args)
        )
    }

    /// Numbered list of live actions, as selected by `/approve <n>`.
    pub fn format_pending_list(actions: &[PendingAction], now: DateTime<Utc>) -> String {
        if actions.is_empty() {
            return "No pending actions.".dimmed().to_string();
        }
        let mut output = format!("{}\n", "Pending actions:".cyan().bold());
        for (i, action) in actions.iter().enumerate() {
            output.push_str(&format!(
                "{:>3}. {}\n",
                i + 1,
                Self::format_pending(&PendingActionSummary::from(action), now).trim_start()
            ));
        }
        output
    }

    fn approval_hint() -> String {
        "Use /approve <n> or /reject <n> to decide.".dimmed().to_string()
    }

    /// Final text of a turn-based exchange plus anything awaiting a decision.
    pub fn format_reply(reply: &AssistantReply, now: DateTime<Utc>) -> String {
        let mut output = reply.response_text.clone();
        if reply.truncated {
            output.push_str(&format!(
                "\n\n{}",
                "(stopped after reaching the tool round limit)".yellow()
            ));
        }
        if !reply.pending_actions.is_empty() {
            output.push_str(&format!("\n\n{}\n", "Awaiting your confirmation:".yellow().bold()));
            for summary in &reply.pending_actions {
                output.push_str(&Self::format_pending(summary, now));
                output.push('\n');
            }
            output.push_str(&Self::approval_hint());
        }
        output
    }

    pub fn format_approval(outcome: &ApprovalOutcome) -> String {
        if outcome.success {
            let result = outcome
                .result
                .as_ref()
                .map(|r| serde_json::to_string_pretty(r).unwrap_or_else(|_| r.to_string()))
                .unwrap_or_default();
            format!("{} {}", "Done.".green().bold(), result)
        } else {
            format!(
                "{} {}",
                "Failed:".red().bold(),
                outcome.error.as_deref().unwrap_or("unknown error")
            )
        }
    }

    pub fn format_conversations(
        conversations: &[Conversation],
        current: Option<&ConversationId>,
    ) -> String {
        if conversations.is_empty() {
            return "No conversations yet.".dimmed().to_string();
        }
        conversations
            .iter()
            .map(|c| {
                let marker = if Some(&c.id) == current { "*" } else { " " };
                format!(
                    "{} {} {} {}",
                    marker,
                    c.id.as_str().cyan(),
                    c.title,
                    c.updated_at.format("%Y-%m-%d %H:%M").to_string().dimmed()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Streams a turn to the console as it happens.
///
/// Text fragments are written without line breaks of their own; tool
/// activity starts on a fresh line.
pub struct ConsoleRenderer<W: Write> {
    out: W,
    mid_line: bool,
}

impl<W: Write> ConsoleRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            mid_line: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) -> io::Result<()> {
        if self.mid_line {
            writeln!(self.out)?;
            self.mid_line = false;
        }
        writeln!(self.out, "{}", text)
    }
}

impl<W: Write> EventSink for ConsoleRenderer<W> {
    fn emit(&mut self, event: &ChatEvent) -> io::Result<()> {
        match event {
            ChatEvent::Text { content } => {
                write!(self.out, "{}", content)?;
                self.mid_line = !content.ends_with('\n');
            }
            ChatEvent::ToolUse {
                tool_name,
                tool_args,
                requires_confirmation,
                ..
            } => {
                let line =
                    ConsoleFormatter::format_tool_use(tool_name, tool_args, *requires_confirmation);
                self.line(&line)?;
            }
            ChatEvent::ToolResult {
                tool_name,
                success,
                error,
                pending_action,
                ..
            } => match pending_action {
                Some(summary) => {
                    let line = ConsoleFormatter::format_pending(summary, Utc::now());
                    self.line(&line)?;
                }
                None => {
                    let line =
                        ConsoleFormatter::format_tool_result(tool_name, *success, error.as_deref());
                    self.line(&line)?;
                }
            },
            ChatEvent::Error { message } => {
                let line = format!("{} {}", "Error:".red().bold(), message);
                self.line(&line)?;
            }
            ChatEvent::Done { reason, .. } => {
                match reason {
                    DoneReason::MaxIterations => {
                        let line = "(stopped after reaching the tool round limit)"
                            .yellow()
                            .to_string();
                        self.line(&line)?;
                    }
                    DoneReason::Complete | DoneReason::Error => {
                        if self.mid_line {
                            writeln!(self.out)?;
                            self.mid_line = false;
                        }
                    }
                }
            }
        }
        self.out.flush()
    }
}
