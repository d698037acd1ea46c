//! Local transcript rendering.
//!
//! Produces the same three formats as the remote export endpoint so a
//! failed remote export degrades to an identical local file.

use crate::error::ClientError;
use chrono::{DateTime, Utc};
use dialer_types::{ExportFormat, Message};

/// Renders a conversation in the requested format.
pub fn render(conversation: &[Message], format: ExportFormat) -> Result<String, ClientError> {
    match format {
        ExportFormat::Txt => Ok(render_txt(conversation)),
        ExportFormat::Json => Ok(serde_json::to_string_pretty(conversation)?),
        ExportFormat::Md => Ok(render_md(conversation, Utc::now())),
    }
}

/// `[HH:MM:SS] ROLE: content` per turn, blank line between turns.
fn render_txt(conversation: &[Message]) -> String {
    conversation
        .iter()
        .map(|msg| {
            format!(
                "[{}] {}: {}",
                format_time(msg.timestamp_ms),
                msg.role.label(),
                msg.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Markdown: heading, date line, then one section per turn.
fn render_md(conversation: &[Message], exported_at: DateTime<Utc>) -> String {
    let mut out = format!(
        "# Transcript\n\n**Date**: {}\n\n",
        exported_at.format("%Y-%m-%d")
    );
    let turns = conversation
        .iter()
        .map(|msg| {
            format!(
                "### {} ({})\n\n{}\n",
                msg.role.display_name(),
                format_time(msg.timestamp_ms),
                msg.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    out.push_str(&turns);
    out
}

/// Formats an epoch-ms timestamp as `HH:MM:SS` (UTC).
fn format_time(timestamp_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "??:??:??".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialer_types::Role;

    fn sample() -> Vec<Message> {
        vec![
            Message::new(Role::User, "Hi", 1_000),
            Message::new(Role::Assistant, "Hello, how can I help you today?", 2_000),
        ]
    }

    #[test]
    fn txt_has_one_block_per_turn() {
        let out = render(&sample(), ExportFormat::Txt).unwrap();
        let blocks: Vec<&str> = out.split("\n\n").collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], "[00:00:01] USER: Hi");
        assert!(blocks[1].starts_with("[00:00:02] ASSISTANT: Hello"));
    }

    #[test]
    fn json_round_trips_the_ordered_sequence() {
        let conversation = sample();
        let out = render(&conversation, ExportFormat::Json).unwrap();
        let back: Vec<Message> = serde_json::from_str(&out).unwrap();
        assert_eq!(back, conversation);
    }

    #[test]
    fn md_has_heading_date_and_per_turn_sections() {
        let out = render(&sample(), ExportFormat::Md).unwrap();
        assert!(out.starts_with("# Transcript\n\n**Date**: "));
        assert!(out.contains("### You (00:00:01)\n\nHi\n"));
        assert!(out.contains("### AI Assistant (00:00:02)\n\nHello, how can I help you today?\n"));
    }

    #[test]
    fn empty_conversation_renders_in_every_format() {
        for format in [ExportFormat::Txt, ExportFormat::Json, ExportFormat::Md] {
            let out = render(&[], format).unwrap();
            match format {
                ExportFormat::Txt => assert!(out.is_empty()),
                ExportFormat::Json => assert_eq!(out, "[]"),
                ExportFormat::Md => assert!(out.starts_with("# Transcript")),
            }
        }
    }

    #[test]
    fn out_of_range_timestamp_does_not_panic() {
        let msgs = vec![Message::new(Role::User, "weird clock", i64::MAX)];
        let out = render(&msgs, ExportFormat::Txt).unwrap();
        assert!(out.contains("??:??:??"));
    }
}
