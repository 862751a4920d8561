// src/sinks/logger.rs

use std::collections::HashSet;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::Result;
use crate::sinks::{TransitionRecord, TransitionSink};

/// How many hex characters of the signature to keep on each side when
/// rendering a log line.
const SIG_AFFIX_LEN: usize = 8;

#[derive(Debug, Default)]
struct SessionBuffer {
    lines: Vec<String>,
    seen: HashSet<String>,
}

/// In-memory structured transition logger.
///
/// Keeps one line buffer per session. Lines have the form
/// `[<ms-since-epoch>] <agent_id> <session_id> <from>-><to>: <action>;
/// sig(<first8>...<last8> (<len>))`. Re-delivery of a proof already seen for
/// a session is ignored, which makes the sink idempotent on the proof's
/// state hash.
#[derive(Debug, Default)]
pub struct LogBufferSink {
    sessions: DashMap<String, SessionBuffer>,
}

impl LogBufferSink {
    /// Creates an empty log buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the formatted log for one session: a decorative header banner
    /// followed by the buffered lines in arrival order. The banner is for
    /// human eyes and must not be parsed.
    pub fn get_logs(&self, session_id: &str) -> String {
        let banner = format!(
            "==========================================\n  transition log :: session {}\n==========================================",
            session_id
        );
        match self.sessions.get(session_id) {
            Some(buffer) if !buffer.lines.is_empty() => {
                format!("{}\n{}", banner, buffer.lines.join("\n"))
            }
            _ => banner,
        }
    }

    /// Number of lines buffered for a session.
    pub fn line_count(&self, session_id: &str) -> usize {
        self.sessions
            .get(session_id)
            .map_or(0, |buffer| buffer.lines.len())
    }

    fn format_line(record: &TransitionRecord) -> String {
        format!(
            "[{}] {} {} {}->{}: {}; sig({})",
            record.proof.timestamp,
            record.agent_id,
            record.session_id,
            record.from,
            record.to,
            record.action,
            truncate_signature(&record.proof.signature),
        )
    }
}

fn truncate_signature(signature: &str) -> String {
    let len = signature.len();
    if len <= SIG_AFFIX_LEN * 2 {
        format!("{} ({})", signature, len)
    } else {
        format!(
            "{}...{} ({})",
            &signature[..SIG_AFFIX_LEN],
            &signature[len - SIG_AFFIX_LEN..],
            len
        )
    }
}

#[async_trait]
impl TransitionSink for LogBufferSink {
    fn name(&self) -> &str {
        "log-buffer"
    }

    async fn on_transition(&self, record: &TransitionRecord) -> Result<()> {
        let mut buffer = self.sessions.entry(record.session_id.clone()).or_default();
        if buffer.seen.insert(record.proof.state_hash.clone()) {
            buffer.lines.push(Self::format_line(record));
        }
        Ok(())
    }
}
