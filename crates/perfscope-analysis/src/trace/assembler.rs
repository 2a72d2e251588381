//! Trace Assembler: turns a family of capture sessions into one event stream
//! per session with absolute timestamps and full method signatures.

use std::path::{Path, PathBuf};

use perfscope_core::errors::{PipelineResult, TraceError};
use perfscope_core::events::types::{SessionAssembledEvent, SessionSkippedEvent, SkipReason};
use perfscope_core::events::EventDispatcher;
use perfscope_core::types::collections::FxHashMap;
use perfscope_core::types::TraceEvent;

use super::metadata::SessionMetadata;
use super::session::{discover_sessions, CaptureSession};
use super::wire::parse_line;

/// Events from one capture session, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionTrace {
    pub key: String,
    pub log_path: PathBuf,
    pub events: Vec<TraceEvent>,
    /// Lines that did not match the grammar, including a truncated final line.
    pub malformed_lines: usize,
    /// The log ended without a trailing newline.
    pub truncated: bool,
}

/// A session that contributed no events, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSession {
    pub key: String,
    pub log_path: Option<PathBuf>,
    pub reason: SkipReason,
}

/// All sessions for one trace base, in session-key order.
///
/// Sessions are kept apart: call stacks never span a process restart.
#[derive(Debug, Clone, Default)]
pub struct AssembledTrace {
    pub sessions: Vec<SessionTrace>,
    pub skipped: Vec<SkippedSession>,
}

impl AssembledTrace {
    pub fn event_count(&self) -> usize {
        self.sessions.iter().map(|s| s.events.len()).sum()
    }

    pub fn malformed_lines(&self) -> usize {
        self.sessions.iter().map(|s| s.malformed_lines).sum()
    }

    /// Concatenation of every session's events, session by session.
    /// No cross-session re-sorting happens.
    pub fn events(&self) -> impl Iterator<Item = &TraceEvent> {
        self.sessions.iter().flat_map(|s| s.events.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.iter().all(|s| s.events.is_empty())
    }
}

/// Outcome of assembling a single session.
enum SessionOutcome {
    Assembled(SessionTrace),
    Skipped(SkippedSession, Option<TraceError>),
}

#[derive(Debug, Clone, Default)]
pub struct TraceAssembler {
    events: EventDispatcher,
}

impl TraceAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dispatcher(events: EventDispatcher) -> Self {
        Self { events }
    }

    /// Assemble every capture session of `base_path`.
    ///
    /// Missing, empty or unreadable sessions are skipped; the skips are
    /// reported in the result and unreadable ones also as non-fatal errors.
    pub fn assemble(&self, base_path: &Path) -> PipelineResult<AssembledTrace> {
        let mut result = PipelineResult::<AssembledTrace>::default();

        let sessions = match discover_sessions(base_path) {
            Ok(sessions) => sessions,
            Err(err) => {
                tracing::warn!(base = %base_path.display(), error = %err, "session discovery failed");
                result.add_error(err);
                return result;
            }
        };

        for session in &sessions {
            match assemble_session(session) {
                SessionOutcome::Assembled(trace) => {
                    tracing::debug!(
                        session = %trace.key,
                        events = trace.events.len(),
                        malformed = trace.malformed_lines,
                        "session assembled"
                    );
                    self.events.emit_session_assembled(&SessionAssembledEvent {
                        session_key: trace.key.clone(),
                        event_count: trace.events.len(),
                        malformed_lines: trace.malformed_lines,
                    });
                    result.data.sessions.push(trace);
                }
                SessionOutcome::Skipped(skipped, error) => {
                    match skipped.reason {
                        SkipReason::MissingLog | SkipReason::EmptyLog => tracing::debug!(
                            session = %skipped.key,
                            reason = skipped.reason.as_str(),
                            "session skipped"
                        ),
                        _ => tracing::warn!(
                            session = %skipped.key,
                            reason = skipped.reason.as_str(),
                            "session skipped"
                        ),
                    }
                    self.events.emit_session_skipped(&SessionSkippedEvent {
                        session_key: skipped.key.clone(),
                        log_path: skipped.log_path.clone(),
                        reason: skipped.reason,
                    });
                    if let Some(err) = error {
                        result.add_error(err);
                    }
                    result.data.skipped.push(skipped);
                }
            }
        }

        result
    }
}

fn assemble_session(session: &CaptureSession) -> SessionOutcome {
    let skip = |reason: SkipReason, error: Option<TraceError>| {
        SessionOutcome::Skipped(
            SkippedSession {
                key: session.key.clone(),
                log_path: session.log_path.clone(),
                reason,
            },
            error,
        )
    };

    let Some(log_path) = &session.log_path else {
        return skip(SkipReason::MissingLog, None);
    };

    let bytes = match std::fs::read(log_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            let err = TraceError::Io {
                path: log_path.display().to_string(),
                message: e.to_string(),
            };
            return skip(SkipReason::UnreadableLog, Some(err));
        }
    };
    // A killed JVM can leave a torn multi-byte sequence at the tail.
    let content = String::from_utf8_lossy(&bytes);
    if content.trim().is_empty() {
        return skip(SkipReason::EmptyLog, None);
    }

    let Some(metadata_path) = &session.metadata_path else {
        return skip(SkipReason::MissingMetadata, None);
    };
    let metadata = match SessionMetadata::load(metadata_path) {
        Ok(metadata) => metadata,
        Err(err) => return skip(SkipReason::InvalidMetadata, Some(err)),
    };

    let parsed = parse_session_log(&content, &metadata);
    SessionOutcome::Assembled(SessionTrace {
        key: session.key.clone(),
        log_path: log_path.clone(),
        events: parsed.events,
        malformed_lines: parsed.malformed_lines,
        truncated: parsed.truncated,
    })
}

/// Events parsed from one compacted log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedLog {
    pub events: Vec<TraceEvent>,
    pub malformed_lines: usize,
    pub truncated: bool,
}

/// Parse a compacted log body, applying the session's time offset and token
/// dictionary. Tokens missing from the dictionary pass through unchanged.
///
/// A final line without a terminating newline is kept when it parses; one
/// that does not is a partial write and marks the log as truncated.
pub fn parse_session_log(content: &str, metadata: &SessionMetadata) -> ParsedLog {
    let dictionary = metadata.token_dictionary();
    let mut parsed = ParsedLog::default();

    let (complete, tail) = match content.rfind('\n') {
        Some(last_newline) => (&content[..last_newline], &content[last_newline + 1..]),
        None => ("", content),
    };

    for line in complete.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match to_event(line, metadata.log_time_offset, &dictionary) {
            Some(event) => parsed.events.push(event),
            None => parsed.malformed_lines += 1,
        }
    }

    if !tail.trim().is_empty() {
        match to_event(tail, metadata.log_time_offset, &dictionary) {
            Some(event) => parsed.events.push(event),
            None => {
                parsed.truncated = true;
                parsed.malformed_lines += 1;
            }
        }
    }

    parsed
}

fn to_event(line: &str, offset: i64, dictionary: &FxHashMap<String, String>) -> Option<TraceEvent> {
    let raw = parse_line(line)?;
    let timestamp = raw.timestamp.checked_add(offset)?;
    let method = dictionary
        .get(raw.token)
        .cloned()
        .unwrap_or_else(|| raw.token.to_string());
    Some(TraceEvent {
        timestamp,
        kind: raw.kind,
        method,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use perfscope_core::types::EventKind;

    use super::*;

    fn metadata(offset: i64, pairs: &[(&str, &str)]) -> SessionMetadata {
        SessionMetadata {
            log_time_offset: offset,
            method_signature_hash: pairs
                .iter()
                .map(|(sig, token)| (sig.to_string(), token.to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn applies_offset_and_dictionary() {
        let meta = metadata(1_000, &[("com.acme.A.run()", "a")]);
        let parsed = parse_session_log("[1] S a\n[5] S zz\n[6] E zz\n[9] E a\n", &meta);
        assert_eq!(parsed.malformed_lines, 0);
        assert!(!parsed.truncated);
        assert_eq!(
            parsed.events,
            vec![
                TraceEvent::enter(1_001, "com.acme.A.run()"),
                TraceEvent::enter(1_005, "zz"),
                TraceEvent::exit(1_006, "zz"),
                TraceEvent::exit(1_009, "com.acme.A.run()"),
            ]
        );
    }

    #[test]
    fn counts_malformed_and_truncated_lines() {
        let meta = metadata(0, &[]);
        let parsed = parse_session_log("[1] S a\nnoise\n\n[2] E a\n[3] S", &meta);
        assert_eq!(parsed.events.len(), 2);
        assert_eq!(parsed.malformed_lines, 2);
        assert!(parsed.truncated);
        assert_eq!(parsed.events[1].kind, EventKind::Exit);
    }

    #[test]
    fn unterminated_final_line_is_kept_when_complete() {
        let meta = metadata(0, &[("com.acme.A.run()", "a")]);
        let parsed = parse_session_log("[1] S a\n[7] E a", &meta);
        assert!(!parsed.truncated);
        assert_eq!(parsed.malformed_lines, 0);
        assert_eq!(
            parsed.events,
            vec![TraceEvent::enter(1, "com.acme.A.run()"), TraceEvent::exit(7, "com.acme.A.run()")]
        );

        let single = parse_session_log("[3] S a", &meta);
        assert_eq!(single.events, vec![TraceEvent::enter(3, "com.acme.A.run()")]);
    }

    #[test]
    fn offset_overflow_is_malformed() {
        let meta = metadata(i64::MAX, &[]);
        let parsed = parse_session_log("[10] S a\n", &meta);
        assert!(parsed.events.is_empty());
        assert_eq!(parsed.malformed_lines, 1);
    }

    #[test]
    fn skips_sessions_without_usable_files() {
        let dir = tempfile::tempdir().unwrap();
        let d = dir.path();
        std::fs::write(d.join("B_1.log"), "[1] S a\n[2] E a\n").unwrap();
        std::fs::write(d.join("B_1.json"), r#"{"log_time_difference": 0}"#).unwrap();
        std::fs::write(d.join("B_2.json"), r#"{"log_time_difference": 0}"#).unwrap();
        std::fs::write(d.join("B_3.log"), "").unwrap();
        std::fs::write(d.join("B_3.json"), r#"{"log_time_difference": 0}"#).unwrap();
        std::fs::write(d.join("B_4.log"), "[1] S a\n").unwrap();
        std::fs::write(d.join("B_5.log"), "[1] S a\n").unwrap();
        std::fs::write(d.join("B_5.json"), "{not json").unwrap();

        let result = TraceAssembler::new().assemble(&d.join("B.log"));
        assert_eq!(result.data.sessions.len(), 1);
        assert_eq!(result.data.event_count(), 2);

        let reasons: Vec<(&str, SkipReason)> = result
            .data
            .skipped
            .iter()
            .map(|s| (s.key.as_str(), s.reason))
            .collect();
        assert_eq!(
            reasons,
            vec![
                ("2", SkipReason::MissingLog),
                ("3", SkipReason::EmptyLog),
                ("4", SkipReason::MissingMetadata),
                ("5", SkipReason::InvalidMetadata),
            ]
        );
        assert_eq!(result.error_count(), 1);
    }

    #[test]
    fn empty_family_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = TraceAssembler::new().assemble(&dir.path().join("Nothing.log"));
        assert!(result.is_clean());
        assert!(result.data.is_empty());
    }
}
