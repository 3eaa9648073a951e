#![forbid(unsafe_code)]

//! Deterministic session recording and replay.
//!
//! [`SessionRecorder`] wraps an [`EditorHost`] and records every dispatched
//! event together with the host commands it produced and an FNV-1a checksum
//! of the resulting editor state. [`replay`] feeds a recorded trace through a
//! fresh host and reports the first input whose outcome differs.
//!
//! # Trace format
//!
//! JSON lines, one [`TraceRecord`] per line, tagged by `record`:
//!
//! - **header**: schema version and the seed configuration (must be first).
//! - **input**: `seq`, the event in its [`InputEventJson`] form, the command
//!   bits and the state checksum after handling it.
//! - **summary**: input count and final checksum (must be last).
//!
//! # Example
//!
//! ```ignore
//! let mut recorder = SessionRecorder::new(&config, HeadlessPresentation::default());
//! recorder.dispatch(&InputEvent::text("a"));
//! let trace = recorder.finish();
//! let result = replay(HeadlessPresentation::default(), &trace)?;
//! assert!(result.ok());
//! ```

use core::fmt;

use inscribe_core::config::{ChordModifier, EditorConfig};
use inscribe_core::event::{InputEvent, InputEventJson};
use inscribe_edit::{Editor, HostCommands, SessionPhase};
use serde::{Deserialize, Serialize};

use crate::host::EditorHost;
use crate::presentation::Presentation;

/// Schema version for session traces.
pub const SCHEMA_VERSION: &str = "inscribe-trace-v1";

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

fn fnv1a64_bytes(mut hash: u64, bytes: &[u8]) -> u64 {
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn fnv1a64_u64(hash: u64, v: u64) -> u64 {
    fnv1a64_bytes(hash, &v.to_le_bytes())
}

/// Checksum of everything an event can change: text, cursor, session phase
/// and composing text.
#[must_use]
pub fn state_checksum(editor: &Editor) -> u64 {
    let cursor = editor.cursor();
    let phase: u64 = match editor.session().phase() {
        SessionPhase::Idle => 0,
        SessionPhase::Composing => 1,
        SessionPhase::AwaitingEcho => 2,
    };

    let mut hash = FNV_OFFSET_BASIS;
    hash = fnv1a64_u64(hash, editor.text().len() as u64);
    hash = fnv1a64_bytes(hash, editor.text().as_bytes());
    hash = fnv1a64_u64(hash, cursor.index as u64);
    hash = fnv1a64_u64(hash, cursor.length as u64);
    hash = fnv1a64_u64(hash, phase);
    hash = fnv1a64_u64(hash, editor.composing_text().len() as u64);
    fnv1a64_bytes(hash, editor.composing_text().as_bytes())
}

/// A single record in a session trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum TraceRecord {
    /// Session header (must be first).
    Header {
        schema_version: String,
        seed_text: String,
        seed_caret: usize,
        fallback_caret_height: f32,
        select_all_modifier: ChordModifier,
    },
    /// One dispatched event and what it produced.
    Input {
        seq: u64,
        event: InputEventJson,
        commands: u8,
        checksum: u64,
    },
    /// Trace summary (must be last).
    Summary { total_inputs: u64, final_checksum: u64 },
}

impl TraceRecord {
    fn header(config: &EditorConfig) -> Self {
        Self::Header {
            schema_version: SCHEMA_VERSION.to_string(),
            seed_text: config.seed_text.clone(),
            seed_caret: config.seed_caret,
            fallback_caret_height: config.fallback_caret_height,
            select_all_modifier: config.select_all_modifier,
        }
    }
}

/// A complete recorded session trace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionTrace {
    pub records: Vec<TraceRecord>,
}

impl SessionTrace {
    /// Number of input records.
    pub fn input_count(&self) -> u64 {
        self.records
            .iter()
            .filter(|r| matches!(r, TraceRecord::Input { .. }))
            .count() as u64
    }

    /// Final checksum from the summary record.
    pub fn final_checksum(&self) -> Option<u64> {
        self.records.iter().rev().find_map(|r| match r {
            TraceRecord::Summary { final_checksum, .. } => Some(*final_checksum),
            _ => None,
        })
    }

    /// Seed configuration from the header, which must be the first record.
    pub fn config(&self) -> Result<EditorConfig, TraceError> {
        match self.records.first() {
            Some(TraceRecord::Header {
                schema_version,
                seed_text,
                seed_caret,
                fallback_caret_height,
                select_all_modifier,
            }) => {
                if schema_version != SCHEMA_VERSION {
                    return Err(TraceError::UnsupportedSchema {
                        found: schema_version.clone(),
                    });
                }
                Ok(EditorConfig::default()
                    .with_seed_text(seed_text.clone())
                    .with_seed_caret(*seed_caret)
                    .with_fallback_caret_height(*fallback_caret_height)
                    .with_select_all_modifier(*select_all_modifier))
            }
            _ => Err(TraceError::MissingHeader),
        }
    }

    /// Serialize the trace as JSON lines.
    pub fn to_jsonl(&self) -> Result<String, TraceError> {
        let mut out = String::new();
        for record in &self.records {
            let line = serde_json::to_string(record).map_err(|source| TraceError::Json {
                line: 0,
                source,
            })?;
            out.push_str(&line);
            out.push('\n');
        }
        Ok(out)
    }

    /// Parse JSON lines; blank lines are skipped.
    ///
    /// Parse errors carry the 1-based line number.
    pub fn from_jsonl(input: &str) -> Result<Self, TraceError> {
        let mut records = Vec::new();
        for (idx, line) in input.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record = serde_json::from_str(line).map_err(|source| TraceError::Json {
                line: idx + 1,
                source,
            })?;
            records.push(record);
        }
        Ok(Self { records })
    }
}

/// Records a session for deterministic replay.
#[derive(Debug)]
pub struct SessionRecorder<P> {
    host: EditorHost<P>,
    records: Vec<TraceRecord>,
    seq: u64,
}

impl<P: Presentation> SessionRecorder<P> {
    /// Start a session seeded from `config` over `presentation`.
    pub fn new(config: &EditorConfig, presentation: P) -> Self {
        Self {
            host: EditorHost::new(config, presentation),
            records: vec![TraceRecord::header(config)],
            seq: 0,
        }
    }

    /// Dispatch `event` to the host and record it.
    pub fn dispatch(&mut self, event: &InputEvent) -> HostCommands {
        let commands = self.host.dispatch(event);
        self.records.push(TraceRecord::Input {
            seq: self.seq,
            event: InputEventJson::from(event),
            commands: commands.bits(),
            checksum: state_checksum(self.host.editor()),
        });
        self.seq += 1;
        commands
    }

    pub fn host(&self) -> &EditorHost<P> {
        &self.host
    }

    /// Finish recording and return the completed trace.
    pub fn finish(mut self) -> SessionTrace {
        self.records.push(TraceRecord::Summary {
            total_inputs: self.seq,
            final_checksum: state_checksum(self.host.editor()),
        });
        SessionTrace {
            records: self.records,
        }
    }
}

/// Result of replaying a session trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayResult {
    /// Inputs replayed.
    pub inputs: u64,
    /// State checksum after the last input.
    pub final_checksum: u64,
    /// First input whose outcome diverged, if any.
    pub first_mismatch: Option<ReplayMismatch>,
}

impl ReplayResult {
    /// Whether every input reproduced its recorded outcome.
    #[must_use]
    pub fn ok(&self) -> bool {
        self.first_mismatch.is_none()
    }
}

/// Description of a divergence during replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayMismatch {
    pub seq: u64,
    pub expected_checksum: u64,
    pub actual_checksum: u64,
    pub expected_commands: u8,
    pub actual_commands: u8,
}

/// Replay `trace` through a fresh host over `presentation`.
pub fn replay<P: Presentation>(
    presentation: P,
    trace: &SessionTrace,
) -> Result<ReplayResult, TraceError> {
    let config = trace.config()?;
    let mut host = EditorHost::new(&config, presentation);

    let mut inputs: u64 = 0;
    let mut first_mismatch = None;

    for record in &trace.records {
        let TraceRecord::Input {
            seq,
            event,
            commands,
            checksum,
        } = record
        else {
            continue;
        };

        let actual_commands = host.dispatch(&InputEvent::from(event.clone())).bits();
        let actual_checksum = state_checksum(host.editor());
        inputs += 1;

        if first_mismatch.is_none() && (actual_checksum != *checksum || actual_commands != *commands)
        {
            inscribe_core::warn!(seq, "replay diverged");
            first_mismatch = Some(ReplayMismatch {
                seq: *seq,
                expected_checksum: *checksum,
                actual_checksum,
                expected_commands: *commands,
                actual_commands,
            });
        }
    }

    Ok(ReplayResult {
        inputs,
        final_checksum: state_checksum(host.editor()),
        first_mismatch,
    })
}

/// Errors loading or replaying a trace.
#[derive(Debug)]
pub enum TraceError {
    /// The first record is not a header.
    MissingHeader,
    /// The header names a schema this build cannot replay.
    UnsupportedSchema { found: String },
    /// A line was not a valid record (`line` is 1-based; 0 when encoding).
    Json { line: usize, source: serde_json::Error },
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHeader => write!(f, "trace missing header record"),
            Self::UnsupportedSchema { found } => {
                write!(f, "unsupported trace schema {found:?} (expected {SCHEMA_VERSION})")
            }
            Self::Json { line: 0, source } => write!(f, "trace encoding failed: {source}"),
            Self::Json { line, source } => write!(f, "line {line}: {source}"),
        }
    }
}

impl std::error::Error for TraceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json { source, .. } => Some(source),
            Self::MissingHeader | Self::UnsupportedSchema { .. } => None,
        }
    }
}
