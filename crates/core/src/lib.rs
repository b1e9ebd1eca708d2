//! Sekretar Core Library
//!
//! Chunked transcript analysis: splits timestamped transcripts into
//! model-safe chunks, drives parallel model calls, recovers structure from
//! malformed JSON output, and merges per-chunk results into one report.

pub mod analyzer;
pub mod chunk;
pub mod error;
pub mod format;
pub mod merge;
pub mod orchestrator;
pub mod progress;
pub mod prompt;
pub mod provider;
pub mod recover;
pub mod types;

// Re-export commonly used items at crate root
pub use analyzer::{ChunkRequest, GENERATION_TEMPERATURE, analyze_chunk, map_recovered};
pub use chunk::{ChunkLimits, split_transcript};
pub use error::{AnalysisError, Result};
pub use format::{format_report_readable, format_timestamp, format_transcript_with_timestamps};
pub use merge::merge_results;
pub use orchestrator::Orchestrator;
pub use progress::{DEFAULT_RETENTION_MINUTES, ProgressRecord, ProgressTracker, Status};
pub use prompt::{PROMPT_MAX_CHARS, PROMPT_MAX_SEGMENTS, build_prompt};
pub use provider::{HttpGenerator, Provider, ProviderConfig, TextGenerator};
pub use recover::recover;
pub use types::{
    ActionItem, AnalysisResult, Chapter, PresentationQuality, Segment, SegmentIssue, Transcript,
};
