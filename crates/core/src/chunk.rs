use tracing::debug;

use crate::types::{Segment, Transcript};

/// Bounds applied when splitting a transcript into model-safe chunks. A chunk
/// closes as soon as adding the next segment would cross either bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLimits {
    pub max_segments: usize,
    pub max_chars: usize,
}

impl Default for ChunkLimits {
    fn default() -> Self {
        Self {
            max_segments: 120,
            max_chars: 24_000,
        }
    }
}

/// Split a transcript into chunks that respect both limits.
///
/// Segments keep their absolute timestamps. A single segment longer than
/// `max_chars` still forms its own chunk. Always returns at least one chunk,
/// even for an empty transcript.
pub fn split_transcript(transcript: &Transcript, limits: &ChunkLimits) -> Vec<Transcript> {
    let mut chunks = Vec::new();
    let mut current: Vec<Segment> = Vec::new();
    let mut current_chars = 0usize;

    for segment in &transcript.segments {
        let over_segments = current.len() + 1 > limits.max_segments;
        let over_chars = current_chars + segment.text.len() > limits.max_chars;
        if !current.is_empty() && (over_segments || over_chars) {
            chunks.push(build_chunk(
                std::mem::take(&mut current),
                &transcript.language,
            ));
            current_chars = 0;
        }
        current_chars += segment.text.len();
        current.push(segment.clone());
    }
    chunks.push(build_chunk(current, &transcript.language));

    debug!(
        chunks = chunks.len(),
        segments = transcript.segments.len(),
        "split transcript"
    );
    chunks
}

fn build_chunk(segments: Vec<Segment>, language: &str) -> Transcript {
    let text = segments
        .iter()
        .map(|s| s.text.trim())
        .collect::<Vec<_>>()
        .join(" ");
    Transcript {
        text,
        segments,
        language: language.to_string(),
    }
}
