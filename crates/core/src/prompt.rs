use tracing::debug;

use crate::format::{format_timestamp, format_transcript_with_timestamps};
use crate::types::Transcript;

/// Render-time ceiling on segments included in a prompt. Distinct from the
/// splitter's chunk bounds: this is the last line of defense when a caller
/// feeds an oversized or unsplit chunk.
pub const PROMPT_MAX_SEGMENTS: usize = 200;
/// Render-time ceiling on transcript characters included in a prompt.
pub const PROMPT_MAX_CHARS: usize = 28_000;

/// Build the analysis prompt for one chunk. Same chunk, title and language
/// always render the same prompt.
pub fn build_prompt(title: &str, chunk: &Transcript, output_language: &str) -> String {
    let instructions = format!(
        r#"You are a meeting and lecture analyst. Your task is to turn a transcript excerpt into a structured report.

IMPORTANT: Write the report in {lang}. Every string must be plain ASCII: standard punctuation only, no emoji, no accented characters, no control characters. Fall back to English when {lang} cannot be written in ASCII.

You MUST output ONLY a single valid JSON object matching this exact structure (no markdown fences, no explanation):
{{
  "title": "Short descriptive title for this part of the recording",
  "summary": "2-4 sentence summary of what was discussed",
  "keyPoints": ["key point 1", "key point 2", "key point 3"],
  "actionItems": [
    {{"task": "What needs to be done", "dueDate": "YYYY-MM-DD or null"}}
  ],
  "decisionsMade": ["decision 1", "decision 2"],
  "videoChapters": [
    {{"startTime": "hh:mm:ss", "endTime": "hh:mm:ss", "title": "Chapter title", "description": "1-2 sentence description"}}
  ],
  "presentationQuality": {{
    "overallClarity": "1-2 sentence assessment of how clearly the material is presented",
    "difficultSegments": [
      {{"startTime": "hh:mm:ss", "endTime": "hh:mm:ss", "issue": "What makes this part hard to follow", "suggestion": "How it could be clearer"}}
    ],
    "improvementSuggestions": ["suggestion 1", "suggestion 2"]
  }},
  "glossary": {{"term": "plain-language definition"}}
}}

Rules:
- Identify 3-7 chapters based on topic changes, covering this excerpt in order
- Take timestamps from the [hh:mm:ss] markers in the transcript; never invent or round them
- Include 5-10 glossary terms a newcomer would need explained
- Populate every field; use "N/A" or an empty array when nothing applies
- Output ONLY the JSON, nothing else"#,
        lang = output_language
    );

    let span_start = chunk
        .segments
        .first()
        .map(|s| format_timestamp(s.start))
        .unwrap_or_else(|| "00:00:00".to_string());
    let span_end = chunk
        .segments
        .last()
        .map(|s| format_timestamp(s.end))
        .unwrap_or_else(|| "00:00:00".to_string());

    format!(
        "{}\n\nAnalyze this part of \"{}\" (covering {}-{}, transcript language: {}):\n\n{}",
        instructions,
        title,
        span_start,
        span_end,
        chunk.language,
        render_transcript(chunk)
    )
}

/// Timestamped transcript block, downsampled and truncated to the prompt
/// ceilings when a chunk is too large to render whole.
fn render_transcript(chunk: &Transcript) -> String {
    let mut rendered = if chunk.segments.len() > PROMPT_MAX_SEGMENTS {
        let stride = chunk.segments.len().div_ceil(PROMPT_MAX_SEGMENTS);
        let sampled = Transcript {
            text: String::new(),
            segments: chunk.segments.iter().step_by(stride).cloned().collect(),
            language: chunk.language.clone(),
        };
        debug!(
            segments = chunk.segments.len(),
            stride,
            kept = sampled.segments.len(),
            "downsampled segments for prompt"
        );
        format_transcript_with_timestamps(&sampled)
    } else {
        format_transcript_with_timestamps(chunk)
    };

    if rendered.chars().count() > PROMPT_MAX_CHARS {
        rendered = rendered.chars().take(PROMPT_MAX_CHARS).collect();
        rendered.push_str("\n[TRUNCATED]");
        debug!("truncated transcript text for prompt");
    }
    rendered
}
