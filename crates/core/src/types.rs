use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub segments: Vec<Segment>,
    pub language: String,
}

impl Transcript {
    /// Total duration in seconds, taken from the last segment's end time.
    pub fn duration_seconds(&self) -> f64 {
        self.segments.last().map(|s| s.end).unwrap_or(0.0)
    }
}

/// One timestamped utterance. `start` and `end` are absolute seconds from the
/// beginning of the recording and stay absolute after chunking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub title: String,
    pub summary: String,
    pub key_points: Vec<String>,
    pub action_items: Vec<ActionItem>,
    pub decisions_made: Vec<String>,
    pub video_chapters: Vec<Chapter>,
    pub presentation_quality: PresentationQuality,
    pub glossary: BTreeMap<String, String>,
}

impl AnalysisResult {
    /// Well-formed result carrying nothing but a title and a summary line.
    /// Used when analysis cannot produce real content.
    pub fn minimal(title: &str, summary: &str) -> Self {
        Self {
            title: title.to_string(),
            summary: summary.to_string(),
            key_points: Vec::new(),
            action_items: Vec::new(),
            decisions_made: Vec::new(),
            video_chapters: Vec::new(),
            presentation_quality: PresentationQuality {
                overall_clarity: "N/A".to_string(),
                difficult_segments: Vec::new(),
                improvement_suggestions: Vec::new(),
            },
            glossary: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub task: String,
    pub due_date: Option<String>,
}

/// Time fields are `hh:mm:ss` strings produced by the model from segment
/// timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub start_time: String,
    pub end_time: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationQuality {
    pub overall_clarity: String,
    pub difficult_segments: Vec<SegmentIssue>,
    pub improvement_suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentIssue {
    pub start_time: String,
    pub end_time: String,
    pub issue: String,
    pub suggestion: String,
}
