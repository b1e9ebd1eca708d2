use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use crate::error::Result;
use crate::progress::ProgressTracker;
use crate::prompt::build_prompt;
use crate::provider::TextGenerator;
use crate::recover::recover;
use crate::types::{
    ActionItem, AnalysisResult, Chapter, PresentationQuality, SegmentIssue, Transcript,
};

/// Sampling temperature for every analysis call.
pub const GENERATION_TEMPERATURE: f32 = 0.3;

/// Everything one chunk analysis needs to know about its place in the
/// operation. Chunk numbers are 1-based.
#[derive(Debug, Clone)]
pub struct ChunkRequest {
    pub title: String,
    pub chunk: Transcript,
    pub output_language: String,
    pub operation_id: String,
    pub chunk_number: u32,
    pub total_chunks: u32,
}

/// Analyze one chunk: build the prompt, call the model, recover the JSON and
/// map it onto the canonical result shape, reporting milestones to the
/// tracker along the way. Model and parse failures come back as `Err`; the
/// merger decides what a failed chunk looks like in the final report.
pub async fn analyze_chunk(
    generator: &dyn TextGenerator,
    progress: &ProgressTracker,
    request: &ChunkRequest,
) -> Result<AnalysisResult> {
    let position = format!("chunk {}/{}", request.chunk_number, request.total_chunks);

    milestone(progress, request, 10, &format!("preparing {position}")).await;
    let prompt = build_prompt(&request.title, &request.chunk, &request.output_language);

    milestone(progress, request, 30, &format!("sending {position} to model")).await;
    let raw = match generator.generate(&prompt, GENERATION_TEMPERATURE).await {
        Ok(raw) => raw,
        Err(error) => {
            warn!(chunk = request.chunk_number, %error, "model call failed");
            milestone(progress, request, 100, &format!("{position} failed")).await;
            return Err(error);
        }
    };

    milestone(progress, request, 70, &format!("processing response for {position}")).await;
    let value = recover(&raw);
    let result = map_recovered(value, &request.title);

    milestone(progress, request, 100, &format!("{position} completed")).await;
    Ok(result)
}

async fn milestone(progress: &ProgressTracker, request: &ChunkRequest, pct: u8, message: &str) {
    progress
        .update_chunk(
            &request.operation_id,
            request.chunk_number,
            request.total_chunks,
            pct,
            message,
        )
        .await;
}

/// Map a recovered JSON value onto the canonical shape. Every missing or
/// mistyped field gets an explicit neutral default instead of failing the
/// chunk.
pub fn map_recovered(value: Value, fallback_title: &str) -> AnalysisResult {
    AnalysisResult {
        title: non_empty_str(&value["title"])
            .unwrap_or(fallback_title)
            .to_string(),
        summary: non_empty_str(&value["summary"]).unwrap_or("N/A").to_string(),
        key_points: string_list(&value["keyPoints"]),
        action_items: action_items(&value["actionItems"]),
        decisions_made: string_list(&value["decisionsMade"]),
        video_chapters: chapters(&value["videoChapters"]),
        presentation_quality: presentation_quality(&value["presentationQuality"]),
        glossary: glossary(&value["glossary"]),
    }
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn action_items(value: &Value) -> Vec<ActionItem> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let task = non_empty_str(&item["task"])?.to_string();
                    let due_date = non_empty_str(&item["dueDate"]).map(str::to_string);
                    Some(ActionItem { task, due_date })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn chapters(value: &Value) -> Vec<Chapter> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let title = non_empty_str(&item["title"])?.to_string();
                    Some(Chapter {
                        start_time: non_empty_str(&item["startTime"])
                            .unwrap_or("00:00:00")
                            .to_string(),
                        end_time: non_empty_str(&item["endTime"])
                            .unwrap_or("00:00:00")
                            .to_string(),
                        title,
                        description: non_empty_str(&item["description"])
                            .unwrap_or("N/A")
                            .to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn presentation_quality(value: &Value) -> PresentationQuality {
    let difficult_segments = value["difficultSegments"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let issue = non_empty_str(&item["issue"])?.to_string();
                    Some(SegmentIssue {
                        start_time: non_empty_str(&item["startTime"])
                            .unwrap_or("00:00:00")
                            .to_string(),
                        end_time: non_empty_str(&item["endTime"])
                            .unwrap_or("00:00:00")
                            .to_string(),
                        issue,
                        suggestion: non_empty_str(&item["suggestion"])
                            .unwrap_or("N/A")
                            .to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    PresentationQuality {
        overall_clarity: non_empty_str(&value["overallClarity"])
            .unwrap_or("N/A")
            .to_string(),
        difficult_segments,
        improvement_suggestions: string_list(&value["improvementSuggestions"]),
    }
}

fn glossary(value: &Value) -> BTreeMap<String, String> {
    value
        .as_object()
        .map(|map| {
            map.iter()
                .filter_map(|(term, definition)| {
                    definition.as_str().map(|d| (term.clone(), d.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::progress::Status;
    use crate::types::Segment;
    use async_trait::async_trait;
    use serde_json::json;

    struct StaticStub(&'static str);

    #[async_trait]
    impl TextGenerator for StaticStub {
        async fn generate(&self, _prompt: &str, _temperature: f32) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingStub;

    #[async_trait]
    impl TextGenerator for FailingStub {
        async fn generate(&self, _prompt: &str, _temperature: f32) -> Result<String> {
            Err(AnalysisError::InvalidResponse {
                reason: "no content".to_string(),
            })
        }
    }

    fn request() -> ChunkRequest {
        ChunkRequest {
            title: "Weekly Sync".to_string(),
            chunk: Transcript {
                text: "Hello".to_string(),
                segments: vec![Segment {
                    start: 0.0,
                    end: 5.0,
                    text: "Hello".to_string(),
                }],
                language: "en".to_string(),
            },
            output_language: "en".to_string(),
            operation_id: "op".to_string(),
            chunk_number: 1,
            total_chunks: 1,
        }
    }

    #[tokio::test]
    async fn fenced_response_maps_to_result() {
        let tracker = ProgressTracker::new();
        tracker.create("op").await;
        let stub = StaticStub("```json\n{\"summary\":\"ok\",\"keyPoints\":[\"x\"]}\n```");

        let result = analyze_chunk(&stub, &tracker, &request()).await.unwrap();
        assert_eq!(result.summary, "ok");
        assert_eq!(result.key_points, vec!["x"]);
        // title missing in the response falls back to the request title
        assert_eq!(result.title, "Weekly Sync");

        let record = tracker.get("op").await.unwrap();
        assert_eq!(record.chunk_progress, 100);
        assert_eq!(record.status, Status::Processing);
        assert!(record.message.contains("completed"));
    }

    #[tokio::test]
    async fn model_failure_is_reported_not_panicked() {
        let tracker = ProgressTracker::new();
        tracker.create("op").await;

        let outcome = analyze_chunk(&FailingStub, &tracker, &request()).await;
        assert!(outcome.is_err());

        let record = tracker.get("op").await.unwrap();
        assert_eq!(record.chunk_progress, 100);
        assert!(record.message.contains("failed"));
    }

    #[tokio::test]
    async fn prose_response_still_yields_a_result() {
        let tracker = ProgressTracker::new();
        tracker.create("op").await;
        let stub = StaticStub("I could not produce JSON, sorry about that.");

        let result = analyze_chunk(&stub, &tracker, &request()).await.unwrap();
        assert_eq!(result.summary, "I could not produce JSON, sorry about that.");
        assert!(result.key_points.is_empty());
    }

    #[test]
    fn mapping_fills_neutral_defaults() {
        let result = map_recovered(json!({}), "Fallback Title");
        assert_eq!(result.title, "Fallback Title");
        assert_eq!(result.summary, "N/A");
        assert!(result.key_points.is_empty());
        assert!(result.video_chapters.is_empty());
        assert_eq!(result.presentation_quality.overall_clarity, "N/A");
        assert!(result.glossary.is_empty());
    }

    #[test]
    fn mapping_tolerates_mistyped_fields() {
        let value = json!({
            "summary": 42,
            "keyPoints": "not an array",
            "actionItems": [{"task": "", "dueDate": "2026-09-01"}, {"task": "call Ira"}],
            "videoChapters": [{"description": "no title"}, {"title": "Kickoff"}],
            "glossary": {"ok": "fine", "bad": 7}
        });
        let result = map_recovered(value, "T");
        assert_eq!(result.summary, "N/A");
        assert!(result.key_points.is_empty());
        assert_eq!(result.action_items.len(), 1);
        assert_eq!(result.action_items[0].task, "call Ira");
        assert_eq!(result.video_chapters.len(), 1);
        assert_eq!(result.video_chapters[0].start_time, "00:00:00");
        assert_eq!(result.glossary.len(), 1);
    }

    #[test]
    fn mapping_passes_full_shape_through() {
        let value = json!({
            "title": "Part One",
            "summary": "We planned the rollout.",
            "keyPoints": ["staged deploy"],
            "actionItems": [{"task": "write runbook", "dueDate": "2026-09-01"}],
            "decisionsMade": ["ship Friday"],
            "videoChapters": [{
                "startTime": "00:00:00",
                "endTime": "00:05:00",
                "title": "Planning",
                "description": "Rollout discussion"
            }],
            "presentationQuality": {
                "overallClarity": "Clear and focused.",
                "difficultSegments": [{
                    "startTime": "00:02:00",
                    "endTime": "00:03:00",
                    "issue": "crosstalk",
                    "suggestion": "one speaker at a time"
                }],
                "improvementSuggestions": ["share slides beforehand"]
            },
            "glossary": {"rollout": "gradual release"}
        });
        let result = map_recovered(value, "unused");
        assert_eq!(result.title, "Part One");
        assert_eq!(result.action_items[0].due_date.as_deref(), Some("2026-09-01"));
        assert_eq!(result.video_chapters[0].end_time, "00:05:00");
        assert_eq!(
            result.presentation_quality.difficult_segments[0].issue,
            "crosstalk"
        );
        assert_eq!(result.glossary["rollout"], "gradual release");
    }
}
