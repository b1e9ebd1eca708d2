use crate::error::AnalysisError;
use crate::types::AnalysisResult;

/// Merge per-chunk outcomes into one report, preserving chunk order in every
/// collection. Nothing is deduplicated and chapter lists are joined as
/// produced; seams between chunks stay visible. A failed chunk contributes a
/// placeholder summary line instead of aborting the merge.
pub fn merge_results(
    title: &str,
    outcomes: Vec<Result<AnalysisResult, AnalysisError>>,
) -> AnalysisResult {
    let mut merged = AnalysisResult::minimal(title, "");
    let mut clarity: Vec<String> = Vec::new();

    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(result) => {
                merged.summary.push_str(&result.summary);
                merged.key_points.extend(result.key_points);
                merged.action_items.extend(result.action_items);
                merged.decisions_made.extend(result.decisions_made);
                merged.video_chapters.extend(result.video_chapters);
                merged
                    .presentation_quality
                    .difficult_segments
                    .extend(result.presentation_quality.difficult_segments);
                merged
                    .presentation_quality
                    .improvement_suggestions
                    .extend(result.presentation_quality.improvement_suggestions);
                if !result.presentation_quality.overall_clarity.is_empty() {
                    clarity.push(result.presentation_quality.overall_clarity);
                }
                // later chunks win on glossary collisions
                merged.glossary.extend(result.glossary);
            }
            Err(error) => {
                merged.summary.push_str(&format!(
                    "[Section {} could not be analyzed: {}]",
                    index + 1,
                    error
                ));
            }
        }
    }

    merged.presentation_quality.overall_clarity = if clarity.is_empty() {
        "N/A".to_string()
    } else {
        clarity.join(" ")
    };
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActionItem, Chapter};

    fn result_with(summary: &str) -> AnalysisResult {
        AnalysisResult::minimal("chunk", summary)
    }

    #[test]
    fn summaries_and_lists_keep_chunk_order() {
        let mut a = result_with("A");
        a.key_points = vec!["a1".to_string()];
        let mut b = result_with("B");
        b.key_points = vec!["b1".to_string()];
        let mut c = result_with("C");
        c.key_points = vec!["c1".to_string()];

        let merged = merge_results("Title", vec![Ok(a), Ok(b), Ok(c)]);
        assert_eq!(merged.title, "Title");
        assert_eq!(merged.summary, "ABC");
        assert_eq!(merged.key_points, vec!["a1", "b1", "c1"]);
    }

    #[test]
    fn duplicates_are_not_removed() {
        let mut a = result_with("x");
        a.key_points = vec!["same point".to_string()];
        let mut b = result_with("y");
        b.key_points = vec!["same point".to_string()];

        let merged = merge_results("T", vec![Ok(a), Ok(b)]);
        assert_eq!(merged.key_points, vec!["same point", "same point"]);
    }

    #[test]
    fn glossary_collisions_take_the_later_definition() {
        let mut a = result_with("x");
        a.glossary
            .insert("API".to_string(), "first definition".to_string());
        let mut b = result_with("y");
        b.glossary
            .insert("API".to_string(), "second definition".to_string());
        b.glossary.insert("SLA".to_string(), "uptime promise".to_string());

        let merged = merge_results("T", vec![Ok(a), Ok(b)]);
        assert_eq!(merged.glossary.len(), 2);
        assert_eq!(merged.glossary["API"], "second definition");
    }

    #[test]
    fn failed_chunk_leaves_a_placeholder_without_rejecting_the_rest() {
        let mut ok = result_with("real content");
        ok.action_items.push(ActionItem {
            task: "follow up".to_string(),
            due_date: None,
        });
        let err = AnalysisError::InvalidResponse {
            reason: "no content".to_string(),
        };

        let merged = merge_results("T", vec![Err(err), Ok(ok)]);
        assert!(merged.summary.contains("[Section 1 could not be analyzed"));
        assert!(merged.summary.contains("real content"));
        assert_eq!(merged.action_items.len(), 1);
    }

    #[test]
    fn chapters_concatenate_with_absolute_times() {
        let mut a = result_with("x");
        a.video_chapters.push(Chapter {
            start_time: "00:00:00".to_string(),
            end_time: "00:10:00".to_string(),
            title: "Intro".to_string(),
            description: "Opening remarks".to_string(),
        });
        let mut b = result_with("y");
        b.video_chapters.push(Chapter {
            start_time: "00:10:00".to_string(),
            end_time: "00:20:00".to_string(),
            title: "Roadmap".to_string(),
            description: "Next quarter plans".to_string(),
        });

        let merged = merge_results("T", vec![Ok(a), Ok(b)]);
        assert_eq!(merged.video_chapters.len(), 2);
        assert_eq!(merged.video_chapters[0].title, "Intro");
        assert_eq!(merged.video_chapters[1].start_time, "00:10:00");
    }

    #[test]
    fn clarity_statements_join_into_one_assessment() {
        let mut a = result_with("x");
        a.presentation_quality.overall_clarity = "Mostly clear.".to_string();
        let mut b = result_with("y");
        b.presentation_quality.overall_clarity = "Some jargon.".to_string();

        let merged = merge_results("T", vec![Ok(a), Ok(b)]);
        assert_eq!(
            merged.presentation_quality.overall_clarity,
            "Mostly clear. Some jargon."
        );
    }
}
