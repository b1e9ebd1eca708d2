use crate::types::{AnalysisResult, Transcript};

/// Format seconds as hh:mm:ss timestamp, truncated to whole seconds
pub fn format_timestamp(seconds: f64) -> String {
    let total = if seconds > 0.0 { seconds as u64 } else { 0 };
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}

/// Format transcript segments with timestamps
pub fn format_transcript_with_timestamps(transcript: &Transcript) -> String {
    transcript
        .segments
        .iter()
        .map(|seg| format!("[{}] {}", format_timestamp(seg.start), seg.text.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format an analysis result as human-readable markdown
pub fn format_report_readable(report: &AnalysisResult) -> String {
    let mut output = String::new();

    // Title
    output.push_str(&format!("# {}\n\n", report.title));

    // Summary
    output.push_str("## Summary\n\n");
    output.push_str(&report.summary);
    output.push_str("\n\n");

    // Key Points
    if !report.key_points.is_empty() {
        output.push_str("## Key Points\n\n");
        for point in &report.key_points {
            output.push_str(&format!("• {}\n", point));
        }
        output.push('\n');
    }

    // Action Items
    if !report.action_items.is_empty() {
        output.push_str("## Action Items\n\n");
        for (i, item) in report.action_items.iter().enumerate() {
            match &item.due_date {
                Some(due) => {
                    output.push_str(&format!("{}. {} (due {})\n", i + 1, item.task, due))
                }
                None => output.push_str(&format!("{}. {}\n", i + 1, item.task)),
            }
        }
        output.push('\n');
    }

    // Decisions
    if !report.decisions_made.is_empty() {
        output.push_str("## Decisions\n\n");
        for decision in &report.decisions_made {
            output.push_str(&format!("• {}\n", decision));
        }
        output.push('\n');
    }

    // Chapters
    if !report.video_chapters.is_empty() {
        output.push_str("## Chapters\n\n");
        for chapter in &report.video_chapters {
            output.push_str(&format!(
                "### [{}–{}] {}\n\n",
                chapter.start_time, chapter.end_time, chapter.title
            ));
            output.push_str(&format!("{}\n\n", chapter.description));
        }
    }

    // Presentation Quality
    output.push_str("## Presentation Quality\n\n");
    output.push_str(&report.presentation_quality.overall_clarity);
    output.push_str("\n\n");
    if !report.presentation_quality.difficult_segments.is_empty() {
        output.push_str("**Difficult segments:**\n\n");
        for seg in &report.presentation_quality.difficult_segments {
            output.push_str(&format!(
                "• [{}–{}] {} — {}\n",
                seg.start_time, seg.end_time, seg.issue, seg.suggestion
            ));
        }
        output.push('\n');
    }
    if !report.presentation_quality.improvement_suggestions.is_empty() {
        output.push_str("**Suggestions:**\n\n");
        for suggestion in &report.presentation_quality.improvement_suggestions {
            output.push_str(&format!("• {}\n", suggestion));
        }
        output.push('\n');
    }

    // Glossary
    if !report.glossary.is_empty() {
        output.push_str("## Glossary\n\n");
        for (term, definition) in &report.glossary {
            output.push_str(&format!("**{}** — {}\n", term, definition));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Segment;

    #[test]
    fn timestamp_truncates_to_whole_seconds() {
        assert_eq!(format_timestamp(0.0), "00:00:00");
        assert_eq!(format_timestamp(59.9), "00:00:59");
        assert_eq!(format_timestamp(61.2), "00:01:01");
        assert_eq!(format_timestamp(3661.0), "01:01:01");
        assert_eq!(format_timestamp(-5.0), "00:00:00");
    }

    #[test]
    fn transcript_lines_carry_absolute_timestamps() {
        let transcript = Transcript {
            text: "Hello World".to_string(),
            segments: vec![
                Segment {
                    start: 0.0,
                    end: 5.0,
                    text: " Hello ".to_string(),
                },
                Segment {
                    start: 3725.0,
                    end: 3730.0,
                    text: "World".to_string(),
                },
            ],
            language: "en".to_string(),
        };
        let rendered = format_transcript_with_timestamps(&transcript);
        assert_eq!(rendered, "[00:00:00] Hello\n[01:02:05] World");
    }

    #[test]
    fn readable_report_skips_empty_sections() {
        let report = AnalysisResult::minimal("Standup", "Nothing happened.");
        let rendered = format_report_readable(&report);
        assert!(rendered.contains("# Standup"));
        assert!(rendered.contains("## Summary"));
        assert!(!rendered.contains("## Key Points"));
        assert!(!rendered.contains("## Glossary"));
    }
}
