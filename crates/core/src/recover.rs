use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Value, json};
use tracing::{debug, warn};

/// Longest brace-delimited span anywhere in the text.
static OBJECT_SPAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{.*\}").unwrap());
/// Runs of commas separated only by whitespace.
static DUPLICATE_COMMAS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",(\s*,)+").unwrap());
/// Comma directly before a closing brace or bracket.
static TRAILING_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*([}\]])").unwrap());
/// A backslash and whatever it tries to escape, including a lone trailing one.
static ESCAPE_SEQ: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\\(u[0-9a-fA-F]{4}|.|$)"#).unwrap());

/// Longest summary the fallback object will carry.
const FALLBACK_SUMMARY_CHARS: usize = 2000;

/// Best-effort recovery of a JSON object from raw model output.
///
/// Tries progressively more aggressive strategies: code-fence stripping,
/// brace-bound extraction, sanitization, structural repair, and greedy
/// re-extraction. Never fails. When nothing parseable remains, it returns a
/// fallback object carrying the cleaned text as `summary` so the content is
/// not lost.
pub fn recover(raw: &str) -> Value {
    let unfenced = strip_code_fence(raw);

    let Some(span) = brace_span(unfenced) else {
        warn!("model output has no JSON object markers, using fallback");
        return fallback(&sanitize(unfenced));
    };

    let cleaned = sanitize(span);
    if let Some(value) = parse_object(&cleaned) {
        return value;
    }

    let repaired = repair_structure(&cleaned);
    if let Some(value) = parse_object(&repaired) {
        debug!("recovered JSON after structural repair");
        return value;
    }

    // The span slice above can clip a usable object when braces appear in
    // surrounding prose. Retry against the sanitized text as a whole.
    let sanitized_all = sanitize(unfenced);
    if let Some(m) = OBJECT_SPAN.find(&sanitized_all) {
        if let Some(value) = parse_object(m.as_str()) {
            debug!("recovered JSON after greedy re-extraction");
            return value;
        }
        let candidate = repair_structure(m.as_str());
        if let Some(value) = parse_object(&candidate) {
            debug!("recovered JSON after greedy re-extraction and repair");
            return value;
        }
    }

    warn!("model output is unrecoverable as JSON, using fallback");
    fallback(&sanitized_all)
}

/// Extract the inner content of a fenced code block, tolerating a missing
/// closing fence. Text without fences passes through trimmed.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    for marker in ["```json", "```"] {
        if let Some(start) = trimmed.find(marker) {
            let after = &trimmed[start + marker.len()..];
            return match after.find("```") {
                Some(end) => after[..end].trim(),
                None => after.trim(),
            };
        }
    }
    trimmed
}

/// Slice from the first `{` to the last `}`, inclusive. Output truncated
/// before any closing brace still yields the open-ended tail so the repair
/// stage can balance it.
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    match text.rfind('}') {
        Some(end) if end > start => Some(&text[start..=end]),
        _ => Some(&text[start..]),
    }
}

/// Normalize line breaks to single spaces, drop remaining control
/// characters, and make stray backslashes valid escapes.
fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push(' ');
            }
            '\n' | '\u{0085}' | '\u{2028}' | '\u{2029}' => out.push(' '),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    escape_stray_backslashes(&out)
}

/// Double every backslash that does not start a legal JSON escape, so the
/// string survives parsing. `\'` is not legal JSON either; models emit it
/// meaning a plain quote, so it is normalized rather than doubled.
fn escape_stray_backslashes(text: &str) -> String {
    let text = text.replace("\\'", "'");
    ESCAPE_SEQ
        .replace_all(&text, |caps: &Captures| {
            let tail = &caps[1];
            if is_valid_escape(tail) {
                caps[0].to_string()
            } else {
                format!("\\\\{}", tail)
            }
        })
        .into_owned()
}

fn is_valid_escape(tail: &str) -> bool {
    matches!(tail, "\"" | "\\" | "/" | "b" | "f" | "n" | "r" | "t")
        || (tail.len() == 5 && tail.starts_with('u'))
}

/// Comma cleanup plus bracket balancing for truncated output.
fn repair_structure(text: &str) -> String {
    let collapsed = DUPLICATE_COMMAS.replace_all(text, ",");
    let detrailed = TRAILING_COMMA.replace_all(&collapsed, "$1");
    let mut repaired = detrailed.into_owned();

    // Close whatever the model left open, arrays before objects.
    let (open_braces, open_brackets) = unclosed_counts(&repaired);
    for _ in 0..open_brackets {
        repaired.push(']');
    }
    for _ in 0..open_braces {
        repaired.push('}');
    }
    repaired
}

/// Count unclosed braces and brackets outside string literals.
fn unclosed_counts(text: &str) -> (usize, usize) {
    let mut braces = 0i64;
    let mut brackets = 0i64;
    let mut in_string = false;
    let mut escaped = false;
    for c in text.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => braces += 1,
            '}' if !in_string => braces -= 1,
            '[' if !in_string => brackets += 1,
            ']' if !in_string => brackets -= 1,
            _ => {}
        }
    }
    (braces.max(0) as usize, brackets.max(0) as usize)
}

fn parse_object(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(Value::is_object)
}

/// Deterministic last resort: a canonical-shaped object carrying the cleaned
/// response text as summary.
fn fallback(cleaned: &str) -> Value {
    let summary: String = cleaned
        .trim()
        .chars()
        .take(FALLBACK_SUMMARY_CHARS)
        .collect();
    json!({
        "title": "",
        "summary": summary,
        "keyPoints": [],
        "actionItems": [],
        "decisionsMade": [],
        "videoChapters": [],
        "presentationQuality": {
            "overallClarity": "N/A",
            "difficultSegments": [],
            "improvementSuggestions": []
        },
        "glossary": {}
    })
}
