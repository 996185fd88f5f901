//! Defensive parsing of judge responses.
//!
//! Every response resolves to exactly one of two cases: a parsed critique
//! (possibly after repair) or the canonical degraded critique.

use serde_json::{Map, Value};

use crate::domain::models::ComparisonResult;

const DEFAULT_SUB_SCORE: f64 = 0.7;
const DEFAULT_QUALITY_SCORE: f64 = 0.5;
const DEFAULT_TEXT: &str = "Analysis completed";

/// Outcome of parsing one judge response.
#[derive(Debug, Clone, PartialEq)]
pub enum JudgmentParse {
    Parsed {
        result: ComparisonResult,
        /// The raw text needed repair before it parsed.
        repaired: bool,
    },
    Degraded {
        result: ComparisonResult,
        reason: String,
    },
}

impl JudgmentParse {
    pub fn result(&self) -> &ComparisonResult {
        match self {
            Self::Parsed { result, .. } | Self::Degraded { result, .. } => result,
        }
    }

    pub fn into_result(self) -> ComparisonResult {
        match self {
            Self::Parsed { result, .. } | Self::Degraded { result, .. } => result,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// Parse a raw judge response, repairing it when possible.
pub fn parse_judgment(raw: &str) -> JudgmentParse {
    let cleaned = strip_code_fences(raw);
    let Some(candidate) = extract_object(cleaned) else {
        return JudgmentParse::Degraded {
            result: ComparisonResult::unparseable("no JSON object in response"),
            reason: "no JSON object in response".to_string(),
        };
    };

    let first_error = match parse_object(candidate) {
        Ok(map) => {
            return JudgmentParse::Parsed {
                result: from_map(&map),
                repaired: false,
            }
        }
        Err(err) => err,
    };

    if let Ok(map) = parse_object(&close_structure(candidate)) {
        return JudgmentParse::Parsed {
            result: from_map(&map),
            repaired: true,
        };
    }

    if let Some(map) = truncate_to_complete_lines(candidate) {
        return JudgmentParse::Parsed {
            result: from_map(&map),
            repaired: true,
        };
    }

    JudgmentParse::Degraded {
        result: ComparisonResult::unparseable(&first_error),
        reason: first_error,
    }
}

/// Remove surrounding markdown code fences, if any.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Slice from the first `{` to its matching `}`, or to the end when unbalanced.
pub fn extract_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    Some(text[start..].trim_end())
}

fn parse_object(text: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("response is not a JSON object".to_string()),
        Err(err) => Err(err.to_string()),
    }
}

/// Close an unterminated string, drop a dangling comma, then close open brackets.
pub fn close_structure(text: &str) -> String {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for ch in text.chars() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                stack.pop();
            }
            _ => {}
        }
    }

    let mut out = text.to_string();
    if in_string {
        if escaped {
            out.pop();
        }
        out.push('"');
    }
    let trimmed_len = out.trim_end().trim_end_matches(',').trim_end().len();
    out.truncate(trimmed_len);
    out.extend(stack.into_iter().rev());
    out
}

/// Drop trailing lines until the remainder closes into a valid object.
fn truncate_to_complete_lines(text: &str) -> Option<Map<String, Value>> {
    let lines: Vec<&str> = text.lines().collect();
    (1..lines.len()).rev().find_map(|end| {
        let head = lines[..end].join("\n");
        parse_object(&close_structure(&head)).ok()
    })
}

fn score(map: &Map<String, Value>, key: &str, default: f64) -> f64 {
    let value = match map.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value
        .filter(|v| v.is_finite())
        .map_or(default, |v| v.clamp(0.0, 1.0))
}

fn text(map: &Map<String, Value>, key: &str) -> String {
    match map.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => DEFAULT_TEXT.to_string(),
    }
}

fn list(map: &Map<String, Value>, key: &str) -> Vec<String> {
    match map.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::String(_) | Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

/// Build a critique from a parsed object, defaulting absent fields.
pub fn from_map(map: &Map<String, Value>) -> ComparisonResult {
    ComparisonResult {
        anomalies: list(map, "anomalies"),
        similarities: list(map, "similarities"),
        confidence_score: score(map, "confidence_score", DEFAULT_SUB_SCORE),
        authenticity_score: score(map, "authenticity_score", DEFAULT_SUB_SCORE),
        data_integration_score: score(map, "data_integration_score", DEFAULT_SUB_SCORE),
        quality_score: score(map, "quality_score", DEFAULT_QUALITY_SCORE),
        detailed_analysis: text(map, "detailed_analysis"),
        overall_assessment: text(map, "overall_assessment"),
        improvement_suggestions: list(map, "improvement_suggestions"),
        personalization_evidence: list(map, "personalization_evidence"),
        generic_indicators: list(map, "generic_indicators"),
        key_inconsistencies: list(map, "key_inconsistencies"),
    }
}
