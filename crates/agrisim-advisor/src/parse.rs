//! Service reply parsing.
//!
//! The analysis reply is free text with no guaranteed schema. Sections are
//! recovered by scanning lines for category keywords; anything the scan
//! misses is backfilled from the heuristics. Genetic-variation hints are
//! JSON and go through the same lenient recovery strategies as any other
//! model-produced JSON.

use agrisim_types::{AdvisoryReport, GeneticVariation, ReportSource};
use chrono::Utc;

use crate::error::AdvisorError;
use crate::heuristics;
use crate::subject::AdvisorySubject;

// ---------------------------------------------------------------------------
// Keyword sections
// ---------------------------------------------------------------------------

const CONDITION_KEYWORDS: &[&str] = &["condition", "assessment", "status"];
const URGENT_KEYWORDS: &[&str] = &["urgent", "immediate", "priority"];
const RECOMMENDATION_KEYWORDS: &[&str] = &["recommend", "optimization", "improve"];
const DISEASE_KEYWORDS: &[&str] = &["disease", "pest", "treatment"];
const YIELD_KEYWORDS: &[&str] = &["yield", "harvest", "production"];
const TIMELINE_KEYWORDS: &[&str] = &["timeline", "schedule", "next"];

/// Sections recovered from a reply. `None` means no line matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSections {
    /// Condition assessment.
    pub condition: Option<String>,
    /// Most urgent action.
    pub urgent_action: Option<String>,
    /// Care recommendations.
    pub recommendations: Option<String>,
    /// Disease and pest advice.
    pub disease_management: Option<String>,
    /// Yield prediction.
    pub yield_prediction: Option<String>,
    /// Timeline.
    pub timeline: Option<String>,
}

impl ParsedSections {
    /// Whether no section matched at all.
    pub const fn is_empty(&self) -> bool {
        self.condition.is_none()
            && self.urgent_action.is_none()
            && self.recommendations.is_none()
            && self.disease_management.is_none()
            && self.yield_prediction.is_none()
            && self.timeline.is_none()
    }

    /// Assemble a report, backfilling unmatched sections from the heuristics.
    ///
    /// The condition band always comes from the heuristics so collaborators
    /// can rely on it regardless of the reply's wording.
    pub fn into_report(self, subject: &AdvisorySubject, confidence: u8) -> AdvisoryReport {
        let (condition_band, fallback_condition) = heuristics::assess_condition(subject);
        AdvisoryReport {
            condition: self
                .condition
                .unwrap_or_else(|| fallback_condition.to_owned()),
            condition_band,
            urgent_action: self
                .urgent_action
                .unwrap_or_else(|| heuristics::urgent_action(subject).to_owned()),
            recommendations: self
                .recommendations
                .unwrap_or_else(|| heuristics::recommendations(subject)),
            disease_management: self
                .disease_management
                .unwrap_or_else(|| heuristics::disease_advice(subject).to_owned()),
            yield_prediction: self
                .yield_prediction
                .unwrap_or_else(|| heuristics::predict_yield(subject)),
            timeline: self.timeline.unwrap_or_else(|| heuristics::timeline(subject)),
            confidence,
            source: ReportSource::Service,
            generated_at: Utc::now(),
        }
    }
}

/// Scan a reply for every section.
///
/// # Errors
///
/// Returns [`AdvisorError::Malformed`] if the reply is blank or no line
/// matches any keyword.
pub fn parse_sections(reply: &str) -> Result<ParsedSections, AdvisorError> {
    let lines: Vec<&str> = reply
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        return Err(AdvisorError::Malformed("empty reply".to_owned()));
    }

    let sections = ParsedSections {
        condition: extract_section(&lines, CONDITION_KEYWORDS),
        urgent_action: extract_section(&lines, URGENT_KEYWORDS),
        recommendations: extract_section(&lines, RECOMMENDATION_KEYWORDS),
        disease_management: extract_section(&lines, DISEASE_KEYWORDS),
        yield_prediction: extract_section(&lines, YIELD_KEYWORDS),
        timeline: extract_section(&lines, TIMELINE_KEYWORDS),
    };
    if sections.is_empty() {
        return Err(AdvisorError::Malformed(
            "no line matched any section keyword".to_owned(),
        ));
    }
    Ok(sections)
}

/// First line containing any keyword (case-insensitive), list marker stripped.
pub fn extract_section(lines: &[&str], keywords: &[&str]) -> Option<String> {
    lines
        .iter()
        .find(|line| {
            let lower = line.to_lowercase();
            keywords.iter().any(|keyword| lower.contains(keyword))
        })
        .map(|line| strip_list_marker(line).to_owned())
        .filter(|text| !text.is_empty())
}

/// Drop a leading `N.` numbered-list marker.
fn strip_list_marker(line: &str) -> &str {
    let trimmed = line.trim();
    let rest = trimmed.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() == trimmed.len() {
        return trimmed;
    }
    rest.strip_prefix('.').map_or(trimmed, str::trim)
}

// ---------------------------------------------------------------------------
// Variation hints
// ---------------------------------------------------------------------------

/// Raw hint as the model tends to produce it; every field optional.
#[derive(Debug, serde::Deserialize)]
struct RawVariationHint {
    #[serde(default)]
    height_variation: Option<f64>,
    #[serde(default)]
    color_variation: Option<f64>,
    #[serde(default)]
    leaf_count: Option<f64>,
    #[serde(default)]
    growth_rate_modifier: Option<f64>,
    #[serde(default)]
    disease_resistance: Option<f64>,
}

/// Parse a variation hint, clamping every field to a plausible range.
///
/// Attempts multiple recovery strategies if the raw text is not clean JSON:
/// 1. Direct `serde_json` deserialization
/// 2. Extract JSON from markdown code blocks
/// 3. Strip trailing commas and retry
/// 4. Code block, then strip trailing commas
///
/// Missing fields take the neutral defaults.
///
/// # Errors
///
/// Returns [`AdvisorError::Malformed`] if every strategy fails.
pub fn parse_variation_hint(raw: &str) -> Result<GeneticVariation, AdvisorError> {
    let trimmed = raw.trim();

    // Strategy 1: direct parse
    if let Ok(parsed) = serde_json::from_str::<RawVariationHint>(trimmed) {
        return Ok(convert_hint(&parsed));
    }

    // Strategy 2: extract from markdown code block
    if let Some(json_str) = extract_json_from_codeblock(trimmed)
        && let Ok(parsed) = serde_json::from_str::<RawVariationHint>(json_str)
    {
        return Ok(convert_hint(&parsed));
    }

    // Strategy 3: strip trailing commas and retry
    let cleaned = strip_trailing_commas(trimmed);
    if let Ok(parsed) = serde_json::from_str::<RawVariationHint>(&cleaned) {
        return Ok(convert_hint(&parsed));
    }

    // Strategy 4: extract from code block then strip commas
    if let Some(json_str) = extract_json_from_codeblock(trimmed) {
        let cleaned_inner = strip_trailing_commas(json_str);
        if let Ok(parsed) = serde_json::from_str::<RawVariationHint>(&cleaned_inner) {
            return Ok(convert_hint(&parsed));
        }
    }

    Err(AdvisorError::Malformed(format!(
        "variation hint is not JSON: {trimmed}"
    )))
}

fn convert_hint(raw: &RawVariationHint) -> GeneticVariation {
    let neutral = GeneticVariation::default();
    let pick = |value: Option<f64>, fallback: f64, low: f64, high: f64| {
        value
            .filter(|v| v.is_finite())
            .map_or(fallback, |v| v.clamp(low, high))
    };
    GeneticVariation {
        growth_rate_modifier: pick(raw.growth_rate_modifier, neutral.growth_rate_modifier, 0.5, 1.5),
        disease_resistance: pick(raw.disease_resistance, neutral.disease_resistance, 0.0, 1.0),
        height_variation: pick(raw.height_variation, neutral.height_variation, 0.5, 1.5),
        color_variation: pick(raw.color_variation, neutral.color_variation, 0.0, 0.5),
        leaf_count: pick(raw.leaf_count, neutral.leaf_count, 0.5, 1.5),
    }
}

/// Extract JSON from a markdown code block.
fn extract_json_from_codeblock(text: &str) -> Option<&str> {
    // Look for ```json ... ``` or ``` ... ```
    let start = text
        .find("```json")
        .map(|i| after_fence_line(text, i, 7))
        .or_else(|| text.find("```").map(|i| after_fence_line(text, i, 3)))?;

    let remaining = text.get(start..)?;
    let end = remaining.find("```")?;
    remaining.get(..end).map(str::trim)
}

/// Byte offset just past the newline that ends an opening fence.
fn after_fence_line(text: &str, fence: usize, tag_len: usize) -> usize {
    let after_tag = fence.checked_add(tag_len).unwrap_or(fence);
    text.get(after_tag..)
        .and_then(|s| s.find('\n'))
        .and_then(|nl| after_tag.checked_add(nl))
        .and_then(|pos| pos.checked_add(1))
        .unwrap_or(after_tag)
}

/// Strip trailing commas before closing braces and brackets (common LLM error).
fn strip_trailing_commas(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c == ',' {
            let rest: String = chars.clone().skip_while(|n| n.is_whitespace()).take(1).collect();
            if rest == "}" || rest == "]" {
                continue;
            }
        }
        result.push(c);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subject::tests::subject;

    const NUMBERED_REPLY: &str = "
1. Current condition assessment: the plant is recovering well.
2. Most urgent action: water deeply this evening.
3. Growth optimization: recommend side-dressing with compost.
4. Disease/pest management: inspect leaves for blight weekly.
5. Predicted yield: roughly 4 tomatoes per plant.
6. Timeline: check again in 3 days.
";

    #[test]
    fn numbered_reply_fills_every_section() {
        let sections = parse_sections(NUMBERED_REPLY).ok().unwrap_or_default();
        assert_eq!(
            sections.condition.as_deref(),
            Some("Current condition assessment: the plant is recovering well.")
        );
        assert_eq!(
            sections.urgent_action.as_deref(),
            Some("Most urgent action: water deeply this evening.")
        );
        assert_eq!(
            sections.recommendations.as_deref(),
            Some("Growth optimization: recommend side-dressing with compost.")
        );
        assert!(sections.disease_management.is_some());
        assert_eq!(
            sections.yield_prediction.as_deref(),
            Some("Predicted yield: roughly 4 tomatoes per plant.")
        );
        assert_eq!(sections.timeline.as_deref(), Some("Timeline: check again in 3 days."));
    }

    #[test]
    fn first_matching_line_wins() {
        let lines = ["Status: fine", "Condition: great"];
        assert_eq!(
            extract_section(&lines, CONDITION_KEYWORDS).as_deref(),
            Some("Status: fine")
        );
    }

    #[test]
    fn matching_is_case_insensitive() {
        let lines = ["URGENT: water now"];
        assert_eq!(
            extract_section(&lines, URGENT_KEYWORDS).as_deref(),
            Some("URGENT: water now")
        );
    }

    #[test]
    fn blank_and_keywordless_replies_are_malformed() {
        assert!(matches!(parse_sections("  \n\n "), Err(AdvisorError::Malformed(_))));
        assert!(matches!(
            parse_sections("lorem ipsum\ndolor sit amet"),
            Err(AdvisorError::Malformed(_))
        ));
    }

    #[test]
    fn partial_reply_backfills_per_field() {
        let s = subject(40.0, 20.0, 50.0, 50.0, 10.0);
        let sections = parse_sections("Urgent: spray copper fungicide").ok().unwrap_or_default();
        let report = sections.into_report(&s, 95);
        assert_eq!(report.urgent_action, "Urgent: spray copper fungicide");
        assert_eq!(report.condition, heuristics::assess_condition(&s).1);
        assert_eq!(report.timeline, heuristics::timeline(&s));
        assert_eq!(report.source, ReportSource::Service);
        assert_eq!(report.confidence, 95);
    }

    #[test]
    fn list_marker_is_stripped() {
        assert_eq!(strip_list_marker("12. Timeline soon"), "Timeline soon");
        assert_eq!(strip_list_marker("2023 harvest"), "2023 harvest");
        assert_eq!(strip_list_marker("- yield ok"), "- yield ok");
    }

    #[test]
    fn variation_hint_direct() {
        let hint = parse_variation_hint(
            r#"{"height_variation": 1.1, "color_variation": 0.2, "leaf_count": 0.9, "growth_rate_modifier": 1.05, "disease_resistance": 0.7}"#,
        );
        let hint = hint.ok().unwrap_or_default();
        assert!((hint.height_variation - 1.1).abs() < 1e-9);
        assert!((hint.disease_resistance - 0.7).abs() < 1e-9);
    }

    #[test]
    fn variation_hint_from_fenced_block_with_trailing_comma() {
        let raw = "Here you go:\n```json\n{\"growth_rate_modifier\": 9.0, \"disease_resistance\": -1,}\n```";
        let hint = parse_variation_hint(raw).ok().unwrap_or_default();
        assert!((hint.growth_rate_modifier - 1.5).abs() < 1e-9);
        assert!(hint.disease_resistance.abs() < 1e-9);
        assert!((hint.leaf_count - 1.0).abs() < 1e-9);
    }

    #[test]
    fn variation_hint_garbage_is_malformed() {
        assert!(parse_variation_hint("tall and green").is_err());
    }

    #[test]
    fn strip_trailing_commas_basic() {
        assert_eq!(strip_trailing_commas(r#"{"a": 1, "b": 2,}"#), r#"{"a": 1, "b": 2}"#);
        assert_eq!(strip_trailing_commas("[1, 2, 3,\n]"), "[1, 2, 3\n]");
    }
}
