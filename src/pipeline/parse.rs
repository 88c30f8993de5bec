//! Reply parsing: strict schema validation of model output.
//!
//! The summary and verdict prompts ask for one JSON object (see
//! [`crate::prompts`]). Parsing is two steps:
//!
//! 1. **Cleanup**: deterministic fixes for quirks that do not change content:
//!    outer ```` ```json ```` fences the model added despite the prompt, CRLF
//!    line endings, invisible Unicode, surrounding whitespace.
//! 2. **Validation**: `serde_json` into a wire struct with
//!    `deny_unknown_fields`. A missing required list, a wrong type, an
//!    unknown key or an unrecognised verdict label is an error. Nothing is
//!    searched for heuristically, so the same reply always parses (or fails)
//!    the same way.

use crate::output::{EligibilityVerdict, ImportantDetails, SchemeSummary, Verdict};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

/// Apply every cleanup rule to a raw model reply.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF → LF)
/// 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 3. Strip outer code fences, with or without a language tag
/// 4. Trim surrounding whitespace
pub fn clean_reply(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = strip_code_fences(&s);
    s.trim().to_string()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 3: Strip outer code fences ──────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[A-Za-z0-9_-]*[ \t]*\n(.*)\n```\s*$").expect("fence regex is valid")
});

fn strip_code_fences(input: &str) -> String {
    match RE_OUTER_FENCES.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WireSummary {
    #[serde(default)]
    scheme_name: Option<String>,
    #[serde(default)]
    purpose: Option<String>,
    benefits: Vec<String>,
    eligibility_criteria: Vec<String>,
    required_documents: Vec<String>,
    #[serde(default)]
    application_process: Vec<String>,
    #[serde(default)]
    important_details: Option<WireDetails>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct WireDetails {
    #[serde(default)]
    application_deadline: Option<String>,
    #[serde(default)]
    contact_information: Option<String>,
    #[serde(default)]
    subsidy_amount: Option<String>,
}

/// Parse a summary reply. `Err` carries a human-readable reason.
pub fn parse_summary(reply: &str, input_truncated: bool) -> Result<SchemeSummary, String> {
    let cleaned = clean_reply(reply);
    if cleaned.is_empty() {
        return Err("reply is empty".to_string());
    }
    let wire: WireSummary = serde_json::from_str(&cleaned).map_err(|e| e.to_string())?;
    let details = wire.important_details.unwrap_or_default();

    Ok(SchemeSummary {
        scheme_name: non_empty(wire.scheme_name),
        purpose: non_empty(wire.purpose),
        benefits: clean_items(wire.benefits),
        eligibility_criteria: clean_items(wire.eligibility_criteria),
        required_documents: clean_items(wire.required_documents),
        application_process: clean_items(wire.application_process),
        important_details: ImportantDetails {
            application_deadline: non_empty(details.application_deadline),
            contact_information: non_empty(details.contact_information),
            subsidy_amount: non_empty(details.subsidy_amount),
        },
        input_truncated,
    })
}

// ── Verdict ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WireVerdict {
    verdict: String,
    rationale: String,
    #[serde(default)]
    remediation_steps: Vec<String>,
    #[serde(default)]
    required_documentation: Vec<String>,
    #[serde(default)]
    next_steps: Option<String>,
}

/// Parse a verdict reply. `Err` carries a human-readable reason.
///
/// The label must be one of the three contract labels; an `ELIGIBLE` reply
/// that lists remediation steps has them dropped.
pub fn parse_verdict(reply: &str) -> Result<EligibilityVerdict, String> {
    let cleaned = clean_reply(reply);
    if cleaned.is_empty() {
        return Err("reply is empty".to_string());
    }
    let wire: WireVerdict = serde_json::from_str(&cleaned).map_err(|e| e.to_string())?;

    let verdict: Verdict = wire.verdict.parse()?;

    let rationale = wire.rationale.trim().to_string();
    if rationale.is_empty() {
        return Err("rationale is empty".to_string());
    }

    let mut remediation_steps = clean_items(wire.remediation_steps);
    if verdict == Verdict::Eligible && !remediation_steps.is_empty() {
        debug!(
            "Dropping {} remediation steps from an ELIGIBLE verdict",
            remediation_steps.len()
        );
        remediation_steps.clear();
    }

    Ok(EligibilityVerdict {
        verdict,
        rationale,
        remediation_steps,
        required_documentation: clean_items(wire.required_documentation),
        next_steps: non_empty(wire.next_steps),
    })
}

// ── Translation ──────────────────────────────────────────────────────────────

/// Clean a translation reply; `None` when nothing is left.
pub fn parse_translation(reply: &str) -> Option<String> {
    let cleaned = clean_reply(reply);
    (!cleaned.is_empty()).then_some(cleaned)
}

fn clean_items(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("null"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY: &str = r#"{
        "scheme_name": "Scheme X",
        "purpose": "Pension for elderly farmers",
        "benefits": ["₹500 per month"],
        "eligibility_criteria": ["Farmer", "Aged 60 or above", "Annual income below ₹100000"],
        "required_documents": ["Aadhaar card", "  "],
        "application_process": []
    }"#;

    #[test]
    fn test_strip_fences() {
        let input = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(input), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_fences_no_lang() {
        let input = "```\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(input), "{\"a\": 1}");
    }

    #[test]
    fn test_no_fences_passthrough() {
        assert_eq!(strip_code_fences("{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn test_normalise_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_remove_invisible() {
        let input = "\u{FEFF}hello\u{200B}world";
        assert_eq!(remove_invisible_chars(input), "helloworld");
    }

    #[test]
    fn summary_parses_and_drops_blank_items() {
        let s = parse_summary(SUMMARY, false).unwrap();
        assert_eq!(s.scheme_name.as_deref(), Some("Scheme X"));
        assert_eq!(s.eligibility_criteria.len(), 3);
        assert_eq!(s.required_documents, vec!["Aadhaar card".to_string()]);
        assert!(s.application_process.is_empty());
        assert!(s.important_details.is_empty());
        assert!(!s.input_truncated);

        let null_details = r#"{"benefits": [], "eligibility_criteria": [], "required_documents": [], "important_details": null}"#;
        assert!(parse_summary(null_details, false).unwrap().important_details.is_empty());
    }

    #[test]
    fn summary_keeps_important_details() {
        let reply = r#"{
            "benefits": ["₹6000 per year"],
            "eligibility_criteria": ["Small and marginal farmers"],
            "required_documents": ["Land record"],
            "important_details": {
                "application_deadline": "31 March 2025",
                "contact_information": " Helpline 155261 ",
                "subsidy_amount": "null"
            }
        }"#;
        let d = parse_summary(reply, false).unwrap().important_details;
        assert_eq!(d.application_deadline.as_deref(), Some("31 March 2025"));
        assert_eq!(d.contact_information.as_deref(), Some("Helpline 155261"));
        assert_eq!(d.subsidy_amount, None);
    }

    #[test]
    fn unknown_detail_key_is_an_error() {
        let reply = r#"{"benefits": [], "eligibility_criteria": [], "required_documents": [],
            "important_details": {"office_hours": "9 to 5"}}"#;
        let err = parse_summary(reply, false).unwrap_err();
        assert!(err.contains("office_hours"), "got: {err}");
    }

    #[test]
    fn summary_inside_fences_parses() {
        let fenced = format!("```json\r\n{SUMMARY}\r\n```\r\n");
        let s = parse_summary(&fenced, true).unwrap();
        assert_eq!(s.benefits, vec!["₹500 per month".to_string()]);
        assert!(s.input_truncated);
    }

    #[test]
    fn summary_missing_section_is_an_error() {
        let reply = r#"{"benefits": [], "eligibility_criteria": []}"#;
        let err = parse_summary(reply, false).unwrap_err();
        assert!(err.contains("required_documents"), "got: {err}");
    }

    #[test]
    fn summary_rejects_prose_and_unknown_keys() {
        assert!(parse_summary("**KEY BENEFITS:**\n• money", false).is_err());
        let extra = r#"{"benefits": [], "eligibility_criteria": [], "required_documents": [], "deadline": "soon"}"#;
        assert!(parse_summary(extra, false).is_err());
        assert!(parse_summary("   ", false).is_err());
    }

    #[test]
    fn verdict_parses_each_label() {
        for (label, expected) in [
            ("ELIGIBLE", Verdict::Eligible),
            ("NOT_ELIGIBLE", Verdict::NotEligible),
            ("UNCERTAIN", Verdict::Uncertain),
        ] {
            let reply = format!(r#"{{"verdict": "{label}", "rationale": "because"}}"#);
            assert_eq!(parse_verdict(&reply).unwrap().verdict, expected);
        }
    }

    #[test]
    fn verdict_unknown_label_is_an_error() {
        let reply = r#"{"verdict": "PARTIALLY ELIGIBLE", "rationale": "half"}"#;
        let err = parse_verdict(reply).unwrap_err();
        assert!(err.contains("PARTIALLY ELIGIBLE"), "got: {err}");
    }

    #[test]
    fn verdict_without_rationale_is_an_error() {
        assert!(parse_verdict(r#"{"verdict": "ELIGIBLE"}"#).is_err());
        assert!(parse_verdict(r#"{"verdict": "ELIGIBLE", "rationale": " "}"#).is_err());
    }

    #[test]
    fn eligible_verdict_never_carries_steps() {
        let reply = r#"{"verdict": "ELIGIBLE", "rationale": "meets all", "remediation_steps": ["nothing"], "next_steps": null}"#;
        let v = parse_verdict(reply).unwrap();
        assert!(v.remediation_steps.is_empty());
        assert!(v.required_documentation.is_empty());
        assert_eq!(v.next_steps, None);
    }

    #[test]
    fn verdict_keeps_required_documentation() {
        let reply = r#"{"verdict": "ELIGIBLE", "rationale": "meets all",
            "required_documentation": ["Aadhaar card", " ", "Caste certificate"]}"#;
        let v = parse_verdict(reply).unwrap();
        assert_eq!(
            v.required_documentation,
            vec!["Aadhaar card".to_string(), "Caste certificate".to_string()]
        );
    }

    #[test]
    fn translation_cleanup() {
        assert_eq!(
            parse_translation("```\nనమస్కారం\n```").as_deref(),
            Some("నమస్కారం")
        );
        assert_eq!(parse_translation(" \u{200B} "), None);
    }
}
