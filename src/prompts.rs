//! Prompt templates for the three model-backed stages.
//!
//! Every prompt lives here so that changing the reply contract means editing
//! one file, and so tests can inspect prompts without a model.
//!
//! The summary and verdict prompts ask for a single JSON object. The reply
//! parser in [`crate::pipeline::parse`] validates that object strictly: a
//! missing list or an unknown verdict label is an error, never a guess.

use crate::output::{EligibilityVerdict, Language, SchemeSummary, UserProfile};

/// Instructions for [`crate::pipeline::summarize`]. `{document}` is replaced
/// with the (possibly truncated) document text.
pub const SUMMARY_TEMPLATE: &str = r#"You are an expert government policy analyst. Read the government scheme document below and summarise it.

Reply with ONE JSON object and nothing else, using exactly these keys:

{
  "scheme_name": "<name of the scheme, or null if not stated>",
  "purpose": "<one sentence on what the scheme aims to achieve, or null>",
  "benefits": ["<benefit>", "..."],
  "eligibility_criteria": ["<criterion>", "..."],
  "required_documents": ["<document>", "..."],
  "application_process": ["<step>", "..."],
  "important_details": {
    "application_deadline": "<last date to apply, or null>",
    "contact_information": "<office, helpline or website to contact, or null>",
    "subsidy_amount": "<amount of money or subsidy given, or null>"
  }
}

Rules:
- "benefits", "eligibility_criteria" and "required_documents" are REQUIRED. Use an empty list when the document says nothing.
- Fill "important_details" only with facts the document states; use null for anything it does not mention.
- Each list item is one short, self-contained sentence. Keep amounts, ages, income limits and dates exactly as written.
- Do not invent criteria that are not in the document.
- Do not wrap the JSON in markdown fences. Do not add commentary.

Document content:
"""
{document}
""""#;

/// Instructions for [`crate::pipeline::evaluate`].
pub const EVALUATION_TEMPLATE: &str = r#"You decide whether a person qualifies for a government scheme. Compare the user profile against EVERY eligibility criterion.

SCHEME
{scheme}

USER PROFILE
{profile}

Reply with ONE JSON object and nothing else, using exactly these keys:

{
  "verdict": "ELIGIBLE" | "NOT_ELIGIBLE" | "UNCERTAIN",
  "rationale": "<two or three sentences naming the criteria that decided the verdict>",
  "remediation_steps": ["<concrete action>", "..."],
  "required_documentation": ["<document this user must gather>", "..."],
  "next_steps": "<what the user should do next to apply, or null>"
}

Rules:
- "verdict" must be exactly one of ELIGIBLE, NOT_ELIGIBLE, UNCERTAIN.
- Use UNCERTAIN when the profile does not contain the information a criterion needs.
- When the verdict is ELIGIBLE, "remediation_steps" is an empty list.
- Otherwise list, in order, concrete steps the user could take to become eligible, each naming the criterion it addresses. Use an empty list when nothing can be done.
- "required_documentation" lists the scheme's documents that THIS user must gather given their profile (for example a caste certificate only when the category calls for one). Use an empty list when the scheme names none.
- Do not wrap the JSON in markdown fences. Do not add commentary."#;

/// Instructions for [`crate::pipeline::translate`].
pub const TRANSLATION_TEMPLATE: &str = r#"Translate the following government scheme summary and eligibility result into very simple {language} ({native}) that a common person, farmer, or villager can easily understand.

Rules:
- Use simple, everyday words and short sentences. Avoid technical and legal terms.
- Keep every number, amount, age and date exactly as written.
- Keep the headings and the list structure: one line per item.
- Output ONLY the translation. No notes, no transliteration, no English.

Text to translate:
"""
{text}
""""#;

/// Build the summary prompt for `document`.
pub fn summary_prompt(document: &str) -> String {
    fill(SUMMARY_TEMPLATE, &[("document", document)])
}

/// Build the evaluation prompt for a summary and a profile.
pub fn evaluation_prompt(summary: &SchemeSummary, profile: &UserProfile) -> String {
    let scheme = describe_scheme(summary);
    let profile = describe_profile(profile);
    fill(EVALUATION_TEMPLATE, &[("scheme", &scheme), ("profile", &profile)])
}

/// Build the translation prompt for `text` into `language`.
pub fn translation_prompt(text: &str, language: Language) -> String {
    fill(
        TRANSLATION_TEMPLATE,
        &[
            ("language", language.name()),
            ("native", language.native_name()),
            ("text", text),
        ],
    )
}

/// Substitute `{key}` placeholders in one left-to-right pass. Substituted
/// text is never scanned again, so placeholders inside document or model
/// text stay literal.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let hit = values
            .iter()
            .find(|(key, _)| after.starts_with(key) && after[key.len()..].starts_with('}'));
        match hit {
            Some((key, value)) => {
                out.push_str(value);
                rest = &after[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn describe_scheme(summary: &SchemeSummary) -> String {
    let mut out = String::new();
    if let Some(ref name) = summary.scheme_name {
        out.push_str(&format!("Name: {name}\n"));
    }
    push_list(&mut out, "Eligibility criteria", &summary.eligibility_criteria);
    push_list(&mut out, "Benefits", &summary.benefits);
    push_list(&mut out, "Required documents", &summary.required_documents);
    out
}

fn push_items(out: &mut String, heading: &str, items: &[String], numbered: bool) {
    if items.is_empty() {
        return;
    }
    out.push_str(&format!("\n{heading}:\n"));
    for (i, item) in items.iter().enumerate() {
        if numbered {
            out.push_str(&format!("{}. {}\n", i + 1, item.trim()));
        } else {
            out.push_str(&format!("- {}\n", item.trim()));
        }
    }
}

fn push_list(out: &mut String, heading: &str, items: &[String]) {
    out.push_str(heading);
    out.push_str(":\n");
    if items.is_empty() {
        out.push_str("- (none stated)\n");
    }
    for item in items {
        out.push_str(&format!("- {item}\n"));
    }
}

fn describe_profile(profile: &UserProfile) -> String {
    let not_given = "Not specified";
    let gender = profile
        .gender
        .map(|g| g.to_string())
        .unwrap_or_else(|| not_given.to_string());
    format!(
        "Age: {}\n\
         Annual income: ₹{}\n\
         Category: {}\n\
         State: {}\n\
         Gender: {}\n\
         Occupation: {}\n\
         Education: {}\n",
        profile.age,
        profile.annual_income,
        profile.category,
        profile.state,
        gender,
        profile.occupation.as_deref().unwrap_or(not_given),
        profile.education.as_deref().unwrap_or(not_given),
    )
}

/// Render a summary as plain English text.
pub fn render_summary(summary: &SchemeSummary) -> String {
    let mut out = String::new();
    if let Some(ref name) = summary.scheme_name {
        out.push_str(&format!("Scheme: {name}\n"));
    }
    if let Some(ref purpose) = summary.purpose {
        out.push_str(&format!("Purpose: {purpose}\n"));
    }
    push_items(&mut out, "Key benefits", &summary.benefits, false);
    push_items(&mut out, "Eligibility criteria", &summary.eligibility_criteria, false);
    push_items(&mut out, "Required documents", &summary.required_documents, false);
    push_items(&mut out, "How to apply", &summary.application_process, true);

    let details = &summary.important_details;
    if !details.is_empty() {
        out.push_str("\nImportant details:\n");
        for (label, value) in [
            ("Application deadline", &details.application_deadline),
            ("Contact", &details.contact_information),
            ("Subsidy amount", &details.subsidy_amount),
        ] {
            if let Some(value) = value {
                out.push_str(&format!("- {label}: {}\n", value.trim()));
            }
        }
    }
    out
}

/// Render a verdict as plain English text.
pub fn render_verdict(verdict: &EligibilityVerdict) -> String {
    let mut out = format!(
        "Eligibility: {}\n\nReason: {}\n",
        verdict.verdict,
        verdict.rationale.trim()
    );
    push_items(&mut out, "Steps to become eligible", &verdict.remediation_steps, true);
    push_items(&mut out, "Documents you need", &verdict.required_documentation, false);
    if let Some(ref next) = verdict.next_steps {
        out.push_str(&format!("\nNext steps: {}\n", next.trim()));
    }
    out
}

/// Summary followed by verdict: the source for every translation and the
/// English entry of the localized result.
pub fn render_result(summary: &SchemeSummary, verdict: &EligibilityVerdict) -> String {
    let summary = render_summary(summary);
    if summary.is_empty() {
        return render_verdict(verdict);
    }
    format!("{}\n{}", summary.trim_end(), render_verdict(verdict))
}
