//! Shared fixtures for the integration tests: a scripted model service and
//! a tiny PDF writer.

#![allow(dead_code)]

use futures::future::BoxFuture;
use scheme_eligibility::{Language, ModelError, ModelService, PipelineConfig, RawProfile};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// The scheme used throughout the scenarios.
pub const SCHEME_TEXT: &str = "Scheme X: Rs 500 per month for farmers aged 60 or above \
with annual income below Rs 100000. Apply at the block office with Aadhaar and an income certificate.";

pub const SUMMARY_REPLY: &str = r#"{
  "scheme_name": "Scheme X",
  "purpose": "Monthly pension for elderly farmers",
  "benefits": ["₹500 per month"],
  "eligibility_criteria": ["Must be a farmer", "Aged 60 or above", "Annual income below ₹100000"],
  "required_documents": ["Aadhaar card", "Income certificate"],
  "application_process": ["Apply at the block office"],
  "important_details": {
    "application_deadline": null,
    "contact_information": "Block agriculture office",
    "subsidy_amount": "₹500 per month"
  }
}"#;

const ELIGIBLE_REPLY: &str = r#"{
  "verdict": "ELIGIBLE",
  "rationale": "Age 65 meets the minimum of 60 and income ₹80000 is below ₹100000.",
  "remediation_steps": [],
  "required_documentation": ["Aadhaar card", "Income certificate"],
  "next_steps": "Visit the block office with your Aadhaar card."
}"#;

const NOT_ELIGIBLE_REPLY: &str = r#"{
  "verdict": "NOT_ELIGIBLE",
  "rationale": "The scheme requires applicants aged 60 or above; the user is 40.",
  "remediation_steps": ["Reapply once your age reaches 60 years."],
  "next_steps": null
}"#;

const UNCERTAIN_REPLY: &str = r#"{
  "verdict": "UNCERTAIN",
  "rationale": "The profile does not say whether the user is a farmer.",
  "remediation_steps": ["Provide your occupation."]
}"#;

const SUMMARY_MARKER: &str = "government policy analyst";
const EVALUATION_MARKER: &str = "You decide whether a person qualifies";
const TRANSLATION_MARKER: &str = "Translate the following";

/// Which kind of prompt a call carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Summary,
    Evaluation,
    Translation,
}

/// A model service that answers by recognising the prompt.
///
/// Evaluation replies depend on the profile age in the prompt: 65 is
/// eligible, 40 is not, anything else is uncertain.
pub struct ScriptedService {
    pub summary_reply: String,
    pub verdict_reply: Option<String>,
    pub failing_languages: Vec<Language>,
    pub hang_on: Option<Call>,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl Default for ScriptedService {
    fn default() -> Self {
        Self {
            summary_reply: SUMMARY_REPLY.to_string(),
            verdict_reply: None,
            failing_languages: Vec::new(),
            hang_on: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedService {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls_of(&self, kind: Call) -> usize {
        self.prompts()
            .iter()
            .filter(|p| classify(p) == Some(kind))
            .count()
    }
}

fn classify(prompt: &str) -> Option<Call> {
    if prompt.contains(SUMMARY_MARKER) {
        Some(Call::Summary)
    } else if prompt.contains(EVALUATION_MARKER) {
        Some(Call::Evaluation)
    } else if prompt.contains(TRANSLATION_MARKER) {
        Some(Call::Translation)
    } else {
        None
    }
}

fn target_language(prompt: &str) -> Option<Language> {
    Language::ALL
        .iter()
        .copied()
        .find(|l| prompt.contains(&format!("into very simple {} (", l.name())))
}

impl ModelService for ScriptedService {
    fn complete<'a>(
        &'a self,
        prompt: &'a str,
        _max_tokens: usize,
    ) -> BoxFuture<'a, Result<String, ModelError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());

            let kind = classify(prompt);
            if kind.is_some() && kind == self.hang_on {
                tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
            }

            match kind {
                Some(Call::Summary) => Ok(self.summary_reply.clone()),
                Some(Call::Evaluation) => Ok(match self.verdict_reply {
                    Some(ref reply) => reply.clone(),
                    None if prompt.contains("Age: 65\n") => ELIGIBLE_REPLY.to_string(),
                    None if prompt.contains("Age: 40\n") => NOT_ELIGIBLE_REPLY.to_string(),
                    None => UNCERTAIN_REPLY.to_string(),
                }),
                Some(Call::Translation) => match target_language(prompt) {
                    Some(l) if self.failing_languages.contains(&l) => {
                        Err(ModelError::Api(format!("{} model unavailable", l.name())))
                    }
                    Some(l) => Ok(format!("[{}] {}", l.code(), l.native_name())),
                    None => Err(ModelError::Api("unknown target language".into())),
                },
                None => Err(ModelError::Api("unrecognised prompt".into())),
            }
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Config wired to `service`, with a short timeout.
pub fn config_with(service: Arc<ScriptedService>) -> PipelineConfig {
    PipelineConfig::builder()
        .service(service as Arc<dyn ModelService>)
        .api_timeout_secs(5)
        .build()
        .unwrap()
}

pub fn senior_farmer() -> RawProfile {
    RawProfile {
        occupation: Some("Farmer".into()),
        ..RawProfile::new("65", "80000", "general", "Telangana")
    }
}

pub fn younger_farmer() -> RawProfile {
    RawProfile {
        occupation: Some("Farmer".into()),
        ..RawProfile::new("40", "80000", "general", "Telangana")
    }
}

/// Write a minimal PDF with one Helvetica text line per input line.
///
/// Object layout: 1 catalog, 2 page tree, 3 font, then a page object and its
/// content stream for each page.
pub fn text_pdf(pages: &[&str]) -> Vec<u8> {
    let kids: Vec<String> = (0..pages.len())
        .map(|i| format!("{} 0 R", 4 + 2 * i))
        .collect();

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            pages.len()
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];

    for (i, text) in pages.iter().enumerate() {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            5 + 2 * i
        ));
        let mut content = String::from("BT /F1 12 Tf 72 720 Td ");
        for (j, line) in text.lines().enumerate() {
            if j > 0 {
                content.push_str("0 -16 Td ");
            }
            let escaped = line
                .replace('\\', "\\\\")
                .replace('(', "\\(")
                .replace(')', "\\)");
            content.push_str(&format!("({escaped}) Tj "));
        }
        content.push_str("ET");
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ));
    }

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, obj) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, obj).as_bytes());
    }
    let xref = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for off in offsets {
        out.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref
        )
        .as_bytes(),
    );
    out
}
