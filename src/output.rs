//! Data model: everything that flows between pipeline stages.
//!
//! Types are plain data with public fields, `Serialize`/`Deserialize` so the
//! CLI can print them as JSON, and no behaviour beyond small helpers. The
//! stage modules under [`crate::pipeline`] produce them; the
//! [`crate::orchestrator`] owns them for the duration of one run.

use crate::error::TranslationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// MIME type accepted by the text extractor.
pub const PDF_MIME: &str = "application/pdf";

// ── Document ─────────────────────────────────────────────────────────────

/// Uploaded document bytes with their declared MIME type.
#[derive(Clone)]
pub struct RawDocument {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    /// File name or URL, for log lines only.
    pub name: Option<String>,
}

impl RawDocument {
    pub fn new(bytes: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
            name: None,
        }
    }

    /// Bytes declared as `application/pdf`.
    pub fn pdf(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(bytes, PDF_MIME)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name for log lines.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<upload>")
    }
}

impl fmt::Debug for RawDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawDocument")
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .field("mime_type", &self.mime_type)
            .field("name", &self.name)
            .finish()
    }
}

/// Plain text pulled out of a document, pages joined in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub text: String,
    /// Pages in the document.
    pub page_count: usize,
    /// Pages that contributed text.
    pub pages_with_text: usize,
}

impl ExtractedText {
    /// Wrap text that did not come from the extractor (tests, pasted text).
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let pages = usize::from(!text.trim().is_empty());
        Self {
            text,
            page_count: pages,
            pages_with_text: pages,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

// ── Summary ──────────────────────────────────────────────────────────────

/// Structured summary of a scheme document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeSummary {
    pub scheme_name: Option<String>,
    pub purpose: Option<String>,
    pub benefits: Vec<String>,
    pub eligibility_criteria: Vec<String>,
    pub required_documents: Vec<String>,
    pub application_process: Vec<String>,
    #[serde(default)]
    pub important_details: ImportantDetails,
    /// The document text was cut to fit the model's input budget.
    pub input_truncated: bool,
}

/// Practical facts the document states besides its criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportantDetails {
    pub application_deadline: Option<String>,
    pub contact_information: Option<String>,
    pub subsidy_amount: Option<String>,
}

impl ImportantDetails {
    pub fn is_empty(&self) -> bool {
        self.application_deadline.is_none()
            && self.contact_information.is_none()
            && self.subsidy_amount.is_none()
    }
}

// ── Profile ──────────────────────────────────────────────────────────────

/// Social category used by Indian welfare schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    General,
    Obc,
    Sc,
    St,
    Ews,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::General,
        Category::Obc,
        Category::Sc,
        Category::St,
        Category::Ews,
        Category::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::General => "General",
            Category::Obc => "OBC",
            Category::Sc => "SC",
            Category::St => "ST",
            Category::Ews => "EWS",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalise_name(s);
        let category = match key.as_str() {
            "general" | "gen" | "unreserved" | "ur" => Category::General,
            "obc" | "other backward class" | "other backward classes" => Category::Obc,
            "sc" | "scheduled caste" | "scheduled castes" => Category::Sc,
            "st" | "scheduled tribe" | "scheduled tribes" => Category::St,
            "ews" | "economically weaker section" | "economically weaker sections" => Category::Ews,
            "other" | "others" => Category::Other,
            "" => return Err("is required".to_string()),
            _ => return Err(format!("unknown category '{}'", s.trim())),
        };
        Ok(category)
    }
}

macro_rules! indian_states {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Indian states and union territories.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum IndianState {
            $($variant),+
        }

        impl IndianState {
            pub const ALL: &'static [IndianState] = &[$(IndianState::$variant),+];

            pub fn name(self) -> &'static str {
                match self {
                    $(IndianState::$variant => $name),+
                }
            }
        }
    };
}

indian_states! {
    AndhraPradesh => "Andhra Pradesh",
    ArunachalPradesh => "Arunachal Pradesh",
    Assam => "Assam",
    Bihar => "Bihar",
    Chhattisgarh => "Chhattisgarh",
    Goa => "Goa",
    Gujarat => "Gujarat",
    Haryana => "Haryana",
    HimachalPradesh => "Himachal Pradesh",
    Jharkhand => "Jharkhand",
    Karnataka => "Karnataka",
    Kerala => "Kerala",
    MadhyaPradesh => "Madhya Pradesh",
    Maharashtra => "Maharashtra",
    Manipur => "Manipur",
    Meghalaya => "Meghalaya",
    Mizoram => "Mizoram",
    Nagaland => "Nagaland",
    Odisha => "Odisha",
    Punjab => "Punjab",
    Rajasthan => "Rajasthan",
    Sikkim => "Sikkim",
    TamilNadu => "Tamil Nadu",
    Telangana => "Telangana",
    Tripura => "Tripura",
    UttarPradesh => "Uttar Pradesh",
    Uttarakhand => "Uttarakhand",
    WestBengal => "West Bengal",
    AndamanAndNicobarIslands => "Andaman and Nicobar Islands",
    Chandigarh => "Chandigarh",
    DadraAndNagarHaveliAndDamanAndDiu => "Dadra and Nagar Haveli and Daman and Diu",
    Delhi => "Delhi",
    JammuAndKashmir => "Jammu and Kashmir",
    Ladakh => "Ladakh",
    Lakshadweep => "Lakshadweep",
    Puducherry => "Puducherry",
}

impl IndianState {
    pub fn is_union_territory(self) -> bool {
        matches!(
            self,
            IndianState::AndamanAndNicobarIslands
                | IndianState::Chandigarh
                | IndianState::DadraAndNagarHaveliAndDamanAndDiu
                | IndianState::Delhi
                | IndianState::JammuAndKashmir
                | IndianState::Ladakh
                | IndianState::Lakshadweep
                | IndianState::Puducherry
        )
    }
}

impl fmt::Display for IndianState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IndianState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalise_name(s);
        if key.is_empty() {
            return Err("is required".to_string());
        }
        // Former names still printed on older scheme documents.
        let key = match key.as_str() {
            "orissa" => "odisha",
            "pondicherry" => "puducherry",
            "uttaranchal" => "uttarakhand",
            "new delhi" | "nct of delhi" => "delhi",
            "andaman and nicobar" => "andaman and nicobar islands",
            other => other,
        };
        IndianState::ALL
            .iter()
            .copied()
            .find(|state| normalise_name(state.name()) == key)
            .ok_or_else(|| format!("unknown state or union territory '{}'", s.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
    PreferNotToSay,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
            Gender::PreferNotToSay => "Prefer not to say",
        })
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise_name(s).as_str() {
            "male" | "m" | "man" => Ok(Gender::Male),
            "female" | "f" | "woman" => Ok(Gender::Female),
            "other" | "transgender" => Ok(Gender::Other),
            "prefer not to say" | "undisclosed" => Ok(Gender::PreferNotToSay),
            _ => Err(format!("unknown gender '{}'", s.trim())),
        }
    }
}

/// A validated applicant profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub age: u32,
    /// Annual household income in rupees.
    pub annual_income: u64,
    pub category: Category,
    pub state: IndianState,
    pub gender: Option<Gender>,
    pub occupation: Option<String>,
    pub education: Option<String>,
}

// ── Verdict ──────────────────────────────────────────────────────────────

/// Three-way eligibility classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Eligible,
    NotEligible,
    Uncertain,
}

impl Verdict {
    /// Label used in the model reply contract.
    pub fn label(self) -> &'static str {
        match self {
            Verdict::Eligible => "ELIGIBLE",
            Verdict::NotEligible => "NOT_ELIGIBLE",
            Verdict::Uncertain => "UNCERTAIN",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Eligible => "Eligible",
            Verdict::NotEligible => "Not eligible",
            Verdict::Uncertain => "Uncertain",
        })
    }
}

impl FromStr for Verdict {
    type Err = String;

    /// Accepts exactly the three contract labels. Case, surrounding
    /// whitespace, and space/hyphen in place of the underscore are tolerated.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();
        match key.as_str() {
            "ELIGIBLE" => Ok(Verdict::Eligible),
            "NOT_ELIGIBLE" => Ok(Verdict::NotEligible),
            "UNCERTAIN" => Ok(Verdict::Uncertain),
            _ => Err(format!(
                "unrecognised verdict label '{}' (expected ELIGIBLE, NOT_ELIGIBLE or UNCERTAIN)",
                s.trim()
            )),
        }
    }
}

/// The model's eligibility judgement for one profile.
///
/// `remediation_steps` is always empty for [`Verdict::Eligible`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityVerdict {
    pub verdict: Verdict,
    pub rationale: String,
    pub remediation_steps: Vec<String>,
    /// Documents this user has to gather, picked from the scheme's list
    /// according to the profile.
    #[serde(default)]
    pub required_documentation: Vec<String>,
    pub next_steps: Option<String>,
}

// ── Localization ─────────────────────────────────────────────────────────

macro_rules! languages {
    ($($variant:ident => ($code:literal, $name:literal, $native:literal)),+ $(,)?) => {
        /// Target languages for the rendered verdict.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum Language {
            $($variant),+
        }

        impl Language {
            pub const ALL: &'static [Language] = &[$(Language::$variant),+];

            /// ISO 639-1 code.
            pub fn code(self) -> &'static str {
                match self {
                    $(Language::$variant => $code),+
                }
            }

            /// English name, used inside prompts.
            pub fn name(self) -> &'static str {
                match self {
                    $(Language::$variant => $name),+
                }
            }

            /// Name in the language's own script.
            pub fn native_name(self) -> &'static str {
                match self {
                    $(Language::$variant => $native),+
                }
            }
        }
    };
}

languages! {
    English => ("en", "English", "English"),
    Hindi => ("hi", "Hindi", "हिन्दी"),
    Telugu => ("te", "Telugu", "తెలుగు"),
    Tamil => ("ta", "Tamil", "தமிழ்"),
    Kannada => ("kn", "Kannada", "ಕನ್ನಡ"),
    Malayalam => ("ml", "Malayalam", "മലയാളം"),
    Marathi => ("mr", "Marathi", "मराठी"),
    Bengali => ("bn", "Bengali", "বাংলা"),
    Gujarati => ("gu", "Gujarati", "ગુજરાતી"),
    Punjabi => ("pa", "Punjabi", "ਪੰਜਾਬੀ"),
    Odia => ("or", "Odia", "ଓଡ଼ିଆ"),
    Urdu => ("ur", "Urdu", "اردو"),
    Assamese => ("as", "Assamese", "অসমীয়া"),
}

impl Language {
    /// Languages rendered when the caller does not choose.
    pub const DEFAULT: [Language; 3] = [Language::English, Language::Hindi, Language::Telugu];
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    /// Accepts an ISO code (`te`) or an English name (`Telugu`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalise_name(s);
        Language::ALL
            .iter()
            .copied()
            .find(|l| l.code() == key || l.name().to_lowercase() == key)
            .ok_or_else(|| format!("unsupported language '{}'", s.trim()))
    }
}

/// Rendered summary and verdict text per language code.
///
/// Languages whose model call failed are listed in `failures` instead of
/// `entries`; both maps are keyed by ISO code so keys are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedResult {
    pub entries: BTreeMap<String, String>,
    pub failures: BTreeMap<String, TranslationError>,
}

impl LocalizedResult {
    pub fn get(&self, language: Language) -> Option<&str> {
        self.entries.get(language.code()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Some requested language is missing.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

// ── Run output ───────────────────────────────────────────────────────────

/// Timings and counters for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub page_count: usize,
    pub pages_with_text: usize,
    pub input_chars: usize,
    pub input_truncated: bool,
    pub model_requests: usize,
    pub languages_requested: usize,
    pub languages_failed: usize,
    pub extraction_duration_ms: u64,
    pub summary_duration_ms: u64,
    pub evaluation_duration_ms: u64,
    pub translation_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutput {
    pub summary: SchemeSummary,
    pub verdict: EligibilityVerdict,
    pub localized: LocalizedResult,
    pub stats: RunStats,
}

impl RunOutput {
    /// Done, but at least one language failed.
    pub fn is_partial(&self) -> bool {
        self.localized.is_partial()
    }
}

/// Lower-case, trim, collapse inner whitespace, and spell `&` as "and".
pub(crate) fn normalise_name(s: &str) -> String {
    s.replace('&', " and ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_lookup_is_forgiving() {
        assert_eq!("Telangana".parse::<IndianState>(), Ok(IndianState::Telangana));
        assert_eq!("  tamil   nadu ".parse::<IndianState>(), Ok(IndianState::TamilNadu));
        assert_eq!("Jammu & Kashmir".parse::<IndianState>(), Ok(IndianState::JammuAndKashmir));
        assert_eq!("Orissa".parse::<IndianState>(), Ok(IndianState::Odisha));
        assert!("Atlantis".parse::<IndianState>().is_err());
        assert!("".parse::<IndianState>().is_err());
    }

    #[test]
    fn states_and_union_territories_are_complete() {
        assert_eq!(IndianState::ALL.len(), 36);
        let uts = IndianState::ALL
            .iter()
            .filter(|s| s.is_union_territory())
            .count();
        assert_eq!(uts, 8);
    }

    #[test]
    fn category_short_forms() {
        assert_eq!("general".parse::<Category>(), Ok(Category::General));
        assert_eq!("SC".parse::<Category>(), Ok(Category::Sc));
        assert_eq!("Other Backward Classes".parse::<Category>(), Ok(Category::Obc));
        assert!("royalty".parse::<Category>().is_err());
    }

    #[test]
    fn verdict_labels_are_strict() {
        assert_eq!("ELIGIBLE".parse::<Verdict>(), Ok(Verdict::Eligible));
        assert_eq!("not eligible".parse::<Verdict>(), Ok(Verdict::NotEligible));
        assert_eq!("Not-Eligible".parse::<Verdict>(), Ok(Verdict::NotEligible));
        assert_eq!(" uncertain ".parse::<Verdict>(), Ok(Verdict::Uncertain));
        assert!("PARTIALLY ELIGIBLE".parse::<Verdict>().is_err());
        assert!("yes".parse::<Verdict>().is_err());
        assert!("".parse::<Verdict>().is_err());
    }

    #[test]
    fn language_by_code_or_name() {
        assert_eq!("te".parse::<Language>(), Ok(Language::Telugu));
        assert_eq!("Hindi".parse::<Language>(), Ok(Language::Hindi));
        assert_eq!(Language::Odia.code(), "or");
        assert!("klingon".parse::<Language>().is_err());
    }

    #[test]
    fn raw_document_debug_hides_bytes() {
        let doc = RawDocument::pdf(vec![0u8; 2048]).with_name("scheme.pdf");
        let dbg = format!("{doc:?}");
        assert!(dbg.contains("<2048 bytes>"));
        assert_eq!(doc.display_name(), "scheme.pdf");
    }
}
