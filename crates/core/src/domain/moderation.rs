use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationFlag {
    HateSpeech,
    Violence,
    SexualContent,
    Harassment,
    OffTopic,
}

impl ModerationFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HateSpeech => "hate_speech",
            Self::Violence => "violence",
            Self::SexualContent => "sexual_content",
            Self::Harassment => "harassment",
            Self::OffTopic => "off_topic",
        }
    }
}

impl fmt::Display for ModerationFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration order is the escalation order: `None < Low < Medium < High`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationSeverity {
    #[default]
    None,
    Low,
    Medium,
    High,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ContentModerationResult {
    pub is_appropriate: bool,
    pub severity: ModerationSeverity,
    pub flags: Vec<ModerationFlag>,
    pub suggested_response: String,
}

impl ContentModerationResult {
    pub fn appropriate() -> Self {
        Self {
            is_appropriate: true,
            severity: ModerationSeverity::None,
            flags: Vec::new(),
            suggested_response: String::new(),
        }
    }

    pub fn flagged(
        flag: ModerationFlag,
        severity: ModerationSeverity,
        suggested_response: impl Into<String>,
    ) -> Self {
        Self {
            is_appropriate: false,
            severity,
            flags: vec![flag],
            suggested_response: suggested_response.into(),
        }
    }

    pub fn suggested_response(&self) -> Option<&str> {
        Some(self.suggested_response.as_str()).filter(|text| !text.trim().is_empty())
    }

    pub fn flags_label(&self) -> String {
        self.flags.iter().map(ModerationFlag::as_str).collect::<Vec<_>>().join(", ")
    }
}

impl Default for ContentModerationResult {
    fn default() -> Self {
        Self::appropriate()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitmentKind {
    Guarantee,
    Promise,
    Discount,
    SpecialPricing,
    FinancingTerms,
    ExtendedWarranty,
    PriceModification,
    CreditApproval,
}

impl CommitmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guarantee => "unauthorized guarantee",
            Self::Promise => "unauthorized promise",
            Self::Discount => "unauthorized discount promise",
            Self::SpecialPricing => "unauthorized special pricing",
            Self::FinancingTerms => "unauthorized financing terms",
            Self::ExtendedWarranty => "unauthorized extended warranty",
            Self::PriceModification => "unauthorized price modification",
            Self::CreditApproval => "unauthorized credit approval",
        }
    }
}

/// A single finding raised while scanning a generated reply.
///
/// The `Display` form is the human-readable violation code reported to
/// callers and written to logs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ResponseViolation {
    EmptyResponse,
    TooLong { max_chars: usize },
    TooShort { min_chars: usize },
    CreditCardDetected,
    NationalIdDetected,
    UnauthorizedPhoneDetected,
    UnauthorizedEmailDetected,
    UnauthorizedCommitment { kind: CommitmentKind },
    InventedSpecification,
    InappropriateContent { flags: Vec<ModerationFlag> },
}

impl ResponseViolation {
    /// Sensitive data that was masked in the cleaned content.
    pub fn is_pii(&self) -> bool {
        matches!(
            self,
            Self::CreditCardDetected
                | Self::NationalIdDetected
                | Self::UnauthorizedPhoneDetected
                | Self::UnauthorizedEmailDetected
        )
    }

    pub fn requires_escalation(&self) -> bool {
        matches!(self, Self::UnauthorizedCommitment { .. })
    }
}

impl fmt::Display for ResponseViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyResponse => f.write_str("empty response"),
            Self::TooLong { max_chars } => write!(f, "response too long (>{max_chars} chars)"),
            Self::TooShort { min_chars } => write!(f, "response too short (<{min_chars} chars)"),
            Self::CreditCardDetected => f.write_str("credit card number detected"),
            Self::NationalIdDetected => f.write_str("national id detected"),
            Self::UnauthorizedPhoneDetected => f.write_str("unauthorized phone number detected"),
            Self::UnauthorizedEmailDetected => f.write_str("unauthorized email detected"),
            Self::UnauthorizedCommitment { kind } => f.write_str(kind.as_str()),
            Self::InventedSpecification => f.write_str("potentially invented vehicle information"),
            Self::InappropriateContent { flags } => {
                let labels = flags.iter().map(ModerationFlag::as_str).collect::<Vec<_>>();
                write!(f, "inappropriate content in response: {}", labels.join(", "))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GuardrailsValidationResult {
    pub is_valid: bool,
    pub violations: Vec<ResponseViolation>,
    pub cleaned_content: String,
    pub requires_human_escalation: bool,
}

impl GuardrailsValidationResult {
    pub fn empty_response() -> Self {
        Self {
            is_valid: false,
            violations: vec![ResponseViolation::EmptyResponse],
            cleaned_content: String::new(),
            requires_human_escalation: false,
        }
    }

    pub fn has_pii(&self) -> bool {
        self.violations.iter().any(ResponseViolation::is_pii)
    }

    pub fn violation_codes(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }
}
