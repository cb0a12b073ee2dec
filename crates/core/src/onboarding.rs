//! Participant onboarding statuses and the registry filter built on them.
//!
//! Statuses are persisted as single-letter codes. The letter `A` is not a
//! status: it is the query alias that selects every status, and it can never
//! be written to a participant row.

use serde::Serialize;

/// Onboarding status of a participant registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OnboardingStatus {
    New,
    Invited,
    Enrolled,
    Disabled,
}

/// The query alias selecting every onboarding status.
pub const STATUS_ALL_CODE: &str = "A";

impl OnboardingStatus {
    /// All statuses, in registry display order.
    pub const ALL: &'static [OnboardingStatus] = &[
        OnboardingStatus::New,
        OnboardingStatus::Invited,
        OnboardingStatus::Enrolled,
        OnboardingStatus::Disabled,
    ];

    /// Return the single-letter code persisted in the database.
    pub fn code(self) -> &'static str {
        match self {
            OnboardingStatus::New => "N",
            OnboardingStatus::Invited => "I",
            OnboardingStatus::Enrolled => "E",
            OnboardingStatus::Disabled => "D",
        }
    }

    /// Return the display label shown in registry responses.
    pub fn label(self) -> &'static str {
        match self {
            OnboardingStatus::New => "New",
            OnboardingStatus::Invited => "Invited",
            OnboardingStatus::Enrolled => "Enrolled",
            OnboardingStatus::Disabled => "Disabled",
        }
    }

    /// Look up a status by its persisted code. The alias `A` is not a
    /// status and does not parse.
    pub fn from_code(code: &str) -> Option<OnboardingStatus> {
        match code {
            "N" => Some(OnboardingStatus::New),
            "I" => Some(OnboardingStatus::Invited),
            "E" => Some(OnboardingStatus::Enrolled),
            "D" => Some(OnboardingStatus::Disabled),
            _ => None,
        }
    }
}

/// Registry filter parsed from the `onboardingStatus` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingFilter {
    /// Select every status.
    All,
    /// Select a single status.
    Only(OnboardingStatus),
}

impl OnboardingFilter {
    /// Parse the `onboardingStatus` query parameter.
    ///
    /// Absent, empty, or the literal `A` select everything. Any other value
    /// must be a valid status code; `None` is returned otherwise.
    pub fn parse(param: Option<&str>) -> Option<OnboardingFilter> {
        match param {
            None => Some(OnboardingFilter::All),
            Some(value) if value.is_empty() || value == STATUS_ALL_CODE => {
                Some(OnboardingFilter::All)
            }
            Some(value) => OnboardingStatus::from_code(value).map(OnboardingFilter::Only),
        }
    }
}

/// Participant counts per onboarding status, plus the total under the `A`
/// alias. Serializes with every status present even when its count is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct OnboardingCounts {
    #[serde(rename = "N")]
    pub new: i64,
    #[serde(rename = "I")]
    pub invited: i64,
    #[serde(rename = "E")]
    pub enrolled: i64,
    #[serde(rename = "D")]
    pub disabled: i64,
    #[serde(rename = "A")]
    pub total: i64,
}

/// Count participants per onboarding status.
pub fn count_by_status<I>(statuses: I) -> OnboardingCounts
where
    I: IntoIterator<Item = OnboardingStatus>,
{
    let mut counts = OnboardingCounts::default();
    for status in statuses {
        match status {
            OnboardingStatus::New => counts.new += 1,
            OnboardingStatus::Invited => counts.invited += 1,
            OnboardingStatus::Enrolled => counts.enrolled += 1,
            OnboardingStatus::Disabled => counts.disabled += 1,
        }
        counts.total += 1;
    }
    counts
}
