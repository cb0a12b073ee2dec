//! Enrollment statuses and the site enrollment percentage.

use crate::status::StudyType;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Percentage reported for an open study whose enrollment has reached or
/// passed the invited count.
pub const DEFAULT_PERCENTAGE: f64 = 100.0;

/// Display status for a participant with no enrollment record.
pub const YET_TO_ENROLL: &str = "yetToEnroll";

/// Placeholder shown for dates a participant does not have yet.
pub const NOT_APPLICABLE: &str = "-";

// ---------------------------------------------------------------------------
// Enrollment status
// ---------------------------------------------------------------------------

/// Enrollment status of a participant at a site, persisted as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentStatus {
    YetToJoin,
    Enrolled,
    Active,
    Withdrawn,
}

impl EnrollmentStatus {
    /// Return the persisted value.
    pub fn as_str(self) -> &'static str {
        match self {
            EnrollmentStatus::YetToJoin => "yetToJoin",
            EnrollmentStatus::Enrolled => "enrolled",
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Withdrawn => "withdrawn",
        }
    }

    /// Look up a status by its persisted value.
    pub fn parse(value: &str) -> Option<EnrollmentStatus> {
        match value {
            "yetToJoin" => Some(EnrollmentStatus::YetToJoin),
            "enrolled" => Some(EnrollmentStatus::Enrolled),
            "active" => Some(EnrollmentStatus::Active),
            "withdrawn" => Some(EnrollmentStatus::Withdrawn),
            _ => None,
        }
    }

    /// Whether a site with a participant in this status may not be
    /// decommissioned.
    pub fn blocks_decommission(self) -> bool {
        matches!(self, EnrollmentStatus::Enrolled | EnrollmentStatus::Active)
    }
}

// ---------------------------------------------------------------------------
// Enrollment percentage
// ---------------------------------------------------------------------------

/// Compute the enrollment percentage shown per site in the sites overview.
///
/// For an open study the invited figure is the enrollment target (absent
/// target counts as zero); for a close study it is the number of invitations
/// sent. Returns `None` when no percentage applies, which the response
/// renders by omitting the field.
pub fn enrollment_percentage(
    study_type: StudyType,
    target_enrollment: Option<i64>,
    invited_count: i64,
    enrolled_count: i64,
) -> Option<f64> {
    let invited = match study_type {
        StudyType::Open => target_enrollment.unwrap_or(0),
        StudyType::Close => invited_count,
    };
    if invited != 0 && invited >= enrolled_count {
        Some(enrolled_count as f64 * 100.0 / invited as f64)
    } else if invited != 0 && enrolled_count >= invited && study_type == StudyType::Open {
        Some(DEFAULT_PERCENTAGE)
    } else {
        None
    }
}
