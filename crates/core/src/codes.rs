//! Stable wire codes attached to every API response.
//!
//! Error responses carry `(status, code, error_type, error_description)` and
//! success responses carry `(status, code, message)`. These string values are
//! a compatibility surface for API consumers and must never change, including
//! the mixed `EC-`/`EC_` prefixes, the duplicated numbers shared by related
//! codes, and the spelling of the descriptions.

/// Wire metadata for an error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorInfo {
    pub status: u16,
    pub code: &'static str,
    pub error_type: &'static str,
    pub description: &'static str,
}

/// Wire metadata for a success response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageInfo {
    pub status: u16,
    pub code: &'static str,
    pub message: &'static str,
}

macro_rules! define_error_codes {
    (
        $(
            $(#[$vmeta:meta])*
            $variant:ident => ($status:expr, $code:expr, $error_type:expr, $description:expr)
        ),+ $(,)?
    ) => {
        /// Business error codes returned in the error envelope.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ErrorCode {
            $( $(#[$vmeta])* $variant ),+
        }

        impl ErrorCode {
            /// Every defined code, for registry-wide assertions.
            pub const ALL: &'static [ErrorCode] = &[ $( ErrorCode::$variant ),+ ];

            /// Return the wire metadata for this code.
            pub const fn info(self) -> ErrorInfo {
                match self {
                    $(
                        ErrorCode::$variant => ErrorInfo {
                            status: $status,
                            code: $code,
                            error_type: $error_type,
                            description: $description,
                        }
                    ),+
                }
            }
        }
    };
}

macro_rules! define_message_codes {
    (
        $(
            $(#[$vmeta:meta])*
            $variant:ident => ($status:expr, $code:expr, $message:expr)
        ),+ $(,)?
    ) => {
        /// Success codes returned in the success envelope.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum MessageCode {
            $( $(#[$vmeta])* $variant ),+
        }

        impl MessageCode {
            /// Every defined code, for registry-wide assertions.
            pub const ALL: &'static [MessageCode] = &[ $( MessageCode::$variant ),+ ];

            /// Return the wire metadata for this code.
            pub const fn info(self) -> MessageInfo {
                match self {
                    $(
                        MessageCode::$variant => MessageInfo {
                            status: $status,
                            code: $code,
                            message: $message,
                        }
                    ),+
                }
            }
        }
    };
}

define_error_codes! {
    BadRequest => (
        400,
        "EC-400",
        "Bad Request",
        "Malformed request syntax or invalid request message framing."
    ),
    UserNotFound => (404, "EC-114", "Bad Request", "User not found"),
    EmailExists => (
        409,
        "EC-101",
        "Bad Request",
        "This email has already been used. Please try with a different email address."
    ),
    EmailSendFailed => (
        500,
        "EC-500",
        "Email Server Error",
        "Your email was unable to send because the connection to mail server was interrupted. Please check your inbox for mail delivery failure notice."
    ),
    ApplicationError => (
        500,
        "EC-500",
        "Internal Server Error",
        "Sorry, an error has occurred and your request could not be processed. Please try again later."
    ),
    SitePermissionAccessDenied => (
        403,
        "EC-105",
        "403 FORBIDDEN",
        "Does not have permission to maintain site"
    ),
    SiteExists => (
        400,
        "EC-106",
        "Bad Request",
        "Site exists with the given locationId and studyId"
    ),
    LocationAccessDenied => (
        403,
        "EC-882",
        "Forbidden",
        "You do not have permission to view or add or update locations"
    ),
    LocationUpdateDenied => (
        403,
        "EC-882",
        "Forbidden",
        "You do not have permission to update the location"
    ),
    NotSuperAdminAccess => (
        403,
        "EC-882",
        "Forbidden",
        "You do not have permission of Super Admin"
    ),
    InvalidArguments => (400, "EC_813", "Bad Request", "Provided argument value is invalid"),
    MissingRequiredArguments => (400, "EC_812", "Bad Request", "Missing required argument"),
    UserNotExists => (401, "EC_861", "Unauthorized", "User does not exist"),
    UserNotActive => (400, "EC_93", "Bad Request", "User not Active"),
    CustomIdExists => (400, "EC_883", "Bad Request", "customId already exists"),
    LocationNameExists => (400, "EC_884", "Bad Request", "Location name already exists"),
    AppNotFound => (404, "EC-817", "Bad Request", "App not found."),
    StudyNotFound => (404, "EC-816", "Bad Request", "Study not found"),
    LocationNotFound => (404, "EC_881", "Not Found", "No Locations Found"),
    DefaultSiteModifyDenied => (400, "EC_888", "Bad Request", "Default site can't be modified"),
    AlreadyDecommissioned => (
        400,
        "EC_886",
        "Bad Request",
        "Can't decommision an already decommissioned location"
    ),
    CannotDecommission => (
        400,
        "EC_885",
        "Bad Request",
        "This Location is being used as an active Site in one or more studies and cannot be decomissioned"
    ),
    CannotReactivate => (400, "EC_887", "Bad Request", "Can't reactive an already active location"),
    SiteNotFound => (404, "EC-94", "Bad Request", "Site not found"),
    // The leading space in the description is load-bearing for wire
    // compatibility.
    CannotDecommissionSiteForOpenStudy => (
        400,
        "EC-95",
        "Bad Request",
        " Cannot decomission site as studyType is open"
    ),
    CannotDecommissionSiteForEnrolledActiveStatus => (
        400,
        "EC_896",
        "Bad Request",
        "Site cannot be decomissioned as one or more participants are in enrolled or active status"
    ),
    CannotAddSiteForOpenStudy => (400, "EC_893", "Bad Request", "Site cannot be added to open studies"),
    CannotAddSiteForDecommissionedLocation => (
        400,
        "EC_894",
        "Bad Request",
        "Site cannot be added using this location ID (location is decommissioned)"
    ),
    CannotActivateSiteForDecommissionedLocation => (
        400,
        "EC_895",
        "Bad Request",
        "Site cannot be activated (location is decommissioned)"
    ),
    ManageSitePermissionAccessDenied => (
        403,
        "EC-105",
        "403 FORBIDDEN",
        "You do not have permission to manage site"
    ),
    StudyPermissionAccessDenied => (
        403,
        "EC-105",
        "403 FORBIDDEN",
        "Does not have study permission"
    ),
    OpenStudy => (403, "EC-989", "403 FORBIDDEN", "Can not add participant to open study"),
    EnrolledParticipant => (400, "EC-862", "Bad Request", "Participant already enrolled"),
    SiteNotExistOrInactive => (400, "EC-869", "Bad Request", "Site doesn't exists or is inactive"),
    ParticipantRegistrySiteNotFound => (404, "EC_899", "Not Found", "Participant not found"),
    DocumentNotInPrescribedFormat => (
        400,
        "EC_914",
        "Bad Request",
        "Uploaded document is not in the prescribed format"
    ),
    FailedToImportParticipants => (400, "EC_915", "Bad Request", "Failed to import participants"),
    CannotUpdateEnrollmentTargetForCloseStudy => (
        400,
        "EC_897",
        "Bad Request",
        "Enrollment target update is applicable only for open studies"
    ),
    CannotUpdateEnrollmentTargetForDecommissionedSite => (
        400,
        "EC_898",
        "Bad Request",
        "Can't update enrollment target for a decomissioned site"
    ),
    PermissionMissing => (
        400,
        "EC_891",
        "Bad Request",
        "At least one permission must be assigned"
    ),
    InvalidOnboardingStatus => (400, "EC_892", "Bad Request", "Invalid onboarding status"),
}

define_message_codes! {
    AddSiteSuccess => (201, "MSG-0001", "Site added successfully"),
    AddLocationSuccess => (201, "MSG-0002", "New location added successfully"),
    DecommissionSuccess => (200, "MSG-0003", "Decommission successfully"),
    ReactivateSuccess => (200, "MSG-0004", "Reactivate successfully"),
    LocationUpdateSuccess => (200, "MSG-0004", "Location updated successfully"),
    GetLocationSuccess => (200, "MSG-0005", "Get locations successfull"),
    GetParticipantRegistrySuccess => (200, "MSG-0005", "Get participant registry successfull"),
    GetLocationForSiteSuccess => (200, "MSG-0006", "Get locations for site successfull"),
    DecommissionSiteSuccess => (200, "MSG-0007", "Site decommissioned successfully"),
    RecommissionSiteSuccess => (200, "MSG-0008", "Site activated successfully"),
    AddParticipantSuccess => (201, "MSG-0009", "Participant added successfully"),
    ParticipantsInvitedSuccess => (200, "MSG-0010", "Participants invited successfully"),
    ImportParticipantSuccess => (200, "MSG-0011", "Participants imported successfully"),
    UpdateStatusSuccess => (200, "MSG-0012", "Onboarding status updated successfully"),
    GetSitesSuccess => (200, "MSG-0013", "Get sites successfull"),
    GetParticipantDetailsSuccess => (200, "MSG-0014", "Get participant details successfull"),
    TargetEnrollmentUpdateSuccess => (200, "MSG-0015", "Target enrollment updated successfully"),
    AddNewUserSuccess => (201, "MSG-0016", "New user added successfully"),
    UpdateUserSuccess => (200, "MSG-0017", "User updated successfully"),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    /// Numbers shared across several error codes for historical reasons.
    const SHARED_ERROR_NUMBERS: &[&str] = &["EC-105", "EC-500", "EC-882"];

    /// Numbers shared across several success codes for historical reasons.
    const SHARED_MESSAGE_NUMBERS: &[&str] = &["MSG-0004", "MSG-0005"];

    #[test]
    fn error_codes_are_unique_outside_known_shared_numbers() {
        let mut by_code: HashMap<&str, Vec<ErrorCode>> = HashMap::new();
        for ec in ErrorCode::ALL {
            by_code.entry(ec.info().code).or_default().push(*ec);
        }
        for (code, variants) in by_code {
            if SHARED_ERROR_NUMBERS.contains(&code) {
                assert!(variants.len() > 1, "{code} listed as shared but used once");
            } else {
                assert_eq!(variants.len(), 1, "{code} reused by {variants:?}");
            }
        }
    }

    #[test]
    fn message_codes_are_unique_outside_known_shared_numbers() {
        let mut by_code: HashMap<&str, Vec<MessageCode>> = HashMap::new();
        for mc in MessageCode::ALL {
            by_code.entry(mc.info().code).or_default().push(*mc);
        }
        for (code, variants) in by_code {
            if SHARED_MESSAGE_NUMBERS.contains(&code) {
                assert!(variants.len() > 1, "{code} listed as shared but used once");
            } else {
                assert_eq!(variants.len(), 1, "{code} reused by {variants:?}");
            }
        }
    }

    #[test]
    fn error_statuses_are_valid_http_codes() {
        for ec in ErrorCode::ALL {
            let status = ec.info().status;
            assert!((400..600).contains(&status), "{ec:?} has status {status}");
        }
    }

    #[test]
    fn open_study_decommission_description_keeps_leading_space() {
        let info = ErrorCode::CannotDecommissionSiteForOpenStudy.info();
        assert!(info.description.starts_with(' '));
    }

    #[test]
    fn forbidden_codes_use_403_status() {
        for ec in [
            ErrorCode::SitePermissionAccessDenied,
            ErrorCode::ManageSitePermissionAccessDenied,
            ErrorCode::StudyPermissionAccessDenied,
            ErrorCode::LocationAccessDenied,
            ErrorCode::NotSuperAdminAccess,
            ErrorCode::OpenStudy,
        ] {
            assert_eq!(ec.info().status, 403);
        }
    }

    #[test]
    fn created_messages_use_201_status() {
        for mc in [
            MessageCode::AddSiteSuccess,
            MessageCode::AddLocationSuccess,
            MessageCode::AddParticipantSuccess,
            MessageCode::AddNewUserSuccess,
        ] {
            assert_eq!(mc.info().status, 201);
        }
    }
}
