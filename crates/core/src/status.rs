//! Lifecycle status enums mapping to SMALLINT columns, and the study type.
//!
//! Each enum variant's discriminant matches the value stored in the
//! corresponding column; the numbers are part of the persisted data and must
//! not be renumbered.

/// Status type matching SMALLINT in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Look up a status by its database ID.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some($name::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Site lifecycle status.
    SiteStatus {
        Deactive = 0,
        Active = 1,
    }
}

define_status_enum! {
    /// Location lifecycle status.
    LocationStatus {
        Inactive = 0,
        Active = 1,
    }
}

define_status_enum! {
    /// Admin user account status.
    AdminStatus {
        Deactivated = 0,
        Active = 1,
        Invited = 2,
    }
}

/// Whether a study enrolls participants openly or through invitation.
///
/// Stored as text; the canonical persisted values are `OPEN` and `CLOSE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudyType {
    Open,
    Close,
}

impl StudyType {
    /// Return the canonical persisted value.
    pub fn as_str(self) -> &'static str {
        match self {
            StudyType::Open => "OPEN",
            StudyType::Close => "CLOSE",
        }
    }

    /// Parse a stored study type, ignoring case.
    pub fn parse(value: &str) -> Option<StudyType> {
        if value.eq_ignore_ascii_case("OPEN") {
            Some(StudyType::Open)
        } else if value.eq_ignore_ascii_case("CLOSE") {
            Some(StudyType::Close)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_status_ids_match_stored_values() {
        assert_eq!(SiteStatus::Deactive.id(), 0);
        assert_eq!(SiteStatus::Active.id(), 1);
        assert_eq!(SiteStatus::from_id(1), Some(SiteStatus::Active));
        assert_eq!(SiteStatus::from_id(9), None);
    }

    #[test]
    fn location_status_ids_match_stored_values() {
        assert_eq!(LocationStatus::Inactive.id(), 0);
        assert_eq!(LocationStatus::Active.id(), 1);
        assert_eq!(LocationStatus::from_id(0), Some(LocationStatus::Inactive));
    }

    #[test]
    fn admin_status_ids_match_stored_values() {
        assert_eq!(AdminStatus::Deactivated.id(), 0);
        assert_eq!(AdminStatus::Active.id(), 1);
        assert_eq!(AdminStatus::Invited.id(), 2);
        assert_eq!(AdminStatus::from_id(2), Some(AdminStatus::Invited));
    }

    #[test]
    fn study_type_parses_ignoring_case() {
        assert_eq!(StudyType::parse("OPEN"), Some(StudyType::Open));
        assert_eq!(StudyType::parse("open"), Some(StudyType::Open));
        assert_eq!(StudyType::parse("Close"), Some(StudyType::Close));
        assert_eq!(StudyType::parse("hybrid"), None);
    }

    #[test]
    fn study_type_round_trips_through_canonical_value() {
        for ty in [StudyType::Open, StudyType::Close] {
            assert_eq!(StudyType::parse(ty.as_str()), Some(ty));
        }
    }
}
