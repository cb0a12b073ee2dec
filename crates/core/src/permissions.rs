//! Permission levels and the pure set math behind site-permission
//! maintenance.
//!
//! Permission rows live in the database; everything here operates on plain
//! values so the rules can be unit tested without a pool.

use crate::types::DbId;

/// Permission level stored in `app_permissions.edit`,
/// `study_permissions.edit` and `site_permissions.can_edit`.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    NoPermission = 0,
    ReadView = 1,
    ReadEdit = 2,
}

impl Permission {
    /// Return the database value.
    pub fn id(self) -> i16 {
        self as i16
    }

    /// Look up a permission by its database value.
    pub fn from_id(id: i16) -> Option<Permission> {
        match id {
            0 => Some(Permission::NoPermission),
            1 => Some(Permission::ReadView),
            2 => Some(Permission::ReadEdit),
            _ => None,
        }
    }
}

impl From<Permission> for i16 {
    fn from(value: Permission) -> Self {
        value as i16
    }
}

/// Tunable edges of the permission rules.
#[derive(Debug, Clone, Copy)]
pub struct PermissionPolicy {
    /// What `edit_permission_allowed` answers when the admin has no study
    /// permission row, or has one but no matching app permission row.
    /// Defaults to `true`, which preserves the long-standing behavior of
    /// treating an absent row as an implicit grant.
    pub missing_permission_defaults_to_allowed: bool,
}

impl Default for PermissionPolicy {
    fn default() -> Self {
        Self {
            missing_permission_defaults_to_allowed: true,
        }
    }
}

/// Decide whether an admin may maintain sites of a study.
///
/// When the admin holds both a study permission and an app permission, the
/// answer is whether either grants edit. When either row is missing the
/// policy decides; see [`PermissionPolicy`].
pub fn edit_permission_allowed(
    study_edit: Option<Permission>,
    app_edit: Option<Permission>,
    policy: PermissionPolicy,
) -> bool {
    match (study_edit, app_edit) {
        (Some(study), Some(app)) => {
            study == Permission::ReadEdit || app == Permission::ReadEdit
        }
        _ => policy.missing_permission_defaults_to_allowed,
    }
}

/// An admin holding a study permission, used to seed site permissions when a
/// site is created under that study.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionHolder {
    pub admin_user_id: DbId,
    pub edit: Permission,
}

/// Site-permission row to create for a new site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SitePermissionSeed {
    pub admin_user_id: DbId,
    pub can_edit: Permission,
}

/// Compute the site-permission rows for a newly added site.
///
/// Every admin holding a study permission receives a site permission with
/// the same level; the creating admin is raised to [`Permission::ReadEdit`].
/// An admin without a study permission row (including the creator) receives
/// nothing.
pub fn seed_site_permissions(
    study_holders: &[PermissionHolder],
    created_by: DbId,
) -> Vec<SitePermissionSeed> {
    study_holders
        .iter()
        .map(|holder| SitePermissionSeed {
            admin_user_id: holder.admin_user_id,
            can_edit: if holder.admin_user_id == created_by {
                Permission::ReadEdit
            } else {
                holder.edit
            },
        })
        .collect()
}

/// How each site-permission holder is handled when the site is
/// decommissioned.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DowngradePlan {
    /// Holders who also hold a study permission: their site permission is
    /// reduced to [`Permission::ReadView`].
    pub downgrade_to_view: Vec<DbId>,
    /// Holders without a study permission: their site permission row is
    /// removed.
    pub revoke: Vec<DbId>,
}

/// Partition the site-permission holders of a decommissioned site.
///
/// Input order is preserved within each partition.
pub fn plan_decommission_downgrade(
    site_admins: &[DbId],
    study_admins: &[DbId],
) -> DowngradePlan {
    let study_set: std::collections::HashSet<DbId> = study_admins.iter().copied().collect();
    let mut plan = DowngradePlan::default();
    for admin in site_admins {
        if study_set.contains(admin) {
            plan.downgrade_to_view.push(*admin);
        } else {
            plan.revoke.push(*admin);
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_policy() -> PermissionPolicy {
        PermissionPolicy::default()
    }

    fn strict_policy() -> PermissionPolicy {
        PermissionPolicy {
            missing_permission_defaults_to_allowed: false,
        }
    }

    #[test]
    fn permission_ids_round_trip() {
        for perm in [
            Permission::NoPermission,
            Permission::ReadView,
            Permission::ReadEdit,
        ] {
            assert_eq!(Permission::from_id(perm.id()), Some(perm));
        }
        assert_eq!(Permission::from_id(3), None);
        assert_eq!(Permission::from_id(-1), None);
    }

    #[test]
    fn edit_allowed_when_either_row_grants_edit() {
        let policy = default_policy();
        assert!(edit_permission_allowed(
            Some(Permission::ReadEdit),
            Some(Permission::ReadView),
            policy,
        ));
        assert!(edit_permission_allowed(
            Some(Permission::ReadView),
            Some(Permission::ReadEdit),
            policy,
        ));
        assert!(edit_permission_allowed(
            Some(Permission::ReadEdit),
            Some(Permission::ReadEdit),
            policy,
        ));
    }

    #[test]
    fn edit_denied_when_both_rows_are_view_only() {
        let policy = default_policy();
        assert!(!edit_permission_allowed(
            Some(Permission::ReadView),
            Some(Permission::ReadView),
            policy,
        ));
        assert!(!edit_permission_allowed(
            Some(Permission::NoPermission),
            Some(Permission::NoPermission),
            policy,
        ));
    }

    #[test]
    fn missing_rows_follow_the_policy() {
        assert!(edit_permission_allowed(None, None, default_policy()));
        assert!(edit_permission_allowed(
            Some(Permission::ReadView),
            None,
            default_policy(),
        ));
        assert!(edit_permission_allowed(
            None,
            Some(Permission::NoPermission),
            default_policy(),
        ));

        assert!(!edit_permission_allowed(None, None, strict_policy()));
        assert!(!edit_permission_allowed(
            Some(Permission::ReadView),
            None,
            strict_policy(),
        ));
        // Both rows present is unaffected by the policy.
        assert!(edit_permission_allowed(
            Some(Permission::ReadEdit),
            Some(Permission::ReadView),
            strict_policy(),
        ));
    }

    #[test]
    fn seeding_copies_study_levels_and_raises_the_creator() {
        let holders = [
            PermissionHolder {
                admin_user_id: 1,
                edit: Permission::ReadView,
            },
            PermissionHolder {
                admin_user_id: 2,
                edit: Permission::ReadView,
            },
            PermissionHolder {
                admin_user_id: 3,
                edit: Permission::ReadEdit,
            },
        ];
        let seeds = seed_site_permissions(&holders, 2);
        assert_eq!(
            seeds,
            vec![
                SitePermissionSeed {
                    admin_user_id: 1,
                    can_edit: Permission::ReadView,
                },
                SitePermissionSeed {
                    admin_user_id: 2,
                    can_edit: Permission::ReadEdit,
                },
                SitePermissionSeed {
                    admin_user_id: 3,
                    can_edit: Permission::ReadEdit,
                },
            ]
        );
    }

    #[test]
    fn creator_without_a_study_permission_gets_no_seed() {
        let holders = [PermissionHolder {
            admin_user_id: 1,
            edit: Permission::ReadView,
        }];
        let seeds = seed_site_permissions(&holders, 99);
        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds[0].admin_user_id, 1);
        assert_eq!(seeds[0].can_edit, Permission::ReadView);
    }

    #[test]
    fn downgrade_plan_partitions_by_study_membership() {
        let plan = plan_decommission_downgrade(&[1, 2, 3, 4], &[2, 4, 7]);
        assert_eq!(plan.downgrade_to_view, vec![2, 4]);
        assert_eq!(plan.revoke, vec![1, 3]);
    }

    #[test]
    fn downgrade_plan_with_no_site_holders_is_empty() {
        let plan = plan_decommission_downgrade(&[], &[1, 2]);
        assert!(plan.downgrade_to_view.is_empty());
        assert!(plan.revoke.is_empty());
    }
}
