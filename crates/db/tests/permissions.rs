//! Integration tests for the permission tables.
//!
//! Covers seeding site permissions when a site is added, the downgrade and
//! revoke bookkeeping when one is decommissioned, and the batch grant
//! writes used by admin-account maintenance.

use sqlx::PgPool;
use studygate_core::permissions::{
    plan_decommission_downgrade, seed_site_permissions, Permission, PermissionHolder,
};
use studygate_db::models::app::NewApp;
use studygate_db::models::location::NewLocation;
use studygate_db::models::permission::{
    AppPermissionEntry, SitePermissionEntry, StudyPermissionEntry,
};
use studygate_db::models::site::NewSite;
use studygate_db::models::study::NewStudy;
use studygate_db::repositories::{AppRepo, LocationRepo, PermissionRepo, SiteRepo, StudyRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_admin(pool: &PgPool, email: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO admin_users (email, first_name, last_name, location_permission, super_admin, status)
         VALUES ($1, 'Seed', 'Admin', 2, FALSE, 1)
         RETURNING id",
    )
    .bind(email)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// App, study and site to hang permissions off.
async fn seed_study_site(pool: &PgPool, created_by: i64) -> (i64, i64, i64) {
    let app = AppRepo::create(
        pool,
        &NewApp {
            custom_app_id: "app-01".to_string(),
            name: "app-01 App".to_string(),
        },
    )
    .await
    .unwrap();
    let study = StudyRepo::create(
        pool,
        &NewStudy {
            app_id: app.id,
            custom_study_id: "alpha".to_string(),
            name: "alpha Study".to_string(),
            study_type: "CLOSE".to_string(),
        },
    )
    .await
    .unwrap();
    let location = LocationRepo::create(
        pool,
        &NewLocation {
            custom_id: "PRM-01".to_string(),
            name: "Permission Clinic".to_string(),
            description: None,
            created_by,
        },
    )
    .await
    .unwrap();
    let site = SiteRepo::create(
        pool,
        &NewSite {
            study_id: study.id,
            location_id: location.id,
            created_by,
        },
    )
    .await
    .unwrap();
    (app.id, study.id, site.id)
}

// ---------------------------------------------------------------------------
// Test: Seeding site permissions from study holders
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_seed_site_permissions_from_study_holders(pool: PgPool) {
    let viewer = seed_admin(&pool, "viewer@example.com").await;
    let creator = seed_admin(&pool, "creator@example.com").await;
    let outsider = seed_admin(&pool, "outsider@example.com").await;
    let (app_id, study_id, site_id) = seed_study_site(&pool, creator).await;

    for admin in [viewer, creator] {
        PermissionRepo::insert_study_batch(
            &pool,
            admin,
            &[StudyPermissionEntry {
                app_id,
                study_id,
                edit: 1,
            }],
            creator,
        )
        .await
        .unwrap();
    }

    let holders: Vec<PermissionHolder> = PermissionRepo::study_holders(&pool, study_id)
        .await
        .unwrap()
        .iter()
        .map(|row| PermissionHolder {
            admin_user_id: row.admin_user_id,
            edit: row.level().unwrap(),
        })
        .collect();
    assert_eq!(holders.len(), 2);

    let seeds = seed_site_permissions(&holders, creator);
    let inserted = PermissionRepo::seed_site(&pool, app_id, study_id, site_id, &seeds, creator)
        .await
        .unwrap();
    assert_eq!(inserted, 2);

    // The creator is raised to edit; the other holder keeps view.
    let viewer_row = PermissionRepo::find_site(&pool, viewer, site_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(viewer_row.level().unwrap(), Permission::ReadView);
    let creator_row = PermissionRepo::find_site(&pool, creator, site_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(creator_row.level().unwrap(), Permission::ReadEdit);
    assert_eq!(creator_row.app_id, app_id);
    assert_eq!(creator_row.study_id, study_id);

    // No study permission, no seed.
    assert!(PermissionRepo::find_site(&pool, outsider, site_id)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_seeding_empty_set_writes_nothing(pool: PgPool) {
    let creator = seed_admin(&pool, "creator@example.com").await;
    let (app_id, study_id, site_id) = seed_study_site(&pool, creator).await;

    let inserted = PermissionRepo::seed_site(&pool, app_id, study_id, site_id, &[], creator)
        .await
        .unwrap();
    assert_eq!(inserted, 0);
    assert!(PermissionRepo::site_holder_ids(&pool, site_id)
        .await
        .unwrap()
        .is_empty());
}

// ---------------------------------------------------------------------------
// Test: Decommission downgrade and revoke
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_decommission_downgrades_and_revokes(pool: PgPool) {
    let study_admin = seed_admin(&pool, "study@example.com").await;
    let site_only = seed_admin(&pool, "site-only@example.com").await;
    let (app_id, study_id, site_id) = seed_study_site(&pool, study_admin).await;

    // A view-level study grant still counts as holding the study.
    PermissionRepo::insert_study_batch(
        &pool,
        study_admin,
        &[StudyPermissionEntry {
            app_id,
            study_id,
            edit: 1,
        }],
        study_admin,
    )
    .await
    .unwrap();
    for admin in [study_admin, site_only] {
        PermissionRepo::insert_site_batch(
            &pool,
            admin,
            &[SitePermissionEntry {
                app_id,
                study_id,
                site_id,
                can_edit: 2,
            }],
            study_admin,
        )
        .await
        .unwrap();
    }

    let site_holders = PermissionRepo::site_holder_ids(&pool, site_id).await.unwrap();
    assert_eq!(site_holders, vec![study_admin, site_only]);
    let study_holders = PermissionRepo::study_holder_ids(&pool, study_id)
        .await
        .unwrap();
    assert_eq!(study_holders, vec![study_admin]);

    let plan = plan_decommission_downgrade(&site_holders, &study_holders);
    assert_eq!(plan.downgrade_to_view, vec![study_admin]);
    assert_eq!(plan.revoke, vec![site_only]);

    let downgraded =
        PermissionRepo::downgrade_site_holders(&pool, site_id, &plan.downgrade_to_view)
            .await
            .unwrap();
    assert_eq!(downgraded, 1);
    let revoked = PermissionRepo::revoke_site_holders(&pool, site_id, &plan.revoke)
        .await
        .unwrap();
    assert_eq!(revoked, 1);

    let kept = PermissionRepo::find_site(&pool, study_admin, site_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(kept.level().unwrap(), Permission::ReadView);
    assert!(PermissionRepo::find_site(&pool, site_only, site_id)
        .await
        .unwrap()
        .is_none());
}

// ---------------------------------------------------------------------------
// Test: Batch grants and full reset
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_grant_batches_and_delete_all(pool: PgPool) {
    let granter = seed_admin(&pool, "granter@example.com").await;
    let grantee = seed_admin(&pool, "grantee@example.com").await;
    let (app_id, study_id, site_id) = seed_study_site(&pool, granter).await;

    let apps = PermissionRepo::insert_app_batch(
        &pool,
        grantee,
        &[AppPermissionEntry { app_id, edit: 2 }],
        granter,
    )
    .await
    .unwrap();
    let studies = PermissionRepo::insert_study_batch(
        &pool,
        grantee,
        &[StudyPermissionEntry {
            app_id,
            study_id,
            edit: 1,
        }],
        granter,
    )
    .await
    .unwrap();
    let sites = PermissionRepo::insert_site_batch(
        &pool,
        grantee,
        &[SitePermissionEntry {
            app_id,
            study_id,
            site_id,
            can_edit: 1,
        }],
        granter,
    )
    .await
    .unwrap();
    assert_eq!((apps, studies, sites), (1, 1, 1));

    let app_row = PermissionRepo::find_app(&pool, grantee, app_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(app_row.level().unwrap(), Permission::ReadEdit);
    assert_eq!(app_row.created_by, Some(granter));
    let study_row = PermissionRepo::find_study(&pool, grantee, study_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(study_row.level().unwrap(), Permission::ReadView);

    // Empty batches are no-ops.
    assert_eq!(
        PermissionRepo::insert_app_batch(&pool, grantee, &[], granter)
            .await
            .unwrap(),
        0
    );

    let deleted = PermissionRepo::delete_all_for_admin(&pool, grantee).await.unwrap();
    assert_eq!(deleted, 3);
    assert!(PermissionRepo::find_app(&pool, grantee, app_id)
        .await
        .unwrap()
        .is_none());
    assert!(PermissionRepo::find_study(&pool, grantee, study_id)
        .await
        .unwrap()
        .is_none());
    assert!(PermissionRepo::find_site(&pool, grantee, site_id)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_site_grant_rejected(pool: PgPool) {
    let admin = seed_admin(&pool, "admin@example.com").await;
    let (app_id, study_id, site_id) = seed_study_site(&pool, admin).await;

    let entry = SitePermissionEntry {
        app_id,
        study_id,
        site_id,
        can_edit: 1,
    };
    PermissionRepo::insert_site_batch(&pool, admin, &[entry], admin)
        .await
        .unwrap();
    let result = PermissionRepo::insert_site_batch(&pool, admin, &[entry], admin).await;
    assert!(
        result.is_err(),
        "Duplicate (admin_user_id, site_id) should fail"
    );
}
