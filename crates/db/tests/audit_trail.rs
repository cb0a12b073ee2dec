//! Integration tests for the append-only audit trail.

use sqlx::PgPool;
use studygate_db::models::audit::NewAuditEvent;
use studygate_db::repositories::AuditRepo;

fn event(name: &str, description: &str) -> NewAuditEvent {
    NewAuditEvent {
        event_name: name.to_string(),
        description: description.to_string(),
        ..Default::default()
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_insert_stamps_occurrence(pool: PgPool) {
    let before = chrono::Utc::now();
    let row = AuditRepo::insert(
        &pool,
        &NewAuditEvent {
            event_name: "SITE_ADDED_FOR_STUDY".to_string(),
            user_id: Some(7),
            study_id: Some(11),
            site_id: Some(13),
            description: "Site added to study".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(row.event_name, "SITE_ADDED_FOR_STUDY");
    assert_eq!(row.user_id, Some(7));
    assert_eq!(row.study_id, Some(11));
    assert_eq!(row.site_id, Some(13));
    assert_eq!(row.app_id, None);
    assert_eq!(row.participant_id, None);
    assert!(row.occurred_at >= before);
}

/// Scope ids deliberately carry no foreign keys: an audit row must outlive
/// the admin or site it describes.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rows_survive_subject_deletion(pool: PgPool) {
    let admin: i64 = sqlx::query_scalar(
        "INSERT INTO admin_users (email, first_name, last_name, super_admin, status)
         VALUES ('gone@example.com', 'Soon', 'Gone', TRUE, 1)
         RETURNING id",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    AuditRepo::insert(
        &pool,
        &NewAuditEvent {
            event_name: "NEW_USER_CREATED".to_string(),
            user_id: Some(admin),
            description: "Admin account created".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    sqlx::query("DELETE FROM admin_users WHERE id = $1")
        .bind(admin)
        .execute(&pool)
        .await
        .unwrap();

    let rows = AuditRepo::list_by_event(&pool, "NEW_USER_CREATED").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_id, Some(admin));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_recent_returns_newest_first(pool: PgPool) {
    for i in 0..3 {
        AuditRepo::insert(&pool, &event("LOCATION_EDITED", &format!("edit {i}")))
            .await
            .unwrap();
    }
    AuditRepo::insert(&pool, &event("NEW_LOCATION_ADDED", "added"))
        .await
        .unwrap();

    let recent = AuditRepo::recent(&pool, 2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].event_name, "NEW_LOCATION_ADDED");
    assert_eq!(recent[1].description, "edit 2");

    let edits = AuditRepo::list_by_event(&pool, "LOCATION_EDITED").await.unwrap();
    assert_eq!(edits.len(), 3);
    assert_eq!(edits[0].description, "edit 0");
    assert_eq!(edits[2].description, "edit 2");
}
