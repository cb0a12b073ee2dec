#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use studygate_api::config::ServerConfig;
use studygate_api::router::build_app_router;
use studygate_api::state::AppState;
use studygate_core::status::AdminStatus;
use studygate_core::types::DbId;
use studygate_db::models::{
    AdminUser, App, AppPermissionEntry, Location, NewAdminUser, NewApp, NewLocation,
    NewParticipant, NewParticipantStudy, NewSite, NewStudy, ParticipantRegistry, Site,
    SitePermissionEntry, Study, StudyPermissionEntry,
};
use studygate_db::repositories::{
    AdminUserRepo, AppRepo, LocationRepo, ParticipantRepo, PermissionRepo, SiteRepo, StudyRepo,
};
use studygate_events::{AuditRecorder, EmailMessage, EmailOutcome, EmailSender, NoopSender};

/// Build a test `ServerConfig` with safe defaults.
///
/// Mirrors the `from_env` defaults so assertions against rendered email
/// templates and the permission fallback behave like a stock deployment.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_allowed_origins: vec!["http://localhost:4200".to_string()],
        request_timeout_secs: 30,
        enrollment_token_expiry_hours: 48,
        security_code_expiry_days: 30,
        email_outbox_poll_secs: 60,
        missing_permission_defaults_to_allowed: true,
        org_name: "StudyGate".to_string(),
        contact_email: "support@studygate.local".to_string(),
        admin_portal_url: "http://localhost:4200".to_string(),
        invite_subject: "You have been invited to join the {study name} study".to_string(),
        invite_body: "Enter the enrollment token {enrolment token} to join {study name}. \
                      Questions: {contact email address}"
            .to_string(),
    }
}

/// Build the full application router over the given pool, with email
/// delivery stubbed out.
///
/// Goes through [`build_app_router`] so integration tests exercise the
/// exact middleware stack (CORS, request ID, timeout, tracing, panic
/// recovery) that production uses.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_mailer(pool, Arc::new(NoopSender))
}

/// Like [`build_test_app`], but with a caller-supplied mailer so tests can
/// observe or fail outgoing email.
pub fn build_test_app_with_mailer(pool: PgPool, mailer: Arc<dyn EmailSender>) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        mailer,
        recorder: Arc::new(AuditRecorder::default()),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Mailer stubs
// ---------------------------------------------------------------------------

/// Mailer that accepts everything and keeps what it was asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl EmailSender for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> EmailOutcome {
        self.sent.lock().unwrap().push(message.clone());
        EmailOutcome::Accepted
    }
}

/// Mailer whose relay is permanently down.
pub struct RejectingMailer;

#[async_trait]
impl EmailSender for RejectingMailer {
    async fn send(&self, _message: &EmailMessage) -> EmailOutcome {
        EmailOutcome::Failed {
            reason: "connection refused".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Send a request through the router without a TCP listener.
pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

fn json_request(method: Method, uri: &str, admin_id: DbId, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("userId", admin_id.to_string())
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// GET with the `userId` header set.
pub async fn get(app: Router, uri: &str, admin_id: DbId) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header("userId", admin_id.to_string())
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// GET without any identification, for the health check and header tests.
pub async fn get_anonymous(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// POST a JSON body with the `userId` header set.
pub async fn post_json(app: Router, uri: &str, admin_id: DbId, body: Value) -> Response {
    send(app, json_request(Method::POST, uri, admin_id, body)).await
}

/// PUT a JSON body with the `userId` header set.
pub async fn put_json(app: Router, uri: &str, admin_id: DbId, body: Value) -> Response {
    send(app, json_request(Method::PUT, uri, admin_id, body)).await
}

/// PATCH a JSON body with the `userId` header set.
pub async fn patch_json(app: Router, uri: &str, admin_id: DbId, body: Value) -> Response {
    send(app, json_request(Method::PATCH, uri, admin_id, body)).await
}

/// POST a `multipart/form-data` body with a single `file` part.
pub async fn post_multipart_file(
    app: Router,
    uri: &str,
    admin_id: DbId,
    filename: &str,
    content: &str,
) -> Response {
    let boundary = "studygate-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {content}\r\n\
         --{boundary}--\r\n"
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("userId", admin_id.to_string())
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

/// Collect the response body and parse it as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixture seeding
// ---------------------------------------------------------------------------
//
// Apps and studies have no creation endpoint (those records arrive from the
// mobile platform), so fixtures go in through the repository layer.

async fn seed_admin_row(
    pool: &PgPool,
    email: &str,
    super_admin: bool,
    location_permission: i16,
) -> AdminUser {
    AdminUserRepo::create(
        pool,
        &NewAdminUser {
            email: email.to_string(),
            first_name: "Test".to_string(),
            last_name: "Admin".to_string(),
            phone: None,
            location_permission,
            super_admin,
            status: AdminStatus::Active.id(),
            security_code: "seed-code".to_string(),
            security_code_expires_at: Utc::now() + Duration::days(30),
            created_by: 1,
        },
    )
    .await
    .unwrap()
}

/// Insert an active super admin.
pub async fn seed_super_admin(pool: &PgPool) -> AdminUser {
    seed_admin_row(pool, "root@studygate.local", true, 2).await
}

/// Insert an active non-super admin with the given location permission
/// level (0 none, 1 view, 2 edit).
pub async fn seed_admin(pool: &PgPool, email: &str, location_permission: i16) -> AdminUser {
    seed_admin_row(pool, email, false, location_permission).await
}

pub async fn seed_app(pool: &PgPool, custom_app_id: &str) -> App {
    AppRepo::create(
        pool,
        &NewApp {
            custom_app_id: custom_app_id.to_string(),
            name: format!("{custom_app_id} app"),
        },
    )
    .await
    .unwrap()
}

/// Insert a study; `study_type` is `"OPEN"` or `"CLOSE"`.
pub async fn seed_study(
    pool: &PgPool,
    app_id: DbId,
    custom_study_id: &str,
    study_type: &str,
) -> Study {
    StudyRepo::create(
        pool,
        &NewStudy {
            app_id,
            custom_study_id: custom_study_id.to_string(),
            name: format!("{custom_study_id} study"),
            study_type: study_type.to_string(),
        },
    )
    .await
    .unwrap()
}

pub async fn seed_location(pool: &PgPool, custom_id: &str, created_by: DbId) -> Location {
    LocationRepo::create(
        pool,
        &NewLocation {
            custom_id: custom_id.to_string(),
            name: format!("{custom_id} clinic"),
            description: None,
            created_by,
        },
    )
    .await
    .unwrap()
}

/// Insert a site; sites start active with no enrollment target.
pub async fn seed_site(pool: &PgPool, study_id: DbId, location_id: DbId, created_by: DbId) -> Site {
    SiteRepo::create(
        pool,
        &NewSite {
            study_id,
            location_id,
            created_by,
        },
    )
    .await
    .unwrap()
}

pub async fn grant_app_permission(pool: &PgPool, admin_id: DbId, app_id: DbId, edit: i16) {
    PermissionRepo::insert_app_batch(pool, admin_id, &[AppPermissionEntry { app_id, edit }], admin_id)
        .await
        .unwrap();
}

pub async fn grant_study_permission(
    pool: &PgPool,
    admin_id: DbId,
    app_id: DbId,
    study_id: DbId,
    edit: i16,
) {
    PermissionRepo::insert_study_batch(
        pool,
        admin_id,
        &[StudyPermissionEntry {
            app_id,
            study_id,
            edit,
        }],
        admin_id,
    )
    .await
    .unwrap();
}

pub async fn grant_site_permission(
    pool: &PgPool,
    admin_id: DbId,
    app_id: DbId,
    study_id: DbId,
    site_id: DbId,
    can_edit: i16,
) {
    PermissionRepo::insert_site_batch(
        pool,
        admin_id,
        &[SitePermissionEntry {
            app_id,
            study_id,
            site_id,
            can_edit,
        }],
        admin_id,
    )
    .await
    .unwrap();
}

/// Insert a registry entry; new entries start in onboarding status `N`.
pub async fn seed_participant(
    pool: &PgPool,
    study_id: DbId,
    site_id: DbId,
    email: &str,
    created_by: DbId,
) -> ParticipantRegistry {
    ParticipantRepo::create(
        pool,
        &NewParticipant {
            study_id,
            site_id,
            email: email.to_string(),
            created_by,
        },
    )
    .await
    .unwrap()
}

/// Insert an enrollment record; `status` is one of the wire enrollment
/// statuses (`yetToJoin`, `enrolled`, `active`, `withdrawn`).
pub async fn seed_enrollment(
    pool: &PgPool,
    registry_id: DbId,
    study_id: DbId,
    site_id: DbId,
    status: &str,
) {
    let enrolled_at = if status == "yetToJoin" {
        None
    } else {
        Some(Utc::now())
    };
    let withdrawn_at = if status == "withdrawn" {
        Some(Utc::now())
    } else {
        None
    };
    ParticipantRepo::create_enrollment(
        pool,
        &NewParticipantStudy {
            participant_registry_id: registry_id,
            study_id,
            site_id: Some(site_id),
            status: status.to_string(),
            enrolled_at,
            withdrawn_at,
        },
    )
    .await
    .unwrap();
}

/// App, close study, active location and active site, wired together.
pub struct SiteFixture {
    pub app: App,
    pub study: Study,
    pub location: Location,
    pub site: Site,
}

/// Seed one close study with an active site, created by `admin_id`. The
/// admin gets no permission rows; grant those per test.
pub async fn seed_close_study_site(pool: &PgPool, admin_id: DbId) -> SiteFixture {
    let app = seed_app(pool, "app-001").await;
    let study = seed_study(pool, app.id, "CLS-001", "CLOSE").await;
    let location = seed_location(pool, "loc-001", admin_id).await;
    let site = seed_site(pool, study.id, location.id, admin_id).await;
    SiteFixture {
        app,
        study,
        location,
        site,
    }
}
