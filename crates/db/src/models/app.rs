//! App entity model.

use serde::Serialize;
use sqlx::FromRow;
use studygate_core::types::{DbId, Timestamp};

/// Row from the `apps` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct App {
    pub id: DbId,
    pub custom_app_id: String,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Input for inserting a new app.
#[derive(Debug, Clone)]
pub struct NewApp {
    pub custom_app_id: String,
    pub name: String,
}
