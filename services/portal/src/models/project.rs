//! Project, roster, and lifecycle-status models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::user::Role;

/// Distinguishes an explicit `"mentor_id": null` (clear) from an absent key
/// (leave unchanged) when deserializing partial updates
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Project lifecycle status
///
/// `submitted → pending → approved → completed`, with `rejected` reachable
/// from review states and `deleted` an administrative soft delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Submitted,
    Pending,
    Approved,
    Rejected,
    Completed,
    Deleted,
}

/// Project entity
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub tech_stack: String,
    pub mentor_id: Option<Uuid>,
    pub course: String,
    pub semester: String,
    pub section: String,
    pub start_date: DateTime<Utc>,
    pub submission_date: DateTime<Utc>,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Project creation payload; `teammates` excludes the initiator, who always
/// becomes the leader
#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tech_stack: String,
    pub mentor_id: Option<Uuid>,
    #[serde(default)]
    pub course: String,
    #[serde(default)]
    pub semester: String,
    #[serde(default)]
    pub section: String,
    pub start_date: DateTime<Utc>,
    pub submission_date: DateTime<Utc>,
    #[serde(default)]
    pub teammates: Vec<Uuid>,
}

/// Admin project-update payload; general field edits plus an optional status
/// change validated against the lifecycle table
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateProject {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tech_stack: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub mentor_id: Option<Option<Uuid>>,
    pub course: Option<String>,
    pub semester: Option<String>,
    pub section: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub submission_date: Option<DateTime<Utc>>,
    pub status: Option<ProjectStatus>,
}

/// Mentor status-transition payload
#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdate {
    pub status: ProjectStatus,
}

/// Team roster entry
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProjectMember {
    pub project_id: Uuid,
    pub student_id: Uuid,
    pub is_leader: bool,
}

/// Identity fields exposed when joining users into project responses
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserIdentity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Roster entry joined to the member's identity
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MemberIdentity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_leader: bool,
}

/// Project detail: the project, its full roster, and the resolved mentor
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    pub project: Project,
    pub members: Vec<MemberIdentity>,
    pub mentor: Option<UserIdentity>,
}
