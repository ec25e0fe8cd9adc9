//! Project repository for database operations
//!
//! The project row and its roster form one aggregate: creation inserts both
//! inside a single transaction so a project is never observable without its
//! leader. Every other mutation is a single statement.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::authz::mentor_scope_error;
use crate::error::{ApiError, ApiResult};
use crate::lifecycle;
use crate::models::{
    MemberIdentity, NewProject, Project, ProjectDetail, ProjectMember, ProjectStatus, Role,
    UpdateProject, UserIdentity,
};
use crate::team;

/// Project repository
#[derive(Clone)]
pub struct ProjectRepository {
    pool: PgPool,
}

impl ProjectRepository {
    /// Create a new project repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a project with its full roster, atomically
    ///
    /// The initiator becomes the single leader; candidates are deduplicated
    /// and capped by the team-composition rules before anything is written.
    pub async fn create(&self, new_project: &NewProject, initiator: Uuid) -> ApiResult<Project> {
        let roster = team::build_roster(initiator, &new_project.teammates)?;

        info!(
            "Creating project '{}' with {} roster entries",
            new_project.title,
            roster.len()
        );

        let mut tx = self.pool.begin().await?;

        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects
                (title, description, tech_stack, mentor_id, course, semester, section,
                 start_date, submission_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, title, description, tech_stack, mentor_id, course, semester,
                      section, start_date, submission_date, status, created_at, updated_at
            "#,
        )
        .bind(&new_project.title)
        .bind(&new_project.description)
        .bind(&new_project.tech_stack)
        .bind(new_project.mentor_id)
        .bind(&new_project.course)
        .bind(&new_project.semester)
        .bind(&new_project.section)
        .bind(new_project.start_date)
        .bind(new_project.submission_date)
        .fetch_one(&mut *tx)
        .await?;

        for entry in &roster {
            sqlx::query(
                r#"
                INSERT INTO project_students (project_id, student_id, is_leader)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(project.id)
            .bind(entry.student_id)
            .bind(entry.is_leader)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(project)
    }

    /// Projects where the student holds a membership row
    pub async fn list_for_student(&self, student_id: Uuid) -> ApiResult<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT p.id, p.title, p.description, p.tech_stack, p.mentor_id, p.course,
                   p.semester, p.section, p.start_date, p.submission_date, p.status,
                   p.created_at, p.updated_at
            FROM projects p
            INNER JOIN project_students ps ON ps.project_id = p.id
            WHERE ps.student_id = $1 AND p.status <> $2
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(student_id)
        .bind(ProjectStatus::Deleted)
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    /// Projects assigned to the mentor, excluding soft-deleted ones
    pub async fn list_for_mentor(&self, mentor_id: Uuid) -> ApiResult<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, title, description, tech_stack, mentor_id, course, semester,
                   section, start_date, submission_date, status, created_at, updated_at
            FROM projects
            WHERE mentor_id = $1 AND status <> $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(mentor_id)
        .bind(ProjectStatus::Deleted)
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    /// All projects, excluding soft-deleted ones (admin listing)
    pub async fn list_all(&self) -> ApiResult<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, title, description, tech_stack, mentor_id, course, semester,
                   section, start_date, submission_date, status, created_at, updated_at
            FROM projects
            WHERE status <> $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(ProjectStatus::Deleted)
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    /// Find a project by ID; soft-deleted projects behave as absent
    pub async fn find_by_id(&self, id: Uuid) -> ApiResult<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, title, description, tech_stack, mentor_id, course, semester,
                   section, start_date, submission_date, status, created_at, updated_at
            FROM projects
            WHERE id = $1 AND status <> $2
            "#,
        )
        .bind(id)
        .bind(ProjectStatus::Deleted)
        .fetch_optional(&self.pool)
        .await?;

        Ok(project)
    }

    /// Project detail: the project, its roster joined to user identities,
    /// and the resolved mentor identity
    pub async fn detail(&self, id: Uuid) -> ApiResult<ProjectDetail> {
        let project = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

        let members = sqlx::query_as::<_, MemberIdentity>(
            r#"
            SELECT u.id, u.name, u.email, u.role, ps.is_leader
            FROM project_students ps
            INNER JOIN users u ON u.id = ps.student_id
            WHERE ps.project_id = $1
            ORDER BY ps.is_leader DESC, u.name
            "#,
        )
        .bind(project.id)
        .fetch_all(&self.pool)
        .await?;

        let mentor = match project.mentor_id {
            Some(mentor_id) => {
                sqlx::query_as::<_, UserIdentity>(
                    r#"
                    SELECT id, name, email, role
                    FROM users
                    WHERE id = $1
                    "#,
                )
                .bind(mentor_id)
                .fetch_optional(&self.pool)
                .await?
            }
            None => None,
        };

        Ok(ProjectDetail {
            project,
            members,
            mentor,
        })
    }

    /// Admin field update; an included status change is validated against
    /// the lifecycle table before the write
    pub async fn update_fields(&self, id: Uuid, update: &UpdateProject) -> ApiResult<Project> {
        let current = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, title, description, tech_stack, mentor_id, course, semester,
                   section, start_date, submission_date, status, created_at, updated_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

        if let Some(target) = update.status {
            lifecycle::check_transition(current.status, target, Role::Admin, false)?;
        }

        let (set_mentor, mentor_id) = match update.mentor_id {
            Some(value) => (true, value),
            None => (false, None),
        };

        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                tech_stack = COALESCE($4, tech_stack),
                mentor_id = CASE WHEN $5 THEN $6 ELSE mentor_id END,
                course = COALESCE($7, course),
                semester = COALESCE($8, semester),
                section = COALESCE($9, section),
                start_date = COALESCE($10, start_date),
                submission_date = COALESCE($11, submission_date),
                status = COALESCE($12, status),
                updated_at = now()
            WHERE id = $1
            RETURNING id, title, description, tech_stack, mentor_id, course, semester,
                      section, start_date, submission_date, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.description)
        .bind(&update.tech_stack)
        .bind(set_mentor)
        .bind(mentor_id)
        .bind(&update.course)
        .bind(&update.semester)
        .bind(&update.section)
        .bind(update.start_date)
        .bind(update.submission_date)
        .bind(update.status)
        .fetch_one(&self.pool)
        .await?;

        Ok(project)
    }

    /// Mentor-initiated status transition
    ///
    /// The project is looked up with the mentor id in the predicate; a
    /// missing project and a project assigned to someone else produce the
    /// same conflated failure.
    pub async fn update_status_for_mentor(
        &self,
        project_id: Uuid,
        mentor_id: Uuid,
        target: ProjectStatus,
    ) -> ApiResult<Project> {
        let current = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, title, description, tech_stack, mentor_id, course, semester,
                   section, start_date, submission_date, status, created_at, updated_at
            FROM projects
            WHERE id = $1 AND mentor_id = $2 AND status <> $3
            "#,
        )
        .bind(project_id)
        .bind(mentor_id)
        .bind(ProjectStatus::Deleted)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(mentor_scope_error)?;

        lifecycle::check_transition(current.status, target, Role::Mentor, true)?;

        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, title, description, tech_stack, mentor_id, course, semester,
                      section, start_date, submission_date, status, created_at, updated_at
            "#,
        )
        .bind(project_id)
        .bind(target)
        .fetch_one(&self.pool)
        .await?;

        Ok(project)
    }

    /// Administrative soft delete; the row and its roster are retained
    pub async fn soft_delete(&self, id: Uuid) -> ApiResult<Project> {
        info!("Soft-deleting project: {}", id);

        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, title, description, tech_stack, mentor_id, course, semester,
                      section, start_date, submission_date, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(ProjectStatus::Deleted)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

        Ok(project)
    }

    /// Add a teammate to an existing roster
    ///
    /// The count and insert run in one transaction holding a lock on the
    /// project row, so concurrent additions serialize and the teammate cap
    /// holds under racing requests.
    pub async fn add_member(&self, project_id: Uuid, student_id: Uuid) -> ApiResult<ProjectMember> {
        let mut tx = self.pool.begin().await?;

        sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM projects
            WHERE id = $1 AND status <> $2
            FOR UPDATE
            "#,
        )
        .bind(project_id)
        .bind(ProjectStatus::Deleted)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

        let existing = sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT project_id, student_id, is_leader
            FROM project_students
            WHERE project_id = $1 AND student_id = $2
            "#,
        )
        .bind(project_id)
        .bind(student_id)
        .fetch_optional(&mut *tx)
        .await?;

        if existing.is_some() {
            return Err(ApiError::Conflict(
                "Student is already a member of this project".to_string(),
            ));
        }

        let teammate_count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM project_students
            WHERE project_id = $1 AND NOT is_leader
            "#,
        )
        .bind(project_id)
        .fetch_one(&mut *tx)
        .await?;

        team::check_capacity(teammate_count as usize)?;

        let member = sqlx::query_as::<_, ProjectMember>(
            r#"
            INSERT INTO project_students (project_id, student_id, is_leader)
            VALUES ($1, $2, FALSE)
            RETURNING project_id, student_id, is_leader
            "#,
        )
        .bind(project_id)
        .bind(student_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(member)
    }

    /// Remove a teammate from a roster; the leader is never removable
    /// through this path
    pub async fn remove_member(&self, project_id: Uuid, student_id: Uuid) -> ApiResult<()> {
        let member = sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT project_id, student_id, is_leader
            FROM project_students
            WHERE project_id = $1 AND student_id = $2
            "#,
        )
        .bind(project_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Member not found".to_string()))?;

        if member.is_leader {
            return Err(ApiError::InvalidArgument(
                "The team leader cannot be removed".to_string(),
            ));
        }

        sqlx::query(
            r#"
            DELETE FROM project_students
            WHERE project_id = $1 AND student_id = $2
            "#,
        )
        .bind(project_id)
        .bind(student_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Assign or clear the project's mentor
    ///
    /// Whether the target actually holds the mentor role is a caller-side
    /// contract; it is not checked here.
    pub async fn set_mentor(&self, project_id: Uuid, mentor_id: Option<Uuid>) -> ApiResult<Project> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET mentor_id = $2, updated_at = now()
            WHERE id = $1 AND status <> $3
            RETURNING id, title, description, tech_stack, mentor_id, course, semester,
                      section, start_date, submission_date, status, created_at, updated_at
            "#,
        )
        .bind(project_id)
        .bind(mentor_id)
        .bind(ProjectStatus::Deleted)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

        Ok(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewProject, NewUser, UpdateUser, UserStatus};
    use crate::repositories::UserRepository;
    use chrono::Utc;

    async fn setup() -> (PgPool, UserRepository, ProjectRepository) {
        let config = common::database::DatabaseConfig::from_env().unwrap();
        let pool = common::database::init_pool(&config).await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        (
            pool.clone(),
            UserRepository::new(pool.clone()),
            ProjectRepository::new(pool),
        )
    }

    async fn make_user(users: &UserRepository, role: Role) -> crate::models::User {
        let user = users
            .create(&NewUser {
                name: "Test User".to_string(),
                email: format!("{}@example.com", Uuid::new_v4()),
                password: "correct-horse".to_string(),
            })
            .await
            .unwrap();
        users
            .update(
                user.id,
                &UpdateUser {
                    role: Some(role),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
    }

    fn project_payload(mentor_id: Option<Uuid>, teammates: Vec<Uuid>) -> NewProject {
        NewProject {
            title: "Plant disease classifier".to_string(),
            description: "CNN over leaf images".to_string(),
            tech_stack: "rust, onnx".to_string(),
            mentor_id,
            course: "B.Tech CS".to_string(),
            semester: "7".to_string(),
            section: "A".to_string(),
            start_date: Utc::now(),
            submission_date: Utc::now(),
            teammates,
        }
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_create_then_detail_round_trip() {
        let (_pool, users, projects) = setup().await;
        let leader = make_user(&users, Role::Student).await;
        let b = make_user(&users, Role::Student).await;
        let c = make_user(&users, Role::Student).await;
        let mentor = make_user(&users, Role::Mentor).await;

        let project = projects
            .create(&project_payload(Some(mentor.id), vec![b.id, c.id]), leader.id)
            .await
            .unwrap();

        let detail = projects.detail(project.id).await.unwrap();
        assert_eq!(detail.members.len(), 3);

        let leaders: Vec<_> = detail.members.iter().filter(|m| m.is_leader).collect();
        assert_eq!(leaders.len(), 1);
        assert_eq!(leaders[0].id, leader.id);

        assert_eq!(detail.mentor.as_ref().unwrap().id, mentor.id);
        assert_eq!(detail.project.status, ProjectStatus::Submitted);
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_fifth_teammate_rejected() {
        let (_pool, users, projects) = setup().await;
        let leader = make_user(&users, Role::Student).await;
        let mut teammates = Vec::new();
        for _ in 0..4 {
            teammates.push(make_user(&users, Role::Student).await.id);
        }

        let project = projects
            .create(&project_payload(None, teammates), leader.id)
            .await
            .unwrap();

        let extra = make_user(&users, Role::Student).await;
        let err = projects.add_member(project.id, extra.id).await.unwrap_err();
        assert!(matches!(err, ApiError::CapacityExceeded));

        // Re-adding an existing member conflicts before capacity is consulted
        let detail = projects.detail(project.id).await.unwrap();
        let existing = detail.members.iter().find(|m| !m.is_leader).unwrap();
        let err = projects.add_member(project.id, existing.id).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_concurrent_adds_never_overfill_roster() {
        let (_pool, users, projects) = setup().await;
        let leader = make_user(&users, Role::Student).await;
        let mut teammates = Vec::new();
        for _ in 0..3 {
            teammates.push(make_user(&users, Role::Student).await.id);
        }

        let project = projects
            .create(&project_payload(None, teammates), leader.id)
            .await
            .unwrap();

        let fourth = make_user(&users, Role::Student).await;
        let fifth = make_user(&users, Role::Student).await;

        // Both requests race for the single remaining slot; the project-row
        // lock serializes them, so exactly one wins
        let (a, b) = tokio::join!(
            projects.add_member(project.id, fourth.id),
            projects.add_member(project.id, fifth.id),
        );
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        for result in [a, b] {
            if let Err(err) = result {
                assert!(matches!(err, ApiError::CapacityExceeded));
            }
        }

        let detail = projects.detail(project.id).await.unwrap();
        assert_eq!(detail.members.len(), 5);
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_unassigned_mentor_cannot_transition() {
        let (_pool, users, projects) = setup().await;
        let leader = make_user(&users, Role::Student).await;
        let assigned = make_user(&users, Role::Mentor).await;
        let outsider = make_user(&users, Role::Mentor).await;

        let project = projects
            .create(&project_payload(Some(assigned.id), vec![]), leader.id)
            .await
            .unwrap();

        // Admin moves the project into review
        let pending = projects
            .update_fields(
                project.id,
                &UpdateProject {
                    status: Some(ProjectStatus::Pending),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(pending.status, ProjectStatus::Pending);

        let err = projects
            .update_status_for_mentor(project.id, outsider.id, ProjectStatus::Approved)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        // Status is unchanged after the failed attempt
        let detail = projects.detail(project.id).await.unwrap();
        assert_eq!(detail.project.status, ProjectStatus::Pending);

        let approved = projects
            .update_status_for_mentor(project.id, assigned.id, ProjectStatus::Approved)
            .await
            .unwrap();
        assert_eq!(approved.status, ProjectStatus::Approved);
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_banned_user_leaves_listings_but_keeps_memberships() {
        let (_pool, users, projects) = setup().await;
        let leader = make_user(&users, Role::Student).await;
        let teammate = make_user(&users, Role::Student).await;

        let project = projects
            .create(&project_payload(None, vec![teammate.id]), leader.id)
            .await
            .unwrap();

        users
            .update(
                teammate.id,
                &UpdateUser {
                    status: Some(UserStatus::Banned),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let active = users.list_active().await.unwrap();
        assert!(!active.iter().any(|u| u.id == teammate.id));

        let all = users.list_all().await.unwrap();
        assert!(all.iter().any(|u| u.id == teammate.id));

        // The membership row survives the ban
        let detail = projects.detail(project.id).await.unwrap();
        assert!(detail.members.iter().any(|m| m.id == teammate.id));
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_soft_deleted_project_hidden_from_lookups() {
        let (_pool, users, projects) = setup().await;
        let leader = make_user(&users, Role::Student).await;

        let project = projects
            .create(&project_payload(None, vec![]), leader.id)
            .await
            .unwrap();

        projects.soft_delete(project.id).await.unwrap();

        assert!(projects.find_by_id(project.id).await.unwrap().is_none());
        assert!(matches!(
            projects.detail(project.id).await.unwrap_err(),
            ApiError::NotFound(_)
        ));

        let listed = projects.list_for_student(leader.id).await.unwrap();
        assert!(!listed.iter().any(|p| p.id == project.id));
    }
}
