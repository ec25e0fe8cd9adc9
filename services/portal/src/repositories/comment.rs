//! Comment repository for database operations
//!
//! Comments are append-only. Deletion flips the status to `deleted`; rows
//! are never physically removed, so ids referenced elsewhere stay valid.

use sqlx::PgPool;
use uuid::Uuid;

use crate::authz::comment_scope_error;
use crate::error::{ApiError, ApiResult};
use crate::models::{Comment, CommentStatus, NewComment, UpdateComment};

/// Comment repository
#[derive(Clone)]
pub struct CommentRepository {
    pool: PgPool,
}

impl CommentRepository {
    /// Create a new comment repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append an active comment to a project's thread
    pub async fn create(&self, author_id: Uuid, new_comment: &NewComment) -> ApiResult<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (project_id, author_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, project_id, author_id, content, status, created_at, updated_at
            "#,
        )
        .bind(new_comment.project_id)
        .bind(author_id)
        .bind(&new_comment.content)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    /// Active comments for a project, in insertion order
    pub async fn list_for_project(&self, project_id: Uuid) -> ApiResult<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, project_id, author_id, content, status, created_at, updated_at
            FROM comments
            WHERE project_id = $1 AND status = $2
            ORDER BY created_at
            "#,
        )
        .bind(project_id)
        .bind(CommentStatus::Active)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    /// Fetch a comment by exact id regardless of status (audit path)
    pub async fn find_by_id(&self, id: Uuid) -> ApiResult<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, project_id, author_id, content, status, created_at, updated_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    /// Soft-delete a comment, author-only
    ///
    /// The author check sits in the predicate, so "no such comment" and
    /// "not your comment" are indistinguishable to the caller.
    pub async fn soft_delete(&self, comment_id: Uuid, requester_id: Uuid) -> ApiResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE comments
            SET status = $3, updated_at = now()
            WHERE id = $1 AND author_id = $2
            "#,
        )
        .bind(comment_id)
        .bind(requester_id)
        .bind(CommentStatus::Deleted)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(comment_scope_error());
        }

        Ok(())
    }

    /// Admin update: overwrites any provided subset of fields without an
    /// ownership check; a distinct channel from user-initiated deletion
    pub async fn update(&self, id: Uuid, update: &UpdateComment) -> ApiResult<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments
            SET content = COALESCE($2, content),
                status = COALESCE($3, status),
                updated_at = now()
            WHERE id = $1
            RETURNING id, project_id, author_id, content, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&update.content)
        .bind(update.status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewProject, NewUser, Role, UpdateUser};
    use crate::repositories::{ProjectRepository, UserRepository};
    use chrono::Utc;

    async fn setup() -> (UserRepository, ProjectRepository, CommentRepository) {
        let config = common::database::DatabaseConfig::from_env().unwrap();
        let pool = common::database::init_pool(&config).await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        (
            UserRepository::new(pool.clone()),
            ProjectRepository::new(pool.clone()),
            CommentRepository::new(pool),
        )
    }

    async fn make_student(users: &UserRepository) -> crate::models::User {
        users
            .create(&NewUser {
                name: "Commenter".to_string(),
                email: format!("{}@example.com", Uuid::new_v4()),
                password: "correct-horse".to_string(),
            })
            .await
            .unwrap()
    }

    async fn make_project(users: &UserRepository, projects: &ProjectRepository) -> Uuid {
        let leader = make_student(users).await;
        let _ = users
            .update(
                leader.id,
                &UpdateUser {
                    role: Some(Role::Student),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        projects
            .create(
                &NewProject {
                    title: "Thread test".to_string(),
                    description: "comment fixture".to_string(),
                    tech_stack: String::new(),
                    mentor_id: None,
                    course: String::new(),
                    semester: String::new(),
                    section: String::new(),
                    start_date: Utc::now(),
                    submission_date: Utc::now(),
                    teammates: vec![],
                },
                leader.id,
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_author_only_soft_delete() {
        let (users, projects, comments) = setup().await;
        let author = make_student(&users).await;
        let other = make_student(&users).await;
        let project_id = make_project(&users, &projects).await;

        let comment = comments
            .create(
                author.id,
                &NewComment {
                    project_id,
                    content: "looks good".to_string(),
                },
            )
            .await
            .unwrap();

        // A non-author gets the conflated failure and the comment stays active
        let err = comments.soft_delete(comment.id, other.id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        let fetched = comments.find_by_id(comment.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, CommentStatus::Active);

        comments.soft_delete(comment.id, author.id).await.unwrap();

        // Hidden from the listing, still fetchable by exact id for audit
        let listed = comments.list_for_project(project_id).await.unwrap();
        assert!(!listed.iter().any(|c| c.id == comment.id));
        let fetched = comments.find_by_id(comment.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, CommentStatus::Deleted);
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_admin_update_ignores_ownership() {
        let (users, projects, comments) = setup().await;
        let author = make_student(&users).await;
        let project_id = make_project(&users, &projects).await;

        let comment = comments
            .create(
                author.id,
                &NewComment {
                    project_id,
                    content: "original text".to_string(),
                },
            )
            .await
            .unwrap();

        let updated = comments
            .update(
                comment.id,
                &UpdateComment {
                    content: Some("moderated".to_string()),
                    status: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.content, "moderated");
        assert_eq!(updated.status, CommentStatus::Active);
    }
}
