//! User repository for database operations

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{NewUser, Role, UpdateUser, User, UserStatus};

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn hash_password(password: &str) -> ApiResult<String> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let argon2 = Argon2::default();
        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| {
                tracing::error!("Failed to hash password: {}", e);
                ApiError::InternalServerError
            })
    }

    /// Register a new user
    ///
    /// Emails are normalized to lowercase; a registration that collides with
    /// an existing normalized email fails with `Conflict`.
    pub async fn create(&self, new_user: &NewUser) -> ApiResult<User> {
        let email = new_user.email.to_lowercase();
        info!("Creating new user: {}", email);

        if self.find_by_email(&email).await?.is_some() {
            return Err(ApiError::Conflict("Email already in use".to_string()));
        }

        let password_hash = Self::hash_password(&new_user.password)?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password_hash, role, status, created_at, updated_at
            "#,
        )
        .bind(&new_user.name)
        .bind(&email)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            // A racing registration can slip past the precheck and land on
            // the unique email index; surface that as the same conflict
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ApiError::Conflict("Email already in use".to_string())
            }
            _ => e.into(),
        })?;

        Ok(user)
    }

    /// Verify a user's password against the stored hash
    pub fn verify_password(&self, user: &User, password: &str) -> ApiResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash).map_err(|e| {
            tracing::error!("Failed to parse password hash: {}", e);
            ApiError::InternalServerError
        })?;

        let argon2 = Argon2::default();
        Ok(argon2.verify_password(password.as_bytes(), &parsed_hash).is_ok())
    }

    /// Find a user by email, case-insensitively
    pub async fn find_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, status, created_at, updated_at
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> ApiResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, status, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a mentor by email; only matches users holding the mentor role
    pub async fn find_mentor_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, status, created_at, updated_at
            FROM users
            WHERE LOWER(email) = LOWER($1) AND role = $2
            "#,
        )
        .bind(email)
        .bind(Role::Mentor)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// List users visible in the general directory; banned accounts are
    /// excluded but never removed
    pub async fn list_active(&self) -> ApiResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, status, created_at, updated_at
            FROM users
            WHERE status <> $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(UserStatus::Banned)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// List every user, banned included (admin listing)
    pub async fn list_all(&self) -> ApiResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, status, created_at, updated_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Admin update: overwrites any provided subset of fields unconditionally.
    /// Role accepts any of the three values with no transition restriction.
    pub async fn update(&self, id: Uuid, update: &UpdateUser) -> ApiResult<User> {
        info!("Updating user: {}", id);

        let password_hash = match &update.password {
            Some(password) => Some(Self::hash_password(password)?),
            None => None,
        };
        let email = update.email.as_ref().map(|e| e.to_lowercase());

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                role = COALESCE($5, role),
                status = COALESCE($6, status),
                updated_at = now()
            WHERE id = $1
            RETURNING id, name, email, password_hash, role, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&email)
        .bind(&password_hash)
        .bind(update.role)
        .bind(update.status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        Ok(user)
    }
}
