//! Repositorio PostgreSQL de usuarios

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use super::UserRepository;
use crate::models::permission::PermissionSet;
use crate::models::user::{ProfileChanges, User, UserFilter, UserRole};
use crate::utils::errors::{map_unique_violation, AppResult};

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    full_name: String,
    phone: Option<String>,
    role: UserRole,
    is_active: bool,
    permissions: Json<PermissionSet>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    updated_by: Option<Uuid>,
    approved_at: Option<DateTime<Utc>>,
    approved_by: Option<Uuid>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            full_name: row.full_name,
            phone: row.phone,
            role: row.role,
            is_active: row.is_active,
            permissions: row.permissions.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
            updated_by: row.updated_by,
            approved_at: row.approved_at,
            approved_by: row.approved_by,
        }
    }
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, user: &User) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, email, full_name, phone, role, is_active, permissions,
                               created_at, updated_at, updated_by, approved_at, approved_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.phone)
        .bind(user.role)
        .bind(user.is_active)
        .bind(Json(&user.permissions))
        .bind(user.created_at)
        .bind(user.updated_at)
        .bind(user.updated_by)
        .bind(user.approved_at)
        .bind(user.approved_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, format!("User with email '{}' already exists", user.email)))?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn list(&self, filter: &UserFilter) -> AppResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT * FROM users
            WHERE ($1::user_role IS NULL OR role = $1)
              AND ($2::boolean IS NULL OR is_active = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.role)
        .bind(filter.is_active)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
        actor: Uuid,
    ) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET full_name = COALESCE($2, full_name),
                phone = COALESCE($3, phone),
                updated_at = $4,
                updated_by = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.full_name)
        .bind(&changes.phone)
        .bind(Utc::now())
        .bind(actor)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn update_role(&self, id: Uuid, role: UserRole, actor: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET role = $2, permissions = $3, updated_at = $4, updated_by = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(role)
        .bind(Json(role.default_permissions()))
        .bind(Utc::now())
        .bind(actor)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn set_active(&self, id: Uuid, is_active: bool, actor: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET is_active = $2, updated_at = $3, updated_by = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(is_active)
        .bind(Utc::now())
        .bind(actor)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
