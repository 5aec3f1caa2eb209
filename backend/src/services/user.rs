//! User management (administrators only)

use std::sync::Arc;

use chrono::Utc;
use shared::{
    validation, Action, Actor, AuditAction, AuditEvent, PaginatedResponse, Pagination,
    ProfileInput, Resource, Role, User, UserInput,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::audit::AuditSink;
use crate::services::auth::hash_password;
use crate::store::postgres::like_pattern;

const MODULE: &str = "users";

const USER_COLUMNS: &str = "id, name, username, email, role, password_hash, created_at, updated_at";

#[derive(Clone)]
pub struct UserService {
    db: PgPool,
    audit: Arc<dyn AuditSink>,
}

impl UserService {
    pub fn new(db: PgPool, audit: Arc<dyn AuditSink>) -> Self {
        Self { db, audit }
    }

    fn check_role(role: Role) -> AppResult<()> {
        if Role::ASSIGNABLE.contains(&role) {
            Ok(())
        } else {
            Err(AppError::validation("role", "The selected role is invalid"))
        }
    }

    async fn ensure_unique(&self, username: &str, email: Option<&str>, except: Option<Uuid>) -> AppResult<()> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 AND ($2::UUID IS NULL OR id <> $2))",
        )
        .bind(username)
        .bind(except)
        .fetch_one(&self.db)
        .await?;
        if taken {
            return Err(AppError::DuplicateEntry("username".to_string()));
        }

        if let Some(email) = email {
            let taken: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND ($2::UUID IS NULL OR id <> $2))",
            )
            .bind(email)
            .bind(except)
            .fetch_one(&self.db)
            .await?;
            if taken {
                return Err(AppError::DuplicateEntry("email".to_string()));
            }
        }
        Ok(())
    }

    fn push_search(qb: &mut QueryBuilder<'_, Postgres>, search: Option<&str>) {
        if let Some(q) = search {
            let pattern = like_pattern(q);
            qb.push(" AND (name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR username ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR email ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }

    pub async fn list(
        &self,
        actor: &Actor,
        search: Option<&str>,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<User>> {
        actor.authorize(Resource::User, Action::View)?;

        let search = validation::normalize_search(search);

        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {USER_COLUMNS} FROM users WHERE TRUE"));
        Self::push_search(&mut qb, search.as_deref());
        qb.push(" ORDER BY created_at DESC, id LIMIT ")
            .push_bind(i64::from(pagination.per_page))
            .push(" OFFSET ")
            .push_bind(pagination.offset() as i64);
        let users = qb.build_query_as::<User>().fetch_all(&self.db).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users WHERE TRUE");
        Self::push_search(&mut count, search.as_deref());
        let total: i64 = count.build_query_scalar().fetch_one(&self.db).await?;

        Ok(PaginatedResponse::from_page(users, pagination, total.max(0) as u64))
    }

    pub async fn create(&self, actor: &Actor, input: UserInput) -> AppResult<User> {
        actor.authorize(Resource::User, Action::Create)?;
        input.validate()?;
        validation::validate_new_password(input.password.as_deref())?;
        Self::check_role(input.role)?;
        self.ensure_unique(
            input.username.trim(),
            validation::non_blank(input.email.clone()).as_deref(),
            None,
        )
        .await?;

        let password_hash = hash_password(input.password.as_deref().unwrap_or_default())?;
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, name, username, email, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(input.name.trim())
        .bind(input.username.trim())
        .bind(validation::non_blank(input.email.clone()))
        .bind(password_hash)
        .bind(input.role)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "User created");
        self.audit
            .record(AuditEvent::by(
                actor,
                AuditAction::Created,
                MODULE,
                format!("Admin created user: {} (ID: {})", user.name, user.id),
            ))
            .await;

        Ok(user)
    }

    /// A blank password keeps the current one.
    pub async fn update(&self, actor: &Actor, id: Uuid, input: UserInput) -> AppResult<User> {
        actor.authorize(Resource::User, Action::Edit)?;
        let input = UserInput {
            password: validation::non_blank(input.password),
            ..input
        };
        input.validate()?;
        Self::check_role(input.role)?;
        self.ensure_unique(
            input.username.trim(),
            validation::non_blank(input.email.clone()).as_deref(),
            Some(id),
        )
        .await?;

        let password_hash = input.password.as_deref().map(hash_password).transpose()?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = $2, username = $3, email = $4, role = $5,
                password_hash = COALESCE($6, password_hash), updated_at = $7
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(input.name.trim())
        .bind(input.username.trim())
        .bind(validation::non_blank(input.email.clone()))
        .bind(input.role)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        self.audit
            .record(AuditEvent::by(
                actor,
                AuditAction::Updated,
                MODULE,
                format!("Admin updated user: {} (ID: {})", user.name, user.id),
            ))
            .await;

        Ok(user)
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> AppResult<()> {
        actor.authorize(Resource::User, Action::Delete)?;

        if actor.user_id == id {
            return Err(AppError::Conflict {
                resource: "user".to_string(),
                message: "You cannot delete your own account".to_string(),
            });
        }

        let name: String = sqlx::query_scalar("DELETE FROM users WHERE id = $1 RETURNING name")
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        self.audit
            .record(AuditEvent::by(
                actor,
                AuditAction::Deleted,
                MODULE,
                format!("Admin deleted user: {} (ID: {})", name, id),
            ))
            .await;

        Ok(())
    }

    /// Self-service edit of the caller's own name, username, email and
    /// password. Open to every role; the role itself cannot be changed here.
    pub async fn update_profile(&self, actor: &Actor, input: ProfileInput) -> AppResult<User> {
        actor.authorize(Resource::Profile, Action::Edit)?;
        let input = input.normalized();
        input.validate()?;
        input.check_confirmation()?;
        self.ensure_unique(&input.username, input.email.as_deref(), Some(actor.user_id))
            .await?;

        let password_hash = input.password.as_deref().map(hash_password).transpose()?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = $2, username = $3, email = $4,
                password_hash = COALESCE($5, password_hash), updated_at = $6
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(actor.user_id)
        .bind(&input.name)
        .bind(&input.username)
        .bind(&input.email)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        tracing::info!(user_id = %user.id, password_changed = input.password.is_some(), "Profile updated");
        self.audit
            .record(AuditEvent::by(
                actor,
                AuditAction::Updated,
                MODULE,
                "User updated own profile".to_string(),
            ))
            .await;

        Ok(user)
    }
}
