//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::error::conversions::is_unique_violation;
use platform::password::HashedPassword;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{auth_session::AuthSession, credential::Credential, user::User};
use crate::domain::repository::{AuthSessionRepository, CredentialRepository, UserRepository};
use crate::domain::value_object::{
    public_id::PublicId, user_id::UserId, user_name::UserName, user_role::UserRole,
    user_status::UserStatus,
};
use crate::error::{AuthError, AuthResult};

const USER_COLUMNS: &str = r#"
    user_id,
    public_id,
    user_name,
    user_role,
    user_status,
    last_login_at,
    created_at,
    updated_at
"#;

const SESSION_COLUMNS: &str = r#"
    session_id,
    user_id,
    expires_at_ms,
    remember_me,
    client_fingerprint_hash,
    client_ip,
    user_agent,
    created_at,
    last_activity_at
"#;

#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn cleanup_expired(&self) -> AuthResult<u64> {
        let now_ms = Utc::now().timestamp_millis();

        let deleted = sqlx::query("DELETE FROM auth_sessions WHERE expires_at_ms < $1")
            .bind(now_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(sessions_deleted = deleted, "Cleaned up expired auth sessions");

        Ok(deleted)
    }

    async fn fetch_user(&self, clause: &str, value: &str) -> AuthResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {clause} = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_user).transpose()
    }
}

// ============================================================================
// Users
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn create(&self, user: &User, credential: &Credential) -> AuthResult<()> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                public_id,
                user_name,
                user_name_canonical,
                user_role,
                user_status,
                last_login_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.public_id.as_str())
        .bind(user.user_name.original())
        .bind(user.user_name.canonical())
        .bind(user.user_role.id())
        .bind(user.user_status.id())
        .bind(user.last_login_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await;

        match inserted {
            Err(e) if is_unique_violation(&e) => return Err(AuthError::UserNameTaken),
            other => other?,
        };

        sqlx::query(
            r#"
            INSERT INTO auth_credentials (
                user_id,
                password_hash,
                login_failed_count,
                last_failed_at,
                locked_until,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(credential.user_id.as_uuid())
        .bind(credential.password_hash.as_phc_string())
        .bind(credential.login_failed_count as i16)
        .bind(credential.last_failed_at)
        .bind(credential.locked_until)
        .bind(credential.created_at)
        .bind(credential.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_by_public_id(&self, public_id: &PublicId) -> AuthResult<Option<User>> {
        self.fetch_user("public_id", public_id.as_str()).await
    }

    async fn find_by_user_name(&self, user_name: &UserName) -> AuthResult<Option<User>> {
        self.fetch_user("user_name_canonical", user_name.canonical())
            .await
    }

    async fn exists_by_user_name(&self, user_name: &UserName) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE user_name_canonical = $1)",
        )
        .bind(user_name.canonical())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                user_role = $2,
                user_status = $3,
                last_login_at = $4,
                updated_at = $5
            WHERE user_id = $1
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.user_role.id())
        .bind(user.user_status.id())
        .bind(user.last_login_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_role(&self, user_id: &UserId, role: UserRole) -> AuthResult<()> {
        let updated =
            sqlx::query("UPDATE users SET user_role = $2, updated_at = now() WHERE user_id = $1")
                .bind(user_id.as_uuid())
                .bind(role.id())
                .execute(&self.pool)
                .await?
                .rows_affected();

        if updated == 0 {
            return Err(AuthError::UserNotFound);
        }
        Ok(())
    }
}

// ============================================================================
// Credentials
// ============================================================================

impl CredentialRepository for PgAuthRepository {
    async fn find_by_user_id(&self, user_id: &UserId) -> AuthResult<Option<Credential>> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT
                user_id,
                password_hash,
                login_failed_count,
                last_failed_at,
                locked_until,
                created_at,
                updated_at
            FROM auth_credentials
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(CredentialRow::into_credential).transpose()
    }

    async fn update(&self, credential: &Credential) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE auth_credentials SET
                password_hash = $2,
                login_failed_count = $3,
                last_failed_at = $4,
                locked_until = $5,
                updated_at = $6
            WHERE user_id = $1
            "#,
        )
        .bind(credential.user_id.as_uuid())
        .bind(credential.password_hash.as_phc_string())
        .bind(credential.login_failed_count as i16)
        .bind(credential.last_failed_at)
        .bind(credential.locked_until)
        .bind(credential.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Sessions
// ============================================================================

impl AuthSessionRepository for PgAuthRepository {
    async fn create(&self, session: &AuthSession) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_sessions (
                session_id,
                user_id,
                expires_at_ms,
                remember_me,
                client_fingerprint_hash,
                client_ip,
                user_agent,
                created_at,
                last_activity_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(session.session_id)
        .bind(session.user_id.as_uuid())
        .bind(session.expires_at_ms)
        .bind(session.remember_me)
        .bind(&session.client_fingerprint_hash)
        .bind(&session.client_ip)
        .bind(&session.user_agent)
        .bind(session.created_at)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, session_id: Uuid) -> AuthResult<Option<AuthSession>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM auth_sessions WHERE session_id = $1 AND expires_at_ms > $2"
        );
        let row = sqlx::query_as::<_, AuthSessionRow>(&sql)
            .bind(session_id)
            .bind(Utc::now().timestamp_millis())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(AuthSessionRow::into_session))
    }

    async fn update(&self, session: &AuthSession) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE auth_sessions SET
                expires_at_ms = $2,
                last_activity_at = $3
            WHERE session_id = $1
            "#,
        )
        .bind(session.session_id)
        .bind(session.expires_at_ms)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, session_id: Uuid) -> AuthResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_all_for_user(&self, user_id: &UserId) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM auth_sessions WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        PgAuthRepository::cleanup_expired(self).await
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    public_id: String,
    user_name: String,
    user_role: i16,
    user_status: i16,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let public_id = PublicId::parse_str(&self.public_id)
            .map_err(|e| AuthError::Internal(format!("Invalid public_id: {}", e)))?;
        let user_role = UserRole::from_id(self.user_role)
            .ok_or_else(|| AuthError::Internal(format!("Invalid user_role: {}", self.user_role)))?;
        let user_status = UserStatus::from_id(self.user_status).ok_or_else(|| {
            AuthError::Internal(format!("Invalid user_status: {}", self.user_status))
        })?;

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            public_id,
            user_name: UserName::from_db(self.user_name),
            user_role,
            user_status,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    user_id: Uuid,
    password_hash: String,
    login_failed_count: i16,
    last_failed_at: Option<DateTime<Utc>>,
    locked_until: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CredentialRow {
    fn into_credential(self) -> AuthResult<Credential> {
        let password_hash = HashedPassword::from_phc_string(self.password_hash)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(Credential {
            user_id: UserId::from_uuid(self.user_id),
            password_hash,
            login_failed_count: self.login_failed_count.max(0) as u16,
            last_failed_at: self.last_failed_at,
            locked_until: self.locked_until,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AuthSessionRow {
    session_id: Uuid,
    user_id: Uuid,
    expires_at_ms: i64,
    remember_me: bool,
    client_fingerprint_hash: Vec<u8>,
    client_ip: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
}

impl AuthSessionRow {
    fn into_session(self) -> AuthSession {
        AuthSession {
            session_id: self.session_id,
            user_id: UserId::from_uuid(self.user_id),
            expires_at_ms: self.expires_at_ms,
            remember_me: self.remember_me,
            client_fingerprint_hash: self.client_fingerprint_hash,
            client_ip: self.client_ip,
            user_agent: self.user_agent,
            created_at: self.created_at,
            last_activity_at: self.last_activity_at,
        }
    }
}
