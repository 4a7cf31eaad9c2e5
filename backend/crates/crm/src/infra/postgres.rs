//! PostgreSQL Implementation

use auth::UserId;
use chrono::{DateTime, Utc};
use kernel::error::conversions::is_unique_violation;
use kernel::id::{RegistrationId, RegistrationNoteId};
use kernel::page::PageRequest;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{NoteView, Registration, RegistrationNote, RegistrationStatus};
use crate::domain::repository::{NoteRepository, RegistrationFilter, RegistrationRepository};
use crate::error::{CrmError, CrmResult};

const REGISTRATION_COLUMNS: &str = r#"
    registration_id,
    full_name,
    email,
    phone,
    city,
    interests,
    message,
    source,
    status,
    client_ip,
    created_at,
    updated_at
"#;

/// `$1` status code or NULL, `$2` ILIKE pattern or NULL
const FILTER_CLAUSE: &str = r#"
    ($1::text IS NULL OR status = $1)
    AND (
        $2::text IS NULL
        OR full_name ILIKE $2
        OR email ILIKE $2
        OR COALESCE(city, '') ILIKE $2
    )
"#;

#[derive(Clone)]
pub struct PgCrmStore {
    pool: PgPool,
}

impl PgCrmStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `%term%` with LIKE wildcards in the term escaped
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// ============================================================================
// Registrations
// ============================================================================

impl RegistrationRepository for PgCrmStore {
    async fn has_open_registration(
        &self,
        email: &str,
        except: Option<RegistrationId>,
    ) -> CrmResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM crm_registrations
                WHERE email = $1
                  AND status IN ('new', 'contacted')
                  AND ($2::uuid IS NULL OR registration_id <> $2)
            )
            "#,
        )
        .bind(email)
        .bind(except.map(RegistrationId::into_uuid))
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create_registration(&self, registration: &Registration) -> CrmResult<()> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO crm_registrations (
                registration_id,
                full_name,
                email,
                phone,
                city,
                interests,
                message,
                source,
                status,
                client_ip,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(registration.id.as_uuid())
        .bind(&registration.full_name)
        .bind(&registration.email)
        .bind(&registration.phone)
        .bind(&registration.city)
        .bind(&registration.interests)
        .bind(&registration.message)
        .bind(&registration.source)
        .bind(registration.status.code())
        .bind(&registration.client_ip)
        .bind(registration.created_at)
        .bind(registration.updated_at)
        .execute(&self.pool)
        .await;

        match inserted {
            Err(e) if is_unique_violation(&e) => Err(CrmError::DuplicateRegistration),
            other => other.map(|_| ()).map_err(CrmError::from),
        }
    }

    async fn find_registration(&self, id: RegistrationId) -> CrmResult<Option<Registration>> {
        let sql = format!(
            "SELECT {REGISTRATION_COLUMNS} FROM crm_registrations WHERE registration_id = $1"
        );
        let row = sqlx::query_as::<_, RegistrationRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(RegistrationRow::into_registration).transpose()
    }

    async fn list_registrations(
        &self,
        filter: &RegistrationFilter,
        page: PageRequest,
    ) -> CrmResult<(Vec<Registration>, i64)> {
        let status = filter.status.map(|s| s.code());
        let pattern = filter.search.as_deref().map(like_pattern);

        let sql = format!(
            "SELECT {REGISTRATION_COLUMNS} FROM crm_registrations \
             WHERE {FILTER_CLAUSE} \
             ORDER BY created_at DESC \
             LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query_as::<_, RegistrationRow>(&sql)
            .bind(status)
            .bind(&pattern)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM crm_registrations WHERE {FILTER_CLAUSE}");
        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(status)
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        let items = rows
            .into_iter()
            .map(RegistrationRow::into_registration)
            .collect::<CrmResult<Vec<_>>>()?;
        Ok((items, total))
    }

    async fn set_status(
        &self,
        id: RegistrationId,
        status: RegistrationStatus,
        updated_at: DateTime<Utc>,
    ) -> CrmResult<()> {
        let updated = sqlx::query(
            "UPDATE crm_registrations SET status = $2, updated_at = $3 WHERE registration_id = $1",
        )
        .bind(id.as_uuid())
        .bind(status.code())
        .bind(updated_at)
        .execute(&self.pool)
        .await;

        match updated {
            Err(e) if is_unique_violation(&e) => Err(CrmError::DuplicateRegistration),
            Err(e) => Err(e.into()),
            Ok(result) if result.rows_affected() == 0 => Err(CrmError::NotFound("Registration")),
            Ok(_) => Ok(()),
        }
    }

    async fn count_by_status(&self) -> CrmResult<Vec<(RegistrationStatus, i64)>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM crm_registrations GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(code, count)| Ok((parse_status(&code)?, count)))
            .collect()
    }
}

// ============================================================================
// Notes
// ============================================================================

impl NoteRepository for PgCrmStore {
    async fn add_note(&self, note: &RegistrationNote) -> CrmResult<()> {
        sqlx::query(
            r#"
            INSERT INTO crm_registration_notes (note_id, registration_id, author_id, body, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(note.id.as_uuid())
        .bind(note.registration_id.as_uuid())
        .bind(note.author_id.map(UserId::into_uuid))
        .bind(&note.body)
        .bind(note.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_notes(&self, registration_id: RegistrationId) -> CrmResult<Vec<NoteView>> {
        let rows = sqlx::query_as::<_, NoteRow>(
            r#"
            SELECT n.note_id, n.registration_id, n.author_id, n.body, n.created_at,
                   u.user_name AS author_name
            FROM crm_registration_notes n
            LEFT JOIN users u ON u.user_id = n.author_id
            WHERE n.registration_id = $1
            ORDER BY n.created_at
            "#,
        )
        .bind(registration_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(NoteRow::into_view).collect())
    }
}

// ============================================================================
// Rows
// ============================================================================

fn parse_status(code: &str) -> CrmResult<RegistrationStatus> {
    RegistrationStatus::from_code(code)
        .ok_or_else(|| CrmError::Internal(format!("Invalid registration status: {code}")))
}

#[derive(sqlx::FromRow)]
struct RegistrationRow {
    registration_id: Uuid,
    full_name: String,
    email: String,
    phone: Option<String>,
    city: Option<String>,
    interests: Vec<String>,
    message: String,
    source: Option<String>,
    status: String,
    client_ip: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RegistrationRow {
    fn into_registration(self) -> CrmResult<Registration> {
        Ok(Registration {
            id: RegistrationId::from_uuid(self.registration_id),
            full_name: self.full_name,
            email: self.email,
            phone: self.phone,
            city: self.city,
            interests: self.interests,
            message: self.message,
            source: self.source,
            status: parse_status(&self.status)?,
            client_ip: self.client_ip,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct NoteRow {
    note_id: Uuid,
    registration_id: Uuid,
    author_id: Option<Uuid>,
    body: String,
    created_at: DateTime<Utc>,
    author_name: Option<String>,
}

impl NoteRow {
    fn into_view(self) -> NoteView {
        NoteView {
            note: RegistrationNote {
                id: RegistrationNoteId::from_uuid(self.note_id),
                registration_id: RegistrationId::from_uuid(self.registration_id),
                author_id: self.author_id.map(UserId::from_uuid),
                body: self.body,
                created_at: self.created_at,
            },
            author_name: self.author_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("anna"), "%anna%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
