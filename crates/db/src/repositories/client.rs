use chrono::Utc;
use sqlx::Row;

use voxdesk_core::domain::{ClientProfile, ClientRecord, ClientSlug};

use super::{ensure_same_slug, ClientRepository, RepositoryError};
use crate::DbPool;

pub struct SqlClientRepository {
    pool: DbPool,
}

impl SqlClientRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Row count of the client table; fails when the schema has not been migrated.
pub async fn client_count(pool: &DbPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM client").fetch_one(pool).await
}

fn encode_profile(profile: &ClientProfile) -> Result<String, RepositoryError> {
    serde_json::to_string(profile).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<ClientRecord, RepositoryError> {
    let slug: String = row.try_get("slug").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let profile_json: String =
        row.try_get("profile_json").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let prompt: String =
        row.try_get("prompt").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let profile: ClientProfile = serde_json::from_str(&profile_json)
        .map_err(|e| RepositoryError::Decode(format!("client `{slug}` profile: {e}")))?;

    Ok(ClientRecord { profile, prompt })
}

#[async_trait::async_trait]
impl ClientRepository for SqlClientRepository {
    async fn create(&self, record: ClientRecord) -> Result<(), RepositoryError> {
        let now = Utc::now().to_rfc3339();
        let slug = record.profile.slug.to_string();
        let profile_json = encode_profile(&record.profile)?;

        let result = sqlx::query(
            "INSERT INTO client (slug, business_name, profile_json, prompt, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&slug)
        .bind(&record.profile.business_name)
        .bind(&profile_json)
        .bind(&record.prompt)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_error)) if db_error.is_unique_violation() => {
                Err(RepositoryError::AlreadyExists(slug))
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn find(&self, slug: &ClientSlug) -> Result<Option<ClientRecord>, RepositoryError> {
        let row = sqlx::query("SELECT slug, profile_json, prompt FROM client WHERE slug = ?")
            .bind(slug.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_record(r)?)),
            None => Ok(None),
        }
    }

    async fn write(
        &self,
        slug: &ClientSlug,
        profile: &ClientProfile,
        prompt: Option<&str>,
    ) -> Result<(), RepositoryError> {
        ensure_same_slug(slug, profile)?;
        let profile_json = encode_profile(profile)?;

        let result = sqlx::query(
            "UPDATE client
             SET business_name = ?,
                 profile_json = ?,
                 prompt = COALESCE(?, prompt),
                 updated_at = ?
             WHERE slug = ?",
        )
        .bind(&profile.business_name)
        .bind(&profile_json)
        .bind(prompt)
        .bind(Utc::now().to_rfc3339())
        .bind(slug.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(slug.to_string()));
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ClientRecord>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT slug, profile_json, prompt FROM client ORDER BY created_at ASC, slug ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_record).collect::<Result<Vec<_>, _>>()
    }
}
