//! Key/value repository over the storage table.
//!
//! Multi-key writes run in a transaction so a session is never half written.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;

/// Persistent string storage.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Read one value.
    pub async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let row = sqlx::query("SELECT value FROM storage WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| row.get("value")))
    }

    /// Write one value, replacing any previous one.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.set_many(&[(key, value)]).await
    }

    /// Write several values atomically.
    pub async fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        for (key, value) in entries {
            sqlx::query(
                "INSERT INTO storage (key, value, updated_at) VALUES (?, ?, ?)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            )
            .bind(key)
            .bind(value)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Remove every key except `preserved`, then optionally write `entries`,
    /// all in one transaction.
    pub async fn replace_all(
        &self,
        preserved: &[&str],
        entries: &[(&str, &str)],
    ) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        let keys: Vec<String> = sqlx::query("SELECT key FROM storage")
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .map(|row| row.get("key"))
            .collect();

        for key in keys.iter().filter(|k| !preserved.contains(&k.as_str())) {
            sqlx::query("DELETE FROM storage WHERE key = ?")
                .bind(key)
                .execute(&mut *tx)
                .await?;
        }

        for (key, value) in entries {
            sqlx::query(
                "INSERT INTO storage (key, value, updated_at) VALUES (?, ?, ?)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            )
            .bind(key)
            .bind(value)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Remove every key except `preserved`.
    pub async fn clear_except(&self, preserved: &[&str]) -> Result<(), AppError> {
        self.replace_all(preserved, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use tempfile::TempDir;

    async fn repo() -> (Repository, TempDir) {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("kv.sqlite")).await.unwrap();
        (Repository::new(pool), dir)
    }

    #[tokio::test]
    async fn test_set_get_overwrite() {
        let (repo, _dir) = repo().await;

        assert_eq!(repo.get("token").await.unwrap(), None);
        repo.set("token", "abc").await.unwrap();
        assert_eq!(repo.get("token").await.unwrap().as_deref(), Some("abc"));
        repo.set("token", "def").await.unwrap();
        assert_eq!(repo.get("token").await.unwrap().as_deref(), Some("def"));
    }

    #[tokio::test]
    async fn test_clear_except_keeps_preserved_keys() {
        let (repo, _dir) = repo().await;

        repo.set_many(&[("token", "t"), ("userid", "u1"), ("activeComponent", "ContactUs")])
            .await
            .unwrap();
        repo.clear_except(&["activeComponent"]).await.unwrap();

        assert_eq!(repo.get("token").await.unwrap(), None);
        assert_eq!(repo.get("userid").await.unwrap(), None);
        assert_eq!(
            repo.get("activeComponent").await.unwrap().as_deref(),
            Some("ContactUs")
        );
    }
}
