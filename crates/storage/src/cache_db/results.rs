// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Result Cache operations (`spec.md` §4.2): the per-`(input_file,
//! content_hash, output_metadata)` store of previously-produced
//! artifacts, keyed so a worker can skip re-executing work whose inputs
//! have not changed.

use super::CacheDb;
use crate::error::StorageError;
use crate::retry::with_retry;
use crate::sqlite::now_ms;
use clxo_core::{CachedResult, CorrelationId, OutputMetadata, RetryPolicy, StoredResult};
use sqlx::Row;

/// The three-part lookup key shared by every Result Cache and issue-log
/// query.
#[derive(Debug, Clone)]
pub struct GetResultKey<'a> {
    pub input_file: &'a str,
    pub content_hash: &'a str,
    pub output_metadata: &'a OutputMetadata,
}

fn row_to_result(row: &sqlx::sqlite::SqliteRow) -> Result<StoredResult, StorageError> {
    let kind: String = row.try_get("result_kind").map_err(StorageError::from)?;
    let blob: Vec<u8> = row.try_get("result_blob").map_err(StorageError::from)?;
    let result = match kind.as_str() {
        "notebook-result" => CachedResult::Notebook(
            String::from_utf8(blob)
                .map_err(|e| StorageError::Integrity(format!("non-utf8 notebook result: {e}")))?,
        ),
        "image-result" => CachedResult::Image(blob),
        other => return Err(StorageError::Integrity(format!("unknown result_kind {other}"))),
    };

    Ok(StoredResult {
        input_file: row.try_get("input_file").map_err(StorageError::from)?,
        content_hash: row.try_get("content_hash").map_err(StorageError::from)?,
        output_metadata: OutputMetadata::new(
            row.try_get::<String, _>("output_metadata")
                .map_err(StorageError::from)?,
        ),
        correlation_id: CorrelationId::from_string(
            row.try_get::<String, _>("correlation_id")
                .map_err(StorageError::from)?,
        ),
        source_file: row.try_get("source_file").map_err(StorageError::from)?,
        result,
        stored_at_ms: row.try_get::<i64, _>("stored_at_ms").map_err(StorageError::from)? as u64,
    })
}

impl CacheDb {
    /// Most recently stored result for the given key, or `None` on a
    /// cache miss.
    pub async fn get_result(&self, key: GetResultKey<'_>) -> Result<Option<StoredResult>, StorageError> {
        let row = sqlx::query(
            "SELECT * FROM results WHERE input_file = ? AND content_hash = ? AND output_metadata = ?
             ORDER BY stored_at_ms DESC LIMIT 1",
        )
        .bind(key.input_file)
        .bind(key.content_hash)
        .bind(key.output_metadata.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from)?;

        row.as_ref().map(row_to_result).transpose()
    }

    /// Store a newly produced result as the latest version for its key,
    /// keeping at most `retain_count` versions (`spec.md` §4.2) — older
    /// ones are pruned in the same transaction as the insert rather than
    /// left to accumulate until the next `cleanup_all` pass. A successful
    /// run for a key invalidates any previously stored user error for
    /// that same key (`spec.md` §8 invariant 3: at most one fresh result
    /// OR one stored error per key) — stale errors are deleted, not just
    /// superseded.
    pub async fn store_latest_result(&self, result: &StoredResult, retain_count: u32) -> Result<(), StorageError> {
        let (kind, blob): (&'static str, Vec<u8>) = match &result.result {
            CachedResult::Notebook(s) => ("notebook-result", s.clone().into_bytes()),
            CachedResult::Image(b) => ("image-result", b.clone()),
        };
        let input_file = result.input_file.clone();
        let content_hash = result.content_hash.clone();
        let output_metadata = result.output_metadata.as_str().to_string();
        let correlation_id = result.correlation_id.as_str().to_string();
        let source_file = result.source_file.clone();

        with_retry(RetryPolicy::database_busy(), || async {
            let mut tx = self.pool.begin().await.map_err(StorageError::from)?;

            sqlx::query(
                "INSERT INTO results
                    (input_file, content_hash, output_metadata, correlation_id, source_file,
                     result_kind, result_blob, stored_at_ms)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&input_file)
            .bind(&content_hash)
            .bind(&output_metadata)
            .bind(&correlation_id)
            .bind(&source_file)
            .bind(kind)
            .bind(&blob)
            .bind(now_ms() as i64)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;

            sqlx::query(
                "DELETE FROM stored_issues
                 WHERE issue_kind = 'error' AND input_file = ? AND content_hash = ? AND output_metadata = ?",
            )
            .bind(&input_file)
            .bind(&content_hash)
            .bind(&output_metadata)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;

            sqlx::query(
                "DELETE FROM results WHERE rowid IN (
                    SELECT rowid FROM (
                        SELECT rowid, ROW_NUMBER() OVER (ORDER BY stored_at_ms DESC) AS rn
                        FROM results
                        WHERE input_file = ? AND content_hash = ? AND output_metadata = ?
                    ) WHERE rn > ?
                )",
            )
            .bind(&input_file)
            .bind(&content_hash)
            .bind(&output_metadata)
            .bind(retain_count as i64)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;

            tx.commit().await.map_err(StorageError::from)?;
            Ok(())
        })
        .await
    }

    /// Keep only the newest `keep` versions per `(input_file,
    /// content_hash, output_metadata)` key.
    pub(super) async fn prune_excess_result_versions(&self, keep: u32) -> Result<u64, StorageError> {
        let deleted = sqlx::query(
            "DELETE FROM results WHERE rowid IN (
                SELECT rowid FROM (
                    SELECT rowid, ROW_NUMBER() OVER (
                        PARTITION BY input_file, content_hash, output_metadata
                        ORDER BY stored_at_ms DESC
                    ) AS rn
                    FROM results
                ) WHERE rn > ?
            )",
        )
        .bind(keep as i64)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?
        .rows_affected();
        Ok(deleted)
    }
}

#[cfg(test)]
#[path = "results_tests.rs"]
mod tests;
