// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stored-issue log (`spec.md` §4.2, §4.8): cacheable errors and
//! handler-produced warnings, keyed the same way as the Result Cache so
//! a cache hit can replay the warnings a prior run produced alongside
//! its output.

use super::results::GetResultKey;
use super::CacheDb;
use crate::error::StorageError;
use crate::retry::with_retry;
use crate::sqlite::now_ms;
use clxo_core::{ErrorType, IssueSeverity, RetryPolicy, StoredIssue, Warning};
use sqlx::Row;

/// Either a cached error or a cached warning for a given key — both
/// live in `stored_issues`, distinguished by `issue_kind`.
#[derive(Debug, Clone)]
pub enum CachedIssue {
    Error(StoredIssue),
    Warning(Warning),
}

fn parse_severity(s: &str) -> Result<IssueSeverity, StorageError> {
    match s {
        "warning" => Ok(IssueSeverity::Warning),
        "error" => Ok(IssueSeverity::Error),
        "fatal" => Ok(IssueSeverity::Fatal),
        other => Err(StorageError::Integrity(format!("unknown severity {other}"))),
    }
}

impl CacheDb {
    /// Persist a `User` error for the given key. Callers are expected to
    /// check `ErrorType::is_cacheable` before calling this — storing a
    /// non-`User` error here would make a configuration or
    /// infrastructure failure look permanently reproducible.
    pub async fn store_error(&self, issue: &StoredIssue) -> Result<(), StorageError> {
        debug_assert!(
            issue.error_type.is_cacheable(),
            "only User errors may be cached"
        );
        let input_file = issue.input_file.clone();
        let content_hash = issue.content_hash.clone();
        let output_metadata = issue.output_metadata.as_str().to_string();
        let error_type = issue.error_type.as_str();
        let category = issue.category.clone();
        let severity = issue.severity.as_str();
        let message = issue.message.clone();
        let file_path = issue.file_path.clone();
        let guidance = issue.guidance.clone();

        with_retry(RetryPolicy::database_busy(), || async {
            sqlx::query(
                "INSERT INTO stored_issues
                    (input_file, content_hash, output_metadata, issue_kind, error_type,
                     category, severity, message, file_path, guidance, stored_at_ms)
                 VALUES (?, ?, ?, 'error', ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&input_file)
            .bind(&content_hash)
            .bind(&output_metadata)
            .bind(error_type)
            .bind(&category)
            .bind(severity)
            .bind(&message)
            .bind(&file_path)
            .bind(&guidance)
            .bind(now_ms() as i64)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
            Ok(())
        })
        .await
    }

    pub async fn store_warning(
        &self,
        key: GetResultKey<'_>,
        warning: &Warning,
    ) -> Result<(), StorageError> {
        let input_file = key.input_file.to_string();
        let content_hash = key.content_hash.to_string();
        let output_metadata = key.output_metadata.as_str().to_string();
        let category = warning.category.clone();
        let severity = warning.severity.as_str();
        let message = warning.message.clone();
        let file_path = warning.file_path.clone();

        with_retry(RetryPolicy::database_busy(), || async {
            sqlx::query(
                "INSERT INTO stored_issues
                    (input_file, content_hash, output_metadata, issue_kind, error_type,
                     category, severity, message, file_path, guidance, stored_at_ms)
                 VALUES (?, ?, ?, 'warning', NULL, ?, ?, ?, ?, NULL, ?)",
            )
            .bind(&input_file)
            .bind(&content_hash)
            .bind(&output_metadata)
            .bind(&category)
            .bind(severity)
            .bind(&message)
            .bind(&file_path)
            .bind(now_ms() as i64)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
            Ok(())
        })
        .await
    }

    pub async fn get_issues(&self, key: GetResultKey<'_>) -> Result<Vec<CachedIssue>, StorageError> {
        let rows = sqlx::query(
            "SELECT * FROM stored_issues WHERE input_file = ? AND content_hash = ? AND output_metadata = ?
             ORDER BY stored_at_ms ASC",
        )
        .bind(key.input_file)
        .bind(key.content_hash)
        .bind(key.output_metadata.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::from)?;

        rows.iter()
            .map(|row| {
                let issue_kind: String = row.try_get("issue_kind").map_err(StorageError::from)?;
                let severity = parse_severity(
                    &row.try_get::<String, _>("severity")
                        .map_err(StorageError::from)?,
                )?;
                let category: String = row.try_get("category").map_err(StorageError::from)?;
                let message: String = row.try_get("message").map_err(StorageError::from)?;
                let file_path: Option<String> =
                    row.try_get("file_path").map_err(StorageError::from)?;
                let guidance: Option<String> =
                    row.try_get("guidance").map_err(StorageError::from)?;

                if issue_kind == "error" {
                    let error_type_s: String =
                        row.try_get("error_type").map_err(StorageError::from)?;
                    let error_type = match error_type_s.as_str() {
                        "user" => ErrorType::User,
                        "configuration" => ErrorType::Configuration,
                        "infrastructure" => ErrorType::Infrastructure,
                        other => {
                            return Err(StorageError::Integrity(format!(
                                "unknown error_type {other}"
                            )))
                        }
                    };
                    Ok(CachedIssue::Error(StoredIssue {
                        input_file: row.try_get("input_file").map_err(StorageError::from)?,
                        content_hash: row.try_get("content_hash").map_err(StorageError::from)?,
                        output_metadata: clxo_core::OutputMetadata::new(
                            row.try_get::<String, _>("output_metadata")
                                .map_err(StorageError::from)?,
                        ),
                        error_type,
                        category,
                        severity,
                        message,
                        file_path,
                        guidance: guidance.unwrap_or_default(),
                        stored_at_ms: row
                            .try_get::<i64, _>("stored_at_ms")
                            .map_err(StorageError::from)? as u64,
                    }))
                } else {
                    Ok(CachedIssue::Warning(Warning {
                        category,
                        message,
                        severity,
                        file_path,
                    }))
                }
            })
            .collect()
    }

    pub(super) async fn prune_stale_issues(&self, issues_days: u32) -> Result<u64, StorageError> {
        let cutoff = now_ms() as i64 - issues_days as i64 * 86_400_000;
        let deleted = sqlx::query("DELETE FROM stored_issues WHERE stored_at_ms < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?
            .rows_affected();
        Ok(deleted)
    }
}

#[cfg(test)]
#[path = "issues_tests.rs"]
mod tests;
