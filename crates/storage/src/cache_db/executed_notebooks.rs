// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executed-notebook cache (`spec.md` §4.2's `incremental` mode,
//! supplemented from the original implementation's notebook-execution
//! reuse): caches the *executed* notebook — cell outputs included —
//! separately from the rendered artifact, so a later job asking for a
//! different `OutputFormat` of the same content hash can skip
//! re-executing code cells and go straight to rendering.

use super::CacheDb;
use crate::error::StorageError;
use crate::retry::with_retry;
use crate::sqlite::now_ms;
use clxo_core::RetryPolicy;

impl CacheDb {
    pub async fn get_executed_notebook(
        &self,
        input_file: &str,
        content_hash: &str,
        language: &str,
        prog_lang: &str,
    ) -> Result<Option<String>, StorageError> {
        let notebook: Option<String> = sqlx::query_scalar(
            "SELECT notebook_blob FROM executed_notebooks
             WHERE input_file = ? AND content_hash = ? AND language = ? AND prog_lang = ?",
        )
        .bind(input_file)
        .bind(content_hash)
        .bind(language)
        .bind(prog_lang)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from)?;
        Ok(notebook)
    }

    pub async fn store_executed_notebook(
        &self,
        input_file: &str,
        content_hash: &str,
        language: &str,
        prog_lang: &str,
        notebook_json: &str,
    ) -> Result<(), StorageError> {
        let input_file = input_file.to_string();
        let content_hash = content_hash.to_string();
        let language = language.to_string();
        let prog_lang = prog_lang.to_string();
        let notebook_json = notebook_json.to_string();

        with_retry(RetryPolicy::database_busy(), || async {
            sqlx::query(
                "INSERT INTO executed_notebooks
                    (input_file, content_hash, language, prog_lang, notebook_blob, stored_at_ms)
                 VALUES (?, ?, ?, ?, ?, ?)
                 ON CONFLICT (input_file, content_hash, language, prog_lang) DO UPDATE SET
                    notebook_blob = excluded.notebook_blob, stored_at_ms = excluded.stored_at_ms",
            )
            .bind(&input_file)
            .bind(&content_hash)
            .bind(&language)
            .bind(&prog_lang)
            .bind(&notebook_json)
            .bind(now_ms() as i64)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
            Ok(())
        })
        .await
    }

    /// Drop every cached execution for `input_file` whose content hash is
    /// no longer `current_content_hash` — once the source changes, a
    /// stale execution can never again be reused.
    pub async fn prune_stale_hashes(
        &self,
        input_file: &str,
        current_content_hash: &str,
    ) -> Result<u64, StorageError> {
        let deleted = sqlx::query(
            "DELETE FROM executed_notebooks WHERE input_file = ? AND content_hash != ?",
        )
        .bind(input_file)
        .bind(current_content_hash)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?
        .rows_affected();
        Ok(deleted)
    }
}

#[cfg(test)]
#[path = "executed_notebooks_tests.rs"]
mod tests;
