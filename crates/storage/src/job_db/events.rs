// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only worker event log (`spec.md` §4.3) — registration,
//! heartbeat-missed, hang-detected, and shutdown events, consulted by
//! `status`/`monitor` CLI surfaces and by tests asserting on pool
//! behavior without scraping logs.

use super::JobDb;
use crate::error::StorageError;
use crate::retry::with_retry;
use crate::sqlite::now_ms;
use clxo_core::{RetryPolicy, WorkerId};
use serde::Serialize;
use sqlx::Row;

#[derive(Debug, Clone)]
pub struct WorkerEvent {
    pub at_ms: u64,
    pub event_type: String,
    pub worker_id: Option<WorkerId>,
    pub detail: Option<String>,
}

impl JobDb {
    pub async fn append_event(
        &self,
        event_type: &str,
        worker_id: Option<&WorkerId>,
        detail: &impl Serialize,
    ) -> Result<(), StorageError> {
        let detail_blob = serde_json::to_string(detail)?;
        let event_type = event_type.to_string();
        let worker_id_s = worker_id.map(|id| id.as_str().to_string());

        with_retry(RetryPolicy::database_busy(), || async {
            sqlx::query(
                "INSERT INTO worker_events (at_ms, event_type, worker_id, detail_blob)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(now_ms() as i64)
            .bind(&event_type)
            .bind(&worker_id_s)
            .bind(&detail_blob)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
            Ok(())
        })
        .await
    }

    pub async fn recent_events(&self, limit: i64) -> Result<Vec<WorkerEvent>, StorageError> {
        let rows = sqlx::query(
            "SELECT at_ms, event_type, worker_id, detail_blob FROM worker_events
             ORDER BY at_ms DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::from)?;

        rows.iter()
            .map(|row| {
                let worker_id: Option<String> =
                    row.try_get("worker_id").map_err(StorageError::from)?;
                Ok(WorkerEvent {
                    at_ms: row.try_get::<i64, _>("at_ms").map_err(StorageError::from)? as u64,
                    event_type: row.try_get("event_type").map_err(StorageError::from)?,
                    worker_id: worker_id.map(WorkerId::from_string),
                    detail: row.try_get("detail_blob").map_err(StorageError::from)?,
                })
            })
            .collect()
    }
}
