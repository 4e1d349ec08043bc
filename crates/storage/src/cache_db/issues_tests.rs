// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{CacheDb, CachedIssue};
use crate::cache_db::results::GetResultKey;
use clxo_core::{ErrorType, IssueSeverity, OutputMetadata, StoredIssue, Warning};

async fn open_tmp() -> (CacheDb, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = CacheDb::open(&dir.path().join("cache.sqlite3"))
        .await
        .expect("open cache db");
    (db, dir)
}

fn metadata() -> OutputMetadata {
    OutputMetadata::new("kind=speaker:lang=en:prog_lang=python:format=html")
}

fn key(m: &OutputMetadata) -> GetResultKey<'_> {
    GetResultKey {
        input_file: "slides/topic.ipynb",
        content_hash: "deadbeef",
        output_metadata: m,
    }
}

#[tokio::test]
async fn stores_and_fetches_a_user_error() {
    let (db, _dir) = open_tmp().await;
    let m = metadata();
    let issue = StoredIssue {
        input_file: "slides/topic.ipynb".to_string(),
        content_hash: "deadbeef".to_string(),
        output_metadata: m.clone(),
        error_type: ErrorType::User,
        category: "syntax_error".to_string(),
        severity: IssueSeverity::Error,
        message: "unexpected indent on cell 3".to_string(),
        file_path: Some("slides/topic.ipynb".to_string()),
        guidance: "check indentation in cell 3".to_string(),
        stored_at_ms: 0,
    };
    db.store_error(&issue).await.expect("store_error");

    let issues = db.get_issues(key(&m)).await.expect("get_issues");
    assert_eq!(issues.len(), 1);
    match &issues[0] {
        CachedIssue::Error(stored) => {
            assert_eq!(stored.category, "syntax_error");
            assert_eq!(stored.guidance, "check indentation in cell 3");
        }
        CachedIssue::Warning(_) => panic!("expected an error, got a warning"),
    }
}

#[tokio::test]
async fn stores_warnings_alongside_errors() {
    let (db, _dir) = open_tmp().await;
    let m = metadata();
    let warning = Warning {
        category: "deprecated_api".to_string(),
        message: "plt.show() is deprecated in this context".to_string(),
        severity: IssueSeverity::Warning,
        file_path: None,
    };
    db.store_warning(key(&m), &warning)
        .await
        .expect("store_warning");

    let issues = db.get_issues(key(&m)).await.expect("get_issues");
    assert_eq!(issues.len(), 1);
    assert!(matches!(&issues[0], CachedIssue::Warning(_)));
}

#[tokio::test]
async fn prune_stale_issues_respects_window() {
    let (db, _dir) = open_tmp().await;
    let m = metadata();
    let issue = StoredIssue {
        input_file: "slides/topic.ipynb".to_string(),
        content_hash: "deadbeef".to_string(),
        output_metadata: m.clone(),
        error_type: ErrorType::User,
        category: "syntax_error".to_string(),
        severity: IssueSeverity::Error,
        message: "boom".to_string(),
        file_path: None,
        guidance: String::new(),
        stored_at_ms: 0,
    };
    db.store_error(&issue).await.expect("store_error");

    let deleted = db.prune_stale_issues(0).await.expect("prune_stale_issues");
    assert_eq!(deleted, 1);
}
