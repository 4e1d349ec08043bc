// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn image_result_bytes_are_the_raw_image() {
    let r = CachedResult::Image(vec![1, 2, 3]);
    assert_eq!(r.result_bytes(), &[1, 2, 3]);
    assert_eq!(r.kind(), "image-result");
}

#[test]
fn notebook_result_bytes_are_utf8_text() {
    let r = CachedResult::Notebook("{}".to_string());
    assert_eq!(r.result_bytes(), b"{}");
    assert_eq!(r.kind(), "notebook-result");
}

#[test]
fn output_metadata_equality_is_string_equality() {
    let a = OutputMetadata::new("kind=speaker:lang=en");
    let b = OutputMetadata::new("kind=speaker:lang=en");
    let c = OutputMetadata::new("kind=completed:lang=en");
    assert_eq!(a, b);
    assert_ne!(a, c);
}
