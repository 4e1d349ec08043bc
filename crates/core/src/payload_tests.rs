// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::sample_notebook_payload;

#[test]
fn output_metadata_excludes_scheduling_fields() {
    let mut a = sample_notebook_payload();
    let mut b = sample_notebook_payload();
    a.input_file = "a.ipynb".to_string();
    b.input_file = "b.ipynb".to_string();
    let pa = JobPayload::Notebook(a);
    let pb = JobPayload::Notebook(b);
    assert_eq!(pa.output_metadata(), pb.output_metadata());
}

#[test]
fn output_metadata_distinguishes_kind() {
    let mut speaker = sample_notebook_payload();
    speaker.kind = NotebookKind::Speaker;
    let mut completed = sample_notebook_payload();
    completed.kind = NotebookKind::Completed;
    let pa = JobPayload::Notebook(speaker);
    let pb = JobPayload::Notebook(completed);
    assert_ne!(pa.output_metadata(), pb.output_metadata());
}

#[test]
fn job_type_matches_payload_variant() {
    let p = JobPayload::Notebook(sample_notebook_payload());
    assert_eq!(p.job_type(), crate::job::JobType::Notebook);

    let img = JobPayload::PlantUml(ImagePayload {
        source_text: "@startuml\n@enduml".to_string(),
        input_file: "diagram.puml".to_string(),
        output_file: "diagram.png".to_string(),
        format: "png".to_string(),
    });
    assert_eq!(img.job_type(), crate::job::JobType::PlantUml);
}

#[test]
fn payload_serializes_with_job_type_tag() {
    let p = JobPayload::Drawio(ImagePayload {
        source_text: "<mxfile/>".to_string(),
        input_file: "diagram.drawio".to_string(),
        output_file: "diagram.svg".to_string(),
        format: "svg".to_string(),
    });
    let json = serde_json::to_value(&p).expect("serialize");
    assert_eq!(json["job_type"], "drawio");
}
