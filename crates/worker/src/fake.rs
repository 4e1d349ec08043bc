// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory `JobHandler` for worker-loop tests, mirroring the forked
//! workspace's `#[cfg(test)] fake` adapters (e.g.
//! `oj-daemon::adapters::agent::fake`).

use crate::handler::{HandlerContext, HandlerError, HandlerOutput, JobHandler};
use async_trait::async_trait;
use clxo_core::{Job, JobType};
use parking_lot::Mutex;
use std::collections::VecDeque;

enum Script {
    Succeed(Vec<u8>),
    FailPermanent(String),
    FailTransient(String),
}

pub struct FakeJobHandler {
    job_type: JobType,
    script: Mutex<VecDeque<Script>>,
    calls: Mutex<Vec<clxo_core::JobId>>,
}

impl FakeJobHandler {
    pub fn new(job_type: JobType) -> Self {
        Self {
            job_type,
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn succeed_with(self, bytes: impl Into<Vec<u8>>) -> Self {
        self.script.lock().push_back(Script::Succeed(bytes.into()));
        self
    }

    pub fn fail_permanent(self, message: impl Into<String>) -> Self {
        self.script.lock().push_back(Script::FailPermanent(message.into()));
        self
    }

    pub fn fail_transient_then_succeed(self, message: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.script.lock().push_back(Script::FailTransient(message.into()));
        self.script.lock().push_back(Script::Succeed(bytes.into()));
        self
    }

    pub fn calls(&self) -> Vec<clxo_core::JobId> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl JobHandler for FakeJobHandler {
    fn job_type(&self) -> JobType {
        self.job_type
    }

    async fn handle(&self, job: &Job, _ctx: &HandlerContext) -> Result<HandlerOutput, HandlerError> {
        self.calls.lock().push(job.id);
        let next = self.script.lock().pop_front();
        match next {
            Some(Script::Succeed(bytes)) => Ok(HandlerOutput { bytes, warnings: Vec::new() }),
            Some(Script::FailPermanent(m)) => Err(HandlerError::Permanent(m)),
            Some(Script::FailTransient(m)) => Err(HandlerError::Transient(m)),
            None => Ok(HandlerOutput::default()),
        }
    }
}
