// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Self-reported executor id, matching `clxo-executor`'s
//! `pid:<pid>:<start_time>` encoding so the Pool Manager can correlate a
//! registered worker row back to the OS process it watches.

#[cfg(target_os = "linux")]
fn read_proc_start_time(pid: u32) -> Option<u64> {
    let stat = std::fs::read_to_string(format!("/proc/{pid}/stat")).ok()?;
    let after_comm = stat.rfind(')')?;
    let fields: Vec<&str> = stat[after_comm + 1..].split_whitespace().collect();
    // Field 22 (start time) is field index 19 counting from field 3 (state),
    // i.e. fields[19] in this post-comm slice.
    fields.get(19)?.parse().ok()
}

#[cfg(not(target_os = "linux"))]
fn read_proc_start_time(_pid: u32) -> Option<u64> {
    None
}

/// `"pid:<pid>:<start_time>"`, falling back to `start_time = 0` on
/// platforms without `/proc`.
pub fn current_executor_id() -> String {
    let pid = std::process::id();
    let start_time = read_proc_start_time(pid).unwrap_or(0);
    format!("pid:{pid}:{start_time}")
}

/// Milliseconds since the Unix epoch, clamped to 0 if the clock is
/// somehow before it.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
