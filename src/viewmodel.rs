//! Refresh, filter and selection state owned by the event loop.
//!
//! Everything here runs on the single UI thread. A refresh takes the snapshot
//! synchronously, so a slow OS query briefly delays input handling; callers
//! must not hand in a `SnapshotSource` that blocks for long.

use std::time::{Duration, Instant};

use crate::{
    filter::{filter, sort_rows, FilterState},
    kill::Terminator,
    manager::{Snapshot, SnapshotSource},
    process::ProcessRow,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Refreshing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed,
    /// a snapshot was already in flight, this request was dropped
    Coalesced,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Error,
}

#[derive(Clone, Debug)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
    shown_at: Instant,
}

pub struct ViewModel {
    filter: FilterState,
    selected_pid: Option<u32>,
    snapshot: Snapshot,
    rows: Vec<ProcessRow>,
    phase: Phase,
    status: Option<StatusMessage>,
    status_ttl: Duration,
    limit: usize,
}

impl ViewModel {
    pub fn new(limit: usize, status_ttl: Duration) -> Self {
        Self {
            filter: FilterState::default(),
            selected_pid: None,
            snapshot: Snapshot::default(),
            rows: vec![],
            phase: Phase::Idle,
            status: None,
            status_ttl,
            limit,
        }
    }

    pub fn rows(&self) -> &[ProcessRow] {
        &self.rows
    }
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
    pub fn filter(&self) -> &FilterState {
        &self.filter
    }
    pub fn selected_pid(&self) -> Option<u32> {
        self.selected_pid
    }
    pub fn selected_index(&self) -> Option<usize> {
        let pid = self.selected_pid?;
        self.rows.iter().position(|r| r.pid == pid)
    }

    /// Idle -> Refreshing. Returns false if a snapshot is already in flight.
    pub fn begin_refresh(&mut self) -> bool {
        match self.phase {
            Phase::Refreshing => {
                tracing::debug!("refresh already in flight, tick dropped");
                false
            }
            Phase::Idle => {
                self.phase = Phase::Refreshing;
                true
            }
        }
    }

    /// Refreshing -> Idle with the new snapshot applied.
    pub fn finish_refresh(&mut self, snapshot: Snapshot) {
        self.snapshot = snapshot;
        self.rebuild();
        self.phase = Phase::Idle;
    }

    pub fn refresh<S: SnapshotSource + ?Sized>(&mut self, source: &mut S) -> RefreshOutcome {
        if !self.begin_refresh() {
            return RefreshOutcome::Coalesced;
        }
        let snapshot = source.take_snapshot();
        self.finish_refresh(snapshot);
        RefreshOutcome::Refreshed
    }

    ///filter, sort, cap, then drop the selection if its pid is gone
    fn rebuild(&mut self) {
        let mut rows = filter(&self.snapshot.rows, &self.filter);
        sort_rows(&mut rows);
        if self.limit > 0 {
            rows.truncate(self.limit);
        }
        self.rows = rows;

        if let Some(pid) = self.selected_pid {
            if !self.rows.iter().any(|r| r.pid == pid) {
                tracing::debug!(pid, "selected process no longer listed");
                self.selected_pid = None;
            }
        }
    }

    pub fn set_query(&mut self, query: &str, now: Instant) {
        self.filter = FilterState::new(query);
        tracing::info!(query = self.filter.query(), "filter changed");
        self.rebuild();
        if self.filter.is_empty() {
            self.info("Showing all", now);
        } else {
            let text = format!("Filtered by: {}", self.filter.query());
            self.info(text, now);
        }
    }

    pub fn clear_filter(&mut self, now: Instant) {
        self.filter = FilterState::default();
        tracing::info!("filter cleared");
        self.rebuild();
        self.info("Search cleared", now);
    }

    /// No-op unless the pid is currently displayed.
    pub fn select(&mut self, pid: u32) -> bool {
        if self.rows.iter().any(|r| r.pid == pid) {
            self.selected_pid = Some(pid);
            true
        } else {
            false
        }
    }

    pub fn select_index(&mut self, index: usize) -> bool {
        match self.rows.get(index).map(|r| r.pid) {
            Some(pid) => self.select(pid),
            None => false,
        }
    }

    /// Moves the selection by `delta` rows, clamped to the table.
    /// With nothing selected, moving down starts at the first row.
    pub fn move_selection(&mut self, delta: isize) {
        if self.rows.is_empty() {
            return;
        }
        let last = self.rows.len() - 1;
        let index = match self.selected_index() {
            Some(i) => i.saturating_add_signed(delta).min(last),
            None if delta < 0 => return,
            None => 0,
        };
        self.select_index(index);
    }

    pub fn select_first(&mut self) {
        self.select_index(0);
    }

    pub fn select_last(&mut self) {
        if !self.rows.is_empty() {
            self.select_index(self.rows.len() - 1);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected_pid = None;
        self.status = None;
    }

    /// Fire and forget: the next refresh shows whether the process died.
    pub fn kill_selected<T: Terminator + ?Sized>(&mut self, terminator: &mut T, now: Instant) {
        let Some(pid) = self.selected_pid.take() else {
            self.error("No process selected", now);
            return;
        };
        match terminator.terminate(pid) {
            Ok(()) => {
                tracing::info!(pid, "sent SIGKILL");
                self.info(format!("Killed process {pid}"), now);
            }
            Err(err) => {
                tracing::warn!(pid, error = %err, "kill failed");
                self.error(err.to_string(), now);
            }
        }
    }

    pub fn info(&mut self, text: impl Into<String>, now: Instant) {
        self.set_status(text.into(), StatusLevel::Info, now);
    }

    pub fn error(&mut self, text: impl Into<String>, now: Instant) {
        self.set_status(text.into(), StatusLevel::Error, now);
    }

    fn set_status(&mut self, text: String, level: StatusLevel, now: Instant) {
        self.status = Some(StatusMessage {
            text,
            level,
            shown_at: now,
        });
    }

    /// The current status message, if it has not expired.
    pub fn status(&self, now: Instant) -> Option<&StatusMessage> {
        self.status
            .as_ref()
            .filter(|s| now.saturating_duration_since(s.shown_at) < self.status_ttl)
    }
}

/// Fixed-period refresh timer.
///
/// The next deadline is scheduled from when a tick is taken, not from when it
/// was due, so ticks missed during a slow refresh collapse into one.
pub struct Ticker {
    interval: Duration,
    next: Instant,
}

impl Ticker {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next: now + interval,
        }
    }

    pub fn due(&mut self, now: Instant) -> bool {
        if now >= self.next {
            self.next = now + self.interval;
            true
        } else {
            false
        }
    }

    pub fn until_next(&self, now: Instant) -> Duration {
        self.next.saturating_duration_since(now)
    }

    pub fn reset(&mut self, now: Instant) {
        self.next = now + self.interval;
    }
}
