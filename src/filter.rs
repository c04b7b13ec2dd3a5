use std::cmp::Ordering;

use crate::process::ProcessRow;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterMode {
    Name,
    Pid,
}

/// Active search. Survives refreshes until the user changes or clears it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterState {
    query: String,
    mode: FilterMode,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            query: String::new(),
            mode: FilterMode::Name,
        }
    }
}

impl FilterState {
    ///an all-digit query can only mean a pid
    pub fn new(query: &str) -> Self {
        let query = query.trim().to_string();
        let mode = if !query.is_empty() && query.chars().all(|c| c.is_ascii_digit()) {
            FilterMode::Pid
        } else {
            FilterMode::Name
        };
        Self { query, mode }
    }
    pub fn query(&self) -> &str {
        &self.query
    }
    pub fn mode(&self) -> FilterMode {
        self.mode
    }
    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }

    pub fn matches(&self, row: &ProcessRow) -> bool {
        if self.query.is_empty() {
            return true;
        }
        let pid_match = row.pid_text() == self.query;
        match self.mode {
            FilterMode::Pid => pid_match,
            FilterMode::Name => {
                pid_match || row.name.to_lowercase().contains(&self.query.to_lowercase())
            }
        }
    }
}

pub fn filter(rows: &[ProcessRow], state: &FilterState) -> Vec<ProcessRow> {
    rows.iter().filter(|r| state.matches(r)).cloned().collect()
}

/// Highest cpu first, equal cpu ordered by pid.
pub fn sort_rows(rows: &mut [ProcessRow]) {
    rows.sort_by(|a, b| {
        b.cpu_percent
            .partial_cmp(&a.cpu_percent)
            .unwrap_or(Ordering::Equal)
            .then(a.pid.cmp(&b.pid))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pid: u32, name: &str, cpu: f32) -> ProcessRow {
        ProcessRow {
            pid,
            name: name.to_string(),
            cpu_percent: cpu,
            memory: None,
            status: "Run".to_string(),
        }
    }

    fn pids(rows: &[ProcessRow]) -> Vec<u32> {
        rows.iter().map(|r| r.pid).collect()
    }

    #[test]
    fn empty_query_is_identity() {
        let rows = vec![row(1, "init", 0.), row(2, "bash", 1.)];
        assert_eq!(filter(&rows, &FilterState::default()), rows);
        assert_eq!(filter(&rows, &FilterState::new("   ")), rows);
    }

    #[test]
    fn numeric_query_matches_exact_pid_only() {
        let rows = vec![
            row(123, "alpha", 0.),
            row(1234, "beta", 0.),
            row(12, "gamma", 0.),
            row(7, "proc123", 0.),
        ];
        let state = FilterState::new("123");
        assert_eq!(state.mode(), FilterMode::Pid);
        assert_eq!(pids(&filter(&rows, &state)), vec![123]);
    }

    #[test]
    fn name_query_is_case_insensitive_substring() {
        let rows = vec![
            row(1, "Google Chrome", 0.),
            row(2, "chrome_crashpad", 0.),
            row(3, "firefox", 0.),
            row(4, "CHROMEDRIVER", 0.),
        ];
        let state = FilterState::new("chrome");
        assert_eq!(state.mode(), FilterMode::Name);
        assert_eq!(pids(&filter(&rows, &state)), vec![1, 2, 4]);
    }

    #[test]
    fn mixed_query_uses_name_mode() {
        let rows = vec![row(5, "python3", 0.), row(6, "node", 0.)];
        assert_eq!(pids(&filter(&rows, &FilterState::new("ON3"))), vec![5]);
    }

    #[test]
    fn query_is_trimmed() {
        let state = FilterState::new("  42 ");
        assert_eq!(state.query(), "42");
        assert_eq!(state.mode(), FilterMode::Pid);
    }

    #[test]
    fn sort_cpu_descending_pid_ascending() {
        let mut rows = vec![row(20, "a", 5.0), row(10, "b", 5.0), row(30, "c", 9.0)];
        sort_rows(&mut rows);
        assert_eq!(pids(&rows), vec![30, 10, 20]);
    }
}
