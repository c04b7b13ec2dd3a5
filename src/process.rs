#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MemoryInfo {
    pub bytes: u64,
    pub percent: f32,
}

/// One line of the process table, rebuilt from scratch every refresh.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessRow {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f32,
    pub memory: Option<MemoryInfo>,
    pub status: String,
}

impl ProcessRow {
    pub fn pid_text(&self) -> String {
        self.pid.to_string()
    }
}
