use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum KillError {
    #[error("Permission denied for PID {0}")]
    PermissionDenied(u32),
    #[error("Process {0} not found")]
    NotFound(u32),
    #[error("Invalid PID {0}")]
    InvalidPid(u32),
    #[error("Failed to send signal to PID {0}: {1}")]
    Signal(u32, String),
}

/// Sends the termination signal. Does not wait for the process to exit.
pub trait Terminator {
    fn terminate(&mut self, pid: u32) -> Result<(), KillError>;
}

/// Immediate SIGKILL, no grace period.
pub struct SignalTerminator;

impl Terminator for SignalTerminator {
    fn terminate(&mut self, pid: u32) -> Result<(), KillError> {
        //0 and negative values address process groups
        let raw = match i32::try_from(pid) {
            Ok(raw) if raw > 0 => raw,
            _ => return Err(KillError::InvalidPid(pid)),
        };
        signal::kill(Pid::from_raw(raw), Signal::SIGKILL).map_err(|e| match e {
            Errno::EPERM => KillError::PermissionDenied(pid),
            Errno::ESRCH => KillError::NotFound(pid),
            other => KillError::Signal(pid, other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_group_addressing_pids() {
        let mut t = SignalTerminator;
        assert_eq!(t.terminate(0), Err(KillError::InvalidPid(0)));
        assert_eq!(t.terminate(u32::MAX), Err(KillError::InvalidPid(u32::MAX)));
    }

    #[test]
    fn missing_process_is_not_found() {
        //above the default linux pid_max
        let pid = 4_194_304 + 17;
        assert_eq!(SignalTerminator.terminate(pid), Err(KillError::NotFound(pid)));
    }

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(
            KillError::PermissionDenied(7).to_string(),
            "Permission denied for PID 7"
        );
        assert_eq!(KillError::NotFound(9).to_string(), "Process 9 not found");
    }
}
