//! Process signalling and orphan reaping.
//!
//! Everything here is best-effort: enumeration and kill failures are
//! reported through [`ReapReport`] or an `io::Result`, never by panicking.

use std::io;
use std::process::Command;

/// Outcome of an orphan sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReapReport {
    /// Matching processes found (excluding ourselves).
    pub found: usize,
    /// Processes successfully killed.
    pub killed: usize,
    /// Processes that could not be killed (usually already gone).
    pub failed: usize,
}

/// Ask a process to exit gracefully (SIGTERM).
#[cfg(unix)]
pub fn terminate(pid: u32) -> io::Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    kill(Pid::from_raw(pid as i32), Signal::SIGTERM).map_err(io::Error::from)
}

/// Kill a process immediately.
pub fn force_kill(pid: u32) -> io::Result<()> {
    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        kill(Pid::from_raw(pid as i32), Signal::SIGKILL).map_err(io::Error::from)
    }

    #[cfg(windows)]
    {
        let status = Command::new("taskkill")
            .args(["/PID", &pid.to_string(), "/F"])
            .output()?
            .status;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!("taskkill exited with {status}")))
        }
    }

    #[cfg(not(any(unix, windows)))]
    {
        let _ = pid;
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "process kill unsupported on this platform",
        ))
    }
}

/// Find running processes whose image name is exactly `name`.
pub fn find_processes(name: &str) -> io::Result<Vec<u32>> {
    #[cfg(windows)]
    {
        let output = Command::new("tasklist")
            .args(["/FI", &format!("IMAGENAME eq {name}"), "/FO", "CSV", "/NH"])
            .output()?;
        Ok(parse_tasklist_output(
            &String::from_utf8_lossy(&output.stdout),
            name,
        ))
    }

    #[cfg(not(windows))]
    {
        let output = Command::new("pgrep")
            .arg("-x")
            .arg(pgrep_pattern(name))
            .output()?;
        match output.status.code() {
            Some(0) => Ok(parse_pgrep_output(&String::from_utf8_lossy(&output.stdout))),
            // pgrep exits 1 when nothing matched.
            Some(1) => Ok(Vec::new()),
            _ => Err(io::Error::other(format!(
                "pgrep failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
        }
    }
}

/// Kill every running process named `name` except the current one.
pub fn reap_orphans(name: &str) -> ReapReport {
    let own_pid = std::process::id();
    let pids = match find_processes(name) {
        Ok(pids) => pids,
        Err(_e) => {
            #[cfg(feature = "tracing")]
            tracing::debug!("Could not enumerate {} processes: {}", name, _e);
            return ReapReport::default();
        }
    };

    let mut report = ReapReport::default();
    for pid in pids.into_iter().filter(|&pid| pid != own_pid) {
        report.found += 1;
        match force_kill(pid) {
            Ok(()) => {
                report.killed += 1;
                #[cfg(feature = "tracing")]
                tracing::info!("Killed orphaned {} PID {}", name, pid);
            }
            Err(_e) => {
                report.failed += 1;
                #[cfg(feature = "tracing")]
                tracing::debug!("Failed to kill {} PID {}: {}", name, pid, _e);
            }
        }
    }
    report
}

/// Linux truncates process names to 15 bytes; `pgrep -x` matches against
/// the truncated form and silently finds nothing for longer patterns.
#[cfg(not(windows))]
fn pgrep_pattern(name: &str) -> String {
    let truncated: String = if cfg!(target_os = "linux") {
        name.chars().take(15).collect()
    } else {
        name.to_string()
    };
    format!("^{}$", regex::escape(&truncated))
}

/// Parse `pgrep` output: one pid per line.
pub fn parse_pgrep_output(output: &str) -> Vec<u32> {
    output
        .lines()
        .filter_map(|line| line.trim().parse().ok())
        .collect()
}

/// Parse `tasklist /FO CSV /NH` output for the given image name.
pub fn parse_tasklist_output(output: &str, name: &str) -> Vec<u32> {
    let pattern = format!(r#"(?i)^"{}","(\d+)""#, regex::escape(name));
    let Ok(re) = regex::Regex::new(&pattern) else {
        return Vec::new();
    };

    output
        .lines()
        .filter_map(|line| re.captures(line.trim()))
        .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
        .collect()
}
