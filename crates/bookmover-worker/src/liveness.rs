use sysinfo::{Pid, System};

/// Whether `pid` currently names a running process, used by orphan recovery
/// (§4.7) to tell a merely-paused peer from one whose process is gone.
pub fn process_is_alive(pid: u32) -> bool {
    let mut system = System::new();
    let pid = Pid::from_u32(pid);
    system.refresh_process(pid) && system.process(pid).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_process_is_alive() {
        assert!(process_is_alive(std::process::id()));
    }

    #[test]
    fn implausible_pid_is_not_alive() {
        assert!(!process_is_alive(u32::MAX));
    }
}
