use std::path::{Path, PathBuf};

/// Each worker records its own OS PID next to its progress file so peers
/// (orphan recovery, §4.7) and the supervisor can tell a paused worker from
/// one whose process is simply gone.
pub fn pid_file_path(dir: &Path, shard_id: u32) -> PathBuf {
    dir.join(format!("worker-{shard_id}.pid"))
}

pub fn write_pid_file(dir: &Path, shard_id: u32) -> std::io::Result<()> {
    std::fs::write(pid_file_path(dir, shard_id), std::process::id().to_string())
}

pub fn read_pid(dir: &Path, shard_id: u32) -> Option<u32> {
    std::fs::read_to_string(pid_file_path(dir, shard_id))
        .ok()?
        .trim()
        .parse()
        .ok()
}

pub fn is_peer_alive(dir: &Path, shard_id: u32) -> bool {
    match read_pid(dir, shard_id) {
        Some(pid) => crate::liveness::process_is_alive(pid),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trips_own_pid() {
        let dir = tempdir().unwrap();
        write_pid_file(dir.path(), 3).unwrap();
        assert_eq!(read_pid(dir.path(), 3), Some(std::process::id()));
    }

    #[test]
    fn missing_pid_file_is_not_alive() {
        let dir = tempdir().unwrap();
        assert!(!is_peer_alive(dir.path(), 9));
    }
}
