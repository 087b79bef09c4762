use std::path::{Path, PathBuf};

/// §4.6 `paused`: the supervisor sets a well-known flag file; the worker
/// finishes its in-flight batch and halts rather than reacting mid-batch.
pub fn pause_flag_path(dir: &Path, shard_id: u32) -> PathBuf {
    dir.join(format!("worker-{shard_id}.pause"))
}

pub fn is_paused(dir: &Path, shard_id: u32) -> bool {
    pause_flag_path(dir, shard_id).exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn absent_flag_is_not_paused() {
        let dir = tempdir().unwrap();
        assert!(!is_paused(dir.path(), 0));
    }

    #[test]
    fn present_flag_is_paused() {
        let dir = tempdir().unwrap();
        std::fs::write(pause_flag_path(dir.path(), 0), b"").unwrap();
        assert!(is_paused(dir.path(), 0));
    }
}
