use std::path::Path;

use bookmover_progress::is_progress_file;

/// Every shard_id with a progress file in `progress_dir`, live or not —
/// step B distinguishes "stopped" (progress file exists, process doesn't)
/// from live workers using this plus a PID check.
pub fn known_shard_ids(progress_dir: &Path) -> Vec<u32> {
    let Ok(entries) = std::fs::read_dir(progress_dir) else {
        return Vec::new();
    };
    let mut ids: Vec<u32> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| is_progress_file(path))
        .filter_map(|path| shard_id_from_path(&path))
        .collect();
    ids.sort_unstable();
    ids
}

fn shard_id_from_path(path: &Path) -> Option<u32> {
    path.file_name()?
        .to_str()?
        .strip_prefix("worker-")?
        .strip_suffix(".progress.json")?
        .parse()
        .ok()
}
