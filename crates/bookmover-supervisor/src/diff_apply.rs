/// Minimal unified-diff hunk applier for the `UnifiedDiff` patch variant
/// (§9). Each hunk is matched by its context+removed lines as a contiguous
/// block within `original` (line numbers in the `@@` header are informative
/// only, not trusted, since the oracle's view of line numbers may be stale);
/// a hunk whose context block can't be found unambiguously fails the whole
/// patch rather than guessing.
pub fn apply_unified_diff(original: &str, hunks: &[String]) -> Result<String, String> {
    let mut text = original.to_string();
    for hunk in hunks {
        text = apply_one_hunk(&text, hunk)?;
    }
    Ok(text)
}

fn apply_one_hunk(original: &str, hunk: &str) -> Result<String, String> {
    let mut old_block = String::new();
    let mut new_block = String::new();
    for line in hunk.lines() {
        if line.starts_with("@@") || line.is_empty() {
            continue;
        }
        let (marker, rest) = line.split_at(1);
        match marker {
            " " => {
                old_block.push_str(rest);
                old_block.push('\n');
                new_block.push_str(rest);
                new_block.push('\n');
            }
            "-" => {
                old_block.push_str(rest);
                old_block.push('\n');
            }
            "+" => {
                new_block.push_str(rest);
                new_block.push('\n');
            }
            _ => return Err(format!("unrecognized diff line: {line}")),
        }
    }
    if old_block.is_empty() {
        return Err("hunk has no context or removed lines to anchor on".to_string());
    }
    let matches = original.matches(old_block.as_str()).count();
    match matches {
        0 => Err("hunk's context/removed block was not found in the target file".to_string()),
        1 => Ok(original.replacen(old_block.as_str(), new_block.as_str(), 1)),
        _ => Err("hunk's context/removed block matched more than once, refusing to guess".to_string()),
    }
}
