use std::path::{Path, PathBuf};

use bookmover_oracle::PatchSpec;
use chrono::Utc;

use crate::diff_apply::apply_unified_diff;

#[derive(Debug)]
pub enum PatchError {
    Io(std::io::Error),
    NotFound(String),
    Ambiguous(String),
    Diff(String),
    ValidationFailed(String),
}

impl std::fmt::Display for PatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatchError::Io(e) => write!(f, "I/O error: {e}"),
            PatchError::NotFound(what) => write!(f, "not found: {what}"),
            PatchError::Ambiguous(what) => write!(f, "ambiguous match: {what}"),
            PatchError::Diff(msg) => write!(f, "diff application failed: {msg}"),
            PatchError::ValidationFailed(msg) => write!(f, "patch failed validation: {msg}"),
        }
    }
}

impl std::error::Error for PatchError {}

fn render(patch: &PatchSpec, original: &str) -> Result<String, PatchError> {
    match patch {
        PatchSpec::FunctionReplace { name, body } => replace_function(original, name, body),
        PatchSpec::Replace { context_before, old, new, context_after } => {
            let needle = format!("{context_before}{old}{context_after}");
            let replacement = format!("{context_before}{new}{context_after}");
            let matches = original.matches(needle.as_str()).count();
            match matches {
                0 => Err(PatchError::NotFound(format!("context block around {old:.40?}"))),
                1 => Ok(original.replacen(needle.as_str(), replacement.as_str(), 1)),
                _ => Err(PatchError::Ambiguous("context block matched more than once".to_string())),
            }
        }
        PatchSpec::UnifiedDiff { hunks } => apply_unified_diff(original, hunks).map_err(PatchError::Diff),
    }
}

/// Finds `fn <name>` and replaces through its balanced `{ ... }` body with
/// `body` verbatim. Brace counting ignores braces inside string/char
/// literals only to the extent that real source rarely puts unbalanced
/// braces in them; a patch that doesn't round-trip is caught by the
/// syntactic validation step regardless.
fn replace_function(original: &str, name: &str, body: &str) -> Result<String, PatchError> {
    let marker = format!("fn {name}");
    let occurrences: Vec<usize> = original.match_indices(marker.as_str()).map(|(i, _)| i).collect();
    let start = match occurrences.as_slice() {
        [] => return Err(PatchError::NotFound(format!("function `{name}`"))),
        [single] => *single,
        _ => return Err(PatchError::Ambiguous(format!("function name `{name}` appears more than once"))),
    };

    let brace_open = original[start..]
        .find('{')
        .ok_or_else(|| PatchError::NotFound(format!("opening brace for `{name}`")))?
        + start;

    let mut depth = 0i32;
    let mut end = None;
    for (offset, ch) in original[brace_open..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(brace_open + offset + 1);
                    break;
                }
            }
            _ => {}
        }
    }
    let end = end.ok_or_else(|| PatchError::NotFound(format!("closing brace for `{name}`")))?;

    let mut result = String::with_capacity(original.len() + body.len());
    result.push_str(&original[..start]);
    result.push_str(body);
    result.push_str(&original[end..]);
    Ok(result)
}

/// Walks upward from `target_file` looking for the `Cargo.toml` of the
/// workspace member that owns it, so validation can compile the file in the
/// context of its own crate's dependencies rather than in isolation.
fn find_owning_manifest(target_file: &Path) -> Option<PathBuf> {
    target_file.ancestors().skip(1).find_map(|dir| {
        let candidate = dir.join("Cargo.toml");
        candidate.is_file().then_some(candidate)
    })
}

/// Runs `cargo check` against the workspace member owning `path`, the
/// cheapest way to get a real parse+typecheck that resolves the file's own
/// `use` paths (§4.8 step D.3: "validate syntactically by a parse + compile
/// check").
async fn validate_syntax(path: &Path) -> Result<(), PatchError> {
    let Some(manifest_path) = find_owning_manifest(path) else {
        return Err(PatchError::ValidationFailed(format!(
            "{} is not part of a cargo crate (no Cargo.toml in any ancestor directory)",
            path.display()
        )));
    };
    let output = tokio::process::Command::new("cargo")
        .args(["check", "--manifest-path"])
        .arg(&manifest_path)
        .output()
        .await
        .map_err(PatchError::Io)?;
    if output.status.success() {
        Ok(())
    } else {
        Err(PatchError::ValidationFailed(String::from_utf8_lossy(&output.stderr).into_owned()))
    }
}

/// Applies `patch` to `target_file`: snapshot to a timestamped backup,
/// render the patch, write it, validate, and on validation failure restore
/// the backup (§4.8 step D.3, §9's structured-patch redesign note).
pub async fn apply_and_validate(target_file: &Path, patch: &PatchSpec) -> Result<PathBuf, PatchError> {
    let original = std::fs::read_to_string(target_file).map_err(PatchError::Io)?;
    let backup_path = target_file.with_extension(format!("{}.bak", Utc::now().timestamp()));
    std::fs::copy(target_file, &backup_path).map_err(PatchError::Io)?;

    let patched = match render(patch, &original) {
        Ok(patched) => patched,
        Err(error) => {
            let _ = std::fs::remove_file(&backup_path);
            return Err(error);
        }
    };
    std::fs::write(target_file, &patched).map_err(PatchError::Io)?;

    if let Err(error) = validate_syntax(target_file).await {
        tracing::warn!(%error, path = %target_file.display(), "patch failed validation, restoring backup");
        std::fs::copy(&backup_path, target_file).map_err(PatchError::Io)?;
        return Err(error);
    }

    Ok(backup_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_replace_swaps_body_keeping_signature() {
        let original = "fn helper() {\n    old_body();\n}\nfn other() {}\n";
        let patched = replace_function(original, "helper", "fn helper() {\n    new_body();\n}").unwrap();
        assert!(patched.contains("new_body();"));
        assert!(!patched.contains("old_body();"));
        assert!(patched.contains("fn other() {}"));
    }

    #[test]
    fn function_replace_rejects_duplicate_names() {
        let original = "fn dup() {}\nfn dup() {}\n";
        assert!(replace_function(original, "dup", "fn dup() {}").is_err());
    }

    #[test]
    fn find_owning_manifest_locates_nearest_cargo_toml() {
        let dir = tempfile::tempdir().unwrap();
        let crate_dir = dir.path().join("crates/example");
        std::fs::create_dir_all(crate_dir.join("src")).unwrap();
        std::fs::write(crate_dir.join("Cargo.toml"), "[package]\nname = \"example\"\n").unwrap();
        let target_file = crate_dir.join("src/lib.rs");
        std::fs::write(&target_file, "pub fn noop() {}\n").unwrap();

        let manifest = find_owning_manifest(&target_file).unwrap();
        assert_eq!(manifest, crate_dir.join("Cargo.toml"));
    }

    #[test]
    fn find_owning_manifest_returns_none_outside_any_crate() {
        let dir = tempfile::tempdir().unwrap();
        let target_file = dir.path().join("loose.rs");
        std::fs::write(&target_file, "pub fn noop() {}\n").unwrap();
        assert!(find_owning_manifest(&target_file).is_none());
    }

    #[test]
    fn function_replace_rejects_missing_name() {
        let original = "fn something_else() {}\n";
        assert!(replace_function(original, "missing", "fn missing() {}").is_err());
    }

    #[test]
    fn replace_variant_matches_context_exactly_once() {
        let patch = PatchSpec::Replace {
            context_before: "let x = ".to_string(),
            old: "1".to_string(),
            new: "2".to_string(),
            context_after: ";".to_string(),
        };
        let patched = render(&patch, "let x = 1;\n").unwrap();
        assert_eq!(patched, "let x = 2;\n");
    }
}
