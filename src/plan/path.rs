// src/plan/path.rs

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepPathError {
    #[error("use paths relative to {root:?} in plans (got absolute path {path:?})")]
    AbsoluteOutsideAllowed { path: PathBuf, root: PathBuf },

    #[error("step file {path:?} escapes {root:?} via '..'")]
    EscapesRoot { path: PathBuf, root: PathBuf },
}

/// Resolve a step's `file` against the data root.
///
/// Relative paths are joined onto `data_root` and may not climb above it.
/// Absolute paths are only accepted under one of `allowed_prefixes`.
pub fn resolve_step_file(
    file: &str,
    data_root: &Path,
    allowed_prefixes: &[PathBuf],
) -> Result<PathBuf, StepPathError> {
    let path = Path::new(file);

    if path.is_absolute() {
        let inside_allowed = allowed_prefixes.iter().any(|prefix| {
            path.strip_prefix(prefix)
                .map(|rest| !climbs(rest))
                .unwrap_or(false)
        });
        if inside_allowed {
            return Ok(path.to_path_buf());
        }
        return Err(StepPathError::AbsoluteOutsideAllowed {
            path: path.to_path_buf(),
            root: data_root.to_path_buf(),
        });
    }

    if climbs(path) {
        return Err(StepPathError::EscapesRoot {
            path: path.to_path_buf(),
            root: data_root.to_path_buf(),
        });
    }

    Ok(data_root.join(path))
}

/// True if the lexical path rises above its starting point at any point.
fn climbs(path: &Path) -> bool {
    let mut depth: usize = 0;
    for component in path.components() {
        match component {
            Component::ParentDir => {
                if depth == 0 {
                    return true;
                }
                depth -= 1;
            }
            Component::Normal(_) => depth += 1,
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    false
}
