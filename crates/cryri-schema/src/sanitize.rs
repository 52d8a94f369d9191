use crate::config::ConfigError;
use std::ffi::OsStr;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Resolve a path to an absolute, normalized form without requiring it to
/// exist in full.
///
/// A path that exists in full is canonicalized outright. Otherwise the
/// longest existing prefix is canonicalized (symlinks resolved) and the
/// trailing components that do not exist yet are appended textually. Shared
/// by [`sanitize_dir_path`] and job description derivation.
pub fn resolve_path(path: &str) -> Result<PathBuf, ConfigError> {
    if path.is_empty() {
        return Err(ConfigError::MissingPath(path.to_owned()));
    }
    let raw = Path::new(path);
    let absolute = if raw.is_absolute() {
        raw.to_path_buf()
    } else {
        std::env::current_dir()?.join(raw)
    };
    // Kernel resolution first, so a `..` after a symlink follows the link
    // target instead of the textual parent.
    match absolute.canonicalize() {
        Ok(resolved) => return Ok(resolved),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(ConfigError::Io(err)),
    }
    match resolve_existing_prefix(&normalize_dots(&absolute)) {
        Ok(resolved) => Ok(resolved),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Err(ConfigError::MissingPath(path.to_owned()))
        }
        Err(err) => Err(ConfigError::Io(err)),
    }
}

/// Canonicalize `path` to an existing directory.
///
/// The input must already be expanded. If the resolved path is not itself a
/// directory (a file, or a leaf that does not exist yet), the immediate
/// parent is returned instead. A path with no existing ancestor at all is a
/// [`ConfigError::MissingPath`].
pub fn sanitize_dir_path(path: &str) -> Result<PathBuf, ConfigError> {
    let resolved = resolve_path(path)?;
    if resolved.is_dir() {
        return Ok(resolved);
    }
    match resolved.parent() {
        Some(parent) => Ok(parent.to_path_buf()),
        None => Err(ConfigError::MissingPath(path.to_owned())),
    }
}

/// Drop `.` components and let `..` consume the preceding component.
fn normalize_dots(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

fn resolve_existing_prefix(path: &Path) -> io::Result<PathBuf> {
    let mut existing = path;
    let mut tail: Vec<&OsStr> = Vec::new();
    loop {
        match existing.canonicalize() {
            Ok(mut resolved) => {
                for name in tail.iter().rev() {
                    resolved.push(name);
                }
                return Ok(resolved);
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let (Some(parent), Some(name)) = (existing.parent(), existing.file_name()) else {
                    return Err(err);
                };
                tail.push(name);
                existing = parent;
            }
            Err(err) => return Err(err),
        }
    }
}
