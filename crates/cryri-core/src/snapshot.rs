use crate::CoreError;
use cryri_schema::ContainerConfig;
use filetime::FileTime;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Copy the parent of `work_dir` into a fresh run-named directory under
/// `cry_copy_dir`, skipping entries whose names match `exclude_from_copy`.
///
/// The tree is written to a dot-prefixed staging directory first and renamed
/// into place on success, so the final name never points at a partial copy.
/// Returns the destination path.
pub fn create_run_copy(container: &ContainerConfig) -> Result<PathBuf, CoreError> {
    let copy_root = container
        .cry_copy_dir
        .as_deref()
        .ok_or(CoreError::CopyDirUnset)?;

    let work_dir = Path::new(&container.work_dir);
    let copy_from = work_dir.parent().unwrap_or(work_dir).canonicalize()?;

    let patterns = compile_patterns(&container.exclude_from_copy)?;

    let copy_root = Path::new(copy_root);
    fs::create_dir_all(copy_root)?;
    let copy_root_resolved = copy_root.canonicalize()?;
    if copy_root_resolved.starts_with(&copy_from) {
        // Copying a tree into itself never terminates with a faithful mirror.
        return Err(CoreError::SnapshotInsideSource(copy_root_resolved));
    }

    let run_name = crate::run_name::next_run_name();
    let dest = copy_root_resolved.join(&run_name);
    if dest.exists() {
        return Err(CoreError::RunCollision(dest));
    }

    info!(
        "snapshotting {} into {}",
        copy_from.display(),
        dest.display()
    );

    let staging = copy_root_resolved.join(format!(".{run_name}.partial"));
    if staging.exists() {
        fs::remove_dir_all(&staging)?;
    }
    if let Err(err) = copy_tree(&copy_from, &staging, &patterns) {
        let _ = fs::remove_dir_all(&staging);
        return Err(err);
    }
    if let Err(err) = fs::rename(&staging, &dest) {
        let _ = fs::remove_dir_all(&staging);
        return Err(err.into());
    }
    fsync_dir(&copy_root_resolved)?;

    debug!("snapshot complete: {}", dest.display());
    Ok(dest)
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<glob::Pattern>, CoreError> {
    patterns
        .iter()
        .map(|pattern| {
            glob::Pattern::new(pattern).map_err(|source| CoreError::InvalidExcludePattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

/// Recursive copy with name-based exclusion at every level. Symlinks are
/// recreated, never followed, so link cycles cannot recurse. Permission bits
/// and timestamps are carried over; directory times are set after their
/// children so the copies inside do not bump them again.
fn copy_tree(src: &Path, dst: &Path, exclude: &[glob::Pattern]) -> Result<(), CoreError> {
    fs::create_dir(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let name = entry.file_name();
        let name_str = name.to_string_lossy();
        if exclude.iter().any(|pattern| pattern.matches(&name_str)) {
            debug!("excluding {name_str}");
            continue;
        }

        let src_path = entry.path();
        let dst_path = dst.join(&name);
        let meta = fs::symlink_metadata(&src_path)?;
        let file_type = meta.file_type();
        if file_type.is_dir() {
            copy_tree(&src_path, &dst_path, exclude)?;
        } else if file_type.is_symlink() {
            let target = fs::read_link(&src_path)?;
            #[cfg(unix)]
            std::os::unix::fs::symlink(&target, &dst_path)?;
            #[cfg(not(unix))]
            return Err(CoreError::Io(std::io::Error::other(format!(
                "cannot copy symlink {} on this platform",
                src_path.display()
            ))));
        } else {
            fs::copy(&src_path, &dst_path)?;
            copy_times(&meta, &dst_path)?;
        }
    }

    let meta = fs::symlink_metadata(src)?;
    fs::set_permissions(dst, meta.permissions())?;
    copy_times(&meta, dst)?;
    Ok(())
}

fn copy_times(meta: &fs::Metadata, dst: &Path) -> Result<(), CoreError> {
    let atime = FileTime::from_last_access_time(meta);
    let mtime = FileTime::from_last_modification_time(meta);
    filetime::set_file_times(dst, atime, mtime)?;
    Ok(())
}

/// Fsync a directory so that a preceding `rename()` is durable. POSIX does
/// not guarantee rename durability without it on every filesystem.
fn fsync_dir(dir: &Path) -> Result<(), std::io::Error> {
    let f = fs::File::open(dir)?;
    f.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(work_dir: &Path, copy_dir: &Path, exclude: &[&str]) -> ContainerConfig {
        ContainerConfig {
            image: None,
            command: None,
            environment: None,
            work_dir: work_dir.to_string_lossy().into_owned(),
            cry_copy_dir: Some(copy_dir.to_string_lossy().into_owned()),
            exclude_from_copy: exclude.iter().map(|s| (*s).to_owned()).collect(),
            run_from_copy: false,
        }
    }

    /// proj/
    ///   src/{main.py, cache.pyc}
    ///   data.txt
    ///   .git/HEAD
    fn project_fixture(root: &Path) -> PathBuf {
        let proj = root.join("proj");
        fs::create_dir_all(proj.join("src")).unwrap();
        fs::write(proj.join("src/main.py"), "print('hi')\n").unwrap();
        fs::write(proj.join("src/cache.pyc"), b"\x00").unwrap();
        fs::write(proj.join("data.txt"), "corpus\n").unwrap();
        fs::create_dir(proj.join(".git")).unwrap();
        fs::write(proj.join(".git/HEAD"), "ref: refs/heads/main\n").unwrap();
        proj
    }

    #[test]
    fn copies_parent_of_work_dir_with_exclusions() {
        let dir = tempfile::tempdir().unwrap();
        let proj = project_fixture(dir.path());
        let copies = dir.path().join("copies");

        let cfg = container(&proj.join("src"), &copies, &["*.pyc", ".git"]);
        let dest = create_run_copy(&cfg).unwrap();

        assert!(dest.join("src/main.py").exists());
        assert!(dest.join("data.txt").exists());
        assert!(!dest.join("src/cache.pyc").exists());
        assert!(!dest.join(".git").exists());
    }

    #[test]
    fn two_runs_get_distinct_directories() {
        let dir = tempfile::tempdir().unwrap();
        let proj = project_fixture(dir.path());
        let copies = dir.path().join("copies");

        let cfg = container(&proj.join("src"), &copies, &[]);
        let first = create_run_copy(&cfg).unwrap();
        let second = create_run_copy(&cfg).unwrap();

        assert_ne!(first, second);
        assert!(first.join("src/main.py").exists());
        assert!(second.join("src/main.py").exists());
    }

    #[test]
    fn no_staging_left_behind_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let proj = project_fixture(dir.path());
        let copies = dir.path().join("copies");

        let cfg = container(&proj.join("src"), &copies, &[]);
        let dest = create_run_copy(&cfg).unwrap();

        let entries: Vec<_> = fs::read_dir(&copies)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0], dest.file_name().unwrap());
    }

    #[test]
    fn missing_copy_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let proj = project_fixture(dir.path());

        let mut cfg = container(&proj.join("src"), Path::new("unused"), &[]);
        cfg.cry_copy_dir = None;
        assert!(matches!(
            create_run_copy(&cfg),
            Err(CoreError::CopyDirUnset)
        ));
    }

    #[test]
    fn invalid_exclude_pattern_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let proj = project_fixture(dir.path());
        let copies = dir.path().join("copies");

        let cfg = container(&proj.join("src"), &copies, &["[broken"]);
        assert!(matches!(
            create_run_copy(&cfg),
            Err(CoreError::InvalidExcludePattern { .. })
        ));
    }

    #[test]
    fn copy_root_inside_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let proj = project_fixture(dir.path());

        let cfg = container(&proj.join("src"), &proj.join("copies"), &[]);
        assert!(matches!(
            create_run_copy(&cfg),
            Err(CoreError::SnapshotInsideSource(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_recreated_not_followed() {
        let dir = tempfile::tempdir().unwrap();
        let proj = project_fixture(dir.path());
        std::os::unix::fs::symlink("data.txt", proj.join("latest")).unwrap();
        let copies = dir.path().join("copies");

        let cfg = container(&proj.join("src"), &copies, &[]);
        let dest = create_run_copy(&cfg).unwrap();

        let copied = dest.join("latest");
        assert!(fs::symlink_metadata(&copied).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_link(&copied).unwrap(), Path::new("data.txt"));
    }

    #[test]
    fn preserves_file_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let proj = project_fixture(dir.path());
        let copies = dir.path().join("copies");

        let stamped = proj.join("data.txt");
        let old = FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_times(&stamped, old, old).unwrap();

        let cfg = container(&proj.join("src"), &copies, &[]);
        let dest = create_run_copy(&cfg).unwrap();

        let meta = fs::metadata(dest.join("data.txt")).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&meta), old);
    }
}
