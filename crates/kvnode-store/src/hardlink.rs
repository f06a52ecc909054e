//! Snapshot-time file linking with copy fallback (§4.8).
//!
//! Grounded on `original_source/node/util.go`'s `CopyFileForHardLink`:
//! prefer a hard link so replicas sharing a filesystem avoid copying
//! snapshot data files, falling back to a real copy when the link fails
//! (cross-device, read-only destination filesystem, etc).

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use crate::StoreError;

/// Links (or, failing that, copies) `src` to `dst`.
///
/// `dst`'s parent directory is created if missing. If `dst` already
/// exists and is the same inode as `src`, this is a no-op. A copy
/// fallback removes any existing `dst` first: writing through an existing
/// hard link would mutate `src` too, which would silently corrupt any
/// other replica or snapshot sharing that inode.
pub fn link_or_copy(src: &Path, dst: &Path) -> Result<(), StoreError> {
    let src_meta = fs::metadata(src)?;
    if !src_meta.is_file() {
        return Err(StoreError::NotRegularFile(src.to_path_buf()));
    }

    match fs::metadata(dst) {
        Ok(dst_meta) => {
            if !dst_meta.is_file() {
                return Err(StoreError::NotRegularFile(dst.to_path_buf()));
            }
            if same_file(&src_meta, &dst_meta) {
                return Ok(());
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            if let Some(parent) = dst.parent() {
                fs::create_dir_all(parent)?;
            }
        }
        Err(err) => return Err(err.into()),
    }

    if fs::hard_link(src, dst).is_ok() {
        return Ok(());
    }

    copy_contents(src, dst, &src_meta)
}

fn same_file(a: &fs::Metadata, b: &fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    a.dev() == b.dev() && a.ino() == b.ino()
}

fn copy_contents(src: &Path, dst: &Path, src_meta: &fs::Metadata) -> Result<(), StoreError> {
    match fs::remove_file(dst) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err.into()),
    }

    let mut src_file = fs::File::open(src)?;
    let mut dst_file = fs::File::create(dst)?;
    io::copy(&mut src_file, &mut dst_file)?;
    dst_file.sync_all()?;
    fs::set_permissions(dst, fs::Permissions::from_mode(src_meta.permissions().mode()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn links_when_possible() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.dat");
        fs::write(&src, b"hello").unwrap();

        let dst = dir.path().join("nested/dst.dat");
        link_or_copy(&src, &dst).unwrap();

        assert_eq!(fs::read(&dst).unwrap(), b"hello");
        let src_meta = fs::metadata(&src).unwrap();
        let dst_meta = fs::metadata(&dst).unwrap();
        assert!(same_file(&src_meta, &dst_meta));
    }

    #[test]
    fn already_linked_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.dat");
        fs::write(&src, b"hello").unwrap();
        let dst = dir.path().join("dst.dat");
        fs::hard_link(&src, &dst).unwrap();

        link_or_copy(&src, &dst).unwrap();
        assert_eq!(fs::read(&dst).unwrap(), b"hello");
    }

    #[test]
    fn rejects_non_regular_source() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("adir");
        fs::create_dir(&src).unwrap();
        let dst = dir.path().join("dst.dat");

        assert!(matches!(
            link_or_copy(&src, &dst),
            Err(StoreError::NotRegularFile(_))
        ));
    }

    #[test]
    fn copy_fallback_never_mutates_src_through_shared_inode() {
        // Simulate the "hard_link fails" path by copying directly and
        // asserting the invariant it exists to protect: a later write to
        // dst must never alias src's bytes.
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.dat");
        fs::write(&src, b"original").unwrap();
        let dst = dir.path().join("dst.dat");

        let src_meta = fs::metadata(&src).unwrap();
        copy_contents(&src, &dst, &src_meta).unwrap();

        let mut f = fs::OpenOptions::new().write(true).open(&dst).unwrap();
        f.write_all(b"mutated!").unwrap();
        drop(f);

        assert_eq!(fs::read(&src).unwrap(), b"original");
    }
}
