//! The store facade: every filesystem operation the rest of the system is
//! allowed to perform, each one routed through the containment check first.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, StoreError};
use crate::path::resolve_under;
use crate::writer;

/// Filesystem-backed artifact store rooted at a single directory.
///
/// The root is injected at construction and immutable thereafter. All
/// relative paths are interpreted against it; none may resolve outside it.
/// Cloning is cheap — a clone shares the same root and therefore the same
/// on-disk state and lock namespace.
#[derive(Clone, Debug)]
pub struct Filestore {
    root: PathBuf,
}

impl Filestore {
    /// Create a facade over an existing store root.
    ///
    /// The root directory itself is provisioned by deployment; the store
    /// only creates directories below it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The store root all relative paths resolve against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative path to its absolute location under the root.
    ///
    /// Fails with [`StoreError::PathEscape`] if the normalized path leaves
    /// the root. Exposed for callers that hand the location to an external
    /// consumer (e.g. a file-streaming response).
    pub fn resolve(&self, relative: &str) -> Result<PathBuf> {
        resolve_under(&self.root, relative)
    }

    /// True iff a regular file exists at the resolved path.
    pub fn exists(&self, relative: &str) -> Result<bool> {
        Ok(self.resolve(relative)?.is_file())
    }

    /// Read the full contents of a file.
    pub fn read(&self, relative: &str) -> Result<Vec<u8>> {
        let target = self.resolve(relative)?;
        fs::read(&target).map_err(|err| not_found_or_io(relative, err))
    }

    /// Atomically write `reader`'s bytes to the resolved path.
    ///
    /// Serializes against concurrent writes to the same relative path;
    /// see the crate-level design rules. Fully idempotent at the target:
    /// re-running a failed write produces the same end state.
    pub fn write<R: Read>(&self, relative: &str, reader: R) -> Result<()> {
        let target = self.resolve(relative)?;
        if target == self.root {
            // An empty relative path names the root directory, not a file.
            return Err(StoreError::PathEscape {
                path: relative.to_string(),
            });
        }
        writer::write_file(&target, relative, reader)
    }

    /// Remove the file at the resolved path.
    ///
    /// Fails with [`StoreError::NotFound`] if absent; callers wanting an
    /// idempotent delete check [`Filestore::exists`] first.
    pub fn delete(&self, relative: &str) -> Result<()> {
        let target = self.resolve(relative)?;
        fs::remove_file(&target).map_err(|err| not_found_or_io(relative, err))?;
        debug!(path = relative, "deleted");
        Ok(())
    }

    /// Base names of the immediate subdirectories of the resolved directory,
    /// in filesystem enumeration order. A missing directory yields an empty
    /// list; files are excluded.
    pub fn directories_in(&self, relative: &str) -> Result<Vec<String>> {
        let dir = self.resolve(relative)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }

    /// Every `owner/name` directory pair two levels below the root, as
    /// relative path strings. Plain files at either level are excluded.
    pub fn boxes(&self) -> Result<Vec<String>> {
        let owners = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut boxes = Vec::new();
        for owner in owners {
            let owner = owner?;
            if !owner.file_type()?.is_dir() {
                continue;
            }
            let owner_name = owner.file_name().to_string_lossy().into_owned();
            for name in fs::read_dir(owner.path())? {
                let name = name?;
                if name.file_type()?.is_dir() {
                    boxes.push(format!(
                        "{}/{}",
                        owner_name,
                        name.file_name().to_string_lossy()
                    ));
                }
            }
        }
        Ok(boxes)
    }

    /// Walk every directory under the root, deepest first, removing any that
    /// contains no entries. Deepest-first means a leaf emptied by deletion
    /// can make its parent empty within the same pass.
    ///
    /// Not locked against concurrent writers: a directory may be recreated
    /// by an in-flight write right after being pruned. Emptiness is
    /// re-checked at visit time, and a directory that vanishes mid-walk is
    /// skipped.
    pub fn delete_empty_dirs(&self) -> Result<()> {
        for entry in WalkDir::new(&self.root).min_depth(1).contents_first(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if walk_error_is_not_found(&err) => continue,
                Err(err) => return Err(walk_error_to_store(err)),
            };
            if !entry.file_type().is_dir() {
                continue;
            }

            let dir = entry.path();
            let mut contents = match fs::read_dir(dir) {
                Ok(contents) => contents,
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => return Err(err.into()),
            };
            if contents.next().is_some() {
                continue;
            }

            match fs::remove_dir(dir) {
                Ok(()) => debug!(path = %dir.display(), "pruned empty directory"),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    warn!(path = %dir.display(), error = %err, "failed to prune directory");
                    return Err(err.into());
                }
            }
        }
        Ok(())
    }
}

fn not_found_or_io(relative: &str, err: io::Error) -> StoreError {
    if err.kind() == io::ErrorKind::NotFound {
        StoreError::NotFound {
            path: relative.to_string(),
        }
    } else {
        StoreError::Io(err)
    }
}

fn walk_error_is_not_found(err: &walkdir::Error) -> bool {
    err.io_error()
        .map(|io_err| io_err.kind() == io::ErrorKind::NotFound)
        .unwrap_or(false)
}

fn walk_error_to_store(err: walkdir::Error) -> StoreError {
    match err.into_io_error() {
        Some(io_err) => StoreError::Io(io_err),
        None => StoreError::Io(io::Error::other("directory walk failed")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use tempfile::tempdir;

    fn store(dir: &tempfile::TempDir) -> Filestore {
        Filestore::new(dir.path())
    }

    /// Reader that yields a few bytes, then fails mid-stream.
    struct FailingReader {
        yielded: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.yielded {
                Err(io::Error::other("stream interrupted"))
            } else {
                self.yielded = true;
                let chunk = b"partial ";
                buf[..chunk.len()].copy_from_slice(chunk);
                Ok(chunk.len())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Round-trip and basic operations
    // -----------------------------------------------------------------------

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let fs = store(&dir);

        fs.write("alice/trusty64/1.0/virtualbox/box", &b"payload bytes"[..])
            .unwrap();
        let contents = fs.read("alice/trusty64/1.0/virtualbox/box").unwrap();
        assert_eq!(contents, b"payload bytes");
    }

    #[test]
    fn write_creates_missing_ancestors() {
        let dir = tempdir().unwrap();
        let fs = store(&dir);

        fs.write("alice/trusty64/1.0/virtualbox/box", &b"x"[..])
            .unwrap();
        assert!(dir.path().join("alice/trusty64/1.0/virtualbox").is_dir());
    }

    #[test]
    fn write_leaves_no_lock_or_txn_files() {
        let dir = tempdir().unwrap();
        let fs = store(&dir);

        fs.write("alice/box1/1.0/virtualbox/box", &b"data"[..])
            .unwrap();

        let artifact_dir = dir.path().join("alice/box1/1.0/virtualbox");
        let names: Vec<_> = std::fs::read_dir(&artifact_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["box"]);
    }

    #[test]
    fn overwrite_replaces_contents() {
        let dir = tempdir().unwrap();
        let fs = store(&dir);

        fs.write("a/b/file", &b"first"[..]).unwrap();
        fs.write("a/b/file", &b"second"[..]).unwrap();
        assert_eq!(fs.read("a/b/file").unwrap(), b"second");
    }

    #[test]
    fn exists_reports_regular_files_only() {
        let dir = tempdir().unwrap();
        let fs = store(&dir);

        assert!(!fs.exists("a/b/file").unwrap());
        fs.write("a/b/file", &b"x"[..]).unwrap();
        assert!(fs.exists("a/b/file").unwrap());
        // A directory is not a file.
        assert!(!fs.exists("a/b").unwrap());
    }

    #[test]
    fn read_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let fs = store(&dir);

        let err = fs.read("missing/file").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn delete_removes_file() {
        let dir = tempdir().unwrap();
        let fs = store(&dir);

        fs.write("a/file", &b"x"[..]).unwrap();
        fs.delete("a/file").unwrap();
        assert!(!fs.exists("a/file").unwrap());
    }

    #[test]
    fn delete_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let fs = store(&dir);

        let err = fs.delete("a/file").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    // -----------------------------------------------------------------------
    // Containment: every operation rejects escaping paths before any I/O
    // -----------------------------------------------------------------------

    #[test]
    fn every_operation_rejects_escaping_paths() {
        let dir = tempdir().unwrap();
        let fs = store(&dir);
        let escape = "../outside_basedir";

        assert!(matches!(
            fs.exists(escape).unwrap_err(),
            StoreError::PathEscape { .. }
        ));
        assert!(matches!(
            fs.read(escape).unwrap_err(),
            StoreError::PathEscape { .. }
        ));
        assert!(matches!(
            fs.write(escape, &b"x"[..]).unwrap_err(),
            StoreError::PathEscape { .. }
        ));
        assert!(matches!(
            fs.delete(escape).unwrap_err(),
            StoreError::PathEscape { .. }
        ));
        assert!(matches!(
            fs.directories_in(escape).unwrap_err(),
            StoreError::PathEscape { .. }
        ));
        assert!(matches!(
            fs.resolve(escape).unwrap_err(),
            StoreError::PathEscape { .. }
        ));
    }

    #[test]
    fn rejected_write_performs_no_filesystem_mutation() {
        let dir = tempdir().unwrap();
        let fs = store(&dir);

        let _ = fs.write("../escaped", &b"x"[..]).unwrap_err();

        // Nothing appeared next to the store root.
        let sibling = dir.path().parent().unwrap().join("escaped");
        assert!(!sibling.exists());
        // Nothing appeared inside it either.
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn write_to_root_itself_is_rejected() {
        let dir = tempdir().unwrap();
        let fs = store(&dir);

        let err = fs.write("", &b"x"[..]).unwrap_err();
        assert!(matches!(err, StoreError::PathEscape { .. }));
        let err = fs.write("a/..", &b"x"[..]).unwrap_err();
        assert!(matches!(err, StoreError::PathEscape { .. }));
    }

    // -----------------------------------------------------------------------
    // Atomicity: interrupted writes leave no trace
    // -----------------------------------------------------------------------

    #[test]
    fn failed_write_leaves_no_target_and_no_remnants() {
        let dir = tempdir().unwrap();
        let fs = store(&dir);

        let err = fs
            .write("alice/box1/1.0/virtualbox/box", FailingReader { yielded: false })
            .unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));

        let artifact_dir = dir.path().join("alice/box1/1.0/virtualbox");
        assert!(!artifact_dir.join("box").exists());
        assert!(!artifact_dir.join("box.txn").exists());
        assert!(!artifact_dir.join("box.lock").exists());
    }

    #[test]
    fn failed_write_leaves_previous_content_untouched() {
        let dir = tempdir().unwrap();
        let fs = store(&dir);

        fs.write("a/file", &b"original"[..]).unwrap();
        let err = fs
            .write("a/file", FailingReader { yielded: false })
            .unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));

        assert_eq!(fs.read("a/file").unwrap(), b"original");
        assert!(!dir.path().join("a/file.txn").exists());
        assert!(!dir.path().join("a/file.lock").exists());
    }

    #[test]
    fn write_is_idempotent_after_failure() {
        let dir = tempdir().unwrap();
        let fs = store(&dir);

        let _ = fs.write("a/file", FailingReader { yielded: false });
        fs.write("a/file", &b"retried"[..]).unwrap();
        assert_eq!(fs.read("a/file").unwrap(), b"retried");
    }

    // -----------------------------------------------------------------------
    // Serialization: concurrent writers to one path never interleave
    // -----------------------------------------------------------------------

    #[test]
    fn concurrent_writes_to_same_path_serialize() {
        let dir = tempdir().unwrap();
        let fs = Arc::new(store(&dir));
        let barrier = Arc::new(Barrier::new(2));

        let payload_len = 1 << 20;
        let handles: Vec<_> = [0xAAu8, 0xBBu8]
            .into_iter()
            .map(|byte| {
                let fs = Arc::clone(&fs);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let payload = vec![byte; payload_len];
                    barrier.wait();
                    fs.write("alice/box1/1.0/virtualbox/box", payload.as_slice())
                        .unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("writer thread panicked");
        }

        let contents = fs.read("alice/box1/1.0/virtualbox/box").unwrap();
        assert_eq!(contents.len(), payload_len);
        // Winner unspecified, but the content is exactly one input, no mix.
        let first = contents[0];
        assert!(first == 0xAA || first == 0xBB);
        assert!(contents.iter().all(|&b| b == first));

        let artifact_dir = dir.path().join("alice/box1/1.0/virtualbox");
        assert!(!artifact_dir.join("box.txn").exists());
        assert!(!artifact_dir.join("box.lock").exists());
    }

    #[test]
    fn concurrent_writes_to_different_paths_proceed() {
        let dir = tempdir().unwrap();
        let fs = Arc::new(store(&dir));
        let barrier = Arc::new(Barrier::new(4));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let fs = Arc::clone(&fs);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let path = format!("owner{i}/box/1.0/virtualbox/box");
                    fs.write(&path, format!("payload-{i}").as_bytes()).unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("writer thread panicked");
        }

        for i in 0..4 {
            let path = format!("owner{i}/box/1.0/virtualbox/box");
            assert_eq!(fs.read(&path).unwrap(), format!("payload-{i}").as_bytes());
        }
    }

    // -----------------------------------------------------------------------
    // Directory listing and inventory
    // -----------------------------------------------------------------------

    #[test]
    fn directories_in_excludes_files() {
        let dir = tempdir().unwrap();
        let fs = store(&dir);

        std::fs::create_dir_all(dir.path().join("dir/1")).unwrap();
        std::fs::create_dir_all(dir.path().join("dir/2")).unwrap();
        std::fs::write(dir.path().join("dir/file.txt"), b"x").unwrap();

        let mut names = fs.directories_in("dir").unwrap();
        names.sort();
        assert_eq!(names, vec!["1", "2"]);
    }

    #[test]
    fn directories_in_missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        let fs = store(&dir);

        assert!(fs.directories_in("nope").unwrap().is_empty());
    }

    #[test]
    fn boxes_lists_owner_name_pairs() {
        let dir = tempdir().unwrap();
        let fs = store(&dir);

        fs.write("alice/box1/1.0/virtualbox/box", &b"a"[..]).unwrap();
        fs.write("bob/box2/2.0/libvirt/box", &b"b"[..]).unwrap();
        // A plain file directly under the root is not a box.
        std::fs::write(dir.path().join("stray.txt"), b"x").unwrap();

        let mut boxes = fs.boxes().unwrap();
        boxes.sort();
        assert_eq!(boxes, vec!["alice/box1", "bob/box2"]);
    }

    #[test]
    fn boxes_on_empty_root_is_empty() {
        let dir = tempdir().unwrap();
        let fs = store(&dir);
        assert!(fs.boxes().unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // Pruning
    // -----------------------------------------------------------------------

    #[test]
    fn delete_then_prune_removes_empty_chain() {
        let dir = tempdir().unwrap();
        let fs = store(&dir);

        fs.write("alice/box1/1.0/virtualbox/box", &b"a"[..]).unwrap();
        fs.write("alice/box2/1.0/libvirt/box", &b"b"[..]).unwrap();

        fs.delete("alice/box1/1.0/virtualbox/box").unwrap();
        fs.delete_empty_dirs().unwrap();

        // The emptied chain under box1 is gone...
        assert!(!dir.path().join("alice/box1").exists());
        // ...but alice still holds box2.
        assert!(dir.path().join("alice/box2/1.0/libvirt/box").is_file());
    }

    #[test]
    fn prune_removes_owner_when_last_box_goes() {
        let dir = tempdir().unwrap();
        let fs = store(&dir);

        fs.write("alice/box1/1.0/virtualbox/box", &b"a"[..]).unwrap();
        fs.delete("alice/box1/1.0/virtualbox/box").unwrap();
        fs.delete_empty_dirs().unwrap();

        assert!(!dir.path().join("alice").exists());
    }

    #[test]
    fn prune_is_deepest_first_within_one_pass() {
        let dir = tempdir().unwrap();
        let fs = store(&dir);

        // A chain of directories empty all the way down.
        std::fs::create_dir_all(dir.path().join("a/b/c/d")).unwrap();
        fs.delete_empty_dirs().unwrap();

        assert!(!dir.path().join("a").exists());
    }

    #[test]
    fn prune_twice_is_a_no_op_the_second_time() {
        let dir = tempdir().unwrap();
        let fs = store(&dir);

        fs.write("alice/box1/1.0/virtualbox/box", &b"a"[..]).unwrap();
        fs.delete("alice/box1/1.0/virtualbox/box").unwrap();
        fs.delete_empty_dirs().unwrap();

        let before: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        fs.delete_empty_dirs().unwrap();
        let after: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(before.len(), after.len());
    }

    #[test]
    fn prune_keeps_directories_with_files() {
        let dir = tempdir().unwrap();
        let fs = store(&dir);

        fs.write("alice/box1/1.0/virtualbox/box", &b"a"[..]).unwrap();
        fs.delete_empty_dirs().unwrap();

        assert!(fs.exists("alice/box1/1.0/virtualbox/box").unwrap());
    }
}
