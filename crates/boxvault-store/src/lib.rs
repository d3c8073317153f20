//! Filesystem storage engine for boxvault.
//!
//! A [`Filestore`] maps caller-supplied relative paths onto a single root
//! directory and performs all reads, writes, deletes, and listings there.
//! Artifact payloads are opaque bytes; the store keeps no index and no
//! in-memory cache — every operation re-reads the filesystem.
//!
//! # Design Rules
//!
//! 1. Every operation resolves its path through the containment check before
//!    any filesystem syscall. A path that normalizes outside the root is
//!    rejected with [`StoreError::PathEscape`], no matter which operation
//!    received it.
//! 2. Writes are transactional: bytes are staged into a `.txn` sibling,
//!    flushed to stable storage, then renamed over the target. Rename is the
//!    sole atomicity primitive — a reader observes either the complete old
//!    content or the complete new content, never a mix.
//! 3. Writers to the same relative path serialize on an exclusive advisory
//!    lock held on a `.lock` sibling. Writers to different paths do not
//!    coordinate. Reads never take the lock.
//! 4. Neither `.txn` nor `.lock` files survive a write, successful or not.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod filestore;
pub mod path;
mod writer;

pub use error::{Result, StoreError};
pub use filestore::Filestore;
