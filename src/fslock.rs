//! Filesystem Access Serializer
//!
//! The underlying filesystem is not safe to enter from two processes at
//! once, so every filesystem-affecting operation runs under this one lock.
//! The serializer owns the filesystem: the only way to reach it is through
//! the guard, which also proves exclusion for operations on handles the
//! filesystem handed out earlier.
//!
//! Held for the span of one filesystem call, never across a blocking wait.
//! Console and keyboard I/O bypass it entirely.

use alloc::boxed::Box;
use spin::{Mutex, MutexGuard};

use crate::hal::FileSystem;

/// Mutual-exclusion domain around the filesystem.
pub struct FsSerializer {
    fs: Mutex<Box<dyn FileSystem>>,
}

impl FsSerializer {
    pub fn new(fs: Box<dyn FileSystem>) -> Self {
        Self { fs: Mutex::new(fs) }
    }

    /// Acquire exclusive filesystem access. Released when the guard drops,
    /// on every exit path.
    pub fn lock(&self) -> MutexGuard<'_, Box<dyn FileSystem>> {
        self.fs.lock()
    }
}
