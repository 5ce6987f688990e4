//! File Descriptor Table
//!
//! Per-process mapping from small integer handles to open files.
//! Descriptors 0 and 1 are wired to the keyboard and console and are never
//! stored here; file descriptors start at 2 and are allocated
//! monotonically, never reused within a process lifetime, so a stale fd
//! after `close` can never alias a newer file.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;

use crate::hal::FileHandle;

/// Keyboard input.
pub const STDIN_FD: i32 = 0;
/// Console output.
pub const STDOUT_FD: i32 = 1;
/// First descriptor handed out for real files.
pub const FIRST_FILE_FD: i32 = 2;

/// Open-file table for one process.
pub struct FdTable {
    next: i32,
    open: BTreeMap<i32, Box<dyn FileHandle>>,
}

impl FdTable {
    pub fn new() -> Self {
        Self {
            next: FIRST_FILE_FD,
            open: BTreeMap::new(),
        }
    }

    /// Store `handle` under the next unused descriptor and return it.
    pub fn add(&mut self, handle: Box<dyn FileHandle>) -> i32 {
        let fd = self.next;
        self.next += 1;
        self.open.insert(fd, handle);
        fd
    }

    /// Look up an open file. `None` for 0, 1, closed, or never-opened fds.
    pub fn get_mut(&mut self, fd: i32) -> Option<&mut Box<dyn FileHandle>> {
        self.open.get_mut(&fd)
    }

    /// Close `fd`, releasing the handle. Unknown fds are a no-op.
    pub fn close(&mut self, fd: i32) {
        self.open.remove(&fd);
    }

    /// Release every open handle. Called once, at process exit.
    pub fn close_all(&mut self) {
        self.open.clear();
    }

    /// Number of open files.
    pub fn open_count(&self) -> usize {
        self.open.len()
    }
}

impl Default for FdTable {
    fn default() -> Self {
        Self::new()
    }
}
