//! Collaborator Interfaces
//!
//! Narrow traits for the services this core consumes but does not
//! implement: address translation, the filesystem, raw console and keyboard
//! I/O, power control, and process creation. The board layer implements
//! these; the test suite substitutes mocks.

use alloc::boxed::Box;
use alloc::sync::Arc;

use crate::process::{ChildEntry, Pid};
use crate::usermem::UserVa;

/// Address-translation query against the current process's page directory.
///
/// The validator delegates all page-mapping questions here; it never
/// inspects page tables itself.
pub trait PageTranslate: Sync {
    /// Return the kernel-accessible address backing `va`, or `None` if the
    /// page is not mapped.
    fn translate(&self, va: UserVa) -> Option<*mut u8>;
}

/// One open file.
///
/// Handles stay valid after the underlying name is removed; a handle is
/// released by dropping it.
pub trait FileHandle: Send {
    /// Read up to `buf.len()` bytes at the current position.
    fn read(&mut self, buf: &mut [u8]) -> usize;
    /// Write `buf` at the current position, returning bytes written.
    fn write(&mut self, buf: &[u8]) -> usize;
    /// Move the position to `pos` bytes from the start.
    fn seek(&mut self, pos: u32);
    /// Current position in bytes.
    fn tell(&self) -> u32;
    /// File length in bytes.
    fn len(&self) -> u32;
}

/// The on-disk filesystem. Not concurrency-safe; every call must happen
/// under the [`crate::fslock::FsSerializer`] guard.
pub trait FileSystem: Send {
    /// Create `name` with the given initial size. False on failure.
    fn create(&mut self, name: &str, initial_size: u32) -> bool;
    /// Remove `name`. False on failure. Open handles are unaffected.
    fn remove(&mut self, name: &str) -> bool;
    /// Open `name`, or `None` if it does not exist.
    fn open(&mut self, name: &str) -> Option<Box<dyn FileHandle>>;
}

/// Raw console byte output (fd 1). Bypasses the filesystem serializer.
pub trait Console: Sync {
    fn write(&self, bytes: &[u8]);
}

/// Raw keyboard input (fd 0). Blocks until a byte is available.
pub trait Keyboard: Sync {
    fn getc(&self) -> u8;
}

/// Machine power control, for HALT.
pub trait Power: Sync {
    fn power_off(&self);
}

/// Process creation.
///
/// `spawn` creates a new process running `cmdline` and hands it `entry` as
/// its back-reference into the parent's child registry: the new process
/// must call [`ChildEntry::complete_load`] exactly once after its load
/// attempt, and the embedder must route its eventual death through
/// [`crate::process::exit`] so the exit status lands in the same entry.
///
/// Returns `None` only if the process could not be created at all; a
/// created process whose executable fails to load still reports that
/// through the entry.
pub trait Spawner: Sync {
    fn spawn(&self, cmdline: &str, entry: Arc<ChildEntry>) -> Option<Pid>;
}

/// Everything the dispatcher needs from the outside world for one trap.
///
/// `pages` must be the translation service for the *calling* process's page
/// directory.
pub struct Machine<'m> {
    pub pages: &'m dyn PageTranslate,
    pub fs: &'m crate::fslock::FsSerializer,
    pub console: &'m dyn Console,
    pub keyboard: &'m dyn Keyboard,
    pub power: &'m dyn Power,
    pub spawner: &'m dyn Spawner,
}
