//! Process Lifecycle and Child Registry
//!
//! Per-process bookkeeping for spawned children: load outcome, exit status,
//! and the synchronization behind `exec` and `wait`.
//!
//! # Ownership
//! The parent's registry and the child itself share each [`ChildEntry`]
//! through an `Arc`; there are no raw back-references. When the parent dies
//! first the entry is orphaned (a flag the child checks before writing its
//! exit status); when the child dies first the parent still holds the entry
//! and `wait` reads the recorded status without blocking.
//!
//! # Synchronization
//! One entry is mutated by two threads of control (parent and child), so it
//! carries its own one-shot signals, independent of the filesystem lock.

mod signal;

pub use signal::OneShot;

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

use spin::Mutex;

use crate::fd::FdTable;
use crate::hal::{Machine, Spawner};

/// Exit status reported for processes killed by the kernel (bad pointer,
/// unknown syscall) and returned by failed `exec`/`wait`.
pub const KILLED: i32 = -1;

/// Process identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(transparent)]
pub struct Pid(pub i32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Terminal result of a child's attempt to load its executable.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LoadOutcome {
    Loaded,
    Failed,
}

/// Load progress as observable by the parent.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LoadState {
    NotLoaded,
    Loaded,
    Failed,
}

/// One child's bookkeeping record, shared between parent and child.
pub struct ChildEntry {
    load: OneShot<LoadOutcome>,
    exit: OneShot<i32>,
    parent_alive: AtomicBool,
}

impl ChildEntry {
    pub fn new() -> Self {
        Self {
            load: OneShot::new(),
            exit: OneShot::new(),
            parent_alive: AtomicBool::new(true),
        }
    }

    /// Report the load outcome. Called by the child exactly once, right
    /// after its load attempt; wakes a parent blocked in `exec`.
    pub fn complete_load(&self, outcome: LoadOutcome) {
        self.load.signal(outcome);
    }

    /// Load progress so far. `NotLoaded` until the child reports.
    pub fn load_state(&self) -> LoadState {
        match self.load.poll() {
            None => LoadState::NotLoaded,
            Some(LoadOutcome::Loaded) => LoadState::Loaded,
            Some(LoadOutcome::Failed) => LoadState::Failed,
        }
    }

    /// Block until the child has reported its load outcome.
    pub fn wait_load(&self) -> LoadOutcome {
        self.load.wait()
    }

    /// Record the child's exit status and wake a parent blocked in `wait`.
    /// A no-op once the parent is gone; nobody will ever read it.
    pub fn record_exit(&self, status: i32) {
        if self.parent_alive.load(Ordering::Acquire) {
            self.exit.signal(status);
        }
    }

    /// Block until the exit status is recorded.
    pub fn wait_exit(&self) -> i32 {
        self.exit.wait()
    }

    fn orphan(&self) {
        self.parent_alive.store(false, Ordering::Release);
    }

    /// Whether the parent can still read this entry.
    pub fn parent_alive(&self) -> bool {
        self.parent_alive.load(Ordering::Acquire)
    }
}

impl Default for ChildEntry {
    fn default() -> Self {
        Self::new()
    }
}

/// A process's registry of its live (not yet waited) children.
pub struct ChildRegistry {
    children: Mutex<BTreeMap<Pid, Arc<ChildEntry>>>,
}

impl ChildRegistry {
    pub fn new() -> Self {
        Self {
            children: Mutex::new(BTreeMap::new()),
        }
    }

    /// Record `entry` as the bookkeeping for child `pid`.
    pub fn register(&self, pid: Pid, entry: Arc<ChildEntry>) {
        self.children.lock().insert(pid, entry);
    }

    /// Remove and return the entry for `pid`. `None` if `pid` is not a
    /// still-registered child (never was one, or was already waited on).
    pub fn take(&self, pid: Pid) -> Option<Arc<ChildEntry>> {
        self.children.lock().remove(&pid)
    }

    /// Mark every remaining entry parent-gone and drop the registry's
    /// references. Called at parent exit.
    pub fn orphan_all(&self) {
        let mut children = self.children.lock();
        for entry in children.values() {
            entry.orphan();
        }
        children.clear();
    }

    /// Number of registered (unwaited) children.
    pub fn live_count(&self) -> usize {
        self.children.lock().len()
    }
}

impl Default for ChildRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The slice of a process control block owned by this core.
///
/// The scheduler owns the rest (kernel stack, register save area, page
/// directory). `parent` is this process's own entry in its parent's
/// registry, `None` for the initial process.
pub struct Process {
    pub pid: Pid,
    pub name: String,
    pub fds: Mutex<FdTable>,
    pub children: ChildRegistry,
    pub parent: Option<Arc<ChildEntry>>,
}

impl Process {
    pub fn new(pid: Pid, name: &str, parent: Option<Arc<ChildEntry>>) -> Self {
        Self {
            pid,
            name: String::from(name),
            fds: Mutex::new(FdTable::new()),
            children: ChildRegistry::new(),
            parent,
        }
    }
}

/// Spawn a process running `cmdline` and block until its load outcome is
/// known. Returns the new pid, or `None` if the process could not be
/// created or its executable failed to load (in which case the registry
/// entry is removed again; there is nothing left to wait for).
pub fn exec(cur: &Process, spawner: &dyn Spawner, cmdline: &str) -> Option<Pid> {
    let entry = Arc::new(ChildEntry::new());
    let pid = spawner.spawn(cmdline, Arc::clone(&entry))?;
    cur.children.register(pid, Arc::clone(&entry));
    log::debug!("{}: exec '{}' -> pid {}", cur.name, cmdline, pid);
    match entry.wait_load() {
        LoadOutcome::Loaded => Some(pid),
        LoadOutcome::Failed => {
            cur.children.take(pid);
            None
        }
    }
}

/// Wait for child `pid` to exit and return its status. `None` immediately,
/// without blocking, if `pid` is not a still-registered child of `cur`;
/// a second wait on the same pid therefore fails.
pub fn wait(cur: &Process, pid: Pid) -> Option<i32> {
    let entry = cur.children.take(pid)?;
    Some(entry.wait_exit())
}

/// Process-exit bookkeeping. Called exactly once per process: by the EXIT
/// handler, by the fatal-fault path, or by the embedder for any other
/// death.
///
/// Prints the conventional `name: exit(status)` line, releases every open
/// file, orphans remaining children, and finally reports the status to the
/// parent (skipped when the parent is already gone). Reporting last means
/// the parent's `wait` returns only after this process's files are closed.
pub fn exit(cur: &Process, m: &Machine<'_>, status: i32) {
    log::debug!("{}: exit({})", cur.name, status);

    let line = format!("{}: exit({})\n", cur.name, status);
    m.console.write(line.as_bytes());

    {
        let _fs = m.fs.lock();
        cur.fds.lock().close_all();
    }

    cur.children.orphan_all();

    if let Some(entry) = &cur.parent {
        entry.record_exit(status);
    }
}
