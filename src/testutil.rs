//! Mock collaborators for the unit tests.
//!
//! A fake page-translation service backed by a host buffer, an in-memory
//! filesystem whose open handles survive removal, a recording console,
//! a scripted keyboard, and a thread-backed spawner whose fake children
//! report a scripted load outcome and exit status.

use std::cell::UnsafeCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use spin::Mutex;

use crate::fslock::FsSerializer;
use crate::hal::{
    Console, FileHandle, FileSystem, Keyboard, Machine, PageTranslate, Power, Spawner,
};
use crate::process::{ChildEntry, LoadOutcome, Pid};
use crate::usermem::{UserVa, USER_BOTTOM};

const PAGE: u32 = 0x1000;

/// Fake user address space: a host buffer standing in for the pages mapped
/// at `[USER_BOTTOM, USER_BOTTOM + size)`, with individually unmappable
/// pages.
pub struct FakePages {
    mem: UnsafeCell<Box<[u8]>>,
    size: u32,
    unmapped: BTreeSet<u32>,
}

// Tests hand out raw pointers into `mem` the same way a page directory
// hands out kernel addresses; the tests serialize access themselves.
unsafe impl Send for FakePages {}
unsafe impl Sync for FakePages {}

impl FakePages {
    pub fn new(size: u32) -> Self {
        Self {
            mem: UnsafeCell::new(vec![0u8; size as usize].into_boxed_slice()),
            size,
            unmapped: BTreeSet::new(),
        }
    }

    /// Pull page `idx` (counted from `USER_BOTTOM`) out of the mapping.
    pub fn unmap_page(&mut self, idx: u32) {
        self.unmapped.insert(idx);
    }

    fn offset(&self, va: UserVa) -> Option<u32> {
        let off = va.as_u32().checked_sub(USER_BOTTOM)?;
        (off < self.size).then_some(off)
    }

    /// Write bytes directly into fake user memory, bypassing validation.
    pub fn poke(&self, va: UserVa, bytes: &[u8]) {
        let off = self.offset(va).expect("poke outside fake user memory") as usize;
        // SAFETY: test-only buffer, accessed from one test at a time.
        let mem = unsafe { &mut *self.mem.get() };
        mem[off..off + bytes.len()].copy_from_slice(bytes);
    }

    /// Write one little-endian word into fake user memory.
    pub fn poke_word(&self, va: UserVa, word: i32) {
        self.poke(va, &word.to_le_bytes());
    }

    /// Read bytes directly out of fake user memory.
    pub fn peek(&self, va: UserVa, len: usize) -> Vec<u8> {
        let off = self.offset(va).expect("peek outside fake user memory") as usize;
        // SAFETY: see poke().
        let mem = unsafe { &*self.mem.get() };
        mem[off..off + len].to_vec()
    }
}

impl PageTranslate for FakePages {
    fn translate(&self, va: UserVa) -> Option<*mut u8> {
        let off = self.offset(va)?;
        if self.unmapped.contains(&(off / PAGE)) {
            return None;
        }
        // SAFETY: offset is in bounds; the pointer stays valid as long as
        // the FakePages lives, which outlives every test use.
        Some(unsafe { (*self.mem.get()).as_mut_ptr().add(off as usize) })
    }
}

/// In-memory file contents, shared between the directory and open handles
/// so removal does not invalidate handles.
type FileData = Arc<Mutex<Vec<u8>>>;

/// In-memory filesystem with create/remove/open.
#[derive(Default)]
pub struct MemFs {
    files: BTreeMap<String, FileData>,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FileSystem for MemFs {
    fn create(&mut self, name: &str, initial_size: u32) -> bool {
        if name.is_empty() || self.files.contains_key(name) {
            return false;
        }
        self.files
            .insert(name.to_string(), Arc::new(Mutex::new(vec![0; initial_size as usize])));
        true
    }

    fn remove(&mut self, name: &str) -> bool {
        self.files.remove(name).is_some()
    }

    fn open(&mut self, name: &str) -> Option<Box<dyn FileHandle>> {
        let data = Arc::clone(self.files.get(name)?);
        Some(Box::new(MemFile { data, pos: 0 }))
    }
}

struct MemFile {
    data: FileData,
    pos: u32,
}

impl FileHandle for MemFile {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        let data = self.data.lock();
        let pos = self.pos as usize;
        if pos >= data.len() {
            return 0;
        }
        let n = buf.len().min(data.len() - pos);
        buf[..n].copy_from_slice(&data[pos..pos + n]);
        self.pos += n as u32;
        n
    }

    fn write(&mut self, buf: &[u8]) -> usize {
        let mut data = self.data.lock();
        let pos = self.pos as usize;
        if pos + buf.len() > data.len() {
            data.resize(pos + buf.len(), 0);
        }
        data[pos..pos + buf.len()].copy_from_slice(buf);
        self.pos += buf.len() as u32;
        buf.len()
    }

    fn seek(&mut self, pos: u32) {
        self.pos = pos;
    }

    fn tell(&self) -> u32 {
        self.pos
    }

    fn len(&self) -> u32 {
        self.data.lock().len() as u32
    }
}

/// Console that records everything written to it.
#[derive(Default)]
pub struct RecordingConsole {
    bytes: Mutex<Vec<u8>>,
}

impl RecordingConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_bytes(&self) -> Vec<u8> {
        core::mem::take(&mut *self.bytes.lock())
    }

    pub fn take_string(&self) -> String {
        String::from_utf8(self.take_bytes()).unwrap()
    }
}

impl Console for RecordingConsole {
    fn write(&self, bytes: &[u8]) {
        self.bytes.lock().extend_from_slice(bytes);
    }
}

/// Keyboard that replays scripted input.
#[derive(Default)]
pub struct ScriptedKeyboard {
    queue: Mutex<VecDeque<u8>>,
}

impl ScriptedKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn type_str(&self, s: &str) {
        self.queue.lock().extend(s.bytes());
    }
}

impl Keyboard for ScriptedKeyboard {
    fn getc(&self) -> u8 {
        self.queue.lock().pop_front().unwrap_or(0)
    }
}

/// Power control that remembers whether it was pulled.
#[derive(Default)]
pub struct FakePower {
    off: AtomicBool,
}

impl FakePower {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_off(&self) -> bool {
        self.off.load(Ordering::SeqCst)
    }
}

impl Power for FakePower {
    fn power_off(&self) {
        self.off.store(true, Ordering::SeqCst);
    }
}

/// Spawner whose children are host threads: each reports the scripted load
/// outcome through its entry and, if loaded, immediately exits with the
/// scripted status.
pub struct FakeSpawner {
    outcome: Mutex<LoadOutcome>,
    exit_status: AtomicI32,
    delay: Mutex<Duration>,
    next_pid: AtomicI32,
    spawned: AtomicUsize,
}

impl FakeSpawner {
    pub fn new() -> Self {
        Self {
            outcome: Mutex::new(LoadOutcome::Loaded),
            exit_status: AtomicI32::new(0),
            delay: Mutex::new(Duration::from_millis(5)),
            next_pid: AtomicI32::new(2),
            spawned: AtomicUsize::new(0),
        }
    }

    pub fn script_load(&self, outcome: LoadOutcome) {
        *self.outcome.lock() = outcome;
    }

    pub fn script_exit(&self, status: i32) {
        self.exit_status.store(status, Ordering::SeqCst);
    }

    pub fn delay(&self, d: Duration) {
        *self.delay.lock() = d;
    }

    pub fn spawn_count(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }
}

impl Default for FakeSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl Spawner for FakeSpawner {
    fn spawn(&self, _cmdline: &str, entry: Arc<ChildEntry>) -> Option<Pid> {
        let pid = Pid(self.next_pid.fetch_add(1, Ordering::SeqCst));
        self.spawned.fetch_add(1, Ordering::SeqCst);
        let outcome = *self.outcome.lock();
        let status = self.exit_status.load(Ordering::SeqCst);
        let delay = *self.delay.lock();
        thread::spawn(move || {
            thread::sleep(delay);
            entry.complete_load(outcome);
            if outcome == LoadOutcome::Loaded {
                entry.record_exit(status);
            }
        });
        Some(pid)
    }
}

/// One of everything, ready to be lent to a [`Machine`].
pub struct Fixture {
    pub pages: FakePages,
    pub fs: FsSerializer,
    pub console: RecordingConsole,
    pub keyboard: ScriptedKeyboard,
    pub power: FakePower,
    pub spawner: FakeSpawner,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            pages: FakePages::new(16 * PAGE),
            fs: FsSerializer::new(Box::new(MemFs::new())),
            console: RecordingConsole::new(),
            keyboard: ScriptedKeyboard::new(),
            power: FakePower::new(),
            spawner: FakeSpawner::new(),
        }
    }
}

/// Borrow a fixture as the dispatcher sees it.
pub fn machine(fx: &Fixture) -> Machine<'_> {
    Machine {
        pages: &fx.pages,
        fs: &fx.fs,
        console: &fx.console,
        keyboard: &fx.keyboard,
        power: &fx.power,
        spawner: &fx.spawner,
    }
}
