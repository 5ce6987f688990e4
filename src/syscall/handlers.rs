//! Individual syscall handlers.
//!
//! Each handler re-validates the arguments that claim to be pointers,
//! strings, or buffers before touching them, takes the filesystem lock for
//! the span of one operation, and returns a sentinel (−1, or false as 0)
//! for recoverable failures. Fatal user-memory faults propagate out as
//! [`Fault`] and terminate the caller in the dispatcher.

use alloc::vec;
use alloc::vec::Vec;

use crate::fd::{STDIN_FD, STDOUT_FD};
use crate::hal::Machine;
use crate::process::{self, Pid, Process, KILLED};
use crate::usermem::{Fault, UserMem, UserVa};

/// EXEC: spawn from a command line, block until its load outcome is known.
pub(super) fn exec(
    cur: &Process,
    m: &Machine<'_>,
    um: &UserMem<'_>,
    cmdline_ptr: i32,
) -> Result<i32, Fault> {
    let cmdline = um.read_string(UserVa::new(cmdline_ptr as u32))?;
    Ok(match process::exec(cur, m.spawner, &cmdline) {
        Some(pid) => pid.0,
        None => KILLED,
    })
}

/// WAIT: reap one child. −1 for pids that are not waitable children.
pub(super) fn wait(cur: &Process, pid: i32) -> i32 {
    process::wait(cur, Pid(pid)).unwrap_or(KILLED)
}

/// CREATE: returns the filesystem's verdict as 1/0.
pub(super) fn create(
    m: &Machine<'_>,
    um: &UserMem<'_>,
    name_ptr: i32,
    initial_size: u32,
) -> Result<i32, Fault> {
    let name = um.read_string(UserVa::new(name_ptr as u32))?;
    let ok = m.fs.lock().create(&name, initial_size);
    Ok(ok as i32)
}

/// REMOVE: returns 1/0. Open handles to the file stay usable.
pub(super) fn remove(m: &Machine<'_>, um: &UserMem<'_>, name_ptr: i32) -> Result<i32, Fault> {
    let name = um.read_string(UserVa::new(name_ptr as u32))?;
    let ok = m.fs.lock().remove(&name);
    Ok(ok as i32)
}

/// OPEN: −1 if the file does not exist, else a fresh descriptor.
pub(super) fn open(
    cur: &Process,
    m: &Machine<'_>,
    um: &UserMem<'_>,
    name_ptr: i32,
) -> Result<i32, Fault> {
    let name = um.read_string(UserVa::new(name_ptr as u32))?;
    let mut fs = m.fs.lock();
    match fs.open(&name) {
        Some(handle) => Ok(cur.fds.lock().add(handle)),
        None => Ok(KILLED),
    }
}

/// FILESIZE: −1 on unknown fds.
pub(super) fn filesize(cur: &Process, m: &Machine<'_>, fd: i32) -> i32 {
    let _fs = m.fs.lock();
    match cur.fds.lock().get_mut(fd) {
        Some(f) => f.len() as i32,
        None => KILLED,
    }
}

/// READ: fd 0 reads the keyboard, bypassing table and lock; other fds go
/// through the open-file table. The buffer is range-checked and its base
/// translated before any bytes move, so a bad pointer has no side effects.
pub(super) fn read(
    cur: &Process,
    m: &Machine<'_>,
    um: &UserMem<'_>,
    fd: i32,
    buf_ptr: i32,
    len: u32,
) -> Result<i32, Fault> {
    let va = UserVa::new(buf_ptr as u32);
    um.check_buffer(va, len)?;
    um.translate(va)?;

    if fd == STDIN_FD {
        let mut data = Vec::with_capacity(len as usize);
        for _ in 0..len {
            data.push(m.keyboard.getc());
        }
        um.copy_to_user(va, &data)?;
        return Ok(len as i32);
    }

    let mut data = vec![0u8; len as usize];
    let n = {
        let _fs = m.fs.lock();
        let mut fds = cur.fds.lock();
        match fds.get_mut(fd) {
            Some(f) => f.read(&mut data),
            None => return Ok(KILLED),
        }
    };
    // Lock released before the copy-out; a fault mid-buffer must not leave
    // the serializer held.
    data.truncate(n);
    um.copy_to_user(va, &data)?;
    Ok(n as i32)
}

/// WRITE: fd 1 writes the console, bypassing table and lock. The buffer is
/// copied into kernel memory up front, so a bad pointer faults before any
/// bytes reach the console or the filesystem.
pub(super) fn write(
    cur: &Process,
    m: &Machine<'_>,
    um: &UserMem<'_>,
    fd: i32,
    buf_ptr: i32,
    len: u32,
) -> Result<i32, Fault> {
    let va = UserVa::new(buf_ptr as u32);
    um.translate(va)?;
    let data = um.copy_from_user(va, len)?;

    if fd == STDOUT_FD {
        m.console.write(&data);
        return Ok(len as i32);
    }

    let _fs = m.fs.lock();
    match cur.fds.lock().get_mut(fd) {
        Some(f) => Ok(f.write(&data) as i32),
        None => Ok(KILLED),
    }
}

/// SEEK: no-op on unknown fds, no result.
pub(super) fn seek(cur: &Process, m: &Machine<'_>, fd: i32, pos: u32) {
    let _fs = m.fs.lock();
    if let Some(f) = cur.fds.lock().get_mut(fd) {
        f.seek(pos);
    }
}

/// TELL: −1 on unknown fds.
pub(super) fn tell(cur: &Process, m: &Machine<'_>, fd: i32) -> i32 {
    let _fs = m.fs.lock();
    match cur.fds.lock().get_mut(fd) {
        Some(f) => f.tell() as i32,
        None => KILLED,
    }
}

/// CLOSE: releases the handle; unknown fds are a no-op, no result.
pub(super) fn close(cur: &Process, m: &Machine<'_>, fd: i32) {
    let _fs = m.fs.lock();
    cur.fds.lock().close(fd);
}
