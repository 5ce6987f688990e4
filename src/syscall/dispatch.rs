//! Syscall Dispatcher
//!
//! Reads the syscall request off the calling process's user stack, decodes
//! and validates it, routes it to exactly one handler, and reports back
//! what the trap layer must do next.
//!
//! # Protocol
//! 1. The user stack pointer itself is validated and the syscall number
//!    read as the first word on the stack
//! 2. Up to 3 argument words follow at one-word offsets, each validated as
//!    a user address before being read
//! 3. Arguments are raw words here; handlers re-validate anything that is
//!    really a pointer, string, or buffer
//! 4. Value-producing syscalls store their result in the trap frame; HALT,
//!    SEEK and CLOSE leave it untouched
//! 5. Any fault, and any number outside the whitelist, terminates the
//!    calling process with status −1 — the kernel keeps running

use crate::hal::Machine;
use crate::process::{self, Process, KILLED};
use crate::usermem::{Fault, UserMem, UserVa, WORD_SIZE};

use super::handlers;
use super::number::Syscall;

/// Portable view of the trap frame. The board layer marshals real register
/// state in and out around [`handle_syscall`].
#[derive(Debug, Clone, Copy)]
pub struct TrapFrame {
    /// User stack pointer at the moment of the trap.
    pub user_sp: u32,
    /// Syscall result register.
    pub result: i32,
}

impl TrapFrame {
    pub fn new(user_sp: u32) -> Self {
        Self { user_sp, result: 0 }
    }
}

/// What the trap layer must do after a syscall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Return to the user process.
    Continue,
    /// The calling process is dead (EXIT, fault, or unknown syscall); its
    /// exit bookkeeping already ran. Do not return to it.
    Terminate(i32),
    /// HALT: power-off was requested.
    Shutdown,
}

/// Entry point for one trap.
///
/// `m.pages` must translate for the calling process. Never panics on user
/// input: every fault path funnels into process termination.
pub fn handle_syscall(frame: &mut TrapFrame, cur: &Process, m: &Machine<'_>) -> Disposition {
    match dispatch(frame, cur, m) {
        Ok(disposition) => disposition,
        Err(fault) => {
            log::warn!("{}: killed on user-memory fault: {}", cur.name, fault);
            process::exit(cur, m, KILLED);
            Disposition::Terminate(KILLED)
        }
    }
}

fn dispatch(
    frame: &mut TrapFrame,
    cur: &Process,
    m: &Machine<'_>,
) -> Result<Disposition, Fault> {
    let um = UserMem::new(m.pages);
    let usp = UserVa::new(frame.user_sp);

    let number = um.read_word(usp)?;
    let Some(sys) = Syscall::from_number(number) else {
        log::warn!("{}: unknown syscall {}, killing", cur.name, number);
        process::exit(cur, m, KILLED);
        return Ok(Disposition::Terminate(KILLED));
    };
    log::trace!("{}: syscall {:?}", cur.name, sys);

    let mut args = [0i32; 3];
    for (i, slot) in args.iter_mut().enumerate().take(sys.arg_count()) {
        let va = usp
            .checked_add(WORD_SIZE * (i as u32 + 1))
            .ok_or(Fault::OutOfRange(usp))?;
        *slot = um.read_word(va)?;
    }

    match sys {
        Syscall::Halt => {
            m.power.power_off();
            Ok(Disposition::Shutdown)
        }
        Syscall::Exit => {
            process::exit(cur, m, args[0]);
            Ok(Disposition::Terminate(args[0]))
        }
        Syscall::Exec => {
            frame.result = handlers::exec(cur, m, &um, args[0])?;
            Ok(Disposition::Continue)
        }
        Syscall::Wait => {
            frame.result = handlers::wait(cur, args[0]);
            Ok(Disposition::Continue)
        }
        Syscall::Create => {
            frame.result = handlers::create(m, &um, args[0], args[1] as u32)?;
            Ok(Disposition::Continue)
        }
        Syscall::Remove => {
            frame.result = handlers::remove(m, &um, args[0])?;
            Ok(Disposition::Continue)
        }
        Syscall::Open => {
            frame.result = handlers::open(cur, m, &um, args[0])?;
            Ok(Disposition::Continue)
        }
        Syscall::Filesize => {
            frame.result = handlers::filesize(cur, m, args[0]);
            Ok(Disposition::Continue)
        }
        Syscall::Read => {
            frame.result = handlers::read(cur, m, &um, args[0], args[1], args[2] as u32)?;
            Ok(Disposition::Continue)
        }
        Syscall::Write => {
            frame.result = handlers::write(cur, m, &um, args[0], args[1], args[2] as u32)?;
            Ok(Disposition::Continue)
        }
        Syscall::Seek => {
            handlers::seek(cur, m, args[0], args[1] as u32);
            Ok(Disposition::Continue)
        }
        Syscall::Tell => {
            frame.result = handlers::tell(cur, m, args[0]);
            Ok(Disposition::Continue)
        }
        Syscall::Close => {
            handlers::close(cur, m, args[0]);
            Ok(Disposition::Continue)
        }
    }
}
