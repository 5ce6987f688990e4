//! System Call Interface
//!
//! The trap boundary between user processes and the kernel.
//!
//! # Security Model
//! - The user stack pointer and every argument word are validated before
//!   the kernel reads them
//! - Pointer, buffer, and string arguments are validated again, as what
//!   they claim to be, by the individual handlers
//! - Any user-memory fault terminates the calling process with status −1;
//!   the kernel itself never panics on user input
//! - Unknown syscall numbers terminate the caller

mod dispatch;
mod handlers;
mod number;

pub use dispatch::{handle_syscall, Disposition, TrapFrame};
pub use number::Syscall;
