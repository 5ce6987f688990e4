//! Ocelot user-process syscall boundary
//!
//! The trusted boundary between unprivileged user processes and kernel
//! services: the syscall dispatcher, the user-memory validator that guards
//! every kernel dereference of a user-supplied pointer, the per-process open
//! file table, and the parent/child registry behind `exec`/`wait`.
//!
//! # Security Model
//! - Every user-supplied address is validated before the kernel touches it
//! - A bad pointer terminates the offending process, never the kernel
//! - Unknown syscall numbers terminate the caller (whitelist dispatch)
//! - The filesystem is not concurrency-safe; all access is serialized
//!
//! # Architecture
//! This crate is the portable core. The board layer (trap entry, drivers,
//! scheduler, loader) lives outside and drives it through the [`hal`]
//! traits: it hands each trap to [`syscall::handle_syscall`] together with
//! the current process's [`process::Process`] block and a [`hal::Machine`]
//! of collaborator references, then acts on the returned
//! [`syscall::Disposition`].

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

extern crate alloc;

pub mod fd;
pub mod fslock;
pub mod hal;
pub mod process;
pub mod syscall;
pub mod usermem;

#[cfg(test)]
mod testutil;
