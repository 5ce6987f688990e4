//! User Memory Validator
//!
//! Certifies that a user-supplied address, buffer, or null-terminated
//! string is safe for the kernel to touch, and translates it through the
//! current process's page directory before any access.
//!
//! # Security Principles
//! - Range checks never consult the page tables; mapping is checked lazily,
//!   per access, by asking the external translation service
//! - Buffers are checked byte by byte, so a buffer straddling an unmapped
//!   page in the middle is still caught precisely
//! - Any failure is fatal to the *process*, never to the kernel: it surfaces
//!   as a [`Fault`] that the dispatcher turns into termination with
//!   status −1

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::hal::PageTranslate;

/// Lowest legal user address. Everything below it (the null page, the
/// reserved low region) is off limits.
pub const USER_BOTTOM: u32 = 0x0804_8000;

/// First kernel address; user pointers must sit strictly below it.
pub const KERNEL_BASE: u32 = 0xC000_0000;

/// Size of one syscall argument word on the user stack.
pub const WORD_SIZE: u32 = 4;

/// A user-space virtual address.
///
/// Newtype so kernel pointers and user addresses cannot be mixed up; a
/// `UserVa` carries no claim of validity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct UserVa(u32);

impl UserVa {
    #[inline]
    pub const fn new(addr: u32) -> Self {
        Self(addr)
    }

    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// `self + offset`, or `None` on address-space wraparound.
    #[inline]
    pub fn checked_add(self, offset: u32) -> Option<Self> {
        self.0.checked_add(offset).map(Self)
    }
}

impl fmt::Debug for UserVa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserVa({:#010x})", self.0)
    }
}

impl fmt::Display for UserVa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// A user-memory violation. Always fatal to the offending process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Null pointer.
    Null,
    /// Address outside `[USER_BOTTOM, KERNEL_BASE)`.
    OutOfRange(UserVa),
    /// Address in range but not mapped in the page directory.
    Unmapped(UserVa),
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null user pointer"),
            Self::OutOfRange(va) => write!(f, "user address {} out of range", va),
            Self::Unmapped(va) => write!(f, "user address {} not mapped", va),
        }
    }
}

/// Validator bound to one process's address translation.
///
/// Constructed per trap from the [`Machine`](crate::hal::Machine); holds no
/// state of its own.
pub struct UserMem<'a> {
    pages: &'a dyn PageTranslate,
}

impl<'a> UserMem<'a> {
    pub fn new(pages: &'a dyn PageTranslate) -> Self {
        Self { pages }
    }

    /// Range-check a single user address.
    ///
    /// Rejects null, addresses below [`USER_BOTTOM`], and addresses at or
    /// above [`KERNEL_BASE`]. Does *not* check whether the page is mapped.
    pub fn check_ptr(&self, va: UserVa) -> Result<(), Fault> {
        if va.is_null() {
            return Err(Fault::Null);
        }
        if va.as_u32() < USER_BOTTOM || va.as_u32() >= KERNEL_BASE {
            return Err(Fault::OutOfRange(va));
        }
        Ok(())
    }

    /// Range-check `va`, then resolve it through the page directory.
    pub fn translate(&self, va: UserVa) -> Result<*mut u8, Fault> {
        self.check_ptr(va)?;
        self.pages.translate(va).ok_or(Fault::Unmapped(va))
    }

    /// Range-check every byte of `[va, va + len)`.
    ///
    /// Deliberately per byte rather than per page boundary; the mapping
    /// itself is still only checked when a byte is actually accessed.
    pub fn check_buffer(&self, va: UserVa, len: u32) -> Result<(), Fault> {
        for i in 0..len {
            let byte = va.checked_add(i).ok_or(Fault::OutOfRange(va))?;
            self.check_ptr(byte)?;
        }
        Ok(())
    }

    /// Read one byte of user memory.
    pub fn read_byte(&self, va: UserVa) -> Result<u8, Fault> {
        let ptr = self.translate(va)?;
        // SAFETY: translate() certified the address maps to a valid
        // kernel-accessible byte for the current process.
        Ok(unsafe { ptr.read_volatile() })
    }

    /// Write one byte of user memory.
    pub fn write_byte(&self, va: UserVa, value: u8) -> Result<(), Fault> {
        let ptr = self.translate(va)?;
        // SAFETY: translate() certified the address; user pages reached
        // through the page directory are writable by the kernel.
        unsafe { ptr.write_volatile(value) };
        Ok(())
    }

    /// Read one little-endian argument word.
    ///
    /// Byte-wise so a word straddling an unmapped page faults instead of
    /// reading through a stale translation.
    pub fn read_word(&self, va: UserVa) -> Result<i32, Fault> {
        let mut bytes = [0u8; WORD_SIZE as usize];
        for (i, slot) in bytes.iter_mut().enumerate() {
            let byte = va.checked_add(i as u32).ok_or(Fault::OutOfRange(va))?;
            *slot = self.read_byte(byte)?;
        }
        Ok(i32::from_le_bytes(bytes))
    }

    /// Read a null-terminated user string into kernel memory.
    ///
    /// The length is unknown up front, so each byte is translated
    /// individually until the first NUL.
    pub fn read_string(&self, va: UserVa) -> Result<String, Fault> {
        let mut bytes = Vec::new();
        let mut cur = va;
        loop {
            let b = self.read_byte(cur)?;
            if b == 0 {
                break;
            }
            bytes.push(b);
            cur = cur.checked_add(1).ok_or(Fault::OutOfRange(cur))?;
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Copy `len` bytes of user memory into a kernel buffer.
    pub fn copy_from_user(&self, va: UserVa, len: u32) -> Result<Vec<u8>, Fault> {
        self.check_buffer(va, len)?;
        let mut out = Vec::with_capacity(len as usize);
        for i in 0..len {
            // checked_add cannot fail here; check_buffer walked the range.
            let byte = va.checked_add(i).ok_or(Fault::OutOfRange(va))?;
            out.push(self.read_byte(byte)?);
        }
        Ok(out)
    }

    /// Copy a kernel buffer out to user memory.
    pub fn copy_to_user(&self, va: UserVa, data: &[u8]) -> Result<(), Fault> {
        self.check_buffer(va, data.len() as u32)?;
        for (i, &b) in data.iter().enumerate() {
            let byte = va
                .checked_add(i as u32)
                .ok_or(Fault::OutOfRange(va))?;
            self.write_byte(byte, b)?;
        }
        Ok(())
    }
}
