//! Syscall numbering, shared with userland's trap stubs.

/// The syscall whitelist. Numbers are ABI.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(i32)]
pub enum Syscall {
    /// Power the machine off. Never returns.
    Halt = 0,
    /// Terminate the calling process. Never returns.
    Exit = 1,
    /// Spawn a process from a command line; returns its pid.
    Exec = 2,
    /// Reap a child and return its exit status.
    Wait = 3,
    /// Create a file with an initial size.
    Create = 4,
    /// Remove a file by name.
    Remove = 5,
    /// Open a file; returns a descriptor.
    Open = 6,
    /// Size in bytes of an open file.
    Filesize = 7,
    /// Read from a descriptor (0 = keyboard).
    Read = 8,
    /// Write to a descriptor (1 = console).
    Write = 9,
    /// Set an open file's position.
    Seek = 10,
    /// Get an open file's position.
    Tell = 11,
    /// Close a descriptor.
    Close = 12,
}

impl Syscall {
    /// Decode a number read off the user stack. `None` for anything
    /// outside the whitelist.
    pub fn from_number(n: i32) -> Option<Self> {
        Some(match n {
            0 => Self::Halt,
            1 => Self::Exit,
            2 => Self::Exec,
            3 => Self::Wait,
            4 => Self::Create,
            5 => Self::Remove,
            6 => Self::Open,
            7 => Self::Filesize,
            8 => Self::Read,
            9 => Self::Write,
            10 => Self::Seek,
            11 => Self::Tell,
            12 => Self::Close,
            _ => return None,
        })
    }

    /// How many argument words the call takes.
    pub fn arg_count(self) -> usize {
        match self {
            Self::Halt => 0,
            Self::Exit
            | Self::Wait
            | Self::Remove
            | Self::Open
            | Self::Filesize
            | Self::Tell
            | Self::Close
            | Self::Exec => 1,
            Self::Create | Self::Seek => 2,
            Self::Read | Self::Write => 3,
        }
    }
}
