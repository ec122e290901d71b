use std::{io, path::PathBuf, time::Instant};

use crate::u4;

/// Outcome of a single [`tick`](super::Chip8::tick).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chip8Result {
    /// An instruction was executed and the display is unchanged.
    Continue,
    /// The display buffer was modified (`00E0` or `Dxyn`); the host may want to present it.
    DisplayUpdated,
    /// The machine is suspended by `Fx0A` and no key is pressed yet.
    AwaitingKey,
    /// A pending `Fx0A` was satisfied; execution resumes on the next tick.
    KeyReceived { key: u8 },
    /// The word at `address` is not a known instruction. It was skipped.
    UnknownOpcode { opcode: u16, address: u16 },
}

/// Whether the machine is fetching instructions or suspended on `Fx0A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecState {
    Running,
    /// Waiting for any key; the key index will be written to register `register`.
    AwaitingKey { register: u4, since: Instant },
}

/// Error types that can occur during CHIP-8 emulation
#[derive(Debug, thiserror::Error)]
pub enum Chip8Error {
    #[error("ROM is too large ({size} bytes), max size is {max_size} bytes")]
    RomLoadError { size: usize, max_size: usize },

    #[error("Failed to read ROM file {}", path.display())]
    RomReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No ROM loaded: call load() before tick()")]
    NoRomLoaded,

    #[error("Stack overflow: call depth exceeded {capacity} levels")]
    StackOverflow { capacity: usize },

    #[error("Stack underflow: attempted to return from a subroutine with empty call stack")]
    StackUnderflow,
}

pub const DISPLAY_X: usize = 64;
pub const DISPLAY_Y: usize = 32;
/// A type alias for the CHIP-8 display buffer representation
pub type Display<T> = [[T; DISPLAY_X]; DISPLAY_Y];
