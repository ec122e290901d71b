//! CHIP-8 virtual machine.
//!
//! The whole machine lives in [`emu::Chip8`]. A host loads a ROM, feeds key
//! state in, calls [`emu::Chip8::tick`] repeatedly and reads the display back out.
pub mod emu;
mod nibble;

pub use nibble::u4;
