mod chip8;
mod display;
mod execute;
mod font;
mod opcode;
mod stack;
mod timer;
mod types;

pub use chip8::*;
pub use display::*;
pub use font::*;
pub use opcode::*;
pub use stack::*;
pub use timer::*;
pub use types::*;
