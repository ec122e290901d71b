use std::fmt;

use crate::u4;

/// CHIP-8 instruction opcodes.
///
/// The fields (x, y, n, nn, nnn) correspond to the operands encoded in the opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// 1nnn - Jump to location nnn.
    Jump { nnn: u16 },
    /// Bnnn - Jump to location nnn + V0.
    JumpWithOffset { nnn: u16 },

    /// 2nnn - Call subroutine at nnn.
    Call { nnn: u16 },
    /// 00EE - Return from a subroutine.
    Return,

    /// 3xnn - Skip next instruction if Vx == nn.
    SkipRegEqualImm { x: u4, nn: u8 },
    /// 4xnn - Skip next instruction if Vx != nn.
    SkipRegNotEqualImm { x: u4, nn: u8 },
    /// 5xy0 - Skip next instruction if Vx == Vy.
    SkipRegEqualReg { x: u4, y: u4 },
    /// 9xy0 - Skip next instruction if Vx != Vy.
    SkipRegNotEqualReg { x: u4, y: u4 },

    /// 6xnn - Set Vx = nn.
    SetRegImm { x: u4, nn: u8 },
    /// 7xnn - Set Vx = Vx + nn.
    AddRegImm { x: u4, nn: u8 },
    /// Annn - Set I = nnn.
    SetIndexImm { nnn: u16 },
    /// Fx1E - Set I = I + Vx.
    AddIndexReg { x: u4 },

    /// 8xyN - ALU operations
    ALU { x: u4, y: u4, op: OpcodeALU },
    /// Cxnn - Set Vx = random byte AND nn.
    Random { x: u4, nn: u8 },

    /// 00E0 - Clear the display.
    ClearDisplay,
    /// Dxyn - Display n-byte sprite starting at memory location I at (Vx, Vy).
    Draw { x: u4, y: u4, n: u4 },

    /// Ex9E - Skip next instruction if key with the value of Vx is pressed.
    SkipIfPressed { x: u4 },
    /// ExA1 - Skip next instruction if key with the value of Vx is not pressed.
    SkipIfNotPressed { x: u4 },
    /// Fx0A - Wait for a key press, store the value of the key in Vx.
    WaitForKey { x: u4 },

    /// Fx07 - Set Vx = delay timer value.
    ReadDelayTimer { x: u4 },
    /// Fx15 - Set delay timer = Vx.
    SetDelayTimer { x: u4 },
    /// Fx18 - Set sound timer = Vx.
    SetSoundTimer { x: u4 },

    /// Fx29 - Set I = location of sprite for digit Vx.
    FontChar { x: u4 },
    /// Fx33 - Store BCD representation of Vx in memory locations I, I+1, and I+2.
    BCD { x: u4 },

    /// Fx55 - Store registers V0 through Vx in memory starting at location I.
    StoreRegs { x: u4 },
    /// Fx65 - Read registers V0 through Vx from memory starting at location I.
    LoadRegs { x: u4 },

    /// Any word that is not one of the instructions above, including invalid 8xyN forms.
    Unknown(u16),
}

/// ALU operations for the 8xyN instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeALU {
    /// 8xy0 - Vx = Vy
    Set,
    /// 8xy1 - Vx = Vx OR Vy
    Or,
    /// 8xy2 - Vx = Vx AND Vy
    And,
    /// 8xy3 - Vx = Vx XOR Vy
    Xor,
    /// 8xy4 - Vx = Vx + Vy, VF = carry
    Add,
    /// 8xy5 - Vx = Vx - Vy, VF = Vx > Vy
    Sub,
    /// 8xy6 - Vx = Vx SHR 1, VF = old bit 0
    ShiftRight,
    /// 8xy7 - Vx = Vy - Vx, VF = Vy > Vx
    SubReverse,
    /// 8xyE - Vx = Vx SHL 1, VF = old bit 7
    ShiftLeft,
}

/// Operand fields of an instruction word, extracted once before dispatch.
#[derive(Clone, Copy)]
struct Fields {
    word: u16,
    family: u8,
    x: u4,
    y: u4,
    n: u4,
    nn: u8,
    nnn: u16,
}

impl Fields {
    fn split(word: u16) -> Self {
        Self {
            word,
            family: (word >> 12) as u8,
            x: u4::from_low_bits((word >> 8) as u8),
            y: u4::from_low_bits((word >> 4) as u8),
            n: u4::from_low_bits(word as u8),
            nn: word as u8,
            nnn: word & 0x0FFF,
        }
    }
}

impl Opcode {
    /// Decode a 16-bit raw opcode into an `Opcode` enum variant.
    ///
    /// Every word decodes to something; words that are not instructions become
    /// [`Opcode::Unknown`].
    pub fn decode(opcode: u16) -> Self {
        let f = Fields::split(opcode);
        let Fields { x, y, n, nn, nnn, .. } = f;

        let decoded = match f.family {
            0x0 => Self::decode_system(f),
            0x1 => Some(Opcode::Jump { nnn }),
            0x2 => Some(Opcode::Call { nnn }),
            0x3 => Some(Opcode::SkipRegEqualImm { x, nn }),
            0x4 => Some(Opcode::SkipRegNotEqualImm { x, nn }),
            0x5 => (n.value() == 0).then_some(Opcode::SkipRegEqualReg { x, y }),
            0x6 => Some(Opcode::SetRegImm { x, nn }),
            0x7 => Some(Opcode::AddRegImm { x, nn }),
            0x8 => OpcodeALU::from_selector(n).map(|op| Opcode::ALU { x, y, op }),
            0x9 => (n.value() == 0).then_some(Opcode::SkipRegNotEqualReg { x, y }),
            0xA => Some(Opcode::SetIndexImm { nnn }),
            0xB => Some(Opcode::JumpWithOffset { nnn }),
            0xC => Some(Opcode::Random { x, nn }),
            0xD => Some(Opcode::Draw { x, y, n }),
            0xE => Self::decode_key(f),
            _ => Self::decode_misc(f),
        };

        decoded.unwrap_or(Opcode::Unknown(f.word))
    }

    /// `0nnn` family: only the two display/flow words are supported.
    fn decode_system(f: Fields) -> Option<Self> {
        match f.nnn {
            0x0E0 => Some(Opcode::ClearDisplay),
            0x0EE => Some(Opcode::Return),
            _ => None,
        }
    }

    fn decode_key(f: Fields) -> Option<Self> {
        let x = f.x;
        match f.nn {
            0x9E => Some(Opcode::SkipIfPressed { x }),
            0xA1 => Some(Opcode::SkipIfNotPressed { x }),
            _ => None,
        }
    }

    /// `Fxnn` family, selected by the low byte.
    fn decode_misc(f: Fields) -> Option<Self> {
        let x = f.x;
        let op = match f.nn {
            0x07 => Opcode::ReadDelayTimer { x },
            0x0A => Opcode::WaitForKey { x },
            0x15 => Opcode::SetDelayTimer { x },
            0x18 => Opcode::SetSoundTimer { x },
            0x1E => Opcode::AddIndexReg { x },
            0x29 => Opcode::FontChar { x },
            0x33 => Opcode::BCD { x },
            0x55 => Opcode::StoreRegs { x },
            0x65 => Opcode::LoadRegs { x },
            _ => return None,
        };
        Some(op)
    }
}

impl OpcodeALU {
    /// Maps the low nibble of an `8xyN` word to its operation.
    fn from_selector(n: u4) -> Option<Self> {
        let op = match n.value() {
            0x0 => OpcodeALU::Set,
            0x1 => OpcodeALU::Or,
            0x2 => OpcodeALU::And,
            0x3 => OpcodeALU::Xor,
            0x4 => OpcodeALU::Add,
            0x5 => OpcodeALU::Sub,
            0x6 => OpcodeALU::ShiftRight,
            0x7 => OpcodeALU::SubReverse,
            0xE => OpcodeALU::ShiftLeft,
            _ => return None,
        };
        Some(op)
    }
}

/// Conventional assembly mnemonics, e.g. `LD V1, 0x42` or `DRW V0, V1, 5`.
impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Opcode::ClearDisplay => write!(f, "CLS"),
            Opcode::Return => write!(f, "RET"),
            Opcode::Jump { nnn } => write!(f, "JP {nnn:#05X}"),
            Opcode::JumpWithOffset { nnn } => write!(f, "JP V0, {nnn:#05X}"),
            Opcode::Call { nnn } => write!(f, "CALL {nnn:#05X}"),
            Opcode::SkipRegEqualImm { x, nn } => write!(f, "SE V{x}, {nn:#04X}"),
            Opcode::SkipRegNotEqualImm { x, nn } => write!(f, "SNE V{x}, {nn:#04X}"),
            Opcode::SkipRegEqualReg { x, y } => write!(f, "SE V{x}, V{y}"),
            Opcode::SkipRegNotEqualReg { x, y } => write!(f, "SNE V{x}, V{y}"),
            Opcode::SetRegImm { x, nn } => write!(f, "LD V{x}, {nn:#04X}"),
            Opcode::AddRegImm { x, nn } => write!(f, "ADD V{x}, {nn:#04X}"),
            Opcode::SetIndexImm { nnn } => write!(f, "LD I, {nnn:#05X}"),
            Opcode::AddIndexReg { x } => write!(f, "ADD I, V{x}"),
            Opcode::ALU { x, y, op } => match op {
                OpcodeALU::Set => write!(f, "LD V{x}, V{y}"),
                OpcodeALU::Or => write!(f, "OR V{x}, V{y}"),
                OpcodeALU::And => write!(f, "AND V{x}, V{y}"),
                OpcodeALU::Xor => write!(f, "XOR V{x}, V{y}"),
                OpcodeALU::Add => write!(f, "ADD V{x}, V{y}"),
                OpcodeALU::Sub => write!(f, "SUB V{x}, V{y}"),
                OpcodeALU::ShiftRight => write!(f, "SHR V{x}"),
                OpcodeALU::SubReverse => write!(f, "SUBN V{x}, V{y}"),
                OpcodeALU::ShiftLeft => write!(f, "SHL V{x}"),
            },
            Opcode::Random { x, nn } => write!(f, "RND V{x}, {nn:#04X}"),
            Opcode::Draw { x, y, n } => write!(f, "DRW V{x}, V{y}, {}", n.value()),
            Opcode::SkipIfPressed { x } => write!(f, "SKP V{x}"),
            Opcode::SkipIfNotPressed { x } => write!(f, "SKNP V{x}"),
            Opcode::WaitForKey { x } => write!(f, "LD V{x}, K"),
            Opcode::ReadDelayTimer { x } => write!(f, "LD V{x}, DT"),
            Opcode::SetDelayTimer { x } => write!(f, "LD DT, V{x}"),
            Opcode::SetSoundTimer { x } => write!(f, "LD ST, V{x}"),
            Opcode::FontChar { x } => write!(f, "LD F, V{x}"),
            Opcode::BCD { x } => write!(f, "LD B, V{x}"),
            Opcode::StoreRegs { x } => write!(f, "LD [I], V{x}"),
            Opcode::LoadRegs { x } => write!(f, "LD V{x}, [I]"),
            Opcode::Unknown(word) => write!(f, "DW {word:#06X}"),
        }
    }
}
