use std::time::Instant;

use log::{debug, warn};
use rand::Rng;

use super::{
    Chip8, Chip8Error, Chip8Result, ExecState, FONT_GLYPH_HEIGHT, FONT_START_ADDRESS, Opcode,
    OpcodeALU, chip8::ADDRESS_MASK,
};
use crate::u4;

impl Chip8 {
    /// Applies one decoded instruction. `now` is only used by the timer and key-wait instructions.
    pub(crate) fn execute(
        &mut self,
        opcode: Opcode,
        now: Instant,
    ) -> Result<Chip8Result, Chip8Error> {
        let address = self.pc;
        self.advance_pc();

        match opcode {
            Opcode::ClearDisplay => {
                self.display.clear();
                return Ok(Chip8Result::DisplayUpdated);
            }
            Opcode::Jump { nnn } => {
                self.pc = nnn;
            }
            Opcode::JumpWithOffset { nnn } => {
                self.pc = nnn.wrapping_add(self.v[0].into()) & ADDRESS_MASK;
            }
            Opcode::Call { nnn } => {
                self.stack.push(self.pc)?;
                self.pc = nnn;
            }
            Opcode::Return => {
                self.pc = self.stack.pop()?;
            }
            Opcode::SkipRegEqualImm { x, nn } => {
                if self.v[x] == nn {
                    self.advance_pc();
                }
            }
            Opcode::SkipRegNotEqualImm { x, nn } => {
                if self.v[x] != nn {
                    self.advance_pc();
                }
            }
            Opcode::SkipRegEqualReg { x, y } => {
                if self.v[x] == self.v[y] {
                    self.advance_pc();
                }
            }
            Opcode::SkipRegNotEqualReg { x, y } => {
                if self.v[x] != self.v[y] {
                    self.advance_pc();
                }
            }
            Opcode::SetRegImm { x, nn } => {
                self.v[x] = nn;
            }
            Opcode::AddRegImm { x, nn } => {
                self.v[x] = self.v[x].wrapping_add(nn);
            }
            Opcode::ALU { x, y, op } => {
                self.execute_alu(x, y, op);
            }
            Opcode::Random { x, nn } => {
                let rand_byte: u8 = self.rng.random();
                self.v[x] = rand_byte & nn;
            }
            Opcode::SetIndexImm { nnn } => {
                self.i = nnn;
            }
            Opcode::AddIndexReg { x } => {
                self.i = self.i.wrapping_add(self.v[x].into());
            }
            Opcode::Draw { x, y, n } => {
                self.execute_draw(x, y, n);
                return Ok(Chip8Result::DisplayUpdated);
            }
            Opcode::SkipIfPressed { x } => {
                if self.keypad[u4::from_low_bits(self.v[x])] {
                    self.advance_pc();
                }
            }
            Opcode::SkipIfNotPressed { x } => {
                if !self.keypad[u4::from_low_bits(self.v[x])] {
                    self.advance_pc();
                }
            }
            Opcode::WaitForKey { x } => {
                // Resolved by a later tick, see `Chip8::tick_at`
                self.state = ExecState::AwaitingKey {
                    register: x,
                    since: now,
                };
                debug!("{address:03X}: waiting for key into V{x}");
                return Ok(Chip8Result::AwaitingKey);
            }
            Opcode::ReadDelayTimer { x } => {
                self.v[x] = self.delay_timer.value();
            }
            Opcode::SetDelayTimer { x } => {
                self.delay_timer.set(self.v[x], now);
            }
            Opcode::SetSoundTimer { x } => {
                self.sound_timer.set(self.v[x], now);
            }
            Opcode::FontChar { x } => {
                let digit = u16::from(self.v[x]);
                self.i = FONT_START_ADDRESS as u16 + digit * FONT_GLYPH_HEIGHT as u16;
            }
            Opcode::BCD { x } => {
                let value = self.v[x];
                *self.mem_mut(self.i) = value / 100;
                *self.mem_mut(self.i.wrapping_add(1)) = (value / 10) % 10;
                *self.mem_mut(self.i.wrapping_add(2)) = value % 10;
            }
            Opcode::StoreRegs { x } => {
                for reg_index in 0..=usize::from(x) {
                    *self.mem_mut(self.i.wrapping_add(reg_index as u16)) = self.v[reg_index];
                }
            }
            Opcode::LoadRegs { x } => {
                for reg_index in 0..=usize::from(x) {
                    self.v[reg_index] = self.mem(self.i.wrapping_add(reg_index as u16));
                }
            }
            Opcode::Unknown(opcode) => {
                warn!("{address:03X}: unknown opcode {opcode:04X}, skipping");
                return Ok(Chip8Result::UnknownOpcode { opcode, address });
            }
        };

        Ok(Chip8Result::Continue)
    }

    /// Moves PC to the next word, wrapping from 0xFFE back to 0x000.
    fn advance_pc(&mut self) {
        self.pc = self.pc.wrapping_add(2) & ADDRESS_MASK;
    }

    // VF is written before Vx, so when x is F the result wins over the flag.
    fn execute_alu(&mut self, x: u4, y: u4, op: OpcodeALU) {
        let (vx, vy) = (self.v[x], self.v[y]);

        match op {
            OpcodeALU::Set => self.v[x] = vy,
            OpcodeALU::Or => self.v[x] = vx | vy,
            OpcodeALU::And => self.v[x] = vx & vy,
            OpcodeALU::Xor => self.v[x] = vx ^ vy,
            OpcodeALU::Add => {
                let (res, overflow) = vx.overflowing_add(vy);
                self.v[0xF] = u8::from(overflow);
                self.v[x] = res;
            }
            OpcodeALU::Sub => {
                // Equal operands count as a borrow
                self.v[0xF] = u8::from(vx > vy);
                self.v[x] = vx.wrapping_sub(vy);
            }
            OpcodeALU::SubReverse => {
                self.v[0xF] = u8::from(vy > vx);
                self.v[x] = vy.wrapping_sub(vx);
            }
            OpcodeALU::ShiftRight => {
                self.v[0xF] = vx & 1;
                self.v[x] = vx >> 1;
            }
            OpcodeALU::ShiftLeft => {
                self.v[0xF] = (vx >> 7) & 1;
                self.v[x] = vx << 1;
            }
        }
    }

    fn execute_draw(&mut self, x: u4, y: u4, n: u4) {
        let row_count = usize::from(n);

        let mut sprite = [0u8; 15];
        for (row, byte) in sprite.iter_mut().take(row_count).enumerate() {
            *byte = self.mem(self.i.wrapping_add(row as u16));
        }

        let any_erased = self
            .display
            .draw_sprite(self.v[x], self.v[y], &sprite[..row_count]);
        self.v[0xF] = u8::from(any_erased);
    }
}
