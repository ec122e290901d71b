use std::{fs, path::Path, time::Instant};

use log::{debug, trace, warn};
use rand::{SeedableRng, rngs::StdRng};

use super::{
    CallStack, Chip8Error, Chip8Result, Display, ExecState, FONT, FONT_END_ADDRESS,
    FONT_START_ADDRESS, Framebuffer, Opcode, Timer,
};
use crate::u4;

// Memory layout of the machine
pub const ROM_START_ADDRESS: usize = 0x200;
pub const MEMORY_SIZE: usize = 4096;
pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - ROM_START_ADDRESS;
pub const KEY_COUNT: usize = 16;

/// Every address is reduced to 12 bits before it touches memory.
pub(crate) const ADDRESS_MASK: u16 = (MEMORY_SIZE - 1) as u16;

/// CHIP-8 virtual machine state
pub struct Chip8 {
    /// 4KB memory array
    pub(crate) memory: [u8; MEMORY_SIZE],
    /// Display buffer: 64x32 monochrome pixels
    pub(crate) display: Framebuffer,

    /// Program counter: address of the next instruction to execute
    pub(crate) pc: u16,
    /// Index register: used for memory operations
    pub(crate) i: u16,
    /// General-purpose registers V0-VF (VF is used as a flag register)
    pub(crate) v: [u8; 16],
    /// Call stack for subroutine returns
    pub(crate) stack: CallStack,

    /// Delay timer: decrements at 60Hz until it reaches 0
    pub(crate) delay_timer: Timer,
    /// Sound timer: decrements at 60Hz, beeps while non-zero
    pub(crate) sound_timer: Timer,

    /// Keypad state: 16 keys mapped as booleans (true = pressed)
    pub(crate) keypad: [bool; KEY_COUNT],
    /// Running, or suspended by Fx0A
    pub(crate) state: ExecState,

    /// Source for the Cxnn instruction
    pub(crate) rng: StdRng,
    rom_loaded: bool,
}

impl Chip8 {
    /// Creates a machine in its initialized state with a randomly seeded RNG.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Creates a machine whose `Cxnn` results are reproducible for a given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let now = Instant::now();
        let mut chip8 = Chip8 {
            memory: [0; MEMORY_SIZE],
            display: Framebuffer::new(),
            pc: ROM_START_ADDRESS as u16,
            i: 0,
            v: [0; 16],
            stack: CallStack::new(),
            delay_timer: Timer::new(now),
            sound_timer: Timer::new(now),
            keypad: [false; KEY_COUNT],
            state: ExecState::Running,
            rng,
            rom_loaded: false,
        };
        chip8.init();
        chip8
    }

    /// Resets the machine to its power-on state.
    ///
    /// Memory is cleared and the font set is copied in, registers, timers and
    /// the stack are zeroed, PC points at the ROM start and the display is blank.
    /// A ROM has to be loaded again before the next tick.
    pub fn init(&mut self) {
        let now = Instant::now();

        self.memory.fill(0);
        self.memory[FONT_START_ADDRESS..FONT_END_ADDRESS].copy_from_slice(&FONT);
        self.display.clear();

        self.pc = ROM_START_ADDRESS as u16;
        self.i = 0;
        self.v = [0; 16];
        self.stack.clear();

        self.delay_timer = Timer::new(now);
        self.sound_timer = Timer::new(now);

        self.keypad = [false; KEY_COUNT];
        self.state = ExecState::Running;
        self.rom_loaded = false;

        debug!("machine initialized");
    }

    /// Loads a ROM into memory at 0x200.
    ///
    /// A ROM that does not fit is rejected before anything is written.
    pub fn load(&mut self, rom: &[u8]) -> Result<(), Chip8Error> {
        if rom.len() > MAX_ROM_SIZE {
            return Err(Chip8Error::RomLoadError {
                size: rom.len(),
                max_size: MAX_ROM_SIZE,
            });
        }

        // Start with a clean program area so nothing leaks from a previous ROM.
        self.memory[ROM_START_ADDRESS..].fill(0);
        self.memory[ROM_START_ADDRESS..ROM_START_ADDRESS + rom.len()].copy_from_slice(rom);

        // Set program counter to start of ROM
        self.pc = ROM_START_ADDRESS as u16;
        self.rom_loaded = true;

        debug!("loaded {} byte ROM at {:#05X}", rom.len(), ROM_START_ADDRESS);
        Ok(())
    }

    /// Reads a ROM file from disk and loads it. Memory is untouched if the read fails.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), Chip8Error> {
        let path = path.as_ref();
        let rom = fs::read(path).map_err(|source| Chip8Error::RomReadError {
            path: path.to_path_buf(),
            source,
        })?;
        self.load(&rom)
    }

    /// Advances the machine by one step using the current wall-clock time.
    pub fn tick(&mut self) -> Result<Chip8Result, Chip8Error> {
        self.tick_at(Instant::now())
    }

    /// Advances the machine by one step as if the current time were `now`.
    ///
    /// While a key wait is pending this only polls the keypad. Otherwise the timers
    /// are brought up to date and a single instruction is fetched, decoded and executed.
    ///
    /// If the instruction fails (stack overflow or underflow) the machine is left as
    /// it was before the instruction.
    pub fn tick_at(&mut self, now: Instant) -> Result<Chip8Result, Chip8Error> {
        if !self.rom_loaded {
            return Err(Chip8Error::NoRomLoaded);
        }

        if let ExecState::AwaitingKey { register, since } = self.state {
            return Ok(self.poll_key(register, since, now));
        }

        self.delay_timer.update(now);
        self.sound_timer.update(now);

        let address = self.pc;
        let opcode = self.fetch();
        let decoded_opcode = Opcode::decode(opcode);
        trace!("{address:03X}: {opcode:04X}  {decoded_opcode}");

        match self.execute(decoded_opcode, now) {
            Ok(result) => Ok(result),
            Err(err) => {
                warn!("{address:03X}: {decoded_opcode} failed: {err}");
                self.pc = address;
                Err(err)
            }
        }
    }

    fn poll_key(&mut self, register: u4, since: Instant, now: Instant) -> Chip8Result {
        // Lowest key index wins when several are held
        let Some(key) = self.keypad.iter().position(|pressed| *pressed) else {
            return Chip8Result::AwaitingKey;
        };
        let key = key as u8;

        self.v[register] = key;
        self.state = ExecState::Running;

        // Timers were frozen for the duration of the wait.
        let paused = now.saturating_duration_since(since);
        self.delay_timer.shift(paused);
        self.sound_timer.shift(paused);

        debug!("key {key:X} received into V{register}");
        Chip8Result::KeyReceived { key }
    }

    /// Returns true if the sound timer is greater than zero, indicating a beep should be played.
    pub fn should_beep(&self) -> bool {
        self.sound_timer.is_running()
    }

    /// Set the state of a key on the keypad.
    pub fn set_key(&mut self, key: u4, pressed: bool) {
        self.keypad[key] = pressed;
    }

    /// Replace the whole keypad state at once, indexed by key value.
    pub fn set_keys(&mut self, keys: [bool; KEY_COUNT]) {
        self.keypad = keys;
    }

    /// Release every key.
    pub fn clear_keys(&mut self) {
        self.keypad = [false; KEY_COUNT];
    }

    pub fn is_key_pressed(&self, key: u4) -> bool {
        self.keypad[key]
    }

    /// Get the state of a pixel on the display (true = on, false = off).
    pub fn get_display_pixel(&self, y: usize, x: usize) -> bool {
        self.display.pixel(x, y)
    }

    pub fn display(&self) -> &Framebuffer {
        &self.display
    }

    pub fn display_pixels(&self) -> &Display<bool> {
        self.display.pixels()
    }

    pub fn state(&self) -> ExecState {
        self.state
    }

    pub fn is_awaiting_key(&self) -> bool {
        matches!(self.state, ExecState::AwaitingKey { .. })
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn index(&self) -> u16 {
        self.i
    }

    pub fn registers(&self) -> &[u8; 16] {
        &self.v
    }

    pub fn register(&self, x: u4) -> u8 {
        self.v[x]
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer.value()
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer.value()
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn memory(&self) -> &[u8; MEMORY_SIZE] {
        &self.memory
    }

    /// Decodes the instruction stored at `addr` without executing it.
    pub fn disassemble(&self, addr: u16) -> Opcode {
        Opcode::decode(self.word_at(addr))
    }

    /// Fetches the 16-bit opcode at the program counter.
    fn fetch(&self) -> u16 {
        self.word_at(self.pc)
    }

    fn word_at(&self, addr: u16) -> u16 {
        u16::from_be_bytes([self.mem(addr), self.mem(addr.wrapping_add(1))])
    }

    /// Reads the byte at `addr`, masked to the 12-bit address space.
    pub(crate) fn mem(&self, addr: u16) -> u8 {
        self.memory[(addr & ADDRESS_MASK) as usize]
    }

    /// Mutable access to the byte at `addr`, masked to the 12-bit address space.
    pub(crate) fn mem_mut(&mut self, addr: u16) -> &mut u8 {
        &mut self.memory[(addr & ADDRESS_MASK) as usize]
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}
