use std::{
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, bail};
use clap::{ArgAction, Parser};
use clap_num::maybe_hex;
use log::{LevelFilter, info, warn};
use simple_logger::SimpleLogger;

use chips::{
    emu::{Chip8, Chip8Result},
    u4,
};

#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    /// Path to the CHIP-8 ROM file
    rom_path: PathBuf,

    /// Number of instructions to run before dumping the display
    #[arg(long, default_value_t = 10_000)]
    ticks: u64,

    /// Instructions per second, 0 runs as fast as possible
    #[arg(long, default_value_t = 700.0)]
    hz: f32,

    /// Key (0x0-0xF) held down for the whole run, may be repeated
    #[arg(long = "press", value_name = "KEY", value_parser = maybe_hex::<u8>)]
    press: Vec<u8>,

    /// Seed for the random number instruction
    #[arg(long)]
    seed: Option<u64>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Wall-clock time per instruction, or `None` when running unthrottled.
fn time_step(hz: f32) -> anyhow::Result<Option<Duration>> {
    if hz.is_nan() || hz <= 0.0 {
        return Ok(None);
    }
    let step = Duration::try_from_secs_f32(1.0 / hz)
        .with_context(|| format!("Instruction rate {hz} Hz is too low"))?;
    Ok(Some(step))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    SimpleLogger::new()
        .with_level(log_level(args.verbose))
        .init()
        .context("Failed to initialize logger")?;

    let mut chip8 = match args.seed {
        Some(seed) => Chip8::with_seed(seed),
        None => Chip8::new(),
    };
    chip8
        .load_file(&args.rom_path)
        .context("Failed to load ROM into CHIP-8 memory")?;

    for key in &args.press {
        let Some(key) = u4::try_new(*key) else {
            bail!("Key {key:#X} is outside the keypad range 0x0-0xF");
        };
        chip8.set_key(key, true);
    }

    let time_step = time_step(args.hz)?;
    let mut next_tick = Instant::now();
    let mut executed = 0;

    while executed < args.ticks {
        match chip8.tick().context("CHIP-8 execution fault")? {
            Chip8Result::UnknownOpcode { opcode, address } => {
                warn!("Skipped unknown opcode {opcode:04X} at {address:03X}");
            }
            Chip8Result::AwaitingKey if args.press.is_empty() => {
                info!("ROM is waiting for a key and none is held, stopping");
                break;
            }
            _ => {}
        }
        executed += 1;

        if let Some(step) = time_step {
            next_tick += step;
            let now = Instant::now();
            if next_tick > now {
                thread::sleep(next_tick - now);
            } else {
                // Fell behind, don't try to catch up
                next_tick = now;
            }
        }
    }

    info!(
        "Executed {executed} instructions, pc = {:03X}, beeping = {}",
        chip8.pc(),
        chip8.should_beep()
    );

    let screen = chip8
        .display()
        .dump()
        .context("Failed to render display")?;
    print!("{screen}");

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_time_step() {
        assert_eq!(time_step(0.0).unwrap(), None);
        assert_eq!(time_step(-5.0).unwrap(), None);
        assert_eq!(time_step(f32::NAN).unwrap(), None);
        assert_eq!(time_step(4.0).unwrap(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_time_step_rejects_tiny_rate() {
        assert!(time_step(1e-45).is_err());
        assert!(time_step(f32::MIN_POSITIVE).is_err());
    }
}
