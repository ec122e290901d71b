use std::fmt::{self, Write};

use super::{DISPLAY_X, DISPLAY_Y, Display};

/// Monochrome 64x32 display buffer.
///
/// Pixels are only ever changed by XOR-ing sprites onto the buffer, or by
/// clearing the whole thing.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    pixels: Display<bool>,
}

impl Framebuffer {
    pub fn new() -> Self {
        Self {
            pixels: [[false; DISPLAY_X]; DISPLAY_Y],
        }
    }

    pub fn clear(&mut self) {
        self.pixels = [[false; DISPLAY_X]; DISPLAY_Y];
    }

    /// XOR a sprite onto the buffer with its top-left corner at (`x`, `y`).
    ///
    /// Each byte of `sprite` is one row of 8 pixels, most significant bit leftmost.
    /// The starting column wraps around the screen width and columns that run off
    /// the right edge are clipped. Rows wrap vertically, so a sprite drawn near the
    /// bottom continues at the top.
    ///
    /// Returns `true` if any pixel was switched off (a collision).
    pub fn draw_sprite(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        let x_pos = x as usize % DISPLAY_X;
        let col_count = std::cmp::min(8, DISPLAY_X - x_pos);

        let mut any_erased = false;
        for (row, sprite_byte) in sprite.iter().enumerate() {
            let y_pos = (y as usize + row) % DISPLAY_Y;

            for col in 0..col_count {
                // If current sprite bit is non-zero
                if (sprite_byte & (0x80 >> col)) != 0 {
                    let pixel = &mut self.pixels[y_pos][x_pos + col];

                    // Flip the pixel
                    *pixel ^= true;

                    if !*pixel {
                        any_erased = true;
                    }
                }
            }
        }

        any_erased
    }

    /// Get the state of a pixel (true = on, false = off).
    ///
    /// Out of range coordinates read as off.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.pixels
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(false)
    }

    pub fn pixels(&self) -> &Display<bool> {
        &self.pixels
    }

    /// Number of pixels currently switched on.
    pub fn lit_count(&self) -> usize {
        self.pixels.iter().flatten().filter(|px| **px).count()
    }

    /// Renders the buffer as text, `#` for lit pixels and `.` for dark ones.
    pub fn dump(&self) -> Result<String, fmt::Error> {
        let mut buf = String::with_capacity((DISPLAY_X + 1) * DISPLAY_Y);

        for row in self.pixels.iter() {
            for px in row.iter() {
                buf.write_char(if *px { '#' } else { '.' })?;
            }
            writeln!(buf)?;
        }

        Ok(buf)
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}
