//! The display refresh region: a 64x32 monochrome bitmap packed 8 pixels to a byte,
//! 8 bytes per row. Pixel column `c` of a row is bit `c % 8` of byte `c / 8`, so the
//! least significant bit of each byte is its leftmost pixel.
use std::fmt;

pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;
pub const ROW_BYTES: usize = WIDTH / 8;
pub const DISPLAY_SIZE: usize = ROW_BYTES * HEIGHT;

/// Zero every byte of the framebuffer
pub fn clear(buffer: &mut [u8]) {
    for byte in buffer.iter_mut() {
        *byte = 0;
    }
}

/// XOR a sprite into the framebuffer with its top left corner at column `x`, row
/// `y`. Each sprite byte is one 8 pixel row, most significant bit leftmost. Rows
/// wrap from the bottom of the screen to the top; columns do not wrap, pixels that
/// would land past column 63 are dropped.
///
/// Returns true if any pixel that was on got turned off.
pub fn draw_sprite(buffer: &mut [u8], x: u8, y: u8, sprite: &[u8]) -> bool {
    let x = x as usize;
    let col = x / 8;
    let shift = x % 8;
    let mut collision = false;

    for (i, &row_bits) in sprite.iter().enumerate() {
        let row = (y as usize + i) % HEIGHT;
        let row_start = row * ROW_BYTES;

        // sprite bytes are MSB-leftmost, the framebuffer is LSB-leftmost
        let bits = row_bits.reverse_bits();

        if shift == 0 {
            collision |= xor_byte(buffer, row_start, col, bits);
        } else {
            collision |= xor_byte(buffer, row_start, col, bits << shift);
            collision |= xor_byte(buffer, row_start, col + 1, bits >> (8 - shift));
        }
    }

    collision
}

/// XOR `bits` into byte `col` of the row starting at `row_start`. Columns past the
/// right edge are clipped.
fn xor_byte(buffer: &mut [u8], row_start: usize, col: usize, bits: u8) -> bool {
    if col >= ROW_BYTES || bits == 0 {
        return false;
    }
    let byte = &mut buffer[row_start + col];
    let collision = *byte & bits != 0;
    *byte ^= bits;
    collision
}

/// A read-only view of the framebuffer for whatever presents it
#[derive(Clone, Copy)]
pub struct Framebuffer<'a> {
    bytes: &'a [u8],
}

impl<'a> Framebuffer<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Framebuffer { bytes }
    }

    /// The raw 256 packed bytes
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Whether the pixel at column `x`, row `y` is on. Out of range pixels are off.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        if x >= WIDTH || y >= HEIGHT {
            return false;
        }
        self.bytes[y * ROW_BYTES + x / 8] & (1 << (x % 8)) != 0
    }

    /// All 2048 pixels in row major order
    pub fn pixels(&self) -> impl Iterator<Item = bool> + 'a {
        let view = *self;
        (0..HEIGHT).flat_map(move |y| (0..WIDTH).map(move |x| view.pixel(x, y)))
    }

    pub fn is_blank(&self) -> bool {
        self.bytes.iter().all(|b| *b == 0)
    }
}

impl fmt::Display for Framebuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                f.write_str(if self.pixel(x, y) { "#" } else { "." })?;
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}
