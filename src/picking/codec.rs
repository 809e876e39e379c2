//! Bijective point index <-> RGBA8 mapping

use crate::core::error::Error;
use crate::core::grid::Grid;
use crate::core::types::Result;

/// Reserved id for "no point rendered here". All four channels are 0xFF,
/// which is what a white (1, 1, 1, 1) clear produces.
pub const EMPTY: u32 = u32::MAX;

/// Largest index that can be encoded
pub const MAX_INDEX: u32 = EMPTY - 1;

/// Encode a point index as four little-endian channel bytes (r, g, b, a).
///
/// `r = i mod 256`, `g = (i / 256) mod 256`, and so on. Indices that would
/// collide with [`EMPTY`] or overflow 32 bits fail with
/// [`Error::IndexSpaceExhausted`].
pub fn encode(index: usize) -> Result<[u8; 4]> {
    match u32::try_from(index) {
        Ok(i) if i != EMPTY => Ok(i.to_le_bytes()),
        _ => Err(Error::IndexSpaceExhausted(index as u64)),
    }
}

/// Decode four channel bytes back into a point index (or [`EMPTY`])
#[inline]
pub fn decode(rgba: [u8; 4]) -> u32 {
    u32::from_le_bytes(rgba)
}

/// Fail if a cloud of `point_count` points cannot be fully encoded
pub fn check_capacity(point_count: usize) -> Result<()> {
    if point_count > MAX_INDEX as usize + 1 {
        return Err(Error::IndexSpaceExhausted(point_count as u64 - 1));
    }
    Ok(())
}

/// Decode a tightly packed RGBA8 readback into an id buffer.
///
/// With `bottom_up` the first row of `bytes` is the bottom of the screen
/// (OpenGL readback order) and rows are flipped so row 0 is the top.
pub fn decode_rgba_buffer(bytes: &[u8], width: u32, height: u32, bottom_up: bool) -> Result<Grid<u32>> {
    let expected = width as usize * height as usize * 4;
    if bytes.len() != expected {
        return Err(Error::InvalidDimensions(format!(
            "RGBA readback of {}x{} needs {} bytes, got {}",
            width, height, expected, bytes.len()
        )));
    }
    let ids = bytes
        .chunks_exact(4)
        .map(|px| decode([px[0], px[1], px[2], px[3]]))
        .collect();
    let mut grid = Grid::from_vec(width, height, ids)?;
    if bottom_up {
        grid.flip_vertical();
    }
    Ok(grid)
}
