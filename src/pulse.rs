//! Calibration pulse patterns.
//!
//! The chip exposes two pulse primitives: pulse the currently addressed
//! pixel in place, and pulse it then step the address by a fixed offset.
//! The two patterns below are the sweeps the calibration bench expects;
//! their offset arithmetic is part of the external contract, since the
//! analysis software identifies pulsed pixels by these exact coordinates.

use crate::client::GroupControl;

/// Pixels a column-sweep start address is offset by, per pass.
const COLUMN_PASSES: i32 = 8;
/// Row steps per column pass, one per pixel row of a chip.
const ROWS_PER_COLUMN: i32 = 256;
/// Leftmost addressable column offset.
const FIRST_COLUMN: i32 = -255;

/// Pulse every pixel of every chip `n` times.
///
/// Runs eight interleaved full-height column passes: pass `j` starts at
/// column `-255 + j`, row 0, and steps down one row at a time, pulsing
/// `n` times at each position.
pub(crate) fn pulse_all_pixels<C: GroupControl>(client: &mut C, n: i32) {
    for j in 0..COLUMN_PASSES {
        client.pulse_pixel(0, FIRST_COLUMN + j, 0);
        for _ in 0..ROWS_PER_COLUMN {
            client.pulse_pixel_and_move(n, 0, 1);
        }
    }
}

/// First row of the diagonal sweep.
const DIAGONAL_FIRST_ROW: i32 = 20;
/// Row bound the sweep stays below.
const DIAGONAL_ROW_END: i32 = 232;
/// Rows skipped between diagonals.
const DIAGONAL_ROW_STEP: i32 = 16;
/// Pulse-and-step count along each diagonal.
const DIAGONAL_LENGTH: i32 = 8;

/// Pulse a diagonal test pattern `n` times.
///
/// Starting at rows 20, 36, … up to 228, each diagonal begins at column
/// `-255` and steps (1, 1) eight times, pulsing `n` times per step.
pub(crate) fn pulse_diagonal<C: GroupControl>(client: &mut C, n: i32) {
    let mut row = DIAGONAL_FIRST_ROW;
    while row < DIAGONAL_ROW_END {
        client.pulse_pixel(0, FIRST_COLUMN, row);
        for _ in 0..DIAGONAL_LENGTH {
            client.pulse_pixel_and_move(n, 1, 1);
        }
        row += DIAGONAL_ROW_STEP;
    }
}
