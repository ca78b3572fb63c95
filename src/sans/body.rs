//! Reshaping of the binary payload.
//!
//! The payload is a flat run of big-endian 32-bit floats, laid out as
//! `[channel][direction][row][column]`, where direction 0 is the forward pass
//! and 1 the backward pass.

use log::debug;
use thiserror::Error;
use zerocopy::{FromBytes, byteorder::big_endian::F32};

use super::header::Header;

/// Recording directions per channel: forward and backward.
///
/// Files recording a single direction are not supported.
pub const DIRECTIONS: usize = 2;

/// Size of one sample in bytes.
pub const SAMPLE_LEN: usize = size_of::<F32>();

/// The payload length does not match the shape declared by the header.
#[derive(Debug, Error)]
#[error(
    "Payload holds {found} bytes, but {channels} channels of {rows}x{columns} pixels \
     in both directions need {expected} bytes."
)]
pub struct BodyShapeError {
    pub channels: usize,
    pub rows: usize,
    pub columns: usize,
    pub expected: u128,
    pub found: usize,
}

/// Shape of a payload, as declared by a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub channels: usize,
    pub rows: usize,
    pub columns: usize,
}

impl Layout {
    pub fn from_header(header: &Header) -> Self {
        let (columns, rows) = header.pixels();

        Self {
            channels: header.channel_names().len(),
            rows,
            columns,
        }
    }

    /// Samples in one direction of one channel.
    pub fn grid_len(&self) -> Option<usize> {
        self.rows.checked_mul(self.columns)
    }

    /// Expected payload length in bytes, if representable.
    pub fn byte_len(&self) -> Option<usize> {
        self.grid_len()?
            .checked_mul(DIRECTIONS)?
            .checked_mul(self.channels)?
            .checked_mul(SAMPLE_LEN)
    }

    /// Decode a payload into forward and backward samples for each channel,
    /// in row-major order.
    ///
    /// The payload length is checked against the layout before any sample is
    /// read. The returned samples are copies, independent of `payload`.
    pub fn split(&self, payload: &[u8]) -> Result<Vec<[Vec<f32>; DIRECTIONS]>, BodyShapeError> {
        let error = || BodyShapeError {
            channels: self.channels,
            rows: self.rows,
            columns: self.columns,
            expected: [self.rows, self.columns, DIRECTIONS, self.channels, SAMPLE_LEN]
                .into_iter()
                .fold(1u128, |acc, n| acc.saturating_mul(n as u128)),
            found: payload.len(),
        };

        let (Some(grid), Some(len)) = (self.grid_len(), self.byte_len()) else {
            return Err(error());
        };

        if len != payload.len() {
            return Err(error());
        }

        debug!("Decoding {} samples as {:?}", len / SAMPLE_LEN, self);

        if grid == 0 {
            return Ok((0..self.channels).map(|_| Default::default()).collect());
        }

        let samples = <[F32]>::ref_from_bytes(payload).map_err(|_| error())?;
        let mut grids = samples
            .chunks_exact(grid)
            .map(|g| g.iter().map(|s| s.get()).collect::<Vec<_>>());

        let mut channels = Vec::with_capacity(self.channels);
        while let (Some(forward), Some(backward)) = (grids.next(), grids.next()) {
            channels.push([forward, backward]);
        }

        Ok(channels)
    }
}
