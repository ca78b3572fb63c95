//! The decoded contents of a scan file.

use std::fmt;

use crate::sans::{body::DIRECTIONS, header::Header};

/// A pass of the raster scan over a row of pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// Both directions, in payload order.
    pub const ALL: [Self; DIRECTIONS] = [Self::Forward, Self::Backward];

    /// Short name used in output file names.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Forward => "fwd",
            Self::Backward => "bwd",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
        })
    }
}

/// A two-dimensional grid of samples, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    rows: usize,
    columns: usize,
    samples: Vec<f32>,
}

impl Grid {
    /// Wrap row-major samples, if their number matches the dimensions.
    pub fn new(rows: usize, columns: usize, samples: Vec<f32>) -> Option<Self> {
        (rows.checked_mul(columns)? == samples.len()).then_some(Self {
            rows,
            columns,
            samples,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// All samples, row-major.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn row(&self, i: usize) -> Option<&[f32]> {
        (i < self.rows).then(|| &self.samples[i * self.columns..(i + 1) * self.columns])
    }

    pub fn get(&self, row: usize, column: usize) -> Option<f32> {
        self.row(row)?.get(column).copied()
    }

    /// Rows in storage order.
    pub fn iter_rows(&self) -> impl DoubleEndedIterator<Item = &[f32]> + '_ {
        (0..self.rows).map(|i| &self.samples[i * self.columns..(i + 1) * self.columns])
    }

    /// A copy with the row order reversed.
    pub fn flipped(&self) -> Self {
        let samples = self.iter_rows().rev().flatten().copied().collect();

        Self {
            rows: self.rows,
            columns: self.columns,
            samples,
        }
    }

    pub fn to_rows(&self) -> Vec<Vec<f32>> {
        self.iter_rows().map(<[f32]>::to_vec).collect()
    }
}

/// Both directions of one recorded channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    /// Row of this channel in the header's `data_info` table.
    pub index: usize,
    pub name: String,
    pub forward: Grid,
    pub backward: Grid,
}

impl Channel {
    pub fn grid(&self, direction: Direction) -> &Grid {
        match direction {
            Direction::Forward => &self.forward,
            Direction::Backward => &self.backward,
        }
    }
}

/// A decoded scan file: its header and every channel, in payload order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub header: Header,
    pub channels: Vec<Channel>,
}

impl Record {
    /// Pair the header's channel names with their decoded samples.
    ///
    /// `samples` holds the forward and backward samples of each channel, as
    /// produced by [`crate::sans::body::Layout::split`] for this header.
    pub fn assemble(header: Header, samples: Vec<[Vec<f32>; DIRECTIONS]>) -> Self {
        let (columns, rows) = header.pixels();

        let grid = |samples| Grid {
            rows,
            columns,
            samples,
        };

        let channels = header
            .channel_names()
            .iter()
            .zip(samples)
            .enumerate()
            .map(|(index, (name, [forward, backward]))| Channel {
                index,
                name: name.clone(),
                forward: grid(forward),
                backward: grid(backward),
            })
            .collect();

        Self { header, channels }
    }

    /// The first channel with the given name.
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.name == name)
    }
}
