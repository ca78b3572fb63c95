//! A decoder for the scan files written by Nanonis scanning-probe microscope
//! controllers.
//!
//! A scan (`.sxm`) file is a plain-text header of `:SECTION:` markers and
//! values, closed by a `SCANIT_END` sentinel, followed by the raw image data as
//! big-endian 32-bit floats. The header decides the shape of the data: the
//! number of channels, the pixel dimensions, and (implicitly) that every
//! channel is recorded in both scan directions.
//!
//! Most users should begin with [`avec::decode`], which reads a file from disk
//! and returns a [`Record`] holding the typed header and a forward and backward
//! [`Grid`] for every channel. The [`asc`] module serialises a record into the
//! plain-text `.asc` format.
//!
//! The I/O-free building blocks (boundary search, header grammar, coercion and
//! body layout) live in the [`sans`] module, for applications that manage their
//! own buffers.
//!
//! ## Cargo Features
//!
//! - `cli`: build the `sxm2asc` command-line converter (default).

pub mod asc;
pub mod avec;
pub mod record;
pub mod sans;

pub use avec::{Error, Result, decode};
pub use record::{Channel, Direction, Grid, Record};
pub use sans::header::{Entry, Header, Table};
