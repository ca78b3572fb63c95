//! I/O-free stages of the decoding pipeline.
//!
//! This module is intended for applications that read file bytes themselves.
//! See [`crate::avec`] for front-ends covering the common case of decoding a
//! file or a byte slice.
//!
//! # Architecture
//!
//! Decoding is strictly sequential, since the shape of the payload is only
//! known once the header has been parsed:
//!
//! 1. [`boundary`]: feed header lines to a [`boundary::Boundary`] token until it
//!    yields the byte offset just past the end-tag line. Scan files carry
//!    [`boundary::SCAN_MARKER_LEN`] further marker bytes before the payload.
//!
//! 2. [`grammar`]: feed the header text, line by line, to a
//!    [`grammar::Grammar`] state machine, producing raw [`grammar::Sections`].
//!
//! 3. [`header`]: coerce the raw sections into a typed [`header::Header`],
//!    failing on any missing or non-numeric required field.
//!
//! 4. [`body`]: check the payload length against the [`body::Layout`] implied
//!    by the header, then split it into per-channel, per-direction samples.
//!
//! None of these stages retain references to the bytes they are given.

pub mod body;
pub mod boundary;
pub mod grammar;
pub mod header;
