//! Slice-based decoder implementation.

use either::Either::{Left, Right};
use log::debug;

use crate::{
    record::Record,
    sans::{
        body::Layout,
        boundary::{Boundary, FileType},
    },
};

use super::{Result, parse_header};

/// Decode a scan document held in a slice.
///
/// This method is also re-exported as `cantilever::avec::decode_slice`.
pub fn decode(r: &[u8]) -> Result<Record> {
    let mut lines = r.split_inclusive(|b| *b == b'\n');
    let mut state = Boundary::new(FileType::Scan);

    let offset = loop {
        let Some(line) = lines.next() else {
            return Err(state.finish().into());
        };

        state = match state.advance(line) {
            Left(state) => state,
            Right(offset) => break offset as usize,
        };
    };

    debug!("Header ends at byte {offset}");

    let header = parse_header(&r[..offset])?;
    let layout = Layout::from_header(&header);

    let start = offset.saturating_add(FileType::Scan.marker_len() as usize);
    let payload = r.get(start..).unwrap_or_default();

    let samples = layout.split(payload)?;

    Ok(Record::assemble(header, samples))
}
