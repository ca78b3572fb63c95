//! Reader-based decoder implementation.

use std::io::{BufRead, Seek, SeekFrom};

use either::Either::{Left, Right};
use log::{debug, trace};

use crate::{
    record::Record,
    sans::{
        body::Layout,
        boundary::{Boundary, FileType},
    },
};

use super::{Result, parse_header};

/// Decode a scan document from a reader, starting at its current position.
///
/// The header is read line by line until the end tag; the payload is then
/// read in full, following the marker bytes.
///
/// This method is also re-exported as `cantilever::avec::decode_reader`.
pub fn decode<R: BufRead + Seek>(r: &mut R) -> Result<Record> {
    let start = r.stream_position()?;

    let mut bytes = Vec::new();
    let mut state = Boundary::new(FileType::Scan);

    let offset = loop {
        let from = bytes.len();
        if r.read_until(b'\n', &mut bytes)? == 0 {
            return Err(state.finish().into());
        }

        state = match state.advance(&bytes[from..]) {
            Left(state) => state,
            Right(offset) => break offset,
        };
    };

    debug!("Header ends at byte {offset}");

    let header = parse_header(&bytes)?;
    let layout = Layout::from_header(&header);

    let marker = FileType::Scan.marker_len();
    trace!("Skipping {marker} marker bytes");
    r.seek(SeekFrom::Start(start + offset + marker))?;

    let mut payload = Vec::new();
    r.read_to_end(&mut payload)?;

    let samples = layout.split(&payload)?;

    Ok(Record::assemble(header, samples))
}
