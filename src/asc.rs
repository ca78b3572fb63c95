//! Writer for the plain-text `.asc` scan format.
//!
//! Each file holds one direction of one channel: a header in the scan file's
//! own `:SECTION:` layout, reduced to the fields describing that channel,
//! followed by the samples as text. Rows are written bottom-up (the reverse
//! of storage order), one per line, each sample in `%.18e` notation.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use log::info;
use thiserror::Error;

use crate::{
    record::{Channel, Direction, Grid, Record},
    sans::header::Header,
};

/// Columns of the channel metadata table copied into each file.
pub const CHANNEL_COLUMNS: [&str; 6] = [
    "Channel",
    "Name",
    "Unit",
    "Direction",
    "Calibration",
    "Offset",
];

/// Errors occurring while writing `.asc` files.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The header lacks a field the output format reproduces.
    #[error("Missing header field {field} required for output.")]
    MissingField { field: String },
}

/// The output path for one direction of a channel: the input path with
/// `[<channel>_fwd].asc` or `[<channel>_bwd].asc` appended.
///
/// If `out_dir` is given, the file is placed there instead of beside the input.
pub fn output_path(
    input: &Path,
    out_dir: Option<&Path>,
    channel: &str,
    direction: Direction,
) -> PathBuf {
    let suffix = format!("[{channel}_{}].asc", direction.suffix());

    let mut name = match out_dir {
        Some(_) => input.file_name().unwrap_or_default().to_os_string(),
        None => input.as_os_str().to_os_string(),
    };
    name.push(suffix);

    match out_dir {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// Write both directions of every channel of a record, returning the paths
/// written.
pub fn write_record(
    input: &Path,
    out_dir: Option<&Path>,
    record: &Record,
) -> Result<Vec<PathBuf>, Error> {
    let mut written = Vec::with_capacity(record.channels.len() * Direction::ALL.len());

    for channel in &record.channels {
        let header = render_header(&record.header, channel)?;

        for direction in Direction::ALL {
            let path = output_path(input, out_dir, &channel.name, direction);

            let mut w = BufWriter::new(File::create(&path)?);
            w.write_all(header.as_bytes())?;
            write_grid(&mut w, channel.grid(direction))?;
            w.flush()?;

            info!("Wrote {}", path.display());
            written.push(path);
        }
    }

    Ok(written)
}

/// Write one direction of a channel to a writer.
pub fn write_channel(
    w: &mut impl Write,
    header: &Header,
    channel: &Channel,
    direction: Direction,
) -> Result<(), Error> {
    w.write_all(render_header(header, channel)?.as_bytes())?;
    write_grid(w, channel.grid(direction))?;
    Ok(())
}

/// Render the header block for a channel.
pub fn render_header(header: &Header, channel: &Channel) -> Result<String, Error> {
    let text = |key: &str| {
        header.text(key).ok_or_else(|| Error::MissingField {
            field: key.to_string(),
        })
    };

    let acq_time = header.acq_time().ok_or_else(|| Error::MissingField {
        field: "acq_time".to_string(),
    })?;

    let cells = CHANNEL_COLUMNS
        .iter()
        .map(|column| {
            header
                .channels()
                .cell(column, channel.index)
                .ok_or_else(|| Error::MissingField {
                    field: format!("data_info/{column}"),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let (columns, rows) = header.pixels();
    let [time_fwd, time_bwd] = header.time().map(number);
    let [range_x, range_y] = header.range().map(number);
    let [offset_x, offset_y] = header.offset().map(number);

    Ok(format!(
        ":NANONIS_VERSION:\n{version}\n\
         :SCANIT_TYPE:\n              FLOAT            MSBFIRST\n\
         :REC_DATE:\n {date}\n\
         :REC_TIME:\n{time}\n\
         :REC_TEMP:\n      {temp}\n\
         :ACQ_TIME:\n      {acq_time}\n\
         :SCAN_PIXELS:\n       {columns}       {rows}\n\
         :SCAN_FILE:\n{file}\n\
         :SCAN_TIME:\n             {time_fwd}             {time_bwd}\n\
         :SCAN_RANGE:\n           {range_x}           {range_y}\n\
         :SCAN_OFFSET:\n             {offset_x}         {offset_y}\n\
         :SCAN_ANGLE:\n            {angle}\n\
         :SCAN_DIR:\n{dir}\n\
         :BIAS:\n            {bias}\n\
         :DATA_INFO:\n  Channel\tName\tUnit\tDirection\tCalibration\tOffset\n  {cells}\n\
         \n:SCANIT_END:\n\n\n",
        version = text("nanonis_version")?,
        date = text("rec_date")?,
        time = text("rec_time")?,
        temp = text("rec_temp")?,
        acq_time = number(acq_time),
        file = text("scan_file")?,
        angle = text("scan_angle")?,
        dir = text("scan_dir")?,
        bias = number(header.bias()),
        cells = cells.join("\t"),
    ))
}

/// Write the rows of a grid, last row first.
pub fn write_grid(w: &mut impl Write, grid: &Grid) -> io::Result<()> {
    for row in grid.iter_rows().rev() {
        let row = row.iter().map(|s| sample(*s)).collect::<Vec<_>>();
        writeln!(w, "{}", row.join(" "))?;
    }
    Ok(())
}

/// Format a header number as its shortest round-trip representation.
fn number(x: f64) -> String {
    non_finite(x).unwrap_or_else(|| c_exponent(format!("{x:?}")))
}

/// Format a sample with eighteen fractional digits in scientific notation.
fn sample(x: f32) -> String {
    let x = f64::from(x);
    non_finite(x).unwrap_or_else(|| c_exponent(format!("{x:.18e}")))
}

fn non_finite(x: f64) -> Option<String> {
    if x.is_nan() {
        Some("nan".to_string())
    } else if x.is_infinite() {
        Some(if x > 0.0 { "inf" } else { "-inf" }.to_string())
    } else {
        None
    }
}

/// Rewrite an exponent as a sign and at least two digits (`e-8` to `e-08`).
fn c_exponent(s: String) -> String {
    let Some((mantissa, exponent)) = s.split_once('e') else {
        return s;
    };

    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };

    format!("{mantissa}e{sign}{digits:0>2}")
}
