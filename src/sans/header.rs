//! Typed header model and coercion of raw sections.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use log::debug;
use thiserror::Error;

use super::grammar::{self, GrammarError, Raw, Sections};

/// Number of components in the vector-valued fields.
pub const VECTOR_LEN: usize = 2;

/// Sections which must be present, and correctly typed, before the body can be
/// decoded.
pub const REQUIRED_FIELDS: [&str; 6] = [
    "scan_pixels",
    "scan_range",
    "scan_offset",
    "scan_time",
    "bias",
    "data_info",
];

/// Column of the `data_info` table naming each channel.
pub const CHANNEL_NAME_COLUMN: &str = "Name";

#[derive(Debug, Clone, Copy)]
enum Coercion {
    Float,
    Floats,
    Integers,
}

// Applied in order. Vector fields are split on whitespace before parsing.
const COERCIONS: [(&str, Coercion); 6] = [
    ("scan_offset", Coercion::Floats),
    ("scan_pixels", Coercion::Integers),
    ("scan_range", Coercion::Floats),
    ("scan_time", Coercion::Floats),
    ("bias", Coercion::Float),
    ("acq_time", Coercion::Float),
];

/// An error building a typed header.
#[derive(Debug, Error)]
pub enum HeaderError {
    /// The header text violates the grammar.
    #[error("Malformed header: {0}")]
    Parse(#[from] GrammarError),
    /// A numeric field holds text which is not a number of the expected shape.
    #[error("Field {field} has an invalid value {value:?}.")]
    Type { field: String, value: String },
    /// A required field is absent.
    #[error("Missing required field {field}.")]
    Missing { field: String },
}

/// An ordered set of named columns of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: IndexMap<String, Vec<String>>,
    len: usize,
}

impl Table {
    /// Build a table from its column names and rows.
    ///
    /// Rows are expected to have one cell per name. A repeated name keeps the
    /// cells of its last occurrence.
    pub fn new(names: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let len = rows.len();

        let mut columns = names
            .into_iter()
            .map(|name| (name, Vec::with_capacity(len)))
            .collect::<Vec<_>>();

        for row in rows {
            for ((_, column), cell) in columns.iter_mut().zip(row) {
                column.push(cell);
            }
        }

        Self {
            columns: columns.into_iter().collect(),
            len,
        }
    }

    /// Number of rows, excluding the column header row.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Column names, in header order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn column(&self, name: &str) -> Option<&[String]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn cell(&self, name: &str, row: usize) -> Option<&str> {
        self.column(name)?.get(row).map(String::as_str)
    }

    /// Cells of a row, in column order.
    pub fn row(&self, row: usize) -> Option<Vec<&str>> {
        (row < self.len).then(|| {
            self.columns
                .values()
                .filter_map(|c| c.get(row).map(String::as_str))
                .collect()
        })
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names().collect::<Vec<_>>().join("\t"))?;
        for i in 0..self.len {
            write!(f, "\n{}", self.row(i).unwrap_or_default().join("\t"))?;
        }
        Ok(())
    }
}

/// The value of a header section.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Text(String),
    Float(f64),
    Floats(Vec<f64>),
    Integers(Vec<usize>),
    Table(Table),
}

impl Entry {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Self::Table(t) => Some(t),
            _ => None,
        }
    }
}

impl From<Raw> for Entry {
    fn from(raw: Raw) -> Self {
        match raw {
            Raw::Value(s) => Self::Text(s),
            Raw::Table(t) => Self::Table(t),
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Floats(v) => {
                let v = v.iter().map(|x| format!("{x:?}")).collect::<Vec<_>>();
                f.write_str(&v.join(" "))
            }
            Self::Integers(v) => {
                let v = v.iter().map(usize::to_string).collect::<Vec<_>>();
                f.write_str(&v.join(" "))
            }
            Self::Table(t) => write!(f, "{t}"),
        }
    }
}

/// A parsed scan file header.
///
/// Every section is kept, by key, in header order. The fields the body
/// decoder depends on are validated on construction and exposed through typed
/// accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    entries: IndexMap<String, Entry>,
    pixels: [usize; VECTOR_LEN],
    range: [f64; VECTOR_LEN],
    offset: [f64; VECTOR_LEN],
    time: [f64; VECTOR_LEN],
    bias: f64,
    channels: Table,
}

impl Header {
    /// Coerce and validate raw sections.
    pub fn from_sections(sections: Sections) -> Result<Self, HeaderError> {
        let mut entries = sections
            .into_iter()
            .map(|(k, v)| (k, Entry::from(v)))
            .collect::<IndexMap<_, _>>();

        for (field, coercion) in COERCIONS {
            if let Some(entry) = entries.get_mut(field) {
                *entry = coerce(field, entry, coercion)?;
            }
        }

        for field in REQUIRED_FIELDS {
            required(&entries, field)?;
        }

        let pixels = match required(&entries, "scan_pixels")? {
            Entry::Integers(v) => pair(v),
            _ => None,
        };
        let floats = |field: &str| match required(&entries, field)? {
            Entry::Floats(v) => pair(v).ok_or_else(|| mistyped(field, &entries[field])),
            entry => Err(mistyped(field, entry)),
        };

        let pixels = pixels.ok_or_else(|| mistyped("scan_pixels", &entries["scan_pixels"]))?;
        let range = floats("scan_range")?;
        let offset = floats("scan_offset")?;
        let time = floats("scan_time")?;

        let bias = match required(&entries, "bias")? {
            Entry::Float(x) => *x,
            entry => Err(mistyped("bias", entry))?,
        };

        let channels = match required(&entries, "data_info")? {
            Entry::Table(t) => t.clone(),
            entry => Err(mistyped("data_info", entry))?,
        };

        if channels.column(CHANNEL_NAME_COLUMN).is_none() {
            Err(HeaderError::Missing {
                field: format!("data_info/{CHANNEL_NAME_COLUMN}"),
            })?;
        }

        debug!(
            "Header declares {} channels over {}x{} pixels",
            channels.len(),
            pixels[0],
            pixels[1]
        );

        Ok(Self {
            entries,
            pixels,
            range,
            offset,
            time,
            bias,
            channels,
        })
    }

    /// Pixel dimensions, as `(columns, rows)`.
    pub fn pixels(&self) -> (usize, usize) {
        (self.pixels[0], self.pixels[1])
    }

    /// Physical extent of the scan frame.
    pub fn range(&self) -> [f64; VECTOR_LEN] {
        self.range
    }

    /// Centre of the scan frame.
    pub fn offset(&self) -> [f64; VECTOR_LEN] {
        self.offset
    }

    /// Time per line, forward and backward.
    pub fn time(&self) -> [f64; VECTOR_LEN] {
        self.time
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn acq_time(&self) -> Option<f64> {
        self.get("acq_time")?.as_float()
    }

    /// The channel metadata table (`data_info`), one row per channel.
    pub fn channels(&self) -> &Table {
        &self.channels
    }

    /// Channel names in payload order.
    pub fn channel_names(&self) -> &[String] {
        self.channels.column(CHANNEL_NAME_COLUMN).unwrap_or_default()
    }

    /// The feedback controller table, if recorded.
    pub fn z_controller(&self) -> Option<&Table> {
        self.get("z-controller")?.as_table()
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    /// The value of a section left as text.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_text()
    }

    /// All sections, in header order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Parse header text into a typed header.
pub fn parse(text: &str) -> Result<Header, HeaderError> {
    Header::from_sections(grammar::parse(text)?)
}

fn coerce(field: &str, entry: &Entry, coercion: Coercion) -> Result<Entry, HeaderError> {
    let Entry::Text(text) = entry else {
        return Err(mistyped(field, entry));
    };

    let coerced = match coercion {
        Coercion::Float => text.trim().parse().ok().map(Entry::Float),
        Coercion::Floats => components(text).map(Entry::Floats),
        Coercion::Integers => components(text).map(Entry::Integers),
    };

    coerced.ok_or_else(|| mistyped(field, entry))
}

fn components<T: FromStr>(text: &str) -> Option<Vec<T>> {
    let values = text
        .split_whitespace()
        .map(|s| s.parse().ok())
        .collect::<Option<Vec<T>>>()?;

    (values.len() == VECTOR_LEN).then_some(values)
}

fn pair<T: Copy>(values: &[T]) -> Option<[T; VECTOR_LEN]> {
    values.try_into().ok()
}

fn required<'a>(
    entries: &'a IndexMap<String, Entry>,
    field: &str,
) -> Result<&'a Entry, HeaderError> {
    entries.get(field).ok_or_else(|| HeaderError::Missing {
        field: field.to_string(),
    })
}

fn mistyped(field: &str, entry: &Entry) -> HeaderError {
    HeaderError::Type {
        field: field.to_string(),
        value: entry.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(overrides: &[(&str, &str)]) -> String {
        let mut fields = vec![
            ("ACQ_TIME", "12.5"),
            ("SCAN_PIXELS", "       4       3"),
            ("SCAN_FILE", "C:\\data\\img001.sxm"),
            ("SCAN_TIME", "             1.000E+0             1.000E+0"),
            ("SCAN_RANGE", "           5.000000E-8           3.750000E-8"),
            ("SCAN_OFFSET", "             1.0E-9         -2.0E-9"),
            ("SCAN_DIR", "up"),
            ("BIAS", "            -1.000E-1"),
        ];
        for &(key, value) in overrides {
            match fields.iter().position(|(k, _)| *k == key) {
                Some(i) => fields[i].1 = value,
                None => fields.push((key, value)),
            }
        }

        let mut text = String::new();
        for (key, value) in fields.iter().filter(|(_, v)| *v != "<absent>") {
            text.push_str(&format!(":{key}:\n{value}\n"));
        }
        text.push_str(":DATA_INFO:\n\tChannel\tName\tUnit\tDirection\tCalibration\tOffset\n");
        text.push_str("\t14\tZ\tm\tboth\t-1.000E-9\t0.000E+0\n");
        text.push_str("\n:SCANIT_END:\n");
        text
    }

    #[test]
    fn typed_fields() {
        let header = parse(&header(&[])).unwrap();

        assert_eq!(header.pixels(), (4, 3));
        assert_eq!(header.range(), [5.0e-8, 3.75e-8]);
        assert_eq!(header.offset(), [1.0e-9, -2.0e-9]);
        assert_eq!(header.time(), [1.0, 1.0]);
        assert_eq!(header.bias(), -0.1);
        assert_eq!(header.acq_time(), Some(12.5));
        assert_eq!(header.channel_names(), ["Z"]);
        assert_eq!(header.text("scan_dir"), Some("up"));
        assert_eq!(header.text("scan_file"), Some("C:\\data\\img001.sxm"));
        assert_eq!(header.get("scan_pixels"), Some(&Entry::Integers(vec![4, 3])));
        assert!(header.z_controller().is_none());
    }

    #[test]
    fn non_numeric_field() {
        let err = parse(&header(&[("BIAS", "n/a")])).unwrap_err();
        let HeaderError::Type { field, value } = err else {
            panic!("expected a different error");
        };
        assert_eq!(field, "bias");
        assert_eq!(value, "n/a");
    }

    #[test]
    fn fractional_pixels() {
        let err = parse(&header(&[("SCAN_PIXELS", "4.5 3")])).unwrap_err();
        assert!(matches!(err, HeaderError::Type { field, .. } if field == "scan_pixels"));
    }

    #[test]
    fn vector_with_wrong_length() {
        let err = parse(&header(&[("SCAN_RANGE", "1E-8")])).unwrap_err();
        let HeaderError::Type { field, value } = err else {
            panic!("expected a different error");
        };
        assert_eq!(field, "scan_range");
        assert_eq!(value, "1E-8");
    }

    #[test]
    fn empty_numeric_field() {
        let err = parse(&header(&[("ACQ_TIME", "")])).unwrap_err();
        assert!(matches!(err, HeaderError::Type { field, .. } if field == "acq_time"));
    }

    #[test]
    fn missing_required_field() {
        for key in ["SCAN_PIXELS", "SCAN_TIME", "SCAN_RANGE", "SCAN_OFFSET", "BIAS"] {
            let err = parse(&header(&[(key, "<absent>")])).unwrap_err();
            let HeaderError::Missing { field } = err else {
                panic!("expected a different error");
            };
            assert_eq!(field, key.to_lowercase());
        }
    }

    #[test]
    fn acq_time_is_optional() {
        let header = parse(&header(&[("ACQ_TIME", "<absent>")])).unwrap();
        assert_eq!(header.acq_time(), None);
    }

    #[test]
    fn missing_channel_table() {
        let text = ":SCAN_PIXELS:\n1 1\n:SCAN_TIME:\n1 1\n:SCAN_RANGE:\n1 1\n\
            :SCAN_OFFSET:\n0 0\n:BIAS:\n0\n\n:SCANIT_END:\n";
        let err = parse(text).unwrap_err();
        assert!(matches!(err, HeaderError::Missing { field } if field == "data_info"));
    }

    #[test]
    fn table_rows_and_display() {
        let table = Table::new(
            vec!["Name".into(), "on".into()],
            vec![vec!["log Current".into(), "1".into()]],
        );
        assert_eq!(table.row(0).unwrap(), ["log Current", "1"]);
        assert_eq!(table.cell("on", 0), Some("1"));
        assert!(table.row(1).is_none());
        assert_eq!(table.to_string(), "Name\ton\nlog Current\t1");
    }
}
