use std::{fs, path::Path};

use cantilever::{Direction, asc, avec::decode_slice};
use csv::ReaderBuilder;

const PATH: &str = "fixtures/two-channel.sxm";

#[test_log::test]
fn write_all_channels() {
    let record = cantilever::decode(PATH).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let written = asc::write_record(Path::new(PATH), Some(dir.path()), &record).unwrap();

    let names = written
        .iter()
        .map(|p| p.file_name().unwrap().to_str().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(
        names,
        [
            "two-channel.sxm[Z_fwd].asc",
            "two-channel.sxm[Z_bwd].asc",
            "two-channel.sxm[Current_fwd].asc",
            "two-channel.sxm[Current_bwd].asc",
        ]
    );

    let text = fs::read_to_string(dir.path().join("two-channel.sxm[Z_fwd].asc")).unwrap();
    let (header, body) = text.split_once(":SCANIT_END:\n\n\n").unwrap();

    for section in [
        ":NANONIS_VERSION:\n2\n",
        ":SCANIT_TYPE:\n              FLOAT            MSBFIRST\n",
        ":REC_DATE:\n 16.10.2026\n",
        ":REC_TIME:\n14:55:02\n",
        ":REC_TEMP:\n      290.0000000000\n",
        ":ACQ_TIME:\n      76.8\n",
        ":SCAN_PIXELS:\n       4       3\n",
        ":SCAN_FILE:\nC:\\Users\\lab\\Documents\\Nanonis\\img001.sxm\n",
        ":SCAN_TIME:\n             6.4             6.4\n",
        ":SCAN_RANGE:\n           2e-08           1.5e-08\n",
        ":SCAN_OFFSET:\n             1.25e-09         -3.5e-09\n",
        ":SCAN_ANGLE:\n            0.000E+0\n",
        ":SCAN_DIR:\nup\n",
        ":BIAS:\n            -0.5\n",
        "  14\tZ\tm\tboth\t-1.000E-9\t0.000E+0\n\n",
    ] {
        assert!(header.contains(section), "{section:?} not in {header}");
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .from_reader(body.as_bytes());

    let rows = reader
        .records()
        .map(|r| {
            r.unwrap()
                .iter()
                .map(|v| v.parse::<f32>().unwrap())
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    // Rows are written bottom-up.
    let grid = &record.channels[0].forward;
    assert_eq!(rows.len(), grid.rows());
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(grid.row(grid.rows() - 1 - i).unwrap(), row.as_slice());
    }
    assert_eq!(rows[0], [1020.0, 1021.0, 1022.0, 1023.0]);
}

#[test]
fn channel_row_follows_channel_index() {
    let record = cantilever::decode(PATH).unwrap();
    let current = record.channel("Current").unwrap();

    let mut out = Vec::new();
    asc::write_channel(&mut out, &record.header, current, Direction::Backward).unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("  0\tCurrent\tA\tboth\t1.000E-9\t0.000E+0\n"));
    assert!(text.ends_with(
        "2.100000000000000000e+03 2.101000000000000000e+03 \
         2.102000000000000000e+03 2.103000000000000000e+03\n"
    ));
}

#[test]
fn missing_output_field() {
    let section = b":REC_DATE:\n 16.10.2026\n";
    let data = fs::read(PATH).unwrap();
    let i = data
        .windows(section.len())
        .position(|w| w == section)
        .unwrap();
    let data = [&data[..i], &data[i + section.len()..]].concat();

    let record = decode_slice(&data).unwrap();
    assert!(record.header.text("rec_date").is_none());

    let err = asc::write_channel(
        &mut Vec::<u8>::new(),
        &record.header,
        &record.channels[0],
        Direction::Forward,
    )
    .unwrap_err();
    assert!(matches!(err, asc::Error::MissingField { field } if field == "rec_date"));
}
