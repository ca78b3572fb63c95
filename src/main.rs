use std::{env, path::Path, process::exit};

use cantilever::asc;

fn main() {
    env_logger::init();

    let mut args = env::args().skip(1);

    let Some(input) = args.next() else {
        eprintln!("Usage: sxm2asc <FILE.sxm> [OUT_DIR]");
        exit(2);
    };
    let out_dir = args.next();

    let input = Path::new(&input);
    let out_dir = out_dir.as_deref().map(Path::new);

    let record = match cantilever::decode(input) {
        Ok(record) => record,
        Err(e) => {
            eprintln!("ERROR: Failed to decode {}", input.display());
            eprintln!("  {e}");
            exit(1);
        }
    };

    let (columns, rows) = record.header.pixels();
    println!(
        "{}: {} channels, {columns}x{rows} pixels",
        input.display(),
        record.channels.len()
    );

    match asc::write_record(input, out_dir, &record) {
        Ok(written) => {
            for path in written {
                println!("  {}", path.display());
            }
        }
        Err(e) => {
            eprintln!("ERROR: Failed to write output files");
            eprintln!("  {e}");
            exit(1);
        }
    }
}
