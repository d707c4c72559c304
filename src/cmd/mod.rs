pub mod calc;
pub mod display;
pub mod itp;
pub mod regions;
pub mod schema;

use crate::core::{read_request_json, CalculatorRequest};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Read a JSON calculator request from a file (or stdin with "-")
pub fn read_request(path: &Path) -> anyhow::Result<CalculatorRequest> {
    if path.as_os_str() == "-" {
        read_from_stdin()
    } else {
        read_from_file(path)
    }
}

fn read_from_file(path: &Path) -> anyhow::Result<CalculatorRequest> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    read_request_json(reader)
}

fn read_from_stdin() -> anyhow::Result<CalculatorRequest> {
    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());

    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;

    if buffer.is_empty() {
        anyhow::bail!("No input received. Provide a request file or pipe JSON to stdin.");
    }

    read_request_json(io::Cursor::new(buffer))
}
