use std::io::Read;
use std::path::Path;

use serde::Serialize;
use teleinfo_frame::{check, compute_checksum, parse, Frame};
use teleinfo_transport::split_capture;

use crate::cmd::DecodeArgs;
use crate::exit::{io_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{new_table, OutputFormat};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum Status {
    Ok,
    Checksum,
    Malformed,
}

impl Status {
    fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Checksum => "checksum",
            Status::Malformed => "malformed",
        }
    }
}

#[derive(Serialize, Debug)]
struct DecodedFrame {
    line: usize,
    status: Status,
    tag: Option<String>,
    value: Option<String>,
    checksum: Option<char>,
    expected: Option<char>,
    raw: String,
}

#[derive(Serialize)]
struct DecodeSummary<'a> {
    frames: usize,
    invalid: usize,
    decoded: &'a [DecodedFrame],
}

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let capture = read_capture(args.file.as_deref())?;
    let decoded: Vec<DecodedFrame> = split_capture(&capture)
        .iter()
        .enumerate()
        .map(|(index, line)| decode_line(index + 1, line))
        .collect();
    let invalid = decoded.iter().filter(|d| d.status != Status::Ok).count();

    print_decoded(&decoded, invalid, format);

    if args.strict && invalid > 0 {
        return Err(CliError::new(
            DATA_INVALID,
            format!("{invalid} of {} frames failed validation", decoded.len()),
        ));
    }
    Ok(SUCCESS)
}

fn read_capture(path: Option<&Path>) -> CliResult<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err)),
        None => {
            let mut capture = Vec::new();
            std::io::stdin()
                .read_to_end(&mut capture)
                .map_err(|err| io_error("failed reading stdin", err))?;
            Ok(capture)
        }
    }
}

fn decode_line(line: usize, bytes: &[u8]) -> DecodedFrame {
    let frame = Frame::from_line(bytes);
    let checksum = frame.checksum().map(char::from);
    let expected =
        (!frame.is_empty()).then(|| char::from(compute_checksum(frame.checksum_scope())));

    let (status, pair) = if frame.is_empty() {
        (Status::Malformed, None)
    } else if !check(&frame) {
        (Status::Checksum, None)
    } else {
        match parse(&frame) {
            Ok(pair) => (Status::Ok, Some(pair)),
            Err(_) => (Status::Malformed, None),
        }
    };

    let (tag, value) = match pair {
        Some(pair) => (Some(pair.tag), Some(pair.value)),
        None => (None, None),
    };

    DecodedFrame {
        line,
        status,
        tag,
        value,
        checksum,
        expected,
        raw: frame.to_string(),
    }
}

fn print_decoded(decoded: &[DecodedFrame], invalid: usize, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let summary = DecodeSummary {
                frames: decoded.len(),
                invalid,
                decoded,
            };
            println!(
                "{}",
                serde_json::to_string(&summary).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["LINE", "STATUS", "TAG", "VALUE", "CHECKSUM"]);
            for d in decoded {
                table.add_row(vec![
                    d.line.to_string(),
                    d.status.as_str().to_string(),
                    d.tag.clone().unwrap_or_default(),
                    d.value.clone().unwrap_or_else(|| d.raw.clone()),
                    checksum_cell(d),
                ]);
            }
            println!("{table}");
            println!("{} frames, {invalid} invalid", decoded.len());
        }
        OutputFormat::Pretty => {
            for d in decoded {
                match (&d.tag, &d.value) {
                    (Some(tag), Some(value)) => println!("{:>4}  {tag:<10} {value}", d.line),
                    _ => println!(
                        "{:>4}  <{}> {} ({})",
                        d.line,
                        d.status.as_str(),
                        d.raw,
                        checksum_cell(d)
                    ),
                }
            }
            println!("{} frames, {invalid} invalid", decoded.len());
        }
    }
}

fn checksum_cell(d: &DecodedFrame) -> String {
    match (d.checksum, d.expected) {
        (Some(found), Some(expected)) if found == expected => format!("{found:?}"),
        (Some(found), Some(expected)) => format!("{found:?} (expected {expected:?})"),
        _ => "-".to_string(),
    }
}
