//! Golden-vector generator for the nxfs path toolkit.
//!
//! Runs `normalize` and `is_normalized` over a built-in corpus of inputs
//! and flag sets, and emits one JSON record per case. The output is meant
//! to be committed alongside the test suite and diffed against vectors
//! captured from the reference SDK whenever the normalizer changes.

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

use nxfs_logging::LogConfig;
use nxfs_path::{is_normalized, normalize, PathFlags};
use nxfs_types::{status_code, FsCode};

/// Path-toolkit golden vector generator.
#[derive(Parser, Debug)]
#[command(name = "nxfs-pathgen", version, about)]
struct Cli {
    /// Write vectors to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output buffer capacity handed to normalize.
    #[arg(long, default_value_t = 0x301)]
    buffer_size: usize,

    /// Enable verbose logging.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

/// One generated vector row.
#[derive(Debug, Serialize)]
struct Record<'a> {
    op: &'static str,
    path: &'a str,
    flags: &'a str,
    code: u32,
    code_name: &'static str,
    /// Buffer contents up to the terminator, errors included.
    output: String,
    /// Declared length; zero on error.
    length: usize,
    /// Only meaningful for `is_normalized` rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    normalized: Option<bool>,
}

/// The corpus exercised by the generator: every input/flag pairing from
/// the acceptance tests, one family per concern.
const CORPUS: &[(&str, &str)] = &[
    // empty path
    ("", ""),
    ("", "E"),
    ("/aa/bb/../cc", "E"),
    // mount names
    ("mount:/aa/bb", ""),
    ("mount:/aa/bb", "M"),
    ("mount:/aa/./bb", "M"),
    ("mount:\\aa\\bb", "M"),
    ("m:/aa/bb", "M"),
    ("mo>unt:/aa/bb", "M"),
    ("mo&unt:/aa/bb", "M"),
    ("mount/aa/./bb", "M"),
    // windows shapes
    ("c:/aa/bb", ""),
    ("c:\\aa\\..\\..\\..\\bb", "W"),
    ("mount:/c:\\aa\\..\\bb", "MW"),
    ("a:aa/../bb", "MW"),
    ("\\\\?\\c:\\.\\aa", "W"),
    ("\\\\.\\c:\\.\\aa", "W"),
    ("\\\\", "W"),
    ("\\\\host\\share", "W"),
    ("\\\\host\\share\\path\\aa\\bb\\..\\cc\\.", "W"),
    ("\\\\host\\", "W"),
    ("\\\\ho$st\\share\\path", "W"),
    ("\\\\host\\.\\path", "W"),
    // relative paths
    ("./aa/bb/../cc", "R"),
    (".", "R"),
    ("../aa/bb", "R"),
    ("mount:./aa/bb", "MR"),
    // backslash as data
    ("/aa\\bb\\..\\cc", "B"),
    ("/aa\\bb\\cc", "B"),
    ("/aa/bb\\../cc/..\\dd\\..\\ee/..", "B"),
    // reserved characters
    ("/aa/b|b/cc", ""),
    ("/aa/b|b/cc", "C"),
    ("mount:/aa/b<b/cc", "MC"),
    // combined flags
    ("mount:./aa/bb\\cc/dd", "WRM"),
    ("mount:./\\\\host\\share/aa/bb", "WRM"),
    ("mount:\\\\host\\share/aa/bb", "MW"),
    ("mount:/aa\\bb", "BM"),
    ("mount:./aa/b:b\\cc/dd", "WRMBC"),
];

fn parse_flags(spec: &str) -> anyhow::Result<PathFlags> {
    let mut flags = PathFlags::new();
    for c in spec.chars() {
        flags = match c {
            'B' => flags.allow_backslash(),
            'E' => flags.allow_empty_path(),
            'M' => flags.allow_mount_name(),
            'R' => flags.allow_relative_path(),
            'W' => flags.allow_windows_path(),
            'C' => flags.allow_all_characters(),
            _ => anyhow::bail!("unknown flag character {c:?}"),
        };
    }
    Ok(flags)
}

fn buffer_to_string(buffer: &[u8]) -> String {
    let len = buffer.iter().position(|&b| b == 0).unwrap_or(buffer.len());
    String::from_utf8_lossy(&buffer[..len]).into_owned()
}

fn generate(buffer_size: usize, mut sink: impl Write) -> anyhow::Result<usize> {
    let mut rows = 0;

    for &(path, spec) in CORPUS {
        let flags = parse_flags(spec)?;

        let mut buffer = vec![0u8; buffer_size];
        let (code, length) = match normalize(&mut buffer, path.as_bytes(), flags) {
            Ok(len) => (FsCode::SUCCESS, len),
            Err(status) => (status.code(), 0),
        };
        let record = Record {
            op: "normalize",
            path,
            flags: spec,
            code,
            code_name: status_code::to_string(code),
            output: buffer_to_string(&buffer),
            length,
            normalized: None,
        };
        serde_json::to_writer(&mut sink, &record)?;
        sink.write_all(b"\n")?;
        rows += 1;

        let (code, normalized, length) = match is_normalized(path.as_bytes(), flags) {
            Ok((normalized, len)) => (FsCode::SUCCESS, Some(normalized), len),
            Err(status) => (status.code(), None, 0),
        };
        let record = Record {
            op: "is_normalized",
            path,
            flags: spec,
            code,
            code_name: status_code::to_string(code),
            output: String::new(),
            length,
            normalized,
        };
        serde_json::to_writer(&mut sink, &record)?;
        sink.write_all(b"\n")?;
        rows += 1;
    }

    Ok(rows)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = LogConfig {
        level: if cli.verbose { "debug".into() } else { "warn".into() },
        ..LogConfig::default()
    };
    let _guard = nxfs_logging::init_logging(&config);

    let rows = match cli.output {
        Some(ref path) => {
            let file = std::fs::File::create(path)?;
            generate(cli.buffer_size, std::io::BufWriter::new(file))?
        }
        None => generate(cli.buffer_size, std::io::stdout().lock())?,
    };

    tracing::info!(rows, "vector generation complete");
    Ok(())
}
