//! Thin CLI front-end: reads argv and an input file, drives the library's
//! `assemble()`, and writes the image (and optional listing) to disk.
//! Argument parsing, file I/O and log routing live here, not in the
//! library — `wideasm` itself never touches a filesystem path or a
//! terminal.

#[macro_use]
extern crate clap;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Arg;

use wideasm::Config;

#[derive(Debug)]
enum CliError {
    Asm(wideasm::AsmError),
    Io {
        context: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Asm(err) => write!(f, "assembly failed: {}", err),
            CliError::Io { context, path, source } => {
                write!(f, "{} \"{}\": {}", context, path.display(), source)
            }
        }
    }
}

#[cfg(feature = "cli")]
fn init_tracing() {
    tracing_subscriber::fmt::init();
}

#[cfg(not(feature = "cli"))]
fn init_tracing() {}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("INPUT")
                .help("assembly source file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .value_name("FILE")
                .help("output bit-image file (default: input with .img extension)"),
        )
        .arg(
            Arg::with_name("listing")
                .short("l")
                .long("listing")
                .takes_value(true)
                .value_name("FILE")
                .help("write an annotated listing to FILE"),
        )
        .arg(
            Arg::with_name("code_base")
                .long("code-base")
                .takes_value(true)
                .value_name("ADDR")
                .help("override the code section base address"),
        )
        .arg(
            Arg::with_name("data_base")
                .long("data-base")
                .takes_value(true)
                .value_name("ADDR")
                .help("override the data section base address"),
        )
        .get_matches();

    let input_path = Path::new(matches.value_of("INPUT").unwrap());
    let output_path: PathBuf = matches
        .value_of("output")
        .map(PathBuf::from)
        .unwrap_or_else(|| input_path.with_extension("img"));

    let source = fs::read_to_string(input_path).map_err(|source| CliError::Io {
        context: "reading input file",
        path: input_path.to_owned(),
        source,
    })?;

    let mut builder = Config::builder()
        .opcode("jump", "00010")
        .opcode("add", "00011")
        .opcode("setreg", "00001");
    if let Some(base) = matches.value_of("code_base") {
        builder = builder.code_base(parse_addr(base));
    }
    if let Some(base) = matches.value_of("data_base") {
        builder = builder.data_base(parse_addr(base));
    }
    let config = builder.build().map_err(CliError::Asm)?;

    let (assembled, diagnostics) = wideasm::assemble(&source, &config).map_err(CliError::Asm)?;

    for diagnostic in &diagnostics {
        eprintln!("warning: {}", diagnostic.message);
    }

    let mut out = fs::File::create(&output_path).map_err(|source| CliError::Io {
        context: "writing output file",
        path: output_path.clone(),
        source,
    })?;
    for line in &assembled.image {
        writeln!(out, "{}", line).map_err(|source| CliError::Io {
            context: "writing output file",
            path: output_path.clone(),
            source,
        })?;
    }

    if let Some(listing_path) = matches.value_of("listing") {
        let listing_path = PathBuf::from(listing_path);
        fs::write(&listing_path, assembled.listing(&config)).map_err(|source| CliError::Io {
            context: "writing listing file",
            path: listing_path,
            source,
        })?;
    }

    Ok(())
}

fn parse_addr(raw: &str) -> u64 {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).unwrap_or(0)
    } else {
        raw.parse().unwrap_or(0)
    }
}
