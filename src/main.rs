use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use ascii_huffman::{decode_file, encode_file, CodecConfig, HuffmanError};
use clap::{ArgGroup, Parser};
use tracing_subscriber::EnvFilter;

/// Compress or restore a 7-bit ASCII file with a static Huffman code.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("mode").required(true).args(["encode", "decode"])))]
struct Cli {
    /// Encode FILE, writing its weight table to -w
    #[arg(short = 'e', long = "encode", value_name = "FILE")]
    encode: Option<PathBuf>,

    /// Decode FILE using the weight table given by -w
    #[arg(short = 'd', long = "decode", value_name = "FILE")]
    decode: Option<PathBuf>,

    /// Weight table file
    #[arg(short = 'w', long = "weights", value_name = "FILE")]
    weights: PathBuf,

    /// Output file
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: PathBuf,

    /// Size of the decoder's lookahead buffers
    #[arg(long, value_name = "BYTES", default_value_t = CodecConfig::default().decode_chunk)]
    chunk_size: usize,

    /// Print the code table after the run
    #[arg(long)]
    show_codes: bool,

    /// Print the code tree after the run
    #[arg(long)]
    show_tree: bool,

    /// More logging on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = CodecConfig::default().with_decode_chunk(cli.chunk_size);

    let codec = match (&cli.encode, &cli.decode) {
        (Some(input), None) => encode_file(input, &cli.weights, &cli.output, config)
            .with_context(|| format!("encoding {}", input.display()))?,
        (None, Some(input)) => decode_file(input, &cli.weights, &cli.output, config)
            .with_context(|| format!("decoding {}", input.display()))?,
        _ => anyhow::bail!("options -e and -d are exclusive"),
    };

    if cli.show_tree {
        codec.tree().print_structure();
    }
    if cli.show_codes {
        print!("{}", codec.code_table());
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            let code = err
                .downcast_ref::<HuffmanError>()
                .map_or(1, HuffmanError::exit_code);
            ExitCode::from(code as u8)
        }
    }
}
