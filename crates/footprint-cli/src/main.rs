//! Footprint CLI - encode JSON documents into footprints and back.

use clap::{ArgGroup, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod input;
mod output;

use commands::{decode, digest, encode, version};

#[derive(Parser)]
#[command(name = "footprint")]
#[command(about = "Deterministic binary footprints of JSON-described values")]
struct Cli {
    /// Log decoding and encoding steps to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a JSON document into a footprint
    #[command(group(ArgGroup::new("generation").args(["legacy", "version"])))]
    Encode {
        /// Input JSON file (or stdin if not provided)
        input: Option<String>,
        /// Write the legacy generation (version tag 0)
        #[arg(long)]
        legacy: bool,
        /// Explicit version tag to write
        #[arg(long)]
        version: Option<u8>,
        /// Print base64url instead of hex
        #[arg(long)]
        base64: bool,
    },
    /// Decode a footprint into JSON
    Decode {
        /// Input file holding hex or base64url (or stdin if not provided)
        input: Option<String>,
        /// Input is base64url instead of hex
        #[arg(long)]
        base64: bool,
        /// Accept extensions of class NAME, keeping their raw state
        #[arg(long = "opaque", value_name = "NAME")]
        opaque: Vec<String>,
        /// Register a legacy record layout, e.g. `Point=x,y`
        #[arg(long = "record", value_name = "NAME=FIELDS")]
        records: Vec<String>,
        /// Reject input the encoder would not have produced
        #[arg(long)]
        strict: bool,
    },
    /// Print the content digest of a JSON document's footprint
    Digest {
        /// Input JSON file (or stdin if not provided)
        input: Option<String>,
        /// Digest the legacy generation
        #[arg(long)]
        legacy: bool,
    },
    /// Print the current version tag
    Version,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Encode {
            input,
            legacy,
            version,
            base64,
        } => encode::run(input, legacy, version, base64),
        Commands::Decode {
            input,
            base64,
            opaque,
            records,
            strict,
        } => decode::run(input, base64, opaque, records, strict),
        Commands::Digest { input, legacy } => digest::run(input, legacy),
        Commands::Version => version::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
