#![allow(missing_docs)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "contlens", about = "Decode Korin container layouts from core images")]
struct Cli {
	#[arg(short, long, global = true)]
	verbose: bool,
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	Print(cmd::print::Args),
	Symbols {
		image: PathBuf,
		#[arg(long)]
		dev: bool,
	},
	Registry {
		#[arg(long)]
		dev: bool,
	},
	Demo {
		out: PathBuf,
		#[arg(long)]
		zstd: bool,
	},
}

fn main() {
	let cli = Cli::parse();
	init_logging(cli.verbose);

	if let Err(err) = run(cli.command) {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn init_logging(verbose: bool) {
	let filter = if verbose {
		EnvFilter::new("debug")
	} else {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
	};
	tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

fn run(command: Commands) -> contlens::lens::Result<()> {
	match command {
		Commands::Print(args) => cmd::print::run(args),
		Commands::Symbols { image, dev } => cmd::symbols::run(image, dev),
		Commands::Registry { dev } => cmd::registry::run(dev),
		Commands::Demo { out, zstd } => cmd::demo::run(out, zstd),
	}
}
