use std::path::PathBuf;

use contlens::lens::{ChainCap, CoreImage, DecodeOptions, Result};

use crate::cmd::render::{PrintOptions, print_node, render};
use crate::cmd::util::build_scope;

#[derive(clap::Args)]
pub struct Args {
	pub image: PathBuf,
	#[arg(required = true)]
	pub symbols: Vec<String>,
	#[arg(long)]
	pub dev: bool,
	#[arg(long)]
	pub json: bool,
	#[arg(long = "max-children")]
	pub max_children: Option<usize>,
	#[arg(long = "max-depth")]
	pub max_depth: Option<u32>,
	#[arg(long = "max-string")]
	pub max_string: Option<usize>,
	#[arg(long = "no-cap")]
	pub no_cap: bool,
}

/// Decode and print the named symbols of a core image.
pub fn run(args: Args) -> Result<()> {
	let Args {
		image: path,
		symbols,
		dev,
		json,
		max_children,
		max_depth,
		max_string,
		no_cap,
	} = args;

	let image = CoreImage::open(&path)?;

	let mut print = PrintOptions::default();
	if let Some(max_children) = max_children {
		print.max_children = max_children;
	}
	if let Some(max_depth) = max_depth {
		print.max_depth = max_depth;
	}
	if let Some(max_string) = max_string {
		print.max_string_len = max_string;
	}

	let decode = DecodeOptions {
		chain_cap: if no_cap { ChainCap::Unbounded } else { ChainCap::StoredCount },
		max_string_len: print.max_string_len,
	};
	let scope = build_scope(dev, decode);

	let mut nodes = Vec::with_capacity(symbols.len());
	for name in symbols {
		let value = image.value(&name)?;
		nodes.push(render(&scope, value, name, 0, print));
	}

	if json {
		let out = serde_json::json!({
			"image": path.display().to_string(),
			"values": nodes,
		});
		println!("{}", serde_json::to_string_pretty(&out)?);
		return Ok(());
	}

	for node in &nodes {
		print_node(node, 0);
	}
	Ok(())
}
