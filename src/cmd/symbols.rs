use std::path::PathBuf;

use contlens::lens::{CoreImage, DecodeOptions, Result};

use crate::cmd::util::build_scope;

/// List symbols with their types and the family that would decode them.
pub fn run(path: PathBuf, dev: bool) -> Result<()> {
	let image = CoreImage::open(&path)?;
	let scope = build_scope(dev, DecodeOptions::default());

	println!("symbols: {}", image.symbols().len());
	for symbol in image.symbols() {
		let value = image.value(&symbol.name)?;
		let family = match scope.resolve(value) {
			Ok(Some(decoder)) => decoder.family().to_owned(),
			Ok(None) => "-".to_owned(),
			Err(err) => format!("error: {err}"),
		};
		println!("{:<18} 0x{:016x} {:<48} {family}", symbol.name, symbol.addr, value.type_name());
	}
	Ok(())
}
