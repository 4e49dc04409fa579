use std::path::PathBuf;

use contlens::lens::{Compression, Result, demo_image};

/// Write a sample image holding one value of every container family.
pub fn run(out: PathBuf, zstd: bool) -> Result<()> {
	let compression = if zstd { Compression::Zstd } else { Compression::None };
	let image = demo_image(8)?;
	image.save(&out, compression)?;
	println!("wrote {} ({} symbols, compression={})", out.display(), image.symbols().len(), compression.as_str());
	Ok(())
}
