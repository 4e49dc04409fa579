use contlens::lens::{Result, default_registry, dev_registry};

/// Print every registered printer key.
pub fn run(dev: bool) -> Result<()> {
	let registry = if dev { dev_registry() } else { default_registry() };
	for key in registry.keys() {
		println!("{key}");
	}
	Ok(())
}
