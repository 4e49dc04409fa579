use contlens::lens::{DecodeOptions, Scope, default_registry, dev_registry, register_printer};

/// Scope holding the default (or development) registry configured with `options`.
pub(crate) fn build_scope(dev: bool, options: DecodeOptions) -> Scope {
	let registry = if dev { dev_registry() } else { default_registry() };
	let mut scope = Scope::new();
	register_printer(&mut scope, registry.with_options(options));
	scope
}
