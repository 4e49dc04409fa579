use crate::lens::{Decoder, Registry, Result, ValueRef, default_registry};

/// Ordered list of registries consulted for every printed value, like a
/// debugger's per-objfile printer list.
#[derive(Debug, Default)]
pub struct Scope {
	printers: Vec<Registry>,
}

impl Scope {
	/// Create a scope with no printers.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registries in registration order.
	pub fn printers(&self) -> &[Registry] {
		&self.printers
	}

	/// Ask each registry in order; the first decoder found wins.
	pub fn resolve<'a>(&self, value: ValueRef<'a>) -> Result<Option<Box<dyn Decoder<'a> + 'a>>> {
		for registry in &self.printers {
			if let Some(decoder) = registry.resolve(value)? {
				return Ok(Some(decoder));
			}
		}
		Ok(None)
	}
}

/// Append `registry` to the scope's printer list.
pub fn register_printer(scope: &mut Scope, registry: Registry) {
	tracing::debug!(namespace = registry.namespace(), printers = registry.len(), "registering printer");
	scope.printers.push(registry);
}

/// Append the default registry.
pub fn register_default_printer(scope: &mut Scope) {
	register_printer(scope, default_registry());
}

#[cfg(test)]
mod tests {
	use super::{Scope, register_default_printer, register_printer};
	use crate::lens::{Family, ImageBuilder, Registry};

	#[test]
	fn first_registry_with_a_match_wins() {
		let mut builder = ImageBuilder::new(8).expect("pointer size");
		let int = builder.int();
		let ty = builder.list_type(int).expect("list");
		let placed = builder.place_list(ty, 2).expect("place");
		builder.symbol("list", ty, placed.addr);
		let image = builder.finish().expect("image");
		let value = image.value("list").expect("symbol");

		let mut scope = Scope::new();
		assert!(scope.resolve(value).expect("resolve").is_none());

		let mut shadow = Registry::new("Korin");
		shadow.register_factory("List", Family::Array.factory()).expect("register");
		register_printer(&mut scope, Registry::new("Unrelated"));
		register_default_printer(&mut scope);
		register_printer(&mut scope, shadow);
		assert_eq!(scope.printers().len(), 3);

		let decoder = scope.resolve(value).expect("resolve").expect("decoder");
		assert_eq!(decoder.family(), "List");
		assert_eq!(decoder.summary().expect("summary"), "List<int>[2]");
	}
}
