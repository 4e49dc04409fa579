use crate::lens::containers::generic_name;
use crate::lens::{Child, Children, DecodeOptions, Decoder, DisplayHint, Result, ValueRef};

/// `Optional { value, initd }`; `value` is only meaningful when `initd` is set.
#[derive(Debug)]
pub struct OptionalDecoder<'a> {
	value: ValueRef<'a>,
	inner: Option<ValueRef<'a>>,
}

impl OptionalDecoder<'_> {
	/// Whether the optional holds a value.
	pub fn is_set(&self) -> bool {
		self.inner.is_some()
	}
}

/// Decode an `Optional<T>`.
pub fn optional<'a>(value: ValueRef<'a>, _opts: &DecodeOptions) -> Result<Box<dyn Decoder<'a> + 'a>> {
	let inner = value.field("value")?;
	let initd = value.field("initd")?.read_bool()?;
	Ok(Box::new(OptionalDecoder {
		value,
		inner: initd.then_some(inner),
	}))
}

impl<'a> Decoder<'a> for OptionalDecoder<'a> {
	fn family(&self) -> &'static str {
		"Optional"
	}

	fn summary(&self) -> Result<String> {
		let name = generic_name(&self.value, "Optional", 1)?;
		Ok(if self.is_set() { name } else { format!("{name} (empty)") })
	}

	fn display_hint(&self) -> DisplayHint {
		DisplayHint::None
	}

	fn children(self: Box<Self>) -> Children<'a> {
		let child: Option<Result<Child<'a>>> = self.inner.map(|value| {
			Ok(Child {
				label: "value".to_owned(),
				value,
			})
		});
		Box::new(child.into_iter())
	}
}
