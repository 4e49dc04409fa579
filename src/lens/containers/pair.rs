use crate::lens::containers::generic_name;
use crate::lens::{Child, Children, DecodeOptions, Decoder, DisplayHint, Result, ValueRef};

/// `Pair { first, second }`.
#[derive(Debug)]
pub struct PairDecoder<'a> {
	value: ValueRef<'a>,
	first: ValueRef<'a>,
	second: ValueRef<'a>,
}

/// Decode a `Pair<T, U>`.
pub fn pair<'a>(value: ValueRef<'a>, _opts: &DecodeOptions) -> Result<Box<dyn Decoder<'a> + 'a>> {
	Ok(Box::new(PairDecoder {
		value,
		first: value.field("first")?,
		second: value.field("second")?,
	}))
}

impl<'a> Decoder<'a> for PairDecoder<'a> {
	fn family(&self) -> &'static str {
		"Pair"
	}

	fn summary(&self) -> Result<String> {
		generic_name(&self.value, "Pair", 2)
	}

	fn display_hint(&self) -> DisplayHint {
		DisplayHint::None
	}

	fn children(self: Box<Self>) -> Children<'a> {
		let children: [Result<Child<'a>>; 2] = [("first", self.first), ("second", self.second)].map(|(label, value)| {
			Ok(Child {
				label: label.to_owned(),
				value,
			})
		});
		Box::new(children.into_iter())
	}
}
