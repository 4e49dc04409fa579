use crate::lens::containers::{check_capacity, read_count, sized_summary};
use crate::lens::walk::StopOnError;
use crate::lens::{Child, Children, DecodeOptions, Decoder, DisplayHint, LensError, Result, ValueRef, index_label};

/// Contiguous buffer of `count` elements.
#[derive(Debug)]
pub struct ArrayDecoder<'a> {
	family: &'static str,
	value: ValueRef<'a>,
	first: ValueRef<'a>,
	count: u64,
}

impl<'a> ArrayDecoder<'a> {
	fn from_fields(family: &'static str, value: ValueRef<'a>, buffer: &str, count: &str) -> Result<Self> {
		let buffer = value.field(buffer)?;
		let capacity = read_count(&value, "size")?;
		let count = read_count(&value, count)?;
		check_capacity(&value, count, capacity)?;

		let first = buffer.deref()?;
		if first.addr() == 0 && count > 0 {
			return Err(LensError::InvalidCount {
				type_name: value.type_name(),
				count,
			});
		}

		Ok(Self { family, value, first, count })
	}

	/// Number of live elements.
	pub fn count(&self) -> u64 {
		self.count
	}
}

/// Decode an owning `Array { data, size, count }`.
pub fn array<'a>(value: ValueRef<'a>, _opts: &DecodeOptions) -> Result<Box<dyn Decoder<'a> + 'a>> {
	Ok(Box::new(ArrayDecoder::from_fields("Array", value, "data", "count")?))
}

/// Decode the internal `ArrayBase { buffer, size, numItems }` layout.
pub fn array_base<'a>(value: ValueRef<'a>, _opts: &DecodeOptions) -> Result<Box<dyn Decoder<'a> + 'a>> {
	Ok(Box::new(ArrayDecoder::from_fields("ArrayBase", value, "buffer", "numItems")?))
}

impl<'a> Decoder<'a> for ArrayDecoder<'a> {
	fn family(&self) -> &'static str {
		self.family
	}

	fn summary(&self) -> Result<String> {
		sized_summary(&self.value, self.family, 1, self.count)
	}

	fn display_hint(&self) -> DisplayHint {
		DisplayHint::Array
	}

	fn children(self: Box<Self>) -> Children<'a> {
		let first = self.first;
		let children = (0..self.count).map(move |idx| -> Result<Child<'a>> {
			Ok(Child {
				label: index_label(idx),
				value: first.advance(idx)?,
			})
		});
		Box::new(StopOnError::new(children))
	}
}
