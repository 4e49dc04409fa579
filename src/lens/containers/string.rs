use crate::lens::{Children, DecodeOptions, Decoder, DisplayHint, LensError, Result, ValueRef};

/// Buffer layout backing a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringLayout {
	/// `Array<char>` with a `data` pointer.
	Owning,
	/// `ArrayBase<char>` with a `buffer` pointer.
	Legacy,
}

impl StringLayout {
	/// Name of the character pointer member in this layout.
	pub fn pointer_field(self) -> &'static str {
		match self {
			Self::Owning => "data",
			Self::Legacy => "buffer",
		}
	}

	/// Pick the layout from the members present on the backing array.
	pub fn detect(array: &ValueRef<'_>) -> Result<Self> {
		if array.has_field("data") {
			return Ok(Self::Owning);
		}
		if array.has_field("buffer") {
			return Ok(Self::Legacy);
		}
		Err(LensError::UnknownLayout {
			type_name: array.type_name(),
			expected: "`data` or `buffer` member",
		})
	}
}

/// NUL-terminated text stored in a character array.
#[derive(Debug)]
pub struct StringDecoder<'a> {
	chars: ValueRef<'a>,
	layout: StringLayout,
	max_len: usize,
}

impl StringDecoder<'_> {
	/// Detected buffer layout.
	pub fn layout(&self) -> StringLayout {
		self.layout
	}
}

/// Decode a `StringBase { array }`.
pub fn string<'a>(value: ValueRef<'a>, opts: &DecodeOptions) -> Result<Box<dyn Decoder<'a> + 'a>> {
	let array = value.field("array")?;
	let layout = StringLayout::detect(&array)?;
	let chars = array.field(layout.pointer_field())?;
	Ok(Box::new(StringDecoder {
		chars,
		layout,
		max_len: opts.max_string_len,
	}))
}

impl<'a> Decoder<'a> for StringDecoder<'a> {
	fn family(&self) -> &'static str {
		"StringBase"
	}

	fn summary(&self) -> Result<String> {
		if self.chars.is_null_pointer()? {
			return Ok(String::new());
		}
		self.chars.read_c_string(self.max_len)
	}

	fn display_hint(&self) -> DisplayHint {
		DisplayHint::String
	}

	fn children(self: Box<Self>) -> Children<'a> {
		Box::new(std::iter::empty())
	}
}
