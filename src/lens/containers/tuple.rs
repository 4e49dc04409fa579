use crate::lens::containers::sized_summary;
use crate::lens::{Child, Children, DecodeOptions, Decoder, DisplayHint, LensError, Result, ValueRef, index_label};

/// Heterogeneous tuple encoded as a chain of base subobjects.
///
/// `Tuple<A, B, C>` derives from `TupleBase<0, A, B, C>`, which holds `item: A`
/// and derives from `TupleBase<1, B, C>`, and so on.
#[derive(Debug)]
pub struct TupleDecoder<'a> {
	value: ValueRef<'a>,
	count: u64,
}

/// Decode a `Tuple<...>`.
pub fn tuple<'a>(value: ValueRef<'a>, _opts: &DecodeOptions) -> Result<Box<dyn Decoder<'a> + 'a>> {
	// numItems is a static constant in most builds; fall back to the arity.
	let count = match value.field("numItems") {
		Ok(field) => field.read_unsigned()?,
		Err(LensError::MissingField { .. }) => value.template_args()?.len() as u64,
		Err(err) => return Err(err),
	};
	Ok(Box::new(TupleDecoder { value, count }))
}

impl<'a> Decoder<'a> for TupleDecoder<'a> {
	fn family(&self) -> &'static str {
		"Tuple"
	}

	fn summary(&self) -> Result<String> {
		let arity = self.value.template_args()?.len();
		sized_summary(&self.value, "Tuple", arity, self.count)
	}

	fn display_hint(&self) -> DisplayHint {
		DisplayHint::Array
	}

	fn children(self: Box<Self>) -> Children<'a> {
		Box::new(TupleLevels {
			level: Some(self.value),
			idx: 0,
			count: self.count,
		})
	}
}

struct TupleLevels<'a> {
	/// Subobject whose leading base holds the next item.
	level: Option<ValueRef<'a>>,
	idx: u64,
	count: u64,
}

impl<'a> TupleLevels<'a> {
	fn advance(&mut self) -> Result<Option<Child<'a>>> {
		let Some(level) = self.level else {
			return Ok(None);
		};
		if self.idx >= self.count {
			return Ok(None);
		}
		let Some(base) = level.first_base()? else {
			return Ok(None);
		};

		let child = Child {
			label: index_label(self.idx),
			value: base.field("item")?,
		};
		self.idx += 1;
		self.level = Some(base);
		Ok(Some(child))
	}
}

impl<'a> Iterator for TupleLevels<'a> {
	type Item = Result<Child<'a>>;

	fn next(&mut self) -> Option<Self::Item> {
		match self.advance() {
			Ok(Some(child)) => Some(Ok(child)),
			Ok(None) => {
				self.level = None;
				None
			}
			Err(err) => {
				self.level = None;
				Some(Err(err))
			}
		}
	}
}
