use crate::lens::containers::{check_capacity, read_count, sized_summary};
use crate::lens::walk::StopOnError;
use crate::lens::{Child, Children, DecodeOptions, Decoder, DisplayHint, LensError, Result, ValueRef, index_label};

/// Ring buffer of `size` slots, live between `extractIdx` and `insertIdx`.
#[derive(Debug)]
pub struct CircularQueueDecoder<'a> {
	value: ValueRef<'a>,
	buffer: ValueRef<'a>,
	size: u64,
	extract: u64,
	count: u64,
}

/// Decode a `CircularQueue { buffer, size, extractIdx, insertIdx }`.
pub fn circular_queue<'a>(value: ValueRef<'a>, _opts: &DecodeOptions) -> Result<Box<dyn Decoder<'a> + 'a>> {
	let buffer = value.field("buffer")?.deref()?;
	let size = read_count(&value, "size")?;
	let extract = read_count(&value, "extractIdx")?;
	let insert = read_count(&value, "insertIdx")?;

	let count = if extract > insert { size.checked_sub(extract - insert) } else { Some(insert - extract) };
	let count = count.ok_or(LensError::InvalidCount {
		type_name: value.type_name(),
		count: extract,
	})?;
	check_capacity(&value, count, size)?;
	if count > 0 && (buffer.addr() == 0 || extract >= size) {
		return Err(LensError::InvalidCount {
			type_name: value.type_name(),
			count,
		});
	}

	Ok(Box::new(CircularQueueDecoder {
		value,
		buffer,
		size,
		extract,
		count,
	}))
}

impl<'a> Decoder<'a> for CircularQueueDecoder<'a> {
	fn family(&self) -> &'static str {
		"CircularQueue"
	}

	fn summary(&self) -> Result<String> {
		sized_summary(&self.value, "CircularQueue", 1, self.count)
	}

	fn display_hint(&self) -> DisplayHint {
		DisplayHint::Array
	}

	fn children(self: Box<Self>) -> Children<'a> {
		let Self { buffer, size, extract, count, .. } = *self;
		let children = (0..count).map(move |idx| -> Result<Child<'a>> {
			Ok(Child {
				label: index_label(idx),
				value: buffer.advance((extract + idx) % size)?,
			})
		});
		Box::new(StopOnError::new(children))
	}
}
