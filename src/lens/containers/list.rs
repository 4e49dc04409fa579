use crate::lens::containers::{read_count, require_fields, sized_summary};
use crate::lens::{ChainCap, ChainWalk, Children, DecodeOptions, Decoder, DisplayHint, Result, ValueRef};

/// Doubly linked list walked forward from `head`.
#[derive(Debug)]
pub struct ListDecoder<'a> {
	value: ValueRef<'a>,
	head: ValueRef<'a>,
	num_nodes: u64,
	cap: ChainCap,
}

/// Decode a `List { head, tail, numNodes }`.
pub fn list<'a>(value: ValueRef<'a>, opts: &DecodeOptions) -> Result<Box<dyn Decoder<'a> + 'a>> {
	require_fields(&value, &["tail"])?;
	let head = value.field("head")?;
	let num_nodes = read_count(&value, "numNodes")?;
	Ok(Box::new(ListDecoder {
		value,
		head,
		num_nodes,
		cap: opts.chain_cap,
	}))
}

impl<'a> Decoder<'a> for ListDecoder<'a> {
	fn family(&self) -> &'static str {
		"List"
	}

	fn summary(&self) -> Result<String> {
		sized_summary(&self.value, "List", 1, self.num_nodes)
	}

	fn display_hint(&self) -> DisplayHint {
		DisplayHint::Array
	}

	fn children(self: Box<Self>) -> Children<'a> {
		ChainWalk::linked(self.head, "next", self.cap.limit(self.num_nodes)).node_values()
	}
}
