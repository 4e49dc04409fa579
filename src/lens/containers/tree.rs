use crate::lens::containers::{read_count, sized_summary};
use crate::lens::{ChainCap, ChainWalk, Children, DecodeOptions, Decoder, DisplayHint, LensError, Result, ValueRef, split_pairs};

/// Binary search tree read through its in-order `next` thread.
///
/// The same walk serves `Tree<T>`, `Set<T>` (which wraps a tree) and
/// `Map<K, V>` (a set of pairs, split into key and value children).
#[derive(Debug)]
pub struct TreeDecoder<'a> {
	family: &'static str,
	value: ValueRef<'a>,
	root: ValueRef<'a>,
	num_nodes: u64,
	cap: ChainCap,
}

impl<'a> TreeDecoder<'a> {
	fn new(family: &'static str, value: ValueRef<'a>, opts: &DecodeOptions) -> Result<Self> {
		let tree = match value.field("tree") {
			Ok(tree) => tree,
			Err(LensError::MissingField { .. }) => value,
			Err(err) => return Err(err),
		};
		Ok(Self {
			family,
			value,
			root: tree.field("root")?,
			num_nodes: read_count(&tree, "numNodes")?,
			cap: opts.chain_cap,
		})
	}

	fn is_map(&self) -> bool {
		self.family == "Map"
	}
}

/// Decode a `Tree { root, numNodes }`.
pub fn tree<'a>(value: ValueRef<'a>, opts: &DecodeOptions) -> Result<Box<dyn Decoder<'a> + 'a>> {
	Ok(Box::new(TreeDecoder::new("Tree", value, opts)?))
}

/// Decode a `Set { tree }`.
pub fn set<'a>(value: ValueRef<'a>, opts: &DecodeOptions) -> Result<Box<dyn Decoder<'a> + 'a>> {
	Ok(Box::new(TreeDecoder::new("Set", value, opts)?))
}

/// Decode a `Map { tree }` whose nodes hold `Pair<K, V>`.
pub fn map<'a>(value: ValueRef<'a>, opts: &DecodeOptions) -> Result<Box<dyn Decoder<'a> + 'a>> {
	Ok(Box::new(TreeDecoder::new("Map", value, opts)?))
}

impl<'a> Decoder<'a> for TreeDecoder<'a> {
	fn family(&self) -> &'static str {
		self.family
	}

	fn summary(&self) -> Result<String> {
		let arity = if self.is_map() { 2 } else { 1 };
		sized_summary(&self.value, self.family, arity, self.num_nodes)
	}

	fn display_hint(&self) -> DisplayHint {
		if self.is_map() { DisplayHint::Map } else { DisplayHint::Array }
	}

	fn children(self: Box<Self>) -> Children<'a> {
		let nodes = ChainWalk::ordered(self.root, self.cap.limit(self.num_nodes)).node_values();
		if self.is_map() { split_pairs(nodes) } else { nodes }
	}
}
