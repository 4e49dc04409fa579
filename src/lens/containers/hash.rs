use crate::lens::containers::{read_count, require_fields, sized_summary};
use crate::lens::{ChainCap, ChainWalk, Children, DecodeOptions, Decoder, DisplayHint, Result, ValueRef, split_pairs};

/// Open-chained hash table read through its global `next` chain.
///
/// Buckets point at the node before their first entry, so the only complete
/// traversal is the chain that starts at `placeholder.next`.
#[derive(Debug)]
pub struct HashDecoder<'a> {
	family: &'static str,
	value: ValueRef<'a>,
	first: ValueRef<'a>,
	num_items: u64,
	cap: ChainCap,
}

impl<'a> HashDecoder<'a> {
	fn new(family: &'static str, value: ValueRef<'a>, opts: &DecodeOptions) -> Result<Self> {
		require_fields(&value, &["buckets", "numBuckets"])?;
		Ok(Self {
			family,
			value,
			first: value.field("placeholder")?.field("next")?,
			num_items: read_count(&value, "numItems")?,
			cap: opts.chain_cap,
		})
	}

	fn is_map(&self) -> bool {
		self.family == "HashMap"
	}
}

/// Decode the internal `HashTable` layout.
pub fn hash_table<'a>(value: ValueRef<'a>, opts: &DecodeOptions) -> Result<Box<dyn Decoder<'a> + 'a>> {
	Ok(Box::new(HashDecoder::new("HashTable", value, opts)?))
}

/// Decode a `HashSet<T>`.
pub fn hash_set<'a>(value: ValueRef<'a>, opts: &DecodeOptions) -> Result<Box<dyn Decoder<'a> + 'a>> {
	Ok(Box::new(HashDecoder::new("HashSet", value, opts)?))
}

/// Decode a `HashMap<K, V>`.
pub fn hash_map<'a>(value: ValueRef<'a>, opts: &DecodeOptions) -> Result<Box<dyn Decoder<'a> + 'a>> {
	Ok(Box::new(HashDecoder::new("HashMap", value, opts)?))
}

impl<'a> Decoder<'a> for HashDecoder<'a> {
	fn family(&self) -> &'static str {
		self.family
	}

	fn summary(&self) -> Result<String> {
		let arity = if self.is_map() { 2 } else { 1 };
		sized_summary(&self.value, self.family, arity, self.num_items)
	}

	fn display_hint(&self) -> DisplayHint {
		if self.is_map() { DisplayHint::Map } else { DisplayHint::Array }
	}

	fn children(self: Box<Self>) -> Children<'a> {
		let nodes = ChainWalk::linked(self.first, "next", self.cap.limit(self.num_items)).node_values();
		if self.is_map() { split_pairs(nodes) } else { nodes }
	}
}
