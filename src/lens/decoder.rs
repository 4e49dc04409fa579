use crate::lens::{Result, ValueRef};

/// Layout hint for the display front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayHint {
	/// Children are positional elements.
	Array,
	/// Children alternate key, value.
	Map,
	/// The summary is the whole value, to be shown as a string.
	String,
	/// No particular layout.
	None,
}

impl DisplayHint {
	/// Render the hint as a stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Array => "array",
			Self::Map => "map",
			Self::String => "string",
			Self::None => "none",
		}
	}
}

/// One decoded element.
#[derive(Debug, Clone, PartialEq)]
pub struct Child<'a> {
	/// Index or key label, e.g. `[3]`.
	pub label: String,
	/// Element value, itself decodable.
	pub value: ValueRef<'a>,
}

/// Lazy, single-pass child sequence. It ends after the first error.
pub type Children<'a> = Box<dyn Iterator<Item = Result<Child<'a>>> + 'a>;

/// Decoding logic for one container family, bound to one value.
pub trait Decoder<'a> {
	/// Family name this decoder was registered under.
	fn family(&self) -> &'static str;

	/// One-line label, e.g. `Array<int>[3]`, or the text of a string.
	fn summary(&self) -> Result<String>;

	/// How the front-end should lay out the children.
	fn display_hint(&self) -> DisplayHint;

	/// Consume the decoder and produce its children in logical order.
	fn children(self: Box<Self>) -> Children<'a>;
}

/// Upper bound on linked-chain walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainCap {
	/// Stop after the container's stored element count.
	#[default]
	StoredCount,
	/// Stop after a fixed number of nodes.
	Fixed(usize),
	/// Follow links until null.
	Unbounded,
}

impl ChainCap {
	/// Concrete limit for a container that claims `stored` elements.
	pub fn limit(self, stored: u64) -> Option<u64> {
		match self {
			Self::StoredCount => Some(stored),
			Self::Fixed(max) => Some(max as u64),
			Self::Unbounded => None,
		}
	}
}

/// Runtime limits applied by decoders.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
	/// Bound on list, tree, and hash-table walks.
	pub chain_cap: ChainCap,
	/// Maximum bytes materialised for a string summary.
	pub max_string_len: usize,
}

impl Default for DecodeOptions {
	fn default() -> Self {
		Self {
			chain_cap: ChainCap::StoredCount,
			max_string_len: 4096,
		}
	}
}
