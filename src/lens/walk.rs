use crate::lens::{Child, Children, Result, ValueRef};

/// Render a positional label.
pub fn index_label(idx: u64) -> String {
	format!("[{idx}]")
}

#[derive(Debug, Clone, Copy)]
enum Step<'a> {
	/// Pointer member whose pointee is the next node.
	Link(ValueRef<'a>),
	/// Tree root pointer; descend `left` before threading.
	Leftmost(ValueRef<'a>),
	Done,
}

/// Lazy walk over a chain of nodes linked through a `next` pointer.
///
/// Each node's link is read only when the following node is requested, so
/// nodes already returned stay valid when a later link is corrupt. A limit
/// bounds the walk against cyclic chains.
#[derive(Debug)]
pub struct ChainWalk<'a> {
	step: Step<'a>,
	next_field: &'static str,
	limit: Option<u64>,
	visited: u64,
}

impl<'a> ChainWalk<'a> {
	/// Walk from the node `link` points to, following `next_field`.
	pub fn linked(link: ValueRef<'a>, next_field: &'static str, limit: Option<u64>) -> Self {
		Self {
			step: Step::Link(link),
			next_field,
			limit,
			visited: 0,
		}
	}

	/// Walk a binary tree in key order: leftmost node first, then the `next` thread.
	pub fn ordered(root: ValueRef<'a>, limit: Option<u64>) -> Self {
		Self {
			step: Step::Leftmost(root),
			next_field: "next",
			limit,
			visited: 0,
		}
	}

	/// Label each node's `value` member as `[i]`.
	pub fn node_values(self) -> Children<'a> {
		let children = self.enumerate().map(|(idx, node)| -> Result<Child<'a>> {
			let node = node?;
			Ok(Child {
				label: index_label(idx as u64),
				value: node.field("value")?,
			})
		});
		Box::new(StopOnError::new(children))
	}

	fn at_limit(&self) -> bool {
		self.limit.is_some_and(|limit| self.visited >= limit)
	}

	fn advance(&mut self) -> Result<Option<ValueRef<'a>>> {
		let node = match self.step {
			Step::Done => return Ok(None),
			Step::Link(link) => {
				let node = link.deref()?;
				if node.addr() == 0 {
					return Ok(None);
				}
				node
			}
			Step::Leftmost(root) => match leftmost(root, self.limit)? {
				Some(node) => node,
				None => return Ok(None),
			},
		};

		if self.at_limit() {
			tracing::warn!(visited = self.visited, node = %format_args!("0x{:016x}", node.addr()), "chain continues past its stored count, stopping");
			return Ok(None);
		}

		node.probe()?;
		self.visited += 1;
		self.step = Step::Link(node.field(self.next_field)?);
		Ok(Some(node))
	}
}

impl<'a> Iterator for ChainWalk<'a> {
	type Item = Result<ValueRef<'a>>;

	fn next(&mut self) -> Option<Self::Item> {
		match self.advance() {
			Ok(Some(node)) => Some(Ok(node)),
			Ok(None) => {
				self.step = Step::Done;
				None
			}
			Err(err) => {
				self.step = Step::Done;
				Some(Err(err))
			}
		}
	}
}

/// Descend `left` links from the node `root` points to.
fn leftmost<'a>(root: ValueRef<'a>, limit: Option<u64>) -> Result<Option<ValueRef<'a>>> {
	let mut node = root.deref()?;
	if node.addr() == 0 {
		return Ok(None);
	}

	let mut hops = 0_u64;
	loop {
		node.probe()?;
		let left = node.field("left")?.deref()?;
		if left.addr() == 0 {
			return Ok(Some(node));
		}
		hops += 1;
		if limit.is_some_and(|limit| hops > limit) {
			tracing::warn!(hops, "left spine is longer than the stored count, starting from the deepest node reached");
			return Ok(Some(node));
		}
		node = left;
	}
}

/// Split each child holding a `first`/`second` pair into a key child and a value child.
///
/// Labels are renumbered `[2i]` for keys and `[2i+1]` for values.
pub fn split_pairs<'a>(children: Children<'a>) -> Children<'a> {
	Box::new(PairSplit {
		inner: children,
		pending: None,
		next_idx: 0,
		failed: false,
	})
}

struct PairSplit<'a> {
	inner: Children<'a>,
	pending: Option<Child<'a>>,
	next_idx: u64,
	failed: bool,
}

impl<'a> PairSplit<'a> {
	fn split(&mut self, pair: Child<'a>) -> Result<Child<'a>> {
		let key = pair.value.field("first")?;
		let value = pair.value.field("second")?;
		let idx = self.next_idx;
		self.next_idx += 2;
		self.pending = Some(Child {
			label: index_label(idx + 1),
			value,
		});
		Ok(Child {
			label: index_label(idx),
			value: key,
		})
	}
}

impl<'a> Iterator for PairSplit<'a> {
	type Item = Result<Child<'a>>;

	fn next(&mut self) -> Option<Self::Item> {
		if let Some(child) = self.pending.take() {
			return Some(Ok(child));
		}
		if self.failed {
			return None;
		}
		let item = match self.inner.next()? {
			Ok(pair) => self.split(pair),
			Err(err) => Err(err),
		};
		self.failed = item.is_err();
		Some(item)
	}
}

/// Ends a fallible sequence after its first error.
pub(crate) struct StopOnError<I> {
	inner: I,
	failed: bool,
}

impl<I> StopOnError<I> {
	pub(crate) fn new(inner: I) -> Self {
		Self { inner, failed: false }
	}
}

impl<T, I: Iterator<Item = Result<T>>> Iterator for StopOnError<I> {
	type Item = Result<T>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.failed {
			return None;
		}
		let item = self.inner.next()?;
		self.failed = item.is_err();
		Some(item)
	}
}
