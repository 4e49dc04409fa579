use crate::lens::{CoreImage, DEFAULT_NAMESPACE, Encoding, FieldSpec, ImageBuilder, LensError, Result, StringLayout, TemplateArg, TypeDef, TypeId};

/// Bucket count of every synthesised hash table.
const HASH_BUCKETS: u64 = 16;

/// Typed storage for one element of a placed container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
	/// Element type.
	pub ty: TypeId,
	/// Element address.
	pub addr: u64,
}

/// A container object written into an [`ImageBuilder`].
#[derive(Debug, Clone, Default)]
pub struct Placement {
	/// Address of the container object itself.
	pub addr: u64,
	/// Element storage in insertion order.
	pub slots: Vec<Slot>,
	/// Node addresses in insertion order; empty for buffer containers.
	pub nodes: Vec<u64>,
	/// Insertion indices in the order a decoder yields the elements.
	pub chain: Vec<usize>,
}

impl Placement {
	fn sequential(addr: u64, slots: Vec<Slot>, nodes: Vec<u64>) -> Self {
		let chain = (0..slots.len()).collect();
		Self { addr, slots, nodes, chain }
	}

	/// Reorder per-insertion `values` into decode order.
	pub fn in_decode_order<T: Clone>(&self, values: &[T]) -> Vec<T> {
		self.chain.iter().filter_map(|idx| values.get(*idx).cloned()).collect()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BucketLink {
	Placeholder,
	Node(usize),
}

fn type_args(args: &[TypeId]) -> Vec<TemplateArg> {
	args.iter().copied().map(TemplateArg::Type).collect()
}

/// Container type declarations mirroring the target library's class layouts.
impl ImageBuilder {
	fn generic_tag(&self, family: &str, args: &[TypeId]) -> String {
		let names: Vec<String> = args.iter().map(|ty| self.types().display_name(*ty)).collect();
		format!("{DEFAULT_NAMESPACE}::{family}<{}>", names.join(", "))
	}

	fn member_type(&self, ty: TypeId, path: &str) -> Result<TypeId> {
		Ok(self.field_addr(ty, 0, path)?.0)
	}

	fn pointee(&self, ty: TypeId, path: &str) -> Result<TypeId> {
		let member = self.member_type(ty, path)?;
		match self.types().get(self.types().strip_aliases(member)?)? {
			TypeDef::Pointer { target } => Ok(*target),
			_ => Err(LensError::ExpectedPointer {
				type_name: self.types().display_name(member),
			}),
		}
	}

	/// Declare `Array<T> { data, size, count }`.
	pub fn array_type(&mut self, element: TypeId) -> Result<TypeId> {
		let tag = self.generic_tag("Array", &[element]);
		if let Some(ty) = self.types().find_tag(&tag) {
			return Ok(ty);
		}
		let data = self.pointer(element);
		let sizet = self.size_type();
		self.record(&tag, vec![FieldSpec::new("data", data), FieldSpec::new("size", sizet), FieldSpec::new("count", sizet)], type_args(&[element]))
	}

	/// Declare `ArrayBase<T> { buffer, size, numItems, allocator }`.
	pub fn array_base_type(&mut self, element: TypeId) -> Result<TypeId> {
		let tag = self.generic_tag("ArrayBase", &[element]);
		if let Some(ty) = self.types().find_tag(&tag) {
			return Ok(ty);
		}
		let allocator_tag = format!("{DEFAULT_NAMESPACE}::MallocBase");
		let allocator = match self.types().find_tag(&allocator_tag) {
			Some(ty) => ty,
			None => self.record(&allocator_tag, Vec::new(), Vec::new())?,
		};
		let allocator = self.pointer(allocator);
		let buffer = self.pointer(element);
		let sizet = self.size_type();
		self.record(
			&tag,
			vec![FieldSpec::new("buffer", buffer), FieldSpec::new("size", sizet), FieldSpec::new("numItems", sizet), FieldSpec::new("allocator", allocator)],
			type_args(&[element]),
		)
	}

	/// Declare `StringBase { array }` over either character buffer layout.
	pub fn string_type(&mut self, layout: StringLayout) -> Result<TypeId> {
		let ch = self.char_type();
		let array = match layout {
			StringLayout::Owning => self.array_type(ch)?,
			StringLayout::Legacy => self.array_base_type(ch)?,
		};
		let tag = format!("{DEFAULT_NAMESPACE}::StringBase");
		let existing = self
			.types()
			.defs()
			.iter()
			.position(|def| matches!(def, TypeDef::Record(record) if record.tag.as_ref() == tag && record.field("array").is_some_and(|field| field.ty == array)));
		match existing {
			Some(idx) => Ok(TypeId(idx as u32)),
			None => self.record(&tag, vec![FieldSpec::new("array", array)], Vec::new()),
		}
	}

	/// Declare `List<T> { head, tail, numNodes }` and its `ListNode<T>`.
	pub fn list_type(&mut self, element: TypeId) -> Result<TypeId> {
		let tag = self.generic_tag("List", &[element]);
		if let Some(ty) = self.types().find_tag(&tag) {
			return Ok(ty);
		}
		let node_tag = self.generic_tag("ListNode", &[element]);
		let node = match self.types().find_tag(&node_tag) {
			Some(ty) => ty,
			None => {
				let link = self.forward_pointer();
				self.record(&node_tag, vec![FieldSpec::new("value", element), FieldSpec::new("next", link), FieldSpec::new("prev", link)], type_args(&[element]))?
			}
		};
		let link = self.pointer(node);
		let sizet = self.size_type();
		self.record(&tag, vec![FieldSpec::new("head", link), FieldSpec::new("tail", link), FieldSpec::new("numNodes", sizet)], type_args(&[element]))
	}

	/// Declare `Tree<T> { root, numNodes }` and its threaded `BinaryNode<T>`.
	pub fn tree_type(&mut self, element: TypeId) -> Result<TypeId> {
		let tag = self.generic_tag("Tree", &[element]);
		if let Some(ty) = self.types().find_tag(&tag) {
			return Ok(ty);
		}
		let node_tag = self.generic_tag("BinaryNode", &[element]);
		let node = match self.types().find_tag(&node_tag) {
			Some(ty) => ty,
			None => {
				let color = self.enumeration(&format!("{DEFAULT_NAMESPACE}::BinaryNodeColor"), 1);
				let link = self.forward_pointer();
				let mut fields = vec![FieldSpec::new("value", element)];
				fields.extend(["parent", "left", "right", "next", "prev"].map(|name| FieldSpec::new(name, link)));
				fields.push(FieldSpec::new("color", color));
				self.record(&node_tag, fields, type_args(&[element]))?
			}
		};
		let link = self.pointer(node);
		let sizet = self.size_type();
		self.record(&tag, vec![FieldSpec::new("root", link), FieldSpec::new("numNodes", sizet)], type_args(&[element]))
	}

	/// Declare `Set<T> { tree }`.
	pub fn set_type(&mut self, element: TypeId) -> Result<TypeId> {
		let tag = self.generic_tag("Set", &[element]);
		if let Some(ty) = self.types().find_tag(&tag) {
			return Ok(ty);
		}
		let tree = self.tree_type(element)?;
		self.record(&tag, vec![FieldSpec::new("tree", tree)], type_args(&[element]))
	}

	/// Declare `Pair<K, V> { first, second }`.
	pub fn pair_type(&mut self, first: TypeId, second: TypeId) -> Result<TypeId> {
		let tag = self.generic_tag("Pair", &[first, second]);
		if let Some(ty) = self.types().find_tag(&tag) {
			return Ok(ty);
		}
		self.record(&tag, vec![FieldSpec::new("first", first), FieldSpec::new("second", second)], type_args(&[first, second]))
	}

	/// Declare `Map<K, V> { tree: Tree<Pair<K, V>> }`.
	pub fn map_type(&mut self, key: TypeId, value: TypeId) -> Result<TypeId> {
		let tag = self.generic_tag("Map", &[key, value]);
		if let Some(ty) = self.types().find_tag(&tag) {
			return Ok(ty);
		}
		let pair = self.pair_type(key, value)?;
		let tree = self.tree_type(pair)?;
		self.record(&tag, vec![FieldSpec::new("tree", tree)], type_args(&[key, value]))
	}

	/// Declare `HashTable<T>` with its bucket node type.
	pub fn hash_table_type(&mut self, element: TypeId) -> Result<TypeId> {
		let tag = self.generic_tag("HashTable", &[element]);
		if let Some(ty) = self.types().find_tag(&tag) {
			return Ok(ty);
		}
		let sizet = self.size_type();
		let bucket_tag = self.generic_tag("HashBucket", &[element]);
		let bucket = match self.types().find_tag(&bucket_tag) {
			Some(ty) => ty,
			None => self.record(&bucket_tag, vec![FieldSpec::new("value", element), FieldSpec::new("hkey", sizet)], type_args(&[element]))?,
		};
		let node_tag = self.generic_tag("ForwardListNodeBase", &[bucket]);
		let node = match self.types().find_tag(&node_tag) {
			Some(ty) => ty,
			None => {
				let link = self.forward_pointer();
				self.record(&node_tag, vec![FieldSpec::base(bucket), FieldSpec::new("next", link)], type_args(&[bucket]))?
			}
		};
		let link = self.pointer(node);
		let buckets = self.pointer(link);
		self.record(
			&tag,
			vec![FieldSpec::new("buckets", buckets), FieldSpec::new("numBuckets", sizet), FieldSpec::new("numItems", sizet), FieldSpec::new("placeholder", node)],
			type_args(&[element]),
		)
	}

	/// Declare `HashSet<T>`, derived from `HashTable<T>`.
	pub fn hash_set_type(&mut self, element: TypeId) -> Result<TypeId> {
		let tag = self.generic_tag("HashSet", &[element]);
		if let Some(ty) = self.types().find_tag(&tag) {
			return Ok(ty);
		}
		let table = self.hash_table_type(element)?;
		self.record(&tag, vec![FieldSpec::base(table)], type_args(&[element]))
	}

	/// Declare `HashMap<K, V>`, derived from `HashTable<Pair<K, V>>`.
	pub fn hash_map_type(&mut self, key: TypeId, value: TypeId) -> Result<TypeId> {
		let tag = self.generic_tag("HashMap", &[key, value]);
		if let Some(ty) = self.types().find_tag(&tag) {
			return Ok(ty);
		}
		let pair = self.pair_type(key, value)?;
		let table = self.hash_table_type(pair)?;
		self.record(&tag, vec![FieldSpec::base(table)], type_args(&[key, value]))
	}

	/// Declare `Tuple<A, B, ...>` over its `TupleBase<i, ...>` chain.
	pub fn tuple_type(&mut self, items: &[TypeId]) -> Result<TypeId> {
		let tag = self.generic_tag("Tuple", items);
		if let Some(ty) = self.types().find_tag(&tag) {
			return Ok(ty);
		}

		let mut level: Option<TypeId> = None;
		for idx in (0..items.len()).rev() {
			let rest = &items[idx..];
			let names: Vec<String> = rest.iter().map(|ty| self.types().display_name(*ty)).collect();
			let level_tag = format!("{DEFAULT_NAMESPACE}::TupleBase<{idx}, {}>", names.join(", "));
			let ty = match self.types().find_tag(&level_tag) {
				Some(ty) => ty,
				None => {
					let mut fields = Vec::with_capacity(2);
					if let Some(base) = level {
						fields.push(FieldSpec::base(base));
					}
					fields.push(FieldSpec::new("item", items[idx]));
					let mut args = vec![TemplateArg::Value(idx as i64)];
					args.extend(type_args(rest));
					self.record(&level_tag, fields, args)?
				}
			};
			level = Some(ty);
		}

		let fields = level.map(FieldSpec::base).into_iter().collect();
		self.record(&tag, fields, type_args(items))
	}

	/// Declare `Optional<T> { value, initd }`.
	pub fn optional_type(&mut self, element: TypeId) -> Result<TypeId> {
		let tag = self.generic_tag("Optional", &[element]);
		if let Some(ty) = self.types().find_tag(&tag) {
			return Ok(ty);
		}
		let flag = self.primitive("bool", 1, Encoding::Bool);
		self.record(&tag, vec![FieldSpec::new("value", element), FieldSpec::new("initd", flag)], type_args(&[element]))
	}

	/// Declare `CircularQueue<T> { buffer, size, extractIdx, insertIdx }`.
	pub fn circular_queue_type(&mut self, element: TypeId) -> Result<TypeId> {
		let tag = self.generic_tag("CircularQueue", &[element]);
		if let Some(ty) = self.types().find_tag(&tag) {
			return Ok(ty);
		}
		let buffer = self.pointer(element);
		let sizet = self.size_type();
		let index = self.primitive("uint64", 8, Encoding::Unsigned);
		self.record(
			&tag,
			vec![FieldSpec::new("buffer", buffer), FieldSpec::new("size", sizet), FieldSpec::new("extractIdx", index), FieldSpec::new("insertIdx", index)],
			type_args(&[element]),
		)
	}
}

/// Writers that lay out container instances in zeroed allocations.
impl ImageBuilder {
	fn place_buffer(&mut self, ty: TypeId, pointer: &str, count: &str, len: u64, capacity: u64) -> Result<Placement> {
		let capacity = capacity.max(len);
		let addr = self.alloc_value(ty)?;
		let element = self.pointee(ty, pointer)?;
		let stride = self.types().size_of(element, self.pointer_size())?;
		let buffer = if capacity > 0 { self.alloc_array(element, capacity)? } else { 0 };
		self.set_field(ty, addr, pointer, buffer)?;
		self.set_field(ty, addr, "size", capacity)?;
		self.set_field(ty, addr, count, len)?;
		let slots = (0..len).map(|idx| Slot { ty: element, addr: buffer + idx * stride }).collect();
		Ok(Placement::sequential(addr, slots, Vec::new()))
	}

	/// Write an `Array<T>` holding `len` zeroed elements in a `capacity`-slot buffer.
	pub fn place_array(&mut self, ty: TypeId, len: u64, capacity: u64) -> Result<Placement> {
		self.place_buffer(ty, "data", "count", len, capacity)
	}

	/// Write an `ArrayBase<T>` holding `len` zeroed elements.
	pub fn place_array_base(&mut self, ty: TypeId, len: u64, capacity: u64) -> Result<Placement> {
		self.place_buffer(ty, "buffer", "numItems", len, capacity)
	}

	/// Fill an existing `StringBase` at `addr` with `text`; empty text keeps a null buffer.
	pub fn write_string(&mut self, ty: TypeId, addr: u64, text: &str) -> Result<()> {
		let (array, array_addr) = self.field_addr(ty, addr, "array")?;
		let owning = self.types().record(array)?.is_some_and(|record| record.field("data").is_some());
		let (pointer, count) = if owning { ("data", "count") } else { ("buffer", "numItems") };
		if text.is_empty() {
			return Ok(());
		}

		let len = text.len() as u64 + 1;
		let chars = self.alloc(len, 1);
		let mut bytes = text.as_bytes().to_vec();
		bytes.push(0);
		self.write_bytes(chars, &bytes)?;
		self.set_field(array, array_addr, pointer, chars)?;
		self.set_field(array, array_addr, "size", len)?;
		self.set_field(array, array_addr, count, len)
	}

	/// Allocate and fill a `StringBase`.
	pub fn place_string(&mut self, ty: TypeId, text: &str) -> Result<u64> {
		let addr = self.alloc_value(ty)?;
		self.write_string(ty, addr, text)?;
		Ok(addr)
	}

	fn value_slots(&self, node: TypeId, nodes: &[u64]) -> Result<Vec<Slot>> {
		nodes
			.iter()
			.map(|node_addr| {
				let (ty, addr) = self.field_addr(node, *node_addr, "value")?;
				Ok(Slot { ty, addr })
			})
			.collect()
	}

	/// Write a `List<T>` of `len` linked nodes.
	pub fn place_list(&mut self, ty: TypeId, len: usize) -> Result<Placement> {
		let addr = self.alloc_value(ty)?;
		let node = self.pointee(ty, "head")?;
		let nodes = (0..len).map(|_| self.alloc_value(node)).collect::<Result<Vec<_>>>()?;

		for (idx, node_addr) in nodes.iter().enumerate() {
			let next = nodes.get(idx + 1).copied().unwrap_or(0);
			let prev = idx.checked_sub(1).map_or(0, |prev| nodes[prev]);
			self.set_field(node, *node_addr, "next", next)?;
			self.set_field(node, *node_addr, "prev", prev)?;
		}
		self.set_field(ty, addr, "head", nodes.first().copied().unwrap_or(0))?;
		self.set_field(ty, addr, "tail", nodes.last().copied().unwrap_or(0))?;
		self.set_field(ty, addr, "numNodes", len as u64)?;

		let slots = self.value_slots(node, &nodes)?;
		Ok(Placement::sequential(addr, slots, nodes))
	}

	fn place_subtree(&mut self, node: TypeId, lo: usize, hi: usize, parent: u64, in_order: &mut [u64]) -> Result<u64> {
		if lo >= hi {
			return Ok(0);
		}
		let mid = lo + (hi - lo) / 2;
		let addr = self.alloc_value(node)?;
		in_order[mid] = addr;
		self.set_field(node, addr, "parent", parent)?;
		let left = self.place_subtree(node, lo, mid, addr, in_order)?;
		let right = self.place_subtree(node, mid + 1, hi, addr, in_order)?;
		self.set_field(node, addr, "left", left)?;
		self.set_field(node, addr, "right", right)?;
		Ok(addr)
	}

	/// Write a balanced, threaded `Tree<T>`, `Set<T>` or `Map<K, V>` of `len` nodes.
	///
	/// Nodes are allocated root first, so address order differs from key
	/// order; slots come back in key order.
	pub fn place_tree(&mut self, ty: TypeId, len: usize) -> Result<Placement> {
		let addr = self.alloc_value(ty)?;
		let has_tree = self.types().record(ty)?.is_some_and(|record| record.field("tree").is_some());
		let (tree, tree_addr) = if has_tree { self.field_addr(ty, addr, "tree")? } else { (ty, addr) };
		let node = self.pointee(tree, "root")?;

		let mut nodes = vec![0_u64; len];
		let root = self.place_subtree(node, 0, len, 0, &mut nodes)?;
		for (idx, node_addr) in nodes.iter().enumerate() {
			let next = nodes.get(idx + 1).copied().unwrap_or(0);
			let prev = idx.checked_sub(1).map_or(0, |prev| nodes[prev]);
			self.set_field(node, *node_addr, "next", next)?;
			self.set_field(node, *node_addr, "prev", prev)?;
		}
		self.set_field(tree, tree_addr, "root", root)?;
		self.set_field(tree, tree_addr, "numNodes", len as u64)?;

		let slots = self.value_slots(node, &nodes)?;
		Ok(Placement::sequential(addr, slots, nodes))
	}

	/// Write a `HashTable<T>`, `HashSet<T>` or `HashMap<K, V>`, inserting one node per hash key.
	///
	/// Insertion follows the target's bucket protocol: each bucket points at
	/// the node preceding its first entry, and a new bucket's node is pushed
	/// to the front of the global chain.
	pub fn place_hash(&mut self, ty: TypeId, hkeys: &[u64]) -> Result<Placement> {
		let addr = self.alloc_value(ty)?;
		let (node, placeholder) = self.field_addr(ty, addr, "placeholder")?;
		let link = self.pointee(ty, "buckets")?;
		let buckets = self.alloc_array(link, HASH_BUCKETS)?;
		let nodes = hkeys.iter().map(|_| self.alloc_value(node)).collect::<Result<Vec<_>>>()?;

		let bucket_of = |hkey: u64| (hkey % HASH_BUCKETS) as usize;
		let mut heads: Vec<Option<BucketLink>> = vec![None; HASH_BUCKETS as usize];
		let mut next: Vec<Option<usize>> = vec![None; hkeys.len()];
		let mut first: Option<usize> = None;

		for (idx, hkey) in hkeys.iter().enumerate() {
			let bucket = bucket_of(*hkey);
			match heads[bucket] {
				Some(BucketLink::Placeholder) => {
					next[idx] = first;
					first = Some(idx);
				}
				Some(BucketLink::Node(before)) => {
					next[idx] = next[before];
					next[before] = Some(idx);
				}
				None => {
					next[idx] = first;
					first = Some(idx);
					if let Some(displaced) = next[idx] {
						heads[bucket_of(hkeys[displaced])] = Some(BucketLink::Node(idx));
					}
					heads[bucket] = Some(BucketLink::Placeholder);
				}
			}
		}

		let node_addr = |idx: Option<usize>| idx.map_or(0, |idx| nodes[idx]);
		for (idx, hkey) in hkeys.iter().enumerate() {
			self.set_field(node, nodes[idx], "hkey", *hkey)?;
			self.set_field(node, nodes[idx], "next", node_addr(next[idx]))?;
		}
		self.set_field(node, placeholder, "next", node_addr(first))?;
		let pointer_size = self.pointer_size() as u64;
		for (bucket, head) in heads.iter().enumerate() {
			let target = match head {
				Some(BucketLink::Placeholder) => placeholder,
				Some(BucketLink::Node(idx)) => nodes[*idx],
				None => 0,
			};
			self.write_pointer(buckets + bucket as u64 * pointer_size, target)?;
		}
		self.set_field(ty, addr, "buckets", buckets)?;
		self.set_field(ty, addr, "numBuckets", HASH_BUCKETS)?;
		self.set_field(ty, addr, "numItems", hkeys.len() as u64)?;

		let mut chain = Vec::with_capacity(hkeys.len());
		let mut cursor = first;
		while let Some(idx) = cursor {
			chain.push(idx);
			cursor = next[idx];
		}
		let slots = self.value_slots(node, &nodes)?;
		Ok(Placement { addr, slots, nodes, chain })
	}

	/// Write a `Tuple<...>`; slots are the items in declaration order.
	pub fn place_tuple(&mut self, ty: TypeId) -> Result<Placement> {
		let addr = self.alloc_value(ty)?;
		let mut slots = Vec::new();
		let mut level = (ty, addr);
		loop {
			let base = self.types().record(level.0)?.and_then(|record| record.bases().next()).map(|base| (base.ty, level.1 + base.offset));
			let Some(base) = base else {
				break;
			};
			let (item, item_addr) = self.field_addr(base.0, base.1, "item")?;
			slots.push(Slot { ty: item, addr: item_addr });
			level = base;
		}
		Ok(Placement::sequential(addr, slots, Vec::new()))
	}

	/// Write a `Pair<K, V>`; slots are `first` then `second`.
	pub fn place_pair(&mut self, ty: TypeId) -> Result<Placement> {
		let addr = self.alloc_value(ty)?;
		let slots = ["first", "second"]
			.into_iter()
			.map(|name| {
				let (ty, addr) = self.field_addr(ty, addr, name)?;
				Ok(Slot { ty, addr })
			})
			.collect::<Result<Vec<_>>>()?;
		Ok(Placement::sequential(addr, slots, Vec::new()))
	}

	/// Write an `Optional<T>`; the single slot is the value storage.
	pub fn place_optional(&mut self, ty: TypeId, initd: bool) -> Result<Placement> {
		let addr = self.alloc_value(ty)?;
		self.set_field(ty, addr, "initd", u64::from(initd))?;
		let (value, value_addr) = self.field_addr(ty, addr, "value")?;
		Ok(Placement::sequential(addr, vec![Slot { ty: value, addr: value_addr }], Vec::new()))
	}

	/// Write a `CircularQueue<T>` of `capacity` slots holding `len` items from `extract`.
	pub fn place_circular_queue(&mut self, ty: TypeId, capacity: u64, extract: u64, len: u64) -> Result<Placement> {
		// One slot always stays free: a full ring would read as empty.
		if len >= capacity.max(1) || (capacity > 0 && extract >= capacity) {
			return Err(LensError::InvalidCount {
				type_name: self.types().display_name(ty),
				count: len,
			});
		}
		let addr = self.alloc_value(ty)?;
		let element = self.pointee(ty, "buffer")?;
		let stride = self.types().size_of(element, self.pointer_size())?;
		let buffer = self.alloc_array(element, capacity)?;
		self.set_field(ty, addr, "buffer", buffer)?;
		self.set_field(ty, addr, "size", capacity)?;
		self.set_field(ty, addr, "extractIdx", extract)?;
		self.set_field(ty, addr, "insertIdx", (extract + len) % capacity.max(1))?;
		let slots = (0..len).map(|idx| Slot { ty: element, addr: buffer + (extract + idx) % capacity * stride }).collect();
		Ok(Placement::sequential(addr, slots, Vec::new()))
	}

	/// Store one scalar per slot, in insertion order.
	pub fn fill(&mut self, placement: &Placement, values: &[u64]) -> Result<()> {
		for (slot, value) in placement.slots.iter().zip(values) {
			self.write_scalar(slot.ty, slot.addr, *value)?;
		}
		Ok(())
	}

	/// Store one scalar per slot into the member at `path`.
	pub fn fill_field(&mut self, placement: &Placement, path: &str, values: &[u64]) -> Result<()> {
		for (slot, value) in placement.slots.iter().zip(values) {
			self.set_field(slot.ty, slot.addr, path, *value)?;
		}
		Ok(())
	}
}

/// Build a sample image with one value of every container family.
pub fn demo_image(pointer_size: usize) -> Result<CoreImage> {
	let mut b = ImageBuilder::new(pointer_size)?;
	let int = b.int();
	let float = b.primitive("float", 4, Encoding::Float);
	let ch = b.char_type();
	let string = b.string_type(StringLayout::Owning)?;
	let legacy_string = b.string_type(StringLayout::Legacy)?;

	let counter = b.alloc_value(int)?;
	b.write_scalar(int, counter, 42)?;
	b.symbol("counter", int, counter);

	let point_ty = b.record("Point", vec![FieldSpec::new("x", int), FieldSpec::new("y", int)], Vec::new())?;
	let point = b.alloc_value(point_ty)?;
	b.set_field(point_ty, point, "x", 3)?;
	b.set_field(point_ty, point, "y", (-4_i64) as u64)?;
	b.symbol("point", point_ty, point);

	let ty = b.array_type(int)?;
	let numbers = b.place_array(ty, 5, 8)?;
	b.fill(&numbers, &[3, 1, 4, 1, 5])?;
	b.symbol("numbers", ty, numbers.addr);

	let ty = b.array_base_type(int)?;
	let raw = b.place_array_base(ty, 3, 4)?;
	b.fill(&raw, &[7, 8, 9])?;
	b.symbol("raw_buffer", ty, raw.addr);

	let greeting = b.place_string(string, "hello, world")?;
	b.symbol("greeting", string, greeting);
	let empty = b.place_string(string, "")?;
	b.symbol("empty_string", string, empty);
	let legacy = b.place_string(legacy_string, "legacy layout")?;
	b.symbol("legacy_greeting", legacy_string, legacy);

	let ty = b.array_type(string)?;
	let names = b.place_array(ty, 2, 2)?;
	for (slot, text) in names.slots.iter().zip(["alpha", "beta"]) {
		b.write_string(slot.ty, slot.addr, text)?;
	}
	b.symbol("names", ty, names.addr);

	let ty = b.tuple_type(&[int, ch, float])?;
	let record = b.place_tuple(ty)?;
	b.fill(&record, &[7, u64::from(b'x'), u64::from(2.5_f32.to_bits())])?;
	b.symbol("record", ty, record.addr);

	let ty = b.list_type(int)?;
	let list = b.place_list(ty, 3)?;
	b.fill(&list, &[10, 20, 30])?;
	b.symbol("queue_list", ty, list.addr);

	let ty = b.tree_type(int)?;
	let tree = b.place_tree(ty, 5)?;
	b.fill(&tree, &[1, 3, 5, 7, 9])?;
	b.symbol("ordered", ty, tree.addr);

	let ty = b.set_type(int)?;
	let set = b.place_tree(ty, 3)?;
	b.fill(&set, &[2, 4, 6])?;
	b.symbol("tags", ty, set.addr);

	let ty = b.map_type(int, string)?;
	let map = b.place_tree(ty, 3)?;
	b.fill_field(&map, "first", &[1, 2, 3])?;
	for (slot, text) in map.slots.iter().zip(["one", "two", "three"]) {
		let (ty, addr) = b.field_addr(slot.ty, slot.addr, "second")?;
		b.write_string(ty, addr, text)?;
	}
	b.symbol("ages", ty, map.addr);

	let ty = b.hash_map_type(int, int)?;
	let keys = [17, 3, 33];
	let lookup = b.place_hash(ty, &keys)?;
	b.fill_field(&lookup, "first", &keys)?;
	b.fill_field(&lookup, "second", &[1, 2, 3])?;
	b.symbol("lookup", ty, lookup.addr);

	let ty = b.hash_set_type(int)?;
	let keys = [5, 21, 8];
	let seen = b.place_hash(ty, &keys)?;
	b.fill(&seen, &keys)?;
	b.symbol("seen", ty, seen.addr);
	let table = b.hash_table_type(int)?;
	b.symbol("seen_table", table, seen.addr);

	let ty = b.pair_type(int, float)?;
	let pair = b.place_pair(ty)?;
	b.fill(&pair, &[2, u64::from(0.5_f32.to_bits())])?;
	b.symbol("point_pair", ty, pair.addr);

	let ty = b.optional_type(int)?;
	let maybe = b.place_optional(ty, true)?;
	b.fill(&maybe, &[99])?;
	b.symbol("maybe", ty, maybe.addr);
	let nothing = b.place_optional(ty, false)?;
	b.symbol("nothing", ty, nothing.addr);

	let ty = b.circular_queue_type(int)?;
	let ring = b.place_circular_queue(ty, 4, 3, 3)?;
	b.fill(&ring, &[100, 200, 300])?;
	b.symbol("ring", ty, ring.addr);

	b.finish()
}

#[cfg(test)]
mod tests {
	use super::demo_image;
	use crate::lens::{ImageBuilder, LensError, StringLayout, TypeDef};

	#[test]
	fn container_types_are_declared_once() {
		let mut builder = ImageBuilder::new(8).expect("pointer size");
		let int = builder.int();
		let list = builder.list_type(int).expect("list");
		assert_eq!(builder.list_type(int).expect("again"), list);
		let owning = builder.string_type(StringLayout::Owning).expect("owning");
		let legacy = builder.string_type(StringLayout::Legacy).expect("legacy");
		assert_ne!(owning, legacy);
		assert_eq!(builder.string_type(StringLayout::Legacy).expect("legacy"), legacy);
	}

	#[test]
	fn node_links_point_back_at_their_node() {
		let mut builder = ImageBuilder::new(4).expect("pointer size");
		let int = builder.int();
		let tree = builder.tree_type(int).expect("tree");
		let root = builder.field_addr(tree, 0, "root").expect("root").0;
		let TypeDef::Pointer { target } = builder.types().get(root).expect("declared") else {
			panic!("root is not a pointer");
		};
		assert_eq!(builder.types().display_name(*target), "Korin::BinaryNode<int>");
		let next = builder.field_addr(*target, 0, "next").expect("next").0;
		assert_eq!(next, root);
	}

	#[test]
	fn hash_insertion_follows_bucket_protocol() {
		let mut builder = ImageBuilder::new(8).expect("pointer size");
		let int = builder.int();
		let ty = builder.hash_set_type(int).expect("set");
		let placed = builder.place_hash(ty, &[0, 1, 16]).expect("place");
		// 16 shares bucket 0 and lands right after the node preceding that bucket.
		assert_eq!(placed.chain, vec![1, 2, 0]);
		assert_eq!(placed.in_decode_order(&[0, 1, 16]), vec![1, 16, 0]);
	}

	#[test]
	fn full_ring_is_rejected() {
		let mut builder = ImageBuilder::new(8).expect("pointer size");
		let int = builder.int();
		let ty = builder.circular_queue_type(int).expect("queue");
		assert!(matches!(builder.place_circular_queue(ty, 4, 0, 4), Err(LensError::InvalidCount { .. })));
		assert!(builder.place_circular_queue(ty, 4, 2, 3).is_ok());
	}

	#[test]
	fn demo_image_builds_for_both_pointer_sizes() {
		for pointer_size in [4, 8] {
			let image = demo_image(pointer_size).expect("demo");
			assert!(image.symbol("ages").is_ok());
			assert!(image.symbol("ring").is_ok());
		}
	}
}
