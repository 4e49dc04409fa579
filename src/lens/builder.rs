use crate::lens::image::Symbol;
use crate::lens::value::find_field;
use crate::lens::{CoreImage, Encoding, Endianness, FieldDef, LensError, MemoryMap, RecordDef, Region, Result, TemplateArg, TypeDef, TypeId, TypeTable};

/// First address handed out by [`ImageBuilder::alloc`].
const HEAP_BASE: u64 = 0x1000;
/// Unmapped gap left between allocations so overruns fail to read.
const ALLOC_GAP: u64 = 0x10;

/// Member description used to lay out a record.
#[derive(Debug, Clone)]
pub struct FieldSpec {
	name: Option<Box<str>>,
	ty: TypeId,
}

impl FieldSpec {
	/// Named data member.
	pub fn new(name: &str, ty: TypeId) -> Self {
		Self { name: Some(name.into()), ty }
	}

	/// Base-class subobject, named after the base tag.
	pub fn base(ty: TypeId) -> Self {
		Self { name: None, ty }
	}
}

/// Incrementally builds a [`CoreImage`]: types, zero-filled allocations, and symbols.
#[derive(Debug)]
pub struct ImageBuilder {
	pointer_size: usize,
	endianness: Endianness,
	types: TypeTable,
	regions: Vec<Region>,
	symbols: Vec<Symbol>,
	next_addr: u64,
}

impl ImageBuilder {
	/// Start an empty image for a target with the given pointer width.
	pub fn new(pointer_size: usize) -> Result<Self> {
		if !matches!(pointer_size, 4 | 8) {
			return Err(LensError::UnsupportedPointerSize { size: pointer_size });
		}
		Ok(Self {
			pointer_size,
			endianness: Endianness::Little,
			types: TypeTable::new(),
			regions: Vec::new(),
			symbols: Vec::new(),
			next_addr: HEAP_BASE,
		})
	}

	/// Switch the target byte order used for subsequent writes.
	pub fn with_endianness(mut self, endianness: Endianness) -> Self {
		self.endianness = endianness;
		self
	}

	/// Target pointer width in bytes.
	pub fn pointer_size(&self) -> usize {
		self.pointer_size
	}

	/// Types declared so far.
	pub fn types(&self) -> &TypeTable {
		&self.types
	}

	/// Declare a primitive type; an identical earlier declaration is reused.
	pub fn primitive(&mut self, name: &str, size: u64, encoding: Encoding) -> TypeId {
		let existing = self.types.defs().iter().position(|def| {
			matches!(def, TypeDef::Primitive { name: have, size: have_size, encoding: have_encoding } if have.as_ref() == name && *have_size == size && *have_encoding == encoding)
		});
		match existing {
			Some(idx) => TypeId(idx as u32),
			None => self.types.push(TypeDef::Primitive {
				name: name.into(),
				size,
				encoding,
			}),
		}
	}

	/// Declare a 32-bit signed `int`.
	pub fn int(&mut self) -> TypeId {
		self.primitive("int", 4, Encoding::Signed)
	}

	/// Declare an 8-bit `char`.
	pub fn char_type(&mut self) -> TypeId {
		self.primitive("char", 1, Encoding::Char)
	}

	/// Declare a pointer-sized unsigned `sizet`.
	pub fn size_type(&mut self) -> TypeId {
		let size = self.pointer_size as u64;
		self.primitive("sizet", size, Encoding::Unsigned)
	}

	/// Declare a pointer to `target`, reusing an earlier declaration.
	pub fn pointer(&mut self, target: TypeId) -> TypeId {
		let existing = self.types.defs().iter().position(|def| matches!(def, TypeDef::Pointer { target: have } if *have == target));
		match existing {
			Some(idx) => TypeId(idx as u32),
			None => self.types.push(TypeDef::Pointer { target }),
		}
	}

	/// Declare a pointer to whichever type is declared next.
	///
	/// Self-referential nodes take their link type from here before the
	/// record itself exists.
	pub fn forward_pointer(&mut self) -> TypeId {
		let target = TypeId(self.types.len() as u32 + 1);
		self.types.push(TypeDef::Pointer { target })
	}

	/// Declare a reference to `target`.
	pub fn reference(&mut self, target: TypeId) -> TypeId {
		self.types.push(TypeDef::Reference { target })
	}

	/// Declare `const target`.
	pub fn constant(&mut self, target: TypeId) -> TypeId {
		self.types.push(TypeDef::Qualified {
			target,
			is_const: true,
			is_volatile: false,
		})
	}

	/// Declare a typedef alias.
	pub fn typedef(&mut self, name: &str, target: TypeId) -> TypeId {
		self.types.push(TypeDef::Typedef { name: name.into(), target })
	}

	/// Declare an enumeration, reusing an earlier declaration of the same tag.
	pub fn enumeration(&mut self, tag: &str, size: u64) -> TypeId {
		let existing = self.types.defs().iter().position(|def| matches!(def, TypeDef::Enum { tag: have, .. } if have.as_ref() == tag));
		match existing {
			Some(idx) => TypeId(idx as u32),
			None => self.types.push(TypeDef::Enum { tag: tag.into(), size }),
		}
	}

	/// Declare a record with C layout rules: natural alignment, tail padding.
	pub fn record(&mut self, tag: &str, fields: Vec<FieldSpec>, template_args: Vec<TemplateArg>) -> Result<TypeId> {
		let mut offset = 0_u64;
		let mut max_align = 1_u64;
		let mut defs = Vec::with_capacity(fields.len());

		for spec in fields {
			let size = self.types.size_of(spec.ty, self.pointer_size)?;
			let align = self.types.align_of(spec.ty, self.pointer_size)?;
			offset = align_up(offset, align);
			max_align = max_align.max(align);
			let (name, base) = match spec.name {
				Some(name) => (name, false),
				None => (self.types.display_name(spec.ty).into_boxed_str(), true),
			};
			defs.push(FieldDef {
				name,
				ty: spec.ty,
				offset,
				base,
			});
			offset += size;
		}

		let size = align_up(offset.max(1), max_align);
		Ok(self.types.push(TypeDef::Record(RecordDef {
			tag: tag.into(),
			size,
			fields: defs,
			template_args,
		})))
	}

	/// Reserve `size` zeroed bytes and return their address.
	pub fn alloc(&mut self, size: u64, align: u64) -> u64 {
		let addr = align_up(self.next_addr, align.max(1));
		let len = size.max(1);
		self.regions.push(Region {
			addr,
			bytes: vec![0; len as usize],
		});
		self.next_addr = addr + len + ALLOC_GAP;
		addr
	}

	/// Reserve storage for one `ty` and return its address.
	pub fn alloc_value(&mut self, ty: TypeId) -> Result<u64> {
		let size = self.types.size_of(ty, self.pointer_size)?;
		let align = self.types.align_of(ty, self.pointer_size)?;
		Ok(self.alloc(size, align))
	}

	/// Reserve storage for `count` consecutive `ty` elements.
	pub fn alloc_array(&mut self, ty: TypeId, count: u64) -> Result<u64> {
		let size = self.types.size_of(ty, self.pointer_size)?;
		let align = self.types.align_of(ty, self.pointer_size)?;
		let total = size.checked_mul(count).ok_or_else(|| LensError::UnsizedType {
			type_name: self.types.display_name(ty),
		})?;
		Ok(self.alloc(total, align))
	}

	/// Copy `bytes` into a previous allocation.
	pub fn write_bytes(&mut self, addr: u64, bytes: &[u8]) -> Result<()> {
		let region = self
			.regions
			.iter_mut()
			.find(|region| region.addr <= addr && addr + bytes.len() as u64 <= region.end())
			.ok_or(LensError::MemoryRead { addr, len: bytes.len() })?;
		let start = (addr - region.addr) as usize;
		region.bytes[start..start + bytes.len()].copy_from_slice(bytes);
		Ok(())
	}

	/// Store the low `size` bytes of `value`.
	pub fn write_uint(&mut self, addr: u64, size: u64, value: u64) -> Result<()> {
		if !matches!(size, 1 | 2 | 4 | 8) {
			return Err(LensError::UnsizedType {
				type_name: format!("{size}-byte integer"),
			});
		}
		let bytes = self.endianness.write_uint(value, size as usize);
		self.write_bytes(addr, &bytes)
	}

	/// Store a pointer-sized value.
	pub fn write_pointer(&mut self, addr: u64, value: u64) -> Result<()> {
		self.write_uint(addr, self.pointer_size as u64, value)
	}

	/// Type and address of a dotted member path inside a `ty` at `addr`.
	pub fn field_addr(&self, ty: TypeId, addr: u64, path: &str) -> Result<(TypeId, u64)> {
		let mut current = (ty, addr);
		for name in path.split('.') {
			let record = self.types.record(current.0)?.ok_or_else(|| LensError::ExpectedRecord {
				type_name: self.types.display_name(current.0),
			})?;
			current = find_field(&self.types, record, name, current.1, 0)?.ok_or_else(|| LensError::MissingField {
				type_name: self.types.display_name(current.0),
				field: name.to_owned(),
			})?;
		}
		Ok(current)
	}

	/// Store the low bytes of `value` into a `ty` at `addr`.
	pub fn write_scalar(&mut self, ty: TypeId, addr: u64, value: u64) -> Result<()> {
		let size = self.types.size_of(ty, self.pointer_size)?;
		self.write_uint(addr, size, value)
	}

	/// Store a scalar into a dotted member path.
	pub fn set_field(&mut self, ty: TypeId, addr: u64, path: &str, value: u64) -> Result<()> {
		let (field_ty, field_addr) = self.field_addr(ty, addr, path)?;
		self.write_scalar(field_ty, field_addr, value)
	}

	/// Publish a named value.
	pub fn symbol(&mut self, name: &str, ty: TypeId, addr: u64) {
		self.symbols.push(Symbol { name: name.into(), ty, addr });
	}

	/// Freeze into an image.
	pub fn finish(self) -> Result<CoreImage> {
		let memory = MemoryMap::from_regions(self.regions)?;
		CoreImage::from_parts(self.pointer_size, self.endianness, self.types, memory, self.symbols)
	}
}

pub(crate) fn align_up(value: u64, align: u64) -> u64 {
	let align = align.max(1);
	value.div_ceil(align) * align
}

#[cfg(test)]
mod tests {
	use super::{FieldSpec, ImageBuilder, align_up};
	use crate::lens::{LensError, TypeDef};

	#[test]
	fn record_layout_pads_to_natural_alignment() {
		let mut builder = ImageBuilder::new(8).expect("pointer size");
		let ch = builder.char_type();
		let int = builder.int();
		let ptr = builder.pointer(int);
		let ty = builder
			.record("Mixed", vec![FieldSpec::new("c", ch), FieldSpec::new("p", ptr), FieldSpec::new("i", int)], Vec::new())
			.expect("layout");

		let TypeDef::Record(record) = builder.types().get(ty).expect("declared") else {
			panic!("expected record");
		};
		let offsets: Vec<u64> = record.fields.iter().map(|field| field.offset).collect();
		assert_eq!(offsets, vec![0, 8, 16]);
		assert_eq!(record.size, 24);
	}

	#[test]
	fn base_fields_take_the_base_tag_as_name() {
		let mut builder = ImageBuilder::new(8).expect("pointer size");
		let int = builder.int();
		let base = builder.record("Base", vec![FieldSpec::new("value", int)], Vec::new()).expect("base");
		let derived = builder.record("Derived", vec![FieldSpec::base(base), FieldSpec::new("extra", int)], Vec::new()).expect("derived");

		let addr = builder.alloc_value(derived).expect("alloc");
		let (_, value_addr) = builder.field_addr(derived, addr, "value").expect("found through base");
		assert_eq!(value_addr, addr);
		let (_, extra_addr) = builder.field_addr(derived, addr, "extra").expect("direct");
		assert_eq!(extra_addr, addr + 4);
	}

	#[test]
	fn writes_outside_allocations_fail() {
		let mut builder = ImageBuilder::new(4).expect("pointer size");
		let addr = builder.alloc(4, 4);
		assert!(builder.write_uint(addr, 4, 7).is_ok());
		let err = builder.write_uint(addr + 2, 4, 7).expect_err("overrun");
		assert!(matches!(err, LensError::MemoryRead { .. }));
	}

	#[test]
	fn identical_primitives_and_pointers_are_declared_once() {
		let mut builder = ImageBuilder::new(8).expect("pointer size");
		let int = builder.int();
		assert_eq!(builder.int(), int);
		let ptr = builder.pointer(int);
		assert_eq!(builder.pointer(int), ptr);
		assert_ne!(builder.forward_pointer(), ptr);
	}

	#[test]
	fn unsupported_pointer_size_is_rejected() {
		assert!(matches!(ImageBuilder::new(2), Err(LensError::UnsupportedPointerSize { size: 2 })));
		assert_eq!(align_up(9, 8), 16);
		assert_eq!(align_up(0, 8), 0);
	}
}
