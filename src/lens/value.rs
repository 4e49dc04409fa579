use std::fmt;

use crate::lens::{Encoding, Endianness, LensError, RecordDef, Result, TemplateArg, TypeDef, TypeId, TypeTable};

/// Largest prefix of a value read by [`ValueRef::probe`].
const PROBE_LIMIT: u64 = 4096;

/// Services the debugger host provides to decoders.
pub trait Host {
	/// Type metadata for every id a value may carry.
	fn types(&self) -> &TypeTable;
	/// Fill `out` with target bytes starting at `addr`.
	fn read_memory(&self, addr: u64, out: &mut [u8]) -> Result<()>;
	/// Target pointer width in bytes.
	fn pointer_size(&self) -> usize;
	/// Target byte order.
	fn endianness(&self) -> Endianness {
		Endianness::Little
	}
}

/// Decoded primitive used for default formatting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
	/// Signed integer or enumerator.
	Signed(i64),
	/// Unsigned integer.
	Unsigned(u64),
	/// Floating point number.
	Float(f64),
	/// Boolean.
	Bool(bool),
	/// Character unit.
	Char(u8),
	/// Raw pointer value.
	Pointer(u64),
}

/// Transient view of a typed region of target memory.
///
/// Handles own nothing; they borrow the host and are only meaningful while
/// the target is stopped.
#[derive(Clone, Copy)]
pub struct ValueRef<'a> {
	host: &'a dyn Host,
	ty: TypeId,
	addr: u64,
}

impl fmt::Debug for ValueRef<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ValueRef")
			.field("ty", &self.ty)
			.field("type_name", &self.type_name())
			.field("addr", &format_args!("0x{:016x}", self.addr))
			.finish()
	}
}

impl PartialEq for ValueRef<'_> {
	fn eq(&self, other: &Self) -> bool {
		self.ty == other.ty && self.addr == other.addr
	}
}

impl<'a> ValueRef<'a> {
	/// Create a handle for `ty` located at `addr`.
	pub fn new(host: &'a dyn Host, ty: TypeId, addr: u64) -> Self {
		Self { host, ty, addr }
	}

	/// Host this handle reads through.
	pub fn host(&self) -> &'a dyn Host {
		self.host
	}

	/// Static type of the value.
	pub fn ty(&self) -> TypeId {
		self.ty
	}

	/// Address of the first byte.
	pub fn addr(&self) -> u64 {
		self.addr
	}

	/// Display name of the static type.
	pub fn type_name(&self) -> String {
		self.types().display_name(self.ty)
	}

	/// Byte size of the static type.
	pub fn size(&self) -> Result<u64> {
		self.types().size_of(self.ty, self.host.pointer_size())
	}

	fn types(&self) -> &'a TypeTable {
		self.host.types()
	}

	fn stripped(&self) -> Result<&'a TypeDef> {
		let types = self.types();
		types.get(types.strip_aliases(self.ty)?)
	}

	/// Follow a reference; any other value is returned unchanged.
	pub fn referent(&self) -> Result<ValueRef<'a>> {
		match self.stripped()? {
			TypeDef::Reference { target } => {
				let ptr = self.read_word()?;
				Ok(Self::new(self.host, *target, ptr))
			}
			_ => Ok(*self),
		}
	}

	/// Record layout of the value (through references and aliases).
	pub fn record(&self) -> Result<&'a RecordDef> {
		let value = self.referent()?;
		value.types().record(value.ty)?.ok_or_else(|| LensError::ExpectedRecord { type_name: value.type_name() })
	}

	/// Member access by name, searching base subobjects depth-first.
	pub fn field(&self, name: &str) -> Result<ValueRef<'a>> {
		let value = self.referent()?;
		let record = value.record()?;
		match find_field(value.types(), record, name, value.addr, 0)? {
			Some((ty, addr)) => Ok(Self::new(self.host, ty, addr)),
			None => Err(LensError::MissingField {
				type_name: value.type_name(),
				field: name.to_owned(),
			}),
		}
	}

	/// Whether [`ValueRef::field`] would find `name`.
	pub fn has_field(&self, name: &str) -> bool {
		self.field(name).is_ok()
	}

	/// Leading base-class subobject, if the record has one.
	pub fn first_base(&self) -> Result<Option<ValueRef<'a>>> {
		let value = self.referent()?;
		let record = value.record()?;
		record.bases().next().map(|base| -> Result<ValueRef<'a>> { Ok(Self::new(self.host, base.ty, offset_addr(value.addr, base.offset)?)) }).transpose()
	}

	/// All direct members in declaration order.
	pub fn fields(&self) -> Result<Vec<(&'a str, ValueRef<'a>)>> {
		let value = self.referent()?;
		let record = value.record()?;
		record
			.fields
			.iter()
			.map(|field| -> Result<(&'a str, ValueRef<'a>)> { Ok((field.name.as_ref(), Self::new(self.host, field.ty, offset_addr(value.addr, field.offset)?))) })
			.collect()
	}

	/// Check that the value's bytes are mapped.
	pub fn probe(&self) -> Result<()> {
		let len = self.size()?.min(PROBE_LIMIT) as usize;
		let mut buf = vec![0_u8; len];
		self.host.read_memory(self.addr, &mut buf)
	}

	/// Whether the value is a pointer (after aliases).
	pub fn is_pointer(&self) -> bool {
		matches!(self.stripped(), Ok(TypeDef::Pointer { .. }))
	}

	/// Read the address stored in a pointer value.
	pub fn read_pointer(&self) -> Result<u64> {
		match self.stripped()? {
			TypeDef::Pointer { .. } => self.read_word(),
			_ => Err(LensError::ExpectedPointer { type_name: self.type_name() }),
		}
	}

	/// Read a pointer and test it against the null address.
	pub fn is_null_pointer(&self) -> Result<bool> {
		Ok(self.read_pointer()? == 0)
	}

	/// Handle for the pointee of a pointer value.
	pub fn deref(&self) -> Result<ValueRef<'a>> {
		match self.stripped()? {
			TypeDef::Pointer { target } => {
				let ptr = self.read_word()?;
				Ok(Self::new(self.host, *target, ptr))
			}
			_ => Err(LensError::ExpectedPointer { type_name: self.type_name() }),
		}
	}

	/// Handle `n` elements further along, stepping by the value's own size.
	pub fn advance(&self, n: u64) -> Result<ValueRef<'a>> {
		let stride = self.size()?;
		let addr = stride
			.checked_mul(n)
			.and_then(|delta| self.addr.checked_add(delta))
			.ok_or(LensError::AddressOverflow { addr: self.addr })?;
		Ok(Self::new(self.host, self.ty, addr))
	}

	/// Number of elements of an inline array value.
	pub fn array_len(&self) -> Option<u64> {
		match self.stripped() {
			Ok(TypeDef::Array { len, .. }) => Some(*len),
			_ => None,
		}
	}

	/// Element `idx` of an inline array value.
	pub fn element(&self, idx: u64) -> Result<ValueRef<'a>> {
		match self.stripped()? {
			TypeDef::Array { element, .. } => Self::new(self.host, *element, self.addr).advance(idx),
			_ => Err(LensError::ExpectedRecord { type_name: self.type_name() }),
		}
	}

	/// Read an integer-like value (integers, chars, bools, enums) zero-extended.
	pub fn read_unsigned(&self) -> Result<u64> {
		match self.stripped()? {
			TypeDef::Primitive { encoding, size, .. } if *encoding != Encoding::Float => self.read_sized(*size),
			TypeDef::Enum { size, .. } => self.read_sized(*size),
			_ => Err(LensError::ExpectedInteger { type_name: self.type_name() }),
		}
	}

	/// Read a boolean flag.
	pub fn read_bool(&self) -> Result<bool> {
		Ok(self.read_unsigned()? != 0)
	}

	/// Decode a primitive, pointer, or enum; `None` for aggregates.
	pub fn scalar(&self) -> Result<Option<Scalar>> {
		let scalar = match self.stripped()? {
			TypeDef::Pointer { .. } => Scalar::Pointer(self.read_word()?),
			TypeDef::Enum { size, .. } => Scalar::Signed(sign_extend(self.read_sized(*size)?, *size)),
			TypeDef::Primitive { encoding, size, .. } => {
				let raw = self.read_sized(*size)?;
				match encoding {
					Encoding::Signed => Scalar::Signed(sign_extend(raw, *size)),
					Encoding::Unsigned => Scalar::Unsigned(raw),
					Encoding::Bool => Scalar::Bool(raw != 0),
					Encoding::Char => Scalar::Char(raw as u8),
					Encoding::Float => match size {
						4 => Scalar::Float(f64::from(f32::from_bits(raw as u32))),
						_ => Scalar::Float(f64::from_bits(raw)),
					},
				}
			}
			_ => return Ok(None),
		};
		Ok(Some(scalar))
	}

	/// Materialise the NUL-terminated string a pointer value points to.
	///
	/// At most `max_len` bytes are read; invalid UTF-8 is replaced.
	pub fn read_c_string(&self, max_len: usize) -> Result<String> {
		let ptr = self.read_pointer()?;
		let mut bytes = Vec::new();
		let mut byte = [0_u8; 1];
		while bytes.len() < max_len {
			let addr = ptr.checked_add(bytes.len() as u64).ok_or(LensError::AddressOverflow { addr: ptr })?;
			self.host.read_memory(addr, &mut byte)?;
			if byte[0] == 0 {
				break;
			}
			bytes.push(byte[0]);
		}
		Ok(String::from_utf8_lossy(&bytes).into_owned())
	}

	/// Template arguments of the record instantiation.
	pub fn template_args(&self) -> Result<&'a [TemplateArg]> {
		Ok(&self.record()?.template_args)
	}

	/// Render template argument `idx` the way a debugger prints it.
	pub fn template_arg_name(&self, idx: usize) -> Result<String> {
		let arg = self.template_args()?.get(idx).ok_or_else(|| LensError::MissingTemplateArg {
			type_name: self.type_name(),
			idx,
		})?;
		Ok(match arg {
			TemplateArg::Type(ty) => self.types().display_name(*ty),
			TemplateArg::Value(value) => value.to_string(),
		})
	}

	fn read_word(&self) -> Result<u64> {
		self.read_sized(self.host.pointer_size() as u64)
	}

	fn read_sized(&self, size: u64) -> Result<u64> {
		let len = match size {
			1 | 2 | 4 | 8 => size as usize,
			_ => return Err(LensError::UnsizedType { type_name: self.type_name() }),
		};
		let mut buf = [0_u8; 8];
		self.host.read_memory(self.addr, &mut buf[..len])?;
		Ok(self.host.endianness().read_uint(&buf[..len]))
	}
}

pub(crate) fn find_field(types: &TypeTable, record: &RecordDef, name: &str, addr: u64, depth: u32) -> Result<Option<(TypeId, u64)>> {
	if let Some(field) = record.field(name) {
		return Ok(Some((field.ty, offset_addr(addr, field.offset)?)));
	}
	if depth >= 32 {
		return Ok(None);
	}
	for base in record.bases() {
		let Some(base_record) = types.record(base.ty)? else {
			continue;
		};
		if let Some(found) = find_field(types, base_record, name, offset_addr(addr, base.offset)?, depth + 1)? {
			return Ok(Some(found));
		}
	}
	Ok(None)
}

fn offset_addr(addr: u64, offset: u64) -> Result<u64> {
	addr.checked_add(offset).ok_or(LensError::AddressOverflow { addr })
}

fn sign_extend(raw: u64, size: u64) -> i64 {
	match size {
		1 => i64::from(raw as u8 as i8),
		2 => i64::from(raw as u16 as i16),
		4 => i64::from(raw as u32 as i32),
		_ => raw as i64,
	}
}

#[cfg(test)]
mod tests;
