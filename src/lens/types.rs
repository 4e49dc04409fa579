use serde::{Deserialize, Serialize};

use crate::lens::{LensError, Result};

/// Maximum number of typedef/qualifier hops followed before giving up.
const MAX_ALIAS_DEPTH: u32 = 32;

/// Index of a type inside a [`TypeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(pub u32);

impl TypeId {
	/// Return the table slot for this id.
	pub fn index(self) -> usize {
		self.0 as usize
	}
}

/// Scalar interpretation of a primitive type's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
	/// Two's-complement signed integer.
	Signed,
	/// Unsigned integer.
	Unsigned,
	/// IEEE-754 float (4 or 8 bytes).
	Float,
	/// Boolean, zero is false.
	Bool,
	/// Character unit.
	Char,
}

/// One type declaration as exposed by the debugger host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDef {
	/// Builtin scalar.
	Primitive {
		/// Source-level name (`int`, `char`, ...).
		name: Box<str>,
		/// Size in bytes.
		size: u64,
		/// Byte interpretation.
		encoding: Encoding,
	},
	/// Pointer to `target`.
	Pointer {
		/// Pointee type.
		target: TypeId,
	},
	/// Reference to `target`.
	Reference {
		/// Referent type.
		target: TypeId,
	},
	/// cv-qualified `target`.
	Qualified {
		/// Unqualified type.
		target: TypeId,
		/// `const` qualifier.
		#[serde(default)]
		is_const: bool,
		/// `volatile` qualifier.
		#[serde(default)]
		is_volatile: bool,
	},
	/// Named alias of `target`.
	Typedef {
		/// Alias name.
		name: Box<str>,
		/// Aliased type.
		target: TypeId,
	},
	/// Struct or class with a tag.
	Record(RecordDef),
	/// Enumeration with a tag.
	Enum {
		/// Enumeration tag.
		tag: Box<str>,
		/// Size in bytes.
		size: u64,
	},
	/// Fixed-length inline array.
	Array {
		/// Element type.
		element: TypeId,
		/// Number of elements.
		len: u64,
	},
}

/// Struct/class layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordDef {
	/// Fully qualified tag including template arguments.
	pub tag: Box<str>,
	/// Size in bytes.
	pub size: u64,
	/// Fields in declaration order, base subobjects first.
	#[serde(default)]
	pub fields: Vec<FieldDef>,
	/// Template arguments of the instantiation.
	#[serde(default)]
	pub template_args: Vec<TemplateArg>,
}

/// One record member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
	/// Member name; base subobjects are named after the base tag.
	pub name: Box<str>,
	/// Member type.
	pub ty: TypeId,
	/// Byte offset from the start of the record.
	pub offset: u64,
	/// Whether this member is a base-class subobject.
	#[serde(default)]
	pub base: bool,
}

/// Template argument of a record instantiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateArg {
	/// Type parameter.
	Type(TypeId),
	/// Non-type parameter.
	Value(i64),
}

impl RecordDef {
	/// Find a direct member by name.
	pub fn field(&self, name: &str) -> Option<&FieldDef> {
		self.fields.iter().find(|field| field.name.as_ref() == name)
	}

	/// Iterate base-class subobjects in declaration order.
	pub fn bases(&self) -> impl Iterator<Item = &FieldDef> {
		self.fields.iter().filter(|field| field.base)
	}
}

/// Dense type table indexed by [`TypeId`].
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
	defs: Vec<TypeDef>,
}

impl TypeTable {
	/// Create an empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Build a table and check that every referenced id exists.
	pub fn from_defs(defs: Vec<TypeDef>) -> Result<Self> {
		let len = defs.len();
		for def in &defs {
			match def {
				TypeDef::Primitive { .. } | TypeDef::Enum { .. } => {}
				TypeDef::Pointer { target } | TypeDef::Reference { target } => check_index("pointer.target", *target, len)?,
				TypeDef::Qualified { target, .. } => check_index("qualified.target", *target, len)?,
				TypeDef::Typedef { target, .. } => check_index("typedef.target", *target, len)?,
				TypeDef::Array { element, .. } => check_index("array.element", *element, len)?,
				TypeDef::Record(record) => {
					for field in &record.fields {
						check_index("field.ty", field.ty, len)?;
					}
					for arg in &record.template_args {
						if let TemplateArg::Type(ty) = arg {
							check_index("template_arg", *ty, len)?;
						}
					}
				}
			}
		}
		Ok(Self { defs })
	}

	/// Append a declaration and return its id.
	pub fn push(&mut self, def: TypeDef) -> TypeId {
		let id = TypeId(self.defs.len() as u32);
		self.defs.push(def);
		id
	}

	/// Look up a declaration.
	pub fn get(&self, id: TypeId) -> Result<&TypeDef> {
		self.defs.get(id.index()).ok_or(LensError::TypeIndexOutOfRange {
			kind: "type",
			idx: id.0,
			max: self.defs.len().saturating_sub(1) as u32,
		})
	}

	/// Return all declarations in id order.
	pub fn defs(&self) -> &[TypeDef] {
		&self.defs
	}

	/// Return number of declarations.
	pub fn len(&self) -> usize {
		self.defs.len()
	}

	/// Return whether the table is empty.
	pub fn is_empty(&self) -> bool {
		self.defs.is_empty()
	}

	/// Strip qualifiers and typedef layers.
	pub fn strip_aliases(&self, id: TypeId) -> Result<TypeId> {
		let mut current = id;
		for _ in 0..MAX_ALIAS_DEPTH {
			match self.get(current)? {
				TypeDef::Qualified { target, .. } | TypeDef::Typedef { target, .. } => current = *target,
				_ => return Ok(current),
			}
		}
		Err(LensError::TypeChainTooDeep {
			ty: id.0,
			max_depth: MAX_ALIAS_DEPTH,
		})
	}

	/// Return the record behind `id` after stripping aliases, if any.
	pub fn record(&self, id: TypeId) -> Result<Option<&RecordDef>> {
		match self.get(self.strip_aliases(id)?)? {
			TypeDef::Record(record) => Ok(Some(record)),
			_ => Ok(None),
		}
	}

	/// Find the first record declared with exactly `tag`.
	pub fn find_tag(&self, tag: &str) -> Option<TypeId> {
		self.defs.iter().position(|def| matches!(def, TypeDef::Record(record) if record.tag.as_ref() == tag)).map(|idx| TypeId(idx as u32))
	}

	/// Byte size of a type for the given pointer width.
	pub fn size_of(&self, id: TypeId, pointer_size: usize) -> Result<u64> {
		self.size_impl(id, pointer_size as u64, 0)
	}

	/// Natural alignment of a type for the given pointer width.
	pub fn align_of(&self, id: TypeId, pointer_size: usize) -> Result<u64> {
		self.align_impl(id, pointer_size as u64, 0)
	}

	/// Render a C++-like display name.
	pub fn display_name(&self, id: TypeId) -> String {
		self.name_impl(id, 0)
	}

	fn size_impl(&self, id: TypeId, pointer_size: u64, depth: u32) -> Result<u64> {
		if depth >= MAX_ALIAS_DEPTH {
			return Err(LensError::TypeChainTooDeep {
				ty: id.0,
				max_depth: MAX_ALIAS_DEPTH,
			});
		}
		match self.get(id)? {
			TypeDef::Primitive { size, .. } | TypeDef::Enum { size, .. } => Ok(*size),
			TypeDef::Record(record) => Ok(record.size),
			TypeDef::Pointer { .. } | TypeDef::Reference { .. } => Ok(pointer_size),
			TypeDef::Qualified { target, .. } | TypeDef::Typedef { target, .. } => self.size_impl(*target, pointer_size, depth + 1),
			TypeDef::Array { element, len } => {
				let element_size = self.size_impl(*element, pointer_size, depth + 1)?;
				element_size.checked_mul(*len).ok_or_else(|| LensError::UnsizedType { type_name: self.display_name(id) })
			}
		}
	}

	fn align_impl(&self, id: TypeId, pointer_size: u64, depth: u32) -> Result<u64> {
		if depth >= MAX_ALIAS_DEPTH {
			return Err(LensError::TypeChainTooDeep {
				ty: id.0,
				max_depth: MAX_ALIAS_DEPTH,
			});
		}
		match self.get(id)? {
			TypeDef::Primitive { size, .. } | TypeDef::Enum { size, .. } => Ok((*size).clamp(1, pointer_size.max(8))),
			TypeDef::Pointer { .. } | TypeDef::Reference { .. } => Ok(pointer_size),
			TypeDef::Qualified { target, .. } | TypeDef::Typedef { target, .. } => self.align_impl(*target, pointer_size, depth + 1),
			TypeDef::Array { element, .. } => self.align_impl(*element, pointer_size, depth + 1),
			TypeDef::Record(record) => {
				let mut align = 1;
				for field in &record.fields {
					align = align.max(self.align_impl(field.ty, pointer_size, depth + 1)?);
				}
				Ok(align)
			}
		}
	}

	fn name_impl(&self, id: TypeId, depth: u32) -> String {
		if depth >= MAX_ALIAS_DEPTH {
			return "<...>".to_owned();
		}
		let Ok(def) = self.get(id) else {
			return format!("<invalid #{}>", id.0);
		};
		match def {
			TypeDef::Primitive { name, .. } | TypeDef::Typedef { name, .. } => name.to_string(),
			TypeDef::Record(record) => record.tag.to_string(),
			TypeDef::Enum { tag, .. } => tag.to_string(),
			TypeDef::Pointer { target } => format!("{}*", self.name_impl(*target, depth + 1)),
			TypeDef::Reference { target } => format!("{}&", self.name_impl(*target, depth + 1)),
			TypeDef::Array { element, len } => format!("{}[{len}]", self.name_impl(*element, depth + 1)),
			TypeDef::Qualified {
				target,
				is_const,
				is_volatile,
			} => {
				let inner = self.name_impl(*target, depth + 1);
				match (is_const, is_volatile) {
					(true, true) => format!("const volatile {inner}"),
					(true, false) => format!("const {inner}"),
					(false, true) => format!("volatile {inner}"),
					(false, false) => inner,
				}
			}
		}
	}
}

fn check_index(kind: &'static str, id: TypeId, len: usize) -> Result<()> {
	if id.index() >= len {
		return Err(LensError::TypeIndexOutOfRange {
			kind,
			idx: id.0,
			max: len.saturating_sub(1) as u32,
		});
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::{Encoding, RecordDef, TypeDef, TypeId, TypeTable};
	use crate::lens::LensError;

	fn int() -> TypeDef {
		TypeDef::Primitive {
			name: "int".into(),
			size: 4,
			encoding: Encoding::Signed,
		}
	}

	#[test]
	fn from_defs_rejects_dangling_pointer_target() {
		let err = TypeTable::from_defs(vec![int(), TypeDef::Pointer { target: TypeId(7) }]).expect_err("dangling target");
		assert!(matches!(err, LensError::TypeIndexOutOfRange { idx: 7, max: 1, .. }));
	}

	#[test]
	fn strip_aliases_reaches_record_through_typedef_and_const() {
		let mut table = TypeTable::new();
		let record = table.push(TypeDef::Record(RecordDef {
			tag: "Korin::Array<int>".into(),
			size: 24,
			fields: Vec::new(),
			template_args: Vec::new(),
		}));
		let alias = table.push(TypeDef::Typedef {
			name: "IntArray".into(),
			target: record,
		});
		let konst = table.push(TypeDef::Qualified {
			target: alias,
			is_const: true,
			is_volatile: false,
		});

		assert_eq!(table.strip_aliases(konst).expect("strip"), record);
		assert_eq!(table.display_name(konst), "const IntArray");
		assert_eq!(table.size_of(konst, 8).expect("size"), 24);
	}

	#[test]
	fn self_referencing_typedef_is_reported() {
		let mut table = TypeTable::new();
		let id = table.push(TypeDef::Typedef {
			name: "Loop".into(),
			target: TypeId(0),
		});
		let err = table.strip_aliases(id).expect_err("loop");
		assert!(matches!(err, LensError::TypeChainTooDeep { ty: 0, .. }));
	}

	#[test]
	fn pointer_and_array_names_render_like_cpp() {
		let mut table = TypeTable::new();
		let int = table.push(int());
		let ptr = table.push(TypeDef::Pointer { target: int });
		let arr = table.push(TypeDef::Array { element: int, len: 3 });

		assert_eq!(table.display_name(ptr), "int*");
		assert_eq!(table.display_name(arr), "int[3]");
		assert_eq!(table.size_of(arr, 8).expect("size"), 12);
		assert_eq!(table.size_of(ptr, 4).expect("size"), 4);
	}
}
