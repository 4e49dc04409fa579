use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, LensError>;

/// Errors produced while loading images, resolving types, and decoding containers.
#[derive(Debug, Error)]
pub enum LensError {
	/// Filesystem or stream IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Image JSON could not be parsed or written.
	#[error("json: {0}")]
	Json(#[from] serde_json::Error),
	/// Unknown leading file magic.
	#[error("unsupported compression or not a core image (magic={magic:?})")]
	UnknownMagic {
		/// First up-to-4 bytes of the stream.
		magic: [u8; 4],
	},
	/// Decompressed stream did not start with a JSON object.
	#[error("decompressed data is not a core image")]
	NotImageAfterDecompress,
	/// Decompression output exceeded configured safety limit.
	#[error("decompressed output exceeded limit {limit} bytes")]
	DecompressedTooLarge {
		/// Maximum allowed output bytes.
		limit: usize,
	},
	/// Pointer size other than 4 or 8 bytes.
	#[error("unsupported pointer size {size}")]
	UnsupportedPointerSize {
		/// Declared pointer size in bytes.
		size: usize,
	},
	/// Out-of-range index inside the type table.
	#[error("type index out of range for {kind}: idx={idx}, max={max}")]
	TypeIndexOutOfRange {
		/// Logical index kind being validated.
		kind: &'static str,
		/// Offending index value.
		idx: u32,
		/// Maximum valid index.
		max: u32,
	},
	/// Typedef/qualifier/reference chain did not bottom out.
	#[error("type alias chain too deep at type #{ty} (max={max_depth})")]
	TypeChainTooDeep {
		/// Type id where the walk gave up.
		ty: u32,
		/// Configured depth ceiling.
		max_depth: u32,
	},
	/// Two memory regions claim the same address.
	#[error("memory regions overlap at 0x{addr:016x}")]
	OverlappingRegions {
		/// Start address of the later region.
		addr: u64,
	},
	/// Type tag does not have the `identifier(<...>)?` shape.
	#[error("invalid type tag: {tag}")]
	MalformedTag {
		/// Offending tag text.
		tag: String,
	},
	/// Decoder family registered without a name.
	#[error("decoder family name must not be empty")]
	EmptyFamilyName,
	/// Target memory could not be read.
	#[error("cannot read {len} bytes at 0x{addr:016x}")]
	MemoryRead {
		/// First address of the failed read.
		addr: u64,
		/// Requested length.
		len: usize,
	},
	/// Record has no field with the requested name.
	#[error("missing field {field} on {type_name}")]
	MissingField {
		/// Record type name.
		type_name: String,
		/// Requested field name.
		field: String,
	},
	/// Operation needs a pointer but the value is not one.
	#[error("expected pointer, got {type_name}")]
	ExpectedPointer {
		/// Actual type name.
		type_name: String,
	},
	/// Operation needs an integer but the value is not one.
	#[error("expected integer, got {type_name}")]
	ExpectedInteger {
		/// Actual type name.
		type_name: String,
	},
	/// Operation needs a record but the value is not one.
	#[error("expected record, got {type_name}")]
	ExpectedRecord {
		/// Actual type name.
		type_name: String,
	},
	/// Type has no known byte size.
	#[error("type {type_name} has no usable size")]
	UnsizedType {
		/// Type name.
		type_name: String,
	},
	/// Template argument index not present on the record.
	#[error("missing template argument {idx} on {type_name}")]
	MissingTemplateArg {
		/// Record type name.
		type_name: String,
		/// Requested argument index.
		idx: usize,
	},
	/// None of the known physical layouts matched the record.
	#[error("unknown layout for {type_name}: expected one of {expected}")]
	UnknownLayout {
		/// Record type name.
		type_name: String,
		/// Human-readable list of accepted layouts.
		expected: &'static str,
	},
	/// Requested symbol is absent from the image.
	#[error("symbol not found: {name}")]
	UnknownSymbol {
		/// Requested symbol name.
		name: String,
	},
	/// Address arithmetic wrapped around.
	#[error("address overflow from 0x{addr:016x}")]
	AddressOverflow {
		/// Base address of the failed computation.
		addr: u64,
	},
	/// Stored element count is inconsistent with the container layout.
	#[error("invalid count {count} for {type_name}")]
	InvalidCount {
		/// Container type name.
		type_name: String,
		/// Offending count.
		count: u64,
	},
}
