use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::lens::compression::{decode_bytes, encode_bytes};
use crate::lens::{Compression, Endianness, Host, LensError, Memory, MemoryMap, Region, Result, TypeDef, TypeId, TypeTable, ValueRef};

/// On-disk form of a core image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageFile {
	/// Target pointer width in bytes.
	#[serde(default = "default_pointer_size")]
	pub pointer_size: usize,
	/// Target byte order.
	#[serde(default)]
	pub endianness: Endianness,
	/// Type table in id order.
	pub types: Vec<TypeDef>,
	/// Mapped memory.
	#[serde(default)]
	pub regions: Vec<Region>,
	/// Named values.
	#[serde(default)]
	pub symbols: Vec<Symbol>,
}

/// Named, typed location in the image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
	/// Lookup name.
	pub name: Box<str>,
	/// Static type.
	pub ty: TypeId,
	/// Address of the value.
	pub addr: u64,
}

/// Frozen process snapshot: types, memory, and symbols.
#[derive(Debug)]
pub struct CoreImage {
	pointer_size: usize,
	endianness: Endianness,
	types: TypeTable,
	memory: MemoryMap,
	symbols: Vec<Symbol>,
}

fn default_pointer_size() -> usize {
	8
}

impl CoreImage {
	/// Read an image file, plain or zstd-compressed.
	pub fn open(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let raw = fs::read(path)?;
		let (compression, bytes) = decode_bytes(raw)?;
		let file: ImageFile = serde_json::from_slice(&bytes)?;
		tracing::debug!(path = %path.display(), compression = compression.as_str(), types = file.types.len(), "loaded core image");
		Self::from_file(file)
	}

	/// Validate and index a parsed image.
	pub fn from_file(file: ImageFile) -> Result<Self> {
		let types = TypeTable::from_defs(file.types)?;
		let memory = MemoryMap::from_regions(file.regions)?;
		Self::from_parts(file.pointer_size, file.endianness, types, memory, file.symbols)
	}

	/// Assemble an image from already-built parts.
	pub fn from_parts(pointer_size: usize, endianness: Endianness, types: TypeTable, memory: MemoryMap, symbols: Vec<Symbol>) -> Result<Self> {
		if !matches!(pointer_size, 4 | 8) {
			return Err(LensError::UnsupportedPointerSize { size: pointer_size });
		}
		for symbol in &symbols {
			types.get(symbol.ty)?;
		}
		Ok(Self {
			pointer_size,
			endianness,
			types,
			memory,
			symbols,
		})
	}

	/// Serialisable copy of the image.
	pub fn to_file(&self) -> ImageFile {
		ImageFile {
			pointer_size: self.pointer_size,
			endianness: self.endianness,
			types: self.types.defs().to_vec(),
			regions: self.memory.regions().to_vec(),
			symbols: self.symbols.clone(),
		}
	}

	/// Write the image as JSON, optionally zstd-compressed.
	pub fn save(&self, path: impl AsRef<Path>, compression: Compression) -> Result<()> {
		let json = serde_json::to_vec(&self.to_file())?;
		let bytes = encode_bytes(&json, compression)?;
		fs::write(path, bytes)?;
		Ok(())
	}

	/// All symbols in declaration order.
	pub fn symbols(&self) -> &[Symbol] {
		&self.symbols
	}

	/// Look up a symbol by name.
	pub fn symbol(&self, name: &str) -> Result<&Symbol> {
		self.symbols
			.iter()
			.find(|symbol| symbol.name.as_ref() == name)
			.ok_or_else(|| LensError::UnknownSymbol { name: name.to_owned() })
	}

	/// Value handle for a symbol.
	pub fn value(&self, name: &str) -> Result<ValueRef<'_>> {
		let symbol = self.symbol(name)?;
		Ok(ValueRef::new(self, symbol.ty, symbol.addr))
	}
}

impl Host for CoreImage {
	fn types(&self) -> &TypeTable {
		&self.types
	}

	fn read_memory(&self, addr: u64, out: &mut [u8]) -> Result<()> {
		self.memory.read(addr, out)
	}

	fn pointer_size(&self) -> usize {
		self.pointer_size
	}

	fn endianness(&self) -> Endianness {
		self.endianness
	}
}

#[cfg(test)]
mod tests {
	use super::{CoreImage, ImageFile};
	use crate::lens::{Compression, Host, ImageBuilder, LensError};

	#[test]
	fn parses_minimal_json_image() {
		let json = r#"{
			"types": [
				{"kind": "primitive", "name": "int", "size": 4, "encoding": "signed"},
				{"kind": "record", "tag": "Point", "size": 8, "fields": [
					{"name": "x", "ty": 0, "offset": 0},
					{"name": "y", "ty": 0, "offset": 4}
				]}
			],
			"regions": [{"addr": 4096, "bytes": [1, 0, 0, 0, 254, 255, 255, 255]}],
			"symbols": [{"name": "origin", "ty": 1, "addr": 4096}]
		}"#;
		let file: ImageFile = serde_json::from_str(json).expect("valid json");
		let image = CoreImage::from_file(file).expect("valid image");

		assert_eq!(image.pointer_size(), 8);
		let origin = image.value("origin").expect("symbol");
		assert_eq!(origin.type_name(), "Point");
		assert_eq!(origin.field("x").expect("x").read_unsigned().expect("read"), 1);
		assert_eq!(origin.field("y").expect("y").read_unsigned().expect("read"), 0xffff_fffe);
	}

	#[test]
	fn symbol_with_unknown_type_is_rejected() {
		let json = r#"{"types": [], "symbols": [{"name": "x", "ty": 3, "addr": 16}]}"#;
		let file: ImageFile = serde_json::from_str(json).expect("valid json");
		assert!(matches!(CoreImage::from_file(file), Err(LensError::TypeIndexOutOfRange { .. })));
	}

	#[test]
	fn saved_image_reopens_with_same_symbols() {
		let mut builder = ImageBuilder::new(8).expect("pointer size");
		let int = builder.int();
		let addr = builder.alloc_value(int).expect("alloc");
		builder.write_uint(addr, 4, 42).expect("write");
		builder.symbol("answer", int, addr);
		let image = builder.finish().expect("image");

		let dir = tempfile::tempdir().expect("tempdir");
		for (name, mode) in [("plain.json", Compression::None), ("packed.json.zst", Compression::Zstd)] {
			let path = dir.path().join(name);
			image.save(&path, mode).expect("save");
			let reopened = CoreImage::open(&path).expect("reopen");
			let value = reopened.value("answer").expect("symbol");
			assert_eq!(value.read_unsigned().expect("read"), 42);
		}
	}
}
