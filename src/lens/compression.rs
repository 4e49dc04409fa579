use std::io::Read;

use crate::lens::{LensError, Result};

const MAX_DECOMPRESSED_BYTES: usize = 512 * 1024 * 1024;
/// zstd frame magic used by compressed core images.
pub const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Compression mode detected for an image file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
	/// Plain JSON.
	None,
	/// zstd-compressed JSON.
	Zstd,
}

impl Compression {
	/// Render compression mode as a stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::None => "none",
			Self::Zstd => "zstd",
		}
	}
}

/// Detect and decode compression, returning `(mode, json_bytes)`.
pub fn decode_bytes(raw: Vec<u8>) -> Result<(Compression, Vec<u8>)> {
	if looks_like_json(&raw) {
		return Ok((Compression::None, raw));
	}

	if raw.starts_with(&ZSTD_MAGIC) {
		let out = decode_zstd(&raw)?;
		return Ok((Compression::Zstd, out));
	}

	Err(LensError::UnknownMagic { magic: first4(&raw) })
}

/// Compress serialised image bytes.
pub fn encode_bytes(json: &[u8], compression: Compression) -> Result<Vec<u8>> {
	match compression {
		Compression::None => Ok(json.to_vec()),
		Compression::Zstd => Ok(zstd::stream::encode_all(json, 3)?),
	}
}

fn decode_zstd(raw: &[u8]) -> Result<Vec<u8>> {
	let mut decoder = zstd::stream::read::Decoder::new(raw)?;
	let mut out = Vec::new();
	let mut buf = [0_u8; 8192];

	loop {
		let read = decoder.read(&mut buf)?;
		if read == 0 {
			break;
		}

		if out.len() + read > MAX_DECOMPRESSED_BYTES {
			return Err(LensError::DecompressedTooLarge { limit: MAX_DECOMPRESSED_BYTES });
		}

		out.extend_from_slice(&buf[..read]);
	}

	if !looks_like_json(&out) {
		return Err(LensError::NotImageAfterDecompress);
	}

	Ok(out)
}

fn looks_like_json(bytes: &[u8]) -> bool {
	bytes.iter().find(|byte| !byte.is_ascii_whitespace()) == Some(&b'{')
}

fn first4(bytes: &[u8]) -> [u8; 4] {
	let mut magic = [0_u8; 4];
	let take = bytes.len().min(4);
	magic[..take].copy_from_slice(&bytes[..take]);
	magic
}

#[cfg(test)]
mod tests {
	use super::{Compression, decode_bytes, encode_bytes};
	use crate::lens::LensError;

	#[test]
	fn plain_json_passes_through() {
		let (mode, bytes) = decode_bytes(b"  {\"types\": []}".to_vec()).expect("json");
		assert_eq!(mode, Compression::None);
		assert!(bytes.ends_with(b"}"));
	}

	#[test]
	fn zstd_round_trip_is_detected() {
		let packed = encode_bytes(b"{}", Compression::Zstd).expect("compress");
		let (mode, bytes) = decode_bytes(packed).expect("decompress");
		assert_eq!(mode, Compression::Zstd);
		assert_eq!(bytes, b"{}");
	}

	#[test]
	fn unknown_magic_is_reported() {
		let err = decode_bytes(b"ELF\x7f....".to_vec()).expect_err("not an image");
		assert!(matches!(err, LensError::UnknownMagic { magic } if &magic == b"ELF\x7f"));
	}
}
