use serde::{Deserialize, Serialize};

use crate::lens::{LensError, Result};

/// Byte order of target integers and pointers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endianness {
	/// Least significant byte first.
	#[default]
	Little,
	/// Most significant byte first.
	Big,
}

impl Endianness {
	/// Widen `bytes` (1, 2, 4 or 8 long) to an unsigned integer.
	pub fn read_uint(self, bytes: &[u8]) -> u64 {
		let mut buf = [0_u8; 8];
		match self {
			Self::Little => {
				buf[..bytes.len()].copy_from_slice(bytes);
				u64::from_le_bytes(buf)
			}
			Self::Big => {
				buf[8 - bytes.len()..].copy_from_slice(bytes);
				u64::from_be_bytes(buf)
			}
		}
	}

	/// Encode the low `size` bytes of `value`.
	pub fn write_uint(self, value: u64, size: usize) -> Vec<u8> {
		match self {
			Self::Little => value.to_le_bytes()[..size].to_vec(),
			Self::Big => value.to_be_bytes()[8 - size..].to_vec(),
		}
	}
}

/// Read-only access to target memory.
pub trait Memory {
	/// Fill `out` with the bytes starting at `addr`.
	fn read(&self, addr: u64, out: &mut [u8]) -> Result<()>;
}

/// One contiguous mapped range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
	/// First mapped address.
	pub addr: u64,
	/// Region contents.
	pub bytes: Vec<u8>,
}

impl Region {
	/// Exclusive end address.
	pub fn end(&self) -> u64 {
		self.addr.saturating_add(self.bytes.len() as u64)
	}
}

/// Sorted, non-overlapping set of regions.
#[derive(Debug, Clone, Default)]
pub struct MemoryMap {
	starts: Vec<u64>,
	regions: Vec<Region>,
}

impl MemoryMap {
	/// Sort regions and reject overlaps.
	pub fn from_regions(mut regions: Vec<Region>) -> Result<Self> {
		regions.retain(|region| !region.bytes.is_empty());
		regions.sort_by_key(|region| region.addr);
		for pair in regions.windows(2) {
			if pair[1].addr < pair[0].end() {
				return Err(LensError::OverlappingRegions { addr: pair[1].addr });
			}
		}
		let starts = regions.iter().map(|region| region.addr).collect();
		Ok(Self { starts, regions })
	}

	/// Return mapped regions in address order.
	pub fn regions(&self) -> &[Region] {
		&self.regions
	}

	/// Return the bytes `[addr, addr + len)` when a single region covers them.
	pub fn slice(&self, addr: u64, len: usize) -> Option<&[u8]> {
		if addr == 0 {
			return None;
		}

		let idx = self.starts.partition_point(|start| *start <= addr);
		if idx == 0 {
			return None;
		}

		let region = &self.regions[idx - 1];
		let start = usize::try_from(addr - region.addr).ok()?;
		let end = start.checked_add(len)?;
		region.bytes.get(start..end)
	}
}

impl Memory for MemoryMap {
	fn read(&self, addr: u64, out: &mut [u8]) -> Result<()> {
		let bytes = self.slice(addr, out.len()).ok_or(LensError::MemoryRead { addr, len: out.len() })?;
		out.copy_from_slice(bytes);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::{Endianness, Memory, MemoryMap, Region};
	use crate::lens::LensError;

	#[test]
	fn read_inside_region_succeeds_and_straddling_read_fails() {
		let map = MemoryMap::from_regions(vec![
			Region {
				addr: 0x2000,
				bytes: vec![5, 6, 7, 8],
			},
			Region {
				addr: 0x1000,
				bytes: vec![1, 2, 3, 4],
			},
		])
		.expect("regions are disjoint");

		let mut out = [0_u8; 2];
		map.read(0x1002, &mut out).expect("mapped read");
		assert_eq!(out, [3, 4]);

		let err = map.read(0x1003, &mut out).expect_err("crosses region end");
		assert!(matches!(err, LensError::MemoryRead { addr: 0x1003, len: 2 }));
	}

	#[test]
	fn null_page_is_never_mapped() {
		let map = MemoryMap::from_regions(vec![Region { addr: 0, bytes: vec![0; 16] }]).expect("single region");
		let mut out = [0_u8; 1];
		assert!(map.read(0, &mut out).is_err());
		assert!(map.read(1, &mut out).is_ok());
	}

	#[test]
	fn overlapping_regions_are_rejected() {
		let err = MemoryMap::from_regions(vec![Region { addr: 0x10, bytes: vec![0; 8] }, Region { addr: 0x14, bytes: vec![0; 8] }]).expect_err("overlap");
		assert!(matches!(err, LensError::OverlappingRegions { addr: 0x14 }));
	}

	#[test]
	fn big_endian_widening_keeps_value() {
		let bytes = Endianness::Big.write_uint(0x0102_0304, 4);
		assert_eq!(bytes, vec![1, 2, 3, 4]);
		assert_eq!(Endianness::Big.read_uint(&bytes), 0x0102_0304);
		assert_eq!(Endianness::Little.read_uint(&[0x34, 0x12]), 0x1234);
	}
}
