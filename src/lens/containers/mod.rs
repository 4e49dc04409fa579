mod array;
mod hash;
mod list;
mod optional;
mod pair;
mod queue;
mod string;
mod tree;
mod tuple;

/// Positional buffer decoders.
pub use array::{ArrayDecoder, array, array_base};
/// Open-chained hash table decoders.
pub use hash::{HashDecoder, hash_map, hash_set, hash_table};
/// Singly linked list decoder.
pub use list::{ListDecoder, list};
/// Optional value decoder.
pub use optional::{OptionalDecoder, optional};
/// Two-member pair decoder.
pub use pair::{PairDecoder, pair};
/// Ring buffer decoder.
pub use queue::{CircularQueueDecoder, circular_queue};
/// String decoder and its two buffer layouts.
pub use string::{StringDecoder, StringLayout, string};
/// Threaded binary tree decoders.
pub use tree::{TreeDecoder, map, set, tree};
/// Inheritance-chain tuple decoder.
pub use tuple::{TupleDecoder, tuple};

use crate::lens::{LensError, Result, ValueRef};

/// Render `Family<A, B>` from the first `arity` template arguments.
fn generic_name(value: &ValueRef<'_>, family: &str, arity: usize) -> Result<String> {
	let args = (0..arity).map(|idx| value.template_arg_name(idx)).collect::<Result<Vec<_>>>()?;
	Ok(format!("{family}<{}>", args.join(", ")))
}

/// Render `Family<A, B>[count]`.
fn sized_summary(value: &ValueRef<'_>, family: &str, arity: usize, count: u64) -> Result<String> {
	Ok(format!("{}[{count}]", generic_name(value, family, arity)?))
}

/// Read an integer member.
fn read_count(value: &ValueRef<'_>, field: &str) -> Result<u64> {
	value.field(field)?.read_unsigned()
}

/// Check that the layout declares `names`, without reading them.
fn require_fields(value: &ValueRef<'_>, names: &[&str]) -> Result<()> {
	for name in names {
		value.field(name)?;
	}
	Ok(())
}

/// Reject element counts a buffer of `capacity` slots cannot hold.
fn check_capacity(value: &ValueRef<'_>, count: u64, capacity: u64) -> Result<()> {
	if count > capacity {
		return Err(LensError::InvalidCount {
			type_name: value.type_name(),
			count,
		});
	}
	Ok(())
}
