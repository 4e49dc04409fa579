use crate::lens::{LensError, Result, TypeDef, TypeId, TypeTable};

/// Reduce a type to the tag of its underlying record or enum.
///
/// References are followed first, then qualifiers and typedefs are stripped.
/// Types without a tag (primitives, pointers, arrays) yield `None`.
pub fn decay(types: &TypeTable, ty: TypeId) -> Result<Option<&str>> {
	let ty = match types.get(ty)? {
		TypeDef::Reference { target } => *target,
		_ => ty,
	};

	match types.get(types.strip_aliases(ty)?)? {
		TypeDef::Record(record) => Ok(Some(&*record.tag)),
		TypeDef::Enum { tag, .. } => Ok(Some(&**tag)),
		_ => Ok(None),
	}
}

/// Strip the template argument list from a tag.
///
/// Accepts `path` or `path<...>` where `path` is a scoped identifier; any
/// other shape is a [`LensError::MalformedTag`].
pub fn template_free_name(tag: &str) -> Result<&str> {
	let malformed = || LensError::MalformedTag { tag: tag.to_owned() };

	let path_end = tag.find(|ch: char| !is_path_char(ch)).unwrap_or(tag.len());
	let (path, rest) = tag.split_at(path_end);

	if !path.starts_with(is_word_char) {
		return Err(malformed());
	}
	if rest.is_empty() {
		return Ok(path);
	}
	if rest.starts_with('<') && rest.ends_with('>') && rest.len() >= 2 {
		return Ok(path);
	}
	Err(malformed())
}

fn is_word_char(ch: char) -> bool {
	ch.is_alphanumeric() || ch == '_'
}

fn is_path_char(ch: char) -> bool {
	is_word_char(ch) || ch == ':' || ch == '.'
}

#[cfg(test)]
mod tests {
	use super::{decay, template_free_name};
	use crate::lens::{ImageBuilder, LensError};

	#[test]
	fn template_arguments_are_stripped() {
		assert_eq!(template_free_name("Korin::Array<int>").expect("tag"), "Korin::Array");
		assert_eq!(template_free_name("Korin::Map<int, Korin::Pair<char, float>>").expect("tag"), "Korin::Map");
		assert_eq!(template_free_name("Plain").expect("tag"), "Plain");
		assert_eq!(template_free_name("std.collections.Vec").expect("tag"), "std.collections.Vec");
		assert_eq!(template_free_name("A").expect("single character"), "A");
		assert_eq!(template_free_name("T<int>").expect("single character"), "T");
	}

	#[test]
	fn unsupported_tag_shapes_are_malformed() {
		for tag in ["", "(anonymous namespace)::Foo", "Korin::List<int>::Iterator", "<lambda>", "::Leading", "Korin::Array<int"] {
			let err = template_free_name(tag).expect_err(tag);
			assert!(matches!(err, LensError::MalformedTag { .. }), "{tag}");
		}
	}

	#[test]
	fn qualifiers_typedefs_and_references_decay_to_same_tag() {
		let mut builder = ImageBuilder::new(8).expect("pointer size");
		let int = builder.int();
		let array = builder.record("Korin::Array<int>", Vec::new(), Vec::new()).expect("record");
		let alias = builder.typedef("IntArray", array);
		let konst = builder.constant(alias);
		let reference = builder.reference(konst);
		let pointer = builder.pointer(array);

		let types = builder.types();
		for ty in [array, alias, konst, reference] {
			assert_eq!(decay(types, ty).expect("decay"), Some("Korin::Array<int>"));
		}
		assert_eq!(decay(types, int).expect("decay"), None);
		assert_eq!(decay(types, pointer).expect("decay"), None);
	}
}
