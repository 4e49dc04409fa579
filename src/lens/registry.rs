use std::collections::BTreeMap;
use std::fmt;

use crate::lens::containers;
use crate::lens::{DecodeOptions, Decoder, LensError, Result, ValueRef, decay, template_free_name};

/// Namespace the built-in families are registered under.
pub const DEFAULT_NAMESPACE: &str = "Korin";

/// Constructor bound to one value.
pub type Factory = for<'a> fn(ValueRef<'a>, &DecodeOptions) -> Result<Box<dyn Decoder<'a> + 'a>>;

/// Built-in container families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
	/// `Tuple<...>`.
	Tuple,
	/// `Array<T>`.
	Array,
	/// `ArrayBase<T>`, internal.
	ArrayBase,
	/// `StringBase`.
	StringBase,
	/// `List<T>`.
	List,
	/// `Tree<T>`.
	Tree,
	/// `Set<T>`.
	Set,
	/// `Map<K, V>`.
	Map,
	/// `HashTable<T>`, internal.
	HashTable,
	/// `HashSet<T>`.
	HashSet,
	/// `HashMap<K, V>`.
	HashMap,
	/// `Pair<K, V>`.
	Pair,
	/// `Optional<T>`.
	Optional,
	/// `CircularQueue<T>`.
	CircularQueue,
}

impl Family {
	/// Families registered by [`default_registry`].
	pub const PUBLIC: [Family; 12] = [
		Self::Tuple,
		Self::Array,
		Self::StringBase,
		Self::List,
		Self::Tree,
		Self::Set,
		Self::Map,
		Self::HashSet,
		Self::HashMap,
		Self::Pair,
		Self::Optional,
		Self::CircularQueue,
	];

	/// Implementation layouts added by [`dev_registry`].
	pub const INTERNAL: [Family; 2] = [Self::ArrayBase, Self::HashTable];

	/// Unqualified class name.
	pub fn name(self) -> &'static str {
		match self {
			Self::Tuple => "Tuple",
			Self::Array => "Array",
			Self::ArrayBase => "ArrayBase",
			Self::StringBase => "StringBase",
			Self::List => "List",
			Self::Tree => "Tree",
			Self::Set => "Set",
			Self::Map => "Map",
			Self::HashTable => "HashTable",
			Self::HashSet => "HashSet",
			Self::HashMap => "HashMap",
			Self::Pair => "Pair",
			Self::Optional => "Optional",
			Self::CircularQueue => "CircularQueue",
		}
	}

	/// Decoder constructor for this family.
	pub fn factory(self) -> Factory {
		match self {
			Self::Tuple => containers::tuple,
			Self::Array => containers::array,
			Self::ArrayBase => containers::array_base,
			Self::StringBase => containers::string,
			Self::List => containers::list,
			Self::Tree => containers::tree,
			Self::Set => containers::set,
			Self::Map => containers::map,
			Self::HashTable => containers::hash_table,
			Self::HashSet => containers::hash_set,
			Self::HashMap => containers::hash_map,
			Self::Pair => containers::pair,
			Self::Optional => containers::optional,
			Self::CircularQueue => containers::circular_queue,
		}
	}
}

/// Maps `namespace::Family` keys to decoder factories.
pub struct Registry {
	namespace: String,
	options: DecodeOptions,
	factories: BTreeMap<String, Factory>,
}

impl fmt::Debug for Registry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Registry")
			.field("namespace", &self.namespace)
			.field("options", &self.options)
			.field("keys", &self.factories.keys().collect::<Vec<_>>())
			.finish()
	}
}

impl Registry {
	/// Create an empty registry for `namespace`.
	pub fn new(namespace: &str) -> Self {
		Self {
			namespace: namespace.to_owned(),
			options: DecodeOptions::default(),
			factories: BTreeMap::new(),
		}
	}

	/// Replace the options handed to every factory.
	pub fn with_options(mut self, options: DecodeOptions) -> Self {
		self.options = options;
		self
	}

	/// Namespace prefix of every key.
	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	/// Options handed to factories.
	pub fn options(&self) -> &DecodeOptions {
		&self.options
	}

	/// Register a built-in family.
	pub fn register(&mut self, family: Family) {
		self.insert(family.name(), family.factory());
	}

	/// Register a factory under `namespace::name`.
	///
	/// An existing entry is replaced with a warning.
	pub fn register_factory(&mut self, name: &str, factory: Factory) -> Result<()> {
		if name.is_empty() {
			return Err(LensError::EmptyFamilyName);
		}
		self.insert(name, factory);
		Ok(())
	}

	fn insert(&mut self, name: &str, factory: Factory) {
		let key = format!("{}::{name}", self.namespace);
		if self.factories.contains_key(&key) {
			tracing::warn!(key = %key, "overriding existing printer");
		}
		self.factories.insert(key, factory);
	}

	/// Registered keys in sorted order.
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.factories.keys().map(String::as_str)
	}

	/// Whether `key` (`namespace::name`) is registered.
	pub fn contains(&self, key: &str) -> bool {
		self.factories.contains_key(key)
	}

	/// Number of registered keys.
	pub fn len(&self) -> usize {
		self.factories.len()
	}

	/// Return whether nothing is registered.
	pub fn is_empty(&self) -> bool {
		self.factories.is_empty()
	}

	/// Pick and construct the decoder for `value`.
	///
	/// `Ok(None)` means no decoder applies: the type has no tag or no family
	/// is registered for it. Malformed tags and construction failures are
	/// errors.
	pub fn resolve<'a>(&self, value: ValueRef<'a>) -> Result<Option<Box<dyn Decoder<'a> + 'a>>> {
		let Some(tag) = decay(value.host().types(), value.ty())? else {
			tracing::trace!(ty = %value.type_name(), "no tag, skipping");
			return Ok(None);
		};
		let name = template_free_name(tag)?;
		let Some(factory) = self.factories.get(name) else {
			tracing::trace!(tag, "no printer registered");
			return Ok(None);
		};

		tracing::debug!(key = name, addr = %format_args!("0x{:016x}", value.addr()), "resolved printer");
		factory(value.referent()?, &self.options).map(Some)
	}
}

/// Registry with the public container families.
pub fn default_registry() -> Registry {
	let mut registry = Registry::new(DEFAULT_NAMESPACE);
	for family in Family::PUBLIC {
		registry.register(family);
	}
	registry
}

/// [`default_registry`] plus the internal base layouts.
pub fn dev_registry() -> Registry {
	let mut registry = default_registry();
	for family in Family::INTERNAL {
		registry.register(family);
	}
	registry
}
