mod builder;
mod compression;
mod containers;
mod decoder;
mod error;
mod image;
mod layout;
mod memory;
mod registry;
mod scope;
mod tag;
mod types;
mod value;
mod walk;

/// Programmatic core image construction.
pub use builder::{FieldSpec, ImageBuilder};
/// Compression detection result for image files.
pub use compression::Compression;
/// Built-in container family decoders.
pub use containers::{ArrayDecoder, CircularQueueDecoder, HashDecoder, ListDecoder, OptionalDecoder, PairDecoder, StringDecoder, StringLayout, TreeDecoder, TupleDecoder};
/// Decoder trait, child records, and decode options.
pub use decoder::{ChainCap, Child, Children, DecodeOptions, Decoder, DisplayHint};
/// Error and result aliases.
pub use error::{LensError, Result};
/// Serialisable process snapshot implementing [`Host`].
pub use image::{CoreImage, ImageFile, Symbol};
/// Container layouts for synthesised images.
pub use layout::{Placement, Slot, demo_image};
/// Memory access trait and region map.
pub use memory::{Endianness, Memory, MemoryMap, Region};
/// Decoder registry and built-in family table.
pub use registry::{DEFAULT_NAMESPACE, Factory, Family, Registry, default_registry, dev_registry};
/// Host scope printer lists.
pub use scope::{Scope, register_default_printer, register_printer};
/// Type-tag decay and template stripping.
pub use tag::{decay, template_free_name};
/// Type table representation.
pub use types::{Encoding, FieldDef, RecordDef, TemplateArg, TypeDef, TypeId, TypeTable};
/// Value handles over host memory.
pub use value::{Host, Scalar, ValueRef};
/// Chain walkers and child adapters.
pub use walk::{ChainWalk, index_label, split_pairs};
