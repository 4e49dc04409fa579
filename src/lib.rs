//! Public library API for decoding foreign container layouts from process memory.

/// Host model, type-tag resolution, decoder registry, and container decoders.
pub mod lens;
