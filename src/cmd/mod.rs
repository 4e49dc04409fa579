/// Synthetic core image writer.
pub mod demo;
/// Decode and print named values.
pub mod print;
/// Registered printer keys.
pub mod registry;
/// Shared value tree rendering.
pub mod render;
/// Symbol listing with the family that would decode each one.
pub mod symbols;
/// Shared command helpers.
pub mod util;
