//! Domain types for the sample: a simulated thread-affine instrument and its factory.

pub mod instrument;

pub use instrument::*;
