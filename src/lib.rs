//! Dense bit-level packing and unpacking of integers into word buffers.
//!
//! A structural encoder decides *what* to write and in *what* order; this
//! crate only moves bits. The reading side must replay the same operations
//! with the same parameters to recover the values — the format is not
//! self-describing.

pub mod stream;
