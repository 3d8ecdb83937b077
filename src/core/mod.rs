//! Core identity types shared by the builder and the runtime.
//!
//! States and transition labels are opaque symbols: the runtime only compares,
//! hashes and names them.

mod symbol;

pub use symbol::Symbol;
