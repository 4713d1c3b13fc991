//! The smelt compiler middle-end.
//!
//! The input is an untyped value graph produced by the surface expander:
//! templates, symbols, calls, control flow and constants, shared by
//! reference. The output is a typed, monomorphized graph ready for code
//! generation. Both live in [`ir`]; the transformation lives in
//! [`specialize`].

pub mod builtins;
pub mod errors;
pub mod host;
pub mod intern;
pub mod ir;
pub mod source;
pub mod specialize;
pub mod types;
