//! Key-flavor specializations built on top of [`crate::node`].
//!
//! Each submodule adds one generic insert/lookup implementation shared
//! across every width of its key family, rather than one copy per integer
//! size: [`int`] covers `u32`/`u64`/`i32`/`i64`/pointer-sized keys through
//! a single [`int::IntLike`] implementation, and [`bytes`]/[`string`]/
//! [`indirect`] cover fixed-length and C-string byte keys, including the
//! longest-prefix-match variant.
pub mod bytes;
pub mod indirect;
pub mod int;
pub mod string;
