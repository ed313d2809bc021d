//! Intrusive elastic and compact binary trees.
//!
//! This crate provides ordered associative containers that never allocate:
//! the linkage fields live inside the caller's own records, and the caller
//! is responsible for the lifetime of every node. Two families are
//! provided:
//!
//! - [`node`]/[`key`]: elastic binary trees (EB-trees), radix trees over
//!   the bit pattern of a key (integers, pointers, fixed-length byte
//!   strings, or C-strings), keeping strict ordering and supporting
//!   duplicate keys.
//! - [`cb`]: compact binary trees (CB-trees), a minimal two-pointer-per-node
//!   variant keyed by the node's own address, meant for "which region
//!   contains this address" neighbour lookups.
//!
//! Both families are generic over a [`storage::LinkEncoding`], so the same
//! algorithms work whether links are stored as absolute pointers or as
//! compact relative offsets.
#![no_std]
#![warn(missing_docs)]
#![doc(html_root_url = "https://docs.rs/ebtree/0.1.0")]

pub mod bitops;
pub mod cb;
pub mod key;
pub mod link;
pub mod node;
pub mod storage;
