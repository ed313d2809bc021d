//! Fixed-length byte-string keyed nodes, including the longest-prefix-match
//! variant used for CIDR-style lookups.
//!
//! Unlike integer keys, byte keys compare most-significant-byte first and
//! never need a sign-bias trick; the one extra wrinkle is the prefix
//! variant, which stores a prefix length (`pfx`) alongside the key bytes
//! and matches on "longest stored prefix of the key" instead of exact
//! equality.
use crate::bitops;
use crate::link::{Side, Tag};
use crate::node::{self, Branches, NodeCore, Root};
use crate::storage::LinkEncoding;

/// An intrusive node keyed by `LEN` bytes compared as a plain bit string.
#[repr(C)]
pub struct ByteNode<S: LinkEncoding, const LEN: usize> {
    /// Tree linkage; must stay the first field.
    pub core: NodeCore<S>,
    /// The key bytes.
    pub key: [u8; LEN],
}

impl<S: LinkEncoding, const LEN: usize> ByteNode<S, LEN> {
    const BITS: u32 = (LEN as u32) * 8;

    /// Creates an unlinked node for `key`.
    pub fn new(key: [u8; LEN]) -> Self {
        ByteNode { core: NodeCore::new(), key }
    }

    #[inline]
    unsafe fn from_core(core: *mut NodeCore<S>) -> *mut Self {
        core as *mut Self
    }

    #[inline]
    unsafe fn core_ptr(this: *mut Self) -> *mut NodeCore<S> {
        this as *mut NodeCore<S>
    }

    /// Inserts `new`, honoring a stored prefix length on either side the
    /// way [`Self::insert_prefix`] does; callers wanting plain fixed-length
    /// keys should leave `pfx` at `Self::BITS` (the default after
    /// `new`) so every comparison runs to the full key width.
    ///
    /// # Safety
    /// `root` must be valid; `new` must be unlinked.
    pub unsafe fn insert(root: *mut Root<S>, new: *mut Self, unique: bool) -> *mut Self {
        (*new).core.pfx = Self::BITS as u16;
        Self::insert_inner(root, new, unique)
    }

    /// Inserts `new` as a prefix of length `prefix_bits` (for longest-match
    /// lookups via [`Self::lookup_longest`]).
    ///
    /// # Safety
    /// `root` must be valid; `new` must be unlinked; `prefix_bits <= LEN*8`.
    pub unsafe fn insert_prefix(root: *mut Root<S>, new: *mut Self, prefix_bits: u32) -> *mut Self {
        debug_assert!(prefix_bits <= Self::BITS);
        (*new).core.pfx = prefix_bits as u16;
        Self::insert_inner(root, new, false)
    }

    unsafe fn insert_inner(root: *mut Root<S>, new: *mut Self, unique: bool) -> *mut Self {
        if (*root).is_empty() {
            let slot = (*root).left_slot_mut();
            let encoded = S::encode(slot as *const S, new as *mut u8, Tag::Leaf);
            core::ptr::write(slot, encoded);
            let root_branches = root as *mut Branches<S>;
            (*new).core.leaf_parent = node::parent_link(core::ptr::addr_of!((*new).core.leaf_parent), root_branches);
            (*new).core.node_parent = node::parent_link(core::ptr::addr_of!((*new).core.node_parent), root_branches);
            (*new).core.bit = 0;
            return new;
        }

        let new_len = ((*new).core.pfx as u32).min(Self::BITS);
        let mut owner = root as *mut Branches<S>;
        let mut at = (*root).left_slot();
        let mut link = (*root).left_link();

        loop {
            let (addr, tag) = link.decode(at).expect("non-empty tree has a link");
            match tag {
                Tag::Leaf => {
                    let old = addr as *mut Self;
                    return Self::insert_near_leaf(owner, at, old, new, new_len, unique);
                }
                Tag::Node => {
                    let branches = addr as *mut Branches<S>;
                    let owner_node = NodeCore::<S>::from_branches(branches);
                    if (*owner_node).is_dup() {
                        let old = Self::from_core(owner_node);
                        return Self::insert_near_leaf(owner, at, old, new, new_len, unique);
                    }
                    let old = Self::from_core(owner_node);
                    let node_bit = (*owner_node).bit as u32;
                    let common = bitops::equal_bits(&(*old).key, &(*new).key, 0, node_bit.min(new_len).min(Self::BITS));
                    if common < node_bit {
                        return Self::insert_above(owner, at, owner_node, new, common);
                    }
                    let side = Side::from_bit(bitops::get_bit(&(*new).key, node_bit));
                    owner = branches;
                    at = core::ptr::addr_of!((*branches).b[side.index()]);
                    link = (*branches).b[side.index()];
                }
            }
        }
    }

    unsafe fn insert_near_leaf(
        owner: *mut Branches<S>,
        at: *const S,
        old: *mut Self,
        new: *mut Self,
        new_len: u32,
        unique: bool,
    ) -> *mut Self {
        let common = bitops::equal_bits(&(*old).key, &(*new).key, 0, Self::BITS.min(new_len));
        if common >= Self::BITS.min(new_len) && (*old).core.pfx as u32 == new_len {
            if unique {
                return old;
            }
            node::insert_dup(Self::core_ptr(old), Self::core_ptr(new));
            return new;
        }
        Self::insert_above(owner, at, Self::core_ptr(old), new, common)
    }

    unsafe fn insert_above(
        owner: *mut Branches<S>,
        old_at: *const S,
        old_node: *mut NodeCore<S>,
        new: *mut Self,
        divergence: u32,
    ) -> *mut Self {
        let old = Self::from_core(old_node);
        let new_goes_right = bitops::cmp_bit(&(*new).key, &(*old).key, divergence) == core::cmp::Ordering::Greater;
        let new_branches = Self::core_ptr(new) as *mut Branches<S>;
        let old_link_here = core::ptr::read(old_at);
        let (self_side, other_side) = if new_goes_right {
            (Side::Right, Side::Left)
        } else {
            (Side::Left, Side::Right)
        };

        core::ptr::write(core::ptr::addr_of!((*new_branches).b[other_side.index()]) as *mut S, old_link_here);
        let new_leaf = S::encode(core::ptr::addr_of!((*new_branches).b[self_side.index()]), new as *mut u8, Tag::Leaf);
        core::ptr::write(core::ptr::addr_of!((*new_branches).b[self_side.index()]) as *mut S, new_leaf);

        let new_as_node = S::encode(old_at, new_branches as *mut u8, Tag::Node);
        core::ptr::write(old_at as *mut S, new_as_node);

        let other_slot = core::ptr::addr_of!((*new_branches).b[other_side.index()]);
        match old_link_here.decode(other_slot) {
            Some((addr, Tag::Leaf)) => {
                let sibling = addr as *mut NodeCore<S>;
                (*sibling).leaf_parent = node::parent_link(core::ptr::addr_of!((*sibling).leaf_parent), new_branches);
            }
            Some((addr, Tag::Node)) => {
                let sibling_owner = NodeCore::<S>::from_branches(addr as *mut Branches<S>);
                (*sibling_owner).node_parent = node::parent_link(core::ptr::addr_of!((*sibling_owner).node_parent), new_branches);
            }
            None => {}
        }

        (*new).core.bit = divergence as i32;
        (*new).core.node_parent = node::parent_link(core::ptr::addr_of!((*new).core.node_parent), owner);
        (*new).core.leaf_parent = node::parent_link(core::ptr::addr_of!((*new).core.leaf_parent), new_branches);
        new
    }

    /// Exact-match lookup over the full key width.
    ///
    /// # Safety
    /// `root` must be valid.
    pub unsafe fn lookup(root: *const Root<S>, key: &[u8; LEN]) -> Option<*mut Self> {
        Self::lookup_len(root, key, Self::BITS)
    }

    /// Exact-match lookup over just the first `bits` bits of `key`.
    ///
    /// # Safety
    /// `root` must be valid.
    pub unsafe fn lookup_len(root: *const Root<S>, key: &[u8; LEN], bits: u32) -> Option<*mut Self> {
        if (*root).is_empty() {
            return None;
        }
        let mut at = (*root).left_slot();
        let mut link = (*root).left_link();
        loop {
            let (addr, tag) = link.decode(at)?;
            match tag {
                Tag::Leaf => {
                    let node = addr as *mut Self;
                    return if (*node).core.pfx as u32 == bits && bitops::equal_bits(&(*node).key, key, 0, bits) >= bits {
                        Some(node)
                    } else {
                        None
                    };
                }
                Tag::Node => {
                    let branches = addr as *mut Branches<S>;
                    let owner = NodeCore::<S>::from_branches(branches);
                    let node_bit = (*owner).bit as u32;
                    if node_bit >= bits {
                        let node = Self::from_core(owner);
                        return if (*node).core.pfx as u32 == bits && bitops::equal_bits(&(*node).key, key, 0, bits) >= bits {
                            Some(node)
                        } else {
                            None
                        };
                    }
                    let side = Side::from_bit(bitops::get_bit(key, node_bit));
                    at = core::ptr::addr_of!((*branches).b[side.index()]);
                    link = (*branches).b[side.index()];
                }
            }
        }
    }

    /// Returns the most specific (longest) stored prefix that matches
    /// `key`, among nodes inserted with [`Self::insert_prefix`].
    ///
    /// # Safety
    /// `root` must be valid.
    pub unsafe fn lookup_longest(root: *const Root<S>, key: &[u8; LEN]) -> Option<*mut Self> {
        if (*root).is_empty() {
            return None;
        }
        let mut at = (*root).left_slot();
        let mut link = (*root).left_link();
        let mut best: Option<*mut Self> = None;
        loop {
            let (addr, tag) = match link.decode(at) {
                Some(v) => v,
                None => break,
            };
            let (owner, node_bit) = match tag {
                Tag::Leaf => (addr as *mut NodeCore<S>, Self::BITS),
                Tag::Node => {
                    let branches = addr as *mut Branches<S>;
                    (NodeCore::<S>::from_branches(branches), (*NodeCore::<S>::from_branches(branches)).bit as u32)
                }
            };
            let node = Self::from_core(owner);
            let pfx = (*node).core.pfx as u32;
            if bitops::equal_bits(&(*node).key, key, 0, pfx) >= pfx {
                best = Some(node);
            }
            if matches!(tag, Tag::Leaf) {
                break;
            }
            let branches = addr as *mut Branches<S>;
            let side = Side::from_bit(bitops::get_bit(key, node_bit));
            at = core::ptr::addr_of!((*branches).b[side.index()]);
            link = (*branches).b[side.index()];
        }
        best
    }

    /// Removes this node from whatever tree it is linked into.
    ///
    /// # Safety
    /// `root` must be the tree `this` is actually linked into.
    pub unsafe fn delete(root: *mut Root<S>, this: *mut Self) {
        node::delete(root, Self::core_ptr(this));
    }

    /// The first (smallest-key) node in the tree.
    ///
    /// # Safety
    /// `root` must be valid.
    pub unsafe fn first(root: *const Root<S>) -> Option<*mut Self> {
        node::first(root).map(|n| Self::from_core(n))
    }

    /// The last (largest-key) node in the tree.
    ///
    /// # Safety
    /// `root` must be valid.
    pub unsafe fn last(root: *const Root<S>) -> Option<*mut Self> {
        node::last(root).map(|n| Self::from_core(n))
    }

    /// The node whose key immediately follows this one's.
    ///
    /// # Safety
    /// `this` must be linked.
    pub unsafe fn next(this: *mut Self) -> Option<*mut Self> {
        node::next(Self::core_ptr(this)).map(|n| Self::from_core(n))
    }

    /// The node whose key immediately precedes this one's.
    ///
    /// # Safety
    /// `this` must be linked.
    pub unsafe fn prev(this: *mut Self) -> Option<*mut Self> {
        node::prev(Self::core_ptr(this)).map(|n| Self::from_core(n))
    }
}
