//! Indirect byte/string keys: the node stores a pointer to externally-owned
//! key bytes instead of embedding them inline.
//!
//! Useful when the key already lives somewhere else (e.g. inside the same
//! record the node is embedded in, or in a buffer the caller manages
//! separately) and copying it into the node would be wasteful. The
//! comparison and insertion logic is otherwise identical to
//! [`crate::key::bytes`]/[`crate::key::string`]; only key access goes
//! through a pointer dereference.
use crate::bitops;
use crate::link::{Side, Tag};
use crate::node::{self, Branches, NodeCore, Root};
use crate::storage::LinkEncoding;

/// An intrusive node whose key is a NUL-terminated string living outside
/// the node itself.
///
/// # Safety
/// The pointee of `key_ptr` must stay alive and unchanged for as long as
/// the node remains linked into a tree.
#[repr(C)]
pub struct IndirectStringNode<S: LinkEncoding> {
    /// Tree linkage; must stay the first field.
    pub core: NodeCore<S>,
    key_ptr: *const u8,
}

impl<S: LinkEncoding> IndirectStringNode<S> {
    /// Creates an unlinked node referencing the NUL-terminated string at
    /// `key_ptr`.
    ///
    /// # Safety
    /// `key_ptr` must point at a live NUL-terminated string for as long as
    /// the returned node is linked into a tree.
    pub unsafe fn new(key_ptr: *const u8) -> Self {
        IndirectStringNode { core: NodeCore::new(), key_ptr }
    }

    #[inline]
    unsafe fn key(&self) -> &[u8] {
        let mut len = 0usize;
        while *self.key_ptr.add(len) != 0 {
            len += 1;
        }
        core::slice::from_raw_parts(self.key_ptr, len + 1)
    }

    #[inline]
    unsafe fn from_core(core: *mut NodeCore<S>) -> *mut Self {
        core as *mut Self
    }

    #[inline]
    unsafe fn core_ptr(this: *mut Self) -> *mut NodeCore<S> {
        this as *mut NodeCore<S>
    }

    /// Inserts `new` into `root`.
    ///
    /// Mirrors the direct string insertion in [`crate::key::string`]; the
    /// only difference is that every key read goes through
    /// [`Self::key`]'s pointer indirection.
    ///
    /// # Safety
    /// `root` must be valid; `new` must be unlinked and its `key_ptr` live.
    pub unsafe fn insert(root: *mut Root<S>, new: *mut Self, unique: bool) -> *mut Self {
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

        let mut owner = root as *mut Branches<S>;
        let mut at = (*root).left_slot();
        let mut link = (*root).left_link();

        loop {
            let (addr, tag) = link.decode(at).expect("non-empty tree has a link");
            match tag {
                Tag::Leaf => {
                    let old = addr as *mut Self;
                    return Self::insert_near_leaf(owner, at, old, new, unique);
                }
                Tag::Node => {
                    let branches = addr as *mut Branches<S>;
                    let owner_node = NodeCore::<S>::from_branches(branches);
                    if (*owner_node).is_dup() {
                        let old = Self::from_core(owner_node);
                        return Self::insert_near_leaf(owner, at, old, new, unique);
                    }
                    let old = Self::from_core(owner_node);
                    let node_bit = (*owner_node).bit as u32;
                    match bitops::string_equal_bits((*old).key(), (*new).key(), 0) {
                        None => return Self::insert_near_leaf(owner, at, old, new, unique),
                        Some(common) if common < node_bit => {
                            return Self::insert_above(owner, at, owner_node, new, common);
                        }
                        Some(_) => {
                            let side = Side::from_bit(bitops::get_bit((*new).key(), node_bit));
                            owner = branches;
                            at = core::ptr::addr_of!((*branches).b[side.index()]);
                            link = (*branches).b[side.index()];
                        }
                    }
                }
            }
        }
    }

    unsafe fn insert_near_leaf(owner: *mut Branches<S>, at: *const S, old: *mut Self, new: *mut Self, unique: bool) -> *mut Self {
        match bitops::string_equal_bits((*old).key(), (*new).key(), 0) {
            None => {
                if unique {
                    return old;
                }
                node::insert_dup(Self::core_ptr(old), Self::core_ptr(new));
                new
            }
            Some(common) => Self::insert_above(owner, at, Self::core_ptr(old), new, common),
        }
    }

    unsafe fn insert_above(
        owner: *mut Branches<S>,
        old_at: *const S,
        old_node: *mut NodeCore<S>,
        new: *mut Self,
        divergence: u32,
    ) -> *mut Self {
        let old = Self::from_core(old_node);
        let new_goes_right = bitops::cmp_bit((*new).key(), (*old).key(), divergence) == core::cmp::Ordering::Greater;
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

    /// Exact-match lookup.
    ///
    /// # Safety
    /// `root` must be valid; `key` must be NUL-terminated.
    pub unsafe fn lookup(root: *const Root<S>, key: &[u8]) -> Option<*mut Self> {
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
                    return if bitops::string_equal_bits((*node).key(), key, 0).is_none() { Some(node) } else { None };
                }
                Tag::Node => {
                    let branches = addr as *mut Branches<S>;
                    let owner = NodeCore::<S>::from_branches(branches);
                    let node_bit = (*owner).bit as u32;
                    if (*owner).is_dup() {
                        let node = Self::from_core(owner);
                        return if bitops::string_equal_bits((*node).key(), key, 0).is_none() { Some(node) } else { None };
                    }
                    let side = Side::from_bit(bitops::get_bit(key, node_bit));
                    at = core::ptr::addr_of!((*branches).b[side.index()]);
                    link = (*branches).b[side.index()];
                }
            }
        }
    }

    /// Removes this node from whatever tree it is linked into.
    ///
    /// # Safety
    /// `root` must be the tree `this` is actually linked into.
    pub unsafe fn delete(root: *mut Root<S>, this: *mut Self) {
        node::delete(root, Self::core_ptr(this));
    }
}
