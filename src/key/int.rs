//! Integer- and pointer-keyed nodes.
//!
//! One generic implementation serves every width: `u32`, `u64`, `i32`,
//! `i64`, and (through [`IntLike`] for `usize`) pointer-valued keys. Signed
//! keys descend and branch using the key with its sign bit flipped, so the
//! same unsigned bit-by-bit comparisons used for the unsigned families
//! produce correctly-signed ordering; the true signed value is only
//! compared at the point where insertion decides left-vs-right of an exact
//! divergence.
use crate::link::{Side, Tag};
use crate::node::{self, NodeCore, Root};
use crate::storage::LinkEncoding;
use core::cmp::Ordering;

/// A key type usable with [`IntNode`].
///
/// `Unsigned` is the bit pattern used for descent: for unsigned types it is
/// the value itself, for signed types it is the value with its sign bit
/// flipped so that ordinary unsigned bit comparisons still walk the tree
/// from smallest to largest.
pub trait IntLike: Copy + Eq {
    /// The unsigned representation used while descending the tree.
    type Unsigned: Copy + Eq + Ord + core::ops::BitXor<Output = Self::Unsigned>;

    /// Bit width of the key.
    const BITS: u32;

    /// Converts to the descent representation.
    fn to_unsigned(self) -> Self::Unsigned;

    /// True ordering of the key (not the biased descent representation).
    fn cmp_native(self, other: Self) -> Ordering;

    /// Index of the most significant set bit, counted from bit 0 = LSB.
    fn msb_index(x: Self::Unsigned) -> u32;

    /// True if the unsigned representation is all zero bits.
    fn is_zero(x: Self::Unsigned) -> bool;

    /// Reads bit `n` (0 = LSB) of the descent representation.
    fn bit(x: Self::Unsigned, n: u32) -> u8;
}

macro_rules! impl_int_like_unsigned {
    ($t:ty, $bits:expr) => {
        impl IntLike for $t {
            type Unsigned = $t;
            const BITS: u32 = $bits;

            #[inline]
            fn to_unsigned(self) -> Self::Unsigned {
                self
            }

            #[inline]
            fn cmp_native(self, other: Self) -> Ordering {
                self.cmp(&other)
            }

            #[inline]
            fn msb_index(x: Self::Unsigned) -> u32 {
                Self::BITS - 1 - x.leading_zeros()
            }

            #[inline]
            fn is_zero(x: Self::Unsigned) -> bool {
                x == 0
            }

            #[inline]
            fn bit(x: Self::Unsigned, n: u32) -> u8 {
                ((x >> n) & 1) as u8
            }
        }
    };
}

macro_rules! impl_int_like_signed {
    ($t:ty, $u:ty, $bits:expr, $bias:expr) => {
        impl IntLike for $t {
            type Unsigned = $u;
            const BITS: u32 = $bits;

            #[inline]
            fn to_unsigned(self) -> Self::Unsigned {
                (self as $u) ^ $bias
            }

            #[inline]
            fn cmp_native(self, other: Self) -> Ordering {
                self.cmp(&other)
            }

            #[inline]
            fn msb_index(x: Self::Unsigned) -> u32 {
                Self::BITS - 1 - x.leading_zeros()
            }

            #[inline]
            fn is_zero(x: Self::Unsigned) -> bool {
                x == 0
            }

            #[inline]
            fn bit(x: Self::Unsigned, n: u32) -> u8 {
                ((x >> n) & 1) as u8
            }
        }
    };
}

impl_int_like_unsigned!(u32, 32);
impl_int_like_unsigned!(u64, 64);
impl_int_like_signed!(i32, u32, 32, 0x8000_0000);
impl_int_like_signed!(i64, u64, 64, 0x8000_0000_0000_0000);

/// An intrusive node keyed by an integer (or, through a newtype
/// implementing [`IntLike`], a pointer value).
#[repr(C)]
pub struct IntNode<S: LinkEncoding, K: IntLike> {
    /// Tree linkage; must stay the first field.
    pub core: NodeCore<S>,
    /// The key this node was inserted under.
    pub key: K,
}

impl<S: LinkEncoding, K: IntLike> IntNode<S, K> {
    /// Creates an unlinked node for `key`.
    pub fn new(key: K) -> Self {
        IntNode { core: NodeCore::new(), key }
    }

    #[inline]
    unsafe fn from_core(core: *mut NodeCore<S>) -> *mut Self {
        core as *mut Self
    }

    #[inline]
    unsafe fn core_ptr(this: *mut Self) -> *mut NodeCore<S> {
        this as *mut NodeCore<S>
    }

    /// Inserts `new` into `root`. If `unique` and a node with an identical
    /// key already exists, returns that existing node instead of linking
    /// `new`. Otherwise returns `new`.
    ///
    /// # Safety
    /// `root` must be valid; `new` must be unlinked.
    pub unsafe fn insert(root: *mut Root<S>, new: *mut Self, unique: bool) -> *mut Self {
        if (*root).is_empty() {
            link_as_only_child(root, new);
            return new;
        }

        let new_key = (*new).key.to_unsigned();
        let mut owner = root as *mut crate::node::Branches<S>;
        let mut at = (*root).left_slot();
        let mut link = (*root).left_link();

        loop {
            let (addr, tag) = link.decode(at).expect("non-empty tree has a link");
            match tag {
                Tag::Leaf => {
                    let old = addr as *mut Self;
                    return insert_near_leaf(owner, at, old, new, new_key, unique);
                }
                Tag::Node => {
                    let branches = addr as *mut crate::node::Branches<S>;
                    let old_node = NodeCore::<S>::from_branches(branches);
                    let old = Self::from_core(old_node);
                    if (*old_node).is_dup() {
                        return insert_near_leaf(owner, at, old, new, new_key, unique);
                    }
                    let old_key = (*old).key.to_unsigned();
                    let diff = old_key ^ new_key;
                    if K::is_zero(diff) {
                        return insert_near_leaf(owner, at, old, new, new_key, unique);
                    }
                    let node_bit = (*old_node).bit as u32;
                    let divergence = K::msb_index(diff);
                    // once the remaining common bits run out above this
                    // node's branch bit, the new key belongs here instead
                    // of deeper in the tree
                    if divergence >= node_bit {
                        return insert_above(owner, at, old_node, new, new_key, divergence);
                    }
                    let side = Side::from_bit(K::bit(new_key, node_bit));
                    owner = branches;
                    at = core::ptr::addr_of!((*branches).b[side.index()]);
                    link = (*branches).b[side.index()];
                }
            }
        }
    }

    /// Exact-match lookup.
    ///
    /// # Safety
    /// `root` must be valid.
    pub unsafe fn lookup(root: *const Root<S>, key: K) -> Option<*mut Self> {
        if (*root).is_empty() {
            return None;
        }
        let target = key.to_unsigned();
        let mut at = (*root).left_slot();
        let mut link = (*root).left_link();
        loop {
            let (addr, tag) = link.decode(at)?;
            match tag {
                Tag::Leaf => {
                    let node = addr as *mut Self;
                    return if (*node).key.cmp_native(key) == Ordering::Equal { Some(node) } else { None };
                }
                Tag::Node => {
                    let branches = addr as *mut crate::node::Branches<S>;
                    let owner = NodeCore::<S>::from_branches(branches);
                    if (*owner).is_dup() {
                        let node = Self::from_core(owner);
                        return if (*node).key.cmp_native(key) == Ordering::Equal { Some(node) } else { None };
                    }
                    let node_bit = (*owner).bit as u32;
                    let owner_node = Self::from_core(owner);
                    let owner_key = (*owner_node).key.to_unsigned();
                    if !K::is_zero(owner_key ^ target) && K::msb_index(owner_key ^ target) >= node_bit {
                        // target diverges from this subtree above its branch
                        // bit: no member here can match
                        return None;
                    }
                    let side = Side::from_bit(K::bit(target, node_bit));
                    at = core::ptr::addr_of!((*branches).b[side.index()]);
                    link = (*branches).b[side.index()];
                }
            }
        }
    }

    /// Largest-key-less-than-or-equal-to lookup.
    ///
    /// # Safety
    /// `root` must be valid.
    pub unsafe fn lookup_le(root: *const Root<S>, key: K) -> Option<*mut Self> {
        range_lookup(root, key, true)
    }

    /// Smallest-key-greater-than-or-equal-to lookup.
    ///
    /// # Safety
    /// `root` must be valid.
    pub unsafe fn lookup_ge(root: *const Root<S>, key: K) -> Option<*mut Self> {
        range_lookup(root, key, false)
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

unsafe fn link_as_only_child<S: LinkEncoding, K: IntLike>(root: *mut Root<S>, new: *mut IntNode<S, K>) {
    let slot = (*root).left_slot_mut();
    let encoded = S::encode(slot as *const S, new as *mut u8, Tag::Leaf);
    core::ptr::write(slot, encoded);
    let root_branches = root as *mut crate::node::Branches<S>;
    (*new).core.leaf_parent = node::parent_link(core::ptr::addr_of!((*new).core.leaf_parent), root_branches);
    (*new).core.node_parent = node::parent_link(core::ptr::addr_of!((*new).core.node_parent), root_branches);
    (*new).core.bit = 0;
}

/// Splices `new` in immediately above `old_at` (a slot owned by `owner`,
/// currently holding some tagged link), using `divergence` as the new
/// branch bit, and decides left/right by the *true* (non-biased) key
/// ordering the same way the original's sign-flip descent still finishes
/// with a native compare.
unsafe fn insert_above<S: LinkEncoding, K: IntLike>(
    owner: *mut crate::node::Branches<S>,
    old_at: *const S,
    old_node: *mut NodeCore<S>,
    new: *mut IntNode<S, K>,
    new_key: K::Unsigned,
    divergence: u32,
) -> *mut IntNode<S, K> {
    let old = IntNode::<S, K>::from_core(old_node);
    let old_key = (*old).key.to_unsigned();
    let new_goes_right = new_key > old_key;
    let new_branches = IntNode::<S, K>::core_ptr(new) as *mut crate::node::Branches<S>;

    let old_link_here = core::ptr::read(old_at);
    let (self_side, other_side) = if new_goes_right {
        (Side::Right, Side::Left)
    } else {
        (Side::Left, Side::Right)
    };

    core::ptr::write(
        core::ptr::addr_of!((*new_branches).b[other_side.index()]) as *mut S,
        old_link_here,
    );
    let new_leaf_link = S::encode(
        core::ptr::addr_of!((*new_branches).b[self_side.index()]),
        new as *mut u8,
        Tag::Leaf,
    );
    core::ptr::write(core::ptr::addr_of!((*new_branches).b[self_side.index()]) as *mut S, new_leaf_link);

    let new_as_node = S::encode(old_at, new_branches as *mut u8, Tag::Node);
    core::ptr::write(old_at as *mut S, new_as_node);

    // re-home whatever used to live at `old_at` to point back through our
    // `other_side` slot instead
    let other_slot = core::ptr::addr_of!((*new_branches).b[other_side.index()]);
    match old_link_here.decode(other_slot) {
        Some((addr, Tag::Leaf)) => {
            let sibling = addr as *mut NodeCore<S>;
            (*sibling).leaf_parent = node::parent_link(core::ptr::addr_of!((*sibling).leaf_parent), new_branches);
        }
        Some((addr, Tag::Node)) => {
            let sibling_branches = addr as *mut crate::node::Branches<S>;
            let sibling_owner = NodeCore::<S>::from_branches(sibling_branches);
            (*sibling_owner).node_parent = node::parent_link(core::ptr::addr_of!((*sibling_owner).node_parent), new_branches);
        }
        None => {}
    }

    (*new).core.bit = divergence as i32;
    (*new).core.node_parent = node::parent_link(core::ptr::addr_of!((*new).core.node_parent), owner);
    (*new).core.leaf_parent = node::parent_link(core::ptr::addr_of!((*new).core.leaf_parent), new_branches);
    new
}

unsafe fn insert_near_leaf<S: LinkEncoding, K: IntLike>(
    owner: *mut crate::node::Branches<S>,
    at: *const S,
    old: *mut IntNode<S, K>,
    new: *mut IntNode<S, K>,
    new_key: K::Unsigned,
    unique: bool,
) -> *mut IntNode<S, K> {
    let old_key = (*old).key.to_unsigned();
    if K::is_zero(old_key ^ new_key) {
        if unique {
            return old;
        }
        node::insert_dup(IntNode::<S, K>::core_ptr(old), IntNode::<S, K>::core_ptr(new));
        return new;
    }
    let divergence = K::msb_index(old_key ^ new_key);
    insert_above(owner, at, IntNode::<S, K>::core_ptr(old), new, new_key, divergence)
}

unsafe fn range_lookup<S: LinkEncoding, K: IntLike>(root: *const Root<S>, key: K, le: bool) -> Option<*mut IntNode<S, K>> {
    if (*root).is_empty() {
        return None;
    }
    let target = key.to_unsigned();
    let mut at = (*root).left_slot();
    let mut link = (*root).left_link();
    let mut best: Option<*mut IntNode<S, K>> = None;

    loop {
        let (addr, tag) = match link.decode(at) {
            Some(v) => v,
            None => break,
        };
        match tag {
            Tag::Leaf => {
                let node = addr as *mut IntNode<S, K>;
                return settle_range(node, key, le, best);
            }
            Tag::Node => {
                let branches = addr as *mut crate::node::Branches<S>;
                let owner = NodeCore::<S>::from_branches(branches);
                if (*owner).is_dup() {
                    let node = IntNode::<S, K>::from_core(owner);
                    return settle_range(node, key, le, best);
                }
                let node_bit = (*owner).bit as u32;
                let owner_node = IntNode::<S, K>::from_core(owner);
                let owner_key = (*owner_node).key.to_unsigned();
                let owner_diff = owner_key ^ target;
                if !K::is_zero(owner_diff) && K::msb_index(owner_diff) >= node_bit {
                    // diverges above this branch: settle using whichever
                    // side of this subtree matches the direction we want
                    let node = owner_node;
                    return settle_range(node, key, le, best);
                }
                let side = Side::from_bit(K::bit(target, node_bit));
                // remember the subtree on the side away from our target as
                // a fallback candidate
                let other = side.other();
                let candidate_link = (*branches).b[other.index()];
                let candidate_at = core::ptr::addr_of!((*branches).b[other.index()]);
                if (le && other == Side::Left) || (!le && other == Side::Right) {
                    if let Some((a, t)) = candidate_link.decode(candidate_at) {
                        best = Some(first_or_last_under(a, t, le));
                    }
                }
                at = core::ptr::addr_of!((*branches).b[side.index()]);
                link = (*branches).b[side.index()];
            }
        }
    }
    best
}

unsafe fn first_or_last_under<S: LinkEncoding, K: IntLike>(addr: *mut u8, tag: Tag, le: bool) -> *mut IntNode<S, K> {
    match tag {
        Tag::Leaf => addr as *mut IntNode<S, K>,
        Tag::Node => {
            let branches = addr as *mut crate::node::Branches<S>;
            let side = if le { Side::Right } else { Side::Left };
            let link = (*branches).b[side.index()];
            let at = core::ptr::addr_of!((*branches).b[side.index()]);
            let node = node::walk_down(link, at, side);
            IntNode::<S, K>::from_core(node)
        }
    }
}

unsafe fn settle_range<S: LinkEncoding, K: IntLike>(
    node: *mut IntNode<S, K>,
    key: K,
    le: bool,
    fallback: Option<*mut IntNode<S, K>>,
) -> Option<*mut IntNode<S, K>> {
    let ord = (*node).key.cmp_native(key);
    let matches = match (le, ord) {
        (true, Ordering::Less) | (true, Ordering::Equal) => true,
        (false, Ordering::Greater) | (false, Ordering::Equal) => true,
        _ => false,
    };
    if matches {
        Some(node)
    } else {
        fallback
    }
}
