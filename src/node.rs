//! The generic elastic-binary-tree engine.
//!
//! `NodeCore<S>` and `Root<S>` carry the linkage every key flavor in
//! [`crate::key`] embeds. The operations here — descent, iteration,
//! deletion, duplicate-subtree insertion — are independent of what the key
//! actually looks like; only the handful of key-comparison-driven steps
//! (where to branch, where a new node belongs) live in `key`.
//!
//! Everything here is built on raw pointers: nodes are intrusive and the
//! tree never allocates, so there is no owned representation to hand back
//! to callers. Callers are responsible for keeping a node's memory alive
//! for as long as it is linked into a tree.
use crate::link::{Side, Tag, NODE_BRANCHES};
use crate::storage::LinkEncoding;

/// The two tagged links making up one level of the tree: the interior half
/// of a node, or the pair of slots at the top of a tree.
#[repr(C)]
#[derive(Debug)]
pub struct Branches<S: LinkEncoding> {
    /// `b[Side::Left as usize]` / `b[Side::Right as usize]`.
    pub b: [S; NODE_BRANCHES],
}

impl<S: LinkEncoding> Branches<S> {
    fn empty() -> Self {
        Branches { b: [S::null(), S::null()] }
    }
}

/// The linkage embedded at the start of every key-bearing node.
///
/// `branches` must stay the first field: every key type recovers its own
/// wrapper from a `*mut NodeCore<S>` via `container_of`-style offset
/// arithmetic, and the interior-half address of a node is simply the
/// address of its `branches` field.
#[repr(C)]
pub struct NodeCore<S: LinkEncoding> {
    /// This node's own interior half, used when this node has descendants.
    pub branches: Branches<S>,
    /// Link to the `branches` array this node hangs off through its
    /// interior half (null until inserted).
    pub node_parent: S,
    /// Link to the `branches` array this node hangs off through its leaf
    /// half (null until inserted).
    pub leaf_parent: S,
    /// Depth in the radix tree the divergent bit for this node's subtree
    /// was found at. Negative values mark a node as the head of (or a
    /// member of) a duplicate-key subtree.
    pub bit: i32,
    /// Prefix length in bits, used only by the longest-match byte-key
    /// variant; zero everywhere else.
    pub pfx: u16,
}

impl<S: LinkEncoding> Default for NodeCore<S> {
    fn default() -> Self {
        NodeCore {
            branches: Branches::empty(),
            node_parent: S::null(),
            leaf_parent: S::null(),
            bit: 0,
            pfx: 0,
        }
    }
}

impl<S: LinkEncoding> NodeCore<S> {
    /// Creates an unlinked node.
    pub fn new() -> Self {
        Self::default()
    }

    /// True once this node has been attached to a tree.
    #[inline]
    pub fn is_linked(&self) -> bool {
        !self.leaf_parent.is_null()
    }

    /// True if this node is part of a duplicate-key subtree rather than a
    /// plain radix node.
    #[inline]
    pub fn is_dup(&self) -> bool {
        self.bit < 0
    }

    #[inline]
    pub(crate) unsafe fn from_branches(branches: *mut Branches<S>) -> *mut Self {
        branches as *mut Self
    }

    #[inline]
    pub(crate) unsafe fn as_branches(node: *mut Self) -> *mut Branches<S> {
        node as *mut Branches<S>
    }
}

/// The head of a tree: two tagged links to the tree's single top-level
/// child, if any.
#[repr(C)]
pub struct Root<S: LinkEncoding> {
    pub(crate) b: [S; NODE_BRANCHES],
}

impl<S: LinkEncoding> Default for Root<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: LinkEncoding> Root<S> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Root { b: [S::null(), S::root_marker()] }
    }

    /// True if the tree has no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.b[Side::Left.index()].is_null()
    }

    /// Address of the left (only) top-level slot, for key-flavor descent.
    #[inline]
    pub(crate) fn left_slot(&self) -> *const S {
        core::ptr::addr_of!(self.b[Side::Left.index()])
    }

    #[inline]
    pub(crate) fn left_slot_mut(&mut self) -> *mut S {
        core::ptr::addr_of_mut!(self.b[Side::Left.index()])
    }

    #[inline]
    pub(crate) fn left_link(&self) -> S {
        self.b[Side::Left.index()]
    }
}

#[inline]
pub(crate) unsafe fn walk_down<S: LinkEncoding>(mut link: S, mut at: *const S, side: Side) -> *mut NodeCore<S> {
    loop {
        let (addr, tag) = link.decode(at).expect("walk_down reached a null link");
        match tag {
            Tag::Leaf => return addr as *mut NodeCore<S>,
            Tag::Node => {
                let branches = addr as *mut Branches<S>;
                let idx = side.index();
                at = core::ptr::addr_of!((*branches).b[idx]);
                link = (*branches).b[idx];
            }
        }
    }
}

/// Returns the node with the smallest key in the tree.
///
/// # Safety
/// `root` must point at a valid, currently-alive `Root<S>`.
pub unsafe fn first<S: LinkEncoding>(root: *const Root<S>) -> Option<*mut NodeCore<S>> {
    let link = (*root).b[Side::Left.index()];
    if link.is_null() {
        return None;
    }
    let at = core::ptr::addr_of!((*root).b[Side::Left.index()]);
    Some(walk_down(link, at, Side::Left))
}

/// Returns the node with the largest key in the tree.
///
/// # Safety
/// `root` must point at a valid, currently-alive `Root<S>`.
pub unsafe fn last<S: LinkEncoding>(root: *const Root<S>) -> Option<*mut NodeCore<S>> {
    let link = (*root).b[Side::Left.index()];
    if link.is_null() {
        return None;
    }
    let at = core::ptr::addr_of!((*root).b[Side::Left.index()]);
    Some(walk_down(link, at, Side::Right))
}

/// Identifies which of `branches`'s two slots currently links to `target`
/// (tagged `target_tag`), by decoding both slots and comparing what they
/// point at. Parent-pointing links (`leaf_parent`/`node_parent`) always
/// encode the owning `Branches`/`Root`'s own base address as their target,
/// not a per-slot address, so the only way to recover which slot is ours is
/// to ask each slot what it points to.
#[inline]
unsafe fn side_of<S: LinkEncoding>(branches: *const Branches<S>, target: *mut u8, target_tag: Tag) -> Side {
    let l_at = core::ptr::addr_of!((*branches).b[Side::Left.index()]);
    if let Some((addr, tag)) = (*branches).b[Side::Left.index()].decode(l_at) {
        if addr == target && tag == target_tag {
            return Side::Left;
        }
    }
    Side::Right
}

/// True if `branches`, reinterpreted from a decoded parent link, is
/// actually the tree's `Root` rather than a real fork: the root's right
/// slot always holds the root marker/null, which no live fork's right
/// child ever does.
#[inline]
unsafe fn is_root_branches<S: LinkEncoding>(branches: *const Branches<S>) -> bool {
    (*branches).b[Side::Right.index()].is_root_sentinel()
}

/// Climbs ancestor links starting from `node`'s leaf half, skipping every
/// ancestor for which `node`'s subtree is on `skip_side`, until it finds
/// one where it isn't; then walks down the opposite branch in the
/// direction away from `skip_side`. This is the shared shape of
/// [`next`]/[`prev`].
unsafe fn climb_cross<S: LinkEncoding>(node: *mut NodeCore<S>, skip_side: Side) -> Option<*mut NodeCore<S>> {
    let mut link = (*node).leaf_parent;
    let mut at = core::ptr::addr_of!((*node).leaf_parent);
    let mut child_addr = node as *mut u8;
    let mut child_tag = Tag::Leaf;
    loop {
        if link.is_root_sentinel() {
            return None;
        }
        let (addr, _tag) = link.decode(at).expect("dangling parent link");
        let branches = addr as *mut Branches<S>;
        if is_root_branches(branches) {
            // `node`'s subtree is the tree's only top-level child: there is
            // no sibling on either side to cross into.
            return None;
        }
        let side = side_of(branches, child_addr, child_tag);
        if side != skip_side {
            let enter = skip_side;
            let descend_dir = skip_side.other();
            let enter_link = (*branches).b[enter.index()];
            let enter_at = core::ptr::addr_of!((*branches).b[enter.index()]);
            return Some(walk_down(enter_link, enter_at, descend_dir));
        }
        let owner = NodeCore::<S>::from_branches(branches);
        child_addr = branches as *mut u8;
        child_tag = Tag::Node;
        link = (*owner).node_parent;
        at = core::ptr::addr_of!((*owner).node_parent);
    }
}

/// Returns the node whose key immediately follows `node`'s, or `None` if
/// `node` holds the largest key in its tree.
///
/// # Safety
/// `node` must be currently linked into a tree.
pub unsafe fn next<S: LinkEncoding>(node: *mut NodeCore<S>) -> Option<*mut NodeCore<S>> {
    climb_cross(node, Side::Right)
}

/// Returns the node whose key immediately precedes `node`'s, or `None` if
/// `node` holds the smallest key in its tree.
///
/// # Safety
/// `node` must be currently linked into a tree.
pub unsafe fn prev<S: LinkEncoding>(node: *mut NodeCore<S>) -> Option<*mut NodeCore<S>> {
    climb_cross(node, Side::Left)
}

/// Like [`next`], but stays within `node`'s duplicate-key subtree: returns
/// `None` once climbing would leave it.
///
/// # Safety
/// `node` must be currently linked into a tree.
pub unsafe fn next_dup<S: LinkEncoding>(node: *mut NodeCore<S>) -> Option<*mut NodeCore<S>> {
    climb_cross_dup(node, Side::Right)
}

/// Like [`prev`], but stays within `node`'s duplicate-key subtree.
///
/// # Safety
/// `node` must be currently linked into a tree.
pub unsafe fn prev_dup<S: LinkEncoding>(node: *mut NodeCore<S>) -> Option<*mut NodeCore<S>> {
    climb_cross_dup(node, Side::Left)
}

unsafe fn climb_cross_dup<S: LinkEncoding>(node: *mut NodeCore<S>, skip_side: Side) -> Option<*mut NodeCore<S>> {
    let mut link = (*node).leaf_parent;
    let mut at = core::ptr::addr_of!((*node).leaf_parent);
    let mut child_addr = node as *mut u8;
    let mut child_tag = Tag::Leaf;
    loop {
        if link.is_root_sentinel() {
            return None;
        }
        let (addr, _tag) = link.decode(at).expect("dangling parent link");
        let branches = addr as *mut Branches<S>;
        if is_root_branches(branches) {
            return None;
        }
        let owner = NodeCore::<S>::from_branches(branches);
        if !(*owner).is_dup() {
            // left the duplicate subtree
            return None;
        }
        let side = side_of(branches, child_addr, child_tag);
        if side != skip_side {
            let enter = skip_side;
            let descend_dir = skip_side.other();
            let enter_link = (*branches).b[enter.index()];
            let enter_at = core::ptr::addr_of!((*branches).b[enter.index()]);
            return Some(walk_down(enter_link, enter_at, descend_dir));
        }
        child_addr = branches as *mut u8;
        child_tag = Tag::Node;
        link = (*owner).node_parent;
        at = core::ptr::addr_of!((*owner).node_parent);
    }
}

/// Like [`next`], but skips over any duplicates of the current key,
/// landing on the first node with a strictly greater key.
///
/// # Safety
/// `node` must be currently linked into a tree.
pub unsafe fn next_unique<S: LinkEncoding>(node: *mut NodeCore<S>) -> Option<*mut NodeCore<S>> {
    let mut cur = node;
    while (*cur).is_dup() {
        match next_dup(cur) {
            Some(n) => cur = n,
            None => break,
        }
    }
    next(cur)
}

/// Like [`prev`], but skips over any duplicates of the current key.
///
/// # Safety
/// `node` must be currently linked into a tree.
pub unsafe fn prev_unique<S: LinkEncoding>(node: *mut NodeCore<S>) -> Option<*mut NodeCore<S>> {
    let mut cur = node;
    while (*cur).is_dup() {
        match prev_dup(cur) {
            Some(n) => cur = n,
            None => break,
        }
    }
    prev(cur)
}

/// Links `new` as a duplicate of the existing key headed (directly or
/// transitively) by `head`, preserving insertion order among duplicates.
///
/// Mirrors the "find the deepest hole in the duplicate subtree's right
/// spine, or insert directly above the head if there is none" algorithm:
/// duplicate nodes form a small right-leaning chain keyed purely by
/// insertion order, using negative `bit` values to mark membership.
///
/// # Safety
/// `head` must be a linked node (either a regular node being turned into a
/// duplicate head, or an existing duplicate-subtree member); `new` must be
/// unlinked.
pub unsafe fn insert_dup<S: LinkEncoding>(head: *mut NodeCore<S>, new: *mut NodeCore<S>) {
    let mut last = head;
    let mut troot = (*head).branches.b[Side::Right.index()];
    let mut at = core::ptr::addr_of!((*head).branches.b[Side::Right.index()]);

    loop {
        match troot.decode(at) {
            None => break,
            Some((_, Tag::Leaf)) => break,
            Some((addr, Tag::Node)) => {
                let branches = addr as *mut Branches<S>;
                let candidate = NodeCore::<S>::from_branches(branches);
                if (*candidate).bit > (*last).bit - 1 {
                    // not a hole yet, keep walking the right spine
                    last = candidate;
                    troot = (*branches).b[Side::Right.index()];
                    at = core::ptr::addr_of!((*branches).b[Side::Right.index()]);
                    continue;
                }
                break;
            }
        }
    }

    // decide between "insert directly before a leaf" and "insert above `last`"
    let insert_above_last = (*last).bit >= -1 || core::ptr::eq(last, head);
    (*new).bit = if insert_above_last { (*last).bit - 1 } else { -1 };

    let new_branches = NodeCore::<S>::as_branches(new);
    let last_branches = NodeCore::<S>::as_branches(last);
    let old_link = troot;

    (*new_branches).b[Side::Left.index()] = old_link;
    let new_self_leaf = S::encode(
        core::ptr::addr_of!((*new_branches).b[Side::Right.index()]),
        new as *mut u8,
        Tag::Leaf,
    );
    (*new_branches).b[Side::Right.index()] = new_self_leaf;

    // re-point whatever used to live at `at` to `new`'s interior half
    let new_as_node_link = parent_link(at, new_branches);
    core::ptr::write(at as *mut S, new_as_node_link);

    // fix the relocated old tail's own back-pointer to follow it
    let left_slot = core::ptr::addr_of!((*new_branches).b[Side::Left.index()]);
    match old_link.decode(left_slot) {
        Some((addr, Tag::Leaf)) => {
            let moved = addr as *mut NodeCore<S>;
            (*moved).leaf_parent = parent_link(core::ptr::addr_of!((*moved).leaf_parent), new_branches);
        }
        Some((addr, Tag::Node)) => {
            let moved_owner = NodeCore::<S>::from_branches(addr as *mut Branches<S>);
            (*moved_owner).node_parent = parent_link(core::ptr::addr_of!((*moved_owner).node_parent), new_branches);
        }
        None => {}
    }

    (*new).node_parent = parent_link(core::ptr::addr_of!((*new).node_parent), last_branches);
    (*new).leaf_parent = parent_link(core::ptr::addr_of!((*new).leaf_parent), new_branches);
}

/// Encodes a `Tag::Node` back-link to `branches` (its own base address,
/// never a per-slot address within it), to be stored in the field at
/// `link_at` — relative-offset encodings need that address to compute their
/// delta; absolute encodings ignore it.
#[inline]
pub(crate) unsafe fn parent_link<S: LinkEncoding>(link_at: *const S, branches: *const Branches<S>) -> S {
    S::encode(link_at, branches as *mut u8, Tag::Node)
}

/// Detaches `node` from its tree.
///
/// Three cases, matching the shape of the structure: `node` is the sole
/// child directly under the root; `node`'s sibling simply moves up to take
/// its parent's place; or `node`'s own interior half is still referenced
/// from elsewhere in the tree, in which case the freed parent storage is
/// spliced in to host it before `node`'s memory is handed back to the
/// caller.
///
/// # Safety
/// `node` must currently be linked into the tree `root` points at.
pub unsafe fn delete<S: LinkEncoding>(root: *mut Root<S>, node: *mut NodeCore<S>) {
    if !(*node).is_linked() {
        return;
    }

    let leaf_parent_link = (*node).leaf_parent;
    let (parent_addr, _) = leaf_parent_link
        .decode(core::ptr::addr_of!((*node).leaf_parent))
        .expect("linked node must have a leaf parent");
    let parent_branches = parent_addr as *mut Branches<S>;

    if core::ptr::eq(parent_branches as *const Branches<S>, root as *const Branches<S>) {
        // sole child directly under the root
        (*root).b[Side::Left.index()] = S::null();
        (*node).leaf_parent = S::null();
        (*node).node_parent = S::null();
        return;
    }

    let my_side = side_of(parent_branches, node as *mut u8, Tag::Leaf);
    let sibling_side = my_side.other();
    let sibling_link = (*parent_branches).b[sibling_side.index()];

    let grandparent_node = NodeCore::<S>::from_branches(parent_branches);
    let grandparent_link = (*grandparent_node).node_parent;
    let grandparent_at = core::ptr::addr_of!((*grandparent_node).node_parent);
    let (grandparent_addr, _) = grandparent_link
        .decode(grandparent_at)
        .expect("interior node must have a node parent");
    let grandparent_branches = grandparent_addr as *mut Branches<S>;
    let parent_side = side_of(grandparent_branches, parent_branches as *mut u8, Tag::Node);

    // re-link the sibling into the grandparent's slot that used to hold our parent
    let gp_slot = core::ptr::addr_of!((*grandparent_branches).b[parent_side.index()]) as *mut S;
    core::ptr::write(gp_slot, sibling_link);

    match sibling_link.decode(gp_slot as *const S) {
        Some((sib_addr, Tag::Leaf)) => {
            let sibling = sib_addr as *mut NodeCore<S>;
            (*sibling).leaf_parent = parent_link(core::ptr::addr_of!((*sibling).leaf_parent), grandparent_branches);
        }
        Some((sib_addr, Tag::Node)) => {
            let sibling_branches = sib_addr as *mut Branches<S>;
            let sibling_owner = NodeCore::<S>::from_branches(sibling_branches);
            (*sibling_owner).node_parent = parent_link(core::ptr::addr_of!((*sibling_owner).node_parent), grandparent_branches);
        }
        None => {}
    }

    // `parent_branches` belongs to whichever node happened to own the fork
    // `node` hung off of, and is now orphaned by the relink above. If
    // `node`'s own interior half is a *different* fork still referenced from
    // elsewhere, that fork's storage (part of `node`'s own memory, about to
    // be handed back to the caller) must be relocated before we return —
    // the freed `parent_branches` slot is exactly the spare storage needed.
    let own_branches = NodeCore::<S>::as_branches(node);
    if !(*node).node_parent.is_null() && !core::ptr::eq(own_branches as *const _, parent_branches as *const _) {
        let relocated = parent_branches;
        (*relocated).b[0] = (*own_branches).b[0];
        (*relocated).b[1] = (*own_branches).b[1];

        for side in [Side::Left, Side::Right] {
            let slot_at = core::ptr::addr_of!((*relocated).b[side.index()]);
            match (*relocated).b[side.index()].decode(slot_at) {
                Some((addr, Tag::Leaf)) => {
                    let child = addr as *mut NodeCore<S>;
                    (*child).leaf_parent = parent_link(core::ptr::addr_of!((*child).leaf_parent), relocated);
                }
                Some((addr, Tag::Node)) => {
                    let child_owner = NodeCore::<S>::from_branches(addr as *mut Branches<S>);
                    (*child_owner).node_parent = parent_link(core::ptr::addr_of!((*child_owner).node_parent), relocated);
                }
                None => {}
            }
        }

        let node_parent_at = core::ptr::addr_of!((*node).node_parent);
        let (referrer_addr, _) =
            (*node).node_parent.decode(node_parent_at).expect("node_parent must describe a live referrer");
        let referrer_branches = referrer_addr as *mut Branches<S>;
        let referrer_side = side_of(referrer_branches, own_branches as *mut u8, Tag::Node);
        let referrer_slot = core::ptr::addr_of!((*referrer_branches).b[referrer_side.index()]) as *mut S;
        core::ptr::write(referrer_slot, parent_link(referrer_slot as *const S, relocated));
    }

    (*node).leaf_parent = S::null();
    (*node).node_parent = S::null();
}
