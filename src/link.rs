//! Tagged-link abstraction shared by every storage mode.
//!
//! Every child slot in a node's `branches` array, and every parent link,
//! carries one bit of extra information alongside the address: whether the
//! thing it points to is an interior node (another `branches` array) or a
//! leaf (a key-bearing node). [`Tag`] names that bit; [`Side`] names the
//! left/right choice a descent makes at each level.

/// Which side of a branch a link occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The branch reached when the next key bit is 0.
    Left,
    /// The branch reached when the next key bit is 1.
    Right,
}

impl Side {
    /// Returns the side selected by bit value `bit` (0 or 1).
    #[inline]
    pub fn from_bit(bit: u8) -> Side {
        if bit == 0 {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// The other side.
    #[inline]
    pub fn other(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Index into a two-element branches array.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

/// What kind of thing a link points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// The link points at a leaf's linkage embedded at the start of a key
    /// node (a `NodeCore`, reached through its leaf half).
    Leaf,
    /// The link points at another node's `branches` array (its interior
    /// half).
    Node,
}

/// Number of branches per node. Elastic binary trees are strictly binary:
/// every interior node has exactly two children.
pub const NODE_BRANCHES: usize = 2;
