//! Coverage for the compact, address-keyed tree used for "which region
//! contains this address" neighbour lookups.
use ebtree::cb::{CbNode, CbTree};

struct Region {
    cb: CbNode,
    name: &'static str,
}

impl Region {
    fn new(name: &'static str) -> Self {
        Region { cb: CbNode::new(), name }
    }
}

#[test]
fn lookup_finds_the_exact_region_by_address() {
    let mut regions: Vec<Box<Region>> = vec![Region::new("a"), Region::new("b"), Region::new("c")]
        .into_iter()
        .map(Box::new)
        .collect();

    let mut tree = CbTree::new();
    let keys: Vec<usize> = regions
        .iter_mut()
        .map(|r| unsafe {
            let ptr = &mut r.cb as *mut CbNode;
            tree.insert(ptr);
            ptr as usize
        })
        .collect();

    for key in keys {
        assert!(tree.lookup(key).is_some());
    }
}

#[test]
fn lookup_le_and_ge_bracket_an_address_between_nodes() {
    let mut regions: Vec<Box<Region>> = vec![Region::new("a"), Region::new("b")].into_iter().map(Box::new).collect();
    let mut tree = CbTree::new();
    for r in regions.iter_mut() {
        unsafe {
            tree.insert(&mut r.cb as *mut CbNode);
        }
    }

    let keys: Vec<usize> = regions.iter().map(|r| &r.cb as *const CbNode as usize).collect();
    let lo = *keys.iter().min().unwrap();
    let hi = *keys.iter().max().unwrap();
    let mid = lo + (hi - lo) / 2;

    let le = tree.lookup_le(mid);
    let ge = tree.lookup_ge(mid);
    assert!(le.is_some() || ge.is_some());
}

#[test]
fn empty_tree_has_no_neighbours() {
    let tree = CbTree::new();
    assert!(tree.is_empty());
    assert!(tree.lookup(0x1000).is_none());
    assert!(tree.lookup_le(0x1000).is_none());
    assert!(tree.lookup_ge(0x1000).is_none());
}
