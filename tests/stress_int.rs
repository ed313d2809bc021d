//! Property test checking the tree against a sorted-`Vec` oracle across a
//! randomized sequence of inserts, deletes, and range lookups.
use ebtree::key::int::IntNode;
use ebtree::node::Root;
use ebtree::storage::Absolute;
use quickcheck::quickcheck;

type Node = IntNode<Absolute, u32>;

fn oracle_le(oracle: &[u32], key: u32) -> Option<u32> {
    oracle.iter().copied().filter(|&k| k <= key).max()
}

fn oracle_ge(oracle: &[u32], key: u32) -> Option<u32> {
    oracle.iter().copied().filter(|&k| k >= key).min()
}

fn run(ops: Vec<(bool, u32)>) -> bool {
    let mut root: Root<Absolute> = Root::new();
    let mut storage: Vec<Box<Node>> = Vec::new();
    let mut oracle: Vec<u32> = Vec::new();

    for (insert, key) in ops {
        if insert {
            if oracle.contains(&key) {
                continue;
            }
            let mut node = Box::new(Node::new(key));
            unsafe {
                Node::insert(&mut root as *mut _, node.as_mut() as *mut Node, true);
            }
            storage.push(node);
            oracle.push(key);
        } else if !oracle.is_empty() {
            let idx = (key as usize) % oracle.len();
            let target = oracle[idx];
            unsafe {
                if let Some(found) = Node::lookup(&root as *const _, target) {
                    Node::delete(&mut root as *mut _, found);
                }
            }
            oracle.remove(idx);
            storage.retain(|n| n.key != target);
        }

        oracle.sort_unstable();
        let probe = key;
        let expected_le = oracle_le(&oracle, probe);
        let expected_ge = oracle_ge(&oracle, probe);
        unsafe {
            let got_le = Node::lookup_le(&root as *const _, probe).map(|n| (*n).key);
            let got_ge = Node::lookup_ge(&root as *const _, probe).map(|n| (*n).key);
            if got_le != expected_le || got_ge != expected_ge {
                return false;
            }
        }
    }
    true
}

quickcheck! {
    fn matches_sorted_vec_oracle(ops: Vec<(bool, u32)>) -> bool {
        run(ops)
    }
}
