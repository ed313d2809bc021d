//! End-to-end coverage for integer-keyed trees: ordering, range lookups,
//! duplicate-key subtrees, and deletion.
use ebtree::key::int::IntNode;
use ebtree::node::Root;
use ebtree::storage::Absolute;

type Node = IntNode<Absolute, u32>;

fn insert_all(root: &mut Root<Absolute>, nodes: &mut [Box<Node>]) {
    for node in nodes.iter_mut() {
        unsafe {
            Node::insert(root as *mut _, node.as_mut() as *mut Node, false);
        }
    }
}

#[test]
fn ordered_iteration_matches_sorted_keys() {
    let mut root: Root<Absolute> = Root::new();
    let keys = [42u32, 7, 19, 100, 3, 55];
    let mut nodes: Vec<Box<Node>> = keys.iter().map(|&k| Box::new(Node::new(k))).collect();
    insert_all(&mut root, &mut nodes);

    let mut seen = Vec::new();
    unsafe {
        let mut cur = Node::first(&root as *const _);
        while let Some(n) = cur {
            seen.push((*n).key);
            cur = Node::next(n);
        }
    }
    let mut expected = keys.to_vec();
    expected.sort_unstable();
    assert_eq!(seen, expected);
}

#[test]
fn lookup_exact_and_missing() {
    let mut root: Root<Absolute> = Root::new();
    let mut nodes: Vec<Box<Node>> = [10u32, 20, 30].iter().map(|&k| Box::new(Node::new(k))).collect();
    insert_all(&mut root, &mut nodes);

    unsafe {
        assert!(Node::lookup(&root as *const _, 20).is_some());
        assert!(Node::lookup(&root as *const _, 25).is_none());
    }
}

#[test]
fn lookup_le_and_ge_bracket_missing_keys() {
    let mut root: Root<Absolute> = Root::new();
    let mut nodes: Vec<Box<Node>> = [10u32, 20, 30].iter().map(|&k| Box::new(Node::new(k))).collect();
    insert_all(&mut root, &mut nodes);

    unsafe {
        let le = Node::lookup_le(&root as *const _, 25).expect("25 has a predecessor");
        assert_eq!((*le).key, 20);
        let ge = Node::lookup_ge(&root as *const _, 25).expect("25 has a successor");
        assert_eq!((*ge).key, 30);
        assert!(Node::lookup_le(&root as *const _, 5).is_none());
        assert!(Node::lookup_ge(&root as *const _, 35).is_none());
    }
}

#[test]
fn duplicate_keys_form_an_insertion_ordered_chain() {
    let mut root: Root<Absolute> = Root::new();
    let mut nodes: Vec<Box<Node>> = (0..4).map(|_| Box::new(Node::new(5u32))).collect();
    insert_all(&mut root, &mut nodes);

    let mut count = 0;
    unsafe {
        let mut cur = Node::lookup(&root as *const _, 5);
        while let Some(n) = cur {
            assert_eq!((*n).key, 5);
            count += 1;
            cur = Node::next(n);
            if count > 4 {
                break;
            }
        }
    }
    assert_eq!(count, 4);
}

#[test]
fn delete_unlinks_without_disturbing_the_rest() {
    let mut root: Root<Absolute> = Root::new();
    let mut nodes: Vec<Box<Node>> = [1u32, 2, 3, 4, 5].iter().map(|&k| Box::new(Node::new(k))).collect();
    insert_all(&mut root, &mut nodes);

    unsafe {
        let victim = Node::lookup(&root as *const _, 3).unwrap();
        Node::delete(&mut root as *mut _, victim);
        assert!(Node::lookup(&root as *const _, 3).is_none());
        assert!(Node::lookup(&root as *const _, 2).is_some());
        assert!(Node::lookup(&root as *const _, 4).is_some());
    }

    let mut seen = Vec::new();
    unsafe {
        let mut cur = Node::first(&root as *const _);
        while let Some(n) = cur {
            seen.push((*n).key);
            cur = Node::next(n);
        }
    }
    assert_eq!(seen, vec![1, 2, 4, 5]);
}

#[test]
fn unique_insert_returns_the_existing_node() {
    let mut root: Root<Absolute> = Root::new();
    let mut first = Box::new(Node::new(9u32));
    let mut second = Box::new(Node::new(9u32));
    unsafe {
        let inserted_first = Node::insert(&mut root as *mut _, first.as_mut() as *mut Node, true);
        assert!(core::ptr::eq(inserted_first, first.as_mut() as *mut Node));
        let result = Node::insert(&mut root as *mut _, second.as_mut() as *mut Node, true);
        assert!(core::ptr::eq(result, first.as_mut() as *mut Node));
    }
}

#[test]
fn signed_keys_order_correctly_across_zero() {
    type SignedNode = IntNode<Absolute, i32>;
    let mut root: Root<Absolute> = Root::new();
    let keys = [-100i32, -1, 0, 1, 100];
    let mut nodes: Vec<Box<SignedNode>> = keys.iter().map(|&k| Box::new(SignedNode::new(k))).collect();
    for node in nodes.iter_mut() {
        unsafe {
            SignedNode::insert(&mut root as *mut _, node.as_mut() as *mut SignedNode, false);
        }
    }
    let mut seen = Vec::new();
    unsafe {
        let mut cur = SignedNode::first(&root as *const _);
        while let Some(n) = cur {
            seen.push((*n).key);
            cur = SignedNode::next(n);
        }
    }
    assert_eq!(seen, vec![-100, -1, 0, 1, 100]);
}
