//! Coverage for fixed-length byte keys, including the longest-prefix-match
//! (CIDR-style) variant.
use ebtree::key::bytes::ByteNode;
use ebtree::node::Root;
use ebtree::storage::Absolute;

type Node4 = ByteNode<Absolute, 4>;

fn insert_all(root: &mut Root<Absolute>, nodes: &mut [Box<Node4>]) {
    for node in nodes.iter_mut() {
        unsafe {
            Node4::insert(root as *mut _, node.as_mut() as *mut Node4, false);
        }
    }
}

#[test]
fn exact_match_over_full_key() {
    let mut root: Root<Absolute> = Root::new();
    let mut nodes: Vec<Box<Node4>> = [[10, 0, 0, 1], [10, 0, 0, 2], [192, 168, 1, 1]]
        .iter()
        .map(|&k| Box::new(Node4::new(k)))
        .collect();
    insert_all(&mut root, &mut nodes);

    unsafe {
        assert!(Node4::lookup(&root as *const _, &[10, 0, 0, 1]).is_some());
        assert!(Node4::lookup(&root as *const _, &[10, 0, 0, 3]).is_none());
    }
}

#[test]
fn ordered_iteration_is_byte_lexicographic() {
    let mut root: Root<Absolute> = Root::new();
    let mut nodes: Vec<Box<Node4>> = [[0, 0, 0, 1], [0, 0, 0, 255], [1, 0, 0, 0], [0, 0, 1, 0]]
        .iter()
        .map(|&k| Box::new(Node4::new(k)))
        .collect();
    insert_all(&mut root, &mut nodes);

    let mut seen = Vec::new();
    unsafe {
        let mut cur = Node4::first(&root as *const _);
        while let Some(n) = cur {
            seen.push((*n).key);
            cur = Node4::next(n);
        }
    }
    assert_eq!(seen, vec![[0, 0, 0, 1], [0, 0, 0, 255], [0, 0, 1, 0], [1, 0, 0, 0]]);
}

#[test]
fn longest_prefix_match_picks_the_most_specific_route() {
    let mut root: Root<Absolute> = Root::new();
    let mut default_route = Box::new(Node4::new([0, 0, 0, 0]));
    let mut ten_slash_8 = Box::new(Node4::new([10, 0, 0, 0]));
    let mut ten_one_slash_16 = Box::new(Node4::new([10, 1, 0, 0]));

    unsafe {
        Node4::insert_prefix(&mut root as *mut _, default_route.as_mut() as *mut Node4, 0);
        Node4::insert_prefix(&mut root as *mut _, ten_slash_8.as_mut() as *mut Node4, 8);
        Node4::insert_prefix(&mut root as *mut _, ten_one_slash_16.as_mut() as *mut Node4, 16);

        let hit = Node4::lookup_longest(&root as *const _, &[10, 1, 2, 3]).expect("a route matches");
        assert_eq!((*hit).key, [10, 1, 0, 0]);

        let hit = Node4::lookup_longest(&root as *const _, &[10, 2, 0, 0]).expect("falls back to /8");
        assert_eq!((*hit).key, [10, 0, 0, 0]);

        let hit = Node4::lookup_longest(&root as *const _, &[8, 8, 8, 8]).expect("falls back to default");
        assert_eq!((*hit).key, [0, 0, 0, 0]);
    }
}

#[test]
fn delete_removes_only_the_targeted_node() {
    let mut root: Root<Absolute> = Root::new();
    let mut nodes: Vec<Box<Node4>> = [[1, 1, 1, 1], [2, 2, 2, 2], [3, 3, 3, 3]]
        .iter()
        .map(|&k| Box::new(Node4::new(k)))
        .collect();
    insert_all(&mut root, &mut nodes);

    unsafe {
        let victim = Node4::lookup(&root as *const _, &[2, 2, 2, 2]).unwrap();
        Node4::delete(&mut root as *mut _, victim);
        assert!(Node4::lookup(&root as *const _, &[2, 2, 2, 2]).is_none());
        assert!(Node4::lookup(&root as *const _, &[1, 1, 1, 1]).is_some());
        assert!(Node4::lookup(&root as *const _, &[3, 3, 3, 3]).is_some());
    }
}
