use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use bindex::core::error::IndexError;
use bindex::session::Session;
use bindex::storage::block::BLOCK_SIZE;
use bindex::storage::header::MAGIC;
use bindex::storage::index::BTreeIndex;
use bindex::storage::node::Node;
use tempfile::tempdir;

/// Decode one block straight from the file, bypassing the engine.
fn read_block_raw(path: &Path, id: u64) -> [u8; BLOCK_SIZE] {
    let mut file = fs::File::open(path).unwrap();
    file.seek(SeekFrom::Start(id * BLOCK_SIZE as u64)).unwrap();
    let mut buf = [0u8; BLOCK_SIZE];
    file.read_exact(&mut buf).unwrap();
    buf
}

fn read_node_raw(path: &Path, id: u64) -> Node {
    Node::from_bytes(&read_block_raw(path, id))
}

fn extracted_pairs(path: &Path) -> Vec<(u64, u64)> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| {
            let (k, v) = line.split_once(',').unwrap();
            (k.parse().unwrap(), v.parse().unwrap())
        })
        .collect()
}

#[test]
fn create_insert_search_extract() {
    let dir = tempdir().unwrap();
    let idx = dir.path().join("scenario.idx");

    let mut session = Session::new();
    session.create(&idx).unwrap();
    session.insert(5, 50).unwrap();
    session.insert(3, 30).unwrap();
    session.insert(9, 90).unwrap();

    assert_eq!(session.search(3).unwrap(), Some((3, 30)));
    assert_eq!(session.search(7).unwrap(), None);

    let out = dir.path().join("pairs.csv");
    let count = session.extract(&out).unwrap();
    assert_eq!(count, 3);
    assert_eq!(fs::read_to_string(&out).unwrap(), "3,30\n5,50\n9,90\n");
}

#[test]
fn twentieth_key_splits_the_root() {
    let dir = tempdir().unwrap();
    let idx = dir.path().join("split.idx");

    let mut index = BTreeIndex::create(&idx).unwrap();
    for key in 1..=19 {
        index.insert(key, key * 10).unwrap();
    }
    assert_eq!(index.root_id(), 1);
    assert_eq!(index.next_id(), 2);

    index.insert(20, 200).unwrap();

    // Exactly one root split: ids advanced by two, root moved.
    assert_eq!(index.root_id(), 2);
    assert_eq!(index.next_id(), 4);

    let root = read_node_raw(&idx, 2);
    assert!(!root.is_leaf);
    assert_eq!(root.active_keys(), &[10]);
    assert_eq!(&root.children[0..2], &[1, 3]);

    let left = read_node_raw(&idx, 1);
    let right = read_node_raw(&idx, 3);
    assert!(left.is_leaf);
    assert!(right.is_leaf);
    assert_eq!(left.active_keys(), (1..=9).collect::<Vec<u64>>());
    assert_eq!(right.active_keys(), (11..=20).collect::<Vec<u64>>());
}

#[test]
fn header_and_pairs_survive_reopen() {
    let dir = tempdir().unwrap();
    let idx = dir.path().join("reopen.idx");

    {
        let mut index = BTreeIndex::create(&idx).unwrap();
        index.insert(1, 1).unwrap();
    }

    let header = read_block_raw(&idx, 0);
    assert_eq!(&header[0..8], MAGIC);
    assert_eq!(header[8..16], 1u64.to_be_bytes());
    assert_eq!(header[16..24], 2u64.to_be_bytes());
    assert!(header[24..].iter().all(|&b| b == 0));

    let mut reopened = BTreeIndex::open(&idx).unwrap();
    assert_eq!(reopened.root_id(), 1);
    assert_eq!(reopened.next_id(), 2);
    assert_eq!(reopened.search(1).unwrap(), Some((1, 1)));
}

#[test]
fn many_pairs_survive_reopen() {
    let dir = tempdir().unwrap();
    let idx = dir.path().join("bulk.idx");

    {
        let mut index = BTreeIndex::create(&idx).unwrap();
        for i in 0u64..150 {
            let key = (i * 131) % 1009;
            index.insert(key, key * 2).unwrap();
        }
    }

    let mut reopened = BTreeIndex::open(&idx).unwrap();
    for i in 0u64..150 {
        let key = (i * 131) % 1009;
        assert_eq!(reopened.search(key).unwrap(), Some((key, key * 2)));
    }
}

#[test]
fn rejects_file_without_magic() {
    let dir = tempdir().unwrap();
    let junk = dir.path().join("junk.bin");
    fs::write(&junk, [0xABu8; BLOCK_SIZE]).unwrap();

    let mut session = Session::new();
    assert!(matches!(
        session.open(&junk),
        Err(IndexError::NotAnIndex(_))
    ));

    // The session stays unopened.
    assert!(!session.is_open());
    assert!(matches!(
        session.insert(1, 1),
        Err(IndexError::NoSessionOpen)
    ));
}

#[test]
fn open_missing_file_reports_not_found() {
    let dir = tempdir().unwrap();
    let mut session = Session::new();
    assert!(matches!(
        session.open(&dir.path().join("missing.idx")),
        Err(IndexError::FileNotFound(_))
    ));
}

#[test]
fn bulk_load_is_lenient() {
    let dir = tempdir().unwrap();
    let idx = dir.path().join("load.idx");
    let input = dir.path().join("pairs.txt");
    fs::write(&input, "1,10\nabc\n2,20\n").unwrap();

    let mut session = Session::new();
    session.create(&idx).unwrap();

    let report = session.load(&input).unwrap();
    assert_eq!(report.inserted, 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0], (2, "abc".to_string()));

    assert_eq!(session.search(1).unwrap(), Some((1, 10)));
    assert_eq!(session.search(2).unwrap(), Some((2, 20)));
}

#[test]
fn duplicate_keys_both_reachable() {
    let dir = tempdir().unwrap();
    let idx = dir.path().join("dup.idx");

    let mut session = Session::new();
    session.create(&idx).unwrap();
    session.insert(4, 40).unwrap();
    session.insert(4, 99).unwrap();

    let (key, value) = session.search(4).unwrap().unwrap();
    assert_eq!(key, 4);
    assert!(value == 40 || value == 99);

    let out = dir.path().join("dup.csv");
    assert_eq!(session.extract(&out).unwrap(), 2);
    assert_eq!(extracted_pairs(&out), vec![(4, 40), (4, 99)]);
}

#[test]
fn ascending_inserts_keep_nodes_at_least_half_full() {
    let dir = tempdir().unwrap();
    let idx = dir.path().join("ascending.idx");

    let mut index = BTreeIndex::create(&idx).unwrap();
    for key in 1..=500u64 {
        index.insert(key, key).unwrap();
    }

    let root_id = index.root_id();
    let mut stack = vec![(root_id, true)];
    let mut seen = 0u64;
    while let Some((id, is_root)) = stack.pop() {
        let node = read_node_raw(&idx, id);
        seen += node.key_count as u64;

        for w in node.active_keys().windows(2) {
            assert!(w[0] < w[1]);
        }
        if !node.is_leaf {
            if !is_root {
                assert!(node.key_count >= 9, "underfull internal node {}", id);
            }
            for i in 0..=node.key_count {
                assert_ne!(node.children[i], 0);
                stack.push((node.children[i], false));
            }
            for i in node.key_count + 1..node.children.len() {
                assert_eq!(node.children[i], 0);
            }
        } else if !is_root {
            assert!(node.key_count >= 9);
        }
    }
    assert_eq!(seen, 500);

    let mut session = Session::new();
    session.open(&idx).unwrap();
    let out = dir.path().join("ascending.csv");
    assert_eq!(session.extract(&out).unwrap(), 500);
    let pairs = extracted_pairs(&out);
    assert_eq!(pairs.len(), 500);
    for w in pairs.windows(2) {
        assert!(w[0].0 <= w[1].0);
    }
}

#[test]
fn print_shows_structure_after_split() {
    let dir = tempdir().unwrap();
    let idx = dir.path().join("print.idx");

    let mut session = Session::new();
    session.create(&idx).unwrap();
    for key in 1..=20 {
        session.insert(key, key).unwrap();
    }

    let mut out = Vec::new();
    session.print(&mut out).unwrap();
    let dump = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = dump.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Node 2: [10]");
    assert!(lines[1].starts_with("  Node 1: [1, "));
    assert!(lines[2].starts_with("  Node 3: [11, "));
}

#[test]
fn extract_of_empty_tree_is_empty() {
    let dir = tempdir().unwrap();
    let idx = dir.path().join("empty.idx");

    let mut session = Session::new();
    session.create(&idx).unwrap();

    assert_eq!(session.search(1).unwrap(), None);

    let out = dir.path().join("empty.csv");
    assert_eq!(session.extract(&out).unwrap(), 0);
    assert_eq!(fs::read_to_string(&out).unwrap(), "");
}
