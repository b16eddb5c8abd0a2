use super::AvlMap;

const N: i32 = 1_000;

#[test]
fn test_new() {
    let map_i32 = AvlMap::<i32, ()>::new();
    assert!(map_i32.is_empty());
    assert_eq!(map_i32.len(), 0);
    map_i32.check_consistency();

    let map_i8 = AvlMap::<i8, ()>::new();
    assert!(map_i8.is_empty());
    map_i8.check_consistency();

    let map_string = AvlMap::<String, String>::new();
    assert!(map_string.is_empty());
    map_string.check_consistency();
}

#[test]
fn test_rebalance() {
    {
        //     3 ->   2
        //    /      / \
        //   2      1   3
        //  /
        // 1
        let mut map = AvlMap::new();
        map.insert(3, ());
        map.insert(2, ());
        map.insert(1, ());
        map.check_consistency();
        assert_eq!(map.height(), 1);
    }
    {
        //     3   ->     3 ->   2
        //    / \        /      / \
        //   2   4      2      1   3
        //  /          /
        // 1          1
        let mut map = AvlMap::new();
        map.insert(3, ());
        map.insert(2, ());
        map.insert(4, ());
        map.insert(1, ());
        map.check_consistency();
        assert_eq!(map.height(), 2);
        map.remove(&4);
        map.check_consistency();
        assert_eq!(map.height(), 1);
    }
    {
        //   3  ->   2
        //  /       / \
        // 1       1   3
        //  \
        //   2
        let mut map = AvlMap::new();
        map.insert(3, ());
        map.insert(1, ());
        map.insert(2, ());
        map.check_consistency();
        assert_eq!(map.height(), 1);
    }
    {
        //   3   ->   3  ->   2
        //  / \      /       / \
        // 1   4    1       1   3
        //  \        \
        //   2        2
        let mut map = AvlMap::new();
        map.insert(3, ());
        map.insert(1, ());
        map.insert(4, ());
        map.insert(2, ());
        map.check_consistency();
        assert_eq!(map.height(), 2);
        map.remove(&4);
        map.check_consistency();
        assert_eq!(map.height(), 1);
    }
}

#[test]
fn test_insert() {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(0);
    let mut keys: Vec<i32> = (0..N).map(|_| rng.gen()).collect();
    keys.sort_unstable();
    keys.dedup();

    let mut map = AvlMap::new();
    for key in keys.iter() {
        assert_eq!(map.insert(*key, *key), None);
        map.check_consistency();
    }
    assert_eq!(map.len(), keys.len());

    // A second insert of the same key overwrites in place
    for key in keys.iter() {
        assert_eq!(map.insert(*key, *key + 1), Some(*key));
    }
    assert_eq!(map.len(), keys.len());
    for key in keys.iter() {
        assert_eq!(map.get(key), Some(&(*key + 1)));
    }
    map.check_consistency();
}

#[test]
fn test_insert_sorted_range() {
    let keys: Vec<i32> = (0..N).collect();
    let mut map = AvlMap::new();
    for key in keys.iter() {
        assert!(map.insert(*key, ()).is_none());
        map.check_consistency();
    }
    assert_eq!(map.len(), keys.len());
    assert!(map.height() > 0);
    assert!(map.height() < keys.len() / 2);
}

#[test]
fn test_insert_ascending_keeps_logarithmic_height() {
    // Worst case for an unbalanced tree: 7 ascending keys would build a
    // chain of height 6; the AVL tree settles at the perfect height.
    let mut map = AvlMap::new();
    for key in 1..=7 {
        map.insert(key, ());
        map.check_consistency();
    }
    assert_eq!(map.height(), 2);
}

#[test]
fn test_insert_shuffled_range() {
    use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

    let mut keys: Vec<i32> = (0..N).collect();
    let mut rng = StdRng::seed_from_u64(0);
    keys.shuffle(&mut rng);

    let mut map = AvlMap::new();
    for key in keys.iter() {
        assert!(map.insert(*key, *key).is_none());
        map.check_consistency();
    }
    assert_eq!(map.len(), keys.len());

    for key in keys.iter() {
        assert!(map.insert(*key, *key).is_some());
    }
    assert_eq!(map.len(), keys.len());
}

#[test]
fn test_get() {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(0);
    let keys: Vec<i32> = (0..N).map(|_| rng.gen()).collect();

    let mut map = AvlMap::new();
    assert!(map.get(&42).is_none());
    for key in keys.iter() {
        map.insert(*key, key.wrapping_mul(2));
    }

    for key in keys.iter() {
        assert_eq!(map.get(key), Some(&key.wrapping_mul(2)));
        assert_eq!(map.get_key_value(key), Some((key, &key.wrapping_mul(2))));
        assert!(map.contains_key(key));
    }
    assert!(map.get(&-42).is_none());
    assert!(!map.contains_key(&-42));
}

#[test]
fn test_get_borrowed_key() {
    let mut map = AvlMap::new();
    map.insert(String::from("one"), 1);
    map.insert(String::from("two"), 2);

    // Lookups work with any borrowed form of the key
    assert_eq!(map.get("one"), Some(&1));
    assert!(map.contains_key("two"));
    assert_eq!(map.remove("one"), Some(1));
    assert!(map.get("one").is_none());
    map.check_consistency();
}

#[test]
fn test_clear() {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(0);
    let mut keys: Vec<i32> = (0..N).map(|_| rng.gen()).collect();
    keys.sort_unstable();
    keys.dedup();

    let mut map = AvlMap::new();
    for key in keys.iter() {
        map.insert(*key, *key);
    }
    assert!(!map.is_empty());
    assert_eq!(map.len(), keys.len());

    map.clear();
    assert!(map.is_empty());
    assert_eq!(map.len(), 0);
    map.check_consistency();

    for key in keys.iter() {
        assert!(map.insert(*key, *key).is_none());
    }
    assert!(!map.is_empty());
    assert_eq!(map.len(), keys.len());
    map.check_consistency();
}

#[test]
fn test_remove() {
    use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(0);
    let mut keys: Vec<i32> = (0..N).map(|_| rng.gen()).collect();
    keys.sort_unstable();
    keys.dedup();

    let mut map = AvlMap::new();
    for key in keys.iter() {
        map.insert(*key, *key);
    }

    keys.shuffle(&mut rng);
    for key in keys.iter() {
        assert!(map.get(key).is_some());
        assert_eq!(map.remove(key), Some(*key));
        assert!(map.get(key).is_none());
        map.check_consistency();
    }
    assert!(map.is_empty());
    assert_eq!(map.len(), 0);
}

#[test]
fn test_remove_absent_key() {
    let mut map: AvlMap<i32, i32> = (0..10).map(|key| (key, key)).collect();
    let before: Vec<(i32, i32)> = map.iter().map(|(k, v)| (*k, *v)).collect();

    assert_eq!(map.remove(&42), None);
    assert_eq!(map.remove_entry(&-1), None);
    assert_eq!(map.len(), 10);

    // The traversal sequence is untouched
    let after: Vec<(i32, i32)> = map.iter().map(|(k, v)| (*k, *v)).collect();
    assert_eq!(before, after);
    map.check_consistency();
}

#[test]
fn test_remove_root() {
    // Removing the root of a two node tree promotes the right child
    let mut map = AvlMap::new();
    map.insert(1, "one");
    map.insert(2, "two");
    assert_eq!(map.remove(&1), Some("one"));
    map.check_consistency();
    assert_eq!(map.len(), 1);
    assert_eq!(map.height(), 0);
    assert_eq!(map.get(&2), Some(&"two"));

    // Mirror image: the root keeps only a left child
    let mut map = AvlMap::new();
    map.insert(2, "two");
    map.insert(1, "one");
    assert_eq!(map.remove(&2), Some("two"));
    map.check_consistency();
    assert_eq!(map.len(), 1);
    assert_eq!(map.height(), 0);
    assert_eq!(map.get(&1), Some(&"one"));

    // Root with two children is replaced by its in-order successor
    let mut map: AvlMap<i32, ()> = (1..=7).map(|key| (key, ())).collect();
    let root_key = 4;
    assert!(map.remove(&root_key).is_some());
    map.check_consistency();
    let keys: Vec<i32> = map.iter().map(|(k, _)| *k).collect();
    assert_eq!(keys, vec![1, 2, 3, 5, 6, 7]);
}

#[test]
fn test_round_trip_permutation() {
    use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

    let mut rng = StdRng::seed_from_u64(7);
    let mut keys: Vec<i32> = (1..=N).collect();

    keys.shuffle(&mut rng);
    let mut map = AvlMap::new();
    for key in keys.iter() {
        map.insert(*key, ());
        map.check_consistency();
    }
    assert_eq!(map.len(), keys.len());

    keys.shuffle(&mut rng);
    for key in keys.iter() {
        assert!(map.remove(key).is_some());
        map.check_consistency();
    }
    assert!(map.is_empty());
}

#[test]
fn test_iter() {
    let mut map = AvlMap::new();
    assert!(map.iter().next().is_none());

    for key in [5, 3, 8, 1, 4, 7, 9] {
        map.insert(key, key * 10);
    }

    let entries: Vec<(i32, i32)> = map.iter().map(|(k, v)| (*k, *v)).collect();
    assert_eq!(
        entries,
        vec![(1, 10), (3, 30), (4, 40), (5, 50), (7, 70), (8, 80), (9, 90)]
    );
    assert!(map.height() <= 3);

    // An exhausted iterator stays exhausted
    let mut iter = map.iter();
    while iter.next().is_some() {}
    assert!(iter.next().is_none());
    assert!(iter.next().is_none());
}

#[test]
fn test_iter_clone() {
    let map: AvlMap<i32, ()> = (0..10).map(|key| (key, ())).collect();

    let mut iter = map.iter();
    iter.next();
    iter.next();

    // A cloned iterator advances independently from its original
    let forked = iter.clone();
    let rest: Vec<i32> = iter.map(|(k, _)| *k).collect();
    let forked_rest: Vec<i32> = forked.map(|(k, _)| *k).collect();
    assert_eq!(rest, forked_rest);
    assert_eq!(rest, (2..10).collect::<Vec<i32>>());
}

#[test]
fn test_into_iter() {
    let map: AvlMap<i32, String> = (0..10).map(|key| (key, key.to_string())).collect();
    let entries: Vec<(i32, String)> = map.into_iter().collect();
    assert_eq!(entries.len(), 10);
    for (index, (key, value)) in entries.iter().enumerate() {
        assert_eq!(*key, index as i32);
        assert_eq!(*value, index.to_string());
    }

    // Dropping a partly consumed owning iterator frees the rest
    let map: AvlMap<i32, String> = (0..100).map(|key| (key, key.to_string())).collect();
    let mut into_iter = map.into_iter();
    assert_eq!(into_iter.next().map(|(k, _)| k), Some(0));
    assert_eq!(into_iter.next().map(|(k, _)| k), Some(1));
    drop(into_iter);
}

#[test]
fn test_from_iter() {
    // Last write wins for repeated keys
    let map: AvlMap<i32, &str> = [(1, "a"), (2, "b"), (1, "c")].into_iter().collect();
    assert_eq!(map.len(), 2);
    assert_eq!(map.get(&1), Some(&"c"));
    assert_eq!(map.get(&2), Some(&"b"));
    map.check_consistency();
}

#[test]
fn test_from_iter_merge() {
    let pairs = [(1, String::from("a")), (1, String::from("b"))];
    let map = AvlMap::from_iter_merge(pairs, |present, new| present + &new);
    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&1), Some(&String::from("ab")));
    map.check_consistency();

    // Without collisions the combiner is never consulted
    let pairs = (0..10).map(|key| (key, key));
    let map = AvlMap::from_iter_merge(pairs, |_, _| unreachable!());
    assert_eq!(map.len(), 10);
    map.check_consistency();
}

#[test]
fn test_extend() {
    let mut map: AvlMap<i32, i32> = (0..5).map(|key| (key, key)).collect();
    map.extend((5..10).map(|key| (key, key)));
    assert_eq!(map.len(), 10);
    let keys: Vec<i32> = map.iter().map(|(k, _)| *k).collect();
    assert_eq!(keys, (0..10).collect::<Vec<i32>>());
    map.check_consistency();
}

#[test]
fn test_eq() {
    // Equality is by entry sequence, not by insertion history
    let lhs: AvlMap<i32, i32> = (0..100).map(|key| (key, key)).collect();
    let rhs: AvlMap<i32, i32> = (0..100).rev().map(|key| (key, key)).collect();
    assert_eq!(lhs, rhs);

    let mut rhs = rhs;
    rhs.insert(0, 42);
    assert_ne!(lhs, rhs);
}

#[test]
fn test_debug() {
    let map: AvlMap<i32, &str> = [(2, "b"), (1, "a")].into_iter().collect();
    assert_eq!(format!("{map:?}"), r#"{1: "a", 2: "b"}"#);
}
