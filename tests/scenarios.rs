use oa_hash::Bucket;
use oa_hash::HashTable;
use oa_hash::InsertPolicy;
use oa_hash::RehashErrorKind;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use test_log::test;

const BUCKETS_SIZE: usize = 64;

fn buckets<'k, V>(capacity: usize) -> Vec<Bucket<&'k [u8], V>> {
    (0..capacity).map(|_| Bucket::EMPTY).collect()
}

#[test]
fn set_get_remove() {
    let value = 42;
    let mut storage = buckets(BUCKETS_SIZE);
    let mut table = HashTable::new(&mut storage);
    assert_eq!(table.len(), 0);
    assert_eq!(table.capacity(), BUCKETS_SIZE);

    let entry = table.set_entry(&b"key"[..], &value).unwrap();
    assert!(std::ptr::eq(*entry.get(), &value));

    let entry = table.get_entry(b"key").unwrap();
    assert_eq!(**entry.get(), 42);

    assert!(table.remove(b"key"));
    assert!(table.get_entry(b"key").is_none());
    assert!(table.get(b"key").is_none());
}

#[test]
fn collision() {
    let mut storage = buckets(BUCKETS_SIZE);
    let mut table = HashTable::new(&mut storage);

    assert!(table.set_entry(&b"test"[..], 1).is_some());
    assert!(table.set_entry(&b"test2"[..], 2).is_some());

    assert_eq!(table.get(b"test"), Some(&1));
    assert_eq!(table.get(b"test2"), Some(&2));
}

#[test]
fn linear_probing_wraparound() {
    let mut storage = buckets(BUCKETS_SIZE);
    let mut table = HashTable::new(&mut storage);

    // "cw" and "wc" share the last slot, so the second one wraps to slot 0.
    let first = table.set_entry(&b"cw"[..], 1).unwrap();
    assert_eq!(first.index(), BUCKETS_SIZE - 1);
    assert_eq!(*first.get(), 1);

    let second = table.set_entry(&b"wc"[..], 2).unwrap();
    assert_eq!(second.index(), 0);
    assert_eq!(*second.get(), 2);

    assert_eq!(table.get(b"cw"), Some(&1));
    assert_eq!(table.get(b"wc"), Some(&2));
}

#[test]
fn key_length_handling() {
    let mut storage = buckets(BUCKETS_SIZE);
    let mut table = HashTable::new(&mut storage);

    assert!(table.set_entry(&b"u\0a"[..], 1).is_some());
    assert!(table.set_entry(&b"u\0b"[..], 2).is_some());
    assert_eq!(table.len(), 2);

    assert_eq!(table.get(b"u\0a"), Some(&1));
    assert_eq!(table.get(b"u\0b"), Some(&2));
    assert_eq!(table.get(b"u"), None);
    assert_eq!(table.get(b"u\0"), None);
}

#[test]
fn edge_cases() {
    let mut storage = buckets::<u32>(BUCKETS_SIZE);
    let mut table = HashTable::new(&mut storage);

    assert!(table.set_entry(&b""[..], 0).is_none());
    assert!(table.get_entry(b"").is_none());
    assert!(!table.remove(b""));
    assert_eq!(table.len(), 0);
}

#[test]
fn lookup_stops_at_empty() {
    let mut storage = buckets(BUCKETS_SIZE);
    let mut table = HashTable::new(&mut storage);

    let keys: [&[u8]; 3] = [b"a", b"b", b"c"];
    for key in keys {
        assert!(table.set_entry(key, 42).is_some());
    }

    assert!(table.get_entry(b"test").is_none());
}

#[test]
fn deletion_with_tombstones() {
    let mut storage = buckets(BUCKETS_SIZE);
    let mut table = HashTable::new(&mut storage);

    assert!(table.set_entry(&b"test1"[..], 1).is_some());
    assert!(table.set_entry(&b"test2"[..], 2).is_some());

    assert!(table.remove(b"test1"));
    assert_eq!(table.get(b"test2"), Some(&2));
    assert!(table.get_entry(b"test1").is_none());
    assert_eq!(table.tombstones(), 1);
}

#[test]
fn tombstone_transparency() {
    let mut storage = buckets(BUCKETS_SIZE);
    let mut table = HashTable::new(&mut storage);

    // Both keys start at the same slot; "wc" takes over the tombstone of "cw".
    let slot = table.set_entry(&b"cw"[..], 1).unwrap().index();
    assert!(table.remove(b"cw"));

    let entry = table.set_entry(&b"wc"[..], 2).unwrap();
    assert_eq!(entry.index(), slot);

    assert_eq!(table.get(b"cw"), None);
    assert_eq!(table.get(b"wc"), Some(&2));
    assert_eq!(table.len(), 1);
}

#[test]
fn update_not_duplicate() {
    let mut storage = buckets(BUCKETS_SIZE);
    let mut table = HashTable::new(&mut storage);

    table.set(&b"key"[..], 1).unwrap();
    table.set(&b"key"[..], 2).unwrap();

    assert_eq!(table.len(), 1);
    assert_eq!(table.get(b"key"), Some(&2));
}

#[test]
fn rehash_keeps_value() {
    let value = 42;
    let mut storage = buckets(BUCKETS_SIZE);
    let mut new_storage = buckets(BUCKETS_SIZE * 2);
    let mut table = HashTable::new(&mut storage);

    assert!(table.set_entry(&b"key"[..], &value).is_some());

    let old = table.rehash(&mut new_storage).unwrap();
    assert_eq!(old.len(), BUCKETS_SIZE);
    assert_eq!(table.capacity(), BUCKETS_SIZE * 2);

    let entry = table.get_entry(b"key").unwrap();
    assert!(std::ptr::eq(*entry.get(), &value));
}

#[test]
fn rehash_rejects_equal_capacity() {
    let mut storage = buckets(BUCKETS_SIZE);
    let mut same = buckets(BUCKETS_SIZE);
    let mut table = HashTable::new(&mut storage);
    table.set(&b"key"[..], 1).unwrap();

    let err = table.rehash(&mut same).unwrap_err();
    assert_eq!(
        err.kind(),
        RehashErrorKind::CapacityNotLarger {
            current: BUCKETS_SIZE,
            requested: BUCKETS_SIZE,
        }
    );
    assert_eq!(table.capacity(), BUCKETS_SIZE);
    assert_eq!(table.get(b"key"), Some(&1));

    // The rejected storage comes back unchanged and can be written to.
    let rejected = err.into_storage();
    assert_eq!(rejected.len(), BUCKETS_SIZE);
    assert!(rejected.iter().all(Bucket::is_empty));
    rejected[0] = Bucket::EMPTY;
    assert_eq!(table.get(b"key"), Some(&1));
}

#[test]
fn grow_on_demand() {
    let mut rng = SmallRng::seed_from_u64(0xDEC0DE);
    let keys: Vec<Vec<u8>> = (0..300u32)
        .map(|i| {
            let mut key = i.to_le_bytes().to_vec();
            key.extend((0..rng.random_range(0..8)).map(|_| rng.random::<u8>()));
            key
        })
        .collect();

    let mut generations: Vec<Vec<Bucket<&[u8], usize>>> = [8, 16, 32, 64, 128, 256, 512]
        .into_iter()
        .map(buckets)
        .collect();
    let mut generations = generations.iter_mut();
    let mut table = HashTable::new(generations.next().unwrap());
    let mut removed = Vec::new();

    for (i, key) in keys.iter().enumerate() {
        if table.set(key, i).is_none() {
            let old = table.rehash(generations.next().unwrap()).unwrap();
            assert!(old.len() < table.capacity());
            table.set(key, i).unwrap();
        }
        if i % 5 == 0 {
            assert!(table.remove(&keys[i / 2]));
            removed.push(i / 2);
        }
    }

    for (i, key) in keys.iter().enumerate() {
        let expected = (!removed.contains(&i)).then_some(&i);
        assert_eq!(table.get(key), expected);
    }
    assert_eq!(table.len(), keys.len() - removed.len());
}

#[test]
fn saturated_by_tombstones() {
    let keys: [&[u8]; 4] = [b"k0", b"k1", b"k2", b"k3"];

    let mut grown = buckets(8);
    let mut strict_storage = buckets(4);
    let mut strict = HashTable::new(&mut strict_storage);
    let mut reclaim_storage = buckets(4);
    let mut reclaim =
        HashTable::with_policy(&mut reclaim_storage, InsertPolicy::ReclaimTombstones);

    for (i, key) in keys.into_iter().enumerate() {
        strict.set(key, i).unwrap();
        reclaim.set(key, i).unwrap();
    }
    for key in keys {
        assert!(strict.remove(key));
        assert!(reclaim.remove(key));
    }

    assert!(strict.is_empty());
    assert!(strict.set(&b"new"[..], 9).is_none());
    assert!(reclaim.set(&b"new"[..], 9).is_some());

    strict.rehash(&mut grown).unwrap();
    assert_eq!(strict.tombstones(), 0);
    assert!(strict.set(&b"new"[..], 9).is_some());
}
