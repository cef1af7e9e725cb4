//! Integration tests for the LodestoneDB storage core: the buffer
//! pool, the file disk manager, the header page, and the B+ tree
//! working together end to end.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::tempdir;

use lodestone_buffer::{BufferPoolConfig, BufferPoolManager};
use lodestone_common::{DiskManager, LodestoneError, PageId, Rid, StorageConfig, PAGE_SIZE};
use lodestone_storage::{BPlusTree, DiskManagerConfig, FileDiskManager, GenericKey, StorageEngine};

fn open_engine(path: &Path, pool_pages: usize) -> StorageEngine {
    StorageEngine::open(StorageConfig {
        data_path: path.to_path_buf(),
        buffer_pool_pages: pool_pages,
        replacer_k: 2,
        hash_bucket_size: 4,
        fsync_enabled: false,
    })
    .unwrap()
}

fn rid(key: i64) -> Rid {
    Rid::from_key(key)
}

#[test]
fn test_engine_open_reserves_header_page() {
    let dir = tempdir().unwrap();
    let engine = open_engine(&dir.path().join("data.db"), 16);

    assert_eq!(engine.disk().num_pages(), 1);
    // the first allocated page is never page 0
    let (page_id, _) = engine.buffer_pool().new_page().unwrap();
    assert_eq!(page_id, PageId(1));
    engine.buffer_pool().unpin_page(page_id, false);
    engine.close().unwrap();
}

#[test]
fn test_pool_exhaustion_and_recovery() {
    let dir = tempdir().unwrap();
    let engine = open_engine(&dir.path().join("data.db"), 2);
    let pool = engine.buffer_pool();

    let (p1, _) = pool.new_page().unwrap();
    let (p2, _) = pool.new_page().unwrap();
    assert!(matches!(
        pool.new_page().unwrap_err(),
        LodestoneError::PoolExhausted
    ));

    assert!(pool.unpin_page(p1, false));
    let (p3, _) = pool.new_page().unwrap();
    assert!(pool.contains(p3));
    pool.unpin_page(p2, false);
    pool.unpin_page(p3, false);
    engine.close().unwrap();
}

#[test]
fn test_flush_delete_fetch_byte_identity() {
    let dir = tempdir().unwrap();
    let engine = open_engine(&dir.path().join("data.db"), 8);
    let pool = engine.buffer_pool();

    let (page_id, frame) = pool.new_page().unwrap();
    {
        let mut data = frame.write_data();
        for (i, byte) in data.iter_mut().enumerate() {
            *byte = (i % 251) as u8;
        }
    }
    pool.unpin_page(page_id, true);

    assert!(pool.flush_page(page_id).unwrap());
    assert!(pool.delete_page(page_id).unwrap());

    let frame = pool.fetch_page(page_id).unwrap();
    {
        let data = frame.read_data();
        for (i, byte) in data.iter().enumerate() {
            assert_eq!(*byte, (i % 251) as u8, "byte {i}");
        }
    }
    pool.unpin_page(page_id, false);
    engine.close().unwrap();
}

#[test]
fn test_eviction_pressure_preserves_page_contents() {
    let dir = tempdir().unwrap();
    let engine = open_engine(&dir.path().join("data.db"), 4);
    let pool = engine.buffer_pool();

    // write 32 pages through a 4-frame pool, forcing constant eviction
    let mut ids = Vec::new();
    for i in 0..32u8 {
        let (page_id, frame) = pool.new_page().unwrap();
        frame.write_data()[0] = i;
        pool.unpin_page(page_id, true);
        ids.push(page_id);
    }

    for (i, page_id) in ids.iter().enumerate() {
        let frame = pool.fetch_page(*page_id).unwrap();
        assert_eq!(frame.read_data()[0], i as u8);
        pool.unpin_page(*page_id, false);
    }
    assert_eq!(pool.stats().pinned_frames, 0);
    engine.close().unwrap();
}

#[test]
fn test_tree_survives_engine_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.db");

    {
        let engine = open_engine(&path, 16);
        let tree: BPlusTree<i64> =
            BPlusTree::create("users_pk", engine.buffer_pool(), 32, 32).unwrap();
        for k in 0..500 {
            assert!(tree.insert(k, rid(k)).unwrap());
        }
        engine.close().unwrap();
    }

    let engine = open_engine(&path, 16);
    let tree: BPlusTree<i64> = BPlusTree::create("users_pk", engine.buffer_pool(), 32, 32).unwrap();
    assert!(!tree.is_empty());
    for k in 0..500 {
        assert_eq!(tree.get(&k).unwrap(), Some(rid(k)), "get {k}");
    }
    let collected: Vec<i64> = tree.iter().unwrap().map(|e| e.unwrap().0).collect();
    assert_eq!(collected, (0..500).collect::<Vec<_>>());
    engine.close().unwrap();
}

#[test]
fn test_random_soak_against_oracle() {
    let dir = tempdir().unwrap();
    let engine = open_engine(&dir.path().join("data.db"), 64);
    let tree: BPlusTree<GenericKey<8>> =
        BPlusTree::create("soak", engine.buffer_pool(), 16, 16).unwrap();

    let mut rng = StdRng::seed_from_u64(0x10DE_57);
    let mut oracle: BTreeMap<i64, Rid> = BTreeMap::new();

    for _ in 0..4000 {
        let key = rng.gen_range(0..1500i64);
        if rng.gen_bool(0.6) {
            let inserted = tree.insert(key.into(), rid(key)).unwrap();
            let expected = !oracle.contains_key(&key);
            assert_eq!(inserted, expected, "insert {key}");
            oracle.entry(key).or_insert_with(|| rid(key));
        } else {
            let removed = tree.remove(&key.into()).unwrap();
            assert_eq!(removed, oracle.remove(&key).is_some(), "remove {key}");
        }
    }

    // point lookups agree with the oracle
    for key in 0..1500i64 {
        assert_eq!(
            tree.get(&key.into()).unwrap(),
            oracle.get(&key).copied(),
            "get {key}"
        );
    }

    // full iteration equals the sorted surviving set
    let collected: Vec<(GenericKey<8>, Rid)> =
        tree.iter().unwrap().map(|e| e.unwrap()).collect();
    let expected: Vec<(GenericKey<8>, Rid)> = oracle
        .iter()
        .map(|(k, v)| (GenericKey::from(*k), *v))
        .collect();
    assert_eq!(collected, expected);

    assert_eq!(engine.buffer_pool().stats().pinned_frames, 0);
    engine.close().unwrap();
}

#[test]
fn test_iterator_pins_released_after_partial_scan() {
    let dir = tempdir().unwrap();
    let engine = open_engine(&dir.path().join("data.db"), 16);
    let pool = engine.buffer_pool();
    let tree: BPlusTree<i64> = BPlusTree::create("scan", Arc::clone(&pool), 3, 3).unwrap();
    for k in 0..50 {
        tree.insert(k, rid(k)).unwrap();
    }

    {
        let mut iter = tree.iter_from(&10).unwrap();
        assert_eq!(iter.next().unwrap().unwrap().0, 10);
        assert_eq!(iter.next().unwrap().unwrap().0, 11);
        assert!(pool.stats().pinned_frames > 0);
    }
    assert_eq!(pool.stats().pinned_frames, 0);
    engine.close().unwrap();
}

#[test]
fn test_range_scan_across_leaves() {
    let dir = tempdir().unwrap();
    let engine = open_engine(&dir.path().join("data.db"), 32);
    let tree: BPlusTree<i64> = BPlusTree::create("range", engine.buffer_pool(), 3, 3).unwrap();
    for k in (0..100).step_by(2) {
        tree.insert(k, rid(k)).unwrap();
    }

    let from_mid: Vec<i64> = tree
        .iter_from(&31)
        .unwrap()
        .map(|e| e.unwrap().0)
        .collect();
    assert_eq!(from_mid, (32..100).step_by(2).collect::<Vec<_>>());
    engine.close().unwrap();
}

#[test]
fn test_multiple_indexes_in_one_header() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.db");

    {
        let engine = open_engine(&path, 32);
        let a: BPlusTree<i64> = BPlusTree::create("idx_a", engine.buffer_pool(), 8, 8).unwrap();
        let b: BPlusTree<i64> = BPlusTree::create("idx_b", engine.buffer_pool(), 8, 8).unwrap();
        for k in 0..100 {
            a.insert(k, rid(k)).unwrap();
            b.insert(k * 2, rid(k * 2)).unwrap();
        }
        engine.close().unwrap();
    }

    let engine = open_engine(&path, 32);
    let a: BPlusTree<i64> = BPlusTree::create("idx_a", engine.buffer_pool(), 8, 8).unwrap();
    let b: BPlusTree<i64> = BPlusTree::create("idx_b", engine.buffer_pool(), 8, 8).unwrap();
    assert_ne!(a.root_page_id(), b.root_page_id());
    assert_eq!(a.get(&99).unwrap(), Some(rid(99)));
    assert_eq!(b.get(&198).unwrap(), Some(rid(198)));
    assert_eq!(b.get(&99).unwrap(), None);
    engine.close().unwrap();
}

#[test]
fn test_tree_through_eviction_pressure() {
    // pool much smaller than the tree, so nodes cycle through disk
    let dir = tempdir().unwrap();
    let engine = open_engine(&dir.path().join("data.db"), 8);
    let tree: BPlusTree<i64> = BPlusTree::create("evict", engine.buffer_pool(), 4, 4).unwrap();

    for k in 0..1000 {
        assert!(tree.insert(k, rid(k)).unwrap(), "insert {k}");
    }
    for k in (0..1000).step_by(3) {
        assert!(tree.remove(&k).unwrap(), "remove {k}");
    }
    for k in 0..1000 {
        let expected = if k % 3 == 0 { None } else { Some(rid(k)) };
        assert_eq!(tree.get(&k).unwrap(), expected, "get {k}");
    }
    assert_eq!(engine.buffer_pool().stats().pinned_frames, 0);
    engine.close().unwrap();
}

#[test]
fn test_bare_pool_over_file_disk() {
    // the pool works directly over the disk manager without the engine
    let dir = tempdir().unwrap();
    let disk = Arc::new(
        FileDiskManager::open(DiskManagerConfig {
            path: dir.path().join("raw.db"),
            fsync_enabled: false,
        })
        .unwrap(),
    );
    let pool = BufferPoolManager::new(
        BufferPoolConfig {
            pool_size: 4,
            replacer_k: 2,
            bucket_size: 4,
        },
        Arc::clone(&disk) as Arc<dyn DiskManager>,
    );

    let (page_id, frame) = pool.new_page().unwrap();
    frame.write_data()[123] = 0x5C;
    pool.unpin_page(page_id, true);
    pool.flush_all().unwrap();

    let mut buf = [0u8; PAGE_SIZE];
    disk.read_page(page_id, &mut buf).unwrap();
    assert_eq!(buf[123], 0x5C);
}
