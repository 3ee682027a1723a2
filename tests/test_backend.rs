//! Tests for round-robin backend selection

use rotary::proxy::backend::BackendPool;
use std::collections::HashMap;

fn pool(addrs: &[&str]) -> BackendPool {
    BackendPool::new(addrs.iter().map(|a| a.to_string()).collect()).unwrap()
}

#[test]
fn test_backend_pool_rejects_empty_list() {
    assert!(BackendPool::new(vec![]).is_err());
}

#[test]
fn test_backend_pool_creation() {
    let pool = pool(&["localhost:9001", "localhost:9002"]);
    assert_eq!(pool.len(), 2);
    assert!(!pool.is_empty());
    assert_eq!(pool.addrs(), ["localhost:9001", "localhost:9002"]);
}

#[tokio::test]
async fn test_backend_pool_round_robin_selection() {
    let pool = pool(&["A", "B"]);

    let first = pool.pick_next().await;
    let second = pool.pick_next().await;
    let third = pool.pick_next().await;

    assert_eq!(first.addr, "A");
    assert_eq!(second.addr, "B");
    assert_eq!(third.addr, "A"); // Wraps around
}

#[tokio::test]
async fn test_backend_pool_sequence_matches_rotation() {
    let pool = pool(&["a:1", "b:2", "c:3"]);

    for n in 0..20 {
        let backend = pool.pick_next().await;
        assert_eq!(backend.index, n % 3);
        assert_eq!(backend.addr, pool.addrs()[n % 3]);
    }
}

#[tokio::test]
async fn test_backend_pool_single_backend() {
    let pool = pool(&["only:1"]);
    for _ in 0..5 {
        assert_eq!(pool.pick_next().await.index, 0);
    }
}

#[tokio::test]
async fn test_backend_pool_clones_share_cursor() {
    let pool = pool(&["a:1", "b:2"]);
    let other = pool.clone();

    assert_eq!(pool.pick_next().await.index, 0);
    assert_eq!(other.pick_next().await.index, 1);
    assert_eq!(pool.pick_next().await.index, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_backend_pool_concurrent_picks_never_skip() {
    let pool = pool(&["a:1", "b:2", "c:3"]);
    let picks = 300;

    let mut handles = Vec::new();
    for _ in 0..picks {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move { pool.pick_next().await.index }));
    }

    let mut counts: HashMap<usize, usize> = HashMap::new();
    for handle in handles {
        *counts.entry(handle.await.unwrap()).or_default() += 1;
    }

    assert_eq!(counts.len(), 3);
    for index in 0..3 {
        assert_eq!(counts[&index], picks / 3);
    }

    // Cursor is back at the start after a multiple of the pool size
    assert_eq!(pool.pick_next().await.index, 0);
}
