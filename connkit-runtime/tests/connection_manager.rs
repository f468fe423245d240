mod common;

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use common::{Counters, Session, UserKey};
use connkit_runtime::{ConnectionManager, ExhaustedAction, PoolingProfile};

#[test]
fn test_acquire_opens_and_reuses_connections() {
    let counters = Arc::new(Counters::default());
    let manager = ConnectionManager::<Session>::new(Arc::clone(&counters), None);
    let key = UserKey::new("alice");

    let session = manager.acquire_connection(&key).unwrap();
    assert_eq!(session.user.as_deref(), Some("alice"));
    assert_eq!(manager.num_active(&key), 1);
    manager.release_connection(&key, session).unwrap();

    let session = manager.acquire_connection(&key).unwrap();
    assert_eq!(counters.created(), 1);
    assert_eq!(counters.opened(), 1);

    manager.destroy_connection(&key, session).unwrap();
    assert_eq!(counters.closed(), 1);
    assert_eq!(manager.total_active(), 0);
}

#[test]
fn test_invalid_idle_connection_is_reopened() {
    let counters = Arc::new(Counters::default());
    let manager = ConnectionManager::<Session>::new(Arc::clone(&counters), None);
    let key = UserKey::new("alice");

    let mut session = manager.acquire_connection(&key).unwrap();
    session.user = None;
    manager.release_connection(&key, session).unwrap();

    let session = manager.acquire_connection(&key).unwrap();
    assert_eq!(session.user.as_deref(), Some("alice"));
    assert_eq!(counters.created(), 1);
    assert_eq!(counters.opened(), 2);
}

#[test]
fn test_concurrent_acquire_respects_max_active() {
    const MAX_ACTIVE: usize = 3;

    let counters = Arc::new(Counters::default());
    let profile = PoolingProfile {
        max_active: MAX_ACTIVE as i64,
        max_idle: MAX_ACTIVE as i64,
        max_wait_ms: 0,
        exhausted_action: ExhaustedAction::Block,
    };
    let manager = ConnectionManager::<Session>::new(Arc::clone(&counters), Some(profile));
    let key = UserKey::new("alice");

    let outstanding = AtomicUsize::new(0);
    let peak = AtomicUsize::new(0);

    thread::scope(|scope| {
        for _ in 0..16 {
            scope.spawn(|| {
                for _ in 0..5 {
                    let session = manager.acquire_connection(&key).unwrap();
                    let now = outstanding.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(1));
                    outstanding.fetch_sub(1, Ordering::SeqCst);
                    manager.release_connection(&key, session).unwrap();
                }
            });
        }
    });

    assert!(peak.load(Ordering::SeqCst) <= MAX_ACTIVE);
    assert!(counters.created() <= MAX_ACTIVE);
    assert_eq!(manager.num_active(&key), 0);
}
