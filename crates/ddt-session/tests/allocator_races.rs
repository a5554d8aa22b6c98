use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

use ddt_core::SubjectId;
use ddt_session::{
    allocate_reserved, scan_used, DirReservations, MemoryReservations, ReservationStore,
};
use tempfile::tempdir;

#[test]
fn concurrent_allocations_are_pairwise_distinct() {
    let store = Arc::new(MemoryReservations::new());
    let mut handles = Vec::new();
    for _ in 0..16 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            let used = BTreeSet::new();
            allocate_reserved(&used, store.as_ref()).unwrap()
        }));
    }
    let mut ids = BTreeSet::new();
    for handle in handles {
        let id = handle.join().unwrap();
        assert!(ids.insert(id), "id {id} handed out twice");
    }
    assert_eq!(ids.len(), 16);
    assert!(ids.iter().all(|id| id.as_raw() >= SubjectId::MIN));
}

#[test]
fn allocation_skips_identifiers_seen_in_the_namespace() {
    let store = MemoryReservations::new();
    let used: BTreeSet<SubjectId> = [1001, 1002, 1003]
        .into_iter()
        .map(|raw| SubjectId::new(raw).unwrap())
        .collect();
    let id = allocate_reserved(&used, &store).unwrap();
    assert_eq!(id.as_raw(), 1004);
    assert!(!used.contains(&id));
}

#[test]
fn directory_reservations_are_atomic_across_threads() {
    let dir = tempdir().unwrap();
    let store = Arc::new(DirReservations::new(dir.path()));

    let target = SubjectId::new(1001).unwrap();
    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || store.try_reserve(target).unwrap()));
    }
    let winners = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|&won| won)
        .count();
    assert_eq!(winners, 1, "exactly one thread may win a reservation");
    assert!(store.placeholder_path(target).exists());
}

#[test]
fn namespace_scan_reads_records_and_placeholders() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("DDT1001_ses1_2026-01-01T00-00-00.csv"), "").unwrap();
    std::fs::write(dir.path().join("DDT1005.reserved"), "").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "").unwrap();

    let used = scan_used(dir.path()).unwrap();
    let raws: Vec<u16> = used.iter().map(|id| id.as_raw()).collect();
    assert_eq!(raws, vec![1001, 1005]);

    let missing = scan_used(&dir.path().join("absent")).unwrap();
    assert!(missing.is_empty());
}
