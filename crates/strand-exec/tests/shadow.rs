//! Shadow-copy execution mode.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

use strand_arena::NodeFlags;
use strand_core::{NodeId, Status, TypeTag};
use strand_test_utils::*;

/// Counts heap allocations made by the current thread.
struct CountingAlloc;

thread_local! {
    static ALLOCATIONS: Cell<usize> = const { Cell::new(0) };
}

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let _ = ALLOCATIONS.try_with(|n| n.set(n.get() + 1));
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let _ = ALLOCATIONS.try_with(|n| n.set(n.get() + 1));
        unsafe { System.realloc(ptr, layout, new_size) }
    }
}

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

fn allocations() -> usize {
    ALLOCATIONS.with(Cell::get)
}

#[test]
fn shadow_results_match_direct_execution() {
    let mut direct = runtime(false);
    let mut shadowed = runtime(true);

    let mut ids = Vec::new();
    for rt in [&mut direct, &mut shadowed] {
        let store = rt.store_mut();
        let root = store
            .allocate_zeroed(TypeTag::CONCURRENT_ALL, 1, NodeId::INVALID)
            .unwrap();
        let counter = store.allocate(&Counter::default(), COUNTER, root).unwrap();
        let scripted = store.allocate(&Scripted::failing(1), SCRIPTED, root).unwrap();
        ids.push((root, counter, scripted));
    }
    assert_eq!(ids[0], ids[1]);
    let (root, counter, scripted) = ids[0];

    for frame in 0..3 {
        let mut statuses = Vec::new();
        for rt in [&mut direct, &mut shadowed] {
            if frame > 0 {
                rt.store_mut().tick_subtree(root);
            }
            statuses.push(rt.run_frame().unwrap().root_status);
        }
        assert_eq!(statuses[0], statuses[1]);
    }

    for rt in [&direct, &shadowed] {
        assert_eq!(rt.store().read::<Counter>(counter).count, 3);
        assert_eq!(rt.store().read::<Scripted>(scripted).calls, 3);
    }
    assert!(shadowed.shadow().is_some());
    assert!(direct.shadow().is_none());
}

#[test]
fn shadow_merge_copies_payload_and_flags() {
    let mut rt = runtime(true);
    let root = rt
        .store_mut()
        .allocate(&Scripted::failing(0), SCRIPTED, NodeId::INVALID)
        .unwrap();
    let report = rt.run_frame().unwrap();
    assert_eq!(report.root_status, Some(Status::Success));

    let primary = rt.store();
    assert_eq!(primary.read::<Scripted>(root).calls, 1);
    assert!(primary.flags(root).contains(NodeFlags::SUCCEEDED));
    assert!(primary.flags(root).contains(NodeFlags::DIRTY));
}

#[test]
fn structural_edits_stay_in_shadow() {
    let mut rt = runtime(true);
    let root = rt
        .store_mut()
        .allocate(&(), SPAWNER, NodeId::INVALID)
        .unwrap();
    let report = rt.run_frame().unwrap();
    assert_eq!(report.root_status, Some(Status::Success));

    assert_eq!(rt.shadow().unwrap().child_count(root), 1);
    assert_eq!(rt.store().child_count(root), 0);
    assert_eq!(rt.store().node_count(), 1);

    // The next frame mirrors the primary again, discarding the spawn.
    rt.store_mut().tick(root);
    rt.run_frame().unwrap();
    assert_eq!(rt.shadow().unwrap().child_count(root), 1);
}

#[test]
fn steady_state_frames_do_not_allocate() {
    for shadow in [false, true] {
        let mut rt = runtime(shadow);
        let root = rt
            .store_mut()
            .allocate_zeroed(TypeTag::CONCURRENT_ALL, 1, NodeId::INVALID)
            .unwrap();
        for _ in 0..8 {
            rt.store_mut()
                .allocate(&Counter::default(), COUNTER, root)
                .unwrap();
        }

        for frame in 0..3 {
            if frame > 0 {
                rt.store_mut().tick_subtree(root);
            }
            rt.run_frame().unwrap();
        }

        let before = allocations();
        for _ in 0..10 {
            rt.store_mut().tick_subtree(root);
            rt.run_frame().unwrap();
        }
        assert_eq!(allocations() - before, 0, "shadow = {shadow}");
    }
}
