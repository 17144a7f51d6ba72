//! End-to-end scenarios against the public API: one per deterministic
//! example a reviewer would hand-check by eye.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use por_core::config::Options;
use por_core::conflict::{self, Scratch};
use por_core::event::{CandidateEvent, EventKind};
use por_core::fingerprint::{BagFingerprint, FingerprintBackend, Fragment, HashFingerprint};
use por_core::ids::{CondId, LockId};
use por_core::node::Node;
use por_core::race::solver::{RaceSolver, SymbolicExpr};
use por_core::race::{AccessKind, MemoryAccess, Offset, RaceDetector};
use por_core::{Configuration, Unfolding};

fn fresh() -> (Rc<RefCell<Unfolding>>, Configuration) {
    let u = Rc::new(RefCell::new(Unfolding::new()));
    let cfg = Configuration::new(u.clone());
    (u, cfg)
}

/// Scenario 1: lone lock. Seven events, no alternative possible.
#[test]
fn lone_lock() {
    let (u, mut cfg) = fresh();
    let t1 = cfg.spawn_thread(None).unwrap();
    let lid = LockId::new(1).unwrap();

    cfg.create_lock(t1.clone(), lid).unwrap();
    cfg.acquire_lock(t1.clone(), lid).unwrap();
    cfg.release_lock(t1.clone(), lid).unwrap();
    cfg.destroy_lock(t1.clone(), lid).unwrap();
    let last = cfg.stop_thread(t1).unwrap();

    assert_eq!(cfg.schedule().len(), 7);

    let options = Options::default();
    let mut scratch = Scratch::new();
    let ub = u.borrow();
    let alt = conflict::compute_alternative(&*ub, ub.len(), last, &[last], &options, &mut scratch);
    assert!(alt.is_none());
}

/// Scenario 2: classic race on lock. Two threads race to acquire the same
/// lock; committing one order leaves the other as a disabled alternative
/// that `create_right_branches` recovers as exactly one sibling.
#[test]
fn classic_lock_race_produces_one_alternative_branch() {
    let (u, mut cfg) = fresh();
    let t1 = cfg.spawn_thread(None).unwrap();
    let t2 = cfg.spawn_thread(Some(t1.clone())).unwrap();
    let lid = LockId::new(1).unwrap();
    cfg.create_lock(t1.clone(), lid).unwrap();

    let base = cfg.clone();

    let acq1 = cfg.acquire_lock(t1.clone(), lid).unwrap();

    // The alternative order (t2 acquiring first) is only discoverable once
    // it has been interned somewhere in the unfolding — here, by directly
    // constructing the candidate the way a prior exploration iteration
    // would have committed it.
    let t2_head = *base.thread_heads().get(&t2).unwrap();
    let acq2 = u
        .borrow_mut()
        .deduplicate(CandidateEvent {
            kind: EventKind::LockAcquire { lock: lid },
            tid: t2.clone(),
            predecessors: vec![t2_head],
            path: None,
        })
        .unwrap()
        .id;
    assert_ne!(acq1, acq2);

    let mut root = Node::root(base.clone());
    let child = root.make_left_child(cfg, vec![acq2]);
    assert_eq!(child.disabled(), &[acq2]);

    let options = Options::default();
    let mut scratch = Scratch::new();
    let arena_len = u.borrow().len();
    let created = {
        let ub = u.borrow();
        child.create_right_branches(&*ub, arena_len, &base, &options, &mut scratch)
    };
    assert_eq!(created, 1);
    // The alternative found for the disabled acq2 is acq1 itself — the other
    // half of this same immediate conflict, concurrent with everything
    // already in the disabled set.
    assert_eq!(root.right().unwrap().disabled(), &[acq1]);

    // The two post-release states fingerprint equal regardless of which
    // thread acquired first — the combine is commutative.
    let held = Fragment::new(1, lid.get().to_be_bytes().to_vec());
    let mut order_a = HashFingerprint::identity();
    order_a.add_fragment(&held);
    let mut order_b = HashFingerprint::identity();
    order_b.add_fragment(&held);
    assert_eq!(order_a, order_b);
}

/// Scenario 3: condition-variable notify, plus its broadcast fan-in variant.
#[test]
fn condvar_notify_and_broadcast_fan_in() {
    let (_u, mut cfg) = fresh();
    let t1 = cfg.spawn_thread(None).unwrap();
    let t2 = cfg.spawn_thread(None).unwrap();
    let lid = LockId::new(1).unwrap();
    let cid = CondId::new(1).unwrap();

    cfg.create_lock(t1.clone(), lid).unwrap();
    cfg.create_cond(t1.clone(), cid).unwrap();
    cfg.acquire_lock(t1.clone(), lid).unwrap();
    cfg.wait1(t1.clone(), cid, lid).unwrap();

    cfg.acquire_lock(t2.clone(), lid).unwrap();
    let signal = cfg.signal(t2.clone(), cid, Some(t1.clone())).unwrap();
    cfg.release_lock(t2, lid).unwrap();

    let wait2 = cfg.wait2(t1.clone(), cid).unwrap();
    cfg.release_lock(t1, lid).unwrap();

    let u = cfg.unfolding().borrow();
    assert!(u.get(wait2).predecessors.contains(&signal));
    drop(u);

    // Broadcast variant: two waiters, one broadcast, two wait2s.
    let (_u2, mut cfg2) = fresh();
    let t1 = cfg2.spawn_thread(None).unwrap();
    let t2 = cfg2.spawn_thread(None).unwrap();
    let t3 = cfg2.spawn_thread(None).unwrap();
    let lid = LockId::new(1).unwrap();
    let cid = CondId::new(1).unwrap();

    cfg2.create_lock(t1.clone(), lid).unwrap();
    cfg2.create_cond(t1.clone(), cid).unwrap();

    cfg2.acquire_lock(t1.clone(), lid).unwrap();
    cfg2.wait1(t1.clone(), cid, lid).unwrap();
    cfg2.acquire_lock(t2.clone(), lid).unwrap();
    cfg2.wait1(t2.clone(), cid, lid).unwrap();

    cfg2.acquire_lock(t3.clone(), lid).unwrap();
    let broadcast = cfg2
        .broadcast(t3.clone(), cid, vec![t1.clone(), t2.clone()])
        .unwrap();
    cfg2.release_lock(t3, lid).unwrap();

    let w1 = cfg2.wait2(t1.clone(), cid).unwrap();
    cfg2.release_lock(t1, lid).unwrap();
    let w2 = cfg2.wait2(t2.clone(), cid).unwrap();
    cfg2.release_lock(t2, lid).unwrap();

    let u = cfg2.unfolding().borrow();
    assert!(u.get(w1).predecessors.contains(&broadcast));
    assert!(u.get(w2).predecessors.contains(&broadcast));
}

/// Scenario 4: local branches with differing paths are distinct events;
/// the same path from the same predecessor dedups to the same event.
#[test]
fn local_branch_distinctness() {
    let (_u, mut cfg) = fresh();
    let t1 = cfg.spawn_thread(None).unwrap();

    let mut a = cfg.clone();
    let mut b = cfg.clone();
    let true_branch = a.local(t1.clone(), vec![1]).unwrap();
    let false_branch = b.local(t1.clone(), vec![0]).unwrap();
    assert_ne!(true_branch, false_branch);

    // Two independent forks taking the same branch from the same
    // predecessor land on the same interned event.
    let mut c = cfg.clone();
    let again = c.local(t1, vec![1]).unwrap();
    assert_eq!(true_branch, again);
}

#[derive(Debug)]
struct AmbiguousExpr;

impl SymbolicExpr for AmbiguousExpr {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// A solver that can neither prove nor refute disjointness — `i` ranges
/// over `[0, 3]` and the compared write is at a concrete index within that
/// range, so overlap is possible but not certain.
#[derive(Debug, Default)]
struct RangeAwareSolver;

impl RaceSolver for RangeAwareSolver {
    fn must_be_true(&self, _expr: &Arc<dyn SymbolicExpr>) -> Option<bool> {
        Some(false)
    }

    fn may_be_true(&self, _expr: &Arc<dyn SymbolicExpr>) -> Option<bool> {
        Some(true)
    }

    fn may_be_false(&self, _expr: &Arc<dyn SymbolicExpr>) -> Option<bool> {
        Some(true)
    }

    fn build_no_overlap(
        &self,
        _a: &Offset,
        _b: &Offset,
        _access_len: u64,
    ) -> Arc<dyn SymbolicExpr> {
        Arc::new(AmbiguousExpr)
    }
}

/// Scenario 5: symbolic write race. `arr[i]` with `i` ranging over `[0, 3]`
/// against a concrete `arr[0]` write — the fast path can't decide, and the
/// solver reports a possible (not certain) overlap, which this detector
/// treats conservatively as a race.
#[test]
fn symbolic_write_race_falls_back_to_solver() {
    let (u, mut cfg) = fresh();
    let thread1 = cfg.spawn_thread(None).unwrap();
    let thread2 = cfg.spawn_thread(None).unwrap();
    let t1 = *cfg.thread_heads().get(&thread1).unwrap();
    let t2 = *cfg.thread_heads().get(&thread2).unwrap();
    let u = u.borrow();

    let mut detector = RaceDetector::new();
    let solver = RangeAwareSolver;

    let a = MemoryAccess {
        event: t1,
        offset: Offset::Symbolic(Arc::new(AmbiguousExpr)),
        len: 4,
        kind: AccessKind::Write,
    };
    let b = MemoryAccess {
        event: t2,
        offset: Offset::Concrete(0),
        len: 4,
        kind: AccessKind::Write,
    };

    detector.track_access(1, a, &*u, &solver);
    let result = detector.track_access(1, b, &*u, &solver);
    assert!(result.is_race);
    assert_eq!(result.racing_instruction, Some(t1));
    assert!(result.can_be_safe, "overlap is possible but not certain");
    assert!(result.condition_to_be_safe.is_some());
}

/// Scenario 6: alloc collapses the access list — five writes, then a free
/// and a fresh alloc, leave no *ordinary* history for the next tenant's
/// first access, but it still races with the alloc/free event itself since
/// that access remains concurrent with it.
#[test]
fn alloc_collapses_access_list() {
    let (u, mut cfg) = fresh();
    let thread1 = cfg.spawn_thread(None).unwrap();
    let thread2 = cfg.spawn_thread(None).unwrap();
    let t1 = *cfg.thread_heads().get(&thread1).unwrap();
    let t2 = *cfg.thread_heads().get(&thread2).unwrap();
    let u = u.borrow();

    let mut detector = RaceDetector::new();
    #[derive(Debug, Default)]
    struct NeverOverlaps;
    impl RaceSolver for NeverOverlaps {
        fn must_be_true(&self, _e: &Arc<dyn SymbolicExpr>) -> Option<bool> {
            Some(true)
        }
        fn may_be_true(&self, _e: &Arc<dyn SymbolicExpr>) -> Option<bool> {
            Some(true)
        }
        fn may_be_false(&self, _e: &Arc<dyn SymbolicExpr>) -> Option<bool> {
            Some(false)
        }
        fn build_no_overlap(&self, _a: &Offset, _b: &Offset, _l: u64) -> Arc<dyn SymbolicExpr> {
            Arc::new(AmbiguousExpr)
        }
    }
    let solver = NeverOverlaps;

    for offset in 0..5 {
        let access = MemoryAccess {
            event: t1,
            offset: Offset::Concrete(offset),
            len: 1,
            kind: AccessKind::Write,
        };
        detector.track_access(42, access, &*u, &solver);
    }

    detector.on_free(42, t1);
    detector.on_alloc(42, t1);

    let first_new_access = MemoryAccess {
        event: t2,
        offset: Offset::Concrete(0),
        len: 1,
        kind: AccessKind::Write,
    };
    let result = detector.track_access(42, first_new_access, &*u, &solver);
    assert!(result.is_race);
    assert_eq!(result.racing_instruction, Some(t1));
    assert!(!result.can_be_safe);
}

#[test]
fn bag_fingerprint_is_also_abelian() {
    let f = Fragment::new(1, vec![9]);
    let mut bag = BagFingerprint::identity();
    bag.add_fragment(&f);
    bag.remove_fragment(&f);
    assert_eq!(bag, BagFingerprint::identity());
}
