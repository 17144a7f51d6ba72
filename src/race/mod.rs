//! Online data-race detection: consults the unfolding's happens-before
//! relation (cones) to decide, per memory access, whether it races with a
//! prior access on another thread. Concrete byte ranges are checked directly
//! (the fast path); symbolic offsets fall back to a pluggable
//! [`solver::RaceSolver`].

pub mod solver;

pub use solver::RaceSolver;

use crate::event::{cone, EventId, EventLookup};
use crate::ids::ThreadId;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

pub type ObjectId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

/// A memory access's byte offset within its object: either concrete, or an
/// opaque symbolic expression the host's solver can reason about.
#[derive(Debug, Clone)]
pub enum Offset {
    Concrete(u64),
    Symbolic(Arc<dyn solver::SymbolicExpr>),
}

#[derive(Debug, Clone)]
pub struct MemoryAccess {
    pub event: EventId,
    pub offset: Offset,
    pub len: u64,
    pub kind: AccessKind,
}

/// The verdict for one [`RaceDetector::track_access`] call.
///
/// A plain yes/no isn't enough once the symbolic path is involved: the
/// solver can prove disjointness (`new_constraint`, folded into the host's
/// path condition so the pair never needs reasking), prove overlap, or
/// prove neither — in which case a race is reported conservatively but
/// `can_be_safe`/`condition_to_be_safe` still hands back the condition under
/// which it would in fact be safe.
#[derive(Debug, Clone)]
pub struct RaceResult {
    pub is_race: bool,
    pub racing_instruction: Option<EventId>,
    pub racing_thread: Option<ThreadId>,
    pub can_be_safe: bool,
    pub condition_to_be_safe: Option<Arc<dyn solver::SymbolicExpr>>,
    pub new_constraint: Option<Arc<dyn solver::SymbolicExpr>>,
}

impl RaceResult {
    fn no_race() -> RaceResult {
        RaceResult {
            is_race: false,
            racing_instruction: None,
            racing_thread: None,
            can_be_safe: false,
            condition_to_be_safe: None,
            new_constraint: None,
        }
    }

    fn no_race_with_constraint(new_constraint: Arc<dyn solver::SymbolicExpr>) -> RaceResult {
        RaceResult {
            new_constraint: Some(new_constraint),
            ..RaceResult::no_race()
        }
    }

    fn race(with: EventId, thread: ThreadId) -> RaceResult {
        RaceResult {
            is_race: true,
            racing_instruction: Some(with),
            racing_thread: Some(thread),
            can_be_safe: false,
            condition_to_be_safe: None,
            new_constraint: None,
        }
    }

    fn possible_race(
        with: EventId,
        thread: ThreadId,
        condition_to_be_safe: Arc<dyn solver::SymbolicExpr>,
    ) -> RaceResult {
        RaceResult {
            is_race: true,
            racing_instruction: Some(with),
            racing_thread: Some(thread),
            can_be_safe: true,
            condition_to_be_safe: Some(condition_to_be_safe),
            new_constraint: None,
        }
    }

    /// The solver timed out: treated conservatively, as a race with no
    /// escape condition on offer.
    fn unknown(with: EventId, thread: ThreadId) -> RaceResult {
        RaceResult::race(with, thread)
    }
}

impl PartialEq for RaceResult {
    fn eq(&self, other: &RaceResult) -> bool {
        self.is_race == other.is_race
            && self.racing_instruction == other.racing_instruction
            && self.racing_thread == other.racing_thread
            && self.can_be_safe == other.can_be_safe
            && self.condition_to_be_safe.is_some() == other.condition_to_be_safe.is_some()
            && self.new_constraint.is_some() == other.new_constraint.is_some()
    }
}

impl Eq for RaceResult {}

/// Per-object access history. Cheap to clone (an `Rc` bump) the way
/// [`crate::configuration::Configuration`]'s head maps are — mutation
/// copy-on-writes via `Rc::make_mut`.
#[derive(Debug, Clone, Default)]
struct ObjectAccesses {
    accesses: Rc<Vec<MemoryAccess>>,
    /// Set by `on_alloc`/`on_free`: the event that (re)allocated or freed
    /// this object. Any access still concurrent with it races, since an
    /// allocator/deallocator call always conflicts with whatever else
    /// touches the object at the same time. Cleared once an access is seen
    /// to happen strictly after it, at which point normal list tracking
    /// resumes for the object's new lifetime.
    alloc_free: Option<EventId>,
}

impl ObjectAccesses {
    fn push(&mut self, access: MemoryAccess) {
        Rc::make_mut(&mut self.accesses).push(access);
    }

    /// An alloc/free boundary discards prior history entirely and records
    /// `event` as the object's new alloc/free marker — a freed and
    /// reallocated address has no causal relationship to its previous
    /// tenant's accesses, but the alloc/free call itself races with
    /// whatever still touches the object concurrently.
    fn collapse(&mut self, event: EventId) {
        self.accesses = Rc::new(Vec::new());
        self.alloc_free = Some(event);
    }
}

#[derive(Debug, Clone, Default)]
pub struct RaceDetector {
    objects: HashMap<ObjectId, ObjectAccesses>,
}

impl RaceDetector {
    pub fn new() -> RaceDetector {
        RaceDetector::default()
    }

    pub fn on_alloc(&mut self, object: ObjectId, event: EventId) {
        self.objects.entry(object).or_default().collapse(event);
    }

    pub fn on_free(&mut self, object: ObjectId, event: EventId) {
        self.objects.entry(object).or_default().collapse(event);
    }

    /// Records `access` against `object`, classifying it against every prior
    /// concurrent access by comparing with `lookup`'s cone relation, and
    /// returns the strongest verdict found (a definite race wins over a
    /// possible one, which wins over no race at all).
    pub fn track_access<L: EventLookup, S: RaceSolver>(
        &mut self,
        object: ObjectId,
        access: MemoryAccess,
        lookup: &L,
        solver: &S,
    ) -> RaceResult {
        let history = self.objects.entry(object).or_default();

        if let Some(marker) = history.alloc_free {
            if marker != access.event && cone::is_concurrent(lookup, access.event, marker) {
                let result = RaceResult::race(marker, lookup.tid_of(marker).clone());
                history.push(access);
                return result;
            }
            history.alloc_free = None;
        }

        let mut result = RaceResult::no_race();

        for prior in history.accesses.iter() {
            if prior.event == access.event {
                continue;
            }
            if access.kind == AccessKind::Read && prior.kind == AccessKind::Read {
                continue;
            }
            if !cone::is_concurrent(lookup, access.event, prior.event) {
                continue;
            }
            match overlap(&access, prior, solver) {
                Verdict::Disjoint => continue,
                Verdict::Overlapping => {
                    result = RaceResult::race(prior.event, lookup.tid_of(prior.event).clone());
                    break;
                }
                Verdict::PossiblyOverlapping {
                    condition_to_be_safe,
                } => {
                    result = RaceResult::possible_race(
                        prior.event,
                        lookup.tid_of(prior.event).clone(),
                        condition_to_be_safe,
                    );
                }
                Verdict::ProvenDisjoint { new_constraint } => {
                    if !result.is_race {
                        result = RaceResult::no_race_with_constraint(new_constraint);
                    }
                }
                Verdict::Unknown => {
                    result = RaceResult::unknown(prior.event, lookup.tid_of(prior.event).clone());
                }
            }
        }

        history.push(access);
        result
    }
}

/// The solver-informed outcome of comparing one pair of accesses' offsets.
enum Verdict {
    Disjoint,
    Overlapping,
    /// `must_be_true(no_overlap)` held: the pair is provably disjoint, and
    /// the host may assume `new_constraint` from here on.
    ProvenDisjoint {
        new_constraint: Arc<dyn solver::SymbolicExpr>,
    },
    /// Neither provably disjoint nor provably overlapping: a race is
    /// reported, but `condition_to_be_safe` escapes it.
    PossiblyOverlapping {
        condition_to_be_safe: Arc<dyn solver::SymbolicExpr>,
    },
    Unknown,
}

fn overlap(a: &MemoryAccess, b: &MemoryAccess, solver: &impl RaceSolver) -> Verdict {
    match (&a.offset, &b.offset) {
        (Offset::Concrete(x), Offset::Concrete(y)) => {
            if ranges_overlap(*x, a.len, *y, b.len) {
                Verdict::Overlapping
            } else {
                Verdict::Disjoint
            }
        }
        _ => {
            let no_overlap = solver.build_no_overlap(&a.offset, &b.offset, a.len.max(b.len));
            let Some(must) = solver.must_be_true(&no_overlap) else {
                return Verdict::Unknown;
            };
            if must {
                return Verdict::ProvenDisjoint {
                    new_constraint: no_overlap,
                };
            }
            let Some(may) = solver.may_be_true(&no_overlap) else {
                return Verdict::Unknown;
            };
            if !may {
                return Verdict::Overlapping;
            }
            // Genuinely symbolic: disjointness is possible but not certain.
            // A sound detector must not miss a real race, so "possibly
            // overlapping" is reported as a race, with the disjoint case
            // surfaced as the condition under which it would be safe.
            match solver.may_be_false(&no_overlap) {
                Some(true) => Verdict::PossiblyOverlapping {
                    condition_to_be_safe: no_overlap,
                },
                Some(false) => Verdict::Disjoint,
                None => Verdict::Unknown,
            }
        }
    }
}

fn ranges_overlap(a_start: u64, a_len: u64, b_start: u64, b_len: u64) -> bool {
    a_start < b_start.saturating_add(b_len) && b_start < a_start.saturating_add(a_len)
}
