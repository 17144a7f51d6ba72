//! Immediate conflicts and alternative-`j` search.
//!
//! When a configuration disables an event (the disabled set `D` grows), the
//! exploration tree needs to know whether some *other* unfolding event could
//! have been scheduled instead — one that conflicts with the event that just
//! got disabled, yet is still concurrent with everything already in `D` (so
//! scheduling it would not simply re-disable the same thing). This module
//! answers that question.
//!
//! Implementation note: rather than a two-colour (committed vs. disabled)
//! breadth-first search over the unfolding, this scans the arena once,
//! guarded by a [`Scratch`] generation-counter visitor instead of a global
//! mutable colour field — consistent with the arena-over-pointers approach
//! `src/unfolding.rs` takes throughout.

use crate::config::Options;
use crate::event::{cone, independent, EventId, EventLookup};

use tracing::trace;

/// Reusable, generation-stamped scratch space for marking events during a
/// search, instead of allocating a fresh `HashSet<EventId>` per call.
#[derive(Debug, Default)]
pub struct Scratch {
    marks: Vec<u32>,
    generation: u32,
}

impl Scratch {
    pub fn new() -> Scratch {
        Scratch::default()
    }

    /// Starts a new marking pass sized for `arena_len` events, returning the
    /// generation stamp this pass's marks should use.
    fn begin(&mut self, arena_len: usize) -> u32 {
        self.generation = self.generation.wrapping_add(1).max(1);
        if self.marks.len() < arena_len {
            self.marks.resize(arena_len, 0);
        }
        self.generation
    }

    fn mark(&mut self, id: EventId, generation: u32) {
        self.marks[id.index()] = generation;
    }

    fn is_marked(&self, id: EventId, generation: u32) -> bool {
        self.marks.get(id.index()).copied() == Some(generation)
    }
}

/// Two cross-thread events are in *immediate conflict* when they are
/// dependent (not independent). Same-thread pairs are already totally
/// ordered and never candidates for an alternative.
pub fn in_conflict<L: EventLookup>(lookup: &L, a: EventId, b: EventId) -> bool {
    lookup.tid_of(a) != lookup.tid_of(b) && !independent(lookup, a, b)
}

/// Searches for an event that conflicts with `conflicting`, is concurrent
/// with every event already in the disabled set `d`, and stays within the
/// configured context-switch-degree bound.
///
/// `arena_len` is the number of events currently interned in the unfolding
/// ([`crate::unfolding::Unfolding::len`]) — candidates are drawn from the
/// full arena since an alternative need not already be part of any
/// particular configuration's schedule.
pub fn compute_alternative<L: EventLookup>(
    lookup: &L,
    arena_len: usize,
    conflicting: EventId,
    d: &[EventId],
    options: &Options,
    scratch: &mut Scratch,
) -> Option<EventId> {
    let generation = scratch.begin(arena_len);
    for &blue in d {
        scratch.mark(blue, generation);
    }

    for idx in 0..arena_len {
        let candidate = EventId(idx as u32);
        if scratch.is_marked(candidate, generation) {
            continue;
        }
        if candidate == conflicting || !in_conflict(lookup, candidate, conflicting) {
            continue;
        }
        if !d.iter().all(|&blue| cone::is_concurrent(lookup, candidate, blue)) {
            continue;
        }
        let csd = context_switch_degree(lookup, candidate, d);
        if !options.within_csd_bound(csd) {
            trace!(?candidate, csd, "alternative rejected: over csd bound");
            continue;
        }
        trace!(?conflicting, ?candidate, csd, "alternative found");
        return Some(candidate);
    }

    trace!(?conflicting, d_len = d.len(), "no alternative found");
    None
}

/// Counts the thread alternations implied by scheduling `candidate` alongside
/// the disabled set `d` — the context-switch-degree budget this crate checks
/// alternatives against.
fn context_switch_degree<L: EventLookup>(lookup: &L, candidate: EventId, d: &[EventId]) -> u32 {
    let mut tids: Vec<_> = d.iter().map(|&e| lookup.tid_of(e).clone()).collect();
    tids.push(lookup.tid_of(candidate).clone());
    tids.dedup();
    tids.windows(2).filter(|w| w[0] != w[1]).count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ThreadId;
    use crate::unfolding::Unfolding;

    #[test]
    fn no_alternative_when_d_is_empty_and_nothing_conflicts() {
        let mut u = Unfolding::new();
        let t1 = u.spawn(u.program_init(), ThreadId::root().child(1));
        let _l1 = u.local(t1, vec![1]);

        let mut scratch = Scratch::new();
        let options = Options::default();
        let alt = compute_alternative(&u, u.len(), t1, &[], &options, &mut scratch);
        assert!(alt.is_none());
    }

    #[test]
    fn finds_concurrent_conflicting_event() {
        let mut u = Unfolding::new();
        let t1 = u.spawn(u.program_init(), ThreadId::root().child(1));
        let t2 = u.spawn(u.program_init(), ThreadId::root().child(2));

        let lid = crate::ids::LockId::new(1).unwrap();
        let acq1 = u
            .deduplicate(crate::event::CandidateEvent {
                kind: crate::event::EventKind::LockAcquire { lock: lid },
                tid: u.get(t1).tid.clone(),
                predecessors: vec![t1],
                path: None,
            })
            .unwrap()
            .id;
        let acq2 = u
            .deduplicate(crate::event::CandidateEvent {
                kind: crate::event::EventKind::LockAcquire { lock: lid },
                tid: u.get(t2).tid.clone(),
                predecessors: vec![t2],
                path: None,
            })
            .unwrap()
            .id;

        assert!(in_conflict(&u, acq1, acq2));

        let mut scratch = Scratch::new();
        let options = Options::default();
        let alt = compute_alternative(&u, u.len(), acq1, &[], &options, &mut scratch);
        assert_eq!(alt, Some(acq2));
    }
}
