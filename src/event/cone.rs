use super::{EventId, EventLookup};
use crate::ids::ThreadId;
use std::collections::BTreeMap;

/// Maps, for every thread ever active in `[e]`, the maximum-depth event of
/// that thread causally `<= e`.
pub type Cone = BTreeMap<ThreadId, EventId>;

/// Builds the cone of a new event from the cone of its same-thread
/// predecessor (if any) plus the cones of its other predecessors, then
/// self-maps `tid -> self_id`.
pub fn build<L: EventLookup>(
    lookup: &L,
    same_thread_predecessor: Option<EventId>,
    other_predecessors: &[EventId],
    tid: &ThreadId,
    self_id: EventId,
) -> Cone {
    let mut cone = match same_thread_predecessor {
        Some(p) => lookup.cone_of(p).clone(),
        None => Cone::new(),
    };

    for &pred in other_predecessors {
        for (t, &e) in lookup.cone_of(pred) {
            merge_max(&mut cone, lookup, t.clone(), e);
        }
        // the predecessor's own thread/depth also enters the cone
        merge_max(&mut cone, lookup, lookup.tid_of(pred).clone(), pred);
    }

    cone.insert(tid.clone(), self_id);
    cone
}

fn merge_max<L: EventLookup>(cone: &mut Cone, lookup: &L, tid: ThreadId, candidate: EventId) {
    match cone.get(&tid) {
        Some(&existing) if lookup.depth_of(existing) >= lookup.depth_of(candidate) => {}
        _ => {
            cone.insert(tid, candidate);
        }
    }
}

/// `a.is_less_than_eq(b)`: `a.tid == b.tid` decides by depth; otherwise `a`'s
/// thread must appear in `b`'s cone at a depth `>= a.depth` (the same-thread
/// chain is totally ordered, so this transitively covers every earlier event
/// of `a`'s thread too).
pub fn is_less_than_eq<L: EventLookup>(lookup: &L, a: EventId, b: EventId) -> bool {
    let (a_tid, b_tid) = (lookup.tid_of(a), lookup.tid_of(b));
    if a_tid == b_tid {
        return lookup.depth_of(a) <= lookup.depth_of(b);
    }
    match lookup.cone_of(b).get(a_tid) {
        Some(&e) => lookup.depth_of(e) >= lookup.depth_of(a),
        None => false,
    }
}

pub fn is_less_than<L: EventLookup>(lookup: &L, a: EventId, b: EventId) -> bool {
    a != b && is_less_than_eq(lookup, a, b)
}

pub fn is_concurrent<L: EventLookup>(lookup: &L, a: EventId, b: EventId) -> bool {
    !is_less_than_eq(lookup, a, b) && !is_less_than_eq(lookup, b, a)
}
