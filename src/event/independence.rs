use super::{EventId, EventKind, EventLookup};

/// Decides whether `a` and `b` can commute (`true`) or must stay ordered
/// relative to each other (`false`) wherever they appear concurrently in a
/// configuration. Used by [`crate::conflict::compute_alternative`] to decide
/// which events could have happened in the other order.
///
/// Note on lock/cv chains: [`crate::ids::LockId`]/[`crate::ids::CondId`] are
/// monotonically assigned and never recycled, so a destroyed lock's numeric
/// id is retired for good. Two events naming the same lock/cv id therefore
/// always refer to the same incarnation, so deciding dependence reduces to a
/// plain id comparison instead of walking a reuse chain.
pub fn independent<L: EventLookup>(lookup: &L, a: EventId, b: EventId) -> bool {
    if a == b {
        return false;
    }

    if lookup.tid_of(a) == lookup.tid_of(b) {
        return false;
    }

    let (ka, kb) = (lookup.kind_of(a), lookup.kind_of(b));

    if matches!(ka, EventKind::Local) || matches!(kb, EventKind::Local) {
        return true;
    }

    if matches!(ka, EventKind::ProgramInit) || matches!(kb, EventKind::ProgramInit) {
        return false;
    }

    if thread_events_name_each_other(lookup, a, ka, b, kb) {
        return false;
    }

    if let (Some(la), Some(lb)) = (ka.lock(), kb.lock()) {
        if la == lb {
            return false;
        }
    }

    if let (Some(ca), Some(cb)) = (ka.cond(), kb.cond()) {
        if ca == cb {
            return !cv_events_independent(ka, kb);
        }
    }

    true
}

fn thread_events_name_each_other<L: EventLookup>(
    lookup: &L,
    a: EventId,
    ka: &EventKind,
    b: EventId,
    kb: &EventKind,
) -> bool {
    match (ka, kb) {
        (EventKind::ThreadCreate { created }, EventKind::ThreadInit)
        | (EventKind::ThreadInit, EventKind::ThreadCreate { created }) => {
            let other = if matches!(ka, EventKind::ThreadInit) {
                a
            } else {
                b
            };
            *created == *lookup.tid_of(other)
        }
        (EventKind::ThreadExit, EventKind::ThreadJoin { joined })
        | (EventKind::ThreadJoin { joined }, EventKind::ThreadExit) => {
            let exiting = if matches!(ka, EventKind::ThreadExit) {
                a
            } else {
                b
            };
            *joined == *lookup.tid_of(exiting)
        }
        (EventKind::ThreadJoin { joined: ja }, EventKind::ThreadJoin { joined: jb }) => ja == jb,
        _ => false,
    }
}

/// cv events on the *same* cv id are dependent except for two `wait2`s
/// (threads resuming from the same notification round never order each
/// other).
fn cv_events_independent(ka: &EventKind, kb: &EventKind) -> bool {
    matches!(
        (ka, kb),
        (EventKind::Wait2 { .. }, EventKind::Wait2 { .. })
    )
}
