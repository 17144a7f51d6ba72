//! Typed concurrency events and the cones (vector clocks) built from them.
//!
//! Per-event data lives in an arena ([`crate::unfolding::Unfolding`]); this
//! module only defines the event's shape and the predecessor/cone
//! invariants. Events are never constructed directly — only through
//! [`crate::unfolding::Unfolding::deduplicate`].

pub(crate) mod cone;
pub(crate) mod independence;

pub use cone::Cone;
pub(crate) use independence::independent;

use crate::ids::{CondId, LockId, ThreadId};
use std::fmt;

/// Anything that can answer the questions the cone/independence relations
/// need about an interned event. Implemented by
/// [`crate::unfolding::Unfolding`]; kept as a trait so the relation code in
/// `cone`/`independence` stays free of a dependency on the unfolding's
/// storage details.
pub trait EventLookup {
    fn tid_of(&self, id: EventId) -> &ThreadId;
    fn depth_of(&self, id: EventId) -> u32;
    fn cone_of(&self, id: EventId) -> &Cone;
    fn kind_of(&self, id: EventId) -> &EventKind;
    fn predecessors_of(&self, id: EventId) -> &[EventId];
}

/// Index into the unfolding's event arena. Stable for the lifetime of the
/// unfolding: the arena is append-only, so handles never dangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(pub(crate) u32);

impl EventId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// A branch decision along a local block. Two `local` events with identical
/// predecessors but different paths are distinct unfolding events.
pub type LocalPath = Vec<u64>;

/// The closed set of concurrency actions the core understands.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    ProgramInit,
    ThreadCreate { created: ThreadId },
    ThreadInit,
    ThreadExit,
    ThreadJoin { joined: ThreadId },
    LockCreate { lock: LockId },
    LockDestroy { lock: LockId },
    LockAcquire { lock: LockId },
    LockRelease { lock: LockId },
    CondCreate { cond: CondId },
    CondDestroy { cond: CondId },
    /// `lock` is the mutex released while waiting.
    Wait1 { cond: CondId, lock: LockId },
    Wait2 { cond: CondId },
    /// `lost` means no waiter was woken, so the signal competes for
    /// ordering against future notifications/waits instead of a target.
    Signal { cond: CondId, lost: bool },
    Broadcast { cond: CondId, lost: bool },
    Local,
}

impl EventKind {
    pub fn discriminant(&self) -> &'static str {
        match self {
            EventKind::ProgramInit => "program_init",
            EventKind::ThreadCreate { .. } => "thread_create",
            EventKind::ThreadInit => "thread_init",
            EventKind::ThreadExit => "thread_exit",
            EventKind::ThreadJoin { .. } => "thread_join",
            EventKind::LockCreate { .. } => "lock_create",
            EventKind::LockDestroy { .. } => "lock_destroy",
            EventKind::LockAcquire { .. } => "lock_acquire",
            EventKind::LockRelease { .. } => "lock_release",
            EventKind::CondCreate { .. } => "condition_variable_create",
            EventKind::CondDestroy { .. } => "condition_variable_destroy",
            EventKind::Wait1 { .. } => "wait1",
            EventKind::Wait2 { .. } => "wait2",
            EventKind::Signal { .. } => "signal",
            EventKind::Broadcast { .. } => "broadcast",
            EventKind::Local => "local",
        }
    }

    pub fn is_lock_op(&self) -> bool {
        matches!(
            self,
            EventKind::LockCreate { .. }
                | EventKind::LockDestroy { .. }
                | EventKind::LockAcquire { .. }
                | EventKind::LockRelease { .. }
        )
    }

    pub fn lock(&self) -> Option<LockId> {
        match self {
            EventKind::LockCreate { lock }
            | EventKind::LockDestroy { lock }
            | EventKind::LockAcquire { lock }
            | EventKind::LockRelease { lock }
            | EventKind::Wait1 { lock, .. } => Some(*lock),
            _ => None,
        }
    }

    pub fn cond(&self) -> Option<CondId> {
        match self {
            EventKind::CondCreate { cond }
            | EventKind::CondDestroy { cond }
            | EventKind::Wait1 { cond, .. }
            | EventKind::Wait2 { cond }
            | EventKind::Signal { cond, .. }
            | EventKind::Broadcast { cond, .. } => Some(*cond),
            _ => None,
        }
    }
}

/// Cached per-event data filled in by the host interpreter. Opaque to every
/// POR algorithm: the core never reads these fields, only stores and hands
/// them back.
#[derive(Debug, Clone, Default)]
pub struct EventMetadata {
    pub fingerprint_value: Option<Vec<u8>>,
    pub thread_delta: Option<Vec<u8>>,
}

/// A provisional event under construction by [`crate::configuration::Configuration`],
/// not yet interned into the unfolding.
#[derive(Debug, Clone)]
pub struct CandidateEvent {
    pub kind: EventKind,
    pub tid: ThreadId,
    /// Predecessors in the exact order mandated by the kind's predecessor
    /// shape (see module docs on `configuration`), starting with the
    /// same-thread predecessor when the kind has one.
    pub predecessors: Vec<EventId>,
    /// Only meaningful for `EventKind::Local`.
    pub path: Option<LocalPath>,
}

/// An immutable, interned event.
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub id: EventId,
    pub kind: EventKind,
    pub tid: ThreadId,
    pub depth: u32,
    pub predecessors: Vec<EventId>,
    pub path: Option<LocalPath>,
    pub cone: Cone,
    pub metadata: EventMetadata,
}

impl EventRecord {
    /// The same-thread predecessor, when the kind has one (every kind but
    /// `program_init`).
    pub fn same_thread_predecessor(&self) -> Option<EventId> {
        match self.kind {
            EventKind::ProgramInit => None,
            EventKind::ThreadInit => {
                // thread_init's sole predecessor is the creator, which may be
                // on a *different* thread (program_init or a thread_create).
                None
            }
            _ => self.predecessors.first().copied(),
        }
    }
}
