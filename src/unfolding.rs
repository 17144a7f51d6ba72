//! The unfolding: a deduplicated, append-only DAG of every event ever
//! constructed by any configuration, keyed so that two structurally
//! identical candidate events resolve to the same arena slot.

use crate::error::{PorError, Result};
use crate::event::{cone, independence, CandidateEvent, Cone, EventId, EventKind, EventLookup, EventMetadata, EventRecord, LocalPath};
use crate::ids::ThreadId;
use std::collections::HashMap;

type CanonicalKey = (ThreadId, u32, EventKind, Vec<EventId>, Option<LocalPath>);

/// Result of [`Unfolding::deduplicate`].
#[derive(Debug, Clone, Copy)]
pub struct DedupResult {
    pub id: EventId,
    pub is_new: bool,
}

/// Owns every event ever constructed across every configuration derived from
/// this unfolding. Append-only: handles (`EventId`s) stay valid for the
/// entire run.
#[derive(Debug)]
pub struct Unfolding {
    arena: Vec<EventRecord>,
    index: HashMap<CanonicalKey, EventId>,
}

impl Unfolding {
    /// Creates a fresh unfolding containing only `program_init`.
    pub fn new() -> Unfolding {
        let mut cone = Cone::new();
        cone.insert(ThreadId::root(), EventId(0));

        let root = EventRecord {
            id: EventId(0),
            kind: EventKind::ProgramInit,
            tid: ThreadId::root(),
            depth: 0,
            predecessors: Vec::new(),
            path: None,
            cone,
            metadata: EventMetadata::default(),
        };

        let key = Self::key_of(&root);
        let mut index = HashMap::new();
        index.insert(key, EventId(0));

        Unfolding {
            arena: vec![root],
            index,
        }
    }

    /// The distinguished `program_init` event, always `EventId(0)`.
    pub fn program_init(&self) -> EventId {
        EventId(0)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn get(&self, id: EventId) -> &EventRecord {
        &self.arena[id.index()]
    }

    fn depth_of_candidate(&self, predecessors: &[EventId]) -> u32 {
        predecessors
            .iter()
            .map(|&p| self.get(p).depth)
            .max()
            .map(|d| d + 1)
            .unwrap_or(0)
    }

    fn key_of(record: &EventRecord) -> CanonicalKey {
        (
            record.tid.clone(),
            record.depth,
            record.kind.clone(),
            record.predecessors.clone(),
            record.path.clone(),
        )
    }

    fn key_of_candidate(&self, candidate: &CandidateEvent, depth: u32) -> CanonicalKey {
        (
            candidate.tid.clone(),
            depth,
            candidate.kind.clone(),
            candidate.predecessors.clone(),
            candidate.path.clone(),
        )
    }

    /// Interns `candidate`, returning the existing handle if an
    /// structurally-identical event was already constructed, or allocating a
    /// new arena slot otherwise.
    pub fn deduplicate(&mut self, candidate: CandidateEvent) -> Result<DedupResult> {
        for &p in &candidate.predecessors {
            if p.index() >= self.arena.len() {
                return Err(PorError::invariant(format!(
                    "candidate event referenced unknown predecessor {p}"
                )));
            }
        }

        let depth = self.depth_of_candidate(&candidate.predecessors);

        for &p in &candidate.predecessors {
            if self.get(p).depth >= depth {
                return Err(PorError::invariant(
                    "predecessor does not have strictly smaller depth",
                ));
            }
        }

        let key = self.key_of_candidate(&candidate, depth);
        if let Some(&id) = self.index.get(&key) {
            return Ok(DedupResult { id, is_new: false });
        }

        let id = EventId(self.arena.len() as u32);

        let same_thread_pred = match candidate.kind {
            EventKind::ProgramInit | EventKind::ThreadInit => None,
            _ => candidate.predecessors.first().copied(),
        };
        let other_start = if same_thread_pred.is_some() { 1 } else { 0 };
        let others = &candidate.predecessors[other_start.min(candidate.predecessors.len())..];

        let cone = cone::build(&*self, same_thread_pred, others, &candidate.tid, id);

        let record = EventRecord {
            id,
            kind: candidate.kind,
            tid: candidate.tid,
            depth,
            predecessors: candidate.predecessors,
            path: candidate.path,
            cone,
            metadata: EventMetadata::default(),
        };

        self.arena.push(record);
        self.index.insert(key, id);

        Ok(DedupResult { id, is_new: true })
    }

    /// Returns whether the already-interned event `id` matches the shape of
    /// `candidate` — used during catch-up replay to detect a host that
    /// diverged from the recorded schedule.
    pub fn matches(&self, id: EventId, candidate: &CandidateEvent) -> bool {
        let depth = self.depth_of_candidate(&candidate.predecessors);
        let rec = self.get(id);
        rec.tid == candidate.tid
            && rec.depth == depth
            && rec.kind == candidate.kind
            && rec.predecessors == candidate.predecessors
            && rec.path == candidate.path
    }

    pub fn is_less_than(&self, a: EventId, b: EventId) -> bool {
        cone::is_less_than(self, a, b)
    }

    pub fn is_less_than_eq(&self, a: EventId, b: EventId) -> bool {
        cone::is_less_than_eq(self, a, b)
    }

    pub fn is_concurrent(&self, a: EventId, b: EventId) -> bool {
        cone::is_concurrent(self, a, b)
    }

    pub fn independent(&self, a: EventId, b: EventId) -> bool {
        independence::independent(self, a, b)
    }
}

impl Default for Unfolding {
    fn default() -> Unfolding {
        Unfolding::new()
    }
}

impl EventLookup for Unfolding {
    fn tid_of(&self, id: EventId) -> &ThreadId {
        &self.get(id).tid
    }

    fn depth_of(&self, id: EventId) -> u32 {
        self.get(id).depth
    }

    fn cone_of(&self, id: EventId) -> &Cone {
        &self.get(id).cone
    }

    fn kind_of(&self, id: EventId) -> &EventKind {
        &self.get(id).kind
    }

    fn predecessors_of(&self, id: EventId) -> &[EventId] {
        &self.get(id).predecessors
    }
}

#[cfg(test)]
impl Unfolding {
    /// Test helper: spawns `new_tid` from `creator`, returning the resulting
    /// `thread_init` event.
    pub(crate) fn spawn(&mut self, creator: EventId, new_tid: ThreadId) -> EventId {
        let creator_tid = self.get(creator).tid.clone();
        let create = self
            .deduplicate(CandidateEvent {
                kind: EventKind::ThreadCreate {
                    created: new_tid.clone(),
                },
                tid: creator_tid,
                predecessors: vec![creator],
                path: None,
            })
            .unwrap()
            .id;

        self.deduplicate(CandidateEvent {
            kind: EventKind::ThreadInit,
            tid: new_tid,
            predecessors: vec![create],
            path: None,
        })
        .unwrap()
        .id
    }

    /// Test helper: appends a `local` event after `pred`.
    pub(crate) fn local(&mut self, pred: EventId, path: LocalPath) -> EventId {
        let tid = self.get(pred).tid.clone();
        self.deduplicate(CandidateEvent {
            kind: EventKind::Local,
            tid,
            predecessors: vec![pred],
            path: Some(path),
        })
        .unwrap()
        .id
    }
}
