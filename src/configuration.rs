//! The configuration: a causally closed, conflict-free set of committed
//! events, exposed as one method per concurrency operation (§4.3). Every
//! method is either a *commit* (construct/dedup a new event, install it into
//! the relevant head maps, append to the schedule) or, while
//! [`Configuration::is_catching_up`] is true, a *validate-and-advance* against
//! the schedule recorded by an earlier exploration of this same prefix.

use crate::error::{PorError, Result};
use crate::event::{CandidateEvent, EventId, EventKind};
use crate::ids::{CondId, LockId, ThreadId};
use crate::unfolding::Unfolding;

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use tracing::trace;

/// Per-condition-variable bookkeeping: who is waiting, who has been notified
/// but hasn't resumed yet, and the most recent non-lost notification (used
/// both to satisfy a later `wait1`'s "prior notifications" predecessor and
/// as the chain anchor for a lost notification).
#[derive(Debug, Clone, Default)]
struct CondState {
    create_event: Option<EventId>,
    /// `wait1` events whose thread has not yet been notified.
    waiting: Vec<EventId>,
    /// thread -> (its `wait1`, the signal/broadcast that woke it), waiting
    /// for the matching `wait2`.
    notified: HashMap<ThreadId, (EventId, EventId)>,
    last_notification: Option<EventId>,
}

impl CondState {
    fn relevant_events(&self) -> Vec<EventId> {
        let mut v = Vec::new();
        v.extend(self.create_event);
        v.extend(self.waiting.iter().copied());
        v.extend(self.notified.values().map(|&(_, notifier)| notifier));
        v.extend(self.notified.values().map(|&(wait1, _)| wait1));
        v.extend(self.last_notification);
        v
    }
}

#[derive(Debug, Clone)]
struct ConfigState {
    thread_heads: BTreeMap<ThreadId, EventId>,
    lock_heads: HashMap<LockId, EventId>,
    cond_heads: HashMap<CondId, CondState>,
    schedule: Vec<EventId>,
    schedule_pos: usize,
    next_child: HashMap<ThreadId, u16>,
}

/// A causally closed, conflict-free committed configuration, sharing an
/// [`Unfolding`] with every other configuration derived from the same
/// exploration tree.
#[derive(Debug, Clone)]
pub struct Configuration {
    unfolding: Rc<RefCell<Unfolding>>,
    state: Rc<ConfigState>,
    /// Whether an `acquire`/`wait1`/… on a lock/cv with no prior `create` is
    /// synthesized rather than rejected. Defaults to `true`: a host is free
    /// to skip emitting explicit creation events for resources it considers
    /// always-available.
    pub allow_implicit_creation: bool,
}

impl Configuration {
    /// A fresh configuration containing only `program_init`. Call
    /// [`Configuration::spawn_thread`] with `source: None` to bring up the
    /// main thread, exactly as scenario 1 does.
    pub fn new(unfolding: Rc<RefCell<Unfolding>>) -> Configuration {
        let root = unfolding.borrow().program_init();
        Configuration {
            unfolding,
            state: Rc::new(ConfigState {
                thread_heads: BTreeMap::new(),
                lock_heads: HashMap::new(),
                cond_heads: HashMap::new(),
                schedule: vec![root],
                schedule_pos: 1,
                next_child: HashMap::new(),
            }),
            allow_implicit_creation: true,
        }
    }

    pub fn unfolding(&self) -> &Rc<RefCell<Unfolding>> {
        &self.unfolding
    }

    fn state_mut(&mut self) -> &mut ConfigState {
        Rc::make_mut(&mut self.state)
    }

    pub fn is_catching_up(&self) -> bool {
        self.state.schedule_pos < self.state.schedule.len()
    }

    /// The next recorded event to be replayed, without consuming it.
    pub fn peek(&self) -> Option<EventId> {
        self.state.schedule.get(self.state.schedule_pos).copied()
    }

    pub fn schedule(&self) -> &[EventId] {
        &self.state.schedule
    }

    pub fn schedule_pos(&self) -> usize {
        self.state.schedule_pos
    }

    pub fn thread_heads(&self) -> &BTreeMap<ThreadId, EventId> {
        &self.state.thread_heads
    }

    pub fn lock_heads(&self) -> &HashMap<LockId, EventId> {
        &self.state.lock_heads
    }

    pub fn cond_heads(&self) -> HashMap<CondId, Vec<EventId>> {
        self.state
            .cond_heads
            .iter()
            .map(|(&cid, cs)| (cid, cs.relevant_events()))
            .collect()
    }

    /// Threads whose most recent event is not `thread_exit`.
    pub fn active_threads(&self) -> Vec<ThreadId> {
        let u = self.unfolding.borrow();
        self.state
            .thread_heads
            .iter()
            .filter(|&(_, &head)| !matches!(u.get(head).kind, EventKind::ThreadExit))
            .map(|(tid, _)| tid.clone())
            .collect()
    }

    // -- predecessor helpers -------------------------------------------------

    /// `same_thread_pred`, followed by every id in `extra` that is not
    /// already causally dominated by `same_thread_pred` (avoids redundant
    /// predecessor entries the cone construction would merge away anyway).
    fn assemble_predecessors(
        &self,
        same_thread_pred: Option<EventId>,
        extra: impl IntoIterator<Item = EventId>,
    ) -> Vec<EventId> {
        let u = self.unfolding.borrow();
        let mut preds: Vec<EventId> = same_thread_pred.into_iter().collect();
        for e in extra {
            let dominated = same_thread_pred.is_some_and(|p| u.is_less_than_eq(e, p));
            if !dominated && !preds.contains(&e) {
                preds.push(e);
            }
        }
        preds
    }

    fn require_alive(&self, tid: &ThreadId) -> Result<EventId> {
        let head = *self
            .state
            .thread_heads
            .get(tid)
            .ok_or_else(|| PorError::invalid(format!("thread {tid} was never spawned")))?;
        let kind = self.unfolding.borrow().get(head).kind.clone();
        match kind {
            EventKind::ThreadExit => {
                Err(PorError::invalid(format!("thread {tid} has already exited")))
            }
            EventKind::Wait1 { .. } => Err(PorError::invalid(format!(
                "thread {tid} is blocked in a condition wait"
            ))),
            _ => Ok(head),
        }
    }

    fn dedup_and_commit(&mut self, candidate: CandidateEvent) -> Result<EventId> {
        if self.is_catching_up() {
            let expected = self.state.schedule[self.state.schedule_pos];
            if !self.unfolding.borrow().matches(expected, &candidate) {
                return Err(PorError::invariant(format!(
                    "catch-up divergence at schedule position {}: host reported {:?} on {} \
                     but the recorded schedule expects a different event",
                    self.state.schedule_pos, candidate.kind, candidate.tid
                )));
            }
            trace!(tid = %candidate.tid, kind = ?candidate.kind, "catch-up");
            self.state_mut().schedule_pos += 1;
            Ok(expected)
        } else {
            let dedup = self.unfolding.borrow_mut().deduplicate(candidate)?;
            trace!(id = ?dedup.id, is_new = dedup.is_new, "commit");
            let st = self.state_mut();
            st.schedule.push(dedup.id);
            st.schedule_pos += 1;
            Ok(dedup.id)
        }
    }

    // -- thread operations ----------------------------------------------------

    /// Emits `thread_create(source)` (unless `source` is `None`, the
    /// program-init sentinel) followed by `thread_init`. Returns the new
    /// thread's id.
    pub fn spawn_thread(&mut self, source: Option<ThreadId>) -> Result<ThreadId> {
        let numbering_tid = source.clone().unwrap_or_else(ThreadId::root);
        let index = {
            let st = self.state_mut();
            let counter = st.next_child.entry(numbering_tid.clone()).or_insert(0);
            *counter += 1;
            *counter
        };
        let new_tid = numbering_tid.child(index);

        let creator_event = match &source {
            None => self.unfolding.borrow().program_init(),
            Some(tid) => {
                let head = self.require_alive(tid)?;
                let candidate = CandidateEvent {
                    kind: EventKind::ThreadCreate {
                        created: new_tid.clone(),
                    },
                    tid: tid.clone(),
                    predecessors: vec![head],
                    path: None,
                };
                let id = self.dedup_and_commit(candidate)?;
                self.state_mut().thread_heads.insert(tid.clone(), id);
                id
            }
        };

        let init_candidate = CandidateEvent {
            kind: EventKind::ThreadInit,
            tid: new_tid.clone(),
            predecessors: vec![creator_event],
            path: None,
        };
        let init_id = self.dedup_and_commit(init_candidate)?;
        self.state_mut().thread_heads.insert(new_tid.clone(), init_id);

        trace!(thread = %new_tid, "spawn");
        Ok(new_tid)
    }

    pub fn stop_thread(&mut self, tid: ThreadId) -> Result<EventId> {
        let head = self.require_alive(&tid)?;
        let candidate = CandidateEvent {
            kind: EventKind::ThreadExit,
            tid: tid.clone(),
            predecessors: vec![head],
            path: None,
        };
        let id = self.dedup_and_commit(candidate)?;
        self.state_mut().thread_heads.insert(tid, id);
        Ok(id)
    }

    pub fn join_thread(&mut self, tid: ThreadId, joined: ThreadId) -> Result<EventId> {
        let head = self.require_alive(&tid)?;
        let joined_head = *self
            .state
            .thread_heads
            .get(&joined)
            .ok_or_else(|| PorError::invalid(format!("thread {joined} was never spawned")))?;

        if !matches!(self.unfolding.borrow().get(joined_head).kind, EventKind::ThreadExit) {
            return Err(PorError::invalid(format!(
                "thread {joined} has not exited yet"
            )));
        }

        let preds = self.assemble_predecessors(Some(head), [joined_head]);
        let candidate = CandidateEvent {
            kind: EventKind::ThreadJoin { joined },
            tid: tid.clone(),
            predecessors: preds,
            path: None,
        };
        let id = self.dedup_and_commit(candidate)?;
        self.state_mut().thread_heads.insert(tid, id);
        Ok(id)
    }

    // -- lock operations --------------------------------------------------

    fn lock_is_held(&self, event: EventId) -> bool {
        matches!(
            self.unfolding.borrow().get(event).kind,
            EventKind::LockAcquire { .. } | EventKind::Wait2 { .. }
        )
    }

    pub fn create_lock(&mut self, tid: ThreadId, lock: LockId) -> Result<EventId> {
        let head = self.require_alive(&tid)?;
        if self.state.lock_heads.contains_key(&lock) {
            return Err(PorError::invalid(format!("lock {lock} already created")));
        }
        let candidate = CandidateEvent {
            kind: EventKind::LockCreate { lock },
            tid: tid.clone(),
            predecessors: vec![head],
            path: None,
        };
        let id = self.dedup_and_commit(candidate)?;
        let st = self.state_mut();
        st.thread_heads.insert(tid, id);
        st.lock_heads.insert(lock, id);
        Ok(id)
    }

    pub fn destroy_lock(&mut self, tid: ThreadId, lock: LockId) -> Result<EventId> {
        let head = self.require_alive(&tid)?;
        let lock_head = *self
            .state
            .lock_heads
            .get(&lock)
            .ok_or_else(|| PorError::invalid(format!("lock {lock} was never created")))?;
        if self.lock_is_held(lock_head) {
            return Err(PorError::invalid(format!(
                "lock {lock} is currently held; cannot destroy"
            )));
        }
        let preds = self.assemble_predecessors(Some(head), [lock_head]);
        let candidate = CandidateEvent {
            kind: EventKind::LockDestroy { lock },
            tid: tid.clone(),
            predecessors: preds,
            path: None,
        };
        let id = self.dedup_and_commit(candidate)?;
        let st = self.state_mut();
        st.thread_heads.insert(tid, id);
        st.lock_heads.remove(&lock);
        Ok(id)
    }

    pub fn acquire_lock(&mut self, tid: ThreadId, lock: LockId) -> Result<EventId> {
        let head = self.require_alive(&tid)?;
        let lock_head = self.state.lock_heads.get(&lock).copied();

        match lock_head {
            None if !self.allow_implicit_creation => {
                return Err(PorError::invalid(format!("lock {lock} was never created")))
            }
            Some(h) if self.lock_is_held(h) => {
                return Err(PorError::invalid(format!("lock {lock} is already held")))
            }
            _ => {}
        }

        let preds = self.assemble_predecessors(Some(head), lock_head);
        let candidate = CandidateEvent {
            kind: EventKind::LockAcquire { lock },
            tid: tid.clone(),
            predecessors: preds,
            path: None,
        };
        let id = self.dedup_and_commit(candidate)?;
        let st = self.state_mut();
        st.thread_heads.insert(tid, id);
        st.lock_heads.insert(lock, id);
        Ok(id)
    }

    pub fn release_lock(&mut self, tid: ThreadId, lock: LockId) -> Result<EventId> {
        let head = self.require_alive(&tid)?;
        let head_kind = self.unfolding.borrow().get(head).kind.clone();
        let holds = match &head_kind {
            EventKind::LockAcquire { lock: l } => *l == lock,
            EventKind::Wait2 { .. } => self.wait2_lock(head) == Some(lock),
            _ => false,
        };
        if !holds {
            return Err(PorError::invalid(format!(
                "thread {tid} does not hold lock {lock}"
            )));
        }
        let candidate = CandidateEvent {
            kind: EventKind::LockRelease { lock },
            tid: tid.clone(),
            predecessors: vec![head],
            path: None,
        };
        let id = self.dedup_and_commit(candidate)?;
        let st = self.state_mut();
        st.thread_heads.insert(tid, id);
        st.lock_heads.insert(lock, id);
        Ok(id)
    }

    fn wait2_lock(&self, wait2_event: EventId) -> Option<LockId> {
        let u = self.unfolding.borrow();
        let wait1 = *u.get(wait2_event).predecessors.first()?;
        match u.get(wait1).kind {
            EventKind::Wait1 { lock, .. } => Some(lock),
            _ => None,
        }
    }

    // -- condition variable operations --------------------------------------

    pub fn create_cond(&mut self, tid: ThreadId, cond: CondId) -> Result<EventId> {
        let head = self.require_alive(&tid)?;
        if self.state.cond_heads.contains_key(&cond) {
            return Err(PorError::invalid(format!("cond {cond} already created")));
        }
        let candidate = CandidateEvent {
            kind: EventKind::CondCreate { cond },
            tid: tid.clone(),
            predecessors: vec![head],
            path: None,
        };
        let id = self.dedup_and_commit(candidate)?;
        let st = self.state_mut();
        st.thread_heads.insert(tid, id);
        st.cond_heads.insert(
            cond,
            CondState {
                create_event: Some(id),
                ..Default::default()
            },
        );
        Ok(id)
    }

    pub fn destroy_cond(&mut self, tid: ThreadId, cond: CondId) -> Result<EventId> {
        let head = self.require_alive(&tid)?;
        let relevant = self
            .state
            .cond_heads
            .get(&cond)
            .ok_or_else(|| PorError::invalid(format!("cond {cond} was never created")))?
            .relevant_events();
        let preds = self.assemble_predecessors(Some(head), relevant);
        let candidate = CandidateEvent {
            kind: EventKind::CondDestroy { cond },
            tid: tid.clone(),
            predecessors: preds,
            path: None,
        };
        let id = self.dedup_and_commit(candidate)?;
        let st = self.state_mut();
        st.thread_heads.insert(tid, id);
        st.cond_heads.remove(&cond);
        Ok(id)
    }

    pub fn wait1(&mut self, tid: ThreadId, cond: CondId, lock: LockId) -> Result<EventId> {
        let head = self.require_alive(&tid)?;
        match self.unfolding.borrow().get(head).kind {
            EventKind::LockAcquire { lock: l } if l == lock => {}
            _ => {
                return Err(PorError::invalid(format!(
                    "thread {tid} must hold lock {lock} via a plain acquire to wait on {cond}"
                )))
            }
        }
        if !self.allow_implicit_creation && !self.state.cond_heads.contains_key(&cond) {
            return Err(PorError::invalid(format!("cond {cond} was never created")));
        }
        let last_notification = self
            .state
            .cond_heads
            .get(&cond)
            .and_then(|cs| cs.last_notification);

        let preds = self.assemble_predecessors(Some(head), last_notification);
        let candidate = CandidateEvent {
            kind: EventKind::Wait1 { cond, lock },
            tid: tid.clone(),
            predecessors: preds,
            path: None,
        };
        let id = self.dedup_and_commit(candidate)?;

        let st = self.state_mut();
        st.thread_heads.insert(tid, id);
        // wait1 implicitly releases the lock: the chain head becomes this
        // wait1 event, whose kind is not held (see `lock_is_held`).
        st.lock_heads.insert(lock, id);
        st.cond_heads.entry(cond).or_default().waiting.push(id);
        Ok(id)
    }

    pub fn wait2(&mut self, tid: ThreadId, cond: CondId) -> Result<EventId> {
        let (wait1_id, notifier_id) = *self
            .state
            .cond_heads
            .get(&cond)
            .and_then(|cs| cs.notified.get(&tid))
            .ok_or_else(|| {
                PorError::invalid(format!("thread {tid} has not been notified on cond {cond}"))
            })?;

        let lock = self
            .wait2_wait1_lock(wait1_id)
            .expect("wait1 predecessor must carry a lock");
        let release = self.state.lock_heads.get(&lock).copied().filter(|&e| {
            matches!(self.unfolding.borrow().get(e).kind, EventKind::LockRelease { .. })
        });

        let mut preds = vec![wait1_id, notifier_id];
        preds.extend(release);

        let candidate = CandidateEvent {
            kind: EventKind::Wait2 { cond },
            tid: tid.clone(),
            predecessors: preds,
            path: None,
        };
        let id = self.dedup_and_commit(candidate)?;

        let st = self.state_mut();
        st.thread_heads.insert(tid.clone(), id);
        st.lock_heads.insert(lock, id);
        if let Some(cs) = st.cond_heads.get_mut(&cond) {
            cs.notified.remove(&tid);
        }
        Ok(id)
    }

    fn wait2_wait1_lock(&self, wait1_id: EventId) -> Option<LockId> {
        match self.unfolding.borrow().get(wait1_id).kind {
            EventKind::Wait1 { lock, .. } => Some(lock),
            _ => None,
        }
    }

    /// `target = Some(t)`: a notifying signal waking `t`, which must
    /// currently be waiting on `cond`. `target = None`: a lost signal (no
    /// waiter to wake).
    pub fn signal(&mut self, tid: ThreadId, cond: CondId, target: Option<ThreadId>) -> Result<EventId> {
        let head = self.require_alive(&tid)?;

        match target {
            Some(t) => {
                let wait1_id = self.take_waiting(&cond, &t)?;
                let preds = self.assemble_predecessors(Some(head), [wait1_id]);
                let candidate = CandidateEvent {
                    kind: EventKind::Signal { cond, lost: false },
                    tid: tid.clone(),
                    predecessors: preds,
                    path: None,
                };
                let id = self.dedup_and_commit(candidate)?;
                let st = self.state_mut();
                st.thread_heads.insert(tid, id);
                let cs = st.cond_heads.entry(cond).or_default();
                cs.notified.insert(t, (wait1_id, id));
                cs.last_notification = Some(id);
                Ok(id)
            }
            None => {
                let prior = self
                    .state
                    .cond_heads
                    .get(&cond)
                    .and_then(|cs| cs.last_notification);
                let preds = self.assemble_predecessors(Some(head), prior);
                let candidate = CandidateEvent {
                    kind: EventKind::Signal { cond, lost: true },
                    tid: tid.clone(),
                    predecessors: preds,
                    path: None,
                };
                let id = self.dedup_and_commit(candidate)?;
                self.state_mut().thread_heads.insert(tid, id);
                Ok(id)
            }
        }
    }

    /// `targets` must be a subset of the threads currently waiting on `cond`.
    /// An empty set is a lost broadcast.
    pub fn broadcast(&mut self, tid: ThreadId, cond: CondId, targets: Vec<ThreadId>) -> Result<EventId> {
        let head = self.require_alive(&tid)?;

        if targets.is_empty() {
            let prior = self
                .state
                .cond_heads
                .get(&cond)
                .and_then(|cs| cs.last_notification);
            let preds = self.assemble_predecessors(Some(head), prior);
            let candidate = CandidateEvent {
                kind: EventKind::Broadcast { cond, lost: true },
                tid: tid.clone(),
                predecessors: preds,
                path: None,
            };
            let id = self.dedup_and_commit(candidate)?;
            self.state_mut().thread_heads.insert(tid, id);
            return Ok(id);
        }

        let mut wait1s = Vec::with_capacity(targets.len());
        for t in &targets {
            wait1s.push(self.take_waiting(&cond, t)?);
        }

        let preds = self.assemble_predecessors(Some(head), wait1s.iter().copied());
        let candidate = CandidateEvent {
            kind: EventKind::Broadcast { cond, lost: false },
            tid: tid.clone(),
            predecessors: preds,
            path: None,
        };
        let id = self.dedup_and_commit(candidate)?;

        let st = self.state_mut();
        st.thread_heads.insert(tid, id);
        let cs = st.cond_heads.entry(cond).or_default();
        for (t, wait1_id) in targets.into_iter().zip(wait1s) {
            cs.notified.insert(t, (wait1_id, id));
        }
        cs.last_notification = Some(id);
        Ok(id)
    }

    fn take_waiting(&mut self, cond: &CondId, tid: &ThreadId) -> Result<EventId> {
        let u = self.unfolding.borrow();
        let cs = self
            .state
            .cond_heads
            .get(cond)
            .ok_or_else(|| PorError::invalid(format!("cond {cond} was never created")))?;
        let pos = cs
            .waiting
            .iter()
            .position(|&e| u.get(e).tid == *tid)
            .ok_or_else(|| {
                PorError::invalid(format!("thread {tid} is not waiting on cond {cond}"))
            })?;
        let wait1_id = cs.waiting[pos];
        drop(u);
        self.state_mut()
            .cond_heads
            .get_mut(cond)
            .unwrap()
            .waiting
            .remove(pos);
        Ok(wait1_id)
    }

    // -- local ---------------------------------------------------------------

    pub fn local(&mut self, tid: ThreadId, path: crate::event::LocalPath) -> Result<EventId> {
        let head = self.require_alive(&tid)?;
        let candidate = CandidateEvent {
            kind: EventKind::Local,
            tid: tid.clone(),
            predecessors: vec![head],
            path: Some(path),
        };
        let id = self.dedup_and_commit(candidate)?;
        self.state_mut().thread_heads.insert(tid, id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> (Rc<RefCell<Unfolding>>, Configuration) {
        let u = Rc::new(RefCell::new(Unfolding::new()));
        let cfg = Configuration::new(u.clone());
        (u, cfg)
    }

    /// Scenario 1: lone lock.
    #[test]
    fn lone_lock_schedule_has_seven_events() {
        let (_u, mut cfg) = fresh();
        let t1 = cfg.spawn_thread(None).unwrap();
        let lid = LockId::new(1).unwrap();

        cfg.create_lock(t1.clone(), lid).unwrap();
        cfg.acquire_lock(t1.clone(), lid).unwrap();
        cfg.release_lock(t1.clone(), lid).unwrap();
        cfg.destroy_lock(t1.clone(), lid).unwrap();
        cfg.stop_thread(t1).unwrap();

        assert_eq!(cfg.schedule().len(), 7);
    }

    #[test]
    fn double_acquire_is_rejected() {
        let (_u, mut cfg) = fresh();
        let t1 = cfg.spawn_thread(None).unwrap();
        let lid = LockId::new(1).unwrap();
        cfg.create_lock(t1.clone(), lid).unwrap();
        cfg.acquire_lock(t1.clone(), lid).unwrap();
        assert!(cfg.acquire_lock(t1, lid).is_err());
    }

    #[test]
    fn condvar_notify_round_trip() {
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
        cfg.signal(t2.clone(), cid, Some(t1.clone())).unwrap();
        cfg.release_lock(t2, lid).unwrap();

        let wait2 = cfg.wait2(t1.clone(), cid).unwrap();
        cfg.release_lock(t1, lid).unwrap();

        let u = cfg.unfolding().borrow();
        assert_eq!(u.get(wait2).predecessors.len(), 3);
    }

    #[test]
    fn catch_up_replays_without_new_events() {
        let u = Rc::new(RefCell::new(Unfolding::new()));
        let mut cfg = Configuration::new(u.clone());
        let t1 = cfg.spawn_thread(None).unwrap();
        let lid = LockId::new(1).unwrap();
        cfg.create_lock(t1.clone(), lid).unwrap();

        let before = u.borrow().len();

        let mut replay = Configuration::new(u.clone());
        replay.state_mut().schedule = cfg.schedule().to_vec();
        replay.state_mut().schedule_pos = 0;

        let replayed_t1 = replay.spawn_thread(None).unwrap();
        assert_eq!(replayed_t1, t1);
        replay.create_lock(replayed_t1, lid).unwrap();

        assert_eq!(u.borrow().len(), before);
        assert!(!replay.is_catching_up());
    }
}
