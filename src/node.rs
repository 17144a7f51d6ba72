//! The exploration tree: each left edge commits one more event into a
//! configuration, each right edge records an unexplored alternative, and
//! sweep-bit bookkeeping reclaims explored subtrees.
//!
//! Nodes carry no parent pointer (in keeping with the arena/`EventId`
//! philosophy used for events — see `src/unfolding.rs`): a child records its
//! [`Node::distance_to_last_standby_state`] directly at construction instead
//! of walking back up the tree to find it.

use crate::config::Options;
use crate::configuration::Configuration;
use crate::conflict::{self, Scratch};
use crate::error::{PorError, Result};
use crate::event::{EventId, EventKind, EventLookup};

use std::any::Any;
use std::sync::Arc;

/// Pairs of event kinds that must schedule back-to-back on their thread: no
/// alternative branch may be grafted between them, since the second is only
/// ever enabled by the first and reordering anything in between changes
/// nothing observable. `lock_acquire -> thread_exit` covers a thread that
/// exits still holding a lock (the release is implicit); `thread_create ->
/// thread_init` covers a child thread's mandatory first event.
fn forms_atomic_group(first: &EventKind, second: &EventKind) -> bool {
    matches!(
        (first, second),
        (EventKind::LockAcquire { .. }, EventKind::ThreadExit)
            | (EventKind::ThreadCreate { .. }, EventKind::ThreadInit)
    )
}

/// True if `candidate` is the back half of an atomic group whose front half
/// is `committed` — such a candidate is never worth branching on, since it
/// cannot legally be delayed past `committed`.
fn is_atomic_continuation<L: EventLookup>(lookup: &L, committed: EventId, candidate: EventId) -> bool {
    forms_atomic_group(lookup.kind_of(committed), lookup.kind_of(candidate))
}

/// Host-opaque interpreter snapshot. The core never inspects this — it only
/// stores and hands it back so a host can skip re-running committed events.
pub type StandbySnapshot = Arc<dyn Any + Send + Sync>;

/// Cursor over a previously recorded schedule being replayed rather than
/// freshly explored.
#[derive(Debug, Clone)]
pub struct CatchUp {
    schedule: Vec<EventId>,
    pos: usize,
}

impl CatchUp {
    pub fn new(schedule: Vec<EventId>) -> CatchUp {
        CatchUp { schedule, pos: 0 }
    }

    /// The next event the host is expected to report, without consuming it.
    pub fn peek(&self) -> Option<EventId> {
        self.schedule.get(self.pos).copied()
    }

    pub fn advance(&mut self) {
        self.pos += 1;
    }

    pub fn is_done(&self) -> bool {
        self.pos >= self.schedule.len()
    }
}

pub struct Node {
    configuration: Configuration,
    /// Events this node's most recent commit disabled, each a candidate for
    /// [`crate::conflict::compute_alternative`].
    disabled: Vec<EventId>,
    left: Option<Box<Node>>,
    /// Chain of sibling alternatives, one per disabled event an alternative
    /// was found for. `create_right_branches` appends to the tail.
    right: Option<Box<Node>>,
    standby: Option<StandbySnapshot>,
    catch_up: Option<CatchUp>,
    sweep_bit: bool,
    distance_to_last_standby: usize,
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("configuration", &self.configuration)
            .field("disabled", &self.disabled)
            .field("has_standby", &self.standby.is_some())
            .field("catch_up", &self.catch_up)
            .field("sweep_bit", &self.sweep_bit)
            .field("distance_to_last_standby", &self.distance_to_last_standby)
            .finish()
    }
}

impl Node {
    pub fn root(configuration: Configuration) -> Node {
        Node {
            configuration,
            disabled: Vec::new(),
            left: None,
            right: None,
            standby: None,
            catch_up: None,
            sweep_bit: false,
            distance_to_last_standby: 0,
        }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn configuration_mut(&mut self) -> &mut Configuration {
        &mut self.configuration
    }

    pub fn disabled(&self) -> &[EventId] {
        &self.disabled
    }

    pub fn standby(&self) -> Option<&StandbySnapshot> {
        self.standby.as_ref()
    }

    pub fn set_standby(&mut self, snapshot: StandbySnapshot) {
        self.standby = Some(snapshot);
        self.distance_to_last_standby = 0;
    }

    /// Left-edges walked since the nearest ancestor (inclusive) that carries
    /// a standby snapshot.
    pub fn distance_to_last_standby_state(&self) -> usize {
        self.distance_to_last_standby
    }

    pub fn left(&self) -> Option<&Node> {
        self.left.as_deref()
    }

    pub fn right(&self) -> Option<&Node> {
        self.right.as_deref()
    }

    /// Commits one more event: grows a `left` child owning the advanced
    /// configuration and the set of events it newly disabled.
    pub fn make_left_child(
        &mut self,
        advanced: Configuration,
        newly_disabled: Vec<EventId>,
    ) -> &mut Node {
        self.left = Some(Box::new(Node {
            configuration: advanced,
            disabled: newly_disabled,
            left: None,
            right: None,
            standby: None,
            catch_up: None,
            sweep_bit: false,
            distance_to_last_standby: self.distance_to_last_standby + 1,
        }));
        self.left.as_mut().unwrap()
    }

    /// For each event in `self.disabled`, looks for an alternative via
    /// [`crate::conflict::compute_alternative`] against the full unfolding;
    /// every hit becomes a new sibling appended to the `right` chain, each
    /// wrapping a copy-on-write fork of `base` (cheap: `Configuration` is
    /// `Rc`-backed, so forking is just a clone until one side mutates).
    ///
    /// Returns the number of branches created.
    pub fn create_right_branches<L: EventLookup>(
        &mut self,
        lookup: &L,
        arena_len: usize,
        base: &Configuration,
        options: &Options,
        scratch: &mut Scratch,
    ) -> usize {
        let disabled = self.disabled.clone();
        let last_committed = base.schedule().last().copied();
        let mut created = 0;
        let mut tail = &mut self.right;
        for &conflicting in &disabled {
            if let Some(committed) = last_committed {
                if is_atomic_continuation(lookup, committed, conflicting) {
                    continue;
                }
            }
            if let Some(alt) =
                conflict::compute_alternative(lookup, arena_len, conflicting, &disabled, options, scratch)
            {
                let branch = Box::new(Node {
                    configuration: base.clone(),
                    disabled: vec![alt],
                    left: None,
                    right: None,
                    standby: None,
                    catch_up: None,
                    sweep_bit: false,
                    distance_to_last_standby: self.distance_to_last_standby + 1,
                });
                *tail = Some(branch);
                tail = &mut tail.as_mut().unwrap().right;
                created += 1;
            }
        }
        created
    }

    pub fn begin_catch_up(&mut self, schedule: Vec<EventId>) {
        self.catch_up = Some(CatchUp::new(schedule));
    }

    pub fn is_catching_up(&self) -> bool {
        self.catch_up.as_ref().is_some_and(|cu| !cu.is_done())
    }

    /// Validates that the host committed the event the recorded schedule
    /// expects, advancing the cursor. A no-op once catch-up has finished.
    pub fn catch_up_step(&mut self, committed: EventId) -> Result<()> {
        match &mut self.catch_up {
            Some(cu) if !cu.is_done() => {
                if cu.peek() != Some(committed) {
                    return Err(PorError::invariant(
                        "catch-up cursor diverged from the recorded schedule",
                    ));
                }
                cu.advance();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn mark_swept(&mut self) {
        self.sweep_bit = true;
        if let Some(right) = &mut self.right {
            right.mark_swept();
        }
    }

    pub fn is_swept(&self) -> bool {
        self.sweep_bit
    }

    pub fn clear_sweep(&mut self) {
        self.sweep_bit = false;
    }

    /// Drops the `left` subtree once it has been fully swept and has no
    /// remaining unexplored right alternatives, reclaiming memory for
    /// configurations the search will never revisit.
    pub fn backtrack(&mut self) {
        if let Some(left) = &self.left {
            if left.sweep_bit && left.right.is_none() {
                self.left = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unfolding::Unfolding;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn left_child_inherits_standby_distance() {
        let u = Rc::new(RefCell::new(Unfolding::new()));
        let cfg = Configuration::new(u);
        let mut root = Node::root(cfg.clone());
        assert_eq!(root.distance_to_last_standby_state(), 0);

        root.set_standby(Arc::new(42usize));
        let child = root.make_left_child(cfg.clone(), Vec::new());
        assert_eq!(child.distance_to_last_standby_state(), 1);

        let grandchild = child.make_left_child(cfg, Vec::new());
        assert_eq!(grandchild.distance_to_last_standby_state(), 2);
    }

    #[test]
    fn backtrack_drops_fully_swept_childless_left() {
        let u = Rc::new(RefCell::new(Unfolding::new()));
        let cfg = Configuration::new(u);
        let mut root = Node::root(cfg.clone());
        root.make_left_child(cfg, Vec::new());
        assert!(root.left().is_some());

        root.left.as_mut().unwrap().mark_swept();
        root.backtrack();
        assert!(root.left().is_none());
    }

    #[test]
    fn atomic_group_pairs_are_recognized() {
        assert!(forms_atomic_group(
            &crate::event::EventKind::LockAcquire {
                lock: crate::ids::LockId::new(1).unwrap()
            },
            &crate::event::EventKind::ThreadExit
        ));
        assert!(forms_atomic_group(
            &crate::event::EventKind::ThreadCreate {
                created: crate::ids::ThreadId::root().child(1)
            },
            &crate::event::EventKind::ThreadInit
        ));
        assert!(!forms_atomic_group(
            &crate::event::EventKind::Local,
            &crate::event::EventKind::ThreadExit
        ));
    }

    #[test]
    fn catch_up_rejects_divergent_event() {
        let u = Rc::new(RefCell::new(Unfolding::new()));
        let cfg = Configuration::new(u.clone());
        let mut root = Node::root(cfg);
        let real = u.borrow().program_init();
        root.begin_catch_up(vec![real]);

        let bogus = crate::event::EventId(99);
        assert!(root.catch_up_step(bogus).is_err());
        assert!(root.catch_up_step(real).is_ok());
        assert!(!root.is_catching_up());
    }
}
