//! The four predicates the race detector's solver path needs, behind a trait
//! a host implements against its own constraint solver. `None` means
//! "unknown" (a timeout), propagated rather than guessed at.

use std::sync::Arc;

/// A host-opaque symbolic expression. The core never inspects its contents —
/// it only builds, passes, and discards these via [`RaceSolver`].
pub trait SymbolicExpr: std::fmt::Debug {
    /// Lets test solver backends recover their own concrete expression type.
    /// Production hosts backed by a real solver typically never need this.
    fn as_any(&self) -> &dyn std::any::Any;
}

use super::Offset;

pub trait RaceSolver {
    /// Is `expr` true under every model consistent with the current path
    /// constraints?
    fn must_be_true(&self, expr: &Arc<dyn SymbolicExpr>) -> Option<bool>;

    /// Is there a model in which `expr` is true?
    fn may_be_true(&self, expr: &Arc<dyn SymbolicExpr>) -> Option<bool>;

    /// Is there a model in which `expr` is false?
    fn may_be_false(&self, expr: &Arc<dyn SymbolicExpr>) -> Option<bool>;

    /// Builds the expression asserting that an `access_len`-byte access at
    /// `a` cannot overlap an access at `b`.
    fn build_no_overlap(&self, a: &Offset, b: &Offset, access_len: u64) -> Arc<dyn SymbolicExpr>;
}

/// A named symbolic offset, for tests to construct [`super::Offset::Symbolic`]
/// values [`MockSolver`] can reason about: two offsets with the same name are
/// treated as the same underlying value (so they overlap), different names
/// are treated as provably distinct.
#[derive(Debug)]
pub struct NamedOffset(pub String);

impl SymbolicExpr for NamedOffset {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[derive(Debug)]
struct MockExpr {
    no_overlap: bool,
}

impl SymbolicExpr for MockExpr {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Deterministic truth table for tests, driven by [`NamedOffset`] identity.
#[derive(Debug, Default)]
pub struct MockSolver {
    pub force_unknown: bool,
}

impl RaceSolver for MockSolver {
    fn must_be_true(&self, expr: &Arc<dyn SymbolicExpr>) -> Option<bool> {
        if self.force_unknown {
            return None;
        }
        Some(as_mock(expr).no_overlap)
    }

    fn may_be_true(&self, expr: &Arc<dyn SymbolicExpr>) -> Option<bool> {
        if self.force_unknown {
            return None;
        }
        Some(as_mock(expr).no_overlap)
    }

    fn may_be_false(&self, expr: &Arc<dyn SymbolicExpr>) -> Option<bool> {
        if self.force_unknown {
            return None;
        }
        Some(!as_mock(expr).no_overlap)
    }

    fn build_no_overlap(&self, a: &Offset, b: &Offset, _access_len: u64) -> Arc<dyn SymbolicExpr> {
        let name = |offset: &Offset| match offset {
            Offset::Symbolic(expr) => expr
                .as_any()
                .downcast_ref::<NamedOffset>()
                .map(|n| n.0.clone()),
            Offset::Concrete(value) => Some(format!("concrete:{value}")),
        };
        let no_overlap = match (name(a), name(b)) {
            (Some(x), Some(y)) => x != y,
            _ => false,
        };
        Arc::new(MockExpr { no_overlap })
    }
}

fn as_mock(expr: &Arc<dyn SymbolicExpr>) -> &MockExpr {
    expr.as_any()
        .downcast_ref::<MockExpr>()
        .expect("MockSolver only ever builds MockExpr")
}

/// A solver that always times out — exercises the `Unknown` propagation path.
#[derive(Debug, Default)]
pub struct AlwaysUnknownSolver;

impl RaceSolver for AlwaysUnknownSolver {
    fn must_be_true(&self, _expr: &Arc<dyn SymbolicExpr>) -> Option<bool> {
        None
    }

    fn may_be_true(&self, _expr: &Arc<dyn SymbolicExpr>) -> Option<bool> {
        None
    }

    fn may_be_false(&self, _expr: &Arc<dyn SymbolicExpr>) -> Option<bool> {
        None
    }

    fn build_no_overlap(&self, a: &Offset, b: &Offset, _access_len: u64) -> Arc<dyn SymbolicExpr> {
        let _ = (a, b);
        Arc::new(MockExpr { no_overlap: false })
    }
}
