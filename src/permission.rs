//! The value stored at a node of a permission tree.

use std::fmt;
use std::sync::Arc;

/// A side-effect-free, terminating predicate evaluated at lookup time.
///
/// Cloning a `Condition` clones the `Arc`, not the closure itself, so a
/// condition can be shared across many [`Permission`] values cheaply.
#[derive(Clone)]
pub struct Condition(Arc<dyn Fn() -> bool + Send + Sync>);

impl Condition {
    pub fn new(predicate: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(predicate))
    }

    pub fn evaluate(&self) -> bool {
        (self.0)()
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Condition(..)")
    }
}

/// A single permit/negate decision, optionally carrying an argument string
/// and an opaque runtime condition.
///
/// Equality and hashing only ever consider `permits`, `covers_self` and
/// `arg` — a condition is never compared, since two predicates with
/// identical behaviour but different closures would otherwise compare
/// unequal for no observable reason.
#[derive(Clone, Debug)]
pub struct Permission {
    permits: bool,
    covers_self: bool,
    arg: Option<String>,
    condition: Option<Condition>,
}

impl PartialEq for Permission {
    fn eq(&self, other: &Self) -> bool {
        self.permits == other.permits && self.covers_self == other.covers_self && self.arg == other.arg
    }
}

impl Eq for Permission {}

impl Permission {
    /// Grants access, anchored at the exact path it's stored at.
    pub const PERMITTING: Permission = Permission {
        permits: true,
        covers_self: true,
        arg: None,
        condition: None,
    };

    /// Grants access to everything strictly below the path it's stored at.
    pub const PERMITTING_INDIRECTLY: Permission = Permission {
        permits: true,
        covers_self: false,
        arg: None,
        condition: None,
    };

    /// Denies access, anchored at the exact path it's stored at.
    pub const NEGATING: Permission = Permission {
        permits: false,
        covers_self: true,
        arg: None,
        condition: None,
    };

    /// Denies access to everything strictly below the path it's stored at.
    pub const NEGATING_INDIRECTLY: Permission = Permission {
        permits: false,
        covers_self: false,
        arg: None,
        condition: None,
    };

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.arg = Some(arg.into());
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn permits(&self) -> bool {
        self.permits
    }

    pub fn covers_self(&self) -> bool {
        self.covers_self
    }

    pub fn arg(&self) -> Option<&str> {
        self.arg.as_deref()
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    /// True for permissions with no condition, or whose condition currently
    /// evaluates to true.
    pub fn is_active(&self) -> bool {
        self.condition.as_ref().map(Condition::evaluate).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_have_expected_shape() {
        assert!(Permission::PERMITTING.permits());
        assert!(Permission::PERMITTING.covers_self());
        assert!(!Permission::PERMITTING_INDIRECTLY.covers_self());
        assert!(!Permission::NEGATING.permits());
        assert!(!Permission::NEGATING_INDIRECTLY.permits());
        assert!(!Permission::NEGATING_INDIRECTLY.covers_self());
    }

    #[test]
    fn equality_ignores_condition() {
        let a = Permission::PERMITTING.clone().with_condition(Condition::new(|| true));
        let b = Permission::PERMITTING;
        assert_eq!(a, b);
    }

    #[test]
    fn condition_gates_activity() {
        let inactive = Permission::PERMITTING.clone().with_condition(Condition::new(|| false));
        assert!(!inactive.is_active());
        let active = Permission::PERMITTING.clone().with_condition(Condition::new(|| true));
        assert!(active.is_active());
        assert!(Permission::PERMITTING.is_active());
    }
}
