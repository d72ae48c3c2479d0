// ── Spyder, CT, and Group entities ──
//
// A Spyder is a sub-board aggregating up to eight current-transformer
// inputs into named groups. Parent links are integer handles into the
// topology's MTU list rather than back-pointers; the whole graph is
// immutable once the builder returns it.

use std::sync::Arc;

use crate::model::registry::Indexed;

/// A CT bank attached to one MTU.
#[derive(Debug)]
pub struct Spyder {
    /// Index of the owning [`Mtu`](crate::Mtu) in the topology.
    pub mtu: usize,
    /// Physical CT inputs, in device order.
    pub cts: Vec<Arc<Ct>>,
    /// Groups defined on this spyder that resolved to at least one CT.
    pub groups: Vec<Arc<Group>>,
}

/// A single current-transformer input.
#[derive(Debug)]
pub struct Ct {
    /// `true` for the high-range (20 A) transducer, `false` for standard.
    pub twenty_amp: bool,
    /// Signed gain, decoded from the wire convention
    /// (see [`multiplier_from_wire`](crate::model::multiplier_from_wire)).
    pub multiplier: i32,
    /// Name; may be empty.
    pub description: String,
}

/// A named subset of a spyder's CTs.
///
/// `index` is one-based and globally unique across the entire system:
/// every spyder consumes eight slots whether or not its groups resolve to
/// any CTs, so indices stay stable when banks are disabled.
#[derive(Debug)]
pub struct Group {
    pub index: usize,
    pub description: String,
    /// The CTs selected by this group's bitmask, shared with the owning
    /// spyder's CT list.
    pub cts: Vec<Arc<Ct>>,
}

impl Indexed for Group {
    fn index(&self) -> usize {
        self.index
    }

    fn description(&self) -> &str {
        &self.description
    }
}
