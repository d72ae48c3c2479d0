use crate::model::registry::Indexed;
use crate::model::spyder::Spyder;

/// A measurement terminal unit: the gateway's top-level per-port
/// measurement point.
///
/// Built once per topology snapshot and immutable afterwards. The attached
/// [`Spyder`]s are frozen at construction in document order.
#[derive(Debug)]
pub struct Mtu {
    /// Zero-based position as reported by the gateway, stable per session.
    pub index: usize,
    /// Human-readable name; may be empty for unconfigured ports.
    pub description: String,
    /// CT banks wired to this MTU.
    pub spyders: Vec<Spyder>,
}

impl Indexed for Mtu {
    fn index(&self) -> usize {
        self.index
    }

    fn description(&self) -> &str {
        &self.description
    }
}
