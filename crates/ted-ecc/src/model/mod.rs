//! Domain model: the topology entity graph, the dual-index registry that
//! exposes it, and the unit/quantity value objects shared with the history
//! codecs.

mod mtu;
mod registry;
mod spyder;
mod units;

pub use mtu::Mtu;
pub use registry::{Indexed, Registry};
pub use spyder::{Ct, Group, Spyder};
pub use units::{
    Reading, Snapshot, Timestamp, cost_from_hundredths, multiplier_from_wire, multiplier_to_wire,
    voltage_from_tenths,
};
