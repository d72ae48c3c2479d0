//! System layout builder.
//!
//! Parses the gateway's `api/SystemSettings.xml` into the entity graph and
//! the two dual-index registries. The construction order matters for group
//! indices: slots are assigned sequentially across *all* spyders in
//! document order, and a disabled spyder still consumes its eight slots so
//! that indices stay stable when banks are toggled off.

use std::sync::Arc;

use roxmltree::Document;
use tracing::{debug, trace};

use crate::error::Error;
use crate::model::{Ct, Group, Mtu, Registry, Spyder, multiplier_from_wire};
use crate::xml::{child_parse, child_text};

/// Slots reserved per spyder, enabled or not.
const GROUP_SLOTS_PER_SPYDER: usize = 8;

/// One fully built, immutable system layout.
#[derive(Debug)]
pub struct Topology {
    /// Measurement terminal units, by zero-based index and by name.
    pub mtus: Registry<Mtu>,
    /// Spyder groups, by global one-based index and by name.
    pub groups: Registry<Group>,
}

impl Topology {
    /// Build the layout from the body of `api/SystemSettings.xml`.
    ///
    /// Any failure leaves nothing behind -- callers only ever cache a
    /// fully constructed `Topology`.
    pub fn parse(xml: &str) -> Result<Self, Error> {
        let doc = Document::parse(xml)?;
        let root = doc.root_element();

        let mut mtus: Vec<Mtu> = Vec::new();
        for mtu_node in root
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "MTU")
        {
            let description = child_text(mtu_node, "MTUDescription")?;
            mtus.push(Mtu {
                index: mtus.len(),
                description,
                spyders: Vec::new(),
            });
        }

        let mut groups = Registry::new();
        let mut group_index = 1usize;

        for spyder_node in root
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "Spyder")
        {
            let enabled = child_text(spyder_node, "Enabled")? == "1";
            if !enabled {
                // Disabled banks still own their slot range.
                group_index += GROUP_SLOTS_PER_SPYDER;
                continue;
            }

            let mut cts: Vec<Arc<Ct>> = Vec::new();
            for ct_node in spyder_node
                .descendants()
                .filter(|n| n.is_element() && n.tag_name().name() == "CT")
            {
                let twenty_amp = child_text(ct_node, "Type")? == "1";
                let multiplier = multiplier_from_wire(child_parse(ct_node, "Mult")?);
                let description = child_text(ct_node, "Description")?;
                cts.push(Arc::new(Ct {
                    twenty_amp,
                    multiplier,
                    description,
                }));
            }

            let mut spyder_groups: Vec<Arc<Group>> = Vec::new();
            for group_node in spyder_node
                .descendants()
                .filter(|n| n.is_element() && n.tag_name().name() == "Group")
            {
                let description = child_text(group_node, "Description")?;
                let mut mask: u32 = child_parse(group_node, "UseCT")?;

                let mut group_cts: Vec<Arc<Ct>> = Vec::new();
                let mut ct_slot = 0usize;
                while mask != 0 {
                    if mask & 1 == 1 {
                        // Bits beyond the CT list are ignored.
                        if let Some(ct) = cts.get(ct_slot) {
                            group_cts.push(Arc::clone(ct));
                        }
                    }
                    mask >>= 1;
                    ct_slot += 1;
                }

                if group_cts.is_empty() {
                    trace!(group_index, "skipping group with no CTs");
                } else {
                    let group = Arc::new(Group {
                        index: group_index,
                        description,
                        cts: group_cts,
                    });
                    groups.insert(Arc::clone(&group));
                    spyder_groups.push(group);
                }
                // The slot is consumed whether or not the group materialized.
                group_index += 1;
            }

            let parent: usize = child_parse(spyder_node, "MTUParent")?;
            let count = mtus.len();
            let mtu = mtus
                .get_mut(parent)
                .ok_or(Error::MtuParentOutOfRange { parent, count })?;
            mtu.spyders.push(Spyder {
                mtu: parent,
                cts,
                groups: spyder_groups,
            });
        }

        let mut mtu_registry = Registry::new();
        for mtu in mtus {
            mtu_registry.insert(Arc::new(mtu));
        }

        debug!(
            mtus = mtu_registry.len(),
            groups = groups.len(),
            "system layout built"
        );
        Ok(Self {
            mtus: mtu_registry,
            groups,
        })
    }
}
