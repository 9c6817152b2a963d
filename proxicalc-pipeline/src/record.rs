//! Proximity record schema
//!
//! One record per numeric anchor token, carrying the anchor's rounded value
//! and the windowed neighbor context. The in-memory shape is a fixed struct
//! with a typed neighbor list; serialization flattens the neighbors to the
//! wire keys `t{side}_{distance}` (token text, always) and
//! `n{side}_{distance}` (rounded value, numeric neighbors only), with the
//! side abbreviated to `b`/`a`: `tb_1`, `na_2`.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Which side of the anchor a neighbor is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Before,
    After,
}

impl Side {
    /// Abbreviated side tag used in wire keys.
    pub fn wire_tag(&self) -> &'static str {
        match self {
            Side::Before => "b",
            Side::After => "a",
        }
    }
}

/// One token inside the window around an anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub side: Side,
    /// Token distance from the anchor, `1..=ambit`. Unique per side within
    /// one record.
    pub distance: usize,
    /// Raw token text.
    pub text: String,
    /// Rounded value when the neighbor is itself numeric.
    pub num: Option<f64>,
}

/// The document written to a target index for one numeric anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityRecord {
    pub source_index: String,
    pub source_id: String,
    pub source_field: String,
    /// Rounded numeric value of the anchor token.
    pub num: f64,
    pub neighbors: Vec<Neighbor>,
}

impl Serialize for ProximityRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(4 + 2 * self.neighbors.len()))?;
        map.serialize_entry("source_index", &self.source_index)?;
        map.serialize_entry("source_id", &self.source_id)?;
        map.serialize_entry("source_field", &self.source_field)?;
        map.serialize_entry("num", &self.num)?;

        for neighbor in &self.neighbors {
            let side = neighbor.side.wire_tag();
            if let Some(num) = neighbor.num {
                map.serialize_entry(&format!("n{}_{}", side, neighbor.distance), &num)?;
            }
            map.serialize_entry(&format!("t{}_{}", side, neighbor.distance), &neighbor.text)?;
        }

        map.end()
    }
}
