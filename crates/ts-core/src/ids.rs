//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  They also render to the stable
//! string keys used by the document store (`Display` / `FromStr`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Generate a typed ID wrapper around a `u64`.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty), prefix = $prefix:literal;) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[derive(Serialize, Deserialize)]
        #[serde(transparent)]
        $vis struct $name(pub $inner);

        impl $name {
            /// Prefix used in the rendered document key.
            pub const PREFIX: &'static str = $prefix;

            /// Stable document key, e.g. `"agent-42"`.
            pub fn key(self) -> String {
                self.to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = crate::CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.strip_prefix(concat!($prefix, "-"))
                    .and_then(|n| n.parse::<$inner>().ok())
                    .map($name)
                    .ok_or_else(|| crate::CoreError::Parse(format!(
                        "invalid {} key {s:?}", stringify!($name)
                    )))
            }
        }
    };
}

typed_id! {
    /// An autonomous agent (NPC).
    pub struct AgentId(u64), prefix = "agent";
}

typed_id! {
    /// A placed world object: dwelling, workshop, parcel, dropped item, …
    pub struct ObjectId(u64), prefix = "object";
}

typed_id! {
    /// A harvestable resource point.  Generated resources derive their ID
    /// from the terrain tile and snapped position, so regeneration is stable.
    pub struct ResourceId(u64), prefix = "resource";
}
