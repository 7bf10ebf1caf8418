//! Generation-checked handles for graphs and vector spaces.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Slot index paired with the slot's generation at allocation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RawHandle {
    pub index: u32,
    pub generation: u32,
}

impl RawHandle {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Flat integer form: `generation << 32 | index`. Non-negative while
    /// the generation stays below 2^31.
    pub fn to_raw(self) -> i64 {
        ((self.generation as i64) << 32) | self.index as i64
    }

    /// Inverse of [`RawHandle::to_raw`]. Negative ids have no handle.
    pub fn from_raw(raw: i64) -> Option<Self> {
        if raw < 0 {
            return None;
        }
        Some(Self {
            index: (raw & 0xFFFF_FFFF) as u32,
            generation: (raw >> 32) as u32,
        })
    }
}

impl fmt::Display for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

macro_rules! typed_handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub RawHandle);

        impl $name {
            pub fn raw(self) -> RawHandle { self.0 }
            pub fn to_raw(self) -> i64 { self.0.to_raw() }
            pub fn from_raw(raw: i64) -> Option<Self> { RawHandle::from_raw(raw).map(Self) }
        }

        impl From<RawHandle> for $name {
            fn from(raw: RawHandle) -> Self { Self(raw) }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

typed_handle!(
    /// Handle to a live graph.
    GraphHandle,
    "graph"
);
typed_handle!(
    /// Handle to a loaded vector space. Graphs hold it as a non-owning reference.
    VectorSpaceHandle,
    "vector-space"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_encoding_round_trips() {
        let h = RawHandle::new(7, 3);
        let raw = h.to_raw();
        assert!(raw >= 0);
        assert_eq!(RawHandle::from_raw(raw), Some(h));
        assert_eq!(RawHandle::new(0, 0).to_raw(), 0);
        assert_eq!(RawHandle::from_raw(-1), None);
    }

    #[test]
    fn generations_produce_distinct_ids_for_one_slot() {
        let a = RawHandle::new(2, 0).to_raw();
        let b = RawHandle::new(2, 1).to_raw();
        assert_ne!(a, b);
    }

    #[test]
    fn display_names_the_kind() {
        let g = GraphHandle(RawHandle::new(1, 2));
        assert_eq!(g.to_string(), "graph#1v2");
    }
}
