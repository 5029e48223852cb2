//! Strongly-typed identifiers.

use std::fmt;

/// Identifies a track within one event.
///
/// Ids are assigned in creation order starting at 1. `TrackId(0)` is
/// reserved: it marks a track that has not been assigned an id yet and,
/// as a parent id, a primary track with no parent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub u64);

impl TrackId {
    /// Placeholder id for unassigned tracks and the parent of primaries.
    pub const NONE: TrackId = TrackId(0);

    /// Whether this is the reserved [`TrackId::NONE`].
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TrackId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies a registered effect.
///
/// Effects are registered at engine construction and assigned sequential
/// ids: `EffectId(n)` is the n-th effect in the configured list. The
/// highest value is reserved for the built-in transportation stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(pub u32);

impl EffectId {
    /// Handle of the built-in transportation stage.
    pub const TRANSPORTATION: EffectId = EffectId(u32::MAX);

    /// Registration index of this effect.
    ///
    /// Returns `None` for [`EffectId::TRANSPORTATION`].
    pub fn index(self) -> Option<usize> {
        if self == Self::TRANSPORTATION {
            None
        } else {
            Some(self.0 as usize)
        }
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::TRANSPORTATION {
            write!(f, "transportation")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<u32> for EffectId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies an event (one set of primaries and all their descendants).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EventId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies a geometry volume, as reported by a [`Navigator`](crate::Navigator).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VolumeId(pub u32);

impl fmt::Display for VolumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for VolumeId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transportation_has_no_index() {
        assert_eq!(EffectId::TRANSPORTATION.index(), None);
        assert_eq!(EffectId(3).index(), Some(3));
        assert_eq!(EffectId::TRANSPORTATION.to_string(), "transportation");
    }

    #[test]
    fn track_id_none() {
        assert!(TrackId::NONE.is_none());
        assert!(!TrackId(1).is_none());
        assert_eq!(TrackId::from(7).to_string(), "7");
    }
}
