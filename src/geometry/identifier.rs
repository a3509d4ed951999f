use std::fmt;

use serde::{Deserialize, Serialize};

const VOLUME_MASK: u64 = 0xff00_0000_0000_0000;
const BOUNDARY_MASK: u64 = 0x00ff_0000_0000_0000;
const LAYER_MASK: u64 = 0x0000_fff0_0000_0000;
const APPROACH_MASK: u64 = 0x0000_000f_f000_0000;
const SENSITIVE_MASK: u64 = 0x0000_0000_0fff_ff00;
const EXTRA_MASK: u64 = 0x0000_0000_0000_00ff;

/// Hierarchical identity of a geometry element packed into 64 bits.
///
/// From the most significant bits down: volume (8), boundary (8),
/// layer (12), approach (8), sensitive (20), extra (8). A field value of
/// zero means "not set", so a volume has only its volume field set and a
/// sensitive surface carries volume, layer and sensitive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeometryIdentifier(u64);

impl GeometryIdentifier {
    /// Wraps an encoded identifier value.
    #[must_use]
    pub const fn from_value(value: u64) -> Self {
        Self(value)
    }

    /// Returns the encoded value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn volume(self) -> u64 {
        extract(self.0, VOLUME_MASK)
    }

    #[must_use]
    pub const fn boundary(self) -> u64 {
        extract(self.0, BOUNDARY_MASK)
    }

    #[must_use]
    pub const fn layer(self) -> u64 {
        extract(self.0, LAYER_MASK)
    }

    #[must_use]
    pub const fn approach(self) -> u64 {
        extract(self.0, APPROACH_MASK)
    }

    #[must_use]
    pub const fn sensitive(self) -> u64 {
        extract(self.0, SENSITIVE_MASK)
    }

    #[must_use]
    pub const fn extra(self) -> u64 {
        extract(self.0, EXTRA_MASK)
    }

    /// Returns a copy with the volume field replaced. Excess bits are dropped.
    #[must_use]
    pub const fn with_volume(self, volume: u64) -> Self {
        Self(insert(self.0, VOLUME_MASK, volume))
    }

    #[must_use]
    pub const fn with_boundary(self, boundary: u64) -> Self {
        Self(insert(self.0, BOUNDARY_MASK, boundary))
    }

    #[must_use]
    pub const fn with_layer(self, layer: u64) -> Self {
        Self(insert(self.0, LAYER_MASK, layer))
    }

    #[must_use]
    pub const fn with_approach(self, approach: u64) -> Self {
        Self(insert(self.0, APPROACH_MASK, approach))
    }

    #[must_use]
    pub const fn with_sensitive(self, sensitive: u64) -> Self {
        Self(insert(self.0, SENSITIVE_MASK, sensitive))
    }

    #[must_use]
    pub const fn with_extra(self, extra: u64) -> Self {
        Self(insert(self.0, EXTRA_MASK, extra))
    }
}

const fn extract(value: u64, mask: u64) -> u64 {
    (value & mask) >> mask.trailing_zeros()
}

const fn insert(value: u64, mask: u64, field: u64) -> u64 {
    let shifted = (field << mask.trailing_zeros()) & mask;
    (value & !mask) | shifted
}

impl fmt::Display for GeometryIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vol={}", self.volume())?;
        let fields = [
            ("bnd", self.boundary()),
            ("lay", self.layer()),
            ("apr", self.approach()),
            ("sen", self.sensitive()),
            ("ext", self.extra()),
        ];
        for (name, value) in fields {
            if value != 0 {
                write!(f, "|{name}={value}")?;
            }
        }
        Ok(())
    }
}

impl From<GeometryIdentifier> for u64 {
    fn from(id: GeometryIdentifier) -> Self {
        id.value()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn fields_are_independent() {
        let id = GeometryIdentifier::default()
            .with_volume(7)
            .with_layer(4)
            .with_sensitive(1234)
            .with_extra(3);
        assert_eq!(id.volume(), 7);
        assert_eq!(id.boundary(), 0);
        assert_eq!(id.layer(), 4);
        assert_eq!(id.approach(), 0);
        assert_eq!(id.sensitive(), 1234);
        assert_eq!(id.extra(), 3);
    }

    #[test]
    fn overflowing_field_is_truncated() {
        let id = GeometryIdentifier::default().with_approach(0x1ff);
        assert_eq!(id.approach(), 0xff);
        assert_eq!(id.sensitive(), 0);
        assert_eq!(id.layer(), 0);
    }

    #[test]
    fn volume_is_most_significant() {
        let a = GeometryIdentifier::default().with_volume(1).with_sensitive(99);
        let b = GeometryIdentifier::default().with_volume(2);
        assert!(a < b);
        assert_eq!(b.value(), 0x0200_0000_0000_0000);
    }

    #[test]
    fn display_skips_unset_fields() {
        let id = GeometryIdentifier::default().with_volume(2).with_layer(6);
        assert_eq!(id.to_string(), "vol=2|lay=6");
    }

    #[test]
    fn serializes_as_raw_value() {
        let id = GeometryIdentifier::from_value(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
    }
}
