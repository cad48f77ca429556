//! Location collaborator.

use hawk_core::GeoPoint;

/// Device location as seen by the host application.
pub trait LocationSource: Send + Sync {
    /// Whether location services are enabled and authorized.
    fn is_enabled(&self) -> bool;

    /// The most recent fix, if any.
    fn current(&self) -> Option<GeoPoint>;
}

/// Location services disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

impl LocationSource for NoLocation {
    fn is_enabled(&self) -> bool {
        false
    }

    fn current(&self) -> Option<GeoPoint> {
        None
    }
}

/// Location services enabled, reporting a fixed position (or no fix yet).
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocation(pub Option<GeoPoint>);

impl FixedLocation {
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self(Some(GeoPoint {
            latitude,
            longitude,
        }))
    }
}

impl LocationSource for FixedLocation {
    fn is_enabled(&self) -> bool {
        true
    }

    fn current(&self) -> Option<GeoPoint> {
        self.0
    }
}
