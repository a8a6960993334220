use crate::marker::Marker;
use crate::models::{Location, MarkerId};

/// Glyph circle radius in screen pixels; also the hit-test radius.
pub const GLYPH_RADIUS: f64 = 10.0;

/// Screen step used to move a new marker off an occupied spot.
const SPAWN_NUDGE_PX: f64 = 1.0;
const MAX_SPAWN_STEPS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn distance(self, other: ScreenPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// What the map renderer offers the core: where the view is centered and
/// how to go between geographic and screen coordinates.
pub trait MapSurface {
    fn center(&self) -> Location;
    fn to_screen(&self, location: Location) -> ScreenPoint;
    fn to_location(&self, point: ScreenPoint) -> Location;
}

/// The marker whose glyph is nearest to `point`, if any is within the glyph radius.
pub fn glyph_at(surface: &dyn MapSurface, markers: &[Marker], point: ScreenPoint) -> Option<MarkerId> {
    let mut best = None;
    let mut best_dist = GLYPH_RADIUS;
    for m in markers {
        let dist = surface.to_screen(m.location()).distance(point);
        if dist <= best_dist {
            best_dist = dist;
            best = Some(m.id());
        }
    }
    best
}

/// Where a new marker goes: the view center, nudged right and up one pixel
/// at a time until no existing glyph sits there.
pub fn spawn_location(surface: &dyn MapSurface, markers: &[Marker]) -> Location {
    let mut point = surface.to_screen(surface.center());
    for _ in 0..MAX_SPAWN_STEPS {
        if glyph_at(surface, markers, point).is_none() {
            break;
        }
        point.x += SPAWN_NUDGE_PX;
        point.y -= SPAWN_NUDGE_PX;
    }
    surface.to_location(point)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// One degree per pixel, north up, centered at the origin of a 200x200 view.
    pub struct FlatSurface {
        pub center: Location,
    }

    impl FlatSurface {
        pub fn at(lon: f64, lat: f64) -> Self {
            FlatSurface {
                center: Location::new(lon, lat).unwrap(),
            }
        }
    }

    impl MapSurface for FlatSurface {
        fn center(&self) -> Location {
            self.center
        }

        fn to_screen(&self, l: Location) -> ScreenPoint {
            ScreenPoint {
                x: 100.0 + (l.lon() - self.center.lon()),
                y: 100.0 - (l.lat() - self.center.lat()),
            }
        }

        fn to_location(&self, p: ScreenPoint) -> Location {
            Location::new(
                self.center.lon() + (p.x - 100.0),
                self.center.lat() - (p.y - 100.0),
            )
            .unwrap()
        }
    }
}
