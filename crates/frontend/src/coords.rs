use markmap_shared::models::Location;
use markmap_shared::surface::{MapSurface, ScreenPoint};

/// Web Mercator world size at zoom 0, in pixels.
const TILE_SIZE: f64 = 256.0;
const MAX_LAT: f64 = 85.051_128_78;

pub const ZOOM_MIN: f64 = 1.0;
pub const ZOOM_MAX: f64 = 19.0;
pub const ZOOM_STEP: f64 = 0.25;

pub const MARKER_ZOOM: f64 = 15.0;
pub const EMPTY_ZOOM: f64 = 5.0;

/// Fallback container size until the map element has been measured.
const DEFAULT_WIDTH: f64 = 960.0;
const DEFAULT_HEIGHT: f64 = 640.0;

/// What part of the world the map shows, and how big the map element is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: Location,
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    /// Centered on the first marker, or on `random` (lon, lat in [0, 1)) when there is none.
    pub fn initial(first: Option<Location>, random: (f64, f64)) -> Self {
        let (center, zoom) = match first {
            Some(location) => (location, MARKER_ZOOM),
            None => (
                Location::new(random.0 * 180.0, random.1 * 90.0).unwrap_or(Location::ORIGIN),
                EMPTY_ZOOM,
            ),
        };
        Viewport {
            center,
            zoom,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }

    fn world_size(&self) -> f64 {
        TILE_SIZE * self.zoom.exp2()
    }

    fn project(&self, location: Location) -> (f64, f64) {
        let size = self.world_size();
        let lat = location.lat().clamp(-MAX_LAT, MAX_LAT).to_radians();
        let x = (location.lon() + 180.0) / 360.0 * size;
        let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / std::f64::consts::PI) / 2.0 * size;
        (x, y)
    }

    /// Screen math on a degenerate viewport can go non-finite; the center stands in then.
    fn unproject(&self, x: f64, y: f64) -> Location {
        let size = self.world_size();
        let lon = x / size * 360.0 - 180.0;
        let n = std::f64::consts::PI * (1.0 - 2.0 * y / size);
        let lat = n.sinh().atan().to_degrees();
        Location::new(wrap_lon(lon), lat).unwrap_or(self.center)
    }

    /// Move the map by a screen delta (drag to the right shows what is to the west).
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let (cx, cy) = self.project(self.center);
        self.center = self.unproject(cx - dx, cy - dy);
    }

    /// Change zoom keeping the point under `cursor` fixed.
    pub fn zoom_at(&mut self, cursor: ScreenPoint, new_zoom: f64) {
        let new_zoom = new_zoom.clamp(ZOOM_MIN, ZOOM_MAX);
        let anchor = self.to_location(cursor);
        self.zoom = new_zoom;
        let (ax, ay) = self.project(anchor);
        let cx = ax - (cursor.x - self.width / 2.0);
        let cy = ay - (cursor.y - self.height / 2.0);
        self.center = self.unproject(cx, cy);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        if width > 0.0 && height > 0.0 {
            self.width = width;
            self.height = height;
        }
    }

    /// Visible (west, south, east, north) bounds.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let nw = self.to_location(ScreenPoint { x: 0.0, y: 0.0 });
        let se = self.to_location(ScreenPoint {
            x: self.width,
            y: self.height,
        });
        (nw.lon(), se.lat(), se.lon(), nw.lat())
    }
}

impl MapSurface for Viewport {
    fn center(&self) -> Location {
        self.center
    }

    fn to_screen(&self, location: Location) -> ScreenPoint {
        let (cx, cy) = self.project(self.center);
        let (x, y) = self.project(location);
        ScreenPoint {
            x: x - cx + self.width / 2.0,
            y: y - cy + self.height / 2.0,
        }
    }

    fn to_location(&self, point: ScreenPoint) -> Location {
        let (cx, cy) = self.project(self.center);
        self.unproject(
            cx + point.x - self.width / 2.0,
            cy + point.y - self.height / 2.0,
        )
    }
}

fn wrap_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Convert client (viewport) coordinates to container-relative pixel coordinates.
pub fn client_to_container(client_x: f64, client_y: f64, rect_left: f64, rect_top: f64) -> ScreenPoint {
    ScreenPoint {
        x: client_x - rect_left,
        y: client_y - rect_top,
    }
}
