//! Share-link encoding.
//!
//! A link is a query string: `noedit=1&markers=<json>[&width=..][&height=..]`.
//! `width`/`height` are CSS lengths; bare numbers are taken as pixels.
//! Anything else in them is ignored when sizing the map.

use crate::models::MarkerRecord;

pub const MARKERS_PARAM: &str = "markers";
pub const NOEDIT_PARAM: &str = "noedit";
pub const WIDTH_PARAM: &str = "width";
pub const HEIGHT_PARAM: &str = "height";

const VIEW_ONLY_WIDTH: &str = "100vw";
const VIEW_ONLY_HEIGHT: &str = "100vh";

const CSS_UNITS: [&str; 15] = [
    "px", "%", "vw", "vh", "vmin", "vmax", "em", "rem", "ch", "ex", "pt", "pc", "cm", "mm", "in",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Editable,
    ViewOnly,
}

/// Forced map size carried through the link untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewFlags {
    pub width: Option<String>,
    pub height: Option<String>,
}

/// CSS size for the map element. Empty means "leave it to the layout".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSize {
    pub width: String,
    pub height: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedLink {
    /// `None` when the link carries no usable `markers` parameter.
    pub markers: Option<Vec<MarkerRecord>>,
    pub mode: Mode,
    pub flags: ViewFlags,
}

impl DecodedLink {
    /// Markers from the link, or from `fallback` when the link has none.
    pub fn markers_or_else(&self, fallback: impl FnOnce() -> Vec<MarkerRecord>) -> Vec<MarkerRecord> {
        match &self.markers {
            Some(markers) => markers.clone(),
            None => fallback(),
        }
    }
}

/// Build the query string for `records`. Equal input gives equal output.
pub fn encode(records: &[MarkerRecord], flags: &ViewFlags) -> String {
    // Vec<MarkerRecord> only holds strings and finite numbers
    let json = serde_json::to_string(records).unwrap_or_else(|_| "[]".to_string());
    let mut params = form_urlencoded::Serializer::new(String::new());
    params.append_pair(NOEDIT_PARAM, "1");
    params.append_pair(MARKERS_PARAM, &json);
    if let Some(width) = &flags.width {
        params.append_pair(WIDTH_PARAM, width);
    }
    if let Some(height) = &flags.height {
        params.append_pair(HEIGHT_PARAM, height);
    }
    params.finish()
}

pub fn share_url(base: &str, query: &str) -> String {
    format!("{}?{}", base, query)
}

/// Read a query string (with or without the leading `?`).
///
/// `embedded` is true when the page runs inside another page's frame.
pub fn decode(query: &str, embedded: bool) -> DecodedLink {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut markers_param = None;
    let mut noedit = false;
    let mut flags = ViewFlags::default();

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            MARKERS_PARAM if markers_param.is_none() => markers_param = Some(value.into_owned()),
            NOEDIT_PARAM => noedit = true,
            WIDTH_PARAM if flags.width.is_none() && !value.is_empty() => {
                flags.width = Some(value.into_owned())
            }
            HEIGHT_PARAM if flags.height.is_none() && !value.is_empty() => {
                flags.height = Some(value.into_owned())
            }
            _ => {}
        }
    }

    let markers = markers_param.and_then(|raw| match serde_json::from_str::<Vec<MarkerRecord>>(&raw) {
        Ok(records) => Some(records),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed markers parameter");
            None
        }
    });

    let mode = if noedit || embedded {
        Mode::ViewOnly
    } else {
        Mode::Editable
    };

    DecodedLink { markers, mode, flags }
}

/// Same query with the `noedit` flag dropped, for switching a view-only page to editing.
pub fn editable_query(query: &str) -> String {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut params = form_urlencoded::Serializer::new(String::new());
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if key != NOEDIT_PARAM {
            params.append_pair(&key, &value);
        }
    }
    params.finish()
}

pub fn resolve_view_size(flags: &ViewFlags, mode: Mode) -> ViewSize {
    let pick = |explicit: &Option<String>, view_default: &str| {
        let length = explicit.as_deref().and_then(|raw| {
            let length = css_length(raw);
            if length.is_none() {
                tracing::warn!(value = raw, "Ignoring invalid view size");
            }
            length
        });
        match length {
            Some(v) => v,
            None if mode == Mode::ViewOnly => view_default.to_string(),
            None => String::new(),
        }
    };
    ViewSize {
        width: pick(&flags.width, VIEW_ONLY_WIDTH),
        height: pick(&flags.height, VIEW_ONLY_HEIGHT),
    }
}

/// A number with an optional CSS unit; a bare number means pixels.
fn css_length(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+')))
        .unwrap_or(raw.len());
    let (number, unit) = raw.split_at(split);
    if !number.parse::<f64>().ok()?.is_finite() {
        return None;
    }
    let unit = unit.to_ascii_lowercase();
    if unit.is_empty() {
        Some(format!("{}px", number))
    } else if CSS_UNITS.contains(&unit.as_str()) {
        Some(format!("{}{}", number, unit))
    } else {
        None
    }
}
