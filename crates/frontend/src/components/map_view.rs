use dioxus::html::geometry::WheelDelta;
use dioxus::html::input_data::MouseButton;
use dioxus::prelude::*;
use markmap_shared::controller::{Controller, GlyphState};
use markmap_shared::link::Mode;
use markmap_shared::models::{Location, MarkerId};
use markmap_shared::surface::{self, MapSurface, ScreenPoint, GLYPH_RADIUS};

use crate::browser;
use crate::coords::{self, Viewport, ZOOM_STEP};

const MAP_CONTAINER_ID: &str = "marker-map-container";

/// Pointer travel in pixels below which a press counts as a click.
const DRAG_THRESHOLD: f64 = 3.0;

/// Same for touch, where fingers wobble more.
const TOUCH_DRAG_THRESHOLD: f64 = 8.0;

/// Name label sits this far below the glyph center.
const LABEL_OFFSET_Y: f64 = 25.0;
const LABEL_PADDING: f64 = 4.0;
const LABEL_FONT_SIZE: f64 = 12.0;
/// Rough glyph advance used to size the label background.
const LABEL_CHAR_WIDTH: f64 = 7.0;

/// Popups open to the right of their marker.
const POPUP_OFFSET_X: f64 = 20.0;

const SELECTED_STROKE_WIDTH: f64 = 3.0;

/// Upper bound on graticule lines per axis.
const MAX_GRID_LINES: usize = 200;

/// One marker as the SVG layer draws it.
#[derive(Debug, Clone, PartialEq)]
struct GlyphView {
    x: f64,
    y: f64,
    name: String,
    primary: String,
    secondary: String,
    selected: bool,
}

// ---------------------------------------------------------------------------
// DOM helpers
// ---------------------------------------------------------------------------

/// Container-relative point for a client coordinate.
fn container_point(client_x: f64, client_y: f64) -> Option<ScreenPoint> {
    let rect = browser::element_rect(MAP_CONTAINER_ID)?;
    Some(coords::client_to_container(client_x, client_y, rect.left(), rect.top()))
}

/// Keep the viewport's size in step with the rendered container.
fn sync_size(viewport: &mut Signal<Viewport>) {
    let Some(rect) = browser::element_rect(MAP_CONTAINER_ID) else {
        return;
    };
    let current = *viewport.peek();
    if (current.width - rect.width()).abs() > 0.5 || (current.height - rect.height()).abs() > 0.5 {
        viewport.write().resize(rect.width(), rect.height());
    }
}

/// Convert a wheel delta (pixels / lines / pages) to a uniform pixel-like value.
fn wheel_delta_y(delta: WheelDelta) -> f64 {
    match delta {
        WheelDelta::Pixels(d) => d.y,
        WheelDelta::Lines(d) => d.y * 40.0,
        WheelDelta::Pages(d) => d.y * 400.0,
    }
}

/// Distance between two client-coordinate points (for threshold checks).
fn point_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt()
}

fn css_size(width: &str, height: &str) -> String {
    let mut style = String::new();
    if !width.is_empty() {
        style.push_str(&format!("width: {width};"));
    }
    if !height.is_empty() {
        style.push_str(&format!("height: {height};"));
    }
    style
}

fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// SVG builder
// ---------------------------------------------------------------------------

fn build_svg_content(glyphs: &[GlyphView], viewport: &Viewport) -> String {
    let mut svg = String::with_capacity(8192);
    build_graticule(&mut svg, viewport);
    for glyph in glyphs {
        build_glyph(&mut svg, glyph);
    }
    svg
}

/// Spacing in degrees between graticule lines at a zoom level.
fn graticule_step(zoom: f64) -> f64 {
    if zoom < 3.0 {
        30.0
    } else if zoom < 5.0 {
        10.0
    } else if zoom < 7.0 {
        5.0
    } else if zoom < 9.0 {
        1.0
    } else if zoom < 12.0 {
        0.1
    } else if zoom < 15.0 {
        0.01
    } else {
        0.001
    }
}

fn format_degrees(value: f64, step: f64) -> String {
    let decimals = (-step.log10()).ceil().max(0.0) as usize;
    format!("{:.*}°", decimals, value)
}

/// Line positions from `start` to `end` on multiples of `step`.
fn grid_positions(start: f64, end: f64, step: f64) -> Vec<f64> {
    if start >= end {
        return Vec::new();
    }
    let first = (start / step).ceil() as i64;
    let last = (end / step).floor() as i64;
    (first..=last)
        .take(MAX_GRID_LINES)
        .map(|i| i as f64 * step)
        .collect()
}

fn build_graticule(svg: &mut String, viewport: &Viewport) {
    let step = graticule_step(viewport.zoom);
    let (west, south, east, north) = viewport.bounds();
    let (w, h) = (viewport.width, viewport.height);

    for lon in grid_positions(west, east, step) {
        let Ok(at) = Location::new(lon, viewport.center.lat()) else {
            continue;
        };
        let x = viewport.to_screen(at).x;
        let label = format_degrees(lon, step);
        svg.push_str(&format!(
            r#"<line x1="{x}" y1="0" x2="{x}" y2="{h}" stroke="rgba(0,0,0,0.12)" stroke-width="1"/>"#
        ));
        svg.push_str(&format!(
            r#"<text x="{}" y="14" fill="rgba(0,0,0,0.45)" font-size="11" font-family="monospace">{label}</text>"#,
            x + 3.0
        ));
    }
    for lat in grid_positions(south, north, step) {
        let Ok(at) = Location::new(viewport.center.lon(), lat) else {
            continue;
        };
        let y = viewport.to_screen(at).y;
        let label = format_degrees(lat, step);
        svg.push_str(&format!(
            r#"<line x1="0" y1="{y}" x2="{w}" y2="{y}" stroke="rgba(0,0,0,0.12)" stroke-width="1"/>"#
        ));
        svg.push_str(&format!(
            r#"<text x="4" y="{}" fill="rgba(0,0,0,0.45)" font-size="11" font-family="monospace">{label}</text>"#,
            y - 3.0
        ));
    }
}

fn build_glyph(svg: &mut String, glyph: &GlyphView) {
    let GlyphView { x, y, .. } = *glyph;
    let name = escape_xml(&glyph.name);
    let primary = escape_xml(&glyph.primary);
    let secondary = escape_xml(&glyph.secondary);
    let r = GLYPH_RADIUS;

    svg.push_str(&format!(r##"<g role="img"><title>{name}</title>"##));
    if glyph.selected {
        svg.push_str(&format!(
            r##"<circle cx="{x}" cy="{y}" r="{r}" fill="{secondary}" stroke="{primary}" stroke-width="{SELECTED_STROKE_WIDTH}"/>"##
        ));
    } else {
        svg.push_str(&format!(
            r##"<circle cx="{x}" cy="{y}" r="{r}" fill="{primary}"/>"##
        ));
    }
    if !glyph.name.is_empty() {
        let ty = y + LABEL_OFFSET_Y;
        let text_w = glyph.name.chars().count() as f64 * LABEL_CHAR_WIDTH;
        let box_w = text_w + 2.0 * LABEL_PADDING;
        let box_h = LABEL_FONT_SIZE + 2.0 * LABEL_PADDING;
        let bx = x - box_w / 2.0;
        let by = ty - box_h / 2.0;
        svg.push_str(&format!(
            r##"<rect x="{bx}" y="{by}" width="{box_w}" height="{box_h}" fill="white"/>"##
        ));
        svg.push_str(&format!(
            r##"<text x="{x}" y="{ty}" fill="#333" font-size="{LABEL_FONT_SIZE}" font-family="sans-serif" text-anchor="middle" dominant-baseline="central">{name}</text>"##
        ));
    }
    svg.push_str("</g>");
}

// ---------------------------------------------------------------------------
// Shared click logic (used by both mouse and touch handlers)
// ---------------------------------------------------------------------------

/// Select whatever glyph is under `point`, or clear the selection on empty map.
fn handle_map_click(point: ScreenPoint, controller: &mut Signal<Controller>, viewport: &mut Signal<Viewport>) {
    let vp = *viewport.peek();
    let hit = surface::glyph_at(&vp, controller.peek().markers(), point);
    let recenter = controller.write().select(hit);
    if let Some(location) = recenter {
        viewport.write().center = location;
    }
}

/// The marker a press at `point` picks up for dragging: only the selected
/// one, and only while editing.
fn draggable_at(controller: &Controller, viewport: &Viewport, point: ScreenPoint) -> Option<MarkerId> {
    if controller.mode() != Mode::Editable {
        return None;
    }
    let active = controller.active_id()?;
    (surface::glyph_at(viewport, controller.markers(), point) == Some(active)).then_some(active)
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

#[component]
pub fn MapView(
    controller: Signal<Controller>,
    viewport: Signal<Viewport>,
    width: String,
    height: String,
) -> Element {
    let mut controller = controller;
    let mut viewport = viewport;

    // Mouse state: a press either pans the map or drags the selected marker
    let mut pointer_down = use_signal(|| false);
    let mut did_drag = use_signal(|| false);
    let mut drag_start = use_signal(|| (0.0_f64, 0.0_f64));
    let mut last_pointer = use_signal(|| (0.0_f64, 0.0_f64));
    let mut dragged_marker = use_signal(|| None::<MarkerId>);
    let mut drag_preview = use_signal(|| None::<ScreenPoint>);

    // Touch state
    let mut touch_start_pos = use_signal(|| None::<(f64, f64)>);
    let mut touch_last_pos = use_signal(|| (0.0_f64, 0.0_f64));
    let mut touch_did_pan = use_signal(|| false);

    use_effect(move || sync_size(&mut viewport));

    let svg_html = use_memo(move || {
        let ctl = controller.read();
        let vp = *viewport.read();
        let dragged = *dragged_marker.read();
        let preview = *drag_preview.read();

        let glyphs: Vec<GlyphView> = ctl
            .markers()
            .iter()
            .map(|m| {
                let p = match (dragged, preview) {
                    (Some(id), Some(p)) if id == m.id() => p,
                    _ => vp.to_screen(m.location()),
                };
                GlyphView {
                    x: p.x,
                    y: p.y,
                    name: m.name().to_string(),
                    primary: m.color().primary.clone(),
                    secondary: m.color().secondary.clone(),
                    selected: ctl.glyph_state(m.id()) == GlyphState::Selected,
                }
            })
            .collect();

        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="100%" height="100%" style="position:absolute;top:0;left:0;pointer-events:none;z-index:5;">{}</svg>"#,
            build_svg_content(&glyphs, &vp)
        )
    });

    let vp = *viewport.read();
    let popups: Vec<(f64, f64, String)> = controller
        .read()
        .markers()
        .iter()
        .filter(|m| m.popup_visible())
        .map(|m| {
            let p = match (*dragged_marker.read(), *drag_preview.read()) {
                (Some(id), Some(p)) if id == m.id() => p,
                _ => vp.to_screen(m.popup().anchor()),
            };
            (p.x + POPUP_OFFSET_X, p.y, m.popup().content().to_string())
        })
        .collect();

    let container_class = if dragged_marker.read().is_some() || *did_drag.read() {
        "map-container dragging"
    } else {
        "map-container"
    };
    let size_style = css_size(&width, &height);

    rsx! {
        div {
            id: MAP_CONTAINER_ID,
            class: "{container_class}",
            style: "{size_style}",

            onwheel: move |evt: Event<WheelData>| {
                evt.prevent_default();
                sync_size(&mut viewport);
                let delta_y = wheel_delta_y(evt.data().delta());
                let step = if delta_y < 0.0 { ZOOM_STEP } else { -ZOOM_STEP };
                let client = evt.data().client_coordinates();
                let Some(cursor) = container_point(client.x, client.y) else { return };
                let new_zoom = viewport.peek().zoom + step;
                viewport.write().zoom_at(cursor, new_zoom);
            },

            onmousedown: move |evt: Event<MouseData>| {
                if evt.trigger_button() != Some(MouseButton::Primary) {
                    return;
                }
                sync_size(&mut viewport);
                let client = evt.client_coordinates();
                pointer_down.set(true);
                did_drag.set(false);
                drag_start.set((client.x, client.y));
                last_pointer.set((client.x, client.y));

                let Some(point) = container_point(client.x, client.y) else { return };
                let grabbed = draggable_at(&controller.peek(), &viewport.peek(), point);
                dragged_marker.set(grabbed);
            },

            onmousemove: move |evt: Event<MouseData>| {
                if !*pointer_down.read() {
                    return;
                }
                let client = evt.client_coordinates();
                let cur = (client.x, client.y);

                if !*did_drag.read() && point_distance(*drag_start.read(), cur) > DRAG_THRESHOLD {
                    did_drag.set(true);
                }
                if !*did_drag.read() {
                    return;
                }

                if dragged_marker.read().is_some() {
                    drag_preview.set(container_point(client.x, client.y));
                } else {
                    let last = *last_pointer.read();
                    viewport.write().pan_by(cur.0 - last.0, cur.1 - last.1);
                }
                last_pointer.set(cur);
            },

            onmouseup: move |evt: Event<MouseData>| {
                let was_down = *pointer_down.read();
                let was_drag = *did_drag.read();
                pointer_down.set(false);
                did_drag.set(false);

                let client = evt.client_coordinates();
                let Some(point) = container_point(client.x, client.y) else { return };

                let dragged = *dragged_marker.read();
                if let Some(id) = dragged {
                    dragged_marker.set(None);
                    drag_preview.set(None);
                    if was_drag {
                        let location = viewport.peek().to_location(point);
                        controller.write().drag_end(id, location);
                        return;
                    }
                }

                // A mouseup without drag movement = a click
                if was_down && !was_drag {
                    handle_map_click(point, &mut controller, &mut viewport);
                }
            },

            onmouseleave: move |_| {
                pointer_down.set(false);
                did_drag.set(false);
                dragged_marker.set(None);
                drag_preview.set(None);
            },

            // --- Touch event handlers ---

            ontouchstart: move |evt: Event<TouchData>| {
                evt.prevent_default();
                sync_size(&mut viewport);
                let touches = evt.data().touches();
                if touches.len() == 1 {
                    let t = &touches[0];
                    let pos = (t.client_coordinates().x, t.client_coordinates().y);
                    touch_start_pos.set(Some(pos));
                    touch_last_pos.set(pos);
                    touch_did_pan.set(false);
                    let grabbed = container_point(pos.0, pos.1)
                        .and_then(|point| draggable_at(&controller.peek(), &viewport.peek(), point));
                    dragged_marker.set(grabbed);
                } else {
                    // Multi-touch is not a tap, and drops a marker drag
                    touch_start_pos.set(None);
                    touch_did_pan.set(true);
                    dragged_marker.set(None);
                    drag_preview.set(None);
                }
            },

            ontouchmove: move |evt: Event<TouchData>| {
                evt.prevent_default();
                let touches = evt.data().touches();
                if touches.len() != 1 {
                    return;
                }
                let t = &touches[0];
                let cur = (t.client_coordinates().x, t.client_coordinates().y);
                let Some(start) = *touch_start_pos.read() else { return };
                if !*touch_did_pan.read() && point_distance(start, cur) > TOUCH_DRAG_THRESHOLD {
                    touch_did_pan.set(true);
                }
                if !*touch_did_pan.read() {
                    return;
                }
                if dragged_marker.read().is_some() {
                    drag_preview.set(container_point(cur.0, cur.1));
                } else {
                    let last = *touch_last_pos.read();
                    viewport.write().pan_by(cur.0 - last.0, cur.1 - last.1);
                }
                touch_last_pos.set(cur);
            },

            ontouchend: move |evt: Event<TouchData>| {
                evt.prevent_default();
                let remaining = evt.data().touches().len();

                // The lifted finger is no longer listed; its last move is the drop point
                let dragged = *dragged_marker.read();
                if let Some(id) = dragged {
                    dragged_marker.set(None);
                    drag_preview.set(None);
                    if *touch_did_pan.read() {
                        let last = *touch_last_pos.read();
                        if let Some(point) = container_point(last.0, last.1) {
                            let location = viewport.peek().to_location(point);
                            controller.write().drag_end(id, location);
                        }
                        touch_start_pos.set(None);
                        return;
                    }
                }

                // Single-finger tap: no pan and all fingers up
                if remaining == 0 && !*touch_did_pan.read() {
                    if let Some(start) = *touch_start_pos.read() {
                        if let Some(point) = container_point(start.0, start.1) {
                            handle_map_click(point, &mut controller, &mut viewport);
                        }
                    }
                }
                if remaining == 0 {
                    touch_start_pos.set(None);
                }
            },

            ontouchcancel: move |_evt: Event<TouchData>| {
                touch_start_pos.set(None);
                touch_did_pan.set(false);
                dragged_marker.set(None);
                drag_preview.set(None);
            },

            div {
                dangerous_inner_html: "{svg_html}",
                style: "position:absolute;top:0;left:0;width:100%;height:100%;pointer-events:none;",
            }

            for (i, (x, y, html)) in popups.into_iter().enumerate() {
                div {
                    key: "{i}",
                    class: "info",
                    style: "left:{x}px;top:{y}px;",
                    dangerous_inner_html: "{html}",
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markmap_shared::link::ViewFlags;
    use markmap_shared::models::{MarkerRecord, PartialColor};

    fn glyph(name: &str, selected: bool) -> GlyphView {
        GlyphView {
            x: 100.0,
            y: 200.0,
            name: name.to_string(),
            primary: "#ff1493".to_string(),
            secondary: "#ffff00".to_string(),
            selected,
        }
    }

    #[test]
    fn test_unselected_glyph_fills_primary() {
        let mut svg = String::new();
        build_glyph(&mut svg, &glyph("Cafe", false));
        assert!(svg.contains(r##"fill="#ff1493""##));
        assert!(!svg.contains("stroke=\"#ff1493\""));
        assert!(svg.contains(r#"cx="100""#));
        assert!(svg.contains(r#"cy="200""#));
    }

    #[test]
    fn test_selected_glyph_fills_secondary_with_primary_stroke() {
        let mut svg = String::new();
        build_glyph(&mut svg, &glyph("Cafe", true));
        assert!(svg.contains(r##"fill="#ffff00" stroke="#ff1493" stroke-width="3""##));
    }

    #[test]
    fn test_glyph_label_below_marker() {
        let mut svg = String::new();
        build_glyph(&mut svg, &glyph("Cafe", false));
        assert!(svg.contains(r#"y="225""#));
        assert!(svg.contains(">Cafe</text>"));
    }

    #[test]
    fn test_glyph_without_name_has_no_label() {
        let mut svg = String::new();
        build_glyph(&mut svg, &glyph("", false));
        assert!(!svg.contains("<text"));
        assert!(!svg.contains("<rect"));
    }

    #[test]
    fn test_glyph_name_is_escaped() {
        let mut svg = String::new();
        build_glyph(&mut svg, &glyph("<b>&", false));
        assert!(svg.contains("&lt;b&gt;&amp;"));
        assert!(!svg.contains("<b>"));
    }

    #[test]
    fn test_grid_positions_on_step_multiples() {
        let lines = grid_positions(-25.0, 25.0, 10.0);
        assert_eq!(lines, vec![-20.0, -10.0, 0.0, 10.0, 20.0]);
        assert!(grid_positions(5.0, 5.0, 1.0).is_empty());
        assert!(grid_positions(10.0, -10.0, 1.0).is_empty());
    }

    #[test]
    fn test_grid_positions_capped() {
        assert_eq!(grid_positions(0.0, 1e6, 1.0).len(), MAX_GRID_LINES);
    }

    #[test]
    fn test_graticule_step_gets_finer_with_zoom() {
        assert!(graticule_step(2.0) > graticule_step(6.0));
        assert!(graticule_step(6.0) > graticule_step(16.0));
    }

    #[test]
    fn test_format_degrees() {
        assert_eq!(format_degrees(30.0, 30.0), "30°");
        assert_eq!(format_degrees(12.3, 0.1), "12.3°");
        assert_eq!(format_degrees(-0.25, 0.01), "-0.25°");
    }

    #[test]
    fn test_css_size_skips_empty() {
        assert_eq!(css_size("", ""), "");
        assert_eq!(css_size("100vw", ""), "width: 100vw;");
        assert_eq!(css_size("600px", "50vh"), "width: 600px;height: 50vh;");
    }

    fn editing_controller() -> (Controller, Viewport) {
        let records = vec![
            MarkerRecord {
                name: "a".to_string(),
                location: Location::new(2.0, 48.0).unwrap(),
                info_html: String::new(),
                color: PartialColor::default(),
            },
            MarkerRecord {
                name: "b".to_string(),
                location: Location::new(2.1, 48.0).unwrap(),
                info_html: String::new(),
                color: PartialColor::default(),
            },
        ];
        let controller = Controller::new(records, Mode::Editable, ViewFlags::default(), "");
        let viewport = Viewport {
            center: Location::new(2.0, 48.0).unwrap(),
            zoom: 12.0,
            width: 800.0,
            height: 600.0,
        };
        (controller, viewport)
    }

    #[test]
    fn test_only_selected_marker_is_draggable() {
        let (mut controller, viewport) = editing_controller();
        let a = controller.markers()[0].id();
        let b_point = viewport.to_screen(controller.markers()[1].location());
        let a_point = viewport.to_screen(controller.markers()[0].location());

        assert_eq!(draggable_at(&controller, &viewport, a_point), None);
        controller.select(Some(a));
        assert_eq!(draggable_at(&controller, &viewport, a_point), Some(a));
        assert_eq!(draggable_at(&controller, &viewport, b_point), None);
    }

    #[test]
    fn test_nothing_is_draggable_in_view_only_mode() {
        let (controller, viewport) = editing_controller();
        let records: Vec<_> = controller.markers().iter().map(|m| m.serialize()).collect();
        let mut view = Controller::new(records, Mode::ViewOnly, ViewFlags::default(), "");
        let a = view.markers()[0].id();
        view.select(Some(a));
        let a_point = viewport.to_screen(view.markers()[0].location());
        assert_eq!(draggable_at(&view, &viewport, a_point), None);
    }

    #[test]
    fn test_drop_point_moves_dragged_marker() {
        let (mut controller, viewport) = editing_controller();
        let a = controller.markers()[0].id();
        controller.select(Some(a));
        let drop = ScreenPoint { x: 300.0, y: 250.0 };
        controller.drag_end(a, viewport.to_location(drop));
        let moved = viewport.to_screen(controller.markers()[0].location());
        assert!((moved.x - drop.x).abs() < 1e-6);
        assert!((moved.y - drop.y).abs() < 1e-6);
    }

    #[test]
    fn test_point_distance() {
        assert!((point_distance((0.0, 0.0), (3.0, 4.0)) - 5.0).abs() < 1e-9);
    }
}
