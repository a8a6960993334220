//! Everything the client reads from or asks of the hosting page.

use markmap_shared::collection::ConfirmPrompt;
use markmap_shared::link::{self, DecodedLink, Mode, ViewFlags};
use markmap_shared::models::{Location, MarkerRecord, PartialColor};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

use dioxus::logger::tracing;

/// State the page starts from: what the link says, plus the fallback document.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSetup {
    pub records: Vec<MarkerRecord>,
    pub mode: Mode,
    pub flags: ViewFlags,
    pub base_url: String,
    pub query: String,
}

impl PageSetup {
    pub fn from_link(decoded: DecodedLink, document: impl FnOnce() -> Vec<MarkerRecord>, base_url: String, query: String) -> Self {
        let records = decoded.markers_or_else(document);
        PageSetup {
            records,
            mode: decoded.mode,
            flags: decoded.flags,
            base_url,
            query,
        }
    }
}

pub fn read_page() -> PageSetup {
    let location = web_sys::window().map(|w| w.location());
    let query = location
        .as_ref()
        .and_then(|l| l.search().ok())
        .unwrap_or_default();
    let base_url = location
        .as_ref()
        .and_then(|l| Some(format!("{}{}", l.origin().ok()?, l.pathname().ok()?)))
        .unwrap_or_default();

    let decoded = link::decode(&query, is_embedded());
    PageSetup::from_link(decoded, read_marker_templates, base_url, query)
}

/// True when the page is framed by another page.
pub fn is_embedded() -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    match window.parent() {
        Ok(Some(parent)) => !js_sys::Object::is(&parent, &window),
        _ => false,
    }
}

/// Read the pre-authored `<template class="marker">` elements of the page.
pub fn read_marker_templates() -> Vec<MarkerRecord> {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return Vec::new();
    };
    let Ok(nodes) = document.query_selector_all("template.marker") else {
        return Vec::new();
    };

    let mut records = Vec::new();
    for i in 0..nodes.length() {
        let Some(template) = nodes
            .item(i)
            .and_then(|n| n.dyn_into::<web_sys::HtmlTemplateElement>().ok())
        else {
            continue;
        };
        let data = template.dataset();
        let content = template.content();
        let name = content
            .query_selector(".name")
            .ok()
            .flatten()
            .and_then(|e| e.text_content());
        let info = content
            .query_selector(".info")
            .ok()
            .flatten()
            .map(|e| e.inner_html());

        match record_from_template(
            data.get("lon"),
            data.get("lat"),
            data.get("colorPrimary"),
            data.get("colorSecondary"),
            name,
            info,
        ) {
            Some(record) => records.push(record),
            None => tracing::warn!(index = i, "Skipping marker template without a valid location"),
        }
    }
    records
}

/// Build a record from the parts of a marker template. Absent colors keep their defaults.
pub fn record_from_template(
    lon: Option<String>,
    lat: Option<String>,
    color_primary: Option<String>,
    color_secondary: Option<String>,
    name: Option<String>,
    info: Option<String>,
) -> Option<MarkerRecord> {
    let location = Location::parse(lon.as_deref()?, lat.as_deref()?).ok()?;
    let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
    Some(MarkerRecord {
        name: name.map(|n| n.trim().to_string()).unwrap_or_default(),
        location,
        info_html: info.unwrap_or_default(),
        color: PartialColor {
            primary: non_empty(color_primary),
            secondary: non_empty(color_secondary),
        },
    })
}

/// `window.confirm` as the clear-all prompt.
pub struct BrowserConfirm;

impl ConfirmPrompt for BrowserConfirm {
    fn confirm(&self, message: &str) -> bool {
        web_sys::window()
            .and_then(|w| w.confirm_with_message(message).ok())
            .unwrap_or(false)
    }
}

/// Bounding rect of an element by id.
pub fn element_rect(id: &str) -> Option<web_sys::DomRect> {
    let document = web_sys::window()?.document()?;
    let element = document.get_element_by_id(id)?;
    Some(element.get_bounding_client_rect())
}

/// Focus a text input and select its whole value.
pub fn focus_and_select(id: &str) {
    let input = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(id))
        .and_then(|e| e.dyn_into::<web_sys::HtmlInputElement>().ok());
    if let Some(input) = input {
        let _ = input.focus();
        input.select();
    }
}

/// Reload the page with `query`.
pub fn navigate_to_query(query: &str) {
    if let Some(window) = web_sys::window() {
        if let Err(e) = window.location().set_search(&format!("?{}", query)) {
            tracing::warn!(error = ?e, "Could not switch to edit mode");
        }
    }
}

/// Call `action` whenever Ctrl+Enter is pressed anywhere on the page.
pub fn on_ctrl_enter(action: impl Fn() + 'static) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let listener = Closure::<dyn Fn(web_sys::KeyboardEvent)>::new(move |evt: web_sys::KeyboardEvent| {
        if evt.ctrl_key() && evt.key() == "Enter" {
            action();
        }
    });
    if let Err(e) = window.add_event_listener_with_callback("keydown", listener.as_ref().unchecked_ref()) {
        tracing::warn!(error = ?e, "Could not install keyboard shortcut");
        return;
    }
    // Lives as long as the page
    listener.forget();
}

pub fn random_unit_pair() -> (f64, f64) {
    (js_sys::Math::random(), js_sys::Math::random())
}
