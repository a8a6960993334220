use dioxus::prelude::*;
use markmap_shared::collection::ClearConfirmed;
use markmap_shared::controller::{Controller, FormField};

use crate::browser::BrowserConfirm;
use crate::components::note_editor::NoteEditor;

pub const NAME_INPUT_ID: &str = "marker-name";
const NOTE_EDITOR_ID: &str = "marker-info";

fn copy_to_clipboard(text: String) {
    wasm_bindgen_futures::spawn_local(async move {
        if let Some(window) = web_sys::window() {
            let clipboard = window.navigator().clipboard();
            let _ = wasm_bindgen_futures::JsFuture::from(clipboard.write_text(&text)).await;
        }
    });
}

/// Edit form, marker buttons and the share link.
#[component]
pub fn ControlPanel(controller: Signal<Controller>, on_add: EventHandler<()>) -> Element {
    let mut controller = controller;
    let note = use_memo(move || controller.read().form().note.clone());

    let ctl = controller.read();
    let form = ctl.form().clone();
    let controls = ctl.controls();
    let link = ctl.link().to_string();
    let heading = match ctl.active() {
        Some(_) => "Edit marker",
        None => "New marker",
    };
    drop(ctl);

    rsx! {
        form {
            class: "panel marker-form",
            onsubmit: move |evt: Event<FormData>| evt.prevent_default(),

            h3 { "{heading}" }

            label { r#for: NAME_INPUT_ID, "Name" }
            input {
                id: NAME_INPUT_ID,
                name: "name",
                r#type: "text",
                placeholder: "Random if empty",
                value: "{form.name}",
                oninput: move |evt: Event<FormData>| controller.write().input(FormField::Name, evt.value()),
            }

            div { class: "location-row",
                div {
                    label { r#for: "marker-lon", "Longitude" }
                    input {
                        id: "marker-lon",
                        name: "lon",
                        r#type: "number",
                        step: "any",
                        value: "{form.lon}",
                        oninput: move |evt: Event<FormData>| controller.write().input(FormField::Lon, evt.value()),
                    }
                }
                div {
                    label { r#for: "marker-lat", "Latitude" }
                    input {
                        id: "marker-lat",
                        name: "lat",
                        r#type: "number",
                        step: "any",
                        value: "{form.lat}",
                        oninput: move |evt: Event<FormData>| controller.write().input(FormField::Lat, evt.value()),
                    }
                }
            }

            div { class: "color-row",
                label {
                    input {
                        name: "color-primary",
                        r#type: "color",
                        value: "{form.color_primary}",
                        oninput: move |evt: Event<FormData>| {
                            controller.write().input(FormField::ColorPrimary, evt.value())
                        },
                    }
                    " Primary"
                }
                label {
                    input {
                        name: "color-secondary",
                        r#type: "color",
                        value: "{form.color_secondary}",
                        oninput: move |evt: Event<FormData>| {
                            controller.write().input(FormField::ColorSecondary, evt.value())
                        },
                    }
                    " Secondary"
                }
            }

            label { "Info" }
            NoteEditor {
                id: NOTE_EDITOR_ID,
                value: note,
                on_input: move |html: String| controller.write().input(FormField::Note, html),
            }

            div { class: "button-row",
                button {
                    r#type: "button",
                    disabled: !controls.add_enabled,
                    onclick: move |_| on_add.call(()),
                    "Add"
                }
                button {
                    r#type: "button",
                    class: "secondary",
                    disabled: !controls.remove_enabled,
                    onclick: move |_| {
                        controller.write().remove_active();
                    },
                    "Remove"
                }
                button {
                    r#type: "button",
                    class: "secondary",
                    onclick: move |_| controller.write().deselect(),
                    "Reset"
                }
                button {
                    r#type: "button",
                    class: "danger",
                    disabled: !controls.clear_enabled,
                    onclick: move |_| {
                        if let Some(confirmed) = ClearConfirmed::ask(&BrowserConfirm) {
                            controller.write().clear_all(confirmed);
                        }
                    },
                    "Clear"
                }
            }
        }

        div { class: "panel share-link",
            h3 { "Link" }
            div { class: "plan-url",
                input {
                    r#type: "text",
                    readonly: true,
                    value: "{link}",
                }
                button {
                    class: "secondary",
                    onclick: {
                        let link = link.clone();
                        move |_| copy_to_clipboard(link.clone())
                    },
                    "Copy"
                }
            }
            a {
                href: "{link}",
                target: "_blank",
                rel: "noopener",
                "Open view-only map"
            }
        }
    }
}
