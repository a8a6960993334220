use dioxus::logger::tracing;
use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;
use markmap_shared::controller::{Controller, CreateStep, CreateTicket};
use markmap_shared::link::{self, Mode};

use crate::browser;
use crate::components::control_panel::{ControlPanel, NAME_INPUT_ID};
use crate::components::map_view::MapView;
use crate::coords::Viewport;
use crate::name_suggest::{self, SUGGEST_TIMEOUT_MS};

/// Focus the name input once the new marker's name has been rendered.
async fn focus_name_input() {
    TimeoutFuture::new(0).await;
    browser::focus_and_select(NAME_INPUT_ID);
}

/// Race the word service against the timeout. Whichever finishes first
/// creates the marker; the other finds its ticket stale.
fn await_name(mut controller: Signal<Controller>, ticket: CreateTicket) {
    spawn(async move {
        let suggestion = name_suggest::suggest_name().await;
        if controller.write().finish_create(ticket, suggestion).is_some() {
            focus_name_input().await;
        }
    });
    spawn(async move {
        TimeoutFuture::new(SUGGEST_TIMEOUT_MS).await;
        let timed_out = Err(format!("no name after {} ms", SUGGEST_TIMEOUT_MS));
        if controller.write().finish_create(ticket, timed_out).is_some() {
            focus_name_input().await;
        }
    });
}

#[component]
pub fn Annotator() -> Element {
    let setup = use_hook(browser::read_page);

    let mut controller = use_signal({
        let setup = setup.clone();
        move || Controller::new(setup.records, setup.mode, setup.flags, setup.base_url)
    });
    let viewport = use_signal(move || {
        let first = controller.peek().markers().first().map(|m| m.location());
        Viewport::initial(first, browser::random_unit_pair())
    });

    // View-only pages switch to editing with Ctrl+Enter
    use_hook({
        let setup = setup.clone();
        move || {
            if setup.mode == Mode::ViewOnly && !browser::is_embedded() {
                let query = link::editable_query(&setup.query);
                browser::on_ctrl_enter(move || browser::navigate_to_query(&query));
            }
        }
    });

    let size = link::resolve_view_size(&setup.flags, setup.mode);

    let on_add = move |_: ()| {
        let vp = *viewport.peek();
        let step = controller.write().begin_create(&vp);
        match step {
            CreateStep::Created(id) => {
                tracing::debug!(marker = %id, "Created marker from form name");
                spawn(focus_name_input());
            }
            CreateStep::AwaitingName(ticket) => await_name(controller, ticket),
            CreateStep::Rejected => {}
        }
    };

    match setup.mode {
        Mode::Editable => rsx! {
            div { class: "app",
                div { class: "header",
                    h1 { "Marker Map" }
                }
                div { class: "sidebar",
                    ControlPanel {
                        controller: controller,
                        on_add: on_add,
                    }
                }
                MapView {
                    controller: controller,
                    viewport: viewport,
                    width: size.width,
                    height: size.height,
                }
            }
        },
        Mode::ViewOnly => rsx! {
            div { class: "app view-only",
                MapView {
                    controller: controller,
                    viewport: viewport,
                    width: size.width,
                    height: size.height,
                }
            }
        },
    }
}
