use dioxus::logger::tracing;
use dioxus::prelude::*;
use wasm_bindgen::JsCast;

/// Toolbar actions of the rich-text note editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    Heading1,
    Heading2,
    Bold,
    Italic,
    Paragraph,
    OrderedList,
    Link,
    Image,
    Line,
}

impl EditorAction {
    pub const ALL: [EditorAction; 9] = [
        EditorAction::Heading1,
        EditorAction::Heading2,
        EditorAction::Bold,
        EditorAction::Italic,
        EditorAction::Paragraph,
        EditorAction::OrderedList,
        EditorAction::Link,
        EditorAction::Image,
        EditorAction::Line,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EditorAction::Heading1 => "H1",
            EditorAction::Heading2 => "H2",
            EditorAction::Bold => "B",
            EditorAction::Italic => "I",
            EditorAction::Paragraph => "¶",
            EditorAction::OrderedList => "#",
            EditorAction::Link => "🔗",
            EditorAction::Image => "📷",
            EditorAction::Line => "―",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            EditorAction::Heading1 => "Heading 1",
            EditorAction::Heading2 => "Heading 2",
            EditorAction::Bold => "Bold",
            EditorAction::Italic => "Italic",
            EditorAction::Paragraph => "Paragraph",
            EditorAction::OrderedList => "Ordered List",
            EditorAction::Link => "Link",
            EditorAction::Image => "Image",
            EditorAction::Line => "Horizontal Line",
        }
    }

    /// `execCommand` name and fixed argument.
    fn command(self) -> (&'static str, &'static str) {
        match self {
            EditorAction::Heading1 => ("formatBlock", "<h1>"),
            EditorAction::Heading2 => ("formatBlock", "<h2>"),
            EditorAction::Bold => ("bold", ""),
            EditorAction::Italic => ("italic", ""),
            EditorAction::Paragraph => ("formatBlock", "<p>"),
            EditorAction::OrderedList => ("insertOrderedList", ""),
            EditorAction::Link => ("createLink", ""),
            EditorAction::Image => ("insertImage", ""),
            EditorAction::Line => ("insertHorizontalRule", ""),
        }
    }

    /// Prompt shown for actions that need a URL from the user.
    fn url_prompt(self) -> Option<&'static str> {
        match self {
            EditorAction::Link => Some("Enter the link URL"),
            EditorAction::Image => Some("Enter the image URL"),
            _ => None,
        }
    }
}

fn editor_element(id: &str) -> Option<web_sys::HtmlElement> {
    web_sys::window()?
        .document()?
        .get_element_by_id(id)?
        .dyn_into::<web_sys::HtmlElement>()
        .ok()
}

fn run_action(editor_id: &str, action: EditorAction) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let value = match action.url_prompt() {
        Some(message) => match window.prompt_with_message(message) {
            Ok(Some(url)) if !url.trim().is_empty() => url,
            _ => return,
        },
        None => action.command().1.to_string(),
    };

    if let Some(editor) = editor_element(editor_id) {
        let _ = editor.focus();
    }
    let Some(document) = window
        .document()
        .and_then(|d| d.dyn_into::<web_sys::HtmlDocument>().ok())
    else {
        return;
    };
    if let Err(e) = document.exec_command_with_show_ui_and_value(action.command().0, false, &value) {
        tracing::warn!(error = ?e, ?action, "Editor command failed");
    }
}

/// Rich-text editor for a marker note. `value` is the HTML the form holds;
/// the editor follows it whenever it changes from outside (select, reset).
#[component]
pub fn NoteEditor(id: String, value: ReadSignal<String>, on_input: EventHandler<String>) -> Element {
    let effect_id = id.clone();
    use_effect(move || {
        let html = value.read().clone();
        if let Some(editor) = editor_element(&effect_id) {
            if editor.inner_html() != html {
                editor.set_inner_html(&html);
            }
        }
    });

    let input_id = id.clone();
    rsx! {
        div { class: "note-editor",
            div { class: "note-toolbar",
                for action in EditorAction::ALL {
                    button {
                        key: "{action.title()}",
                        r#type: "button",
                        title: action.title(),
                        onclick: {
                            let id = id.clone();
                            move |_| {
                                run_action(&id, action);
                                if let Some(editor) = editor_element(&id) {
                                    on_input.call(editor.inner_html());
                                }
                            }
                        },
                        "{action.label()}"
                    }
                }
            }
            div {
                id: "{id}",
                class: "note-content",
                contenteditable: "true",
                oninput: move |_| {
                    if let Some(editor) = editor_element(&input_id) {
                        on_input.call(editor.inner_html());
                    }
                },
            }
        }
    }
}
