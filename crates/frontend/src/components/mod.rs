pub mod control_panel;
pub mod map_view;
pub mod note_editor;
