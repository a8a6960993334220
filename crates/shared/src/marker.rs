use crate::models::{ColorPair, Location, MarkerId, MarkerRecord, PartialColor};
use crate::note::Note;

/// Info popup attached to a marker. Its anchor and content follow the
/// marker's location and note; `open` is driven by selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    anchor: Location,
    content: String,
    open: bool,
}

impl Popup {
    pub fn anchor(&self) -> Location {
        self.anchor
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

/// Field a setter touched, fanned out to the popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Changed {
    Location,
    Name,
    Note,
    Color,
}

/// A user-placed point annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    id: MarkerId,
    location: Location,
    name: String,
    note: Note,
    color: ColorPair,
    popup: Popup,
}

impl Marker {
    pub fn create(
        name: impl Into<String>,
        location: Location,
        note: Option<Note>,
        color: Option<PartialColor>,
    ) -> Self {
        let note = note.unwrap_or_default();
        let mut pair = ColorPair::default();
        if let Some(partial) = color {
            pair.merge(partial);
        }
        Marker {
            id: MarkerId::fresh(),
            location,
            name: name.into(),
            popup: Popup {
                anchor: location,
                content: note.html().to_string(),
                open: false,
            },
            note,
            color: pair,
        }
    }

    pub fn from_record(record: MarkerRecord) -> Self {
        Marker::create(
            record.name,
            record.location,
            Some(Note::from(record.info_html)),
            Some(record.color),
        )
    }

    pub fn id(&self) -> MarkerId {
        self.id
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn note(&self) -> &Note {
        &self.note
    }

    pub fn color(&self) -> &ColorPair {
        &self.color
    }

    pub fn popup(&self) -> &Popup {
        &self.popup
    }

    pub fn has_note(&self) -> bool {
        self.note.has_text()
    }

    /// The popup is on screen only when it is open and there is something to show.
    pub fn popup_visible(&self) -> bool {
        self.popup.open && self.has_note()
    }

    pub fn set_location(&mut self, location: Location) {
        self.location = location;
        self.notify(Changed::Location);
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.notify(Changed::Name);
    }

    pub fn set_note(&mut self, note: Note) {
        self.note = note;
        self.notify(Changed::Note);
    }

    pub fn set_color(&mut self, partial: PartialColor) {
        self.color.merge(partial);
        self.notify(Changed::Color);
    }

    pub fn show_info(&mut self) {
        self.popup.open = true;
    }

    pub fn hide_info(&mut self) {
        self.popup.open = false;
    }

    pub fn toggle_info(&mut self, show: bool) {
        if show {
            self.show_info();
        } else {
            self.hide_info();
        }
    }

    pub fn serialize(&self) -> MarkerRecord {
        MarkerRecord {
            name: self.name.clone(),
            location: self.location,
            info_html: self.note.html().to_string(),
            color: self.color.non_default(),
        }
    }

    /// Keep everything derived from the marker's fields in step with them.
    fn notify(&mut self, changed: Changed) {
        match changed {
            Changed::Location => self.popup.anchor = self.location,
            Changed::Note => self.popup.content = self.note.html().to_string(),
            Changed::Name | Changed::Color => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DEFAULT_PRIMARY, DEFAULT_SECONDARY};

    fn loc(lon: f64, lat: f64) -> Location {
        Location::new(lon, lat).unwrap()
    }

    #[test]
    fn test_create_applies_defaults() {
        let m = Marker::create("Home", loc(1.0, 2.0), None, None);
        assert_eq!(m.name(), "Home");
        assert_eq!(m.note().html(), "");
        assert_eq!(m.color().primary, DEFAULT_PRIMARY);
        assert_eq!(m.color().secondary, DEFAULT_SECONDARY);
        assert!(!m.has_note());
    }

    #[test]
    fn test_create_partial_color_only_overrides_given_channel() {
        let partial = PartialColor {
            primary: Some("#000000".to_string()),
            secondary: None,
        };
        let m = Marker::create("", loc(0.0, 0.0), None, Some(partial));
        assert_eq!(m.color().primary, "#000000");
        assert_eq!(m.color().secondary, DEFAULT_SECONDARY);
    }

    #[test]
    fn test_serialize_omits_default_colors() {
        let m = Marker::create("A", loc(0.0, 0.0), None, None);
        let json = serde_json::to_value(m.serialize()).unwrap();
        assert!(json.get("color").is_none());
        assert_eq!(json["location"], serde_json::json!([0.0, 0.0]));
        assert_eq!(json["name"], "A");
    }

    #[test]
    fn test_serialize_keeps_only_overridden_secondary() {
        let mut m = Marker::create("A", loc(0.0, 0.0), None, None);
        m.set_color(PartialColor {
            primary: None,
            secondary: Some("#00ff00".to_string()),
        });
        let json = serde_json::to_value(m.serialize()).unwrap();
        assert_eq!(json["color"], serde_json::json!({ "secondary": "#00ff00" }));
    }

    #[test]
    fn test_serialize_keeps_empty_name() {
        let m = Marker::create("", loc(0.0, 0.0), None, None);
        let json = serde_json::to_value(m.serialize()).unwrap();
        assert_eq!(json["name"], "");
    }

    #[test]
    fn test_set_location_moves_popup() {
        let mut m = Marker::create("A", loc(0.0, 0.0), None, None);
        m.set_location(loc(5.0, 6.0));
        assert_eq!(m.popup().anchor(), loc(5.0, 6.0));
    }

    #[test]
    fn test_set_note_rerenders_popup() {
        let mut m = Marker::create("A", loc(0.0, 0.0), None, None);
        m.set_note(Note::new("<p>hi</p>"));
        assert_eq!(m.popup().content(), "<p>hi</p>");
    }

    #[test]
    fn test_popup_visible_needs_note_and_open() {
        let mut m = Marker::create("A", loc(0.0, 0.0), None, None);
        m.show_info();
        assert!(!m.popup_visible());
        m.set_note(Note::new("<p>hi</p>"));
        assert!(m.popup_visible());
        m.hide_info();
        assert!(!m.popup_visible());
    }

    #[test]
    fn test_from_record_round_trips() {
        let record = MarkerRecord {
            name: "Cafe".to_string(),
            location: loc(2.35, 48.85),
            info_html: "<b>open</b>".to_string(),
            color: PartialColor {
                primary: Some("#0000ff".to_string()),
                secondary: None,
            },
        };
        let m = Marker::from_record(record.clone());
        assert_eq!(m.serialize(), record);
    }

    #[test]
    fn test_linked_note_is_sanitized_before_popup() {
        let record = MarkerRecord {
            name: "trap".to_string(),
            location: loc(0.0, 0.0),
            info_html: "<img src=x onerror=alert(1)>".to_string(),
            color: PartialColor::default(),
        };
        let mut m = Marker::from_record(record);
        m.show_info();
        assert!(!m.popup().content().contains("onerror"));
        assert!(!m.serialize().info_html.contains("onerror"));
    }
}
