//! Selection and edit state machine.
//!
//! All changes to markers go through [`Controller`]. Every change to the
//! collection or to a marker field recomputes the share link before the
//! method returns.

use crate::collection::{ClearConfirmed, MarkerCollection};
use crate::error::MarkerError;
use crate::link::{self, Mode, ViewFlags};
use crate::marker::Marker;
use crate::models::{ColorPair, Location, MarkerId, MarkerRecord, PartialColor};
use crate::note::Note;
use crate::surface::{self, MapSurface};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateTicket(u64);

/// A Create waiting on its name. Location, note and color are fixed when
/// "add" is pressed.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCreate {
    ticket: CreateTicket,
    location: Location,
    note: Note,
    color: PartialColor,
}

impl PendingCreate {
    pub fn ticket(&self) -> CreateTicket {
        self.ticket
    }

    pub fn location(&self) -> Location {
        self.location
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditState {
    Idle,
    Editing(MarkerId),
    Creating(PendingCreate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphState {
    Normal,
    Selected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Lon,
    Lat,
    ColorPrimary,
    ColorSecondary,
    Note,
}

impl FormField {
    /// Map a form control's `name` attribute to the field it edits.
    pub fn from_input_name(name: &str) -> Option<Self> {
        match name {
            "name" => Some(FormField::Name),
            "lon" => Some(FormField::Lon),
            "lat" => Some(FormField::Lat),
            "color-primary" => Some(FormField::ColorPrimary),
            "color-secondary" => Some(FormField::ColorSecondary),
            "info" => Some(FormField::Note),
            _ => None,
        }
    }
}

/// Values shown in the edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditForm {
    pub name: String,
    pub lon: String,
    pub lat: String,
    pub color_primary: String,
    pub color_secondary: String,
    pub note: String,
}

impl Default for EditForm {
    fn default() -> Self {
        let color = ColorPair::default();
        EditForm {
            name: String::new(),
            lon: String::new(),
            lat: String::new(),
            color_primary: color.primary,
            color_secondary: color.secondary,
            note: String::new(),
        }
    }
}

impl EditForm {
    fn snapshot(marker: &Marker) -> Self {
        let location = marker.location();
        EditForm {
            name: marker.name().to_string(),
            lon: location.lon().to_string(),
            lat: location.lat().to_string(),
            color_primary: marker.color().primary.clone(),
            color_secondary: marker.color().secondary.clone(),
            note: marker.note().html().trim().to_string(),
        }
    }

    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::Name => &self.name,
            FormField::Lon => &self.lon,
            FormField::Lat => &self.lat,
            FormField::ColorPrimary => &self.color_primary,
            FormField::ColorSecondary => &self.color_secondary,
            FormField::Note => &self.note,
        }
    }

    fn set(&mut self, field: FormField, value: String) {
        let slot = match field {
            FormField::Name => &mut self.name,
            FormField::Lon => &mut self.lon,
            FormField::Lat => &mut self.lat,
            FormField::ColorPrimary => &mut self.color_primary,
            FormField::ColorSecondary => &mut self.color_secondary,
            FormField::Note => &mut self.note,
        };
        *slot = value;
    }

    fn set_location(&mut self, location: Location) {
        self.lon = location.lon().to_string();
        self.lat = location.lat().to_string();
    }

    fn color(&self) -> PartialColor {
        PartialColor {
            primary: Some(self.color_primary.clone()),
            secondary: Some(self.color_secondary.clone()),
        }
    }
}

/// Which buttons of the control panel are usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub add_enabled: bool,
    pub remove_enabled: bool,
    pub clear_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateStep {
    /// The form had a name; the marker exists and is being edited.
    Created(MarkerId),
    /// A name must be suggested; hand the result to [`Controller::finish_create`].
    AwaitingName(CreateTicket),
    /// Not possible right now (not idle, or view-only).
    Rejected,
}

#[derive(Debug, Clone)]
pub struct Controller {
    markers: MarkerCollection,
    state: EditState,
    form: EditForm,
    mode: Mode,
    flags: ViewFlags,
    base_url: String,
    link: String,
    next_ticket: u64,
}

impl Controller {
    pub fn new(records: Vec<MarkerRecord>, mode: Mode, flags: ViewFlags, base_url: impl Into<String>) -> Self {
        let mut controller = Controller {
            markers: MarkerCollection::from_records(records),
            state: EditState::Idle,
            form: EditForm::default(),
            mode,
            flags,
            base_url: base_url.into(),
            link: String::new(),
            next_ticket: 0,
        };
        controller.refresh_link();
        controller
    }

    pub fn markers(&self) -> &[Marker] {
        self.markers.all()
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn form(&self) -> &EditForm {
        &self.form
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn active_id(&self) -> Option<MarkerId> {
        match self.state {
            EditState::Editing(id) => Some(id),
            _ => None,
        }
    }

    pub fn active(&self) -> Option<&Marker> {
        self.active_id().and_then(|id| self.markers.get(id))
    }

    pub fn glyph_state(&self, id: MarkerId) -> GlyphState {
        if self.active_id() == Some(id) {
            GlyphState::Selected
        } else {
            GlyphState::Normal
        }
    }

    pub fn controls(&self) -> Controls {
        let editable = self.mode == Mode::Editable;
        Controls {
            add_enabled: editable && self.state == EditState::Idle,
            remove_enabled: editable && matches!(self.state, EditState::Editing(_)),
            clear_enabled: editable,
        }
    }

    /// Select a marker (`Some`) or clear the selection (`None`).
    ///
    /// Returns where the map should recenter: the selected marker's location
    /// when it has no note to show.
    pub fn select(&mut self, id: Option<MarkerId>) -> Option<Location> {
        if matches!(self.state, EditState::Creating(_)) {
            tracing::debug!("Ignoring selection while a marker is being created");
            return None;
        }
        if let Some(id) = id {
            if !self.markers.contains(id) {
                tracing::debug!(marker = %id, "Ignoring selection of unknown marker");
                return None;
            }
        }

        if let Some(previous) = self.active_id() {
            if let Some(m) = self.markers.get_mut(previous) {
                m.hide_info();
            }
        }

        let Some(id) = id else {
            self.enter_idle();
            self.refresh_link();
            return None;
        };

        let marker = self.markers.get_mut(id)?;
        marker.show_info();
        let recenter = (!marker.has_note()).then(|| marker.location());
        if self.mode == Mode::Editable {
            self.form = EditForm::snapshot(marker);
        }
        self.state = EditState::Editing(id);
        tracing::debug!(marker = %id, "Selected marker");
        recenter
    }

    /// Explicit form reset.
    pub fn deselect(&mut self) {
        self.select(None);
    }

    /// The active marker's glyph was dropped at `location`.
    pub fn drag_end(&mut self, id: MarkerId, location: Location) {
        if self.mode != Mode::Editable || self.active_id() != Some(id) {
            tracing::debug!(marker = %id, "Ignoring drag of inactive marker");
            return;
        }
        if let Some(m) = self.markers.get_mut(id) {
            m.set_location(location);
            self.form.set_location(location);
            self.refresh_link();
        }
    }

    /// A form control changed. The form always keeps what was typed; the
    /// active marker, if any, takes the new value at once.
    pub fn input(&mut self, field: FormField, value: impl Into<String>) {
        if self.mode != Mode::Editable {
            return;
        }
        self.form.set(field, value.into());

        let Some(id) = self.active_id() else {
            return;
        };
        let Some(marker) = self.markers.get_mut(id) else {
            return;
        };

        match field {
            FormField::Name => marker.set_name(self.form.name.clone()),
            FormField::Lon | FormField::Lat => match Location::parse(&self.form.lon, &self.form.lat) {
                Ok(location) => marker.set_location(location),
                Err(e) => {
                    tracing::debug!(error = %e, "Keeping previous location");
                    return;
                }
            },
            FormField::ColorPrimary | FormField::ColorSecondary => marker.set_color(self.form.color()),
            FormField::Note => {
                marker.set_note(Note::new(self.form.note.clone()));
                let show = marker.has_note();
                marker.toggle_info(show);
            }
        }
        self.refresh_link();
    }

    /// Start adding a marker near the view center.
    pub fn begin_create(&mut self, surface: &dyn MapSurface) -> CreateStep {
        if !self.controls().add_enabled {
            tracing::debug!(state = ?self.state, "Create not available");
            return CreateStep::Rejected;
        }

        let pending = PendingCreate {
            ticket: self.take_ticket(),
            location: surface::spawn_location(surface, self.markers.all()),
            note: Note::new(self.form.note.clone()),
            color: self.form.color(),
        };

        if !self.form.name.is_empty() {
            let name = self.form.name.clone();
            return CreateStep::Created(self.insert_and_select(name, pending));
        }

        let ticket = pending.ticket;
        self.state = EditState::Creating(pending);
        CreateStep::AwaitingName(ticket)
    }

    /// Complete a Create with the suggested name. A failed suggestion falls
    /// back to a generated name. Stale tickets are ignored.
    pub fn finish_create(&mut self, ticket: CreateTicket, suggestion: Result<String, String>) -> Option<MarkerId> {
        let pending = match &self.state {
            EditState::Creating(p) if p.ticket == ticket => p.clone(),
            _ => {
                tracing::debug!(?ticket, "Dropping stale name suggestion");
                return None;
            }
        };

        let name = match suggestion {
            Ok(name) if !name.trim().is_empty() => name,
            Ok(_) => self.fallback_name(),
            Err(e) => {
                tracing::warn!(error = %e, "Name suggestion failed, using a generated name");
                self.fallback_name()
            }
        };
        self.state = EditState::Idle;
        Some(self.insert_and_select(name, pending))
    }

    /// Remove the active marker.
    pub fn remove_active(&mut self) -> Option<Marker> {
        if self.mode != Mode::Editable {
            return None;
        }
        let id = self.active_id()?;
        self.remove(id)
    }

    /// Remove any marker. Removing the active one drops the selection.
    pub fn remove(&mut self, id: MarkerId) -> Option<Marker> {
        let removed = self.markers.remove(id)?;
        if self.active_id() == Some(id) {
            self.enter_idle();
        }
        tracing::debug!(marker = %id, remaining = self.markers.len(), "Removed marker");
        self.refresh_link();
        Some(removed)
    }

    /// Programmatic add; duplicates are rejected.
    pub fn add(&mut self, marker: Marker) -> Result<(), MarkerError> {
        self.markers.add(marker)?;
        self.refresh_link();
        Ok(())
    }

    /// Empty the collection. Also cancels a Create in flight.
    pub fn clear_all(&mut self, confirmed: ClearConfirmed) {
        self.markers.clear(confirmed);
        self.enter_idle();
        tracing::debug!("Cleared all markers");
        self.refresh_link();
    }

    fn insert_and_select(&mut self, name: String, pending: PendingCreate) -> MarkerId {
        let marker = Marker::create(name, pending.location, Some(pending.note), Some(pending.color));
        let id = marker.id();
        if let Err(e) = self.markers.add(marker) {
            tracing::warn!(error = %e, "Could not add new marker");
        }
        self.state = EditState::Idle;
        self.select(Some(id));
        self.refresh_link();
        id
    }

    fn enter_idle(&mut self) {
        self.state = EditState::Idle;
        self.form = EditForm::default();
    }

    fn fallback_name(&self) -> String {
        format!("Marker {}", self.markers.len() + 1)
    }

    fn take_ticket(&mut self) -> CreateTicket {
        self.next_ticket += 1;
        CreateTicket(self.next_ticket)
    }

    fn refresh_link(&mut self) {
        let query = link::encode(&self.markers.records(), &self.flags);
        self.link = link::share_url(&self.base_url, &query);
    }
}
