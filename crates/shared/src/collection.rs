use crate::error::MarkerError;
use crate::marker::Marker;
use crate::models::{MarkerId, MarkerRecord};

/// Asks the user a yes/no question before something irreversible happens.
pub trait ConfirmPrompt {
    fn confirm(&self, message: &str) -> bool;
}

pub const CLEAR_PROMPT: &str = "Sure about that?";

/// Proof that the user agreed to clear every marker.
///
/// Only obtainable through [`ClearConfirmed::ask`], so [`MarkerCollection::clear`]
/// cannot be reached without the prompt.
#[derive(Debug)]
pub struct ClearConfirmed(());

impl ClearConfirmed {
    pub fn ask(prompt: &dyn ConfirmPrompt) -> Option<Self> {
        prompt.confirm(CLEAR_PROMPT).then_some(ClearConfirmed(()))
    }
}

/// Markers on the map, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MarkerCollection {
    markers: Vec<Marker>,
}

impl MarkerCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<MarkerRecord>) -> Self {
        MarkerCollection {
            markers: records.into_iter().map(Marker::from_record).collect(),
        }
    }

    /// Append a marker. A marker whose id is already present is rejected.
    pub fn add(&mut self, marker: Marker) -> Result<(), MarkerError> {
        if self.contains(marker.id()) {
            return Err(MarkerError::DuplicateId(marker.id()));
        }
        self.markers.push(marker);
        Ok(())
    }

    /// Remove by id. Absent ids are a no-op.
    pub fn remove(&mut self, id: MarkerId) -> Option<Marker> {
        let index = self.markers.iter().position(|m| m.id() == id)?;
        Some(self.markers.remove(index))
    }

    pub fn clear(&mut self, _confirmed: ClearConfirmed) {
        self.markers.clear();
    }

    pub fn all(&self) -> &[Marker] {
        &self.markers
    }

    pub fn get(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id() == id)
    }

    pub(crate) fn get_mut(&mut self, id: MarkerId) -> Option<&mut Marker> {
        self.markers.iter_mut().find(|m| m.id() == id)
    }

    pub fn contains(&self, id: MarkerId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn records(&self) -> Vec<MarkerRecord> {
        self.markers.iter().map(Marker::serialize).collect()
    }
}
