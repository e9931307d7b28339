//! Association calendar

use std::sync::Arc;

use crate::traits::*;
use crate::types::*;

pub struct CalendarManager<S: AssociationStorage> {
    storage: S,
    validator: Arc<dyn RecordValidator>,
}

impl<S: AssociationStorage> CalendarManager<S> {
    pub fn new(storage: S) -> Self {
        Self::with_validator(storage, Arc::new(DefaultRecordValidator))
    }

    pub fn with_validator(storage: S, validator: Arc<dyn RecordValidator>) -> Self {
        Self { storage, validator }
    }

    pub async fn create_event(&mut self, new: NewCalendarEvent) -> AssociationResult<CalendarEvent> {
        let event = CalendarEvent::new(new);
        self.validator.validate_event(&event)?;
        self.storage.save_event(&event).await?;
        Ok(event)
    }

    /// Public events in chronological order
    pub async fn list_public_events(&self) -> AssociationResult<Vec<CalendarEvent>> {
        let mut events: Vec<_> = self
            .storage
            .list_events()
            .await?
            .into_iter()
            .filter(|event| event.is_public)
            .collect();
        events.sort_by_key(|event| event.start);
        Ok(events)
    }
}
