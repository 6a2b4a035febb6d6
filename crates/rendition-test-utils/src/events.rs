use rendition_abr::QualityId;
use rendition_events::{AbrEvent, Event, EventBus, SwitchCause};
use tokio::sync::broadcast;

/// Collects everything published on an [`EventBus`] from the moment it is
/// created.
pub struct EventLog {
    rx: broadcast::Receiver<Event>,
    seen: Vec<Event>,
}

impl EventLog {
    pub fn new(bus: &EventBus) -> Self {
        Self {
            rx: bus.subscribe(),
            seen: Vec::new(),
        }
    }

    /// Pull pending events and return everything seen so far.
    pub fn events(&mut self) -> &[Event] {
        while let Ok(event) = self.rx.try_recv() {
            self.seen.push(event);
        }
        &self.seen
    }

    pub fn abr_events(&mut self) -> Vec<AbrEvent> {
        self.events()
            .iter()
            .filter_map(|event| match event {
                Event::Abr(abr) => Some(abr.clone()),
                Event::Playback(_) => None,
            })
            .collect()
    }

    /// `(to, cause)` of every committed switch.
    pub fn switches(&mut self) -> Vec<(QualityId, SwitchCause)> {
        self.abr_events()
            .into_iter()
            .filter_map(|event| match event {
                AbrEvent::QualitySwitched { to, cause, .. } => Some((to, cause)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&mut self, pred: impl Fn(&AbrEvent) -> bool) -> usize {
        self.abr_events().iter().filter(|event| pred(event)).count()
    }
}
