use ks_core::job::JobId;
use ks_genai::{GenError, LocalArtifact, Progress};
use winit::event_loop::EventLoopProxy;
use crate::ui::UiEvent;

#[derive(Debug)]
pub enum KsEvent {
    Ui(UiEvent),
    App(AppEvent),
    Gen(GenEvent),
    Seq(SeqEvent),
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    Status(String),
}

/// Reports from a background generation task, tagged with its job id.
#[derive(Debug)]
pub enum GenEvent {
    Progress {
        id: JobId,
        progress: Progress,
    },
    Finished {
        id: JobId,
        result: Result<LocalArtifact, GenError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqEvent {
    Tick { epoch: u64 },
}

/// Where background tasks deliver events. The event loop thread is the
/// only consumer, so all state changes happen there.
pub trait EventSink: Send + Sync + 'static {
    fn send(&self, event: KsEvent);
}

impl EventSink for EventLoopProxy<KsEvent> {
    fn send(&self, event: KsEvent) {
        if self.send_event(event).is_err() {
            log::debug!("event loop closed, dropping event");
        }
    }
}
