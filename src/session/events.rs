use crate::foundation::core::InstanceId;
use serde::Serialize;
use serde_json::Value;

/// Lifecycle and state notifications raised by the engine.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RuntimeEvent {
    /// An instance was constructed.
    ComponentInitialized {
        /// Instance.
        instance: InstanceId,
    },
    /// First render is about to run.
    WillMount {
        /// Instance.
        instance: InstanceId,
    },
    /// First render completed.
    DidMount {
        /// Instance.
        instance: InstanceId,
    },
    /// The instance is being destroyed.
    WillUnmount {
        /// Instance.
        instance: InstanceId,
    },
    /// A public state was written (`state:set`).
    StateSet {
        /// Instance.
        instance: InstanceId,
        /// State name.
        name: String,
        /// New value.
        value: Value,
    },
}

impl RuntimeEvent {
    /// Instance the event is about.
    pub fn instance(&self) -> InstanceId {
        match self {
            Self::ComponentInitialized { instance }
            | Self::WillMount { instance }
            | Self::DidMount { instance }
            | Self::WillUnmount { instance }
            | Self::StateSet { instance, .. } => *instance,
        }
    }
}

/// Receiver of [`RuntimeEvent`]s. Delivery to listeners is the sink's concern.
pub trait EventSink {
    /// Record one event.
    fn emit(&mut self, event: RuntimeEvent);
}

/// In-memory sink, drained by the host.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Vec<RuntimeEvent>,
}

impl EventLog {
    /// Events recorded since the last drain.
    pub fn events(&self) -> &[RuntimeEvent] {
        &self.events
    }

    /// Take every recorded event.
    pub fn drain(&mut self) -> Vec<RuntimeEvent> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: RuntimeEvent) {
        tracing::trace!(?event, "runtime event");
        self.events.push(event);
    }
}
