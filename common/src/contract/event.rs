use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Observable message emitted by a contract call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEvent {
    pub data: String,
}

impl ContractEvent {
    pub fn new<S: Into<String>>(data: S) -> Self {
        Self { data: data.into() }
    }

    pub fn script_saved(index: u64, value: &str) -> Self {
        Self::new(format!("Script saved with ID {index}: {value}"))
    }

    pub fn script_retrieved(index: u64, value: &str) -> Self {
        Self::new(format!("Retrieved script with ID {index}: {value}"))
    }

    pub fn script_id_retrieved(counter: u64) -> Self {
        Self::new(format!("Retrieved last script ID: {counter}"))
    }
}

impl Display for ContractEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.data)
    }
}

/// Observer receiving the events of a call
///
/// The host collects them per call and only publishes
/// the ones of calls that succeeded.
pub trait EventSink {
    fn emit(&mut self, event: ContractEvent);
}

impl EventSink for Vec<ContractEvent> {
    fn emit(&mut self, event: ContractEvent) {
        self.push(event);
    }
}

/// Event published by the host once its call succeeded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedEvent {
    // Monotonic position in the host event log
    pub sequence: u64,
    // Entry point that emitted it
    pub function: String,
    pub event: ContractEvent,
}
