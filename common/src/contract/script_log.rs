use log::debug;
use serde::{Deserialize, Serialize};

use super::{
    context::CallContext,
    error::ScriptLogError,
    event::{ContractEvent, EventSink},
    store::ScriptStore,
};

/// Which write indexes `append` accepts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppendPolicy {
    /// Only the current counter value
    #[default]
    Strict,
    /// Also accept an already assigned index, overwriting that
    /// slot without moving the counter
    LegacyOverwrite,
}

/// Append-only log of scripts indexed from 0.
///
/// Indexes are dense: every index below the counter holds a script
/// and a script is never removed.
pub struct ScriptLog<S: ScriptStore> {
    store: S,
    policy: AppendPolicy,
}

impl<S: ScriptStore> ScriptLog<S> {
    pub fn new(store: S) -> Self {
        Self::with_policy(store, AppendPolicy::default())
    }

    pub fn with_policy(store: S, policy: AppendPolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create the counter at 0 if absent.
    /// Only the deployment call may do this; it is a no-op once initialized.
    pub fn initialize(&mut self, ctx: &CallContext) -> Result<(), ScriptLogError> {
        if !ctx.is_deploying() {
            return Err(ScriptLogError::NotDeploying);
        }

        if self.store.counter()?.is_none() {
            debug!("Initializing script log counter");
            self.store.set_counter(0)?;
        }

        Ok(())
    }

    /// Store `value` at `index`, which must be the current counter
    pub fn append(
        &mut self,
        index: u64,
        value: String,
        events: &mut dyn EventSink,
    ) -> Result<(), ScriptLogError> {
        let next = self.store.counter()?.ok_or(ScriptLogError::NotInitialized)?;

        // Counter value after the write, None when an older slot is overwritten
        let new_counter = if index == next {
            Some(
                next.checked_add(1)
                    .ok_or(ScriptLogError::NonConsecutiveIndex { index, next })?,
            )
        } else if index > next || self.policy == AppendPolicy::Strict {
            return Err(ScriptLogError::NonConsecutiveIndex { index, next });
        } else {
            if log::log_enabled!(log::Level::Debug) {
                debug!("Overwriting script {} below counter {}", index, next);
            }
            None
        };

        let event = ContractEvent::script_saved(index, &value);
        self.store.put_entry(index, value)?;
        if let Some(counter) = new_counter {
            self.store.set_counter(counter)?;
        }
        events.emit(event);

        Ok(())
    }

    pub fn read_entry(
        &self,
        index: u64,
        events: &mut dyn EventSink,
    ) -> Result<String, ScriptLogError> {
        let value = self
            .store
            .entry(index)?
            .ok_or(ScriptLogError::NotFound(index))?;

        events.emit(ContractEvent::script_retrieved(index, &value));
        Ok(value)
    }

    pub fn read_counter(&self, events: &mut dyn EventSink) -> Result<u64, ScriptLogError> {
        let counter = self.store.counter()?.ok_or(ScriptLogError::NotInitialized)?;
        events.emit(ContractEvent::script_id_retrieved(counter));
        Ok(counter)
    }
}
