//! In-process host for the script log contract.
//!
//! The host owns the committed storage of a single contract instance and
//! runs one call at a time to completion (`&mut self`). Each call works on
//! a [`ContractCache`] overlay:
//!
//! ```text
//! call(function, args)
//!     -> overlay over committed storage
//!     -> entry point runs, emits events into a per-call buffer
//!     -> Ok: overlay merged, events published
//!     -> Err: overlay and events dropped
//! ```

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use super::{
    context::CallContext,
    entrypoints::{execute, EntryPoint},
    error::{ContractError, StorageError},
    event::{ContractEvent, PublishedEvent},
    script_log::AppendPolicy,
    storage::{ContractCache, ContractStorage, MemoryStorage},
};

/// Outcome of a successful call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub return_data: Vec<u8>,
    pub events: Vec<ContractEvent>,
}

impl ExecutionResult {
    // Decode the return data as UTF-8 string
    pub fn return_string(&self) -> Result<String, ContractError> {
        String::from_utf8(self.return_data.clone()).map_err(|_| {
            ContractError::InvalidReturnData(crate::serializer::ReaderError::InvalidUtf8)
        })
    }
}

pub struct ContractHost<S: ContractStorage = MemoryStorage> {
    storage: S,
    policy: AppendPolicy,
    deployed: bool,
    events: Vec<PublishedEvent>,
}

impl ContractHost<MemoryStorage> {
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }
}

impl<S: ContractStorage> ContractHost<S> {
    pub fn new(storage: S) -> Self {
        Self::with_policy(storage, AppendPolicy::default())
    }

    pub fn with_policy(storage: S, policy: AppendPolicy) -> Self {
        Self {
            storage,
            policy,
            deployed: false,
            events: Vec::new(),
        }
    }

    pub fn is_deployed(&self) -> bool {
        self.deployed
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    // Events of all successful calls, in execution order
    pub fn events(&self) -> &[PublishedEvent] {
        &self.events
    }

    /// Deploy the contract: run the constructor with deployment credentials
    pub fn deploy(&mut self, args: &[u8]) -> Result<ExecutionResult, ContractError> {
        if self.deployed {
            return Err(ContractError::AlreadyDeployed);
        }

        let result = self.commit(EntryPoint::Constructor, CallContext::deployment(), args)?;
        self.deployed = true;
        debug!("Contract deployed");
        Ok(result)
    }

    /// Run a regular call by entry point name
    pub fn call(&mut self, function: &str, args: &[u8]) -> Result<ExecutionResult, ContractError> {
        if !self.deployed {
            return Err(ContractError::NotDeployed);
        }

        let entry = EntryPoint::parse(function)?;
        self.commit(entry, CallContext::regular(), args)
    }

    /// Run a call whose writes and events are always discarded
    pub fn read_only_call(
        &self,
        function: &str,
        args: &[u8],
    ) -> Result<ExecutionResult, ContractError> {
        if !self.deployed {
            return Err(ContractError::NotDeployed);
        }

        let entry = EntryPoint::parse(function)?;
        let mut cache = ContractCache::new(&self.storage);
        let mut events: Vec<ContractEvent> = Vec::new();
        let return_data = execute(
            entry,
            &CallContext::regular(),
            &mut cache,
            args,
            self.policy,
            &mut events,
        )?;

        Ok(ExecutionResult {
            return_data,
            events,
        })
    }

    /// Raw committed value stored under `key`
    pub fn datastore_entry(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        self.storage.load_data(key)
    }

    fn commit(
        &mut self,
        entry: EntryPoint,
        ctx: CallContext,
        args: &[u8],
    ) -> Result<ExecutionResult, ContractError> {
        let mut events: Vec<ContractEvent> = Vec::new();
        let (return_data, writes) = {
            let mut cache = ContractCache::new(&self.storage);
            match execute(entry, &ctx, &mut cache, args, self.policy, &mut events) {
                Ok(return_data) => (return_data, cache.into_writes()),
                Err(e) => {
                    if log::log_enabled!(log::Level::Warn) {
                        warn!("Call to {} reverted: {}", entry, e);
                    }
                    return Err(e);
                }
            }
        };

        if log::log_enabled!(log::Level::Trace) {
            trace!("Merging {} writes of {}", writes.len(), entry);
        }
        for (key, value) in writes {
            self.storage
                .store_data(&key, value)
                .map_err(super::error::ScriptLogError::from)?;
        }

        let function: &'static str = entry.into();
        for event in events.iter() {
            self.events.push(PublishedEvent {
                sequence: self.events.len() as u64,
                function: function.to_owned(),
                event: event.clone(),
            });
        }

        Ok(ExecutionResult {
            return_data,
            events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{
        args::{get_saved_script_args, save_script_args},
        error::ScriptLogError,
    };

    fn deployed_host() -> ContractHost {
        let mut host = ContractHost::in_memory();
        host.deploy(&[]).unwrap();
        host
    }

    #[test]
    fn test_constructor_only_at_deployment() {
        let mut host = deployed_host();
        assert_eq!(
            host.call("constructor", &[]),
            Err(ContractError::Log(ScriptLogError::NotDeploying))
        );
        assert_eq!(host.deploy(&[]), Err(ContractError::AlreadyDeployed));
    }

    #[test]
    fn test_call_before_deploy() {
        let mut host = ContractHost::in_memory();
        assert_eq!(
            host.call("get_script_id", &[]),
            Err(ContractError::NotDeployed)
        );
    }

    #[test]
    fn test_failed_call_leaves_no_trace() {
        let mut host = deployed_host();
        host.call("save_script", &save_script_args(0, "a")).unwrap();
        let published = host.events().len();
        let keys = host.storage().len();

        assert!(host.call("save_script", &save_script_args(5, "b")).is_err());
        assert_eq!(host.events().len(), published);
        assert_eq!(host.storage().len(), keys);
        assert_eq!(
            host.datastore_entry(b"script_id").unwrap(),
            Some(b"1".to_vec())
        );
    }

    #[test]
    fn test_read_only_call_discards_events() {
        let mut host = deployed_host();
        host.call("save_script", &save_script_args(0, "a")).unwrap();

        let result = host
            .read_only_call("get_saved_script", &get_saved_script_args(0))
            .unwrap();
        assert_eq!(result.return_string(), Ok("a".to_owned()));
        assert_eq!(result.events.len(), 1);
        assert_eq!(host.events().len(), 1);
    }

    #[test]
    fn test_published_events_are_sequenced() {
        let mut host = deployed_host();
        host.call("save_script", &save_script_args(0, "a")).unwrap();
        host.call("get_script_id", &[]).unwrap();

        let events = host.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].sequence, 0);
        assert_eq!(events[0].function, "save_script");
        assert_eq!(events[1].sequence, 1);
        assert_eq!(events[1].event.data, "Retrieved last script ID: 1");
    }
}
