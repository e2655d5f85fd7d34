use std::str::FromStr;

use log::trace;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use super::{
    args::ArgsReader,
    context::CallContext,
    error::ContractError,
    event::EventSink,
    script_log::{AppendPolicy, ScriptLog},
    storage::ContractStorage,
    store::KeyedScriptStore,
};

const MISSING_SCRIPT_ID: &str = "Script ID argument missing or invalid";
const MISSING_SCRIPT: &str = "Script argument missing or invalid";

/// Exported functions of the script log contract
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntryPoint {
    /// Deployment only: create the counter
    Constructor,
    /// `(index: u64, script: string)`, no return value
    SaveScript,
    /// `(index: u64)`, returns the script
    GetSavedScript,
    /// no argument, returns the counter as decimal string
    GetScriptId,
}

impl EntryPoint {
    pub fn parse(name: &str) -> Result<Self, ContractError> {
        Self::from_str(name).map_err(|_| ContractError::UnknownEntryPoint(name.to_owned()))
    }
}

/// Run one entry point against `storage`.
///
/// Returns the raw return data: UTF-8 bytes of the returned string,
/// empty for entry points without return value.
pub fn execute<S: ContractStorage>(
    entry: EntryPoint,
    ctx: &CallContext,
    storage: &mut S,
    args: &[u8],
    policy: AppendPolicy,
    events: &mut dyn EventSink,
) -> Result<Vec<u8>, ContractError> {
    trace!("execute {}", entry);

    let mut log = ScriptLog::with_policy(KeyedScriptStore::new(storage), policy);
    let mut args = ArgsReader::new(args);

    match entry {
        EntryPoint::Constructor => {
            log.initialize(ctx)?;
            Ok(Vec::new())
        }
        EntryPoint::SaveScript => {
            let index = args
                .next_u64()
                .map_err(|_| ContractError::InvalidArgument(MISSING_SCRIPT_ID))?;
            let script = args
                .next_string()
                .map_err(|_| ContractError::InvalidArgument(MISSING_SCRIPT))?;

            log.append(index, script, events)?;
            Ok(Vec::new())
        }
        EntryPoint::GetSavedScript => {
            let index = args
                .next_u64()
                .map_err(|_| ContractError::InvalidArgument(MISSING_SCRIPT_ID))?;

            let script = log.read_entry(index, events)?;
            Ok(script.into_bytes())
        }
        EntryPoint::GetScriptId => {
            let counter = log.read_counter(events)?;
            Ok(counter.to_string().into_bytes())
        }
    }
}
