pub const VERSION: &str = env!("BUILD_VERSION");

// Datastore key holding the next unassigned script id (decimal string)
pub const SCRIPT_ID_KEY: &str = "script_id";
// Datastore key prefix for stored scripts, followed by the decimal id
pub const SCRIPT_KEY_PREFIX: &str = "scripts_";

// Smart contract addresses are prefixed with AS
pub const PREFIX_CONTRACT_ADDRESS: &str = "AS";

// Contract deployed for the note-taking frontend on buildnet
pub const DEFAULT_CONTRACT_ADDRESS: &str = "AS12PxxbGQStacZMs2R8tuHyoQBJu6zjD9JHrRNM3GazKYmUmUisq";

// Public JSON-RPC endpoints
pub const MAINNET_RPC_ADDRESS: &str = "https://mainnet.massa.net/api/v2";
pub const BUILDNET_RPC_ADDRESS: &str = "https://buildnet.massa.net/api/v2";
pub const LOCAL_RPC_ADDRESS: &str = "http://127.0.0.1:33035";

// Wallet service address by default when no specified
pub const DEFAULT_WALLET_ADDRESS: &str = "http://127.0.0.1:8081";

// Gas budget for a save_script call and for read only calls
pub const SAVE_SCRIPT_MAX_GAS: u64 = 100_000_000;
pub const READ_ONLY_MAX_GAS: u64 = 100_000_000;
// Fee attached to a save_script operation, in nano units (0.01)
pub const SAVE_SCRIPT_FEE: u64 = 10_000_000;

// Finalization is polled every 2 seconds for at most 3 minutes
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
pub const DEFAULT_FINALIZATION_TIMEOUT_SECS: u64 = 180;

/// Build the datastore key of a script
pub fn script_key(id: u64) -> String {
    format!("{SCRIPT_KEY_PREFIX}{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_key_is_prefix_and_decimal() {
        assert_eq!(script_key(0), "scripts_0");
        assert_eq!(script_key(42), "scripts_42");
        assert_eq!(script_key(u64::MAX), format!("scripts_{}", u64::MAX));
    }
}
