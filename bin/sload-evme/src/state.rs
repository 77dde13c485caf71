//! Pre-execution state for sload-evme

use std::{collections::BTreeMap, convert::Infallible, path::PathBuf, str::FromStr};

use alloy_primitives::{Address, Bytes, U256};
use clap::Parser;
use revm::{
    database::{CacheDB, EmptyDB},
    primitives::KECCAK_EMPTY,
    state::{AccountInfo, Bytecode},
};
use serde::Deserialize;
use tracing::{debug, info, trace};

use crate::error::{EvmeError, Result};

/// Pre-execution state configuration arguments
#[derive(Parser, Debug, Clone, Default)]
#[command(next_help_heading = "State Options")]
pub(crate) struct PreStateArgs {
    /// JSON file with prestate (genesis) config: a map from address to
    /// `{ "balance", "nonce", "code", "storage" }`, every field optional.
    #[arg(long = "prestate", visible_aliases = ["pre-state"])]
    pub(crate) prestate: Option<PathBuf>,

    /// Balance to allocate to the sender account. If not specified, the sender balance comes
    /// from `prestate`, or is 0.
    #[arg(long = "sender.balance", visible_aliases = ["from.balance"])]
    pub(crate) sender_balance: Option<U256>,

    /// Override storage slots. Each entry format: `ADDRESS:SLOT=VALUE`
    /// SLOT and VALUE are U256 (hex or decimal).
    /// Examples: `--storage 0x1234:0x0=0x1`
    #[arg(long = "storage")]
    pub(crate) storage: Vec<String>,
}

/// Account entry of the prestate file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct AccountState {
    pub(crate) balance: U256,
    pub(crate) nonce: u64,
    pub(crate) code: Bytes,
    pub(crate) storage: BTreeMap<U256, U256>,
}

impl AccountState {
    fn info(&self) -> AccountInfo {
        let code = (!self.code.is_empty()).then(|| {
            Bytecode::new_raw_checked(self.code.clone())
                .unwrap_or_else(|_| Bytecode::new_legacy(self.code.clone()))
        });
        AccountInfo {
            balance: self.balance,
            nonce: self.nonce,
            code_hash: code.as_ref().map_or(KECCAK_EMPTY, Bytecode::hash_slow),
            code,
        }
    }
}

/// Accounts to seed the database with.
pub(crate) type Accounts = BTreeMap<Address, AccountState>;

impl PreStateArgs {
    /// Parse storage override entries from CLI arguments.
    ///
    /// Each entry should be in the format `ADDRESS:SLOT=VALUE`.
    pub(crate) fn parse_storage(&self) -> Result<Vec<(Address, U256, U256)>> {
        self.storage.iter().map(|entry| parse_storage_entry(entry.as_str())).collect()
    }

    /// Load the prestate file and apply the sender balance and storage overrides.
    pub(crate) fn load_accounts(&self, sender: Address) -> Result<Accounts> {
        let mut accounts = if let Some(path) = &self.prestate {
            info!(prestate_path = ?path, "Loading prestate from file");
            let content = std::fs::read_to_string(path)?;
            let accounts: Accounts = serde_json::from_str(&content).map_err(|e| {
                EvmeError::InvalidInput(format!("Failed to parse prestate JSON: {e}"))
            })?;
            trace!(?accounts, "Prestate loaded from file");
            accounts
        } else {
            debug!("No prestate file provided");
            Accounts::new()
        };

        if let Some(balance) = self.sender_balance {
            info!(%sender, %balance, "Setting sender balance");
            accounts.entry(sender).or_default().balance = balance;
        }
        for (address, slot, value) in self.parse_storage()? {
            info!(%address, %slot, %value, "Overriding storage");
            accounts.entry(address).or_default().storage.insert(slot, value);
        }
        Ok(accounts)
    }
}

fn parse_storage_entry(entry: &str) -> Result<(Address, U256, U256)> {
    let invalid = || {
        EvmeError::InvalidInput(format!(
            "Invalid storage entry '{entry}': expected format 'ADDRESS:SLOT=VALUE'"
        ))
    };
    let (addr_str, rest) = entry.split_once(':').ok_or_else(invalid)?;
    let (slot_str, value_str) = rest.split_once('=').ok_or_else(invalid)?;
    let address = Address::from_str(addr_str.trim()).map_err(|e| {
        EvmeError::InvalidInput(format!(
            "Invalid address '{addr_str}' in storage entry '{entry}': {e}"
        ))
    })?;
    let slot = U256::from_str(slot_str.trim()).map_err(|e| {
        EvmeError::InvalidInput(format!("Invalid slot '{slot_str}' in storage entry '{entry}': {e}"))
    })?;
    let value = U256::from_str(value_str.trim()).map_err(|e| {
        EvmeError::InvalidInput(format!(
            "Invalid value '{value_str}' in storage entry '{entry}': {e}"
        ))
    })?;
    Ok((address, slot, value))
}

/// Build an in-memory database holding `accounts`.
pub(crate) fn create_database(accounts: &Accounts) -> CacheDB<EmptyDB> {
    let mut db = CacheDB::new(EmptyDB::default());
    for (&address, account) in accounts {
        db.insert_account_info(address, account.info());
        for (&slot, &value) in &account.storage {
            db.insert_account_storage(address, slot, value)
                .unwrap_or_else(|never: Infallible| match never {});
        }
    }
    debug!(accounts = accounts.len(), "Database created");
    db
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, bytes};
    use revm::Database;
    use rstest::rstest;

    use super::*;

    const ACCOUNT: Address = address!("00000000000000000000000000000000000000aa");
    const EMPTY_ACCOUNT: Address = address!("00000000000000000000000000000000000000bb");

    #[rstest]
    #[case("0x00000000000000000000000000000000000000aa:0x0=0x1", U256::ZERO, U256::from(1))]
    #[case("0x00000000000000000000000000000000000000aa:7=42", U256::from(7), U256::from(42))]
    #[case(
        "0x00000000000000000000000000000000000000aa : 0x10 = 0xff",
        U256::from(16),
        U256::from(255)
    )]
    fn test_parse_storage_entry(#[case] entry: &str, #[case] slot: U256, #[case] value: U256) {
        assert_eq!(parse_storage_entry(entry).unwrap(), (ACCOUNT, slot, value));
    }

    #[rstest]
    #[case("0x00000000000000000000000000000000000000aa=0x1")]
    #[case("0x00000000000000000000000000000000000000aa:0x1")]
    #[case("0xaa:0x0=0x1")]
    #[case("0x00000000000000000000000000000000000000aa:zz=0x1")]
    fn test_parse_storage_entry_rejects(#[case] entry: &str) {
        assert!(matches!(parse_storage_entry(entry), Err(EvmeError::InvalidInput(_))));
    }

    #[test]
    fn test_parse_prestate_json() {
        let json = r#"{
            "0x00000000000000000000000000000000000000aa": {
                "balance": "0x64",
                "nonce": 3,
                "code": "0x6000",
                "storage": { "0x1": "0x2" }
            },
            "0x00000000000000000000000000000000000000bb": {}
        }"#;
        let accounts: Accounts = serde_json::from_str(json).unwrap();
        let account = &accounts[&ACCOUNT];
        assert_eq!(account.balance, U256::from(100));
        assert_eq!(account.nonce, 3);
        assert_eq!(account.code, bytes!("6000"));
        assert_eq!(account.storage[&U256::from(1)], U256::from(2));
        assert_eq!(accounts[&EMPTY_ACCOUNT], AccountState::default());
    }

    #[test]
    fn test_overrides_apply_without_prestate_file() {
        let sender = address!("00000000000000000000000000000000000000cc");
        let args = PreStateArgs {
            sender_balance: Some(U256::from(5)),
            storage: vec!["0x00000000000000000000000000000000000000aa:1=2".to_string()],
            ..Default::default()
        };
        let accounts = args.load_accounts(sender).unwrap();
        assert_eq!(accounts[&sender].balance, U256::from(5));
        assert_eq!(accounts[&ACCOUNT].storage[&U256::from(1)], U256::from(2));
    }

    #[test]
    fn test_create_database() {
        let mut accounts = Accounts::new();
        let account = accounts.entry(ACCOUNT).or_default();
        account.code = bytes!("6000");
        account.storage.insert(U256::from(1), U256::from(9));

        let mut db = create_database(&accounts);
        let info = db.basic(ACCOUNT).unwrap().unwrap();
        assert_ne!(info.code_hash, KECCAK_EMPTY);
        assert_eq!(db.storage(ACCOUNT, U256::from(1)).unwrap(), U256::from(9));
        assert_eq!(db.storage(ACCOUNT, U256::from(2)).unwrap(), U256::ZERO);
    }
}
