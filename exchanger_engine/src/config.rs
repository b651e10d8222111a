use std::{env, time::Duration};

use log::*;

use crate::{
    db_types::{AccountKind, MerchantAccount},
    snapshot::PacingPolicy,
};

const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_ACCOUNT_PACING: Duration = Duration::from_millis(1000);
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Reconciliation loop configuration.
///
/// Read from the environment:
/// * `XGE_INTERVAL_SECS`: seconds between reconciliation cycles (default 60).
/// * `XGE_ACCOUNT_PACING_MS`: fixed delay in milliseconds before each account history call, to respect merchant
///   rate limits (default 1000; 0 disables pacing).
/// * `XGE_CALL_TIMEOUT_SECS`: per-call deadline for every external call (default 10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerConfig {
    pub interval: Duration,
    pub account_pacing: PacingPolicy,
    pub call_timeout: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            account_pacing: PacingPolicy::FixedDelay(DEFAULT_ACCOUNT_PACING),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

impl ReconcilerConfig {
    pub fn from_env_or_default() -> Self {
        let mut config = Self::default();
        if let Some(secs) = read_u64("XGE_INTERVAL_SECS") {
            config.interval = Duration::from_secs(secs.max(1));
        }
        if let Some(ms) = read_u64("XGE_ACCOUNT_PACING_MS") {
            config.account_pacing = match ms {
                0 => PacingPolicy::None,
                ms => PacingPolicy::FixedDelay(Duration::from_millis(ms)),
            };
        }
        if let Some(secs) = read_u64("XGE_CALL_TIMEOUT_SECS") {
            config.call_timeout = Duration::from_secs(secs.max(1));
        }
        config
    }
}

fn read_u64(var: &str) -> Option<u64> {
    match env::var(var) {
        Ok(v) => match v.parse::<u64>() {
            Ok(n) => Some(n),
            Err(_) => {
                warn!("⚙️ {var} is set to '{v}', which is not a number. Using the default.");
                None
            },
        },
        Err(_) => None,
    }
}

/// Loads the merchant account roster from `XGE_WHITEBIT_ACCOUNTS`, formatted as comma-separated
/// `name:api_key:api_secret` entries. Malformed entries are skipped with a warning.
pub fn merchant_accounts_from_env() -> Vec<MerchantAccount> {
    let raw = match env::var("XGE_WHITEBIT_ACCOUNTS") {
        Ok(v) => v,
        Err(_) => {
            warn!("⚙️ XGE_WHITEBIT_ACCOUNTS is not set. No merchant accounts are configured.");
            return Vec::new();
        },
    };
    raw.split(',')
        .filter(|entry| !entry.trim().is_empty())
        .filter_map(|entry| {
            let mut parts = entry.trim().splitn(3, ':');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(name), Some(key), Some(secret)) if !name.is_empty() => {
                    Some(MerchantAccount::new(name, AccountKind::Whitebit, key, secret))
                },
                _ => {
                    warn!("⚙️ Skipping malformed merchant account entry '{entry}'");
                    None
                },
            }
        })
        .collect()
}
