use dotenvy::dotenv;
use exchanger_engine::{
    config::{merchant_accounts_from_env, ReconcilerConfig},
    merchants::StaticMerchant,
    policies::LogOnlyPolicy,
    reconciler::{run_reconciler, Reconciler},
    stores::MemoryRequestStore,
};
use log::*;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    let config = ReconcilerConfig::from_env_or_default();
    let accounts = merchant_accounts_from_env();

    info!("🚀️ Starting exchangerd with {} merchant account(s), cycle interval {:?}", accounts.len(), config.interval);
    // The deployment's merchant integration and persistence layer plug in here. The reference wiring runs the
    // engine against the in-memory store and the canned merchant, which is enough for a dry run.
    let store = MemoryRequestStore::new();
    let merchant = StaticMerchant::empty();
    let reconciler = Reconciler::new(store, merchant, LogOnlyPolicy, accounts, config);

    if let Err(e) = reconciler.check_connectivity().await {
        warn!("🚀️ Merchant connectivity check failed: {e}");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = tokio::spawn(run_reconciler(reconciler, shutdown_rx));

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("🚀️ Shutdown signal received; stopping after the current cycle"),
        Err(e) => error!("🚀️ Could not listen for the shutdown signal: {e}"),
    }
    let _ = shutdown_tx.send(true);
    if let Err(e) = worker.await {
        error!("🚀️ Reconciliation worker did not stop cleanly: {e}");
    }
    println!("Bye!");
}
