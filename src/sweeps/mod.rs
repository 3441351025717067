/// Background sweep loops (SPEC_FULL.md §4.8): long-running tasks started at
/// process startup and cancelled at shutdown via a shared `Notify`.
mod alert_sweep;
mod cartel_sweep;
mod estimate;
mod maintenance_sweep;
mod rug_sweep;

pub use alert_sweep::AlertMatch;
pub use estimate::{estimate_extracted_usd_for_deployer, extraction_rate};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::cartel::CartelBuilder;
use crate::config::{CartelConfig, EventsConfig, SweepConfig};
use crate::logger::{self, LogTag};
use crate::market::MarketClient;
use crate::sol_flow::SolFlowTracer;
use crate::store::EventStore;

const VACUUM_EVERY_N_MAINTENANCE_RUNS: u32 = 4;

pub struct Sweeper {
    store: Arc<EventStore>,
    market: Arc<MarketClient>,
    sol_flow: Arc<SolFlowTracer>,
    cartel: Arc<CartelBuilder>,
    sweep_config: SweepConfig,
    cartel_config: CartelConfig,
    events_config: EventsConfig,
}

impl Sweeper {
    pub fn new(
        store: Arc<EventStore>,
        market: Arc<MarketClient>,
        sol_flow: Arc<SolFlowTracer>,
        cartel: Arc<CartelBuilder>,
        sweep_config: SweepConfig,
        cartel_config: CartelConfig,
        events_config: EventsConfig,
    ) -> Self {
        Self { store, market, sol_flow, cartel, sweep_config, cartel_config, events_config }
    }

    /// Spawns all four sweep loops; each stops when `shutdown` is notified
    /// (SPEC_FULL.md §4.8 "started at service startup and cancelled at
    /// shutdown").
    pub fn start_all(&self, shutdown: Arc<Notify>) -> Vec<JoinHandle<()>> {
        vec![
            self.spawn_rug_sweep(shutdown.clone()),
            self.spawn_cartel_sweep(shutdown.clone()),
            self.spawn_alert_sweep(shutdown.clone()),
            self.spawn_maintenance_sweep(shutdown),
        ]
    }

    fn spawn_rug_sweep(&self, shutdown: Arc<Notify>) -> JoinHandle<()> {
        let store = self.store.clone();
        let market = self.market.clone();
        let sol_flow = self.sol_flow.clone();
        let config = self.sweep_config.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(config.rug_sweep_interval_secs));
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let rugged = rug_sweep::run_once(&store, &market, &sol_flow, &config).await;
                        logger::info(LogTag::Sweep, &format!("rug_sweep: {} tokens rugged this pass", rugged));
                    }
                    _ = shutdown.notified() => break,
                }
            }
        })
    }

    fn spawn_cartel_sweep(&self, shutdown: Arc<Notify>) -> JoinHandle<()> {
        let store = self.store.clone();
        let cartel = self.cartel.clone();
        let sweep_config = self.sweep_config.clone();
        let cartel_config = self.cartel_config.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(sweep_config.cartel_sweep_interval_secs));
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        cartel_sweep::run_once(&store, &cartel, &cartel_config).await;
                    }
                    _ = shutdown.notified() => break,
                }
            }
        })
    }

    fn spawn_alert_sweep(&self, shutdown: Arc<Notify>) -> JoinHandle<()> {
        let store = self.store.clone();
        let config = self.sweep_config.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(config.alert_sweep_interval_secs));
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        // Dispatch is out of scope (SPEC_FULL.md §1 "CLI/bot
                        // layers"); matches are logged so an outer collaborator
                        // can wire its own notifier.
                        let matches = alert_sweep::run_once(&store, &config).await;
                        for alert in &matches {
                            logger::debug(LogTag::Sweep, &format!("alert_sweep: chat {} matched mint {}", alert.chat_id, alert.event.mint));
                        }
                    }
                    _ = shutdown.notified() => break,
                }
            }
        })
    }

    fn spawn_maintenance_sweep(&self, shutdown: Arc<Notify>) -> JoinHandle<()> {
        let store = self.store.clone();
        let config = self.events_config.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(config.maintenance_interval_secs));
            let mut run_count = 0u32;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        run_count += 1;
                        let run_vacuum = run_count % VACUUM_EVERY_N_MAINTENANCE_RUNS == 0;
                        maintenance_sweep::run_once(&store, &config, run_vacuum).await;
                    }
                    _ = shutdown.notified() => break,
                }
            }
        })
    }
}
