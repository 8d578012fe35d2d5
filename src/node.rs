//! The hop node: every capability a request may use, built once at startup
//! and shared read-only by all requests.

use std::sync::Arc;

use crate::chain::env::{Environment, PercentDice, SeededDice, SystemEnvironment, ThreadDice};
use crate::config::NodeConfig;
use crate::lifecycle::{NoopShutdown, ShutdownCoordinator};
use crate::relay::RelayClient;

#[derive(Clone)]
pub struct Node {
    pub env: Arc<dyn Environment>,
    pub dice: Arc<dyn PercentDice>,
    pub relay: RelayClient,
    pub lifecycle: Arc<dyn ShutdownCoordinator>,
}

impl Node {
    /// A node on the real environment with unseeded dice and no lifecycle.
    pub fn new(relay: RelayClient) -> Self {
        Self {
            env: Arc::new(SystemEnvironment::new()),
            dice: Arc::new(ThreadDice),
            relay,
            lifecycle: Arc::new(NoopShutdown),
        }
    }

    pub fn from_config(config: &NodeConfig, relay: RelayClient, lifecycle: Arc<dyn ShutdownCoordinator>) -> Self {
        let node = Self::new(relay).with_lifecycle(lifecycle);
        match config.chain.seed {
            Some(seed) => {
                tracing::info!(seed, "Using seeded random draws");
                node.with_dice(Arc::new(SeededDice::new(seed)))
            }
            None => node,
        }
    }

    pub fn with_env(mut self, env: Arc<dyn Environment>) -> Self {
        self.env = env;
        self
    }

    pub fn with_dice(mut self, dice: Arc<dyn PercentDice>) -> Self {
        self.dice = dice;
        self
    }

    pub fn with_lifecycle(mut self, lifecycle: Arc<dyn ShutdownCoordinator>) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    pub fn hostname(&self) -> &str {
        self.env.hostname()
    }
}
