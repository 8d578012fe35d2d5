//! hop: a synthetic call-chain HTTP node.

pub mod chain;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod node;
pub mod observability;
pub mod relay;

pub use chain::run_chain;
pub use config::NodeConfig;
pub use http::HopServer;
pub use lifecycle::Shutdown;
pub use node::Node;
