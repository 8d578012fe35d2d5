//! Chain interpreter subsystem.
//!
//! # Data Flow
//! ```text
//! raw request path
//!     → parser.rs (directives, optional hop address + residual)
//!     → executor.rs (one directive at a time against ExecutionContext)
//!     → relay::RelayClient (unless a conditional skipped the hop)
//!     → synth.rs (status, headers, `| line` body, deferred lifecycle)
//! ```
//!
//! # Design Decisions
//! - One `ExecutionContext` per request, never shared
//! - Errors become trace lines; the chain always yields a response
//! - Host name, environment and random draws come from `env.rs` traits

pub mod context;
pub mod directive;
pub mod env;
pub mod executor;
pub mod help;
pub mod interpreter;
pub mod parser;
pub mod synth;

pub use context::{ExecutionContext, LifecycleAction, RelayOutcome};
pub use directive::{Directive, DirectiveKind};
pub use interpreter::run_chain;
pub use synth::ChainResponse;
