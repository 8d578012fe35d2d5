//! Directive execution.
//!
//! Each directive mutates the [`ExecutionContext`] and appends to its trace.
//! Failures never abort the chain: they are recorded as a trace line and the
//! next directive runs.

use axum::http::{HeaderName, HeaderValue, StatusCode};
use std::time::Duration;

use crate::chain::context::{ExecutionContext, LifecycleAction};
use crate::chain::directive::{Directive, DirectiveKind};
use crate::chain::env::{Environment, PercentDice};
use crate::chain::help::append_help;
use crate::chain::parser::percent_decode;
use crate::error::{ArgumentError, ChainError};
use crate::http::request::InboundRequest;

/// The argument, or [`ArgumentError::Missing`] when absent or empty.
fn required(directive: &Directive) -> Result<&str, ArgumentError> {
    match directive.argument.as_deref() {
        None | Some("") => Err(ArgumentError::Missing),
        Some(argument) => Ok(argument),
    }
}

/// Split `H=V`.
fn header_pair(argument: &str) -> Result<(&str, &str), ArgumentError> {
    argument
        .split_once('=')
        .ok_or_else(|| ArgumentError::MissingValue(argument.to_string()))
}

fn non_negative<T: std::str::FromStr>(argument: &str) -> Result<T, ArgumentError> {
    argument.parse().map_err(|_| ArgumentError::Invalid {
        value: argument.to_string(),
        expected: "a non-negative integer",
    })
}

/// Largest padding `-size` and `-rsize` will build.
pub const MAX_PADDING_BYTES: usize = 64 * 1024 * 1024;

fn padding_size(argument: &str) -> Result<usize, ArgumentError> {
    non_negative::<usize>(argument)
        .ok()
        .filter(|bytes| *bytes <= MAX_PADDING_BYTES)
        .ok_or_else(|| ArgumentError::Invalid {
            value: argument.to_string(),
            expected: "a byte count up to 64 MiB",
        })
}

fn status_code(argument: &str) -> Result<StatusCode, ArgumentError> {
    argument
        .parse::<u16>()
        .ok()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .ok_or_else(|| ArgumentError::Invalid {
            value: argument.to_string(),
            expected: "an HTTP status code",
        })
}

/// A header that can go on the wire as written.
fn checked_header(name: &str, value: &str) -> Result<(), ArgumentError> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| ArgumentError::InvalidHeader(name.to_string()))?;
    HeaderValue::from_str(value).map_err(|_| ArgumentError::InvalidHeader(format!("{}: {}", name, value)))?;
    Ok(())
}

/// Decoded `H=V` argument, validated as a header.
fn header_argument(directive: &Directive) -> Result<(String, String), ArgumentError> {
    let (name, raw) = header_pair(required(directive)?)?;
    let value = percent_decode(raw)?.into_owned();
    checked_header(name, &value)?;
    Ok((name.to_string(), value))
}

/// Runs directives for one inbound request.
pub struct Executor<'a> {
    env: &'a dyn Environment,
    dice: &'a dyn PercentDice,
    inbound: &'a InboundRequest,
}

impl<'a> Executor<'a> {
    pub fn new(env: &'a dyn Environment, dice: &'a dyn PercentDice, inbound: &'a InboundRequest) -> Self {
        Self { env, dice, inbound }
    }

    /// Execute one directive, honouring a pending skip.
    pub async fn execute(&self, ctx: &mut ExecutionContext, directive: &Directive) {
        if ctx.skip {
            ctx.log(format!("Skipping {}", directive));
            ctx.skip = false;
            return;
        }

        tracing::debug!(directive = %directive, "Executing directive");
        if let Err(e) = self.step(ctx, directive).await {
            tracing::debug!(directive = %directive, error = %e, "Directive failed");
            ctx.log(format!("Error executing {}: {}", directive, e));
        }
    }

    async fn step(&self, ctx: &mut ExecutionContext, directive: &Directive) -> Result<(), ChainError> {
        let kind = directive.kind().ok_or(ChainError::UnknownDirective)?;

        match kind {
            DirectiveKind::Help => append_help(ctx),
            DirectiveKind::Wait => {
                let millis: u64 = non_negative(required(directive)?)?;
                tokio::time::sleep(Duration::from_millis(millis)).await;
                ctx.log(format!("Waited for {} ms", millis));
            }
            DirectiveKind::Info => {
                ctx.show_details = true;
                ctx.log(format!(
                    "Got {} bytes from {}",
                    self.inbound.body.len,
                    self.inbound.remote()
                ));
                for line in self.inbound.dump() {
                    ctx.log(format!(".\t{}", line));
                }
                if let Some(tls) = &self.inbound.tls {
                    ctx.log(tls.to_string());
                }
            }
            DirectiveKind::Header => {
                let (name, value) = header_argument(directive)?;
                ctx.log(format!("Will add header {}: {}", name, value));
                ctx.outbound_headers.set(name, value);
            }
            DirectiveKind::ResponseHeader => {
                let (name, value) = header_argument(directive)?;
                ctx.log(format!("Will return header {}: {}", name, value));
                ctx.response_headers.set(name, value);
            }
            DirectiveKind::ForwardHeader => {
                let name = required(directive)?;
                let value = self.inbound.header(name);
                checked_header(name, &value)?;
                ctx.log(format!("Will forward header {}: {}", name, value));
                ctx.outbound_headers.set(name, value);
                ctx.forward_back_header(name);
            }
            DirectiveKind::Code => {
                let code = status_code(required(directive)?)?;
                ctx.response_code = code.as_u16();
                ctx.log(format!("Returning code {}", ctx.response_code));
            }
            DirectiveKind::ResponseSize => {
                let bytes = padding_size(required(directive)?)?;
                ctx.log(format!("Appending {} bytes", bytes));
                ctx.log("X".repeat(bytes));
                ctx.log("\n");
            }
            DirectiveKind::Size => {
                let bytes = padding_size(required(directive)?)?;
                ctx.outbound_payload_size = bytes;
                ctx.log(format!("Will add {} bytes to the following request", bytes));
            }
            DirectiveKind::Env => {
                let name = required(directive)?;
                ctx.log(format!("{}={}", name, self.env.var(name)));
            }
            DirectiveKind::Not => ctx.invert = !ctx.invert,
            DirectiveKind::On => {
                let pattern = percent_decode(required(directive)?)?;
                let hostname = self.env.hostname();
                ctx.log(format!("Testing host {} for {}", hostname, pattern));
                ctx.decide(hostname.contains(&*pattern));
            }
            DirectiveKind::If => {
                let (name, raw) = header_pair(required(directive)?)?;
                let pattern = percent_decode(raw)?;
                let on_host = name.eq_ignore_ascii_case("host") && self.inbound.host().contains(&*pattern);
                let in_header = self.inbound.header(name).contains(&*pattern);
                ctx.decide(on_host || in_header);
            }
            DirectiveKind::Random => {
                let argument = required(directive)?;
                let percent: i64 = argument.parse().map_err(|_| ArgumentError::Invalid {
                    value: argument.to_string(),
                    expected: "an integer",
                })?;
                ctx.decide(percent > i64::from(self.dice.roll()));
            }
            DirectiveKind::Quit => {
                ctx.log("Quitting");
                ctx.arm(LifecycleAction::FinishGracefully);
            }
            DirectiveKind::Crash => ctx.arm(LifecycleAction::TerminateImmediately),
        }

        Ok(())
    }
}
