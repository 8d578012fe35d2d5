//! Process-level capabilities the interpreter reads from.
//!
//! Kept behind traits so tests can pin the host name, the environment and
//! the random draws.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Mutex;

/// Host name and environment variable lookup.
pub trait Environment: Send + Sync {
    /// This node's own host name.
    fn hostname(&self) -> &str;

    /// Value of an environment variable, empty when unset.
    fn var(&self, name: &str) -> String;
}

/// The real process environment. The host name is read once.
#[derive(Debug, Clone)]
pub struct SystemEnvironment {
    hostname: String,
}

impl SystemEnvironment {
    pub fn new() -> Self {
        let hostname = match hostname::get() {
            Ok(name) => name.to_string_lossy().into_owned(),
            Err(e) => {
                tracing::warn!(error = %e, "Cannot read host name");
                String::new()
            }
        };
        Self { hostname }
    }
}

impl Default for SystemEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SystemEnvironment {
    fn hostname(&self) -> &str {
        &self.hostname
    }

    fn var(&self, name: &str) -> String {
        std::env::var(name).unwrap_or_default()
    }
}

/// A fixed environment.
#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment {
    pub hostname: String,
    pub vars: HashMap<String, String>,
}

impl StaticEnvironment {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            vars: HashMap::new(),
        }
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl Environment for StaticEnvironment {
    fn hostname(&self) -> &str {
        &self.hostname
    }

    fn var(&self, name: &str) -> String {
        self.vars.get(name).cloned().unwrap_or_default()
    }
}

/// Uniform draws in `[0, 100)` for `-rnd`.
pub trait PercentDice: Send + Sync {
    fn roll(&self) -> u32;
}

/// Draws from the calling thread's RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadDice;

impl PercentDice for ThreadDice {
    fn roll(&self) -> u32 {
        rand::thread_rng().gen_range(0..100)
    }
}

/// One seeded generator shared by every request.
///
/// Sequences are reproducible only as far as request ordering is.
#[derive(Debug)]
pub struct SeededDice {
    rng: Mutex<StdRng>,
}

impl SeededDice {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl PercentDice for SeededDice {
    fn roll(&self) -> u32 {
        let mut rng = match self.rng.lock() {
            Ok(rng) => rng,
            Err(poisoned) => poisoned.into_inner(),
        };
        rng.gen_range(0..100)
    }
}

/// Always returns the same value.
#[derive(Debug, Clone, Copy)]
pub struct FixedDice(pub u32);

impl PercentDice for FixedDice {
    fn roll(&self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_dice_is_reproducible() {
        let a = SeededDice::new(13);
        let b = SeededDice::new(13);
        let first: Vec<u32> = (0..20).map(|_| a.roll()).collect();
        let second: Vec<u32> = (0..20).map(|_| b.roll()).collect();
        assert_eq!(first, second);
        assert!(first.iter().all(|&draw| draw < 100));
    }

    #[test]
    fn thread_dice_stays_in_range() {
        assert!((0..200).map(|_| ThreadDice.roll()).all(|draw| draw < 100));
    }

    #[test]
    fn static_environment_defaults_to_empty() {
        let env = StaticEnvironment::new("hop1").with_var("ZONE", "eu");
        assert_eq!(env.hostname(), "hop1");
        assert_eq!(env.var("ZONE"), "eu");
        assert_eq!(env.var("UNSET"), "");
    }
}
