//! Per-request execution state.

use axum::http::StatusCode;

/// What a hop does with the process once its response is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    /// Stop all listeners after this response has been written.
    FinishGracefully,
    /// Terminate now, without waiting for the response.
    TerminateImmediately,
}

/// Result of the relay step, consumed only by the synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelayOutcome {
    /// No hop address in the path.
    #[default]
    NotAttempted,
    /// A hop address was present but a conditional skipped it.
    Skipped,
    /// The next hop answered.
    Succeeded(StatusCode),
    /// The relay could not be built or the call failed.
    Failed,
}

/// An ordered header list with case-insensitive keys.
///
/// Setting an existing name replaces its value in place and keeps the
/// spelling that was used first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(&name)) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<const N: usize> From<[(&str, &str); N]> for HeaderSet {
    fn from(entries: [(&str, &str); N]) -> Self {
        let mut set = HeaderSet::new();
        for (name, value) in entries {
            set.set(name, value);
        }
        set
    }
}

/// Mutable state carried across one request's directives.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// The next directive is logged and not executed.
    pub skip: bool,
    /// The next conditional's result is negated.
    pub invert: bool,
    /// Explicit status from `-code`; 0 means unset.
    pub response_code: u16,
    /// Filler bytes attached to the relay request.
    pub outbound_payload_size: usize,
    pub outbound_headers: HeaderSet,
    pub response_headers: HeaderSet,
    /// Headers copied back from the relay response.
    pub forward_back: Vec<String>,
    /// Echo relay details (set by `-info`).
    pub show_details: bool,
    pub trace: Vec<String>,
    pub deferred_action: Option<LifecycleAction>,
    pub relay: RelayOutcome,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self {
            skip: false,
            invert: false,
            response_code: 0,
            outbound_payload_size: 0,
            outbound_headers: HeaderSet::from([
                ("Content-type", "text/plain"),
                ("Accept-Encoding", "text/plain"),
            ]),
            response_headers: HeaderSet::from([("Content-type", "text/plain")]),
            forward_back: Vec::new(),
            show_details: false,
            trace: Vec::new(),
            deferred_action: None,
            relay: RelayOutcome::NotAttempted,
        }
    }

    pub fn log(&mut self, line: impl Into<String>) {
        self.trace.push(line.into());
    }

    /// Fold a conditional's result into `skip`, consuming `invert`.
    pub fn decide(&mut self, condition: bool) {
        self.skip = !(condition ^ self.invert);
        self.invert = false;
    }

    /// Record a forward-back header once.
    pub fn forward_back_header(&mut self, name: &str) {
        if !self.forward_back.iter().any(|n| n.eq_ignore_ascii_case(name)) {
            self.forward_back.push(name.to_string());
        }
    }

    /// Arm a lifecycle action. Immediate termination always wins.
    pub fn arm(&mut self, action: LifecycleAction) {
        if self.deferred_action != Some(LifecycleAction::TerminateImmediately) {
            self.deferred_action = Some(action);
        }
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_set_is_case_insensitive_and_ordered() {
        let mut headers = HeaderSet::from([("Content-type", "text/plain")]);
        headers.set("X-A", "1");
        headers.set("content-TYPE", "application/json");
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec![("Content-type", "application/json"), ("X-A", "1")]
        );
        assert_eq!(headers.get("x-a"), Some("1"));
        assert_eq!(headers.get("missing"), None);
    }

    #[test]
    fn new_context_has_seeded_headers() {
        let ctx = ExecutionContext::new();
        assert_eq!(ctx.outbound_headers.get("Content-type"), Some("text/plain"));
        assert_eq!(ctx.outbound_headers.get("Accept-Encoding"), Some("text/plain"));
        assert_eq!(ctx.response_headers.len(), 1);
        assert_eq!(ctx.response_code, 0);
        assert_eq!(ctx.relay, RelayOutcome::NotAttempted);
    }

    #[test]
    fn decide_consumes_invert() {
        let mut ctx = ExecutionContext::new();
        ctx.decide(true);
        assert!(!ctx.skip);
        ctx.decide(false);
        assert!(ctx.skip);

        ctx.invert = true;
        ctx.decide(true);
        assert!(ctx.skip);
        assert!(!ctx.invert);

        ctx.invert = true;
        ctx.decide(false);
        assert!(!ctx.skip);
    }

    #[test]
    fn terminate_is_not_downgraded() {
        let mut ctx = ExecutionContext::new();
        ctx.arm(LifecycleAction::FinishGracefully);
        ctx.arm(LifecycleAction::TerminateImmediately);
        ctx.arm(LifecycleAction::FinishGracefully);
        assert_eq!(ctx.deferred_action, Some(LifecycleAction::TerminateImmediately));
    }
}
