//! Directive tokens and the closed set of directive kinds.

use std::fmt;

/// Every directive a hop understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    Help,
    Wait,
    Info,
    Header,
    ResponseHeader,
    ForwardHeader,
    Code,
    ResponseSize,
    Size,
    Env,
    Not,
    On,
    If,
    Random,
    Quit,
    Crash,
}

impl DirectiveKind {
    pub const ALL: [DirectiveKind; 16] = [
        DirectiveKind::Help,
        DirectiveKind::Wait,
        DirectiveKind::Info,
        DirectiveKind::Header,
        DirectiveKind::ResponseHeader,
        DirectiveKind::ForwardHeader,
        DirectiveKind::Code,
        DirectiveKind::ResponseSize,
        DirectiveKind::Size,
        DirectiveKind::Env,
        DirectiveKind::Not,
        DirectiveKind::On,
        DirectiveKind::If,
        DirectiveKind::Random,
        DirectiveKind::Quit,
        DirectiveKind::Crash,
    ];

    /// Look up a directive by its path name, including the leading `-`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            DirectiveKind::Help => "-help",
            DirectiveKind::Wait => "-wait",
            DirectiveKind::Info => "-info",
            DirectiveKind::Header => "-header",
            DirectiveKind::ResponseHeader => "-rheader",
            DirectiveKind::ForwardHeader => "-fheader",
            DirectiveKind::Code => "-code",
            DirectiveKind::ResponseSize => "-rsize",
            DirectiveKind::Size => "-size",
            DirectiveKind::Env => "-env",
            DirectiveKind::Not => "-not",
            DirectiveKind::On => "-on",
            DirectiveKind::If => "-if",
            DirectiveKind::Random => "-rnd",
            DirectiveKind::Quit => "-quit",
            DirectiveKind::Crash => "-crash",
        }
    }

    /// Usage form shown by `-help`.
    pub fn usage(self) -> &'static str {
        match self {
            DirectiveKind::Help => "-help",
            DirectiveKind::Wait => "-wait:T",
            DirectiveKind::Info => "-info",
            DirectiveKind::Header => "-header:H=V",
            DirectiveKind::ResponseHeader => "-rheader:H=V",
            DirectiveKind::ForwardHeader => "-fheader:H",
            DirectiveKind::Code => "-code:N",
            DirectiveKind::ResponseSize => "-rsize:B",
            DirectiveKind::Size => "-size:B",
            DirectiveKind::Env => "-env:V",
            DirectiveKind::Not => "-not",
            DirectiveKind::On => "-on:H",
            DirectiveKind::If => "-if:H=V",
            DirectiveKind::Random => "-rnd:P",
            DirectiveKind::Quit => "-quit",
            DirectiveKind::Crash => "-crash",
        }
    }

    pub fn summary(self) -> &'static str {
        match self {
            DirectiveKind::Help => "return help message",
            DirectiveKind::Wait => "wait for T ms before response",
            DirectiveKind::Info => "return some info about the request",
            DirectiveKind::Header => "add header H: V to the following request",
            DirectiveKind::ResponseHeader => "add header H: V to the response",
            DirectiveKind::ForwardHeader => "forward incoming header H to the following request",
            DirectiveKind::Code => "respond with HTTP code N",
            DirectiveKind::ResponseSize => "add B bytes of payload to the response",
            DirectiveKind::Size => "add B bytes of payload to the following query",
            DirectiveKind::Env => "return the value of an environment variable",
            DirectiveKind::Not => "reverts the effect of the next boolean command (if, on, rnd)",
            DirectiveKind::On => "executes next command if the server host name contains substring H",
            DirectiveKind::If => "execute next command if header H contains substring V",
            DirectiveKind::Random => "execute next command with P% probability",
            DirectiveKind::Quit => "stops the server with a nice response",
            DirectiveKind::Crash => "stops the server without a response",
        }
    }
}

/// One `-name[:argument]` path segment, as written.
///
/// The name is kept verbatim; it is resolved to a [`DirectiveKind`] only when
/// executed so unknown names still leave a trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
    pub argument: Option<String>,
}

impl Directive {
    /// Split a segment at its first `:`. The caller guarantees the leading `-`.
    pub fn parse(segment: &str) -> Self {
        match segment.split_once(':') {
            Some((name, argument)) => Self {
                name: name.to_string(),
                argument: Some(argument.to_string()),
            },
            None => Self {
                name: segment.to_string(),
                argument: None,
            },
        }
    }

    pub fn kind(&self) -> Option<DirectiveKind> {
        DirectiveKind::from_name(&self.name)
    }

    pub fn argument(&self) -> &str {
        self.argument.as_deref().unwrap_or_default()
    }
}

/// Renders as `name(argument)`, the form used in trace lines.
impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.argument())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_keeps_extra_colons() {
        let directive = Directive::parse("-header:x-url=http://a:1");
        assert_eq!(directive.name, "-header");
        assert_eq!(directive.argument.as_deref(), Some("x-url=http://a:1"));
        assert_eq!(directive.kind(), Some(DirectiveKind::Header));
    }

    #[test]
    fn bare_and_empty_arguments_differ() {
        assert_eq!(Directive::parse("-code").argument, None);
        assert_eq!(Directive::parse("-code:").argument.as_deref(), Some(""));
    }

    #[test]
    fn display_matches_trace_form() {
        assert_eq!(Directive::parse("-code:500").to_string(), "-code(500)");
        assert_eq!(Directive::parse("-not").to_string(), "-not()");
    }

    #[test]
    fn names_round_trip_through_lookup() {
        for kind in DirectiveKind::ALL {
            assert_eq!(DirectiveKind::from_name(kind.name()), Some(kind));
            assert!(kind.usage().starts_with(kind.name()));
        }
        assert_eq!(DirectiveKind::from_name("-bad"), None);
        assert_eq!(DirectiveKind::from_name("help"), None);
    }
}
