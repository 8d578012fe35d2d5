//! Path tokenization.
//!
//! A request path is read as zero or more directive segments followed by an
//! optional hop address; whatever follows the hop address is the residual
//! path handed to the next hop untouched.
//!
//! ```text
//! /-wait:10/-header:a=b/hop2%3A8080/-code:500/hop3
//!  └──── directives ───┘└── hop ──┘└─ residual ──┘
//! ```

use std::borrow::Cow;

use crate::chain::directive::Directive;
use crate::error::ArgumentError;

/// The next hop and the rest of the chain it should run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopAddress {
    /// Raw segment, still percent-encoded.
    pub address: String,
    /// Raw remainder of the path after the hop segment (no leading `/`).
    pub residual: String,
}

/// The token stream for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainTokens {
    pub directives: Vec<Directive>,
    pub hop: Option<HopAddress>,
}

/// Tokenize a raw request path. Never fails.
pub fn parse_path(path: &str) -> ChainTokens {
    let mut rest = path.strip_prefix('/').unwrap_or(path);
    let mut tokens = ChainTokens::default();

    loop {
        let (segment, remainder) = match rest.split_once('/') {
            Some((segment, remainder)) => (segment, remainder),
            None => (rest, ""),
        };

        if segment.starts_with('-') {
            tokens.directives.push(Directive::parse(segment));
            rest = remainder;
            if rest.is_empty() {
                break;
            }
            continue;
        }

        if !segment.is_empty() {
            tokens.hop = Some(HopAddress {
                address: segment.to_string(),
                residual: remainder.to_string(),
            });
        }
        break;
    }

    tokens
}

/// Strict percent-decoding: every `%` must start a two-digit hex escape and
/// the result must be UTF-8.
pub fn percent_decode(raw: &str) -> Result<Cow<'_, str>, ArgumentError> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3);
            match escape {
                Some([hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => i += 3,
                _ => return Err(ArgumentError::BadEncoding(raw.to_string())),
            }
        } else {
            i += 1;
        }
    }
    urlencoding::decode(raw).map_err(|_| ArgumentError::BadEncoding(raw.to_string()))
}
