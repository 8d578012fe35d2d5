//! `-help` output.

use crate::chain::context::ExecutionContext;
use crate::chain::directive::DirectiveKind;

const EXAMPLES: [(&str, &str); 3] = [
    (
        "curl -H \"a: b\" hop1/-info",
        "this will call hop1 which will show some details of the request",
    ),
    (
        "curl -H \"a: b\" hop1/-fheader:a/hop2",
        "this will call hop1 which will call hop2 with forwarded header A",
    ),
    (
        "curl hop1/-rnd:50/hop2/hop3/-on:hop2/-code:500",
        "this will call hop1 which will call hop2 or hop3 (50%). hop2 would call hop3 and return error code 500",
    ),
];

/// Directive reference, one line per directive sorted by usage.
pub fn reference() -> Vec<String> {
    let mut kinds = DirectiveKind::ALL.to_vec();
    kinds.sort_by_key(|kind| kind.usage());
    kinds
        .into_iter()
        .map(|kind| format!("{:<13} - {}", kind.usage(), kind.summary()))
        .collect()
}

pub fn append_help(ctx: &mut ExecutionContext) {
    ctx.trace.extend(reference());
    ctx.log("Examples:");
    for (command, explanation) in EXAMPLES {
        ctx.log(command);
        ctx.log(format!("\t{}", explanation));
    }
}
