//! Authorization gate
//!
//! Explicit capability checks: every disclosing or mutating action goes
//! through [`permit`] and listing goes through [`scope`]. The principal
//! is always passed in — there is no implicit "current user" anywhere
//! in this crate.
//!
//! Baseline policy: a principal may act on a token only if it is the
//! owner, and a listing contains only the principal's own tokens.

use crate::model::TokenRecord;

/// Actions subject to a per-token permit check. Listing is handled by
/// [`scope`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Edit,
    Create,
    Update,
    Destroy,
}

/// Whether `principal` may perform `action` on `token`.
pub fn permit(principal: &str, action: Action, token: &TokenRecord) -> bool {
    // Owner-only for every action today; the action parameter keeps the
    // call sites honest and leaves room for per-action policy.
    let _ = action;
    token.owner == principal
}

/// Narrow a token list to what `principal` may see, preserving order.
pub fn scope(principal: &str, tokens: Vec<TokenRecord>) -> Vec<TokenRecord> {
    tokens
        .into_iter()
        .filter(|token| token.owner == principal)
        .collect()
}
