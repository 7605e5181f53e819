//! Token data model
//!
//! A token is an opaque credential owned by exactly one user, optionally
//! scoped to a package, with a type-specific payload. The type set is a
//! closed tagged variant: per-type field rules are pattern matches over
//! `TokenKind`, not a class hierarchy.
//!
//! The store persists `secret_hash` (a SHA-256 digest of the plaintext),
//! never the plaintext itself. The plaintext exists only in the return
//! value of create/regenerate and is disclosed exactly once.

use serde::{Deserialize, Serialize};

/// The closed set of token types.
///
/// Serialized internally tagged as `type`, so records round-trip as
/// `{"type":"generic",...}` / `{"type":"workflow","scm_token":...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TokenKind {
    /// Plain API token with no extra payload.
    Generic,
    /// Workflow token carrying an auxiliary source-control credential.
    /// Never package-scoped.
    Workflow {
        #[serde(skip_serializing_if = "Option::is_none")]
        scm_token: Option<String>,
    },
}

/// Request-side names of the known kinds, used for validation messages
/// and the blank-form metadata endpoint.
pub const KNOWN_KINDS: &[&str] = &["generic", "workflow"];

impl TokenKind {
    /// The wire name of this kind (matches the serde tag).
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Generic => "generic",
            TokenKind::Workflow { .. } => "workflow",
        }
    }

    pub fn is_workflow(&self) -> bool {
        matches!(self, TokenKind::Workflow { .. })
    }
}

/// A validated reference to a package inside a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRef {
    pub project: String,
    pub package: String,
}

/// A stored token. `id`, `kind`, `owner` and `package` are immutable
/// after creation; `name` is mutable; `secret_hash` changes only through
/// regeneration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: TokenKind,
    pub owner: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub package: Option<PackageRef>,
    /// base64url(SHA-256(plaintext)) — the plaintext is never stored.
    pub secret_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_with_type_tag() {
        let generic = serde_json::to_value(TokenKind::Generic).unwrap();
        assert_eq!(generic["type"], "generic");

        let workflow = serde_json::to_value(TokenKind::Workflow {
            scm_token: Some("scm_abc".into()),
        })
        .unwrap();
        assert_eq!(workflow["type"], "workflow");
        assert_eq!(workflow["scm_token"], "scm_abc");
    }

    #[test]
    fn workflow_without_scm_token_omits_field() {
        let value = serde_json::to_value(TokenKind::Workflow { scm_token: None }).unwrap();
        assert_eq!(value["type"], "workflow");
        assert!(value.get("scm_token").is_none());
    }

    #[test]
    fn record_roundtrips_through_json() {
        let record = TokenRecord {
            id: "tok_1".into(),
            name: "ci".into(),
            kind: TokenKind::Generic,
            owner: "alice".into(),
            package: Some(PackageRef {
                project: "devel:tools".into(),
                package: "hello".into(),
            }),
            secret_hash: "aGFzaA".into(),
        };
        let json = serde_json::to_string(&record).unwrap();
        let parsed: TokenRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn record_without_package_omits_field() {
        let record = TokenRecord {
            id: "tok_2".into(),
            name: "wf".into(),
            kind: TokenKind::Workflow { scm_token: None },
            owner: "alice".into(),
            package: None,
            secret_hash: "aGFzaA".into(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("package").is_none());
        assert_eq!(value["type"], "workflow");
    }

    #[test]
    fn kind_names_match_known_kinds() {
        assert!(KNOWN_KINDS.contains(&TokenKind::Generic.as_str()));
        assert!(KNOWN_KINDS.contains(&TokenKind::Workflow { scm_token: None }.as_str()));
    }
}
