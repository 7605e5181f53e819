//! Token lifecycle engine
//!
//! Type-aware creation with cross-field validation, update with
//! type-conditional field rules, secret regeneration, and destruction.
//! Validation is collected field by field before any store mutation;
//! a failed create or update leaves the store untouched.
//!
//! One asymmetry is deliberate and load-bearing: supplying `scm_token`
//! for a non-workflow kind is a hard validation error at creation but
//! is silently ignored on update (and an empty value on update means
//! "no change", never "clear the field").

use common::Secret;
use tracing::info;
use uuid::Uuid;

use crate::error::{Error, FieldError, Result};
use crate::model::{KNOWN_KINDS, TokenKind, TokenRecord};
use crate::policy::{self, Action};
use crate::resolver::{self, PackageLookup, elide};
use crate::secret;
use crate::store::TokenStore;

/// Caller-supplied fields for token creation. All optional at the type
/// level; validation decides what is required.
#[derive(Debug, Default, Clone)]
pub struct CreateRequest {
    pub kind: Option<String>,
    pub name: Option<String>,
    pub scm_token: Option<String>,
    pub project_name: Option<String>,
    pub package_name: Option<String>,
}

/// Caller-supplied fields for token update.
#[derive(Debug, Default, Clone)]
pub struct UpdateRequest {
    pub name: Option<String>,
    pub scm_token: Option<String>,
}

/// A freshly created token together with its secret plaintext.
///
/// This is the only place (besides [`regenerate`]) where the plaintext
/// exists; callers disclose it once and drop it. Debug is safe to
/// derive: `Secret`'s own Debug prints `[REDACTED]`.
#[derive(Debug)]
pub struct CreatedToken {
    pub token: TokenRecord,
    pub secret: Secret<String>,
}

fn normalize(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Validate and create a token for `owner`, persisting it on success.
///
/// Returns the record plus the secret plaintext for one-time
/// disclosure. On any validation failure no store mutation occurs and
/// the error carries field-level messages.
pub async fn create(
    store: &TokenStore,
    lookup: &dyn PackageLookup,
    owner: &str,
    request: CreateRequest,
) -> Result<CreatedToken> {
    let mut errors: Vec<FieldError> = Vec::new();

    let scm_token = normalize(request.scm_token.as_deref()).map(str::to_string);

    let kind = match normalize(request.kind.as_deref()) {
        None => {
            errors.push(FieldError::new("type", "is required"));
            None
        }
        Some("generic") => Some(TokenKind::Generic),
        Some("workflow") => Some(TokenKind::Workflow {
            scm_token: scm_token.clone(),
        }),
        Some(other) => {
            errors.push(FieldError::new(
                "type",
                format!(
                    "'{}' is not a known token type (expected one of: {})",
                    elide(other),
                    KNOWN_KINDS.join(", ")
                ),
            ));
            None
        }
    };

    // Stricter than update: scm_token on a non-workflow create is a hard
    // rejection, not a silent drop.
    if let Some(kind) = &kind {
        if scm_token.is_some() && !kind.is_workflow() {
            errors.push(FieldError::new(
                "scm_token",
                "is only allowed for workflow tokens",
            ));
        }
    }

    let mut package = None;
    if let Some(kind) = &kind {
        match resolver::resolve(
            lookup,
            kind,
            request.project_name.as_deref(),
            request.package_name.as_deref(),
        ) {
            Ok(resolved) => package = resolved,
            Err(Error::Validation(fields)) => errors.extend(fields),
            Err(not_found) => return Err(not_found),
        }
    }

    if !errors.is_empty() {
        return Err(Error::Validation(errors));
    }
    let kind = kind.ok_or_else(|| Error::field("type", "is required"))?;

    let plaintext = secret::generate();
    let record = TokenRecord {
        id: format!("tok_{}", Uuid::new_v4().as_simple()),
        name: request.name.unwrap_or_default(),
        kind,
        owner: owner.to_string(),
        package,
        secret_hash: secret::hash(plaintext.expose()),
    };

    debug_assert!(
        !(record.kind.is_workflow() && record.package.is_some()),
        "workflow tokens are never package-scoped"
    );

    // The gate runs against the candidate before anything is committed.
    if !policy::permit(owner, Action::Create, &record) {
        return Err(Error::Unauthorized);
    }

    store.insert(record.clone()).await?;
    info!(id = record.id, owner, kind = record.kind.as_str(), "token created");

    Ok(CreatedToken {
        token: record,
        secret: plaintext,
    })
}

/// Apply an update to an existing token and persist it.
///
/// `name` is applied unconditionally when present. `scm_token` is
/// applied only when the token is a workflow token and the value is
/// non-empty; in every other case it is left untouched. The kind,
/// owner, package and secret are never mutated here.
pub async fn update(
    store: &TokenStore,
    token: TokenRecord,
    changes: UpdateRequest,
) -> Result<TokenRecord> {
    let mut record = token;

    if let Some(name) = changes.name {
        record.name = name;
    }

    if let TokenKind::Workflow { scm_token } = &mut record.kind {
        if let Some(value) = normalize(changes.scm_token.as_deref()) {
            *scm_token = Some(value.to_string());
        }
    }

    store.update(record.clone()).await?;
    info!(id = record.id, "token updated");
    Ok(record)
}

/// Replace the token's secret and return the new plaintext for exactly
/// one disclosure. Any previously issued plaintext stops matching the
/// stored hash.
pub async fn regenerate(store: &TokenStore, token: TokenRecord) -> Result<Secret<String>> {
    let mut record = token;
    let plaintext = secret::generate();
    record.secret_hash = secret::hash(plaintext.expose());
    let id = record.id.clone();
    store.update(record).await?;
    info!(id, "token secret regenerated");
    Ok(plaintext)
}

/// Remove the token record entirely. No soft-delete, no cascades.
pub async fn destroy(store: &TokenStore, token: &TokenRecord) -> Result<()> {
    store
        .remove(&token.id)
        .await?
        .ok_or_else(|| Error::TokenNotFound(token.id.clone()))?;
    info!(id = token.id, "token destroyed");
    Ok(())
}
