//! Token lifecycle and authorization engine
//!
//! Issues and manages API access tokens bound to a user, optionally
//! scoped to a package, with a type-polymorphic payload (generic vs.
//! workflow tokens carrying an SCM credential). This crate is a
//! standalone library with no HTTP dependency — the service in
//! `services/token-api` is one consumer.
//!
//! Token flow:
//! 1. A request arrives with an authenticated principal
//! 2. `resolver::resolve()` validates the optional package scope
//! 3. `lifecycle::create()` builds the record and generates the secret
//! 4. `policy::permit()` / `policy::scope()` gate every action
//! 5. `store::TokenStore` persists records (hashes only, never plaintext)

pub mod error;
pub mod lifecycle;
pub mod model;
pub mod policy;
pub mod resolver;
pub mod secret;
pub mod store;

pub use error::{Error, FieldError, Result};
pub use lifecycle::{CreateRequest, CreatedToken, UpdateRequest};
pub use model::{KNOWN_KINDS, PackageRef, TokenKind, TokenRecord};
pub use policy::{Action, permit, scope};
pub use resolver::{PackageDirectory, PackageLookup};
pub use store::TokenStore;
