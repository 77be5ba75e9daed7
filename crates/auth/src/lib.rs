//! Token verification and the authorization guard for laxbot.
//!
//! This crate is the single chokepoint for tenant isolation: every HTTP
//! handler resolves its `Principal` and scope check here before any store
//! access. There is exactly one token-decoding implementation.

pub mod guard;
pub mod token;

pub use guard::AuthGuard;
pub use token::{sign_token, verify_token, TokenClaims};
