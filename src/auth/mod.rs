// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Social Forum Contributors

//! # Authentication & Authorization Module
//!
//! Stateless bearer-token authentication for the forum API.
//!
//! ## Auth Flow
//!
//! 1. Client registers or logs in and receives a signed bearer token
//! 2. Client sends `Authorization: Bearer <token>` on every request
//! 3. The [`gate::AuthenticationGate`]:
//!    - Verifies the token signature and expiry via [`token::TokenCodec`]
//!    - Confirms the subject still exists in the user store
//!    - Produces a [`Principal`] for the request, or none
//! 4. The [`policy::AccessPolicy`] evaluates the route's access rule
//!    before any handler runs; ownership checks happen in handlers once
//!    the target entity is loaded
//!
//! ## Security
//!
//! - Identity is reconstructed fresh on every request; no server-side
//!   session state
//! - Tokens are HMAC-signed (HS256) with a server-held secret and expire
//!   24 hours after issuance
//! - A valid token for a since-deleted user does not authenticate
//! - Raw token values never appear in logs

pub mod claims;
pub mod error;
pub mod gate;
pub mod middleware;
pub mod policy;
pub mod roles;
pub mod token;

pub use claims::{Claims, Principal};
pub use error::AuthError;
pub use gate::{Authentication, AuthenticationGate};
pub use middleware::{AdminOnly, Auth, OptionalAuth};
pub use policy::{AccessPolicy, Decision, Requirement};
pub use roles::Role;
pub use token::{TokenCodec, TokenError};
