// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Social Forum Contributors

//! # Runtime Configuration Constants
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `FORUM_TOKEN_SECRET` | Symmetric signing secret for bearer tokens (min 32 bytes) | Required |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `SEED_ADMIN_USERNAME` | Bootstrap admin account username | Optional |
//! | `SEED_ADMIN_PASSWORD` | Bootstrap admin account password | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

/// Environment variable name for the token signing secret.
///
/// The same secret signs issued tokens and verifies presented ones. A
/// missing or too-short secret is fatal at startup; token operations never
/// fail on key material after that point.
pub const TOKEN_SECRET_ENV: &str = "FORUM_TOKEN_SECRET";

/// Minimum accepted signing secret length in bytes.
pub const MIN_TOKEN_SECRET_LEN: usize = 32;

/// Environment variable name for the server bind address.
pub const HOST_ENV: &str = "HOST";

/// Environment variable name for the server bind port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Environment variable names for the bootstrap admin account.
///
/// When both are set, an `ADMIN` user is created at startup if the username
/// is not already taken.
pub const SEED_ADMIN_USERNAME_ENV: &str = "SEED_ADMIN_USERNAME";
pub const SEED_ADMIN_PASSWORD_ENV: &str = "SEED_ADMIN_PASSWORD";
