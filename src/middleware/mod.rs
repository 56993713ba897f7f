// SPDX-License-Identifier: MIT

//! Middleware modules (authentication, security, etc.).

pub mod auth;
pub mod security;

pub use auth::{identify, CurrentUser, MaybeUser};
