// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod password;
pub mod tokens;

pub use tokens::{Claims, TokenPair, TokenService};
