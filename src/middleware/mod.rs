// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (member resolution, security headers).

pub mod member;
pub mod security;

pub use member::{resolve_member, ActiveMember};
