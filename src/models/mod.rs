// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod category;
pub mod contact;
pub mod test_doc;
pub mod user;

pub use category::{Category, CategoryDocument};
pub use contact::ContactDocument;
pub use test_doc::TestFields;
pub use user::{IdentityClaims, LoginUpdate, NewUser, ProfileUpdate, UserDocument};
