//! Generated identifiers

use anyhow::Context;
use bech32::{Bech32m, Hrp};
use uuid7::uuid7;

/// Human-readable part of user ids.
pub const USER_KIND: &str = "user";

/// A fresh user id, `user1…`.
pub fn new_user_id() -> anyhow::Result<String> {
    new_bech32_id(USER_KIND)
}

// uuid7 so ids sort by creation time, bech32m so they carry a readable kind
pub fn new_bech32_id(kind: &str) -> anyhow::Result<String> {
    let hrp = Hrp::parse(kind).with_context(|| format!("invalid id kind {kind:?}"))?;
    bech32::encode::<Bech32m>(hrp, uuid7().as_bytes()).context("failed to encode id")
}
