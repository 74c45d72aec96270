// crates/cifar-ten-cli/src/tests.rs
// ============================================================================
// Module: CLI Catalog Tests
// Description: Unit tests for the message catalog.
// Purpose: Pin placeholder substitution and missing-key fallback.
// Dependencies: cifar-ten-cli
// ============================================================================

//! ## Overview
//! Catalog lookups must never panic and must substitute every placeholder.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use crate::i18n::MessageArg;
use crate::i18n::translate;

#[test]
fn translate_substitutes_named_placeholders() {
    let message = crate::t!("preview.written", split = "test", index = 4, label = "cat", path = "p.ppm");
    assert_eq!(message, "test record 4: cat (p.ppm)");
}

#[test]
fn translate_falls_back_to_key_for_unknown_entries() {
    assert_eq!(translate("no.such.key", Vec::new()), "no.such.key");
}

#[test]
fn translate_leaves_unmatched_placeholders() {
    let message = translate("config.load_failed", vec![MessageArg::new("other", "x")]);
    assert_eq!(message, "Failed to load config: {error}");
}
