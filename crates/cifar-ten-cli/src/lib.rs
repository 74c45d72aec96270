// crates/cifar-ten-cli/src/lib.rs
// ============================================================================
// Module: CIFAR-Ten CLI Library
// Description: Shared helpers for the cifar-ten command-line interface.
// Purpose: Provide the message catalog to the CLI binary and its tests.
// Dependencies: Standard library.
// ============================================================================

//! ## Overview
//! This library houses the CLI message catalog. The binary entry point
//! (`src/main.rs`) routes every user-facing string through [`t!`] so output
//! stays consistent across commands.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Message catalog and formatting helpers.
pub mod i18n;

#[cfg(test)]
mod tests;
