// crates/cifar-ten-config/src/lib.rs
// ============================================================================
// Module: CIFAR-Ten Config Library
// Description: Configuration model and validation for cifar-ten.toml.
// Purpose: Single source of truth for how the tools locate and fetch data.
// Dependencies: cifar-ten, serde, toml
// ============================================================================

//! ## Overview
//! `cifar-ten-config` loads `cifar-ten.toml`, validates it fail-closed, and
//! turns it into a [`cifar_ten::Cifar10`] builder.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
