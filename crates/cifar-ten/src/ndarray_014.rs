// crates/cifar-ten/src/ndarray_014.rs
// ============================================================================
// Module: CIFAR-Ten ndarray 0.14 Conversions
// Description: Array conversions bound to ndarray 0.14.
// Purpose: Back the `to_ndarray_014` feature.
// Dependencies: ndarray 0.14
// ============================================================================

//! Converts decoded batches into `ndarray` 0.14 arrays.

crate::bridge::ndarray_bridge!(ndarray_014);
