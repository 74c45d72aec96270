// crates/cifar-ten/src/ndarray_015.rs
// ============================================================================
// Module: CIFAR-Ten ndarray 0.15 Conversions
// Description: Array conversions bound to ndarray 0.15.
// Purpose: Back the `to_ndarray_015` feature.
// Dependencies: ndarray 0.15
// ============================================================================

//! Converts decoded batches into `ndarray` 0.15 arrays.

crate::bridge::ndarray_bridge!(ndarray_015);
