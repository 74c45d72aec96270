// crates/cifar-ten/src/ndarray_013.rs
// ============================================================================
// Module: CIFAR-Ten ndarray 0.13 Conversions
// Description: Array conversions bound to ndarray 0.13.
// Purpose: Back the `to_ndarray_013` feature.
// Dependencies: ndarray 0.13
// ============================================================================

//! Converts decoded batches into `ndarray` 0.13 arrays.

crate::bridge::ndarray_bridge!(ndarray_013);
