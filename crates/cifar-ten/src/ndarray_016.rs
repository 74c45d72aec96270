// crates/cifar-ten/src/ndarray_016.rs
// ============================================================================
// Module: CIFAR-Ten ndarray 0.16 Conversions
// Description: Array conversions bound to ndarray 0.16.
// Purpose: Back the `to_ndarray_016` feature.
// Dependencies: ndarray 0.16
// ============================================================================

//! Converts decoded batches into `ndarray` 0.16 arrays.

crate::bridge::ndarray_bridge!(ndarray_016);
