// crates/cifar-ten/tests/ndarray_bridge.rs
// ============================================================================
// Module: ndarray Bridge Tests
// Description: Array conversions for each enabled `to_ndarray_01x` feature.
// Purpose: Validate array shapes and element placement per ndarray release.
// Dependencies: cifar-ten, tempfile
// ============================================================================

//! ## Overview
//! One module per feature; with no features enabled this file builds empty.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::float_cmp,
    dead_code,
    unused_imports,
    unused_macros,
    missing_docs
)]

mod common;

macro_rules! bridge_tests {
    ($module:ident, $feature:literal) => {
        #[cfg(feature = $feature)]
        mod $module {
            use cifar_ten::$module::arrays;
            use cifar_ten::$module::flat_arrays;
            use cifar_ten::$module::images;
            use tempfile::TempDir;

            use crate::common::pixel_value;
            use crate::common::small_layout;

            #[test]
            fn arrays_keep_record_layout() {
                let dir = TempDir::new().unwrap();
                let dataset = small_layout(dir.path()).build().unwrap();

                let (train_x, train_y, test_x, test_y) = arrays(dataset).unwrap();

                assert_eq!(train_x.shape(), &[5, 3, 32, 32]);
                assert_eq!(train_y.shape(), &[5, 10]);
                assert_eq!(test_x.shape(), &[2, 3, 32, 32]);
                assert_eq!(test_y.shape(), &[2, 10]);
                assert_eq!(train_x[[4, 2, 1, 3]], pixel_value(4, 2, 32 + 3));
                assert_eq!(train_y[[3, 9]], 1);
                assert_eq!(test_y[[1, 8]], 1);
            }

            #[test]
            fn flat_arrays_use_row_per_record() {
                let dir = TempDir::new().unwrap();
                let flat = small_layout(dir.path()).build_as_flat_f32().unwrap();

                let (train_x, train_y, test_x, test_y) = flat_arrays(flat).unwrap();

                assert_eq!(train_x.shape(), &[5, 3072]);
                assert_eq!(train_y.shape(), &[5, 10]);
                assert_eq!(test_x.shape(), &[2, 3072]);
                assert_eq!(test_y[[0, 3]], 1.0);
                assert_eq!(train_x[[1, 0]], f32::from(pixel_value(1, 0, 0)) / 256.0);
            }

            #[test]
            fn index_labels_become_single_column() {
                let dir = TempDir::new().unwrap();
                let dataset = small_layout(dir.path()).encode_one_hot(false).build().unwrap();

                let (_, train_y, _, _) = arrays(dataset.clone()).unwrap();
                let test_x = images(dataset.test.images).unwrap();

                assert_eq!(train_y.shape(), &[5, 1]);
                assert_eq!(train_y[[3, 0]], 9);
                assert_eq!(test_x.dim(), (2, 3, 32, 32));
            }
        }
    };
}

bridge_tests!(ndarray_013, "to_ndarray_013");
bridge_tests!(ndarray_014, "to_ndarray_014");
bridge_tests!(ndarray_015, "to_ndarray_015");
bridge_tests!(ndarray_016, "to_ndarray_016");
