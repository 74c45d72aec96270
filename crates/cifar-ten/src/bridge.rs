// crates/cifar-ten/src/bridge.rs
// ============================================================================
// Module: CIFAR-Ten ndarray Bridge
// Description: Shared conversion code for every supported ndarray release.
// Purpose: Expose identical array conversions per `to_ndarray_01x` feature.
// Dependencies: ndarray (renamed per release)
// ============================================================================

//! ## Overview
//! [`ndarray_bridge!`] expands to the conversion functions of one
//! `ndarray_01x` module. Each release is a distinct crate, so the functions
//! are generated per crate rather than shared through a trait.

/// Expands conversion functions for the named `ndarray` crate.
macro_rules! ndarray_bridge {
    ($nd:ident) => {
        use $nd::Array2;
        use $nd::Array4;

        use crate::dataset::CifarDataset;
        use crate::dataset::CifarError;
        use crate::dataset::FlatDataset;
        use crate::dataset::FlatSplit;
        use crate::parse::ImageBatch;
        use crate::parse::LabelBatch;

        /// Converts an image batch into a `[records, 3, 32, 32]` array.
        ///
        /// # Errors
        ///
        /// Returns [`CifarError::Shape`] when the pixel count does not match.
        pub fn images(batch: ImageBatch) -> Result<Array4<u8>, CifarError> {
            let [records, channels, height, width] = batch.shape();
            Array4::from_shape_vec((records, channels, height, width), batch.into_pixels())
                .map_err(|err| CifarError::Shape(err.to_string()))
        }

        /// Converts a label batch into a `[records, width]` array.
        ///
        /// # Errors
        ///
        /// Returns [`CifarError::Shape`] when the value count does not match.
        pub fn labels(batch: LabelBatch) -> Result<Array2<u8>, CifarError> {
            let [records, width] = batch.shape();
            Array2::from_shape_vec((records, width), batch.into_values())
                .map_err(|err| CifarError::Shape(err.to_string()))
        }

        /// Converts a flattened split into `(data, labels)` arrays.
        ///
        /// # Errors
        ///
        /// Returns [`CifarError::Shape`] when a row count does not match.
        pub fn flat_split(split: FlatSplit) -> Result<(Array2<f32>, Array2<f32>), CifarError> {
            let [records, columns] = split.data_shape();
            let [_, label_width] = split.label_shape();
            let (data, labels) = split.into_parts();
            let data = Array2::from_shape_vec((records, columns), data)
                .map_err(|err| CifarError::Shape(err.to_string()))?;
            let labels = Array2::from_shape_vec((records, label_width), labels)
                .map_err(|err| CifarError::Shape(err.to_string()))?;
            Ok((data, labels))
        }

        /// Returns `(train data, train labels, test data, test labels)` arrays.
        ///
        /// # Errors
        ///
        /// Returns [`CifarError::Shape`] when a batch shape does not match.
        pub fn arrays(
            dataset: CifarDataset,
        ) -> Result<(Array4<u8>, Array2<u8>, Array4<u8>, Array2<u8>), CifarError> {
            let (train_images, train_labels, test_images, test_labels) = dataset.into_parts();
            Ok((images(train_images)?, labels(train_labels)?, images(test_images)?, labels(test_labels)?))
        }

        /// Returns flattened `(train data, train labels, test data, test labels)` arrays.
        ///
        /// # Errors
        ///
        /// Returns [`CifarError::Shape`] when a split shape does not match.
        pub fn flat_arrays(
            dataset: FlatDataset,
        ) -> Result<(Array2<f32>, Array2<f32>, Array2<f32>, Array2<f32>), CifarError> {
            let (train_data, train_labels) = flat_split(dataset.train)?;
            let (test_data, test_labels) = flat_split(dataset.test)?;
            Ok((train_data, train_labels, test_data, test_labels))
        }
    };
}

pub(crate) use ndarray_bridge;
