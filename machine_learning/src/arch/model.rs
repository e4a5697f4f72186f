use ndarray::{Array2, ArrayView2};

use crate::error::Result;

pub trait Model {
    /// Returns the amount of parameters in the model.
    fn size(&self) -> usize;

    /// Returns the amount of features a single input row must have.
    fn input_size(&self) -> usize;

    /// Returns the amount of values the model outputs per input row.
    fn output_size(&self) -> usize;

    /// Makes a forward pass through the model.
    ///
    /// # Arguments
    /// * `params` - The model's parameters, laid out layer after layer.
    /// * `x` - The input data, one row per sample.
    ///
    /// # Returns
    /// The prediction for every row or an error if the shapes don't line up.
    fn forward(&self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>>;
}
