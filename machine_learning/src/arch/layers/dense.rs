use ndarray::prelude::*;

use crate::{MlErr, Result, arch::activations::ActFn};

/// A fully connected layer, `a = act_fn(x · w + b)`.
///
/// The layer owns no parameters, it views the slice it is handed on every forward pass as a
/// row-major `(n, m)` weight matrix followed by `m` biases.
#[derive(Clone, Debug)]
pub struct Dense {
    dim: (usize, usize),
    act_fn: Option<ActFn>,
    size: usize,
}

impl Dense {
    /// Creates a new `Dense` layer.
    ///
    /// # Arguments
    /// * `dim` - The amount of inputs and outputs of the layer.
    /// * `act_fn` - An optional activation function applied to the weighted sums.
    ///
    /// # Returns
    /// A new `Dense` layer or an error if its amount of parameters overflows.
    pub fn new(dim: (usize, usize), act_fn: Option<ActFn>) -> Result<Self> {
        let size = dim
            .0
            .checked_add(1)
            .and_then(|n| n.checked_mul(dim.1))
            .ok_or(MlErr::Overflow("dense layer size"))?;

        Ok(Self { dim, act_fn, size })
    }

    /// Returns the size of this layer.
    ///
    /// # Returns
    /// The amount of parameters this layer has.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn dim(&self) -> (usize, usize) {
        self.dim
    }

    /// Makes a forward pass through the layer.
    ///
    /// # Arguments
    /// * `params` - The parameters of this layer.
    /// * `x` - A batch of inputs, one row per sample.
    ///
    /// # Returns
    /// The activations of the layer or an error if the shapes don't line up.
    pub fn forward(&self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        if x.ncols() != self.dim.0 {
            return Err(MlErr::SizeMismatch {
                what: "dense layer inputs",
                got: x.ncols(),
                expected: self.dim.0,
            });
        }

        let (w, b) = self.view_params(params)?;
        let mut z = x.dot(&w);
        z += &b;

        if let Some(act_fn) = &self.act_fn {
            z.mapv_inplace(|z| act_fn.f(z));
        }

        Ok(z)
    }

    /// Gives a view of the raw parameter slice as the weights and biases of this layer.
    ///
    /// # Arguments
    /// * `params` - A slice of parameters.
    ///
    /// # Returns
    /// A tuple containing the weights and biases.
    fn view_params<'a>(
        &self,
        params: &'a [f32],
    ) -> Result<(ArrayView2<'a, f32>, ArrayView1<'a, f32>)> {
        let mismatch = || MlErr::SizeMismatch {
            what: "dense layer parameters",
            got: params.len(),
            expected: self.size,
        };

        if params.len() != self.size {
            return Err(mismatch());
        }

        let w_size = self.size - self.dim.1;
        let weights = ArrayView2::from_shape(self.dim, &params[..w_size]).map_err(|_| mismatch())?;
        let biases = ArrayView1::from_shape(self.dim.1, &params[w_size..]).map_err(|_| mismatch())?;
        Ok((weights, biases))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_computes_affine_map() {
        // w = [[1, 2], [3, 4]], b = [0.5, -1]
        let params = [1., 2., 3., 4., 0.5, -1.];
        let layer = Dense::new((2, 2), None).unwrap();
        let x = array![[1., 1.]];

        let a = layer.forward(&params, x.view()).unwrap();
        assert_eq!(a, array![[4.5, 5.]]);
    }

    #[test]
    fn forward_applies_activation() {
        let params = [1., -1., 0., 0.];
        let layer = Dense::new((1, 2), Some(ActFn::relu())).unwrap();
        let x = array![[2.]];

        let a = layer.forward(&params, x.view()).unwrap();
        assert_eq!(a, array![[2., 0.]]);
    }

    #[test]
    fn forward_rejects_wrong_input_width() {
        let layer = Dense::new((3, 1), None).unwrap();
        let x = array![[1., 2.]];

        let err = layer.forward(&[0.; 4], x.view()).unwrap_err();
        assert!(matches!(
            err,
            MlErr::SizeMismatch {
                got: 2,
                expected: 3,
                ..
            }
        ));
    }

    #[test]
    fn forward_rejects_wrong_param_count() {
        let layer = Dense::new((2, 1), None).unwrap();
        let x = array![[1., 2.]];

        assert!(layer.forward(&[0.; 2], x.view()).is_err());
    }

    #[test]
    fn new_rejects_overflowing_dims() {
        let err = Dense::new((usize::MAX, 2), None).unwrap_err();
        assert!(matches!(err, MlErr::Overflow(_)));

        assert!(Dense::new((usize::MAX / 2, 4), None).is_err());
    }
}
