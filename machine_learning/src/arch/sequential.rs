use ndarray::{Array2, ArrayView2};

use super::{Model, layers::Layer};
use crate::{MlErr, Result, specs::ModelSpec};

/// A sequential model: information flows forward through its layers, the output of each one
/// being the input of the next.
#[derive(Clone, Debug)]
pub struct Sequential {
    layers: Vec<Layer>,
    size: usize,
}

impl Sequential {
    /// Creates a new `Sequential`.
    ///
    /// # Arguments
    /// * `layers` - The layers the sequential is composed of.
    ///
    /// # Returns
    /// A new `Sequential` instance or an error if the layers are empty, their dimensions don't
    /// chain or their total amount of parameters overflows.
    pub fn new<I>(layers: I) -> Result<Self>
    where
        I: IntoIterator<Item = Layer>,
    {
        let layers: Vec<_> = layers.into_iter().collect();
        if layers.is_empty() {
            return Err(MlErr::EmptyModel);
        }

        for (i, pair) in layers.windows(2).enumerate() {
            let (_, prev_m) = pair[0].dim();
            let (curr_n, _) = pair[1].dim();
            if prev_m != curr_n {
                return Err(MlErr::LayerChain {
                    layer: i + 1,
                    got: curr_n,
                    expected: prev_m,
                });
            }
        }

        let size = layers
            .iter()
            .try_fold(0usize, |acc, layer| acc.checked_add(layer.size()))
            .ok_or(MlErr::Overflow("model size"))?;

        Ok(Self { layers, size })
    }

    /// Builds the model described by `spec`.
    pub fn from_spec(spec: &ModelSpec) -> Result<Self> {
        match spec {
            ModelSpec::Sequential { layers } => {
                let layers = layers
                    .iter()
                    .copied()
                    .map(Layer::try_from)
                    .collect::<Result<Vec<_>>>()?;
                Self::new(layers)
            }
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }
}

impl Model for Sequential {
    fn size(&self) -> usize {
        self.size
    }

    fn input_size(&self) -> usize {
        self.layers.first().map_or(0, |layer| layer.dim().0)
    }

    fn output_size(&self) -> usize {
        self.layers.last().map_or(0, |layer| layer.dim().1)
    }

    fn forward(&self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        if params.len() != self.size() {
            return Err(MlErr::SizeMismatch {
                what: "model parameters",
                got: params.len(),
                expected: self.size(),
            });
        }

        let mut rest = params;
        let mut a = x.to_owned();

        for layer in &self.layers {
            let (front, back) = rest.split_at(layer.size());
            a = layer.forward(front, a.view())?;
            rest = back;
        }

        Ok(a)
    }
}
