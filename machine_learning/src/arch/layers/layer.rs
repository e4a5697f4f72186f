use ndarray::{Array2, ArrayView2};

use super::Dense;
use crate::{
    MlErr, Result,
    arch::activations::ActFn,
    specs::LayerSpec,
};

#[derive(Clone, Debug)]
pub enum Layer {
    Dense(Dense),
}
use Layer::*;

impl Layer {
    pub fn dense(dim: (usize, usize), act_fn: Option<ActFn>) -> Result<Self> {
        self::Dense::new(dim, act_fn).map(Self::Dense)
    }

    pub fn size(&self) -> usize {
        match self {
            Dense(l) => l.size(),
        }
    }

    /// Returns the amount of inputs and outputs of the layer.
    pub fn dim(&self) -> (usize, usize) {
        match self {
            Dense(l) => l.dim(),
        }
    }

    pub fn forward(&self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        match self {
            Dense(l) => l.forward(params, x),
        }
    }
}

impl TryFrom<LayerSpec> for Layer {
    type Error = MlErr;

    fn try_from(spec: LayerSpec) -> Result<Self> {
        match spec {
            LayerSpec::Dense { dim, act_fn } => Self::dense(dim, act_fn.map(ActFn::from)),
        }
    }
}
