//! Reading and writing trained models as safetensors checkpoints.
//!
//! A checkpoint stores the model architecture as a JSON [`ModelSpec`] under the
//! `model_spec` metadata key and the parameters of layer `i` as the `dense_{i}.weight`
//! (`[n, m]`) and `dense_{i}.bias` (`[m]`) `F32` tensors. Any other metadata is handed
//! back to the caller untouched.

use std::collections::HashMap;

use ndarray::{Array2, ArrayView2};
use safetensors::{Dtype, SafeTensors, tensor::TensorView};

use crate::{
    MlErr, Result,
    arch::{Model, Sequential, layers::Layer},
    specs::ModelSpec,
};

pub const MODEL_SPEC_KEY: &str = "model_spec";

/// A trained model together with its parameters.
#[derive(Clone, Debug)]
pub struct Checkpoint {
    spec: ModelSpec,
    model: Sequential,
    params: Vec<f32>,
}

impl Checkpoint {
    /// Creates a new `Checkpoint`.
    ///
    /// # Arguments
    /// * `spec` - The architecture of the model.
    /// * `params` - The parameters of every layer, laid out layer after layer.
    ///
    /// # Returns
    /// A new `Checkpoint` or an error if the spec is invalid or the amount of parameters doesn't
    /// match it.
    pub fn new(spec: ModelSpec, params: Vec<f32>) -> Result<Self> {
        let model = Sequential::from_spec(&spec)?;
        if params.len() != model.size() {
            return Err(MlErr::SizeMismatch {
                what: "checkpoint parameters",
                got: params.len(),
                expected: model.size(),
            });
        }

        Ok(Self {
            spec,
            model,
            params,
        })
    }

    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    pub fn model(&self) -> &Sequential {
        &self.model
    }

    pub fn params(&self) -> &[f32] {
        &self.params
    }

    /// Makes a forward pass with the stored parameters.
    pub fn forward(&self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.model.forward(&self.params, x)
    }

    /// Parses a safetensors buffer.
    ///
    /// # Returns
    /// The checkpoint and the metadata entries other than the model spec.
    pub fn from_safetensors(bytes: &[u8]) -> Result<(Self, HashMap<String, String>)> {
        let mut metadata = read_metadata(bytes)?;

        let raw_spec = metadata
            .remove(MODEL_SPEC_KEY)
            .ok_or(MlErr::MissingMetadata(MODEL_SPEC_KEY))?;
        let spec: ModelSpec = serde_json::from_str(&raw_spec)?;
        let model = Sequential::from_spec(&spec)?;

        let tensors = SafeTensors::deserialize(bytes)?;
        // A corrupt spec may claim more parameters than the buffer holds.
        let mut params = Vec::with_capacity(model.size().min(bytes.len() / size_of::<f32>()));

        for (i, layer) in model.layers().iter().enumerate() {
            let Layer::Dense(dense) = layer;
            let (n, m) = dense.dim();
            read_f32(&tensors, &format!("dense_{i}.weight"), &[n, m], &mut params)?;
            read_f32(&tensors, &format!("dense_{i}.bias"), &[m], &mut params)?;
        }

        Ok((
            Self {
                spec,
                model,
                params,
            },
            metadata,
        ))
    }

    /// Serializes the checkpoint into a safetensors buffer.
    ///
    /// # Arguments
    /// * `metadata` - Extra metadata entries to store along the model spec.
    pub fn to_safetensors(&self, mut metadata: HashMap<String, String>) -> Result<Vec<u8>> {
        metadata.insert(MODEL_SPEC_KEY.to_string(), serde_json::to_string(&self.spec)?);

        let mut buffers = Vec::with_capacity(self.model.layers().len() * 2);
        let mut rest = self.params.as_slice();

        for (i, layer) in self.model.layers().iter().enumerate() {
            let Layer::Dense(dense) = layer;
            let (n, m) = dense.dim();
            let (w, after_w) = rest.split_at(n * m);
            let (b, after_b) = after_w.split_at(m);
            buffers.push((format!("dense_{i}.weight"), vec![n, m], to_le_bytes(w)));
            buffers.push((format!("dense_{i}.bias"), vec![m], to_le_bytes(b)));
            rest = after_b;
        }

        let views = buffers
            .iter()
            .map(|(name, shape, data)| {
                TensorView::new(Dtype::F32, shape.clone(), data).map(|view| (name.clone(), view))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(safetensors::serialize(views, &Some(metadata))?)
    }
}

/// Reads the metadata of a safetensors buffer without touching its tensors.
pub fn read_metadata(bytes: &[u8]) -> Result<HashMap<String, String>> {
    let (_, metadata) = SafeTensors::read_metadata(bytes)?;
    Ok(metadata.metadata().clone().unwrap_or_default())
}

/// Appends the values of the `name` tensor to `out`, checking its dtype and shape.
fn read_f32(tensors: &SafeTensors, name: &str, shape: &[usize], out: &mut Vec<f32>) -> Result<()> {
    let view = tensors
        .tensor(name)
        .map_err(|_| MlErr::MissingTensor(name.to_string()))?;

    if view.dtype() != Dtype::F32 {
        return Err(MlErr::InvalidTensor {
            name: name.to_string(),
            reason: format!("expected F32, got {:?}", view.dtype()),
        });
    }

    if view.shape() != shape {
        return Err(MlErr::InvalidTensor {
            name: name.to_string(),
            reason: format!("expected shape {shape:?}, got {:?}", view.shape()),
        });
    }

    out.extend(
        view.data()
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])),
    );
    Ok(())
}

fn to_le_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::specs::{ActFnSpec, LayerSpec};

    fn spec() -> ModelSpec {
        ModelSpec::Sequential {
            layers: vec![
                LayerSpec::Dense {
                    dim: (2, 2),
                    act_fn: Some(ActFnSpec::Relu),
                },
                LayerSpec::Dense {
                    dim: (2, 1),
                    act_fn: None,
                },
            ],
        }
    }

    fn params() -> Vec<f32> {
        vec![1., 0., 0., -1., 0., 0., 2., 3., 1.]
    }

    #[test]
    fn checkpoint_survives_safetensors() {
        let checkpoint = Checkpoint::new(spec(), params()).unwrap();
        let metadata = HashMap::from([("format_version".to_string(), "1".to_string())]);

        let bytes = checkpoint.to_safetensors(metadata).unwrap();
        let (loaded, metadata) = Checkpoint::from_safetensors(&bytes).unwrap();

        assert_eq!(loaded.spec(), &spec());
        assert_eq!(loaded.params(), params().as_slice());
        assert_eq!(metadata.get("format_version").map(String::as_str), Some("1"));
        assert!(!metadata.contains_key(MODEL_SPEC_KEY));
        assert_eq!(loaded.forward(array![[1., 4.]].view()).unwrap(), array![[3.]]);
    }

    #[test]
    fn new_rejects_wrong_param_count() {
        let err = Checkpoint::new(spec(), vec![0.; 3]).unwrap_err();
        assert!(matches!(
            err,
            MlErr::SizeMismatch {
                got: 3,
                expected: 9,
                ..
            }
        ));
    }

    #[test]
    fn from_safetensors_requires_model_spec() {
        let w = to_le_bytes(&[1.]);
        let view = TensorView::new(Dtype::F32, vec![1, 1], &w).unwrap();
        let bytes = safetensors::serialize([("dense_0.weight", view)], &None).unwrap();

        let err = Checkpoint::from_safetensors(&bytes).unwrap_err();
        assert!(matches!(err, MlErr::MissingMetadata(MODEL_SPEC_KEY)));
    }

    #[test]
    fn from_safetensors_requires_every_tensor() {
        let spec = ModelSpec::Sequential {
            layers: vec![LayerSpec::Dense {
                dim: (1, 1),
                act_fn: None,
            }],
        };
        let metadata = HashMap::from([(
            MODEL_SPEC_KEY.to_string(),
            serde_json::to_string(&spec).unwrap(),
        )]);
        let w = to_le_bytes(&[1.]);
        let view = TensorView::new(Dtype::F32, vec![1, 1], &w).unwrap();
        let bytes = safetensors::serialize([("dense_0.weight", view)], &Some(metadata)).unwrap();

        let err = Checkpoint::from_safetensors(&bytes).unwrap_err();
        assert!(matches!(err, MlErr::MissingTensor(name) if name == "dense_0.bias"));
    }

    #[test]
    fn from_safetensors_rejects_garbage() {
        assert!(matches!(
            Checkpoint::from_safetensors(b"definitely not a checkpoint"),
            Err(MlErr::Safetensors(_))
        ));
    }

    #[test]
    fn from_safetensors_rejects_overflowing_dims() {
        let metadata = HashMap::from([(
            MODEL_SPEC_KEY.to_string(),
            r#"{"sequential":{"layers":[{"dense":{"dim":[18446744073709551615,2],"act_fn":null}}]}}"#
                .to_string(),
        )]);
        let w = to_le_bytes(&[1.]);
        let view = TensorView::new(Dtype::F32, vec![1, 1], &w).unwrap();
        let bytes = safetensors::serialize([("dense_0.weight", view)], &Some(metadata)).unwrap();

        let err = Checkpoint::from_safetensors(&bytes).unwrap_err();
        assert!(matches!(err, MlErr::Overflow(_)), "{err}");
    }

    #[test]
    fn from_safetensors_rejects_huge_but_valid_dims() {
        let spec = ModelSpec::Sequential {
            layers: vec![LayerSpec::Dense {
                dim: (1 << 31, 1 << 31),
                act_fn: None,
            }],
        };
        let metadata = HashMap::from([(
            MODEL_SPEC_KEY.to_string(),
            serde_json::to_string(&spec).unwrap(),
        )]);
        let w = to_le_bytes(&[1.]);
        let view = TensorView::new(Dtype::F32, vec![1, 1], &w).unwrap();
        let bytes = safetensors::serialize([("dense_0.weight", view)], &Some(metadata)).unwrap();

        let err = Checkpoint::from_safetensors(&bytes).unwrap_err();
        assert!(matches!(err, MlErr::InvalidTensor { .. }), "{err}");
    }
}
