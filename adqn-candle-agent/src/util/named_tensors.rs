use adqn_core::AdqnError;
use anyhow::{Context, Result};
use candle_core::{Device, Tensor};
use candle_nn::VarMap;
use std::collections::HashMap;

/// Named tensors to send model parameters between threads.
///
/// Tensors are deep copies on CPU, so they are not affected by later updates of
/// the source [`VarMap`]. Cloning shares the copies, which are never mutated.
#[derive(Clone, Debug)]
pub struct NamedTensors {
    pub named_tensors: HashMap<String, Tensor>,
}

impl NamedTensors {
    /// Copy data of [`VarMap`] to CPU.
    pub fn copy_from(vs: &VarMap) -> Result<Self> {
        let src = vs.data().lock().map_err(|_| AdqnError::Poisoned("varmap"))?;
        let named_tensors = src
            .iter()
            .map(|(k, v)| Ok((k.clone(), v.as_tensor().to_device(&Device::Cpu)?.copy()?)))
            .collect::<Result<HashMap<_, _>>>()?;

        Ok(Self { named_tensors })
    }

    /// Copy named tensors to [`VarMap`].
    ///
    /// Every variable of the destination must be found by name.
    pub fn copy_to(&self, vs: &VarMap) -> Result<()> {
        let dest = vs.data().lock().map_err(|_| AdqnError::Poisoned("varmap"))?;
        debug_assert_eq!(self.named_tensors.len(), dest.len());

        for (name, var) in dest.iter() {
            let src = self
                .named_tensors
                .get(name)
                .with_context(|| format!("{} is not found in named tensors", name))?;
            var.set(&src.to_device(var.device())?)?;
        }

        Ok(())
    }
}
