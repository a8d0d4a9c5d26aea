//! Utilities.
use adqn_core::AdqnError;
use anyhow::{Context, Result};
use candle_nn::VarMap;
use log::trace;
mod named_tensors;
pub use named_tensors::NamedTensors;

/// Apply soft update on variables.
///
/// Variables are identified by their names.
///
/// dest = tau * src + (1.0 - tau) * dest
pub fn track(dest: &VarMap, src: &VarMap, tau: f64) -> Result<()> {
    trace!("dest");
    let dest = dest.data().lock().map_err(|_| AdqnError::Poisoned("varmap"))?;
    trace!("src");
    let src = src.data().lock().map_err(|_| AdqnError::Poisoned("varmap"))?;

    for (k_dest, v_dest) in dest.iter() {
        let v_src = src
            .get(k_dest)
            .with_context(|| format!("{} is not found in the source", k_dest))?;
        let t_src = v_src.as_tensor();
        let t_dest = v_dest.as_tensor();
        let t_dest = ((tau * t_src)? + ((1.0 - tau) * t_dest)?)?;
        v_dest.set(&t_dest)?;
    }

    Ok(())
}

/// Interface for handling output dimensions.
pub trait OutDim {
    /// Returns the output dimension.
    fn get_out_dim(&self) -> i64;
}
