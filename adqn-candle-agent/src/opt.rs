//! Optimizers.
use anyhow::Result;
use candle_core::{backprop::GradStore, Tensor, Var};
use candle_nn::{AdamW, Optimizer as _, ParamsAdamW};
use candle_optimisers::adam::{Adam, ParamsAdam};
use serde::{Deserialize, Serialize};

/// Configuration of optimizer for training the action-value network.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// AdamW optimizer.
    AdamW {
        lr: f64,
        #[serde(default = "default_beta1")]
        beta1: f64,
        #[serde(default = "default_beta2")]
        beta2: f64,
        #[serde(default = "default_eps")]
        eps: f64,
        #[serde(default = "default_weight_decay")]
        weight_decay: f64,
    },

    /// Adam optimizer.
    Adam {
        /// Learning rate.
        lr: f64,
    },
}

fn default_beta1() -> f64 {
    ParamsAdamW::default().beta1
}

fn default_beta2() -> f64 {
    ParamsAdamW::default().beta2
}

fn default_eps() -> f64 {
    ParamsAdamW::default().eps
}

fn default_weight_decay() -> f64 {
    ParamsAdamW::default().weight_decay
}

impl OptimizerConfig {
    /// Constructs an optimizer of the given variables.
    pub fn build(&self, vars: Vec<Var>) -> Result<Optimizer> {
        match &self {
            OptimizerConfig::AdamW {
                lr,
                beta1,
                beta2,
                eps,
                weight_decay,
            } => {
                let params = ParamsAdamW {
                    lr: *lr,
                    beta1: *beta1,
                    beta2: *beta2,
                    eps: *eps,
                    weight_decay: *weight_decay,
                };
                let opt = AdamW::new(vars.clone(), params)?;
                Ok(Optimizer::AdamW(opt, vars))
            }
            OptimizerConfig::Adam { lr } => {
                let params = ParamsAdam {
                    lr: *lr,
                    ..ParamsAdam::default()
                };
                let opt = Adam::new(vars.clone(), params)?;
                Ok(Optimizer::Adam(opt, vars))
            }
        }
    }

    /// Override learning rate.
    pub fn learning_rate(self, lr: f64) -> Self {
        match self {
            Self::AdamW {
                lr: _,
                beta1,
                beta2,
                eps,
                weight_decay,
            } => Self::AdamW {
                lr,
                beta1,
                beta2,
                eps,
                weight_decay,
            },
            Self::Adam { lr: _ } => Self::Adam { lr },
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::Adam { lr: 1e-4 }
    }
}

/// Optimizers, holding the variables they update.
pub enum Optimizer {
    /// AdamW optimizer.
    AdamW(AdamW, Vec<Var>),

    /// Adam optimizer.
    Adam(Adam, Vec<Var>),
}

impl Optimizer {
    fn vars(&self) -> &[Var] {
        match self {
            Self::AdamW(_, vars) => vars,
            Self::Adam(_, vars) => vars,
        }
    }

    /// Updates variables with given gradients.
    pub fn step(&mut self, grads: &GradStore) -> Result<()> {
        match self {
            Self::AdamW(opt, _) => Ok(opt.step(grads)?),
            Self::Adam(opt, _) => Ok(opt.step(grads)?),
        }
    }

    /// Applies a backward step pass after scaling gradients so that their global
    /// L2 norm does not exceed `max_grad_norm`.
    ///
    /// Returns the norm before clipping.
    pub fn clipped_backward_step(&mut self, loss: &Tensor, max_grad_norm: f64) -> Result<f32> {
        let mut grads = loss.backward()?;
        let norm = clip_grad_norm(&mut grads, self.vars(), max_grad_norm)?;
        self.step(&grads)?;
        Ok(norm)
    }
}

/// Scales gradients of `vars` in place so that their global L2 norm is at most `max_norm`.
///
/// Returns the norm before clipping.
pub fn clip_grad_norm(grads: &mut GradStore, vars: &[Var], max_norm: f64) -> Result<f32> {
    let mut sq_sum = 0f32;
    for var in vars.iter() {
        if let Some(g) = grads.get(var.as_tensor()) {
            sq_sum += g.sqr()?.sum_all()?.to_scalar::<f32>()?;
        }
    }
    let norm = sq_sum.sqrt();

    if norm as f64 > max_norm {
        let scale = max_norm / (norm as f64 + 1e-6);
        for var in vars.iter() {
            if let Some(g) = grads.get(var.as_tensor()) {
                let g = (g * scale)?;
                grads.insert(var.as_tensor(), g);
            }
        }
    }

    Ok(norm)
}
