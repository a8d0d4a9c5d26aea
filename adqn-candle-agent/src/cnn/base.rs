use super::CnnConfig;
use crate::model::SubModel1;
use anyhow::Result;
use candle_core::{DType::F32, Device, Tensor};
use candle_nn::{conv::Conv2dConfig, conv2d_no_bias, linear, Conv2d, Linear, Module, VarBuilder};

#[allow(clippy::upper_case_acronyms)]
/// Convolutional neural network, which has the same architecture of the DQN paper.
///
/// The input is a batch of `u8` frames with shape `[B, n_stack, 84, 84]`.
pub struct Cnn {
    device: Device,
    c1: Conv2d,
    c2: Conv2d,
    c3: Conv2d,
    l1: Linear,
    l2: Linear,
}

fn stride(s: usize) -> Conv2dConfig {
    Conv2dConfig {
        stride: s,
        ..Default::default()
    }
}

impl SubModel1 for Cnn {
    type Config = CnnConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, x: &Self::Input) -> Result<Tensor> {
        let xs = (x.to_device(&self.device)?.to_dtype(F32)? / 255.0)?;
        let xs = self.c1.forward(&xs)?.relu()?;
        let xs = self.c2.forward(&xs)?.relu()?;
        let xs = self.c3.forward(&xs)?.relu()?.flatten_from(1)?;
        let xs = self.l1.forward(&xs)?.relu()?;
        Ok(self.l2.forward(&xs)?)
    }

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        let device = vb.device().clone();

        Ok(Self {
            device,
            c1: conv2d_no_bias(config.n_stack as _, 32, 8, stride(4), vb.pp("c1"))?,
            c2: conv2d_no_bias(32, 64, 4, stride(2), vb.pp("c2"))?,
            c3: conv2d_no_bias(64, 64, 3, stride(1), vb.pp("c3"))?,
            l1: linear(3136, 512, vb.pp("l1"))?,
            l2: linear(512, config.out_dim as _, vb.pp("l2"))?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use candle_core::DType;
    use candle_nn::VarMap;

    #[test]
    fn test_cnn_output_shape() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let cnn = Cnn::build(vb, CnnConfig::new(4, 3))?;

        let xs = Tensor::zeros((2, 4, 84, 84), DType::U8, &Device::Cpu)?;
        let ys = cnn.forward(&xs)?;
        assert_eq!(ys.dims(), &[2, 3]);
        Ok(())
    }
}
