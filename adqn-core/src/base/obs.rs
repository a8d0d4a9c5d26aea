//! Pixel observation.
use crate::error::AdqnError;

/// A stack of `u8` frames with shape `[C, H, W]`, stored as a flat buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct Obs {
    shape: [usize; 3],
    data: Vec<u8>,
}

impl Obs {
    /// Creates an observation, checking that `data` has `C * H * W` elements.
    pub fn new(shape: [usize; 3], data: Vec<u8>) -> Result<Self, AdqnError> {
        let n = shape.iter().product::<usize>();
        if n != data.len() {
            return Err(AdqnError::ObsShape {
                expected: shape.to_vec(),
                actual: vec![data.len()],
            });
        }
        Ok(Self { shape, data })
    }

    /// Creates an observation filled with zeros.
    pub fn zeros(shape: [usize; 3]) -> Self {
        Self {
            shape,
            data: vec![0; shape.iter().product()],
        }
    }

    /// Shape `[C, H, W]`.
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// The flat pixel buffer in `C, H, W` order.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// The number of pixels.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the observation holds no pixels.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_new_checks_length() {
        assert!(Obs::new([2, 3, 4], vec![0; 24]).is_ok());
        assert!(matches!(
            Obs::new([2, 3, 4], vec![0; 23]),
            Err(AdqnError::ObsShape { .. })
        ));
    }
}
