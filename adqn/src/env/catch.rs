//! Catch, a pixel game where a paddle catches a falling ball.
use adqn_core::{ActionSpace, Env, Obs, Step};
use anyhow::Result;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Configuration of [`CatchEnv`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct CatchConfig {
    /// The number of cells of each side of the square board.
    pub grid: usize,

    /// Side length of a cell in pixels.
    pub scale: usize,

    /// The number of stacked frames.
    pub n_stack: usize,

    /// Width of the paddle in cells.
    pub paddle_width: usize,
}

impl Default for CatchConfig {
    /// 84x84 frames stacked 4 times.
    fn default() -> Self {
        Self {
            grid: 12,
            scale: 7,
            n_stack: 4,
            paddle_width: 1,
        }
    }
}

impl CatchConfig {
    /// 12x12 single frames.
    pub fn small() -> Self {
        Self {
            scale: 1,
            n_stack: 1,
            ..Self::default()
        }
    }

    /// Shape `[C, H, W]` of observations.
    pub fn obs_shape(&self) -> [usize; 3] {
        let side = self.grid * self.scale;
        [self.n_stack, side, side]
    }
}

/// A ball falls one row per step from a random column of the top row.
///
/// Actions are `0` (left), `1` (stay) and `2` (right). The episode ends when the
/// ball reaches the bottom row, with reward `1` if the paddle is under it and `-1`
/// otherwise.
pub struct CatchEnv {
    config: CatchConfig,
    rng: SmallRng,
    ball: (usize, usize),
    paddle: usize,
    frames: VecDeque<Vec<u8>>,
}

impl CatchEnv {
    fn render(&self) -> Vec<u8> {
        let CatchConfig { grid, scale, .. } = self.config;
        let side = grid * scale;
        let mut frame = vec![0u8; side * side];
        let mut fill = |row: usize, col: usize| {
            for y in row * scale..(row + 1) * scale {
                for x in col * scale..(col + 1) * scale {
                    frame[y * side + x] = 255;
                }
            }
        };

        fill(self.ball.0, self.ball.1);
        for col in self.paddle..self.paddle + self.config.paddle_width {
            fill(grid - 1, col);
        }
        frame
    }

    fn obs(&self) -> Result<Obs> {
        let data = self.frames.iter().flatten().copied().collect();
        Ok(Obs::new(self.config.obs_shape(), data)?)
    }

    fn push_frame(&mut self) {
        self.frames.pop_front();
        self.frames.push_back(self.render());
    }

    fn max_paddle(&self) -> usize {
        self.config.grid - self.config.paddle_width
    }
}

impl Env for CatchEnv {
    type Config = CatchConfig;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        if config.grid < 2 || config.scale == 0 || config.n_stack == 0 {
            anyhow::bail!("Invalid catch configuration: {:?}", config);
        }
        if config.paddle_width == 0 || config.paddle_width > config.grid {
            anyhow::bail!("Invalid paddle width: {}", config.paddle_width);
        }
        Ok(Self {
            config: config.clone(),
            rng: SmallRng::seed_from_u64(seed as u64),
            ball: (0, 0),
            paddle: 0,
            frames: VecDeque::new(),
        })
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(3)
    }

    fn reset(&mut self) -> Result<Obs> {
        self.ball = (0, self.rng.gen_range(0..self.config.grid));
        self.paddle = self.max_paddle() / 2;
        let frame = self.render();
        self.frames = std::iter::repeat(frame).take(self.config.n_stack).collect();
        self.obs()
    }

    fn step(&mut self, act: usize) -> Result<Step> {
        match act {
            0 => self.paddle = self.paddle.saturating_sub(1),
            1 => {}
            2 => self.paddle = (self.paddle + 1).min(self.max_paddle()),
            _ => anyhow::bail!("Invalid action: {}", act),
        }
        self.ball.0 += 1;
        self.push_frame();

        let is_done = self.ball.0 == self.config.grid - 1;
        let reward = match is_done {
            false => 0.0,
            true if (self.paddle..self.paddle + self.config.paddle_width).contains(&self.ball.1) => 1.0,
            true => -1.0,
        };

        Ok(Step {
            obs: self.obs()?,
            reward,
            is_done,
            episode: None,
        })
    }
}
