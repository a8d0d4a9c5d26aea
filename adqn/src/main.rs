use adqn::AdqnConfig;
use adqn_tensorboard::TensorboardRecorder;
use anyhow::Result;
use clap::Parser;
use log::info;
use std::path::{Path, PathBuf};

/// Train a DQN agent with asynchronous actors and prioritized replay
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Load the configuration from a YAML file, ignoring the other flags
    #[arg(long)]
    config: Option<PathBuf>,

    /// Id of the environment
    #[arg(long, default_value = "Catch-v0")]
    gym_id: String,

    /// Name of the experiment
    #[arg(long, default_value = "adqn")]
    exp_name: String,

    /// Learning rate of the optimizer
    #[arg(long, default_value_t = 1e-4)]
    learning_rate: f64,

    /// Seed of the experiment
    #[arg(long, default_value_t = 2)]
    seed: i64,

    /// Total number of environment steps
    #[arg(long, default_value_t = 10_000_000)]
    total_timesteps: u64,

    /// Number of actors
    #[arg(long, default_value_t = 4)]
    num_actors: usize,

    /// Capacity of the replay buffer
    #[arg(long, default_value_t = 100_000)]
    buffer_size: usize,

    /// Exponent of priorities
    #[arg(long, default_value_t = 0.6)]
    pr_alpha: f32,

    /// Initial exponent of importance sampling weights
    #[arg(long, default_value_t = 0.4)]
    pr_beta0: f64,

    /// Constant added to absolute TD errors
    #[arg(long, default_value_t = 1e-6)]
    pr_eps: f32,

    /// Discount factor
    #[arg(long, default_value_t = 0.99)]
    gamma: f64,

    /// Interval of target network synchronization in optimization steps
    #[arg(long, default_value_t = 1000)]
    target_network_frequency: usize,

    /// Maximum global norm of gradients
    #[arg(long, default_value_t = 0.5)]
    max_grad_norm: f64,

    /// Batch size
    #[arg(long, default_value_t = 32)]
    batch_size: usize,

    /// Initial exploration probability
    #[arg(long, default_value_t = 1.0)]
    start_e: f64,

    /// Final exploration probability
    #[arg(long, default_value_t = 0.02)]
    end_e: f64,

    /// Fraction of the total steps over which exploration is annealed
    #[arg(long, default_value_t = 0.10)]
    exploration_fraction: f64,

    /// Environment steps before learning starts
    #[arg(long, default_value_t = 80_000)]
    learning_starts: u64,

    /// Environment steps per optimization step
    #[arg(long, default_value_t = 4)]
    train_frequency: u64,

    /// Interval of recording in optimization steps
    #[arg(long, default_value_t = 100)]
    record_interval: usize,

    /// Interval of saving the model in optimization steps
    #[arg(long, default_value_t = 100_000)]
    save_interval: usize,

    /// Train the learner on the first CUDA device
    #[arg(long, default_value_t = false)]
    cuda: bool,

    /// Directory under which the run directory is created
    #[arg(long, default_value = "runs")]
    model_dir: String,
}

impl From<Args> for AdqnConfig {
    fn from(args: Args) -> Self {
        Self {
            gym_id: args.gym_id,
            exp_name: args.exp_name,
            learning_rate: args.learning_rate,
            seed: args.seed,
            total_timesteps: args.total_timesteps,
            num_actors: args.num_actors,
            buffer_size: args.buffer_size,
            pr_alpha: args.pr_alpha,
            pr_beta0: args.pr_beta0,
            pr_eps: args.pr_eps,
            gamma: args.gamma,
            target_network_frequency: args.target_network_frequency,
            max_grad_norm: args.max_grad_norm,
            batch_size: args.batch_size,
            start_e: args.start_e,
            end_e: args.end_e,
            exploration_fraction: args.exploration_fraction,
            learning_starts: args.learning_starts,
            train_frequency: args.train_frequency,
            record_interval: args.record_interval,
            save_interval: args.save_interval,
            cuda: args.cuda,
            model_dir: args.model_dir,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => AdqnConfig::load(path)?,
        None => AdqnConfig::from(args),
    };
    config.validate()?;

    let run_dir = Path::new(&config.model_dir).join(config.run_name());
    std::fs::create_dir_all(&run_dir)?;
    config.save(run_dir.join("config.yaml"))?;
    info!("Run directory: {:?}", run_dir);

    let mut recorder = TensorboardRecorder::new(&run_dir);
    let stat = adqn::train(&config, &run_dir, &mut recorder)?;
    info!("Summary of the run");
    info!("{}", stat.fmt());

    Ok(())
}
