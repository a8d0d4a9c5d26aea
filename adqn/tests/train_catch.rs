use adqn::AdqnConfig;
use adqn_core::record::BufferedRecorder;
use anyhow::Result;
use tempdir::TempDir;
use test_log::test;

fn small_config(model_dir: &str) -> AdqnConfig {
    AdqnConfig {
        gym_id: "CatchSmall-v0".into(),
        total_timesteps: 3000,
        num_actors: 2,
        buffer_size: 2000,
        batch_size: 16,
        learning_starts: 200,
        target_network_frequency: 2,
        exploration_fraction: 0.5,
        record_interval: 20,
        save_interval: 10_000,
        model_dir: model_dir.into(),
        ..Default::default()
    }
}

#[test]
fn test_train_catch_small() -> Result<()> {
    let dir = TempDir::new("train_catch_small")?;
    let config = small_config(&dir.path().to_string_lossy());
    let run_dir = dir.path().join(config.run_name());
    std::fs::create_dir_all(&run_dir)?;

    let mut recorder = BufferedRecorder::new();
    let stat = adqn::train(&config, &run_dir, &mut recorder)?;

    assert_eq!(stat.trainer.global_step, 3000);
    let env_steps: usize = stat.actors.iter().map(|s| s.env_steps).sum();
    assert_eq!(env_steps, 3000);
    assert!(stat.actors.iter().all(|s| s.error.is_none()));
    assert!(run_dir.join("final").join("qnet.safetensors").exists());

    // The learner trains while the actors collect transitions
    assert!(stat.trainer.n_updates >= 2);
    assert!(stat.trainer.n_target_syncs >= 1);
    assert_eq!(stat.trainer.n_target_syncs, stat.trainer.n_updates / 2);

    // Every episode of Catch ends with a caught or missed ball.
    let returns: Vec<f32> = recorder
        .iter()
        .filter_map(|r| r.get_scalar("charts/episodic_return").ok())
        .collect();
    assert!(!returns.is_empty());
    assert!(returns.iter().all(|r| *r == 1.0 || *r == -1.0));

    Ok(())
}

#[test]
fn test_train_unknown_env() -> Result<()> {
    let dir = TempDir::new("train_unknown_env")?;
    let config = AdqnConfig {
        gym_id: "Pong-v0".into(),
        ..small_config(&dir.path().to_string_lossy())
    };
    let mut recorder = BufferedRecorder::new();
    let err = adqn::train(&config, dir.path(), &mut recorder).unwrap_err();
    assert!(err.to_string().contains("Pong-v0"));
    Ok(())
}
