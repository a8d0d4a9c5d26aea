//! Monitoring loop writing statistics of actors and the learner to a recorder.
use crate::{Coordinator, EpisodeStat};
use adqn_core::record::{Record, RecordValue::Scalar, Recorder};
use crossbeam_channel::{never, select, Receiver};
use log::info;
use std::{sync::Arc, time::Instant};

// `None` when the channel has been disconnected.
enum Received {
    Episode(Option<EpisodeStat>),
    Record(Option<Record>),
}

/// Counters of [`Monitor::run`].
#[derive(Clone, Debug, Default)]
pub struct MonitorStat {
    /// The number of episode statistics received from actors.
    pub n_episodes: usize,

    /// The number of records received from the learner.
    pub n_records: usize,
}

/// Receives [`EpisodeStat`]s from actors and [`Record`]s from the learner and
/// writes them to a [`Recorder`].
pub struct Monitor<'a> {
    recorder: &'a mut dyn Recorder,
    coordinator: Arc<Coordinator>,
    log_interval: usize,
}

impl<'a> Monitor<'a> {
    /// Creates a monitor. Progress is logged every 100 episodes.
    pub fn new(recorder: &'a mut dyn Recorder, coordinator: Arc<Coordinator>) -> Self {
        Self {
            recorder,
            coordinator,
            log_interval: 100,
        }
    }

    /// Sets the interval of logging progress in episodes.
    pub fn log_interval(mut self, v: usize) -> Self {
        self.log_interval = v.max(1);
        self
    }

    /// Runs until both channels are disconnected.
    pub fn run(&mut self, stats_r: Receiver<EpisodeStat>, record_r: Receiver<Record>) -> MonitorStat {
        let time = Instant::now();
        let mut stat = MonitorStat::default();
        let mut stats_r = Some(stats_r);
        let mut record_r = Some(record_r);
        let mut sum_return = 0f32;

        while stats_r.is_some() || record_r.is_some() {
            let received = {
                let never_stats = never();
                let never_records = never();
                select! {
                    recv(stats_r.as_ref().unwrap_or(&never_stats)) -> msg => Received::Episode(msg.ok()),
                    recv(record_r.as_ref().unwrap_or(&never_records)) -> msg => Received::Record(msg.ok()),
                }
            };
            match received {
                Received::Episode(Some(msg)) => {
                    let queue_len = stats_r.as_ref().map_or(0, |r| r.len());
                    self.write_episode(&msg, queue_len, time.elapsed().as_secs_f32());
                    stat.n_episodes += 1;
                    sum_return += msg.episode_return;
                    if stat.n_episodes % self.log_interval == 0 {
                        info!(
                            "global step = {}, episodes = {}, mean return = {}",
                            msg.global_step,
                            stat.n_episodes,
                            sum_return / self.log_interval as f32
                        );
                        sum_return = 0.0;
                    }
                }
                Received::Episode(None) => stats_r = None,
                Received::Record(Some(record)) => {
                    self.recorder.write(record);
                    stat.n_records += 1;
                }
                Received::Record(None) => record_r = None,
            }
        }
        self.recorder.flush();

        stat
    }

    fn write_episode(&mut self, msg: &EpisodeStat, queue_len: usize, secs: f32) {
        let global_step = self.coordinator.global_step();
        let sps = global_step as f32 / secs.max(f32::EPSILON);
        self.recorder.write(Record::from_slice(&[
            ("global_step", Scalar(msg.global_step as _)),
            ("actor_id", Scalar(msg.actor_id as _)),
            ("charts/episodic_return", Scalar(msg.episode_return)),
            ("charts/episodic_length", Scalar(msg.episode_length as _)),
            ("charts/epsilon", Scalar(msg.epsilon as _)),
            ("charts/sps", Scalar(sps)),
            ("charts/stats_queue_size", Scalar(queue_len as _)),
        ]));
    }
}
