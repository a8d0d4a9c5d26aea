//! Recorder writing training metrics as TFRecord for tensorboard.
use adqn_core::record::{Record, RecordValue, Recorder};
use log::{debug, warn};
use std::path::Path;
use tensorboard_rs::summary_writer::SummaryWriter;

/// Write records to TFRecord.
///
/// Each record is written at the step given by its `global_step` value.
pub struct TensorboardRecorder {
    writer: SummaryWriter,
    step_key: String,
}

impl TensorboardRecorder {
    /// Construct a [`TensorboardRecorder`].
    ///
    /// TFRecord will be stored in `logdir`.
    pub fn new<P: AsRef<Path>>(logdir: P) -> Self {
        Self {
            writer: SummaryWriter::new(logdir),
            step_key: "global_step".to_string(),
        }
    }
}

impl Recorder for TensorboardRecorder {
    /// Write a given [`Record`] into a TFRecord.
    ///
    /// This method handles [`RecordValue::Scalar`] in the [`Record`].
    /// Other variants are skipped. Records without the step key are skipped too.
    fn write(&mut self, record: Record) {
        let step = match record.get(&self.step_key) {
            Some(RecordValue::Scalar(v)) => *v as usize,
            _ => {
                warn!("Skipped a record without scalar {}", self.step_key);
                return;
            }
        };

        for (k, v) in record.iter() {
            if *k == self.step_key {
                continue;
            }
            match v {
                RecordValue::Scalar(v) => self.writer.add_scalar(k, *v, step),
                _ => debug!("Skipped {}", k),
            }
        }
    }

    fn flush(&mut self) {
        self.writer.flush();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use adqn_core::record::RecordValue::Scalar;
    use tempdir::TempDir;

    #[test]
    fn test_write_records() -> std::io::Result<()> {
        let dir = TempDir::new("tensorboard")?;
        let mut recorder = TensorboardRecorder::new(dir.path());

        for i in 0..10 {
            recorder.write(Record::from_slice(&[
                ("global_step", Scalar(i as f32 * 100.0)),
                ("charts/episodic_return", Scalar(i as f32)),
                ("note", RecordValue::String("ignored".into())),
            ]));
        }
        recorder.write(Record::from_scalar("losses/td_loss", 0.5));
        recorder.flush();
        // The writer thread finishes the file when the recorder is dropped.
        drop(recorder);

        let size = std::fs::read_dir(dir.path())?
            .map(|e| e.and_then(|e| e.metadata()).map(|m| m.len()))
            .sum::<std::io::Result<u64>>()?;
        assert!(size > 0);
        Ok(())
    }
}
