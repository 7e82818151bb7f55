//! Writes training records of strider to TFRecord for Tensorboard.
use log::warn;
use std::path::Path;
use strider_core::record::{Record, RecordStorage, RecordValue, Recorder};
use tensorboard_rs::summary_writer::SummaryWriter;

/// Write records to TFRecord.
pub struct TensorboardRecorder {
    writer: SummaryWriter,
    storage: RecordStorage,
    step_key: String,
}

impl TensorboardRecorder {
    /// Construct a [`TensorboardRecorder`].
    ///
    /// TFRecord will be stored in `logdir`.
    pub fn new<P: AsRef<Path>>(logdir: P) -> Self {
        Self {
            writer: SummaryWriter::new(logdir),
            storage: RecordStorage::new(),
            step_key: "iteration".to_string(),
        }
    }
}

impl Recorder for TensorboardRecorder {
    /// Write a given [Record] into a TFRecord.
    ///
    /// The record must hold the training iteration under `iteration`. Only
    /// [RecordValue::Scalar] values are written; other variants are skipped.
    fn write(&mut self, record: Record) {
        let step = match record.get(&self.step_key) {
            Some(RecordValue::Scalar(v)) => *v as usize,
            _ => {
                warn!("Record without {} is not written", self.step_key);
                return;
            }
        };

        for (k, v) in record.iter() {
            if *k != self.step_key {
                if let RecordValue::Scalar(v) = v {
                    self.writer.add_scalar(k, *v, step);
                }
            }
        }
        self.writer.flush();
    }

    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    fn flush(&mut self, step: i64) {
        if self.storage.is_empty() {
            return;
        }
        let mut record = self.storage.aggregate();
        record.insert(self.step_key.clone(), RecordValue::Scalar(step as f32));
        self.write(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempdir::TempDir;

    #[test]
    fn test_flush_writes_event_file() -> Result<()> {
        let dir = TempDir::new("tensorboard")?;
        let mut recorder = TensorboardRecorder::new(dir.path());

        recorder.store(Record::from_scalar("loss_policy", 1.0));
        recorder.store(Record::from_scalar("loss_policy", 3.0));
        recorder.flush(1);
        // Nothing stored, nothing written.
        recorder.flush(2);
        // No iteration key.
        recorder.write(Record::from_scalar("loss_value", 0.5));

        assert!(std::fs::read_dir(dir.path())?.next().is_some());
        Ok(())
    }
}
