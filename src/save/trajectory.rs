//! Diagnostic trajectory capture for offline plotting.

use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::global_types::Position;
use crate::odometry::PositionListener;

/// Accumulates every reported position. Clone one handle into the analyzer
/// as its listener and keep another to read the samples back out.
#[derive(Debug, Clone, Default)]
pub struct TrajectoryRecorder {
    samples: Arc<Mutex<Vec<Position>>>,
}

impl TrajectoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.samples.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.lock().unwrap().is_empty()
    }

    pub fn samples(&self) -> Vec<Position> {
        self.samples.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.samples.lock().unwrap().clear()
    }

    /// Dumps the trajectory as `x,y,z` rows.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        for sample in self.samples.lock().unwrap().iter() {
            writer.serialize(sample)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.write_csv(std::fs::File::create(path)?)
    }
}

impl PositionListener for TrajectoryRecorder {
    fn on_position(&mut self, position: Position) {
        self.samples.lock().unwrap().push(position);
    }
}
