//! In-memory DAO channel for distribution tests.

use crate::Measurement;
use async_trait::async_trait;
use flowmesh_distro::{DistroError, EntityDao};
use tokio::sync::Mutex;

/// DAO channel over a fixed in-memory entity set, bound to one source name.
pub struct MemoryDao {
    source: String,
    measurements: Mutex<Vec<Measurement>>,
}

impl MemoryDao {
    pub fn new(source: &str, measurements: Vec<Measurement>) -> Self {
        Self {
            source: source.to_string(),
            measurements: Mutex::new(measurements),
        }
    }

    /// Replaces the backing entity set, emulating source-side churn between
    /// loads.
    pub async fn replace(&self, measurements: Vec<Measurement>) {
        *self.measurements.lock().await = measurements;
    }
}

#[async_trait]
impl EntityDao<Measurement> for MemoryDao {
    fn source(&self) -> &str {
        &self.source
    }

    async fn find_all(&self) -> Result<Vec<Measurement>, DistroError> {
        Ok(self.measurements.lock().await.clone())
    }
}
