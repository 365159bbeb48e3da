//! Sample analytics entity used across workspace test suites.

use flowmesh_distro::Distributable;
use flowmesh_router::{Payload, TypeTag};
use serde::{Deserialize, Serialize};
use std::any::Any;

/// One measurement from a data source: payload in routing tests, pooled
/// entity in distribution tests.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub id: u64,
    pub label: String,
    pub value: f64,
}

impl Measurement {
    pub fn new(id: u64, label: &str, value: f64) -> Self {
        Self {
            id,
            label: label.to_string(),
            value,
        }
    }
}

impl Distributable for Measurement {
    type Id = u64;

    fn kind() -> &'static str {
        "Measurement"
    }

    fn id(&self) -> u64 {
        self.id
    }
}

impl Payload for Measurement {
    fn type_tag(&self) -> TypeTag {
        TypeTag::of::<Measurement>()
    }

    fn clone_payload(&self) -> Box<dyn Payload> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
