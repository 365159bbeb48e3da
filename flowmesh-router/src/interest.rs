//! Publication and subscription interest sets declared by components.

use crate::filter::Filter;

/// Everything one component may emit: owning component identity, a name,
/// and the filter set describing the outbound surface.
#[derive(Clone, Debug)]
pub struct Publication {
    owner: String,
    name: String,
    filters: Vec<Filter>,
}

impl Publication {
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            filters: Vec::new(),
        }
    }

    pub fn with_filter(mut self, filter: impl Into<Filter>) -> Self {
        self.filters.push(filter.into());
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }
}

/// Everything one component wants delivered. Same shape as [`Publication`];
/// a registered subscription is identified by `(owner, name)`.
#[derive(Clone, Debug)]
pub struct Subscription {
    owner: String,
    name: String,
    filters: Vec<Filter>,
}

impl Subscription {
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            filters: Vec::new(),
        }
    }

    pub fn with_filter(mut self, filter: impl Into<Filter>) -> Self {
        self.filters.push(filter.into());
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }
}
