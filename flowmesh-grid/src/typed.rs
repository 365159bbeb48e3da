//! Serde-typed views over the byte-level grid resources.

use crate::{Grid, GridError, GridMap, GridQueue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;

/// Typed view over a named grid queue, encoding items as JSON.
pub struct TypedQueue<T> {
    inner: Arc<dyn GridQueue>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for TypedQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned + Send> TypedQueue<T> {
    pub async fn open(grid: &dyn Grid, name: &str, capacity: usize) -> Result<Self, GridError> {
        Ok(Self {
            inner: grid.queue(name, capacity).await?,
            _marker: PhantomData,
        })
    }

    pub async fn put(&self, item: &T) -> Result<(), GridError> {
        self.inner.put(serde_json::to_vec(item)?).await
    }

    pub async fn try_put(&self, item: &T) -> Result<bool, GridError> {
        self.inner.try_put(serde_json::to_vec(item)?).await
    }

    pub async fn take(&self) -> Result<T, GridError> {
        let bytes = self.inner.take().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn close(&self) {
        self.inner.close();
    }
}

/// Typed view over a named grid map, encoding values as JSON.
pub struct TypedMap<V> {
    inner: Arc<dyn GridMap>,
    _marker: PhantomData<fn() -> V>,
}

impl<V> Clone for TypedMap<V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<V: Serialize + DeserializeOwned + Send> TypedMap<V> {
    pub async fn open(grid: &dyn Grid, name: &str) -> Result<Self, GridError> {
        Ok(Self {
            inner: grid.map(name).await?,
            _marker: PhantomData,
        })
    }

    pub async fn put(&self, key: &str, value: &V) -> Result<(), GridError> {
        self.inner.put(key, serde_json::to_vec(value)?).await
    }

    pub async fn get(&self, key: &str) -> Result<Option<V>, GridError> {
        match self.inner.get(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub async fn remove(&self, key: &str) -> Result<(), GridError> {
        self.inner.remove(key).await?;
        Ok(())
    }

    pub async fn entries(&self) -> Result<Vec<(String, V)>, GridError> {
        let mut decoded = Vec::new();
        for (key, bytes) in self.inner.entries().await? {
            decoded.push((key, serde_json::from_slice(&bytes)?));
        }
        Ok(decoded)
    }
}
