//! Readiness record for lazily constructed resources
//!
//! Each sub-resource of the service moves once from `Uninitialized` to `Ready`
//! and stays there for the life of the process. `Initializing` marks an
//! initialization in flight; seeing it on entry means a previous attempt was
//! abandoned mid-way (its future dropped), and the cell refuses to start over.

use std::future::Future;

use crate::{Error, Result};

/// Lifecycle of a lazily constructed resource
#[derive(Debug)]
pub enum Readiness<T> {
    Uninitialized,
    Initializing,
    Ready(T),
}

/// A named slot holding one lazily constructed resource
#[derive(Debug)]
pub struct ReadyCell<T> {
    name: &'static str,
    state: Readiness<T>,
}

impl<T> ReadyCell<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Readiness::Uninitialized,
        }
    }

    /// Create a cell that is already ready
    pub fn ready(name: &'static str, value: T) -> Self {
        Self {
            name,
            state: Readiness::Ready(value),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> &Readiness<T> {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, Readiness::Ready(_))
    }

    pub fn get(&self) -> Option<&T> {
        match &self.state {
            Readiness::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Run `init` on first use and return the ready value.
    ///
    /// A failed initialization returns the cell to `Uninitialized` so a later
    /// request may try again; nothing is retried within the call.
    pub async fn ensure_ready<F, Fut>(&mut self, init: F) -> Result<&mut T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match self.state {
            Readiness::Ready(_) => {}
            Readiness::Initializing => {
                return Err(Error::Other(format!(
                    "{} initialization already in progress",
                    self.name
                )));
            }
            Readiness::Uninitialized => {
                tracing::debug!(resource = self.name, "initializing");
                self.state = Readiness::Initializing;
                match init().await {
                    Ok(value) => self.state = Readiness::Ready(value),
                    Err(e) => {
                        self.state = Readiness::Uninitialized;
                        return Err(e);
                    }
                }
            }
        }

        match &mut self.state {
            Readiness::Ready(value) => Ok(value),
            _ => Err(Error::Other(format!("{} is not ready", self.name))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_initializes_once() {
        let mut cell = ReadyCell::new("counter");
        let mut calls = 0;

        for _ in 0..3 {
            let value = cell
                .ensure_ready(|| {
                    calls += 1;
                    async { Ok(42) }
                })
                .await
                .unwrap();
            assert_eq!(*value, 42);
        }

        assert_eq!(calls, 1);
        assert!(cell.is_ready());
    }

    #[tokio::test]
    async fn test_failure_resets_to_uninitialized() {
        let mut cell: ReadyCell<u32> = ReadyCell::new("flaky");

        let err = cell
            .ensure_ready(|| async { Err(Error::Configuration("missing".to_string())) })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(matches!(cell.state(), Readiness::Uninitialized));

        let value = cell.ensure_ready(|| async { Ok(7) }).await.unwrap();
        assert_eq!(*value, 7);
    }

    #[tokio::test]
    async fn test_abandoned_initialization_is_not_reentered() {
        let mut cell: ReadyCell<u32> = ReadyCell::new("index");

        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            cell.ensure_ready(|| std::future::pending()),
        )
        .await;
        assert!(abandoned.is_err());
        assert!(matches!(cell.state(), Readiness::Initializing));

        let err = cell.ensure_ready(|| async { Ok(1) }).await.unwrap_err();
        assert!(err.to_string().contains("index initialization already in progress"));
    }

    #[test]
    fn test_ready_constructor() {
        let cell = ReadyCell::ready("client", "handle");
        assert_eq!(cell.get(), Some(&"handle"));
        assert_eq!(cell.name(), "client");
    }
}
