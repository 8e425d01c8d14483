// ABOUTME: Typed wrapper over the container engine CLI.
// ABOUTME: Tags local images and pushes them to the remote registry.

use thiserror::Error;

use crate::exec::{CommandRunner, ExecError, Invocation};
use crate::types::ImageRef;

const DOCKER: &str = "docker";

/// Errors from container engine operations. Both carry the reference that
/// failed and the engine's own stderr via the source.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to tag image {reference}: {source}")]
    TagFailed {
        reference: ImageRef,
        source: ExecError,
    },

    #[error("failed to push image {reference}: {source}")]
    PushFailed {
        reference: ImageRef,
        source: ExecError,
    },
}

/// Typed surface over the `docker` CLI, generic over the command runner.
#[derive(Debug)]
pub struct EngineCli<R> {
    runner: R,
}

impl<R: CommandRunner> EngineCli<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// `docker tag source target`. Pure local operation, no registry
    /// traffic.
    pub async fn tag(&self, source: &ImageRef, target: &ImageRef) -> Result<(), EngineError> {
        let invocation = Invocation::new(
            DOCKER,
            vec!["tag".to_string(), source.to_string(), target.to_string()],
        );
        self.runner
            .run(&invocation)
            .await
            .map_err(|source| EngineError::TagFailed {
                reference: target.clone(),
                source,
            })?;
        Ok(())
    }

    /// `docker push reference`. Requires the local engine to be logged in
    /// to the registry.
    pub async fn push(&self, reference: &ImageRef) -> Result<(), EngineError> {
        let invocation = Invocation::new(DOCKER, vec!["push".to_string(), reference.to_string()]);
        self.runner
            .run(&invocation)
            .await
            .map_err(|source| EngineError::PushFailed {
                reference: reference.clone(),
                source,
            })?;
        Ok(())
    }
}
