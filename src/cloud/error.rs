// ABOUTME: Cloud CLI error types with SNAFU pattern.
// ABOUTME: Classifies probe and create failures for programmatic handling.

use snafu::Snafu;

use crate::exec::ExecError;

/// Error from an Azure CLI operation.
///
/// `NotFound` and `AlreadyExists` are control-flow signals for the
/// ensure-or-create logic; everything else propagates the underlying
/// command failure unchanged, stderr included.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CloudError {
    #[snafu(display("{source}"))]
    Exec { source: ExecError },

    #[snafu(display("{resource} not found"))]
    NotFound { resource: String },

    #[snafu(display("{resource} already exists"))]
    AlreadyExists { resource: String },

    #[snafu(display("unexpected output from `az {operation}`: {message}"))]
    Parse {
        operation: &'static str,
        message: String,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudErrorKind {
    CommandFailed,
    NotFound,
    AlreadyExists,
    Parse,
}

impl CloudError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> CloudErrorKind {
        match self {
            CloudError::Exec { .. } => CloudErrorKind::CommandFailed,
            CloudError::NotFound { .. } => CloudErrorKind::NotFound,
            CloudError::AlreadyExists { .. } => CloudErrorKind::AlreadyExists,
            CloudError::Parse { .. } => CloudErrorKind::Parse,
        }
    }
}

impl From<ExecError> for CloudError {
    fn from(source: ExecError) -> Self {
        CloudError::Exec { source }
    }
}

/// Classify a probe failure: a not-found complaint on stderr signals
/// absence; anything else stays a command failure.
pub(crate) fn classify_probe(err: ExecError, resource: &str) -> CloudError {
    if stderr_matches(&err, &["notfound", "not found", "does not exist"]) {
        CloudError::NotFound {
            resource: resource.to_string(),
        }
    } else {
        CloudError::Exec { source: err }
    }
}

/// Classify a create failure: a conflict means someone created the resource
/// between our existence check and the create call.
pub(crate) fn classify_create(err: ExecError, resource: &str) -> CloudError {
    if stderr_matches(&err, &["already exists", "alreadyexists", "conflict"]) {
        CloudError::AlreadyExists {
            resource: resource.to_string(),
        }
    } else {
        CloudError::Exec { source: err }
    }
}

fn stderr_matches(err: &ExecError, markers: &[&str]) -> bool {
    match err.stderr() {
        Some(stderr) => {
            let stderr = stderr.to_lowercase();
            markers.iter().any(|m| stderr.contains(m))
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::Invocation;

    fn failed(stderr: &str) -> ExecError {
        ExecError::CommandFailed {
            invocation: Invocation::new("az", vec!["acr".to_string(), "show".to_string()]),
            exit_code: 3,
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn resource_not_found_is_classified() {
        let err = classify_probe(
            failed("(ResourceNotFound) The Resource 'acr1' could not be found."),
            "registry acr1",
        );
        assert_eq!(err.kind(), CloudErrorKind::NotFound);
    }

    #[test]
    fn unrelated_probe_failure_stays_command_failed() {
        let err = classify_probe(failed("AuthorizationFailed: no access"), "registry acr1");
        assert_eq!(err.kind(), CloudErrorKind::CommandFailed);
    }

    #[test]
    fn conflict_on_create_is_classified() {
        let err = classify_create(
            failed("The registry 'acr1' already exists in resource group 'rg1'"),
            "registry acr1",
        );
        assert_eq!(err.kind(), CloudErrorKind::AlreadyExists);
    }

    #[test]
    fn spawn_failure_is_never_classified() {
        let err = ExecError::Spawn {
            program: "az".to_string(),
            source: std::io::Error::other("no such file"),
        };
        assert_eq!(
            classify_probe(err, "registry acr1").kind(),
            CloudErrorKind::CommandFailed
        );
    }
}
