// ABOUTME: Test support utilities.
// ABOUTME: Provides a scripted CommandRunner standing in for the az and docker CLIs.

use async_trait::async_trait;
use gantry::config::{Params, PropagationConfig, RegistrySku};
use gantry::exec::{CommandOutput, CommandRunner, ExecError, Invocation};
use gantry::types::{DnsLabel, ImageRef};
use nonempty::NonEmpty;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// One expected invocation and its canned result.
struct Step {
    expect: String,
    result: Result<String, (i32, String)>,
}

/// Strict-sequence fake for the external CLIs: every call must match the
/// next expected command line and returns its canned stdout or failure.
/// An unexpected or out-of-order command panics the test.
pub struct ScriptedRunner {
    steps: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl ScriptedRunner {
    pub fn new() -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Expect `command` next and answer with `stdout`.
    pub fn expect(self, command: &str, stdout: &str) -> Self {
        self.steps.lock().unwrap().push_back(Step {
            expect: command.to_string(),
            result: Ok(stdout.to_string()),
        });
        self
    }

    /// Expect `command` next and fail it with the given exit code and stderr.
    pub fn expect_fail(self, command: &str, exit_code: i32, stderr: &str) -> Self {
        self.steps.lock().unwrap().push_back(Step {
            expect: command.to_string(),
            result: Err((exit_code, stderr.to_string())),
        });
        self
    }

    /// Every command line seen so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Panics if scripted steps remain unconsumed.
    pub fn assert_exhausted(&self) {
        let steps = self.steps.lock().unwrap();
        assert!(
            steps.is_empty(),
            "{} scripted step(s) were never invoked",
            steps.len()
        );
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ExecError> {
        let rendered = invocation.to_string();
        self.calls.lock().unwrap().push(rendered.clone());

        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected command: {rendered}"));

        assert_eq!(step.expect, rendered, "command out of sequence");

        match step.result {
            Ok(stdout) => Ok(CommandOutput {
                exit_code: 0,
                stdout,
                stderr: String::new(),
            }),
            Err((exit_code, stderr)) => Err(ExecError::CommandFailed {
                invocation: invocation.clone(),
                exit_code,
                stderr,
            }),
        }
    }
}

/// The parameter set used throughout the transition tests: resource group
/// `rg1`, registry `acr1`, image `app:v1`, identity `sp1`, container `c1`,
/// DNS label `app-123`, port 80. Propagation backoff is shortened so retry
/// tests stay fast.
#[allow(dead_code)]
pub fn params() -> Params {
    Params {
        resource_group: "rg1".to_string(),
        location: "eastus".to_string(),
        registry: "acr1".to_string(),
        registry_sku: RegistrySku::Standard,
        image: ImageRef::parse("app:v1").unwrap(),
        identity: "sp1".to_string(),
        container: "c1".to_string(),
        dns_label: DnsLabel::new("app-123").unwrap(),
        ports: NonEmpty::new(80),
        cpu: 1.0,
        memory_gb: 1.5,
        propagation: PropagationConfig {
            attempts: 3,
            backoff: Duration::from_millis(10),
        },
    }
}
