use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::error::ProcessError;
use super::runner::{ExitStatus, ProcessCommand, ProcessOutput, ProcessRunner};

type ArgsMatcher = Box<dyn Fn(&[String]) -> bool + Send + Sync>;
type Effect = Box<dyn Fn(&ProcessCommand) + Send + Sync>;

/// Records every command it is asked to run and answers from expectations
#[derive(Clone)]
pub struct MockProcessRunner {
    expectations: Arc<Mutex<Vec<MockExpectation>>>,
    call_history: Arc<Mutex<Vec<ProcessCommand>>>,
}

struct MockExpectation {
    program: String,
    args_matcher: Option<ArgsMatcher>,
    effect: Option<Effect>,
    response: Result<ProcessOutput, MockFailure>,
    times_called: usize,
    expected_times: Option<usize>,
}

#[derive(Clone)]
enum MockFailure {
    NotFound,
    Timeout(Duration),
}

pub struct MockCommandConfig {
    runner: MockProcessRunner,
    expectation: MockExpectation,
}

impl MockProcessRunner {
    pub fn new() -> Self {
        Self {
            expectations: Arc::new(Mutex::new(Vec::new())),
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn expect_command(&mut self, program: &str) -> MockCommandConfig {
        MockCommandConfig {
            runner: self.clone(),
            expectation: MockExpectation {
                program: program.to_string(),
                args_matcher: None,
                effect: None,
                response: Ok(ProcessOutput {
                    status: ExitStatus::Success,
                    stdout: String::new(),
                    stderr: String::new(),
                    duration: Duration::from_millis(10),
                }),
                times_called: 0,
                expected_times: None,
            },
        }
    }

    pub fn verify_called(&self, program: &str, times: usize) -> bool {
        self.calls_to(program).len() == times
    }

    pub fn calls_to(&self, program: &str) -> Vec<ProcessCommand> {
        self.get_call_history()
            .into_iter()
            .filter(|cmd| cmd.program == program)
            .collect()
    }

    pub fn get_call_history(&self) -> Vec<ProcessCommand> {
        self.call_history
            .lock()
            .map(|history| history.clone())
            .unwrap_or_default()
    }

    pub fn reset(&mut self) {
        if let Ok(mut expectations) = self.expectations.lock() {
            expectations.clear();
        }
        if let Ok(mut history) = self.call_history.lock() {
            history.clear();
        }
    }
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        if let Ok(mut history) = self.call_history.lock() {
            history.push(command.clone());
        }

        let mut expectations = self
            .expectations
            .lock()
            .map_err(|_| ProcessError::MockExpectationNotMet("mock poisoned".to_string()))?;

        for expectation in expectations.iter_mut() {
            if expectation.program != command.program {
                continue;
            }

            if let Some(ref args_matcher) = expectation.args_matcher {
                if !(args_matcher)(&command.args) {
                    continue;
                }
            }

            expectation.times_called += 1;

            if let Some(expected) = expectation.expected_times {
                if expectation.times_called > expected {
                    return Err(ProcessError::MockExpectationNotMet(format!(
                        "Command '{}' called {} times, expected {}",
                        command.program, expectation.times_called, expected
                    )));
                }
            }

            if let Some(ref effect) = expectation.effect {
                effect(&command);
            }

            return match &expectation.response {
                Ok(output) => Ok(output.clone()),
                Err(MockFailure::NotFound) => {
                    Err(ProcessError::CommandNotFound(command.program.clone()))
                }
                Err(MockFailure::Timeout(d)) => Err(ProcessError::Timeout(*d)),
            };
        }

        Err(ProcessError::MockExpectationNotMet(format!(
            "No expectation found for command: {} {:?}",
            command.program, command.args
        )))
    }
}

impl MockCommandConfig {
    pub fn with_args<F>(mut self, matcher: F) -> Self
    where
        F: Fn(&[String]) -> bool + Send + Sync + 'static,
    {
        self.expectation.args_matcher = Some(Box::new(matcher));
        self
    }

    /// Run `effect` every time this expectation matches, e.g. to create the
    /// file a real archiver would have written
    pub fn with_effect<F>(mut self, effect: F) -> Self
    where
        F: Fn(&ProcessCommand) + Send + Sync + 'static,
    {
        self.expectation.effect = Some(Box::new(effect));
        self
    }

    pub fn returns_stdout(mut self, stdout: &str) -> Self {
        if let Ok(ref mut output) = self.expectation.response {
            output.stdout = stdout.to_string();
        }
        self
    }

    pub fn returns_stderr(mut self, stderr: &str) -> Self {
        if let Ok(ref mut output) = self.expectation.response {
            output.stderr = stderr.to_string();
        }
        self
    }

    pub fn returns_exit_code(mut self, code: i32) -> Self {
        if let Ok(ref mut output) = self.expectation.response {
            output.status = if code == 0 {
                ExitStatus::Success
            } else {
                ExitStatus::Error(code)
            };
        }
        self
    }

    pub fn returns_success(self) -> Self {
        self.returns_exit_code(0)
    }

    pub fn returns_not_found(mut self) -> Self {
        self.expectation.response = Err(MockFailure::NotFound);
        self
    }

    pub fn returns_timeout(mut self, after: Duration) -> Self {
        self.expectation.response = Err(MockFailure::Timeout(after));
        self
    }

    pub fn times(mut self, n: usize) -> Self {
        self.expectation.expected_times = Some(n);
        self
    }

    pub fn finish(self) {
        if let Ok(mut expectations) = self.runner.expectations.lock() {
            expectations.push(self.expectation);
        }
    }
}

impl Default for MockProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}
