//! Test-framework plug-in seam.
//!
//! The executor is handed a plug-in; it never infers test semantics. The
//! built-in `fixture` plug-in is table-driven: its JSON configuration names
//! each test, the target invocation, and the expected result. A test passes
//! iff the invocation completes without a runtime fault and returns the
//! expected value.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bytecode::image::ProgramImage;
use crate::bytecode::insn::Value;
use crate::runtime::{DEFAULT_FUEL, Interpreter};

/// One runnable test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestUnit {
    /// Qualified test name.
    pub name: String,
}

/// Raw outcome of one test execution; the stack trace is unfiltered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    /// Whether the test passed.
    pub passed: bool,
    /// Exception class name on failure.
    pub type_name: Option<String>,
    /// Exception message on failure.
    pub message: Option<String>,
    /// Raw stack trace on failure, harness frames included.
    pub raw_stack: Option<String>,
}

impl TestOutcome {
    /// A passing outcome.
    pub fn pass() -> Self {
        Self {
            passed: true,
            type_name: None,
            message: None,
            raw_stack: None,
        }
    }
}

/// Test-framework plug-in contract.
pub trait TestPlugin: Send + Sync {
    /// Tests contributed by the given test classes, in discovery order.
    fn discover(&self, test_classes: &[String]) -> Vec<TestUnit>;

    /// Execute one test against the current image.
    fn execute(&self, image: &ProgramImage, unit: &TestUnit) -> TestOutcome;
}

/// Plug-in construction failure.
#[derive(Debug, Error)]
pub enum PluginError {
    /// No plug-in registered under the engine id.
    #[error("unknown test engine: {0}")]
    UnknownEngine(String),
    /// Plug-in configuration did not parse.
    #[error("bad plugin configuration: {0}")]
    Config(String),
}

/// Resolve a plug-in by engine id.
pub fn plugin_for(engine_id: &str, config: &str) -> Result<Arc<dyn TestPlugin>, PluginError> {
    match engine_id {
        "fixture" => Ok(Arc::new(FixtureTestPlugin::from_config(config)?)),
        other => Err(PluginError::UnknownEngine(other.to_string())),
    }
}

/// One table-driven test: invoke `target_class.target_method(args)` and
/// compare against `expected`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    /// Qualified test name, e.g. `demo.CalcTest::testAdd`.
    pub test_name: String,
    /// Owning test class.
    pub test_class: String,
    /// Invoked class.
    pub target_class: String,
    /// Invoked method.
    pub target_method: String,
    /// Invocation arguments.
    pub args: Vec<Value>,
    /// Expected return value; `None` accepts any fault-free completion.
    #[serde(default)]
    pub expected: Option<Value>,
}

/// Fixture plug-in configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixtureConfig {
    /// The test table.
    pub fixtures: Vec<Fixture>,
    /// Interpreter instruction budget override.
    #[serde(default)]
    pub fuel: Option<u64>,
}

/// The built-in table-driven plug-in.
#[derive(Debug, Clone)]
pub struct FixtureTestPlugin {
    config: FixtureConfig,
}

impl FixtureTestPlugin {
    /// Plug-in over an explicit configuration.
    pub fn new(config: FixtureConfig) -> Self {
        Self { config }
    }

    /// Parse the JSON configuration carried in the startup message.
    pub fn from_config(json: &str) -> Result<Self, PluginError> {
        let config: FixtureConfig =
            serde_json::from_str(json).map_err(|e| PluginError::Config(e.to_string()))?;
        Ok(Self::new(config))
    }

    /// Serialize a configuration for the startup message.
    pub fn config_json(config: &FixtureConfig) -> String {
        serde_json::to_string(config).expect("fixture config serializes")
    }

    fn fixture(&self, name: &str) -> Option<&Fixture> {
        self.config.fixtures.iter().find(|f| f.test_name == name)
    }

    fn harness_frames(fixture: &Fixture) -> String {
        let simple = fixture
            .test_class
            .rsplit_once('.')
            .map(|(_, s)| s)
            .unwrap_or(&fixture.test_class);
        let test = fixture
            .test_name
            .rsplit_once("::")
            .map(|(_, t)| t)
            .unwrap_or(&fixture.test_name);
        format!(
            "\tat {}.{}({}.test:1)\n\tat mutmatrix.minion.FixtureRunner.run(FixtureRunner:0)",
            fixture.test_class, test, simple
        )
    }
}

impl TestPlugin for FixtureTestPlugin {
    fn discover(&self, test_classes: &[String]) -> Vec<TestUnit> {
        self.config
            .fixtures
            .iter()
            .filter(|f| test_classes.contains(&f.test_class))
            .map(|f| TestUnit {
                name: f.test_name.clone(),
            })
            .collect()
    }

    fn execute(&self, image: &ProgramImage, unit: &TestUnit) -> TestOutcome {
        let Some(fixture) = self.fixture(&unit.name) else {
            return TestOutcome {
                passed: false,
                type_name: Some("NoSuchTestError".to_string()),
                message: Some(unit.name.clone()),
                raw_stack: None,
            };
        };

        let fuel = self.config.fuel.unwrap_or(DEFAULT_FUEL);
        let mut interp = Interpreter::with_fuel(image, fuel);
        match interp.invoke(&fixture.target_class, &fixture.target_method, &fixture.args) {
            Err(fault) => TestOutcome {
                passed: false,
                type_name: Some(fault.type_name.clone()),
                message: Some(fault.message.clone()),
                raw_stack: Some(format!(
                    "{}\n{}",
                    fault.raw_trace(),
                    Self::harness_frames(fixture)
                )),
            },
            Ok(result) => {
                let matches = match (&fixture.expected, &result) {
                    (None, _) => true,
                    (Some(expected), Some(got)) => expected == got,
                    (Some(_), None) => false,
                };
                if matches {
                    TestOutcome::pass()
                } else {
                    let got = result
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "void".to_string());
                    let expected = fixture
                        .expected
                        .as_ref()
                        .map(Value::to_string)
                        .unwrap_or_default();
                    let message = format!("expected {expected} but was {got}");
                    TestOutcome {
                        passed: false,
                        type_name: Some("AssertionError".to_string()),
                        message: Some(message.clone()),
                        raw_stack: Some(format!(
                            "AssertionError: {message}\n{}",
                            Self::harness_frames(fixture)
                        )),
                    }
                }
            }
        }
    }
}
