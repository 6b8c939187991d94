//! Minion executor: isolated test execution against hot-swapped mutants.

pub mod executor;
pub mod plugin;
pub mod trace;
pub mod watchdog;

pub use executor::{ExitingResultCollector, run_minion};
pub use plugin::{Fixture, FixtureConfig, FixtureTestPlugin, PluginError, TestOutcome, TestPlugin, TestUnit, plugin_for};
pub use trace::filter_stack_trace;
pub use watchdog::MemoryWatchdog;
