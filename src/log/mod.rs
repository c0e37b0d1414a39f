//! The `log` module configures where the simulation's log messages go. Logging is distinct from
//! _reporting_: reports (see [`crate::report`]) are the model outputs of a run, while log messages
//! describe what the simulation is doing while it runs.
//!
//! This module (re)exports the five logging macros: `error!`, `warn!`, `info!`, `debug!` and
//! `trace!` where `error!` represents the highest-priority log messages and `trace!` the lowest.
//!
//! Logging is _disabled_ by default. It can be enabled with the `--log-level <level>` command line
//! option of the `dragonfly` binary, or programmatically:
//!
//!  - `enable_logging()`: turns on all log messages
//!  - `disable_logging()`: turns off all log messages
//!  - `set_log_level(level: LevelFilter)`: enables only log messages with priority at least `level`
//!
//! Per-module filters are installed with `set_module_filter()` / `set_module_filters()` and
//! removed with `remove_module_filter()`:
//!
//! ```rust
//! use dragonfly::log::{set_log_level, set_module_filter, LevelFilter};
//!
//! pub fn setup_logging() {
//!     // Enable `info` log messages globally.
//!     set_log_level(LevelFilter::Info);
//!     // Show per-epoch statistics.
//!     set_module_filter("dragonfly::simulation", LevelFilter::Debug);
//! }
//! ```
mod standard_logger;

pub use log::{debug, error, info, trace, warn, LevelFilter};
use std::collections::hash_map::Entry;
use std::str::FromStr;

use crate::error::DragonflyError;
use crate::hashing::HashMap;
use log4rs::Handle;
use std::sync::LazyLock;
use std::sync::{Mutex, MutexGuard};

// Logging disabled
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Off;
// Default module specific filters
const DEFAULT_MODULE_FILTERS: [(&str, LevelFilter); 1] = [
    // rayon's worker threads are chatty at trace level.
    ("rayon_core", LevelFilter::Warn),
];

/// A global instance of the logging configuration.
static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// Different log level filters can be applied to the log messages emitted from different modules
/// according to the module path (e.g. `"dragonfly::strategy"`).
#[derive(Debug, PartialEq)]
struct ModuleLogConfiguration {
    /// The module path this configuration applies to
    module: String,
    /// The maximum log level for this module path
    level: LevelFilter,
}

impl From<(&str, LevelFilter)> for ModuleLogConfiguration {
    fn from((module, level): (&str, LevelFilter)) -> Self {
        Self {
            module: module.to_string(),
            level,
        }
    }
}

/// Holds logging configuration: the filter levels of modules and a handle to the global logger.
///
/// Because loggers are globally installed, only one instance of this struct exists. The public
/// API are free functions which fetch the singleton and call the appropriate member function.
#[derive(Debug)]
pub(in crate::log) struct LogConfiguration {
    /// The "default" level filter for modules without an explicitly set filter. A global filter
    /// level of `LevelFilter::Off` disables logging.
    pub(in crate::log) global_log_level: LevelFilter,
    pub(in crate::log) module_configurations: HashMap<String, ModuleLogConfiguration>,
    /// Handle to the `log4rs` logger.
    root_handle: Option<Handle>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        let module_configurations = DEFAULT_MODULE_FILTERS
            .map(|(module, level)| (module.to_string(), (module, level).into()));
        let module_configurations = HashMap::from_iter(module_configurations);
        Self {
            global_log_level: DEFAULT_LOG_LEVEL,
            module_configurations,
            root_handle: None,
        }
    }
}

impl LogConfiguration {
    pub(in crate::log) fn set_log_level(&mut self, level: LevelFilter) {
        self.global_log_level = level;
        self.set_config();
    }

    /// Returns true if the configuration was mutated, false otherwise.
    fn insert_module_filter(&mut self, module: &str, level: LevelFilter) -> bool {
        match self.module_configurations.entry(module.to_string()) {
            Entry::Occupied(mut entry) => {
                let module_config = entry.get_mut();
                if module_config.level == level {
                    return false;
                }
                module_config.level = level;
            }
            Entry::Vacant(entry) => {
                entry.insert((module, level).into());
            }
        }
        true
    }

    pub(in crate::log) fn set_module_filters(&mut self, module_filters: &[(&str, LevelFilter)]) {
        let mut mutated: bool = false;
        for (module, level) in module_filters {
            mutated |= self.insert_module_filter(module, *level);
        }
        if mutated {
            self.set_config();
        }
    }

    pub(in crate::log) fn remove_module_filter(&mut self, module: &str) {
        if self.module_configurations.remove(module).is_some() {
            self.set_config();
        }
    }
}

// The public API

/// Enables the logger with no global level filter / full logging. Equivalent to
/// `set_log_level(LevelFilter::Trace)`.
pub fn enable_logging() {
    set_log_level(LevelFilter::Trace);
}

/// Disables logging completely. Equivalent to `set_log_level(LevelFilter::Off)`.
pub fn disable_logging() {
    set_log_level(LevelFilter::Off);
}

/// Sets the global log level. A global filter level of `LevelFilter::Off` disables logging.
pub fn set_log_level(level: LevelFilter) {
    get_log_configuration().set_log_level(level);
}

/// Sets a level filter for the given module path.
pub fn set_module_filter(module_path: &str, level_filter: LevelFilter) {
    get_log_configuration().set_module_filters(&[(module_path, level_filter)]);
}

/// Removes a module-specific level filter for the given module path. The global level filter will
/// apply to the module.
pub fn remove_module_filter(module_path: &str) {
    get_log_configuration().remove_module_filter(module_path);
}

/// Sets the level filters for a set of modules. Use this instead of `set_module_filter()` to set
/// filters in bulk.
pub fn set_module_filters(module_filters: &[(&str, LevelFilter)]) {
    get_log_configuration().set_module_filters(module_filters);
}

/// Applies a log specification as accepted by `--log-level`: either a single level
/// (`"info"`) that becomes the global level, or a comma separated list of `module=level`
/// pairs (`"dragonfly::simulation=debug,dragonfly::strategy=trace"`). Bare levels and pairs may be
/// mixed; the last bare level wins.
///
/// # Errors
///
/// Returns [`DragonflyError::InvalidParameter`] if a level name is not recognized.
pub fn apply_log_spec(spec: &str) -> Result<(), DragonflyError> {
    let mut global = None;
    let mut filters: Vec<(&str, LevelFilter)> = Vec::new();
    for item in spec.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        match item.split_once('=') {
            Some((module, level)) => filters.push((module.trim(), parse_level(level)?)),
            None => global = Some(parse_level(item)?),
        }
    }
    // Naming a module without a global level still has to turn the logger on.
    let global = global.unwrap_or(if filters.is_empty() {
        LevelFilter::Off
    } else {
        LevelFilter::Error
    });

    let mut log_configuration = get_log_configuration();
    for (module, level) in &filters {
        log_configuration.insert_module_filter(module, *level);
    }
    log_configuration.set_log_level(global);
    Ok(())
}

fn parse_level(level: &str) -> Result<LevelFilter, DragonflyError> {
    LevelFilter::from_str(level.trim()).map_err(|_| {
        DragonflyError::invalid_parameter("log-level", format!("unknown log level `{level}`"))
    })
}

/// Fetches a mutable reference to the global `LogConfiguration`.
fn get_log_configuration() -> MutexGuard<'static, LogConfiguration> {
    LOG_CONFIGURATION
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
