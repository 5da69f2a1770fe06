//! Global configuration options.

use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Global configuration options for the h5sel crate.
///
/// Retrieve the global [`Config`] with [`global_config`] and modify it with [`global_config_mut`].
///
/// ## Validate Point Selections
///  > default: [`true`]
///
/// If enabled, [`MemoryDataspace`](crate::dataspace::MemoryDataspace) rejects point selections with coordinates outside of the dataspace extent when they are made.
/// Otherwise out of bounds points are only detected when the selection is used for a transfer.
///
/// ## Fancy Selection Block Limit
/// > default: `1048576`
///
/// Fancy selections (index lists and per-axis boolean arrays) are built from the cartesian product of the runs of each axis.
/// This is the maximum number of hyperslab blocks a single fancy selection may combine.
#[derive(Debug)]
pub struct Config {
    validate_point_selections: bool,
    fancy_selection_block_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            validate_point_selections: true,
            fancy_selection_block_limit: 1 << 20,
        }
    }
}

impl Config {
    /// Get the [validate point selections](#validate-point-selections) configuration.
    #[must_use]
    pub fn validate_point_selections(&self) -> bool {
        self.validate_point_selections
    }

    /// Set the [validate point selections](#validate-point-selections) configuration.
    pub fn set_validate_point_selections(&mut self, validate_point_selections: bool) {
        self.validate_point_selections = validate_point_selections;
    }

    /// Get the [fancy selection block limit](#fancy-selection-block-limit) configuration.
    #[must_use]
    pub fn fancy_selection_block_limit(&self) -> usize {
        self.fancy_selection_block_limit
    }

    /// Set the [fancy selection block limit](#fancy-selection-block-limit) configuration.
    pub fn set_fancy_selection_block_limit(&mut self, block_limit: usize) {
        self.fancy_selection_block_limit = block_limit;
    }
}

static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

/// Returns a reference to the global h5sel configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global config is already held by the current thread.
pub fn global_config() -> RwLockReadGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .read()
        .unwrap()
}

/// Returns a mutable reference to the global h5sel configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global config is already held by the current thread.
pub fn global_config_mut() -> RwLockWriteGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .write()
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_fancy_selection_block_limit() {
        let default_limit = global_config().fancy_selection_block_limit();
        assert_eq!(default_limit, Config::default().fancy_selection_block_limit());
        let mut config = Config::default();
        config.set_fancy_selection_block_limit(8);
        assert_eq!(config.fancy_selection_block_limit(), 8);
        config.set_validate_point_selections(false);
        assert!(!config.validate_point_selections());
    }
}
