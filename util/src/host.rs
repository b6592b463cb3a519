//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Name of the environment variable pointing at the workspace root.
pub const SW_ROOT_ENV_VAR: &str = "LOOP_SIM_ROOT";

/// Get the root directory of the software workspace.
///
/// Parameter files and session directories are resolved relative to this
/// path.
pub fn get_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
