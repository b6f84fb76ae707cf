// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Small helpers shared by the firmware build tooling: reading TOML
//! configuration out of files or environment variables, and talking to
//! Cargo when the tooling runs inside a `build.rs`.

use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use std::env;
use std::fs;
use std::path::Path;

/// Environment variable that may carry the hooks configuration inline.
pub const HOOKS_CONFIG_VAR: &str = "FWHOOKS_CONFIG";

/// Pulls the hooks configuration from `$FWHOOKS_CONFIG`. This will fail if
/// the variable isn't set or its contents don't parse.
///
/// As with any serde-driven configuration, `T` only needs to describe the
/// parts of the file the caller cares about.
pub fn config<T: DeserializeOwned>() -> Result<T> {
    toml_from_env(HOOKS_CONFIG_VAR)?.ok_or_else(|| {
        anyhow!("hooks configuration missing: ${} is not set", HOOKS_CONFIG_VAR)
    })
}

/// Pulls the hooks configuration, or `None` if `$FWHOOKS_CONFIG` is not
/// set.
pub fn maybe_config<T: DeserializeOwned>() -> Result<Option<T>> {
    toml_from_env(HOOKS_CONFIG_VAR)
}

/// Reads and deserializes a TOML file.
pub fn toml_from_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&text)
        .with_context(|| format!("deserializing {}", path.display()))
}

/// Parse the contents of an environment variable as toml.
///
/// Returns:
///
/// - `Ok(Some(x))` if the environment variable is defined and the contents
///   deserialized correctly.
/// - `Ok(None)` if the environment variable is not defined.
/// - `Err(e)` if deserialization failed or the environment variable did not
///   contain UTF-8.
pub fn toml_from_env<T: DeserializeOwned>(var: &str) -> Result<Option<T>> {
    let config = match env::var(var) {
        Err(env::VarError::NotPresent) => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| {
                format!("accessing environment variable {}", var)
            })
        }
        Ok(c) => c,
    };

    let rval = toml::from_slice(config.as_bytes())
        .context("deserializing configuration")?;
    Ok(Some(rval))
}

/// True when running under Cargo as a build script.
pub fn in_build_script() -> bool {
    env::var_os("OUT_DIR").is_some() && env::var_os("CARGO").is_some()
}

/// Asks Cargo to rerun the build script when `path` changes. Does nothing
/// outside a build script.
pub fn rerun_if_changed(path: impl AsRef<Path>) {
    if in_build_script() {
        println!("cargo:rerun-if-changed={}", path.as_ref().display());
    }
}

/// Asks Cargo to rerun the build script when `var` changes. Does nothing
/// outside a build script.
pub fn rerun_if_env_changed(var: &str) {
    if in_build_script() {
        println!("cargo:rerun-if-env-changed={}", var);
    }
}
