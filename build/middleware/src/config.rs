// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `hooks.toml` file.
//!
//! ```toml
//! [flags]
//! cflags = ["-Os"]
//!
//! [isr-noblock]
//! pattern = "*/wiring.c"
//!
//! [[vendor-lib]]
//! dir = "lib/v-usb"
//! include-self = true
//! ```

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::env::BuildEnv;
use crate::flags::Flags;
use crate::hooks::{IsrNoBlock, VendorLibrary};
use crate::project::Project;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct HooksConfig {
    #[serde(default)]
    pub flags: Flags,
    #[serde(default)]
    pub project: ProjectConfig,
    pub isr_noblock: Option<IsrNoBlock>,
    #[serde(default)]
    pub vendor_lib: Vec<VendorLibrary>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProjectConfig {
    /// Directories scanned for sources, relative to the project root.
    #[serde(default = "default_src_dirs")]
    pub src_dirs: Vec<String>,
    /// If set, files are placed under this directory (relative to the root)
    /// rather than compiled where they are.
    pub build_dir: Option<String>,
    /// Patterns for files the scanner leaves alone.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Files outside the source directories to compile as well. Relative
    /// paths are taken from the project root.
    #[serde(default)]
    pub extra_sources: Vec<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            src_dirs: default_src_dirs(),
            build_dir: None,
            exclude: vec![],
            extra_sources: vec![],
        }
    }
}

fn default_src_dirs() -> Vec<String> {
    vec!["src".to_string(), "lib".to_string()]
}

impl HooksConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        build_util::rerun_if_changed(path);
        build_util::toml_from_file(path)
    }

    /// Reads the configuration out of `$FWHOOKS_CONFIG`.
    pub fn from_env() -> Result<Self> {
        build_util::rerun_if_env_changed(build_util::HOOKS_CONFIG_VAR);
        build_util::config()
    }

    /// Registers the configured hooks: the ISR patch first, then each vendor
    /// library in file order.
    pub fn register(&self, env: &mut BuildEnv) -> Result<()> {
        if let Some(isr) = &self.isr_noblock {
            if isr.vector.is_empty() {
                return Err(anyhow!("isr-noblock: empty vector name"));
            }
            env.add_build_middleware(&isr.pattern, isr.clone())?;
        }
        for lib in &self.vendor_lib {
            lib.register(env)
                .with_context(|| format!("vendor-lib {}", lib.dir))?;
        }
        Ok(())
    }

    /// A fresh environment with the configured flags and hooks.
    pub fn build_env(&self) -> Result<BuildEnv> {
        let mut env = BuildEnv::new(self.flags.clone());
        self.register(&mut env)?;
        Ok(env)
    }

    /// The project rooted at `root`. Patched copies written by the ISR hook
    /// are excluded from scanning so a rerun doesn't compile them twice.
    pub fn project(&self, root: impl AsRef<Path>) -> Result<Project> {
        let mut p = Project::new(root.as_ref());
        let root = p.root.clone();
        p.src_dirs = self.project.src_dirs.iter().map(|d| root.join(d)).collect();
        p.build_dir = self.project.build_dir.as_ref().map(|d| root.join(d));
        p.extra_sources = self
            .project
            .extra_sources
            .iter()
            .map(|f| root.join(f))
            .collect();
        for pattern in &self.project.exclude {
            p.exclude(pattern)?;
        }
        if let Some(isr) = &self.isr_noblock {
            let suffix = glob::Pattern::escape(&isr.suffix());
            p.exclude(&format!("*{}.c", suffix))?;
        }
        Ok(p)
    }
}
