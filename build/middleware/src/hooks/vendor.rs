// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Build adjustments for a vendored C library dropped into the project
//! tree, such as V-USB under `lib/v-usb`.
//!
//! Two things usually need fixing for such a library. It ships assembler
//! meant for some other toolchain (V-USB's `usbdrvasm.asm` is for IAR) that
//! the scanner would otherwise pick up, and it expects to find a config
//! header (`usbconfig.h`) that the project keeps in its own `include/`.

use anyhow::Result;
use serde::Deserialize;

use crate::env::BuildEnv;
use crate::hooks::include::IncludeAugmenter;
use crate::hooks::skip::SkipFile;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct VendorLibrary {
    /// Library directory, relative to the project root.
    pub dir: String,
    /// Include paths appended to the library's C and assembler flags.
    #[serde(default = "default_includes")]
    pub includes: Vec<String>,
    /// Also put `dir` itself on the include path, after `includes`.
    #[serde(default)]
    pub include_self: bool,
    /// Extensions of files in the library that are never compiled.
    #[serde(default = "default_skip")]
    pub skip_extensions: Vec<String>,
    /// Pattern fragment for the extensions that get the extra includes.
    #[serde(default = "default_extensions")]
    pub extensions: String,
}

fn default_includes() -> Vec<String> {
    vec!["include".to_string()]
}

fn default_skip() -> Vec<String> {
    vec!["asm".to_string()]
}

fn default_extensions() -> String {
    "[chS]".to_string()
}

impl VendorLibrary {
    pub fn new(dir: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            includes: default_includes(),
            include_self: false,
            skip_extensions: default_skip(),
            extensions: default_extensions(),
        }
    }

    fn dir(&self) -> &str {
        self.dir.trim_end_matches('/')
    }

    pub fn skip_patterns(&self) -> Vec<String> {
        self.skip_extensions
            .iter()
            .map(|ext| format!("*/{}/*.{}", self.dir(), ext))
            .collect()
    }

    pub fn include_pattern(&self) -> String {
        format!("*/{}/*.{}", self.dir(), self.extensions)
    }

    pub fn include_paths(&self) -> Vec<String> {
        let mut v = self.includes.clone();
        if self.include_self {
            v.push(self.dir().to_string());
        }
        v
    }

    /// Registers the skip filters first, then the include augmenter.
    pub fn register(&self, env: &mut BuildEnv) -> Result<()> {
        for pattern in self.skip_patterns() {
            env.add_build_middleware(&pattern, SkipFile)?;
        }
        env.add_build_middleware(
            &self.include_pattern(),
            IncludeAugmenter::new(self.include_paths()),
        )?;
        Ok(())
    }
}
