// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};
use std::fmt;
use std::path::Path;

/// A shell-style path pattern with `fnmatch` semantics: `*` also matches
/// `/`, so `*/lib/v-usb/*.asm` matches at any depth on either side of the
/// library directory.
#[derive(Clone, Debug)]
pub struct PathPattern(Pattern);

const OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

impl PathPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let p = Pattern::new(pattern)
            .with_context(|| format!("bad path pattern {:?}", pattern))?;
        Ok(Self(p))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn matches(&self, path: &Path) -> bool {
        let s = path.to_string_lossy();
        if cfg!(windows) {
            self.0.matches_with(&s.replace('\\', "/"), OPTIONS)
        } else {
            self.0.matches_with(&s, OPTIONS)
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
