// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};

use crate::node::Language;

/// Compiler and assembler flag lists, in the order they're passed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Flags {
    /// Passed to both C and C++ compiles.
    pub ccflags: Vec<String>,
    pub cflags: Vec<String>,
    pub cxxflags: Vec<String>,
    pub asflags: Vec<String>,
}

impl Flags {
    pub fn for_language(&self, lang: Language) -> Vec<String> {
        match lang {
            Language::C | Language::Header => {
                concat(&self.ccflags, &self.cflags)
            }
            Language::Cxx => concat(&self.ccflags, &self.cxxflags),
            Language::Asm | Language::RawAsm => self.asflags.clone(),
            Language::Other => self.ccflags.clone(),
        }
    }
}

/// Returns `base` followed by `extra`. Neither input is touched, nothing is
/// reordered and duplicates are kept.
pub fn concat(base: &[String], extra: &[String]) -> Vec<String> {
    base.iter().chain(extra).cloned().collect()
}
