// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::Result;

use crate::env::{BuildEnv, Middleware};
use crate::flags::{self, Flags};
use crate::node::Node;

/// Compiles matching files with extra `-I` entries appended to the C and
/// assembler flags.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IncludeAugmenter {
    includes: Vec<String>,
}

impl IncludeAugmenter {
    pub fn new<S: Into<String>>(includes: impl IntoIterator<Item = S>) -> Self {
        Self {
            includes: includes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn include_flags(&self) -> Vec<String> {
        self.includes.iter().map(|i| format!("-I{}", i)).collect()
    }

    /// `base` with `cflags` and `asflags` extended; everything else as is.
    pub fn augment(&self, base: &Flags) -> Flags {
        let extra = self.include_flags();
        Flags {
            cflags: flags::concat(&base.cflags, &extra),
            asflags: flags::concat(&base.asflags, &extra),
            ..base.clone()
        }
    }
}

impl Middleware for IncludeAugmenter {
    fn name(&self) -> &str {
        "include-augmenter"
    }

    /// Extends an incoming object's flags if an earlier middleware already
    /// produced one, otherwise the environment's.
    fn call(&self, env: &BuildEnv, node: Node) -> Result<Option<Node>> {
        let flags = match &node {
            Node::Object(o) => self.augment(o.flags()),
            Node::Source(_) => self.augment(env.flags()),
        };
        Ok(Some(env.object(node.source(), flags).into()))
    }
}
