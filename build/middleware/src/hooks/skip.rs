// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::Result;
use tracing::info;

use crate::env::{BuildEnv, Middleware};
use crate::node::Node;

/// Drops every file it's registered for from the build, without looking at
/// it.
#[derive(Copy, Clone, Debug, Default)]
pub struct SkipFile;

impl Middleware for SkipFile {
    fn name(&self) -> &str {
        "skip-file"
    }

    fn call(&self, _env: &BuildEnv, node: Node) -> Result<Option<Node>> {
        info!(path = %node.src().display(), "skipping");
        Ok(None)
    }
}
