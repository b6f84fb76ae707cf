// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rewrites an interrupt vector declaration so the handler is built
//! non-blocking.
//!
//! The Arduino core declares its timer overflow handler as
//! `ISR(TIMER0_OVF_vect)`. That handler runs with interrupts masked, which
//! is long enough to make a bit-banged USB stack miss its deadlines. Adding
//! `ISR_NOBLOCK` to the declaration re-enables interrupts on entry. We can't
//! edit the core in place, so the file is copied next to where the build
//! would have put it, patched on the way, and the copy is compiled instead.

use anyhow::{bail, Context, Result};
use memchr::memmem;
use serde::Deserialize;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::env::{BuildEnv, Middleware};
use crate::node::{Node, SourceNode};

pub const DEFAULT_PATTERN: &str = "*/wiring.c";
pub const DEFAULT_VECTOR: &str = "TIMER0_OVF_vect";
pub const DEFAULT_MARKER: &str = "ISR_NOBLOCK";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct IsrNoBlock {
    /// Path pattern selecting the file to patch.
    pub pattern: String,
    /// Interrupt vector identifier to rewrite.
    pub vector: String,
    /// Attribute appended after the vector.
    pub marker: String,
    /// Appended to the file stem of the patched copy. Defaults to
    /// `-<marker>`.
    pub suffix: Option<String>,
}

impl Default for IsrNoBlock {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.to_string(),
            vector: DEFAULT_VECTOR.to_string(),
            marker: DEFAULT_MARKER.to_string(),
            suffix: None,
        }
    }
}

impl IsrNoBlock {
    pub fn suffix(&self) -> String {
        match &self.suffix {
            Some(s) => s.clone(),
            None => format!("-{}", self.marker),
        }
    }

    pub fn replacement(&self) -> String {
        format!("{}, {}", self.vector, self.marker)
    }

    pub fn patch_line(&self, line: &str) -> String {
        line.replace(&self.vector, &self.replacement())
    }

    /// Where the patched copy of `node` goes: beside the build location of
    /// the file, stem suffixed, always with a `.c` extension.
    pub fn output_path(&self, node: &SourceNode) -> PathBuf {
        let mut name = OsString::from(node.path().with_extension(""));
        name.push(self.suffix());
        name.push(".c");
        PathBuf::from(name)
    }

    /// Byte-level counterpart of `patch_line`, for sources that aren't
    /// valid UTF-8. Bytes outside the vector are copied untouched.
    pub fn patch_bytes(&self, line: &[u8]) -> Vec<u8> {
        let vector = self.vector.as_bytes();
        if vector.is_empty() {
            return line.to_vec();
        }
        let replacement = self.replacement();
        let mut out = Vec::with_capacity(line.len());
        let mut rest = line;
        while let Some(i) = memmem::find(rest, vector) {
            out.extend_from_slice(&rest[..i]);
            out.extend_from_slice(replacement.as_bytes());
            rest = &rest[i + vector.len()..];
        }
        out.extend_from_slice(rest);
        out
    }

    /// Copies `from` to `to` line by line, patching each line. Returns the
    /// number of lines that changed. `to` is only written once `from` has
    /// been read in full.
    pub fn patch_file(&self, from: &Path, to: &Path) -> Result<usize> {
        let infile = File::open(from)
            .with_context(|| format!("opening {}", from.display()))?;
        let mut reader = BufReader::new(infile);

        let mut out = vec![];
        let mut line = vec![];
        let mut changed = 0;
        loop {
            line.clear();
            let n = reader
                .read_until(b'\n', &mut line)
                .with_context(|| format!("reading {}", from.display()))?;
            if n == 0 {
                break;
            }
            let patched = self.patch_bytes(&line);
            if patched != line {
                changed += 1;
            }
            out.extend_from_slice(&patched);
        }
        fs::write(to, out)
            .with_context(|| format!("writing {}", to.display()))?;
        Ok(changed)
    }

    /// Writes the patched copy of `node` and returns the node to compile in
    /// its place. Fails rather than overwrite the original when the suffix
    /// leaves the file name unchanged.
    pub fn apply(&self, node: &SourceNode) -> Result<SourceNode> {
        let to = self.output_path(node);
        if to == node.src() {
            bail!(
                "isr-noblock: patched copy of {} would overwrite it; \
                 set a non-empty suffix",
                node.src().display()
            );
        }
        let dir = node.dir();
        fs::create_dir_all(dir)
            .with_context(|| format!("creating {}", dir.display()))?;

        let changed = self.patch_file(node.src(), &to)?;
        info!(
            from = %node.src().display(),
            to = %to.display(),
            lines = changed,
            "patched {}",
            self.vector
        );
        Ok(SourceNode::new(to))
    }
}

impl Middleware for IsrNoBlock {
    fn name(&self) -> &str {
        "isr-noblock"
    }

    fn call(&self, _env: &BuildEnv, node: Node) -> Result<Option<Node>> {
        let patched = self.apply(node.source())?;
        Ok(Some(match node {
            Node::Source(_) => Node::Source(patched),
            Node::Object(o) => Node::Object(patched.derive(o.flags().clone())),
        }))
    }
}
