// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::env::BuildEnv;
use crate::node::{self, Language, Object, SourceNode};
use crate::pattern::PathPattern;

/// Extensions the scanner treats as compilable.
pub const SOURCE_EXTENSIONS: &[&str] =
    &["c", "cc", "cpp", "cxx", "S", "s", "sx", "asm", "ASM"];

/// A firmware project tree: where its sources live and where the build
/// puts things.
#[derive(Clone, Debug)]
pub struct Project {
    pub root: PathBuf,
    pub src_dirs: Vec<PathBuf>,
    /// Variant directory mirroring `root`. `None` builds in place.
    pub build_dir: Option<PathBuf>,
    /// Files never picked up by the scanner.
    pub exclude: Vec<PathPattern>,
    /// Sources outside the tree that are compiled too, such as framework
    /// files.
    pub extra_sources: Vec<PathBuf>,
}

/// One file the build will compile.
#[derive(Clone, Debug, Serialize)]
pub struct Unit {
    /// The file the scanner found.
    pub source: PathBuf,
    /// The file actually handed to the compiler, which a middleware may
    /// have swapped out.
    pub compiled: PathBuf,
    pub language: Language,
    pub flags: Vec<String>,
}

impl Unit {
    fn new(source: PathBuf, object: &Object) -> Self {
        Self {
            source,
            compiled: object.node().src().to_path_buf(),
            language: object.node().language(),
            flags: object.command_flags(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct BuildPlan {
    pub units: Vec<Unit>,
    pub skipped: Vec<PathBuf>,
}

impl BuildPlan {
    pub fn unit(&self, source: &Path) -> Option<&Unit> {
        self.units.iter().find(|u| u.source == source)
    }

    pub fn is_skipped(&self, source: &Path) -> bool {
        self.skipped.iter().any(|s| s == source)
    }
}

pub fn is_source(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SOURCE_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

impl Project {
    /// A project rooted at `root`, made absolute against the working
    /// directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = node::absolute(&root.into());
        Self {
            src_dirs: vec![root.join("src"), root.join("lib")],
            root,
            build_dir: None,
            exclude: vec![],
            extra_sources: vec![],
        }
    }

    pub fn exclude(&mut self, pattern: &str) -> Result<()> {
        self.exclude.push(PathPattern::new(pattern)?);
        Ok(())
    }

    /// Where the build places `src`.
    pub fn node(&self, src: &Path) -> SourceNode {
        match &self.build_dir {
            None => SourceNode::new(src),
            Some(b) => {
                let rel = match src.strip_prefix(&self.root) {
                    Ok(rel) => rel,
                    // Out-of-tree: keep only the name.
                    Err(_) => src.file_name().map(Path::new).unwrap_or(src),
                };
                SourceNode::with_build_path(src, b.join(rel))
            }
        }
    }

    /// Every source file in the project, in a stable order.
    pub fn sources(&self) -> Result<Vec<PathBuf>> {
        let mut found = vec![];
        for dir in &self.src_dirs {
            if !dir.is_dir() {
                warn!(dir = %dir.display(), "source directory missing");
                continue;
            }
            let walker = WalkDir::new(dir)
                .sort_by(|a, b| a.file_name().cmp(b.file_name()))
                .into_iter()
                .filter_entry(|e| match &self.build_dir {
                    Some(b) => !e.path().starts_with(b),
                    None => true,
                });
            for entry in walker {
                let entry = entry
                    .with_context(|| format!("scanning {}", dir.display()))?;
                if !entry.file_type().is_file() || !is_source(entry.path()) {
                    continue;
                }
                if self.exclude.iter().any(|p| p.matches(entry.path())) {
                    debug!(path = %entry.path().display(), "excluded");
                    continue;
                }
                found.push(entry.into_path());
            }
        }
        found.extend(self.extra_sources.iter().map(|f| node::absolute(f)));
        Ok(found)
    }

    /// Runs every source through `env`'s middlewares.
    pub fn plan(&self, env: &BuildEnv) -> Result<BuildPlan> {
        let mut plan = BuildPlan::default();
        for src in self.sources()? {
            match env.process(self.node(&src))? {
                Some(object) => plan.units.push(Unit::new(src, &object)),
                None => plan.skipped.push(src),
            }
        }
        Ok(plan)
    }
}
