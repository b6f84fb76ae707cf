// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::env;
use std::path::{Path, PathBuf};

use crate::flags::Flags;

/// `path` joined onto the current directory if it's relative. Nothing is
/// looked up on disk, so `..` and symlinks stay as written.
pub fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match env::current_dir() {
        Ok(cwd) if path.as_os_str().is_empty() => cwd,
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

/// A source file queued for compilation.
///
/// `src` is where the file lives in the project; `path` is where the build
/// puts it. They're the same unless the project uses a separate build
/// directory, in which case `path` mirrors `src` underneath it. Both are
/// made absolute on construction, so patterns with a leading `*/` match
/// files named relative to the working directory too.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceNode {
    src: PathBuf,
    path: PathBuf,
}

impl SourceNode {
    pub fn new(src: impl Into<PathBuf>) -> Self {
        let src = absolute(&src.into());
        Self {
            path: src.clone(),
            src,
        }
    }

    pub fn with_build_path(
        src: impl Into<PathBuf>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            src: absolute(&src.into()),
            path: absolute(&path.into()),
        }
    }

    pub fn src(&self) -> &Path {
        &self.src
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory the build places this file in.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    pub fn language(&self) -> Language {
        Language::from_path(&self.src)
    }

    /// Produces a compilation object for this node with `flags` replacing
    /// whatever the environment would have used.
    pub fn derive(&self, flags: Flags) -> Object {
        Object {
            node: self.clone(),
            flags,
        }
    }
}

/// A source node bound to the exact flag set it is compiled with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Object {
    node: SourceNode,
    flags: Flags,
}

impl Object {
    pub fn node(&self) -> &SourceNode {
        &self.node
    }

    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    /// The flags actually handed to the compiler for this object's language,
    /// in order.
    pub fn command_flags(&self) -> Vec<String> {
        self.flags.for_language(self.node.language())
    }
}

/// What a middleware hands back to the build: a (possibly different) file,
/// or a fully specified object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Source(SourceNode),
    Object(Object),
}

impl Node {
    /// The path patterns are matched against.
    pub fn src(&self) -> &Path {
        match self {
            Node::Source(s) => s.src(),
            Node::Object(o) => o.node().src(),
        }
    }

    pub fn source(&self) -> &SourceNode {
        match self {
            Node::Source(s) => s,
            Node::Object(o) => o.node(),
        }
    }
}

impl From<SourceNode> for Node {
    fn from(s: SourceNode) -> Self {
        Node::Source(s)
    }
}

impl From<Object> for Node {
    fn from(o: Object) -> Self {
        Node::Object(o)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Language {
    C,
    Cxx,
    /// Assembler that goes through the C preprocessor (`.S`, `.sx`).
    Asm,
    /// Plain assembler (`.s`, `.asm`).
    RawAsm,
    Header,
    Other,
}

impl Language {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("c") => Language::C,
            Some("cc" | "cpp" | "cxx" | "C") => Language::Cxx,
            Some("S" | "sx") => Language::Asm,
            Some("s" | "asm" | "ASM") => Language::RawAsm,
            Some("h" | "hh" | "hpp") => Language::Header,
            _ => Language::Other,
        }
    }

    pub fn is_assembler(self) -> bool {
        matches!(self, Language::Asm | Language::RawAsm)
    }
}
