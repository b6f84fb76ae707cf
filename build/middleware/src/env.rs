// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::{Context, Result};
use tracing::debug;

use crate::flags::Flags;
use crate::node::{Node, Object, SourceNode};
use crate::pattern::PathPattern;

/// A hook run on every file whose source path matches the pattern it was
/// registered with, just before the file is compiled.
///
/// Returning `Ok(None)` drops the file from the build. Returning a node
/// replaces the one passed in; later middlewares see the replacement.
pub trait Middleware {
    fn name(&self) -> &str;

    fn call(&self, env: &BuildEnv, node: Node) -> Result<Option<Node>>;
}

/// A middleware made from a closure.
pub struct FnMiddleware<F> {
    name: &'static str,
    f: F,
}

pub fn from_fn<F>(name: &'static str, f: F) -> FnMiddleware<F>
where
    F: Fn(&BuildEnv, Node) -> Result<Option<Node>>,
{
    FnMiddleware { name, f }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&BuildEnv, Node) -> Result<Option<Node>>,
{
    fn name(&self) -> &str {
        self.name
    }

    fn call(&self, env: &BuildEnv, node: Node) -> Result<Option<Node>> {
        (self.f)(env, node)
    }
}

struct Registered {
    pattern: PathPattern,
    middleware: Box<dyn Middleware>,
}

/// The build configuration handed to every hook: the current flag lists
/// and the ordered set of registered middlewares.
pub struct BuildEnv {
    flags: Flags,
    middlewares: Vec<Registered>,
}

impl BuildEnv {
    pub fn new(flags: Flags) -> Self {
        Self {
            flags,
            middlewares: vec![],
        }
    }

    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    pub fn flags_mut(&mut self) -> &mut Flags {
        &mut self.flags
    }

    /// Registers `middleware` for every file whose source path matches
    /// `pattern`. Middlewares run in registration order.
    pub fn add_build_middleware(
        &mut self,
        pattern: &str,
        middleware: impl Middleware + 'static,
    ) -> Result<()> {
        let pattern = PathPattern::new(pattern).with_context(|| {
            format!("registering middleware {}", middleware.name())
        })?;
        debug!(%pattern, middleware = middleware.name(), "registered");
        self.middlewares.push(Registered {
            pattern,
            middleware: Box::new(middleware),
        });
        Ok(())
    }

    /// `(pattern, middleware name)` for everything registered, in order.
    pub fn middlewares(&self) -> impl Iterator<Item = (&str, &str)> {
        self.middlewares
            .iter()
            .map(|r| (r.pattern.as_str(), r.middleware.name()))
    }

    pub fn object(&self, node: &SourceNode, flags: Flags) -> Object {
        node.derive(flags)
    }

    /// An object compiled with the environment's flags as they stand.
    pub fn default_object(&self, node: &SourceNode) -> Object {
        node.derive(self.flags.clone())
    }

    /// Runs `node` through the middleware chain. `Ok(None)` means the file
    /// must not be compiled.
    pub fn process(&self, node: SourceNode) -> Result<Option<Object>> {
        let mut node = Node::Source(node);
        for r in &self.middlewares {
            if !r.pattern.matches(node.src()) {
                continue;
            }
            debug!(
                path = %node.src().display(),
                middleware = r.middleware.name(),
                "running middleware"
            );
            let src = node.src().to_path_buf();
            match r.middleware.call(self, node).with_context(|| {
                format!(
                    "middleware {} failed on {}",
                    r.middleware.name(),
                    src.display()
                )
            })? {
                Some(n) => node = n,
                None => return Ok(None),
            }
        }
        Ok(Some(match node {
            Node::Source(s) => self.default_object(&s),
            Node::Object(o) => o,
        }))
    }
}
