// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pre-compile hooks for firmware projects built from vendored C sources.
//!
//! A [`BuildEnv`] holds the compiler flag lists and an ordered set of
//! middlewares, each bound to a path pattern. Before a source file is
//! compiled it is run through every middleware whose pattern matches; a
//! middleware may hand back a different file, a compilation [`Object`] with
//! its own flags, or nothing at all, which drops the file from the build.
//!
//! The hooks in [`hooks`] cover what an Arduino + V-USB firmware needs:
//!
//! - [`hooks::IsrNoBlock`] compiles a patched copy of `wiring.c` whose timer
//!   overflow handler is declared `ISR_NOBLOCK`;
//! - [`hooks::VendorLibrary`] skips the library's foreign-toolchain
//!   assembler and puts the project's `include/` (and optionally the
//!   library itself) on its include path.
//!
//! From a `build.rs`:
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! let config = build_middleware::HooksConfig::load("hooks.toml")?;
//! let env = config.build_env()?;
//! let plan = config.project(".")?.plan(&env)?;
//! # Ok(())
//! # }
//! ```

pub mod compile;
pub mod config;
pub mod env;
pub mod flags;
pub mod hooks;
pub mod node;
pub mod pattern;
pub mod project;

pub use compile::Toolchain;
pub use config::HooksConfig;
pub use env::{from_fn, BuildEnv, Middleware};
pub use flags::Flags;
pub use node::{Language, Node, Object, SourceNode};
pub use pattern::PathPattern;
pub use project::{BuildPlan, Project, Unit};
