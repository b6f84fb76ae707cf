// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::node::Language;
use crate::project::{BuildPlan, Unit};

/// The cross toolchain the plan is compiled with.
#[derive(Clone, Debug)]
pub struct Toolchain {
    /// C compiler driver, e.g. `avr-gcc`. Also used for C++ and assembler.
    pub compiler: PathBuf,
    /// Target triple handed to `cc`.
    pub target: String,
    pub opt_level: String,
    pub out_dir: PathBuf,
}

impl Toolchain {
    /// A `cc::Build` set up for exactly one unit. Only the unit's own flags
    /// reach the compiler; `cc`'s defaults are turned off.
    pub fn build_for(&self, unit: &Unit) -> cc::Build {
        let mut b = cc::Build::new();
        b.compiler(&self.compiler)
            .target(&self.target)
            .host(&self.target)
            .opt_level_str(&self.opt_level)
            .debug(false)
            .out_dir(&self.out_dir)
            .cargo_metadata(false)
            .no_default_flags(true)
            .warnings(false)
            .cpp(unit.language == Language::Cxx)
            .file(&unit.compiled);
        for f in &unit.flags {
            if unit.language.is_assembler() {
                b.asm_flag(f);
            } else {
                b.flag(f);
            }
        }
        b
    }
}

impl BuildPlan {
    /// Compiles every unit, returning the object files in plan order.
    /// Compiler failures are passed straight back.
    pub fn compile(&self, toolchain: &Toolchain) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&toolchain.out_dir).with_context(|| {
            format!("creating {}", toolchain.out_dir.display())
        })?;
        let mut objects = vec![];
        for unit in &self.units {
            if unit.language == Language::Header {
                continue;
            }
            info!(file = %unit.compiled.display(), "compiling");
            let objs = toolchain
                .build_for(unit)
                .try_compile_intermediates()
                .with_context(|| {
                    format!("compiling {}", unit.compiled.display())
                })?;
            objects.extend(objs);
        }
        Ok(objects)
    }
}
