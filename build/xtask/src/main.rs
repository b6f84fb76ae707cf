// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::{bail, Context, Result};
use build_middleware::hooks::IsrNoBlock;
use build_middleware::{BuildPlan, HooksConfig, SourceNode, Toolchain};
use build_util::HOOKS_CONFIG_VAR;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};

mod logger;

#[derive(Parser, Debug)]
#[clap(max_term_width = 80, about = "Pre-compile hooks for firmware builds")]
struct Xtask {
    /// Print more; repeat for even more.
    #[clap(short, long, parse(from_occurrences), global = true)]
    verbose: u64,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Shows what the build would compile, with which flags, and what it
    /// would skip. Patched files are written as part of this.
    Plan {
        #[clap(flatten)]
        project: ProjectArgs,

        /// Emit the plan as JSON instead of a listing.
        #[clap(long)]
        json: bool,
    },

    /// Writes the non-blocking ISR copy of a single file.
    Patch {
        file: PathBuf,

        /// Put the copy here instead of next to `file`.
        #[clap(long)]
        out_dir: Option<PathBuf>,

        #[clap(long, default_value = "TIMER0_OVF_vect")]
        vector: String,

        #[clap(long, default_value = "ISR_NOBLOCK")]
        marker: String,
    },

    /// Compiles the project to object files.
    Build {
        #[clap(flatten)]
        project: ProjectArgs,

        #[clap(long, default_value = "avr-gcc")]
        compiler: PathBuf,

        #[clap(long, default_value = "avr-unknown-gnu-atmega328")]
        target: String,

        #[clap(long, default_value = "s")]
        opt_level: String,

        /// Where object files go; defaults to `.build/obj` under the root.
        #[clap(long)]
        out_dir: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct ProjectArgs {
    /// Project root.
    #[clap(long, default_value = ".")]
    root: PathBuf,

    /// Hooks configuration. Defaults to `hooks.toml` in the root, then to
    /// `$FWHOOKS_CONFIG`.
    #[clap(long)]
    config: Option<PathBuf>,
}

impl ProjectArgs {
    fn root(&self) -> Result<PathBuf> {
        dunce::canonicalize(&self.root)
            .with_context(|| format!("project root {}", self.root.display()))
    }

    fn load(&self, root: &Path) -> Result<HooksConfig> {
        if let Some(path) = &self.config {
            return HooksConfig::load(path);
        }
        let default = root.join("hooks.toml");
        if default.is_file() {
            return HooksConfig::load(default);
        }
        match HooksConfig::from_env() {
            Ok(c) => Ok(c),
            Err(_) if std::env::var_os(HOOKS_CONFIG_VAR).is_none() => {
                bail!(
                    "no hooks.toml in {} and ${} is not set",
                    root.display(),
                    HOOKS_CONFIG_VAR
                )
            }
            Err(e) => Err(e),
        }
    }

    fn plan(&self) -> Result<(PathBuf, BuildPlan)> {
        let root = self.root()?;
        let config = self.load(&root)?;
        let env = config.build_env()?;
        let plan = config.project(&root)?.plan(&env)?;
        Ok((root, plan))
    }
}

fn display(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

fn print_plan(root: &Path, plan: &BuildPlan) {
    for unit in &plan.units {
        let tag = if unit.compiled != unit.source {
            "patch".cyan()
        } else {
            "cc".green()
        };
        println!(
            "{:>6} {} {}",
            tag,
            display(root, &unit.compiled),
            unit.flags.join(" ").dimmed()
        );
    }
    for s in &plan.skipped {
        println!("{:>6} {}", "skip".yellow(), display(root, s));
    }
    println!(
        "{} to compile, {} skipped",
        plan.units.len().to_string().bold(),
        plan.skipped.len().to_string().bold()
    );
}

fn main() -> Result<()> {
    let xtask = Xtask::parse();
    logger::init(xtask.verbose);

    if !atty::is(atty::Stream::Stdout) {
        colored::control::set_override(false);
    }

    match xtask.cmd {
        Command::Plan { project, json } => {
            let (root, plan) = project.plan()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                print_plan(&root, &plan);
            }
        }
        Command::Patch {
            file,
            out_dir,
            vector,
            marker,
        } => {
            let node = match out_dir {
                None => SourceNode::new(&file),
                Some(dir) => {
                    let name = file.file_name().with_context(|| {
                        format!("{} has no file name", file.display())
                    })?;
                    SourceNode::with_build_path(&file, dir.join(name))
                }
            };
            let isr = IsrNoBlock {
                vector,
                marker,
                ..IsrNoBlock::default()
            };
            let out = isr.apply(&node)?;
            println!("{}", out.src().display());
        }
        Command::Build {
            project,
            compiler,
            target,
            opt_level,
            out_dir,
        } => {
            let (root, plan) = project.plan()?;
            let toolchain = Toolchain {
                compiler,
                target,
                opt_level,
                out_dir: out_dir.unwrap_or_else(|| root.join(".build/obj")),
            };
            // Include flags in the plan are relative to the project root.
            std::env::set_current_dir(&root)
                .with_context(|| format!("entering {}", root.display()))?;
            let objects = plan.compile(&toolchain)?;
            for o in &objects {
                println!("{:>6} {}", "obj".green(), display(&root, o));
            }
            println!(
                "{} objects, {} skipped",
                objects.len().to_string().bold(),
                plan.skipped.len().to_string().bold()
            );
        }
    }

    Ok(())
}
