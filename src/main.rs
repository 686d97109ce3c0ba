//! compdoc — document Python projects from their docstrings.
//!
//! - `compdoc init [PATH]` indexes modules and formatters into `.compdoc.yml`
//! - `compdoc compile README.md.j2` renders a documentation template
//! - `compdoc check pkg/` reports docstrings that disagree with signatures

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use compdoc::config::{self, Config, CONFIG_FILE_NAME};
use compdoc::{logging, parser, ModuleDoc};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "compdoc",
    version,
    about = "Extract, validate and template documentation from Python source files"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). COMPDOC_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index a Python project and write its .compdoc.yml.
    /// Should be run from the project root.
    Init {
        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Pattern selecting formatters in compdoc-formatters/ by file name
        #[arg(short = 'f', long = "formatters", default_value = "*")]
        formatters: String,

        /// Overwrite an existing .compdoc.yml without asking
        #[arg(long)]
        force: bool,
    },

    /// Compile a Jinja documentation template
    Compile {
        /// Template to compile, e.g. README.md.j2
        template: PathBuf,

        /// Config file, if not .compdoc.yml next to the template
        #[arg(long)]
        config_path: Option<PathBuf>,

        /// Output path (default: template path without .j2)
        #[arg(long)]
        out_path: Option<PathBuf>,
    },

    /// Check that documented parameters match declared ones
    Check {
        /// Python files or directories. Defaults to every configured module.
        targets: Vec<PathBuf>,

        /// Config file used when no targets are given
        #[arg(long)]
        config_path: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Command::Init {
            path,
            formatters,
            force,
        } => init(&path, &formatters, force),
        Command::Compile {
            template,
            config_path,
            out_path,
        } => compile(&template, config_path, out_path.as_deref()),
        Command::Check {
            targets,
            config_path,
        } => check(&targets, config_path),
    }
}

// -- init ---------------------------------------------------------------------------

fn init(root: &Path, formatter_pattern: &str, force: bool) -> Result<()> {
    if !root.is_dir() {
        bail!("project directory not found: {}", root.display());
    }
    let config_path = root.join(CONFIG_FILE_NAME);
    if config_path.exists() && !force && !confirm_overwrite()? {
        return Ok(());
    }

    let config = Config::index(root, formatter_pattern)
        .with_context(|| format!("failed to index {}", root.display()))?;
    for (name, path) in &config.modules {
        println!("{}\t{}", name, path.display());
    }
    for (name, path) in &config.formatters {
        println!("{}\t{}", name, path.display());
    }

    config
        .save(&config_path)
        .with_context(|| format!("failed to write {}", config_path.display()))?;
    println!("compdoc initialized in {}", config_path.display());
    Ok(())
}

fn confirm_overwrite() -> Result<bool> {
    print!("Overwrite existing {}? (y/n) ", CONFIG_FILE_NAME);
    io::stdout().flush().context("failed to flush stdout")?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("failed to read answer")?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

// -- compile ------------------------------------------------------------------------

fn compile(template: &Path, config_path: Option<PathBuf>, out: Option<&Path>) -> Result<()> {
    let config_path = config_path.unwrap_or_else(|| default_config_path(template));
    if !config_path.is_file() {
        bail!(
            "couldn't find compdoc configuration {} for template {}",
            config_path.display(),
            template.display()
        );
    }
    if !template.is_file() {
        bail!("couldn't find template to compile: {}", template.display());
    }

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    let written = compdoc::compile(template, config, out)
        .with_context(|| format!("failed to compile {}", template.display()))?;
    println!("wrote {}", written.display());
    Ok(())
}

fn default_config_path(template: &Path) -> PathBuf {
    template
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(CONFIG_FILE_NAME)
}

// -- check --------------------------------------------------------------------------

fn check(targets: &[PathBuf], config_path: Option<PathBuf>) -> Result<()> {
    let sources = if targets.is_empty() {
        configured_sources(config_path)?
    } else {
        expand_targets(targets)?
    };
    if sources.is_empty() {
        bail!("no Python sources to check");
    }

    let mut total = 0;
    let mut failed = 0;
    let mut skipped = 0;
    for source in &sources {
        let doc: ModuleDoc = parser::parse_module(source)
            .with_context(|| format!("failed to parse {}", source.display()))?;
        for result in doc.validate() {
            total += 1;
            if !result.is_success() {
                failed += 1;
            }
            println!("{result}");
        }
        for rejected in &doc.rejected {
            skipped += 1;
            println!(
                "SKIP {}:{} @ {}\n     {}",
                doc.source_path.display(),
                rejected.line,
                rejected.name,
                rejected.reason
            );
        }
    }

    println!("{total} checked, {failed} failed, {skipped} skipped");
    if failed > 0 || skipped > 0 {
        bail!("documentation check failed");
    }
    Ok(())
}

fn configured_sources(config_path: Option<PathBuf>) -> Result<Vec<PathBuf>> {
    let config_path = config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    if !config_path.is_file() {
        bail!(
            "no targets given and no configuration found at {}",
            config_path.display()
        );
    }
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    let dir = config_path.parent().unwrap_or_else(|| Path::new(""));
    Ok(config.relative_to(dir).modules.into_values().collect())
}

/// Files are taken as given; directories are indexed recursively.
fn expand_targets(targets: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for target in targets {
        if target.is_dir() {
            let modules = config::index_modules(target)
                .with_context(|| format!("failed to index {}", target.display()))?;
            files.extend(modules.into_values().map(|p| target.join(p)));
        } else {
            files.push(target.clone());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_next_to_template() {
        assert_eq!(
            default_config_path(Path::new("docs/README.md.j2")),
            PathBuf::from("docs/.compdoc.yml")
        );
        assert_eq!(
            default_config_path(Path::new("README.md.j2")),
            PathBuf::from(".compdoc.yml")
        );
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "compdoc",
            "-vv",
            "compile",
            "README.md.j2",
            "--out-path",
            "out.md",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Compile {
                template,
                out_path,
                config_path,
            } => {
                assert_eq!(template, PathBuf::from("README.md.j2"));
                assert_eq!(out_path, Some(PathBuf::from("out.md")));
                assert_eq!(config_path, None);
            }
            _ => panic!("expected compile"),
        }
    }
}
