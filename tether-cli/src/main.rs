//! Tether CLI
//!
//! Rewrites stylesheets that use CSS anchor positioning and shows what was
//! extracted from them.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Builder, Env};
use log::debug;
use owo_colors::OwoColorize;
use tether_css::{StyleSource, rewrite_sources};
use tether_position::PolyfillOptions;

/// Tether: CSS anchor positioning for engines that lack it
#[derive(Parser, Debug)]
#[command(name = "tether")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Print the rewritten stylesheet
    tether menu.css

    # Dump the extracted rules as JSON
    tether --json menu.css popovers.css

    # Write menu.tether.css next to menu.css
    tether --write menu.css

    # Use a different marker attribute
    tether --marker data-try menu.css
"#)]
struct Cli {
    /// Stylesheets to rewrite, in cascade order
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// Print the rule model and anchor names as JSON instead of CSS
    #[arg(long)]
    json: bool,

    /// Write each rewritten stylesheet next to its input as `<name>.tether.css`
    #[arg(short, long)]
    write: bool,

    /// Load options from a JSON file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Attribute naming the active @try block
    #[arg(long, value_name = "ATTR")]
    marker: Option<String>,

    /// Prefix for generated custom properties
    #[arg(long, value_name = "PREFIX", allow_hyphen_values = true)]
    prefix: Option<String>,

    /// Log skipped and unresolved anchor syntax
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    Builder::from_env(Env::default().filter_or("RUST_LOG", default_level)).init();

    let options = load_options(&cli)?;

    let mut sources = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        let css = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        sources.push(StyleSource::stylesheet(css));
    }

    let output = rewrite_sources(&mut sources, &options.rewrite_options());
    debug!(
        "{} target rule(s) across {} file(s)",
        output.rules.len(),
        sources.len()
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    for (path, source) in cli.files.iter().zip(&sources) {
        if cli.write {
            if source.changed {
                let out = output_path(path);
                fs::write(&out, &source.css_text)
                    .with_context(|| format!("failed to write {}", out.display()))?;
                println!("{} {}", "wrote".green().bold(), out.display());
            }
        } else if !cli.json {
            print_source(path, source);
        }
    }

    Ok(())
}

/// Options from `--config`, with flag overrides applied.
fn load_options(cli: &Cli) -> Result<PolyfillOptions> {
    let mut options = match &cli.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            PolyfillOptions::from_json(&json)
                .with_context(|| format!("invalid configuration in {}", path.display()))?
        }
        None => PolyfillOptions::default(),
    };
    if let Some(marker) = &cli.marker {
        options.marker_attribute.clone_from(marker);
    }
    if let Some(prefix) = &cli.prefix {
        options.key_prefix.clone_from(prefix);
    }
    options.validate()?;
    Ok(options)
}

fn print_source(path: &Path, source: &StyleSource) {
    let status = if source.changed {
        "rewritten".green().to_string()
    } else {
        "unchanged".dimmed().to_string()
    };
    println!("{} {} ({status})", "===".cyan(), path.display().bold());
    println!("{}", source.css_text);
}

/// `dir/menu.css` becomes `dir/menu.tether.css`.
fn output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "stylesheet".into(), |stem| stem.to_string_lossy());
    input.with_file_name(format!("{stem}.tether.css"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("styles/menu.css")),
            PathBuf::from("styles/menu.tether.css")
        );
        assert_eq!(output_path(Path::new("plain")), PathBuf::from("plain.tether.css"));
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from(["tether", "--marker", "data-try", "--prefix", "--pos", "a.css"]);
        let options = load_options(&cli).unwrap();
        assert_eq!(options.marker_attribute, "data-try");
        assert_eq!(options.key_prefix, "--pos");

        let cli = Cli::parse_from(["tether", "--prefix", "pos", "a.css"]);
        assert!(load_options(&cli).is_err());
    }
}
