//! atgen CLI: generate API tests from YAML specs.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::Result;

use atgen::config::{GeneratorConfig, PackageAlias};
use atgen::generator::Generator;
use atgen::plan;
use atgen::spec::{TestItem, load_spec};

#[derive(Parser)]
#[command(name = "atgen", version, about = "Generate API tests from YAML specs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one test file per API version.
    Generate {
        /// YAML spec file.
        #[arg(long)]
        spec: Option<PathBuf>,

        /// Template source file.
        #[arg(long)]
        template: Option<PathBuf>,

        /// Directory the generated files are written to.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Highest directory searched for the owning Cargo.toml.
        #[arg(long)]
        root: Option<PathBuf>,

        /// TOML config file; flags override its values.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Extra router package, as `path` or `path=alias`. Repeatable.
        #[arg(long = "package")]
        packages: Vec<PackageAlias>,
    },

    /// Print which test functions each API version would get.
    Plan {
        /// YAML spec file.
        #[arg(long)]
        spec: PathBuf,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            spec,
            template,
            output_dir,
            root,
            config,
            packages,
        } => {
            let base = match config {
                Some(path) => GeneratorConfig::load(&path)?,
                None => GeneratorConfig::default(),
            };
            let flags = GeneratorConfig {
                spec,
                template,
                output_dir,
                root,
                packages,
            };
            let resolved = base.merge(flags).resolve()?;
            let written = Generator::new(resolved).generate()?;
            for path in &written {
                println!("{}", path.display());
            }
        }

        Commands::Plan { spec } => {
            let funcs = load_spec(&spec)?;
            let planned = plan::plan_all(&funcs);
            if planned.is_empty() {
                println!("No test function targets any API version.");
            }
            for (version, functions) in &planned {
                println!("{version}:");
                for func in functions {
                    let groups = func
                        .tests
                        .iter()
                        .filter(|t| matches!(t, TestItem::Subtest(_)))
                        .count();
                    println!(
                        "  {} ({} tests, {} subtest groups) -> {}",
                        func.name,
                        func.all_tests().count(),
                        groups,
                        func.router
                    );
                }
            }
        }
    }

    Ok(())
}
