use clap::{Parser, Subcommand};
use mdsite::classify::Classifier;
use mdsite::config::{self, BuildConfig, ImagePolicy, ServeConfig};
use mdsite::events::NullRecorder;
use mdsite::{output, pipeline, serve};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Called once per process.
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "mdsite")]
#[command(about = "Markdown notes and photos to a one-page static site")]
#[command(long_about = "\
Markdown notes and photos to a one-page static site

Static build: every .md file under the source directory is rendered, in
sorted path order, into a single destination/index.html. Every .jpg/.jpeg is
copied to destination/<base64url(sha3-224)>.jpg, and image links in the
markdown are rewritten to those names.

  notes/                         site/
  ├── a.md        ![](img/x.jpg) ├── index.html   <img src=\"tgvU...tg.jpg\">
  └── img/x.jpg                  └── tgvU...tg.jpg

The destination must not exist yet.

Live serve: render markdown from a directory on each request, with a catalog
of its .md files at / and raw images under /images/.

Optional settings live in mdsite.toml in the source or served directory.
Run 'mdsite gen-config' to print a documented one.")]
#[command(version = version_string())]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the static site into a new directory
    Build {
        /// Source directory of markdown and images
        #[arg(long)]
        from: PathBuf,
        /// Destination directory (must not exist)
        #[arg(long)]
        to: PathBuf,
    },
    /// Render markdown from a directory on request
    Serve {
        /// Directory to serve
        #[arg(long, alias = "serve")]
        dir: PathBuf,
        /// Port to listen on (overrides mdsite.toml)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Show what a build would produce without writing anything
    Scan {
        /// Source directory of markdown and images
        #[arg(long)]
        from: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock mdsite.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Build { from, to } => {
            let site = load_site_config(&from)?;
            let build_config = BuildConfig::new(&from, &to, &site);

            let (tx, rx) = std::sync::mpsc::channel();
            let source_root = from.clone();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_build_event(&event, &source_root) {
                        println!("{}", line);
                    }
                }
            });
            let mut recorder = tx;
            let result = pipeline::build(&build_config, &mut recorder);
            drop(recorder);
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;

            let summary = result?;
            output::print_build_summary(&summary);
        }
        Command::Serve { dir, port } => {
            let site = load_site_config(&dir)?;
            let mut serve_config = ServeConfig::new(&dir, &site);
            if let Some(port) = port {
                serve_config.port = port;
            }
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(serve::serve(serve_config))?;
        }
        Command::Scan { from, json } => {
            let site = load_site_config(&from)?;
            let classifier = Classifier::from_config(&site);
            let policy = ImagePolicy::from_config(&site.images);
            let report = pipeline::identify(&from, &classifier, &policy, &mut NullRecorder)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_scan_output(&report);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load `mdsite.toml` from `dir`, or the defaults when `dir` has none.
///
/// A missing `dir` is not an error here; the command itself reports it.
fn load_site_config(dir: &Path) -> Result<config::SiteConfig, config::ConfigError> {
    if dir.is_dir() {
        config::load_config(dir)
    } else {
        Ok(config::SiteConfig::default())
    }
}
