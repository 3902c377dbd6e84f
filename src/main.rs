use clap::{Parser, Subcommand};
use staticfile_finalizer::directives::{self, YamlFile};
use staticfile_finalizer::finalize;
use staticfile_finalizer::output::{Console, STEP_BANNER};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("FINALIZER_ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("FINALIZER_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "staticfile-finalizer")]
#[command(about = "Prepare a static site build directory for nginx")]
#[command(long_about = "\
Prepare a static site build directory for nginx

Reads the optional Staticfile in the build directory, moves servable content
into public/, and renders nginx/conf/nginx.conf for the directives found.

Staticfile directives:

  root: dist                        # serve this subdirectory (default: build dir)
  host_dot_files: true              # publish dotfiles
  location_include: extra.conf      # include a file inside location /
  directory: visible                # autoindex folders without index.html
  ssi: enabled                      # server side includes
  pushstate: enabled                # route unknown paths to /
  http_strict_transport_security: true
  http_strict_transport_security_include_subdomains: true
  http_strict_transport_security_preload: true
  enable_http2: true
  force_https: true
  status_codes:
    4xx: /error.html                # expands to every 4xx code

A Staticfile.auth next to the Staticfile enables basic authentication.

Set RUST_LOG=debug for diagnostics on stderr.")]
#[command(version = version_string())]
struct Cli {
    /// Application build directory
    #[arg(long, default_value = ".", global = true)]
    build_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline: load → root → partition → render
    Finalize,
    /// Validate the Staticfile and root directory without changing files
    Check,
    /// Print the resolved configuration as JSON
    ShowConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let build_dir = std::path::absolute(&cli.build_dir)?;

    match cli.command {
        Command::Finalize => {
            finalize::finalize(&build_dir, &YamlFile, &mut Console)?;
        }
        Command::Check => {
            finalize::check(&build_dir, &YamlFile, &mut Console)?;
            println!("{STEP_BANNER}Staticfile is valid");
        }
        Command::ShowConfig => {
            let mut events = Vec::new();
            let config = directives::load(&build_dir, &YamlFile, &mut events)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
