use anyhow::Result;
use tracing_subscriber::EnvFilter;
use wiremap::cli::{parse_args, Commands};
use wiremap::commands::{handle_compile, init_config, CompileConfig};

/// Environment variable holding a tracing filter directive.
const LOG_ENV: &str = "WIREMAP_LOG";

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Configure rayon global thread pool once at startup
fn configure_thread_pool(jobs: usize) {
    let mut builder = rayon::ThreadPoolBuilder::new();

    if jobs > 0 {
        builder = builder.num_threads(jobs);
    }

    if let Err(e) = builder.build_global() {
        tracing::debug!("thread pool already configured: {}", e);
    }
}

fn main() -> Result<()> {
    let cli = parse_args();

    match cli.command {
        Commands::Compile {
            paths,
            config,
            format,
            output,
            lifetime_mismatch,
            captive_dependency,
            conflict_policy,
            jobs,
            verbosity,
        } => {
            init_tracing(verbosity);
            configure_thread_pool(jobs);

            let ok = handle_compile(CompileConfig {
                paths,
                config,
                format: format.into(),
                output,
                lifetime_mismatch: lifetime_mismatch.map(Into::into),
                captive_dependency: captive_dependency.map(Into::into),
                conflict_policy: conflict_policy.map(Into::into),
            })?;
            if !ok {
                std::process::exit(1);
            }
        }
        Commands::Init { force } => {
            init_tracing(0);
            init_config(force)?;
        }
    }
    Ok(())
}
