use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the stderr logger; `RUST_LOG` wins over the flags
pub fn init_cli_logger(verbose: bool, quiet: bool) {
    let default_directives = if verbose {
        "rfmt=debug,rfmt_core=debug"
    } else if quiet {
        "rfmt=error,rfmt_core=error"
    } else {
        "rfmt=info,rfmt_core=warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}
