//! Logging setup for binaries

use tracing::Subscriber;
use tracing_subscriber::{fmt, fmt::MakeWriter, prelude::*, EnvFilter};

/// Install a global subscriber writing to stderr
///
/// `RUST_LOG` wins when set; otherwise emoscope crates log at `info`.
/// Stdout stays free for reports. Calling this twice is harmless.
pub fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("warn,emoscope_runtime=info,emoscope_replay=info")
    });

    // a subscriber is already installed
    let _ = tracing::subscriber::set_global_default(build_subscriber(
        json,
        env_filter,
        std::io::stderr,
    ));
}

fn build_subscriber<W>(json: bool, env_filter: EnvFilter, writer: W) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    if json {
        Box::new(
            tracing_subscriber::registry()
                .with(fmt::layer().json().with_writer(writer))
                .with(env_filter),
        )
    } else {
        Box::new(
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_thread_ids(false)
                        .with_writer(writer),
                )
                .with(env_filter),
        )
    }
}
