use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub enum VerbosityLevel {
    Quiet = 0,    // Warnings and errors only
    Detailed = 1, // Stage results
    Debug = 2,    // Everything, including per-activity scores
}

impl VerbosityLevel {
    pub fn from_verbose_count(count: u8) -> Self {
        match count {
            0 => VerbosityLevel::Quiet,
            1 => VerbosityLevel::Detailed,
            2.. => VerbosityLevel::Debug,
        }
    }

    /// Default filter directive for this level; `RUST_LOG` takes precedence
    pub fn filter_directive(&self) -> &'static str {
        match self {
            VerbosityLevel::Quiet => "sitetaxon=warn",
            VerbosityLevel::Detailed => "sitetaxon=info",
            VerbosityLevel::Debug => "sitetaxon=debug",
        }
    }
}

/// Install the global subscriber, writing to stderr so stdout stays clean for output
pub fn init(verbosity: VerbosityLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
