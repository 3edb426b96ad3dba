use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing::info;

use logtap::{
    ChannelView, DEFAULT_BUFFER_BYTES, DummySource, EngineError, ForegroundView, FrameSource,
    LoggerEntrySource, Printer, Session, SessionConfig, Source, StartPosition, View,
};

#[derive(Parser, Debug)]
#[command(name = "logtap")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Print a captured log stream through a bounded fan-out buffer",
    long_about = None
)]
struct Args {
    /// Ring buffer byte budget (0 = none)
    #[arg(long, default_value_t = DEFAULT_BUFFER_BYTES)]
    buffer_bytes: usize,

    /// Ring buffer record cap (0 = none)
    #[arg(long, default_value_t = 0)]
    buffer_slots: usize,

    /// How records reach the printer
    #[arg(long, value_enum, default_value_t = Mode::Channel)]
    mode: Mode,

    /// Where records come from
    #[arg(long, value_enum, default_value_t = SourceKind::Dummy)]
    source: SourceKind,

    /// Input file for `frames` and `logger` sources
    #[arg(long)]
    input: Option<PathBuf>,

    /// Pause between dummy records, in milliseconds
    #[arg(long, default_value_t = 250)]
    interval_ms: u64,

    /// Print only records captured after startup
    #[arg(long)]
    follow: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    /// Deliver through a channel task
    Channel,
    /// Read on the main task
    Foreground,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SourceKind {
    Dummy,
    Frames,
    Logger,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("--input is required for --source {0}")]
    MissingInput(&'static str),

    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("logtap: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    let cfg = SessionConfig {
        buffer_bytes: args.buffer_bytes,
        buffer_slots: args.buffer_slots,
        start_position: if args.follow {
            StartPosition::Latest
        } else {
            StartPosition::Oldest
        },
        ..SessionConfig::default()
    };
    let session = Session::new(cfg);

    match args.source {
        SourceKind::Dummy => {
            let source = DummySource::new(Duration::from_millis(args.interval_ms));
            present(args.mode, &session, source).await?;
        }
        SourceKind::Frames => {
            let path = args.input.ok_or(CliError::MissingInput("frames"))?;
            let source = FrameSource::open(&path)
                .await
                .map_err(|source| CliError::Open { path, source })?;
            present(args.mode, &session, source).await?;
        }
        SourceKind::Logger => {
            let path = args.input.ok_or(CliError::MissingInput("logger"))?;
            let source = LoggerEntrySource::open(&path)
                .await
                .map_err(|source| CliError::Open { path, source })?;
            present(args.mode, &session, source).await?;
        }
    }

    let stats = session.stats();
    info!(
        appended = stats.appended,
        malformed = stats.malformed,
        buffered = stats.buffered,
        "capture summary"
    );
    session.destroy()?;
    Ok(())
}

async fn present(
    mode: Mode,
    session: &Arc<Session>,
    source: impl Source,
) -> Result<(), EngineError> {
    let printer = Arc::new(Printer::stdout());
    let view: Box<dyn View> = match mode {
        Mode::Channel => {
            Box::new(ChannelView::new(Arc::clone(session), printer).with_source(source))
        }
        Mode::Foreground => {
            Box::new(ForegroundView::new(Arc::clone(session), printer).with_source(source))
        }
    };
    view.present().await
}
