use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use search_load::client::HttpClient;
use search_load::config::{DEFAULT_REPLICATION, DEFAULT_ROUND_DELAY};
use search_load::prompt::collect_request;
use search_load::query::{DEFAULT_HOST, DEFAULT_PORT};
use search_load::{run_demonstration, Dispatcher, LoadConfig, SearchRequest, SearchTarget};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "search-load",
    version,
    about = "Fires the same search from many clients twice to compare cold and cached answers"
)]
struct Cli {
    /// 1 searches by artist, 2 by album. Asked for when omitted.
    #[arg(short, long, env = "SEARCH_LOAD_SELECTION")]
    selection: Option<String>,
    /// Search text. Asked for when omitted.
    #[arg(short, long, env = "SEARCH_LOAD_QUERY")]
    query: Option<String>,
    #[arg(long, env = "SEARCH_LOAD_HOST", default_value = DEFAULT_HOST)]
    host: String,
    #[arg(long, env = "SEARCH_LOAD_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Simulated clients per round.
    #[arg(short, long, env = "SEARCH_LOAD_CLIENTS", default_value_t = DEFAULT_REPLICATION)]
    clients: usize,
    #[arg(long, env = "SEARCH_LOAD_DELAY_SECS", default_value_t = DEFAULT_ROUND_DELAY.as_secs())]
    delay_secs: u64,
    /// Per-request timeout, none by default.
    #[arg(long, env = "SEARCH_LOAD_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,
    /// Cap on concurrent requests, unbounded by default.
    #[arg(long, env = "SEARCH_LOAD_MAX_IN_FLIGHT")]
    max_in_flight: Option<usize>,
}

impl Cli {
    fn load_config(&self) -> LoadConfig {
        LoadConfig {
            target: SearchTarget::new(self.host.clone(), self.port),
            replication: self.clients,
            round_delay: Duration::from_secs(self.delay_secs),
            request_timeout: self.timeout_secs.map(Duration::from_secs),
            max_in_flight: self.max_in_flight,
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let config = cli.load_config();
    if let Err(e) = config.validate() {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }
    let request = match collect_request(cli.selection, cli.query) {
        Ok(Ok(request)) => request,
        Ok(Err(e)) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };
    let _guard = rt.enter();
    rt.block_on(run_load(config, request));
    ExitCode::SUCCESS
}

async fn run_load(config: LoadConfig, request: SearchRequest) {
    let client = HttpClient::with_connect_timeout(config.request_timeout);
    let dispatcher = Dispatcher::new(client, &config);
    let requests: Arc<[SearchRequest]> = Arc::from(vec![request]);
    run_demonstration(&dispatcher, requests, &config).await;
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
