mod handler;

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use httpkit::{Request, RequestConfig};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

/// One transaction per process: environment and stdin in, a full HTTP
/// response (status line included, as for an `nph-` script) out.
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let config = match std::env::var("HTTPKIT_CONFIG") {
        Ok(path) => RequestConfig::from_file(path),
        Err(_) => RequestConfig::default(),
    };

    match run(Arc::new(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "transaction failed");
            ExitCode::FAILURE
        }
    }
}

fn run(config: Arc<RequestConfig>) -> httpkit::Result<()> {
    let mut request = Request::from_env(config, io::stdin())?;

    let mut response = handler::handle_request(&mut request).unwrap_or_else(|err| {
        warn!(error = %err, "request rejected");
        handler::handle_error(&err)
    });

    if let Err(err) = response.prepare(&mut request) {
        warn!(error = %err, "could not prepare response");
        response = handler::prepared_error(&err, &mut request);
    }

    response.send(&mut io::stdout().lock())
}
