//! packet-reactor: an echo server for length-prefixed packets
//!
//! Features:
//! - Single-threaded mio reactor (epoll on Linux, kqueue on macOS)
//! - Fixed 20-byte header framing with partial read/write resumption
//! - Auto or opportunistic flushing of queued replies
//! - Configuration via CLI arguments or TOML file
//! - Graceful shutdown on SIGINT/SIGTERM

use packet_reactor::config::Config;
use packet_reactor::protocols::echo::EchoFactory;
use packet_reactor::runtime::{Reactor, StopHandle};
use std::sync::OnceLock;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

static STOP_HANDLE: OnceLock<StopHandle> = OnceLock::new();

extern "C" fn handle_signal(_signal: libc::c_int) {
    if let Some(handle) = STOP_HANDLE.get() {
        // The flag is set regardless; nothing may be logged from here
        let _ = handle.stop();
    }
}

fn install_signal_handlers() {
    let handler = handle_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
    for signal in [libc::SIGINT, libc::SIGTERM] {
        // SAFETY: the handler only touches an initialized OnceLock, an atomic
        // and the poll waker.
        if unsafe { libc::signal(signal, handler) } == libc::SIG_ERR {
            warn!(signal, "Failed to install signal handler");
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        host = %config.host,
        port = config.port,
        max_connections = config.max_connections,
        max_payload_size = config.max_payload_size,
        write_mode = ?config.write_mode,
        "Starting packet-reactor echo server"
    );

    let factory = EchoFactory::new(config.write_mode, config.max_payload_size);
    let mut reactor = Reactor::new(factory, config.reactor_config());
    reactor.listen(&config.host, config.port)?;

    if let Some(handle) = reactor.stop_handle() {
        let _ = STOP_HANDLE.set(handle);
        install_signal_handlers();
    }

    reactor.run()?;
    info!("Echo server stopped");
    Ok(())
}
