//! Single-threaded reactor.
//!
//! Readiness-based model: poll tells us when sockets are ready, then the
//! owning connection performs non-blocking reads and writes. Uses epoll on
//! Linux, kqueue on macOS.
//!
//! One thread runs [`Reactor::run`]; the only place it blocks is the poll
//! call. Every hook runs to completion before the next poll, so connection
//! state needs no locking. The one cross-thread path is [`StopHandle`],
//! which flips an atomic flag and wakes the poll.
//!
//! Sources are registered edge-triggered. A connection whose read hook
//! yields early (see [`Connection::wants_reread`]) is queued and read again
//! after the current batch, and the next poll does not block while that
//! queue is non-empty. Every ready connection gets a turn per iteration.
//!
//! [`Connection::wants_reread`]: crate::runtime::Connection::wants_reread

use crate::error::ReactorError;
use crate::runtime::connection::{ConnectionFactory, ConnectionRegistry, Entry};
use mio::event::Event;
use mio::net::TcpListener;
use mio::{Events, Interest, Poll, Token, Waker};
use std::collections::VecDeque;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

const LISTENER_TOKEN: Token = Token(usize::MAX);
const WAKER_TOKEN: Token = Token(usize::MAX - 1);

/// Reactor sizing.
#[derive(Debug, Clone)]
pub struct ReactorConfig {
    /// Listen backlog.
    pub backlog: i32,
    /// Maximum events returned by one poll.
    pub events_capacity: usize,
    /// Accepted sockets beyond this many live connections are closed.
    pub max_connections: usize,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            backlog: libc::SOMAXCONN,
            events_capacity: 1024,
            max_connections: 10_000,
        }
    }
}

/// Requests shutdown of a running reactor from any thread or from a signal
/// handler.
///
/// A handle belongs to one `listen` cycle; after the reactor stops or listens
/// again it no longer has any effect.
#[derive(Clone)]
pub struct StopHandle {
    stop_requested: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl StopHandle {
    /// Ask the reactor to stop and wake it if it is parked in poll.
    ///
    /// Performs one atomic store and one eventfd (or kqueue) write, both of
    /// which are async-signal-safe. Teardown happens on the reactor thread.
    /// The flag is set even if waking fails.
    pub fn stop(&self) -> io::Result<()> {
        self.stop_requested.store(true, Ordering::SeqCst);
        self.waker.wake()
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }
}

/// Resources that exist only between `listen` and `stop`.
struct Listening {
    listener: TcpListener,
    poll: Poll,
    waker: Arc<Waker>,
    stop_requested: Arc<AtomicBool>,
    local_addr: SocketAddr,
}

/// The event loop: owns the listener, the poll handle and every connection.
pub struct Reactor<F: ConnectionFactory> {
    factory: F,
    config: ReactorConfig,
    listening: Option<Listening>,
    connections: ConnectionRegistry,
    /// Connections whose read hook yielded before the socket would block.
    rereads: VecDeque<usize>,
    running: bool,
}

impl<F: ConnectionFactory> Reactor<F> {
    pub fn new(factory: F, config: ReactorConfig) -> Self {
        let connections = ConnectionRegistry::new(config.max_connections);
        Self {
            factory,
            config,
            listening: None,
            connections,
            rereads: VecDeque::new(),
            running: false,
        }
    }

    /// Bind the listening socket and create the poll handle.
    ///
    /// An empty host or `0.0.0.0` binds all IPv4 interfaces. On failure
    /// nothing stays open and the reactor remains unlistened.
    pub fn listen(&mut self, host: &str, port: u16) -> Result<(), ReactorError> {
        // Re-listening replaces any previous socket and connections
        self.stop();

        let ip = resolve_host(host)?;
        let addr = SocketAddr::new(ip, port);
        let std_listener = create_listener(addr, self.config.backlog)?;
        let mut listener = TcpListener::from_std(std_listener);
        let local_addr = listener.local_addr().map_err(ReactorError::Socket)?;

        let poll = Poll::new().map_err(ReactorError::Poll)?;
        let waker = Waker::new(poll.registry(), WAKER_TOKEN).map_err(ReactorError::Poll)?;
        poll.registry()
            .register(&mut listener, LISTENER_TOKEN, Interest::READABLE)
            .map_err(ReactorError::Register)?;

        self.listening = Some(Listening {
            listener,
            poll,
            waker: Arc::new(waker),
            stop_requested: Arc::new(AtomicBool::new(false)),
            local_addr,
        });

        info!(addr = %local_addr, "Listening");
        Ok(())
    }

    /// Address the listener is bound to, once listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listening.as_ref().map(|l| l.local_addr)
    }

    /// Handle for stopping the reactor from elsewhere. Requires `listen`.
    pub fn stop_handle(&self) -> Option<StopHandle> {
        self.listening.as_ref().map(|l| StopHandle {
            stop_requested: Arc::clone(&l.stop_requested),
            waker: Arc::clone(&l.waker),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Run the event loop until stopped.
    ///
    /// Returns after a [`StopHandle::stop`] or a fatal poll error; in both
    /// cases every resource has been released.
    pub fn run(&mut self) -> Result<(), ReactorError> {
        if self.listening.is_none() {
            error!("Server not listening");
            return Err(ReactorError::NotListening);
        }

        self.running = true;
        let mut events = Events::with_capacity(self.config.events_capacity);
        info!("Starting event loop");

        let mut result = Ok(());
        while self.running {
            let Some(listening) = self.listening.as_mut() else {
                break;
            };
            if listening.stop_requested.load(Ordering::SeqCst) {
                break;
            }

            // Buffered input is waiting; only collect what is already ready
            let timeout = if self.rereads.is_empty() {
                None
            } else {
                Some(Duration::ZERO)
            };
            if let Err(e) = listening.poll.poll(&mut events, timeout) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                error!(error = %e, "Poll failed");
                result = Err(ReactorError::Wait(e));
                break;
            }

            for event in events.iter() {
                match event.token() {
                    LISTENER_TOKEN => self.accept_connections(),
                    WAKER_TOKEN => {}
                    Token(conn_id) => self.handle_connection_event(conn_id, event),
                }
            }

            self.process_rereads();
        }

        self.stop();
        info!("Event loop stopped");
        result
    }

    /// Close every connection and release the listener and poll handle.
    /// Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.running = false;
        self.rereads.clear();

        let closed = self.connections.len();
        for mut entry in self.connections.drain() {
            entry.conn.close();
        }
        if closed > 0 {
            debug!(closed, "Closed connections");
        }

        if let Some(listening) = self.listening.take() {
            debug!(addr = %listening.local_addr, "Listener closed");
        }
    }

    /// Accept until the listener would block.
    fn accept_connections(&mut self) {
        let Some(listening) = self.listening.as_ref() else {
            return;
        };

        loop {
            let (stream, peer) = match listening.listener.accept() {
                Ok(accepted) => accepted,
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    error!(error = %e, "Accept error");
                    break;
                }
            };

            if self.connections.is_full() {
                warn!(peer = %peer, "Connection limit reached");
                continue;
            }

            let Some(conn) = self.factory.new_connection(stream, peer) else {
                debug!(peer = %peer, "Connection rejected by factory");
                continue;
            };

            let conn_id = match self.connections.insert(conn, peer) {
                Ok(id) => id,
                Err(mut conn) => {
                    warn!(peer = %peer, "Connection limit reached");
                    conn.close();
                    continue;
                }
            };

            let registered = match self.connections.get_mut(conn_id) {
                Some(entry) => match entry.conn.source() {
                    Some(source) => listening
                        .poll
                        .registry()
                        .register(source, Token(conn_id), Interest::READABLE),
                    None => Err(io::Error::new(
                        io::ErrorKind::NotConnected,
                        "connection closed before registration",
                    )),
                },
                None => continue,
            };

            if let Err(e) = registered {
                warn!(peer = %peer, error = %e, "Failed to register connection");
                if let Some(mut entry) = self.connections.remove(conn_id) {
                    entry.conn.close();
                }
                continue;
            }

            debug!(
                conn_id,
                peer = %peer,
                connections = self.connections.len(),
                "Accepted connection"
            );

            if let Some(entry) = self.connections.get_mut(conn_id) {
                entry.conn.on_start();
            }
            settle(listening, &mut self.connections, &mut self.rereads, conn_id);
        }
    }

    fn handle_connection_event(&mut self, conn_id: usize, event: &Event) {
        let Some(listening) = self.listening.as_ref() else {
            return;
        };
        let Some(entry) = self.connections.get_mut(conn_id) else {
            return;
        };

        if event.is_error() || (event.is_read_closed() && event.is_write_closed()) {
            debug!(conn_id, peer = %entry.peer, "Connection error or hangup");
            remove_connection(listening, &mut self.connections, conn_id);
            return;
        }

        if event.is_readable() || event.is_read_closed() {
            entry.conn.on_readable();
        }

        // Re-check: the read path may have closed the connection
        if event.is_writable() && !entry.conn.is_closed() {
            entry.conn.on_writable();
        }

        settle(listening, &mut self.connections, &mut self.rereads, conn_id);
    }

    /// Give each connection queued for rereading one more read turn.
    fn process_rereads(&mut self) {
        let pending = std::mem::take(&mut self.rereads);
        for conn_id in pending {
            let Some(listening) = self.listening.as_ref() else {
                return;
            };
            let Some(entry) = self.connections.get_mut(conn_id) else {
                continue;
            };
            // Token reused by a newer connection
            if !entry.reread_queued {
                continue;
            }
            entry.reread_queued = false;

            if entry.conn.wants_reread() {
                entry.conn.on_readable();
            }
            settle(listening, &mut self.connections, &mut self.rereads, conn_id);
        }
    }
}

impl<F: ConnectionFactory> Drop for Reactor<F> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// After a hook: drop a connection that closed itself, otherwise queue it
/// for rereading if its read hook yielded and bring its registration in line
/// with the write interest it asks for.
fn settle(
    listening: &Listening,
    connections: &mut ConnectionRegistry,
    rereads: &mut VecDeque<usize>,
    conn_id: usize,
) {
    let Some(entry) = connections.get_mut(conn_id) else {
        return;
    };

    if entry.conn.is_closed() {
        remove_connection(listening, connections, conn_id);
        return;
    }

    if entry.conn.wants_reread() && !entry.reread_queued {
        entry.reread_queued = true;
        rereads.push_back(conn_id);
    }

    let wanted = entry.conn.wants_write_interest();
    if wanted == entry.write_interest {
        return;
    }

    let interest = if wanted {
        Interest::READABLE | Interest::WRITABLE
    } else {
        Interest::READABLE
    };
    let result = match entry.conn.source() {
        Some(source) => listening
            .poll
            .registry()
            .reregister(source, Token(conn_id), interest),
        None => Ok(()),
    };

    match result {
        Ok(()) => entry.write_interest = wanted,
        Err(e) => {
            warn!(conn_id, error = %e, "Failed to update interest");
            remove_connection(listening, connections, conn_id);
        }
    }
}

fn remove_connection(listening: &Listening, connections: &mut ConnectionRegistry, conn_id: usize) {
    if let Some(Entry { mut conn, peer, .. }) = connections.remove(conn_id) {
        if let Some(source) = conn.source() {
            if let Err(e) = listening.poll.registry().deregister(source) {
                trace!(conn_id, error = %e, "Deregister failed");
            }
        }
        conn.close();
        debug!(conn_id, peer = %peer, "Connection removed");
    }
}

/// Empty host or `0.0.0.0` means every IPv4 interface.
fn resolve_host(host: &str) -> Result<IpAddr, ReactorError> {
    let host = host.trim();
    if host.is_empty() || host == "0.0.0.0" {
        return Ok(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }
    host.parse()
        .map_err(|_| ReactorError::InvalidAddress(host.to_string()))
}

/// Create a non-blocking TCP listener with SO_REUSEADDR.
fn create_listener(addr: SocketAddr, backlog: i32) -> Result<std::net::TcpListener, ReactorError> {
    let socket = socket2::Socket::new(
        match addr {
            SocketAddr::V4(_) => socket2::Domain::IPV4,
            SocketAddr::V6(_) => socket2::Domain::IPV6,
        },
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )
    .map_err(ReactorError::Socket)?;

    socket
        .set_reuse_address(true)
        .map_err(ReactorError::Socket)?;
    socket.set_nonblocking(true).map_err(ReactorError::Socket)?;
    socket
        .bind(&addr.into())
        .map_err(|e| ReactorError::Bind(addr, e))?;
    socket.listen(backlog).map_err(ReactorError::Listen)?;

    Ok(socket.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{AutoFlagStreamConnection, Connection, PacketHandler, SendQueue};
    use crate::runtime::StreamConnection;
    use crate::wire::{Command, Packet, WireHeader, HEADER_SIZE};
    use mio::net::TcpStream;
    use std::io::{Read, Write};
    use std::net::TcpStream as StdTcpStream;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Instant;

    struct Echo;

    impl PacketHandler for Echo {
        fn on_packet(&mut self, packet: Packet, queue: &mut SendQueue) {
            if packet.header().is(Command::Default) {
                queue.send(packet);
            }
        }
    }

    struct EchoFactory {
        auto_flag: bool,
    }

    impl ConnectionFactory for EchoFactory {
        fn new_connection(
            &mut self,
            stream: TcpStream,
            peer: SocketAddr,
        ) -> Option<Box<dyn Connection>> {
            let conn = StreamConnection::new(stream, Echo).with_peer(peer);
            if self.auto_flag {
                Some(Box::new(AutoFlagStreamConnection::new(conn)))
            } else {
                Some(Box::new(conn))
            }
        }
    }

    struct RejectAll;

    impl ConnectionFactory for RejectAll {
        fn new_connection(&mut self, _: TcpStream, _: SocketAddr) -> Option<Box<dyn Connection>> {
            None
        }
    }

    /// Run a reactor on a background thread bound to an ephemeral port.
    fn spawn<F>(factory: F) -> (SocketAddr, StopHandle, thread::JoinHandle<()>)
    where
        F: ConnectionFactory + Send + 'static,
    {
        spawn_with(factory, ReactorConfig::default())
    }

    fn spawn_with<F>(
        factory: F,
        config: ReactorConfig,
    ) -> (SocketAddr, StopHandle, thread::JoinHandle<()>)
    where
        F: ConnectionFactory + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            let mut reactor = Reactor::new(factory, config);
            reactor.listen("127.0.0.1", 0).unwrap();
            tx.send((reactor.local_addr().unwrap(), reactor.stop_handle().unwrap()))
                .unwrap();
            reactor.run().unwrap();
        });
        let (addr, stop) = rx.recv().unwrap();
        (addr, stop, handle)
    }

    fn connect(addr: SocketAddr) -> StdTcpStream {
        let stream = StdTcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(10)))
            .unwrap();
        stream
    }

    fn read_packet(stream: &mut StdTcpStream) -> Packet {
        let mut header = [0u8; HEADER_SIZE];
        stream.read_exact(&mut header).unwrap();
        let header = WireHeader::from_bytes(&header);
        let mut payload = vec![0u8; header.length as usize];
        stream.read_exact(&mut payload).unwrap();
        Packet::new(header, payload).unwrap()
    }

    #[test]
    fn test_echo_round_trip() {
        let (addr, stop, handle) = spawn(EchoFactory { auto_flag: true });
        let mut client = connect(addr);

        let request = Packet::with_command(Command::Default, b"hello".to_vec()).unwrap();
        client.write_all(&request.to_bytes()).unwrap();

        let reply = read_packet(&mut client);
        assert_eq!(reply.header().kind(), Some(Command::Default));
        assert_eq!(reply.header().length, 5);
        assert_eq!(reply.payload().as_slice(), b"hello");

        stop.stop().unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_zero_length_and_fragmented_requests() {
        let (addr, stop, handle) = spawn(EchoFactory { auto_flag: false });
        let mut client = connect(addr);
        client.set_nodelay(true).unwrap();

        let empty = Packet::with_command(Command::Default, Vec::new()).unwrap();
        client.write_all(&empty.to_bytes()).unwrap();
        assert_eq!(read_packet(&mut client), empty);

        // Deliver a packet a few bytes at a time
        let request = Packet::with_command(Command::Default, b"fragmented".to_vec()).unwrap();
        for chunk in request.to_bytes().chunks(3) {
            client.write_all(chunk).unwrap();
            thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(read_packet(&mut client), request);

        stop.stop().unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_non_default_commands_are_not_echoed() {
        let (addr, stop, handle) = spawn(EchoFactory { auto_flag: true });
        let mut client = connect(addr);

        let ack = Packet::with_command(Command::Ack, b"skip".to_vec()).unwrap();
        let data = Packet::with_command(Command::Default, b"keep".to_vec()).unwrap();
        client.write_all(&ack.to_bytes()).unwrap();
        client.write_all(&data.to_bytes()).unwrap();

        // Only the DEFAULT packet comes back
        assert_eq!(read_packet(&mut client), data);

        stop.stop().unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_large_reply_does_not_block_other_connections() {
        let (addr, stop, handle) = spawn(EchoFactory { auto_flag: true });
        let mut slow = connect(addr);
        let mut fast = connect(addr);

        // Queue a multi-megabyte echo on a client that is not reading yet
        let big: Vec<u8> = (0..4 * 1024 * 1024).map(|i| (i % 253) as u8).collect();
        let big = Packet::with_command(Command::Default, big).unwrap();
        slow.write_all(&big.to_bytes()).unwrap();

        let small = Packet::with_command(Command::Default, b"ping".to_vec()).unwrap();
        fast.write_all(&small.to_bytes()).unwrap();
        assert_eq!(read_packet(&mut fast), small);

        assert_eq!(read_packet(&mut slow), big);

        stop.stop().unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_fifo_per_connection() {
        let (addr, stop, handle) = spawn(EchoFactory { auto_flag: true });
        let mut client = connect(addr);

        let packets: Vec<Packet> = (0..20u32)
            .map(|i| {
                let mut p =
                    Packet::with_command(Command::Default, vec![i as u8; (i * 100) as usize])
                        .unwrap();
                p.set_extras(i, 0);
                p
            })
            .collect();
        for p in &packets {
            client.write_all(&p.to_bytes()).unwrap();
        }
        for p in &packets {
            assert_eq!(&read_packet(&mut client), p);
        }

        stop.stop().unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_flooding_peer_does_not_starve_others() {
        let (addr, stop, handle) = spawn(EchoFactory { auto_flag: true });

        // Back-to-back zero-length ACKs: cheap to decode, never answered
        let ack = Packet::with_command(Command::Ack, Vec::new()).unwrap();
        let batch: Vec<u8> = (0..4096).flat_map(|_| ack.to_bytes().to_vec()).collect();

        let done = Arc::new(AtomicBool::new(false));
        let mut flooder = connect(addr);
        let flooding = {
            let done = Arc::clone(&done);
            thread::spawn(move || {
                while !done.load(Ordering::SeqCst) {
                    if flooder.write_all(&batch).is_err() {
                        break;
                    }
                }
            })
        };
        thread::sleep(Duration::from_millis(50));

        let mut client = connect(addr);
        client
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let ping = Packet::with_command(Command::Default, b"ping".to_vec()).unwrap();
        let started = Instant::now();
        client.write_all(&ping.to_bytes()).unwrap();
        assert_eq!(read_packet(&mut client), ping);
        assert!(started.elapsed() < Duration::from_secs(5));

        done.store(true, Ordering::SeqCst);
        stop.stop().unwrap();
        handle.join().unwrap();
        flooding.join().unwrap();
    }

    #[test]
    fn test_closed_connections_free_their_slot() {
        let config = ReactorConfig {
            max_connections: 1,
            ..ReactorConfig::default()
        };
        let (addr, stop, handle) = spawn_with(EchoFactory { auto_flag: true }, config);

        for round in 0..5u8 {
            let mut client = connect(addr);
            let request = Packet::with_command(Command::Default, vec![round; 8]).unwrap();
            client.write_all(&request.to_bytes()).unwrap();
            assert_eq!(read_packet(&mut client), request);

            // The only slot is reused once the reactor sees the EOF
            drop(client);
            thread::sleep(Duration::from_millis(50));
        }

        stop.stop().unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_stop_handle_does_not_survive_relisten() {
        let mut reactor = Reactor::new(RejectAll, ReactorConfig::default());
        reactor.listen("127.0.0.1", 0).unwrap();
        let stale = reactor.stop_handle().unwrap();

        reactor.listen("127.0.0.1", 0).unwrap();
        let _ = stale.stop();

        assert!(stale.is_stop_requested());
        assert!(!reactor.stop_handle().unwrap().is_stop_requested());
    }

    #[test]
    fn test_peer_close_mid_header() {
        let (addr, stop, handle) = spawn(EchoFactory { auto_flag: true });

        let mut client = connect(addr);
        let request = Packet::with_command(Command::Default, b"x".to_vec()).unwrap();
        client.write_all(&request.to_bytes()[..2]).unwrap();
        drop(client);

        // The server keeps serving other clients
        let mut other = connect(addr);
        other.write_all(&request.to_bytes()).unwrap();
        assert_eq!(read_packet(&mut other), request);

        stop.stop().unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_rejected_connection_is_closed() {
        let (addr, stop, handle) = spawn(RejectAll);
        let mut client = connect(addr);

        let mut buf = [0u8; 1];
        // Either a clean EOF or a reset, never data
        match client.read(&mut buf) {
            Ok(n) => assert_eq!(n, 0),
            Err(e) => assert_ne!(e.kind(), io::ErrorKind::WouldBlock),
        }

        stop.stop().unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_stop_wakes_idle_loop() {
        let (_addr, stop, handle) = spawn(EchoFactory { auto_flag: true });
        thread::sleep(Duration::from_millis(50));

        stop.stop().unwrap();
        assert!(stop.is_stop_requested());
        handle.join().unwrap();
    }

    #[test]
    fn test_run_without_listen() {
        let mut reactor = Reactor::new(RejectAll, ReactorConfig::default());
        assert!(matches!(reactor.run(), Err(ReactorError::NotListening)));
        assert!(reactor.stop_handle().is_none());
    }

    #[test]
    fn test_listen_invalid_host() {
        let mut reactor = Reactor::new(RejectAll, ReactorConfig::default());
        let err = reactor.listen("not-an-address", 0).unwrap_err();
        assert!(matches!(err, ReactorError::InvalidAddress(_)));
        assert!(reactor.local_addr().is_none());
    }

    #[test]
    fn test_listen_port_in_use() {
        let mut first = Reactor::new(RejectAll, ReactorConfig::default());
        first.listen("127.0.0.1", 0).unwrap();
        let port = first.local_addr().unwrap().port();

        let mut second = Reactor::new(RejectAll, ReactorConfig::default());
        let err = second.listen("127.0.0.1", port).unwrap_err();
        assert!(matches!(err, ReactorError::Bind(_, _)));
        assert!(second.local_addr().is_none());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut reactor = Reactor::new(RejectAll, ReactorConfig::default());
        reactor.listen("", 0).unwrap();
        assert!(reactor.local_addr().unwrap().ip().is_unspecified());

        reactor.stop();
        reactor.stop();
        assert!(reactor.local_addr().is_none());
        assert!(!reactor.is_running());
        assert_eq!(reactor.connection_count(), 0);
    }

    #[test]
    fn test_resolve_host() {
        assert_eq!(
            resolve_host("").unwrap(),
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        );
        assert_eq!(
            resolve_host("0.0.0.0").unwrap(),
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        );
        assert_eq!(
            resolve_host("127.0.0.1").unwrap(),
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        );
        assert!(resolve_host("::1").unwrap().is_ipv6());
        assert!(resolve_host("localhost!").is_err());
    }
}
