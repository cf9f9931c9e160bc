//! WebSocket push transport.
//!
//! One accept thread polls a non-blocking listener so it can see the stop
//! flag; every listener gets its own thread and its own hub subscription.
//! A listener that errors or disconnects only takes itself down.

use chrono::Utc;
use scalebridge_core::control::{control_reply, welcome_message};
use scalebridge_core::{BridgeError, BroadcastHub, Subscription};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use tungstenite::{Message, WebSocket};

const ACCEPT_POLL: Duration = Duration::from_millis(50);
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
const LISTENER_POLL: Duration = Duration::from_millis(50);

pub struct WsServer {
    addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<JoinHandle<()>>,
}

impl WsServer {
    /// Bind `bind` and start accepting listeners on a background thread.
    pub fn start(
        bind: &str,
        hub: Arc<BroadcastHub>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Self, BridgeError> {
        let listener = TcpListener::bind(bind)
            .map_err(|e| BridgeError::Io(format!("bind websocket {bind}: {e}")))?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;

        let stop = shutdown.clone();
        let join_handle = std::thread::Builder::new()
            .name("ws-accept".into())
            .spawn(move || accept_loop(&listener, &hub, &stop))?;

        tracing::info!(%addr, "websocket server listening");
        Ok(Self {
            addr,
            shutdown,
            join_handle: Some(join_handle),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for WsServer {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            if handle.join().is_err() {
                tracing::warn!("websocket accept thread panicked during shutdown");
            }
        }
        tracing::info!("websocket server stopped");
    }
}

fn accept_loop(listener: &TcpListener, hub: &Arc<BroadcastHub>, stop: &Arc<AtomicBool>) {
    let mut clients: Vec<JoinHandle<()>> = Vec::new();
    while !stop.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, peer)) => {
                let hub = hub.clone();
                let stop = stop.clone();
                match std::thread::Builder::new()
                    .name(format!("ws-{peer}"))
                    .spawn(move || serve_listener(stream, peer, &hub, &stop))
                {
                    Ok(h) => clients.push(h),
                    Err(e) => tracing::warn!(%peer, error = %e, "cannot spawn listener thread"),
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(ACCEPT_POLL);
            }
            Err(e) => {
                tracing::warn!(error = %e, "websocket accept failed");
                std::thread::sleep(ACCEPT_POLL);
            }
        }
        clients.retain(|h| !h.is_finished());
    }
    for h in clients {
        let _ = h.join();
    }
}

fn is_poll_timeout(e: &tungstenite::Error) -> bool {
    matches!(
        e,
        tungstenite::Error::Io(io)
            if matches!(io.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut)
    )
}

fn handshake(stream: TcpStream) -> std::io::Result<WebSocket<TcpStream>> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT))?;
    let ws = tungstenite::accept(stream).map_err(|e| std::io::Error::other(e.to_string()))?;
    ws.get_ref().set_read_timeout(Some(LISTENER_POLL))?;
    Ok(ws)
}

fn serve_listener(stream: TcpStream, peer: SocketAddr, hub: &BroadcastHub, stop: &AtomicBool) {
    let mut ws = match handshake(stream) {
        Ok(ws) => ws,
        Err(e) => {
            tracing::debug!(%peer, error = %e, "websocket handshake failed");
            return;
        }
    };
    let sub = hub.subscribe();
    tracing::info!(%peer, listener = sub.id(), "listener connected");

    let outcome = pump(&mut ws, &sub, stop);
    hub.unsubscribe(sub.id());
    match outcome {
        Ok(()) => {
            let _ = ws.close(None);
            let _ = ws.flush();
        }
        Err(e) => tracing::debug!(%peer, error = %e, "listener dropped"),
    }
    tracing::info!(%peer, "listener disconnected");
}

/// Forward queued events and answer control messages until the peer leaves
/// (`Err`) or the stop flag is raised (`Ok`).
fn pump(
    ws: &mut WebSocket<TcpStream>,
    sub: &Subscription,
    stop: &AtomicBool,
) -> Result<(), tungstenite::Error> {
    ws.send(Message::Text(welcome_message(Utc::now())))?;
    while !stop.load(Ordering::Relaxed) {
        for msg in sub.drain() {
            ws.send(Message::Text(msg.to_string()))?;
        }
        match ws.read() {
            Ok(Message::Text(text)) => {
                if let Some(reply) = control_reply(&text) {
                    ws.send(Message::Text(reply.to_string()))?;
                }
            }
            Ok(Message::Close(_)) => return Err(tungstenite::Error::ConnectionClosed),
            Ok(_) => {}
            Err(e) if is_poll_timeout(&e) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scalebridge_core::WeighEvent;

    fn text(msg: Message) -> String {
        match msg {
            Message::Text(t) => t,
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn listener_gets_welcome_pong_and_events() {
        let hub = Arc::new(BroadcastHub::new(8));
        let stop = Arc::new(AtomicBool::new(false));
        let server = WsServer::start("127.0.0.1:0", hub.clone(), stop).unwrap();

        let (mut client, _) =
            tungstenite::connect(format!("ws://{}", server.local_addr())).unwrap();
        let hello: serde_json::Value = serde_json::from_str(&text(client.read().unwrap())).unwrap();
        assert_eq!(hello["type"], "connected");

        client
            .send(Message::Text(r#"{"type":"ping"}"#.to_string()))
            .unwrap();
        assert_eq!(text(client.read().unwrap()), r#"{"type":"pong"}"#);

        // subscription is registered before the welcome is sent
        assert_eq!(hub.listener_count(), 1);
        let ev = WeighEvent::new("0002", 2.5, 1200.0, Utc::now());
        hub.publish(&ev).unwrap();
        let got = WeighEvent::from_json(&text(client.read().unwrap())).unwrap();
        assert_eq!(got, ev);

        drop(client);
        drop(server);
        assert_eq!(hub.listener_count(), 0);
    }
}
