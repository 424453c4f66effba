// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Connectors open the byte stream to a master container and turn it into a
//! pair of frame channels.
//!
//! Two tasks own the stream halves: the reader forwards every parsed frame to
//! the inbound channel and ends on EOF or I/O error; the writer drains the
//! outbound channel and shuts the stream down when every sender is gone.

use super::connection::{FrameReader, FrameWriter};
use super::frame::Frame;
use crate::error::{GatewayError, Result};
use log::{debug, error, info};
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

/// Outbound half of a link.
pub type FrameSender = mpsc::UnboundedSender<Frame>;
/// Inbound half of a link; yields `None` once the link is gone.
pub type FrameReceiver = mpsc::UnboundedReceiver<Frame>;

/// Something that can open a link to a master container.
#[allow(async_fn_in_trait)]
pub trait Connector {
    async fn connect(&self) -> Result<(FrameSender, FrameReceiver)>;
}

/// TCP connector (`hostname:port`).
#[derive(Debug, Clone)]
pub struct TcpConnector {
    hostname: String,
    port: u16,
}

impl TcpConnector {
    pub fn new(hostname: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            port,
        }
    }
}

impl Connector for TcpConnector {
    async fn connect(&self) -> Result<(FrameSender, FrameReceiver)> {
        let stream = TcpStream::connect((self.hostname.as_str(), self.port))
            .await
            .map_err(|e| {
                GatewayError::Transport(format!(
                    "connect to {}:{} failed: {}",
                    self.hostname, self.port, e
                ))
            })?;
        stream.set_nodelay(true)?;
        info!("Connected to {}:{}", self.hostname, self.port);
        Ok(spawn_link(stream))
    }
}

/// Connector over an already open stream. Connects once.
pub struct StreamConnector<S> {
    stream: Mutex<Option<S>>,
}

impl<S> StreamConnector<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream: Mutex::new(Some(stream)),
        }
    }
}

impl<S> Connector for StreamConnector<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    async fn connect(&self) -> Result<(FrameSender, FrameReceiver)> {
        let stream = self
            .stream
            .lock()
            .take()
            .ok_or_else(|| GatewayError::InvalidArgument("stream already connected".into()))?;
        Ok(spawn_link(stream))
    }
}

/// Split `stream` and spawn its reader and writer tasks.
///
/// Must be called from within a tokio runtime.
pub fn spawn_link<S>(stream: S) -> (FrameSender, FrameReceiver)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read_half, write_half) = tokio::io::split(stream);
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

    tokio::spawn(read_loop(FrameReader::new(read_half), inbound_tx));
    tokio::spawn(write_loop(FrameWriter::new(write_half), outbound_rx));

    (outbound_tx, inbound_rx)
}

async fn read_loop<R>(mut reader: FrameReader<R>, inbound: FrameSender)
where
    R: AsyncRead + Unpin,
{
    loop {
        match reader.read_frame().await {
            Ok(Some(frame)) => {
                if inbound.send(frame).is_err() {
                    debug!("Link reader stopping: receiver dropped");
                    break;
                }
            }
            Ok(None) => {
                info!("Connection closed by peer");
                break;
            }
            Err(e) => {
                error!("Link read failed: {}", e);
                break;
            }
        }
    }
}

async fn write_loop<W>(mut writer: FrameWriter<W>, mut outbound: FrameReceiver)
where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = outbound.recv().await {
        if let Err(e) = writer.send_frame(&frame).await {
            error!("Link write failed: {}", e);
            return;
        }
    }
    if let Err(e) = writer.shutdown().await {
        debug!("Link shutdown: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::frame::RequestFrame;

    #[tokio::test]
    async fn test_stream_connector_links_both_ends() {
        let (a, b) = tokio::io::duplex(4096);
        let (tx_a, mut rx_a) = StreamConnector::new(a).connect().await.expect("connect a");
        let (tx_b, mut rx_b) = spawn_link(b);

        tx_a.send(Frame::Alive(true)).expect("send");
        assert_eq!(rx_b.recv().await, Some(Frame::Alive(true)));

        let query = Frame::Request(RequestFrame::Agents { id: "1".into() });
        tx_b.send(query.clone()).expect("send");
        assert_eq!(rx_a.recv().await, Some(query));
    }

    #[tokio::test]
    async fn test_stream_connector_connects_once() {
        let (a, _b) = tokio::io::duplex(64);
        let connector = StreamConnector::new(a);
        assert!(connector.connect().await.is_ok());
        assert!(matches!(
            connector.connect().await,
            Err(GatewayError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_dropping_sender_closes_peer() {
        let (a, b) = tokio::io::duplex(64);
        let (tx_a, _rx_a) = spawn_link(a);
        let (_tx_b, mut rx_b) = spawn_link(b);

        drop(tx_a);
        assert_eq!(rx_b.recv().await, None);
    }

    #[tokio::test]
    async fn test_tcp_connect_failure_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);

        let err = TcpConnector::new("127.0.0.1", port).connect().await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));
    }
}
