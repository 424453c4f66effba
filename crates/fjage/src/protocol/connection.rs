// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Newline-delimited frame I/O over an async byte stream.

use super::frame::Frame;
use crate::error::{GatewayError, Result};
use log::{debug, warn};
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};

/// Upper bound on one frame, in bytes.
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Reads frames, skipping blank, oversized and unparsable lines.
pub struct FrameReader<R> {
    reader: BufReader<R>,
    line: Vec<u8>,
    max_frame: usize,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_max_frame_size(reader, MAX_FRAME_SIZE)
    }

    /// Reader that drops lines longer than `max_frame` bytes.
    pub fn with_max_frame_size(reader: R, max_frame: usize) -> Self {
        Self {
            reader: BufReader::new(reader),
            line: Vec::new(),
            max_frame,
        }
    }

    /// Next frame, or `None` once the peer closed the stream.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            self.line.clear();
            // never buffer more than one frame plus its newline
            let limit = self.max_frame as u64 + 1;
            let n = (&mut self.reader)
                .take(limit)
                .read_until(b'\n', &mut self.line)
                .await?;
            if n == 0 {
                return Ok(None);
            }
            if self.line.len() > self.max_frame && !self.line.ends_with(b"\n") {
                warn!("Dropping oversized frame (over {} bytes)", self.max_frame);
                self.discard_line().await?;
                continue;
            }

            let line = self.line.trim_ascii();
            if line.is_empty() {
                continue;
            }

            match Frame::from_slice(line) {
                Ok(frame) => {
                    debug!("<< {}", String::from_utf8_lossy(line));
                    return Ok(Some(frame));
                }
                Err(e) => warn!("Skipping unparsable frame: {}", e),
            }
        }
    }

    /// Consume input up to and including the next newline.
    async fn discard_line(&mut self) -> Result<()> {
        loop {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                return Ok(());
            }
            match buf.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    self.reader.consume(pos + 1);
                    return Ok(());
                }
                None => {
                    let len = buf.len();
                    self.reader.consume(len);
                }
            }
        }
    }
}

/// Writes frames, one line each.
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub async fn send_frame(&mut self, frame: &Frame) -> Result<()> {
        let mut line = frame.to_json()?;
        if line.len() > MAX_FRAME_SIZE {
            return Err(GatewayError::InvalidArgument(format!(
                "frame too large: {} > {}",
                line.len(),
                MAX_FRAME_SIZE
            )));
        }
        debug!(">> {}", line);
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}
