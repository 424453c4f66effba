// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Link to a fjåge master container: JSON line frames over a byte stream.

pub mod connection;
pub mod connector;
pub mod frame;

pub use connection::{FrameReader, FrameWriter, MAX_FRAME_SIZE};
pub use connector::{
    spawn_link, Connector, FrameReceiver, FrameSender, StreamConnector, TcpConnector,
};
pub use frame::{Frame, RequestFrame, ResponseFrame};
