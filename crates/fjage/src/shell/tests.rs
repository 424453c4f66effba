// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shell and file requests against the mock container.

use super::*;
use crate::agent::AgentId;
use crate::config::GatewayConfig;
use crate::error::{ErrorCode, GatewayError, RemoteError};
use crate::gateway::Gateway;
use crate::message::Performative;
use crate::testing::MockContainer;
use std::time::Duration;

const SHELL: &str = "shell";

async fn setup() -> (MockContainer, Gateway) {
    let container = MockContainer::new();
    container.add_shell(SHELL);
    let gw = Gateway::connect(&container.connector(), GatewayConfig::default())
        .await
        .expect("connect");
    (container, gw)
}

#[tokio::test]
async fn test_shell_agent_lookup() {
    let (_container, gw) = setup().await;
    assert_eq!(gw.shell_agent().await.expect("shell"), AgentId::new(SHELL));

    let empty = MockContainer::new();
    let gw = Gateway::connect(&empty.connector(), GatewayConfig::default())
        .await
        .expect("connect");
    let err = gw.shell_agent().await.unwrap_err();
    assert!(matches!(err, GatewayError::Remote(RemoteError::NoService { .. })));
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn test_shell_exec_returns_answer() {
    let (container, gw) = setup().await;
    container.shell_answer("1+2", "3");
    let shell = gw.shell_agent().await.expect("shell");

    let ans = gw
        .shell_exec(&shell, "1+2", Duration::from_secs(1))
        .await
        .expect("exec");
    assert_eq!(ans.as_deref(), Some("3"));
}

#[tokio::test]
async fn test_shell_exec_refused() {
    let (_container, gw) = setup().await;
    let err = gw
        .shell_exec(&AgentId::new(SHELL), "rm -rf /", Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Remote(RemoteError::Refused {
            perf: Performative::Refuse
        })
    ));
}

#[tokio::test]
async fn test_get_file_slices() {
    let (container, gw) = setup().await;
    container.add_file("logs/a.txt", b"hello world");
    let shell = AgentId::new(SHELL);

    let whole = gw.get_file(&shell, "logs/a.txt", 0, 0).await.expect("get");
    assert_eq!(whole.contents, b"hello world");
    assert!(!whole.dir);

    let part = gw.get_file(&shell, "logs/a.txt", 6, 3).await.expect("get");
    assert_eq!(part.contents, b"wor");
    assert_eq!(part.ofs, 6);

    let listing = gw.get_file(&shell, "logs/", 0, 0).await.expect("list");
    assert!(listing.dir);
    assert_eq!(listing.contents, b"a.txt");

    let err = gw.get_file(&shell, "missing", 0, 0).await.unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Remote(RemoteError::Refused {
            perf: Performative::Failure
        })
    ));
}

#[tokio::test]
async fn test_put_file_sends_chunks() {
    let (container, gw) = setup().await;
    let shell = AgentId::new(SHELL);
    let contents: Vec<u8> = (0..FILE_CHUNK_SIZE * 2 + 100).map(|i| i as u8).collect();

    gw.put_file(&shell, "big.bin", &contents).await.expect("put");
    assert_eq!(container.put_file_requests(), 3);
    assert_eq!(container.file("big.bin"), Some(contents.clone()));

    let back = gw.get_file(&shell, "big.bin", 0, 0).await.expect("get");
    assert_eq!(back.contents, contents);
}

#[tokio::test]
async fn test_put_file_replaces_and_deletes() {
    let (container, gw) = setup().await;
    let shell = AgentId::new(SHELL);
    container.add_file("note.txt", b"a much longer old note");

    gw.put_file(&shell, "note.txt", b"new").await.expect("put");
    assert_eq!(container.file("note.txt").as_deref(), Some(&b"new"[..]));

    gw.put_file(&shell, "empty.txt", b"").await.expect("put empty");
    assert_eq!(container.file("empty.txt"), Some(Vec::new()));

    gw.delete_file(&shell, "note.txt").await.expect("delete");
    assert_eq!(container.file("note.txt"), None);
    assert!(gw.delete_file(&shell, "note.txt").await.is_err());
}
