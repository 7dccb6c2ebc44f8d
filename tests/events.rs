// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the server-sent event stream.

mod common;

use std::time::Duration;

use axum::body::Body;
use axum::http::{StatusCode, header};
use common::{TestApp, form, get};
use curtain_closer::broadcast::channel;
use curtain_closer::device::DeviceConfig;
use curtain_closer::server::{DEFAULT_HEARTBEAT_INTERVAL, build_router};
use tokio_stream::StreamExt;

async fn next_chunk<S>(stream: &mut S) -> String
where
    S: tokio_stream::Stream<Item = Result<axum::body::Bytes, axum::Error>> + Unpin,
{
    let chunk = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("chunk before timeout")
        .expect("stream open")
        .expect("chunk");
    String::from_utf8(chunk.to_vec()).expect("utf-8")
}

/// Reads until a chunk contains `needle`, skipping heartbeats.
async fn chunk_containing<S>(stream: &mut S, needle: &str) -> String
where
    S: tokio_stream::Stream<Item = Result<axum::body::Bytes, axum::Error>> + Unpin,
{
    loop {
        let chunk = next_chunk(stream).await;
        if chunk.contains(needle) {
            return chunk;
        }
    }
}

fn open_stream(body: Body) -> impl tokio_stream::Stream<Item = Result<axum::body::Bytes, axum::Error>> + Unpin {
    body.into_data_stream()
}

#[tokio::test]
async fn stream_greets_with_heartbeat() {
    let app = TestApp::new(None);
    let response = app.send(get("/api/events")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");

    let mut stream = open_stream(response.into_body());
    let first = next_chunk(&mut stream).await;
    assert!(first.contains("event: heartbeat"), "got {first:?}");
}

#[tokio::test]
async fn heartbeat_repeats_on_interval() {
    let mut app = TestApp::new(None);
    app.state = app
        .state
        .clone()
        .with_heartbeat_interval(Duration::from_millis(200));
    app.router = build_router(app.state.clone());

    let mut stream = open_stream(app.send(get("/api/events")).await.into_body());
    let opened = tokio::time::Instant::now();
    assert!(next_chunk(&mut stream).await.contains("event: heartbeat"));

    let second = next_chunk(&mut stream).await;
    assert!(second.contains("event: heartbeat"), "got {second:?}");
    assert!(!second.contains("event: message"));
    assert!(opened.elapsed() >= Duration::from_millis(150));
}

#[tokio::test]
async fn zero_heartbeat_interval_still_serves_stream() {
    let mut app = TestApp::new(None);
    app.state = app.state.clone().with_heartbeat_interval(Duration::ZERO);
    assert_eq!(app.state.heartbeat_interval, DEFAULT_HEARTBEAT_INTERVAL);

    // Bypass the builder as well; the handler must not hand zero to the timer.
    app.state.heartbeat_interval = Duration::ZERO;
    app.router = build_router(app.state.clone());

    let response = app.send(get("/api/events")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let mut stream = open_stream(response.into_body());
    assert!(next_chunk(&mut stream).await.contains("event: heartbeat"));

    app.state.broadcaster.publish(channel::MESSAGE, "rotate:1");
    assert!(chunk_containing(&mut stream, "rotate:1").await.contains("event: message"));
}

#[tokio::test]
async fn device_action_is_pushed_to_stream() {
    let app = TestApp::new(Some(DeviceConfig::new(5, 5)));
    let response = app.send(get("/api/events")).await;
    let mut stream = open_stream(response.into_body());
    next_chunk(&mut stream).await;

    let token = app.issue_token();
    let action = app
        .send(form(
            "/demo/controls",
            &[("token", token.as_str()), ("action", "open")],
        ))
        .await;
    assert_eq!(action.status(), StatusCode::OK);

    let chunk = chunk_containing(&mut stream, "rotate:5").await;
    assert!(chunk.contains("event: message"));
    assert!(chunk.contains("data: rotate:5"));
}

#[tokio::test]
async fn closing_stream_deregisters_listener() {
    let app = TestApp::new(None);
    let broadcaster = app.state.broadcaster.clone();
    // The test recorder is the only listener so far.
    assert_eq!(broadcaster.listener_count(channel::MESSAGE), 1);

    let response = app.send(get("/api/events")).await;
    let mut stream = open_stream(response.into_body());
    next_chunk(&mut stream).await;
    assert_eq!(broadcaster.listener_count(channel::MESSAGE), 2);

    drop(stream);
    assert_eq!(broadcaster.listener_count(channel::MESSAGE), 1);
    assert_eq!(broadcaster.publish_counted(channel::MESSAGE, "after close"), 1);
}

#[tokio::test]
async fn every_open_stream_receives_each_event() {
    let app = TestApp::new(None);
    let mut first = open_stream(app.send(get("/api/events")).await.into_body());
    let mut second = open_stream(app.send(get("/api/events")).await.into_body());
    next_chunk(&mut first).await;
    next_chunk(&mut second).await;

    app.state.broadcaster.publish(channel::MESSAGE, "rotate:-2");

    assert!(chunk_containing(&mut first, "rotate:-2").await.contains("data: rotate:-2"));
    assert!(chunk_containing(&mut second, "rotate:-2").await.contains("data: rotate:-2"));
}
