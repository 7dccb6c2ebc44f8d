// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared fixtures for the HTTP integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, header};
use axum::response::Response;
use curtain_closer::broadcast::{Broadcaster, Subscription, channel};
use curtain_closer::demo::DemoLinks;
use curtain_closer::device::{CurtainController, DeviceConfig, DeviceStore, InMemoryDeviceStore};
use curtain_closer::server::{AppState, StaticKeyIdentity, build_router};
use curtain_closer::token::{ExtendPolicy, TokenRegistry};
use curtain_closer::{ManualClock, Timestamp};

pub const KEY: &str = "test-dashboard-key";
pub const START: i64 = 1_700_000_000_000;

/// Router plus handles on its internals.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub received: Arc<Mutex<Vec<String>>>,
    _recorder: Subscription,
}

impl TestApp {
    pub fn new(device: Option<DeviceConfig>) -> Self {
        Self::with_policy(device, ExtendPolicy::Lenient)
    }

    pub fn with_policy(device: Option<DeviceConfig>, policy: ExtendPolicy) -> Self {
        let clock = Arc::new(ManualClock::new(START));
        let registry = TokenRegistry::new()
            .with_clock(clock.clone())
            .with_extend_policy(policy);
        let store: Arc<dyn DeviceStore> = match device {
            Some(config) => Arc::new(InMemoryDeviceStore::with_config(config)),
            None => Arc::new(InMemoryDeviceStore::new()),
        };
        let broadcaster = Broadcaster::new();

        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let recorder = broadcaster.subscribe_scoped(channel::MESSAGE, move |payload| {
            sink.lock().unwrap().push(payload.to_string());
        });

        let links = DemoLinks::new(
            Arc::new(registry),
            CurtainController::new(store, broadcaster),
        );
        let state = AppState::new(links, Arc::new(StaticKeyIdentity::new(KEY)));

        Self {
            router: build_router(state.clone()),
            state,
            clock,
            received,
            _recorder: recorder,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        use tower::ServiceExt;
        self.router.clone().oneshot(request).await.expect("response")
    }

    /// Issues a token directly through the registry.
    pub fn issue_token(&self) -> String {
        self.state.links.registry().create().into_string()
    }

    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

    pub fn now(&self) -> Timestamp {
        use curtain_closer::Clock;
        self.clock.now()
    }
}

pub async fn read_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub fn authed_get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {KEY}"))
        .body(Body::empty())
        .expect("request")
}

pub fn form(uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
    form_request(uri, fields, false)
}

pub fn authed_form(uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
    form_request(uri, fields, true)
}

fn form_request(uri: &str, fields: &[(&str, &str)], authed: bool) -> Request<Body> {
    let body = fields
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::HOST, "curtain.local:3000");
    if authed {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {KEY}"));
    }
    builder.body(Body::from(body)).expect("request")
}

pub fn authed_json(method: &str, uri: &str, value: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {KEY}"))
        .body(Body::from(value.to_string()))
        .expect("request")
}
