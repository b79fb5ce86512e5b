//! Executes the core's `HttpRequest`s off the UI thread.
//!
//! One worker thread owns a blocking ureq agent and runs requests in the
//! order they are submitted. The store never hands out a second request
//! before the first completes, so one worker is enough.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use task_core::{ApiError, HttpMethod, HttpRequest, HttpResponse};
use tracing::{debug, warn};
use ureq::typestate::WithBody;
use ureq::{Agent, RequestBuilder};

pub type Outcome = Result<HttpResponse, ApiError>;

pub struct Executor {
    requests: Sender<HttpRequest>,
    outcomes: Receiver<Outcome>,
    _worker: JoinHandle<()>,
}

impl Executor {
    pub fn spawn(timeout: Duration) -> Result<Self> {
        let (requests, inbox) = mpsc::channel::<HttpRequest>();
        let (outbox, outcomes) = mpsc::channel::<Outcome>();
        let agent = agent(timeout);

        let worker = thread::Builder::new()
            .name("http".to_string())
            .spawn(move || {
                for request in inbox {
                    if outbox.send(execute(&agent, request)).is_err() {
                        break;
                    }
                }
                debug!("http worker exiting");
            })
            .context("Failed to start http worker")?;

        Ok(Self {
            requests,
            outcomes,
            _worker: worker,
        })
    }

    pub fn submit(&self, request: HttpRequest) -> Result<()> {
        self.requests.send(request).context("http worker stopped")
    }

    pub fn try_recv(&self) -> Option<Outcome> {
        self.outcomes.try_recv().ok()
    }
}

/// Non-2xx statuses come back as responses; the core interprets them.
pub fn agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(Some(timeout))
        .build()
        .new_agent()
}

pub fn execute(agent: &Agent, request: HttpRequest) -> Outcome {
    debug!(method = %request.method, path = %request.path, "executing request");
    let headers = request.headers;
    let result = match request.method {
        HttpMethod::Get => with_headers(agent.get(&request.path), &headers).call(),
        HttpMethod::Delete => with_headers(agent.delete(&request.path), &headers).call(),
        HttpMethod::Post => send(with_headers(agent.post(&request.path), &headers), request.body),
        HttpMethod::Put => send(with_headers(agent.put(&request.path), &headers), request.body),
    };

    let mut response = result.map_err(|e| {
        warn!(error = %e, "request failed before a response");
        ApiError::Transport(e.to_string())
    })?;
    let status = response.status().as_u16();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    debug!(status, bytes = body.len(), "response received");
    Ok(HttpResponse::new(status, body))
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send(
    builder: RequestBuilder<WithBody>,
    body: Option<String>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}
