//! End-to-end store test against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives the `Store` through
//! a full session over real HTTP using ureq: every request the store hands
//! out is executed and its outcome fed back until the store goes idle.

use task_core::{
    ApiError, FormMode, HttpMethod, HttpRequest, HttpResponse, Intent, StatusView, Store, TaskClient, TaskId,
};

/// Execute an `HttpRequest` using ureq.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data and interpreted by the core.
fn execute(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let result = match (req.method, req.body) {
        (HttpMethod::Get, _) => agent.get(&req.path).call(),
        (HttpMethod::Delete, _) => agent.delete(&req.path).call(),
        (HttpMethod::Post, Some(body)) => {
            agent.post(&req.path).content_type("application/json").send(body.as_bytes())
        }
        (HttpMethod::Post, None) => agent.post(&req.path).send_empty(),
        (HttpMethod::Put, Some(body)) => {
            agent.put(&req.path).content_type("application/json").send(body.as_bytes())
        }
        (HttpMethod::Put, None) => agent.put(&req.path).send_empty(),
    };
    let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();
    Ok(HttpResponse::new(status, body))
}

/// Feed requests back into the store until it has nothing left to send.
/// Returns the requests executed, in order.
fn settle(store: &mut Store, first: Option<HttpRequest>) -> Vec<(HttpMethod, String)> {
    let mut executed = Vec::new();
    let mut next = first;
    while let Some(req) = next {
        executed.push((req.method, req.path.clone()));
        next = store.complete(execute(req));
    }
    executed
}

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}/api")
}

fn rows(store: &Store) -> Vec<(String, bool)> {
    match task_core::render(store).status {
        StatusView::List(rows) => rows.into_iter().map(|r| (r.title, r.completed)).collect(),
        StatusView::Empty => Vec::new(),
        other => panic!("unexpected status: {other:?}"),
    }
}

#[test]
fn store_session_against_mock_server() {
    let base = start_server();
    let mut store = Store::new(TaskClient::new(&base));

    // Step 1: initial fetch: empty.
    let first = store.fetch_tasks();
    settle(&mut store, first);
    assert_eq!(task_core::render(&store).status, StatusView::Empty);

    // Step 2: create two tasks; each create is followed by a refetch.
    store.set_title("Write report");
    store.set_description("quarterly numbers");
    let first = store.dispatch(Intent::Submit);
    let executed = settle(&mut store, first);
    assert_eq!(executed.iter().map(|(m, _)| *m).collect::<Vec<_>>(), vec![HttpMethod::Post, HttpMethod::Get]);
    assert!(store.form().is_empty());

    store.set_title("Water plants");
    let first = store.dispatch(Intent::Submit);
    settle(&mut store, first);
    assert_eq!(
        rows(&store),
        vec![("Write report".to_string(), false), ("Water plants".to_string(), false)]
    );
    let report = store.tasks()[0].clone();
    assert_eq!(report.description, "quarterly numbers");

    // Step 3: toggle the first one, then toggle it back.
    let first = store.dispatch(Intent::Toggle(report.id));
    settle(&mut store, first);
    assert!(store.task(report.id).unwrap().completed);
    let first = store.dispatch(Intent::Toggle(report.id));
    settle(&mut store, first);
    assert!(!store.task(report.id).unwrap().completed);

    // Two toggles before the first one returns end where they started.
    let first = store.dispatch(Intent::Toggle(report.id));
    assert!(store.dispatch(Intent::Toggle(report.id)).is_none());
    let executed = settle(&mut store, first);
    assert_eq!(
        executed.iter().map(|(m, _)| *m).collect::<Vec<_>>(),
        vec![HttpMethod::Put, HttpMethod::Put, HttpMethod::Get]
    );
    assert!(!store.task(report.id).unwrap().completed);

    // Step 4: complete it, then edit the title; completed must survive.
    let first = store.dispatch(Intent::Toggle(report.id));
    settle(&mut store, first);
    store.dispatch(Intent::Edit(report.id));
    assert_eq!(store.form().mode(), FormMode::Edit(report.id));
    store.set_title("Write annual report");
    let first = store.dispatch(Intent::Submit);
    settle(&mut store, first);
    let edited = store.task(report.id).unwrap();
    assert_eq!(edited.title, "Write annual report");
    assert!(edited.completed);
    assert_eq!(edited.created_at, report.created_at);
    assert_eq!(store.form().mode(), FormMode::Create);

    // Step 5: decline a delete: nothing is sent.
    store.dispatch(Intent::Delete(report.id));
    assert!(store.dispatch(Intent::Decline).is_none());
    assert_eq!(store.tasks().len(), 2);

    // Step 6: confirm the delete.
    store.dispatch(Intent::Delete(report.id));
    let first = store.dispatch(Intent::Confirm);
    let executed = settle(&mut store, first);
    assert_eq!(executed[0], (HttpMethod::Delete, format!("{base}/tasks/{}", report.id)));
    assert_eq!(rows(&store), vec![("Water plants".to_string(), false)]);

    // Step 7: deleting a task that is already gone fails quietly and refetches.
    store.dispatch(Intent::Delete(report.id));
    let first = store.dispatch(Intent::Confirm);
    let executed = settle(&mut store, first);
    assert_eq!(executed.len(), 2);
    assert!(store.notice().unwrap().text().starts_with("Could not delete task"));
    assert!(store.error().is_none());
}

#[test]
fn unreachable_backend_shows_error_and_keeps_list() {
    let base = start_server();
    let mut store = Store::new(TaskClient::new(&base));
    store.set_title("Survives outage");
    let first = store.dispatch(Intent::Submit);
    settle(&mut store, first);
    assert_eq!(store.tasks().len(), 1);

    // Bind then drop to get a port nothing listens on, and send the next
    // fetch there instead.
    let dead = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let req = store.fetch_tasks().unwrap();
    let req = HttpRequest {
        path: req.path.replace(&base, &format!("http://{dead}/api")),
        ..req
    };
    assert!(store.complete(execute(req)).is_none());

    match task_core::render(&store).status {
        StatusView::Failed { retry, .. } => assert_eq!(retry.intent, Intent::Retry),
        other => panic!("expected error panel, got {other:?}"),
    }
    assert!(store.error().unwrap().starts_with("transport failed"));
    assert_eq!(store.tasks().len(), 1);
    assert_eq!(store.tasks()[0].title, "Survives outage");
}

#[test]
fn unknown_task_id_is_not_sent() {
    let mut store = Store::new(TaskClient::new("http://127.0.0.1:9/api"));
    assert!(store.dispatch(Intent::Toggle(TaskId(42))).is_none());
    assert!(!store.is_busy());
}
