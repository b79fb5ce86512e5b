//! View-state store: the single owner of the client's mutable state.
//!
//! # Design
//! The store never performs I/O. Operations that need the backend queue an
//! `Operation` and, when nothing else is in flight, hand the built
//! `HttpRequest` back to the caller. The host executes it and reports the
//! outcome through [`Store::complete`], which applies it and releases the
//! next queued request. One request at a time keeps mutations and their
//! refetches in issue order, so the list can never be overwritten by an
//! older snapshot.
//!
//! Every mutation is followed by a full list fetch; the task list is only
//! ever replaced wholesale by a successful fetch.

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::client::TaskClient;
use crate::error::{ApiError, StoreError};
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{Task, TaskFields, TaskId};

/// Which form input a keystroke goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Description,
}

/// Create vs edit, as seen by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(TaskId),
}

/// Ephemeral form contents plus the task being edited, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    title: String,
    description: String,
    editing: Option<Task>,
}

impl FormState {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn editing(&self) -> Option<&Task> {
        self.editing.as_ref()
    }

    pub fn mode(&self) -> FormMode {
        match &self.editing {
            Some(task) => FormMode::Edit(task.id),
            None => FormMode::Create,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.description.is_empty() && self.editing.is_none()
    }

    fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Title => &mut self.title,
            Field::Description => &mut self.description,
        }
    }

    fn reset(&mut self) {
        *self = FormState::default();
    }
}

/// One-line feedback shown under the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Info(text) | Notice::Error(text) => text,
        }
    }
}

/// What an update writes. The body is built when the request is sent, from
/// the freshest known copy of the task.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Change {
    Toggle,
    /// `completed` is only used when no copy of the task is known any more.
    Edit {
        title: String,
        description: String,
        completed: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Operation {
    Fetch,
    Create(TaskFields),
    Update { id: TaskId, change: Change },
    Delete(TaskId),
}

impl Operation {
    fn label(&self) -> &'static str {
        match self {
            Operation::Fetch => "fetch",
            Operation::Create(_) => "create",
            Operation::Update { .. } => "update",
            Operation::Delete(_) => "delete",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Store {
    client: TaskClient,
    tasks: Vec<Task>,
    form: FormState,
    error: Option<String>,
    notice: Option<Notice>,
    pending_delete: Option<TaskId>,
    queue: VecDeque<Operation>,
    in_flight: Option<Operation>,
    /// Server replies to updates made since the last successful fetch.
    updated: Vec<Task>,
}

impl Store {
    pub fn new(client: TaskClient) -> Self {
        Self {
            client,
            tasks: Vec::new(),
            form: FormState::default(),
            error: None,
            notice: None,
            pending_delete: None,
            queue: VecDeque::new(),
            in_flight: None,
            updated: Vec::new(),
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    /// True while a list fetch is in flight or waiting in the queue.
    pub fn is_loading(&self) -> bool {
        matches!(self.in_flight, Some(Operation::Fetch)) || self.fetch_queued()
    }

    /// Message of the last failed fetch; cleared by the next successful one.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn pending_delete(&self) -> Option<TaskId> {
        self.pending_delete
    }

    /// True while a request is out with the host.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn fetch_tasks(&mut self) -> Option<HttpRequest> {
        self.enqueue(Operation::Fetch)
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.form.title = title.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.form.description = description.into();
    }

    pub fn push_char(&mut self, field: Field, c: char) {
        self.form.field_mut(field).push(c);
    }

    pub fn pop_char(&mut self, field: Field) {
        self.form.field_mut(field).pop();
    }

    /// Submits the form: an update in edit mode, otherwise a create.
    ///
    /// A blank title is rejected before anything is queued and the form is
    /// left untouched.
    pub fn submit(&mut self) -> Result<Option<HttpRequest>, StoreError> {
        if self.form.title.trim().is_empty() {
            self.notice = Some(Notice::Error(StoreError::BlankTitle.to_string()));
            return Err(StoreError::BlankTitle);
        }

        let op = match &self.form.editing {
            Some(editing) => Operation::Update {
                id: editing.id,
                change: Change::Edit {
                    title: self.form.title.clone(),
                    description: self.form.description.clone(),
                    completed: editing.completed,
                },
            },
            None => Operation::Create(TaskFields {
                title: self.form.title.clone(),
                description: self.form.description.clone(),
                completed: false,
            }),
        };
        Ok(self.enqueue(op))
    }

    /// Sends the task back with `completed` inverted. Unknown ids are ignored.
    pub fn toggle_complete(&mut self, id: TaskId) -> Option<HttpRequest> {
        if self.task(id).is_none() {
            warn!(%id, "toggle for unknown task ignored");
            return None;
        }
        self.enqueue(Operation::Update {
            id,
            change: Change::Toggle,
        })
    }

    /// Asks for confirmation before deleting `id`. Nothing is sent until
    /// [`Store::resolve_confirmation`] accepts.
    pub fn delete_task(&mut self, id: TaskId) {
        debug!(%id, "delete awaiting confirmation");
        self.pending_delete = Some(id);
    }

    pub fn resolve_confirmation(&mut self, accepted: bool) -> Result<Option<HttpRequest>, StoreError> {
        let id = self.pending_delete.take().ok_or(StoreError::NothingToConfirm)?;
        if !accepted {
            debug!(%id, "delete declined");
            return Err(StoreError::ConfirmationDeclined);
        }
        Ok(self.enqueue(Operation::Delete(id)))
    }

    /// Enters edit mode for `id`, copying its text into the form.
    pub fn start_edit(&mut self, id: TaskId) -> bool {
        let Some(task) = self.task(id).cloned() else {
            return false;
        };
        self.form = FormState {
            title: task.title.clone(),
            description: task.description.clone(),
            editing: Some(task),
        };
        true
    }

    pub fn cancel_edit(&mut self) {
        self.form.reset();
        self.notice = None;
    }

    /// Applies the outcome of the request last handed out and returns the
    /// next request to execute, if any.
    pub fn complete(&mut self, outcome: Result<HttpResponse, ApiError>) -> Option<HttpRequest> {
        let Some(op) = self.in_flight.take() else {
            warn!("response arrived with no request in flight");
            return None;
        };
        debug!(op = op.label(), ok = outcome.is_ok(), "request completed");

        match op {
            Operation::Fetch => {
                match outcome.and_then(|r| self.client.parse_list_tasks(r)) {
                    Ok(tasks) => {
                        info!(count = tasks.len(), "task list refreshed");
                        self.tasks = tasks;
                        self.updated.clear();
                        self.error = None;
                    }
                    Err(err) => {
                        warn!(error = %err, "task list fetch failed");
                        self.error = Some(err.to_string());
                    }
                }
            }
            Operation::Create(_) => {
                match outcome.and_then(|r| self.client.parse_create_task(r)) {
                    Ok(task) => {
                        info!(id = %task.id, "task created");
                        if self.form.mode() == FormMode::Create {
                            self.form.reset();
                        }
                        self.notice = Some(Notice::Info(format!("Created task #{}", task.id)));
                    }
                    Err(err) => self.mutation_failed("create", &err),
                }
                self.queue_refetch();
            }
            Operation::Update { id, change } => {
                let from_form = matches!(change, Change::Edit { .. });
                match outcome.and_then(|r| self.client.parse_update_task(r)) {
                    Ok(task) => {
                        info!(%id, from_form, "task updated");
                        self.updated.retain(|t| t.id != task.id);
                        self.updated.push(task);
                        if from_form && self.form.mode() == FormMode::Edit(id) {
                            self.form.reset();
                            self.notice = Some(Notice::Info(format!("Updated task #{id}")));
                        }
                    }
                    Err(err) => self.mutation_failed("update", &err),
                }
                self.queue_refetch();
            }
            Operation::Delete(id) => {
                match outcome.and_then(|r| self.client.parse_delete_task(r)) {
                    Ok(()) => {
                        info!(%id, "task deleted");
                        self.form.reset();
                        self.notice = Some(Notice::Info(format!("Deleted task #{id}")));
                    }
                    Err(err) => self.mutation_failed("delete", &err),
                }
                self.queue_refetch();
            }
        }

        self.dispatch_next()
    }

    /// The last update reply for `id`, else the fetched copy.
    fn freshest(&self, id: TaskId) -> Option<&Task> {
        self.updated
            .iter()
            .find(|t| t.id == id)
            .or_else(|| self.task(id))
    }

    fn update_fields(&self, id: TaskId, change: &Change) -> Option<TaskFields> {
        match change {
            Change::Toggle => self.freshest(id).map(|task| task.fields().toggled()),
            Change::Edit {
                title,
                description,
                completed,
            } => Some(TaskFields {
                title: title.clone(),
                description: description.clone(),
                completed: self.freshest(id).map_or(*completed, |task| task.completed),
            }),
        }
    }

    fn mutation_failed(&mut self, action: &str, err: &ApiError) {
        warn!(action, error = %err, "mutation failed");
        self.notice = Some(Notice::Error(format!("Could not {action} task: {err}")));
    }

    fn fetch_queued(&self) -> bool {
        self.queue.contains(&Operation::Fetch)
    }

    fn queue_refetch(&mut self) {
        if !self.fetch_queued() {
            self.queue.push_back(Operation::Fetch);
        }
    }

    fn enqueue(&mut self, op: Operation) -> Option<HttpRequest> {
        if op == Operation::Fetch && self.fetch_queued() {
            debug!("fetch already queued");
            return None;
        }
        debug!(op = op.label(), queued = self.queue.len(), "operation queued");
        self.queue.push_back(op);
        if self.in_flight.is_some() {
            return None;
        }
        self.dispatch_next()
    }

    fn dispatch_next(&mut self) -> Option<HttpRequest> {
        while let Some(op) = self.queue.pop_front() {
            let built = match &op {
                Operation::Fetch => Ok(self.client.build_list_tasks()),
                Operation::Create(fields) => self.client.build_create_task(fields),
                Operation::Update { id, change } => match self.update_fields(*id, change) {
                    Some(fields) => self.client.build_update_task(*id, &fields),
                    None => {
                        warn!(%id, "task gone before its update was sent");
                        continue;
                    }
                },
                Operation::Delete(id) => Ok(self.client.build_delete_task(*id)),
            };
            match built {
                Ok(request) => {
                    debug!(op = op.label(), method = %request.method, path = %request.path, "dispatching");
                    self.in_flight = Some(op);
                    return Some(request);
                }
                Err(err) => self.mutation_failed(op.label(), &err),
            }
        }
        None
    }
}
