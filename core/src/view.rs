//! Pure rendering of a `Store` into a presentation tree.
//!
//! `render` derives everything from the store on every call; the tree holds
//! no state of its own. Each interactive element carries the `Intent` it
//! emits, and `Store::dispatch` routes an intent back into the matching
//! store operation.

use tracing::debug;

use crate::http::HttpRequest;
use crate::store::{FormMode, Notice, Store};
use crate::types::{Task, TaskId};

/// A user action emitted by a rendered control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Submit,
    Cancel,
    Retry,
    Toggle(TaskId),
    Edit(TaskId),
    Delete(TaskId),
    Confirm,
    Decline,
}

/// A labelled button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub label: &'static str,
    pub intent: Intent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub form: FormView,
    pub status: StatusView,
    pub confirm: Option<ConfirmView>,
    pub notice: Option<Notice>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    pub heading: String,
    pub title: String,
    pub description: String,
    pub submit: Control,
    /// Only present in edit mode.
    pub cancel: Option<Control>,
}

/// The task section. Exactly one of these is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusView {
    Loading,
    Failed { message: String, retry: Control },
    Empty,
    List(Vec<TaskRow>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub created: String,
    pub completed: bool,
    pub toggle: Control,
    pub edit: Control,
    pub delete: Control,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmView {
    pub prompt: String,
    pub confirm: Control,
    pub decline: Control,
}

pub const LOADING_TEXT: &str = "Loading tasks...";
pub const EMPTY_TEXT: &str = "No tasks yet.";

pub fn render(store: &Store) -> View {
    View {
        form: render_form(store),
        status: render_status(store),
        confirm: store.pending_delete().map(|id| render_confirm(store, id)),
        notice: store.notice().cloned(),
    }
}

fn render_form(store: &Store) -> FormView {
    let form = store.form();
    let (heading, submit, cancel) = match form.mode() {
        FormMode::Create => ("New task".to_string(), "Create", None),
        FormMode::Edit(id) => (
            format!("Edit task #{id}"),
            "Update",
            Some(Control {
                label: "Cancel",
                intent: Intent::Cancel,
            }),
        ),
    };
    FormView {
        heading,
        title: form.title().to_string(),
        description: form.description().to_string(),
        submit: Control {
            label: submit,
            intent: Intent::Submit,
        },
        cancel,
    }
}

fn render_status(store: &Store) -> StatusView {
    if store.is_loading() {
        return StatusView::Loading;
    }
    if let Some(message) = store.error() {
        return StatusView::Failed {
            message: message.to_string(),
            retry: Control {
                label: "Retry",
                intent: Intent::Retry,
            },
        };
    }
    if store.tasks().is_empty() {
        return StatusView::Empty;
    }
    StatusView::List(store.tasks().iter().map(render_row).collect())
}

fn render_row(task: &Task) -> TaskRow {
    TaskRow {
        id: task.id,
        title: task.title.clone(),
        description: (!task.description.is_empty()).then(|| task.description.clone()),
        created: task.created_at.format("%Y-%m-%d").to_string(),
        completed: task.completed,
        toggle: Control {
            label: if task.completed { "Undo" } else { "Done" },
            intent: Intent::Toggle(task.id),
        },
        edit: Control {
            label: "Edit",
            intent: Intent::Edit(task.id),
        },
        delete: Control {
            label: "Delete",
            intent: Intent::Delete(task.id),
        },
    }
}

fn render_confirm(store: &Store, id: TaskId) -> ConfirmView {
    let prompt = match store.task(id) {
        Some(task) => format!("Delete \"{}\"?", task.title),
        None => format!("Delete task #{id}?"),
    };
    ConfirmView {
        prompt,
        confirm: Control {
            label: "Yes",
            intent: Intent::Confirm,
        },
        decline: Control {
            label: "No",
            intent: Intent::Decline,
        },
    }
}

impl Store {
    /// Routes an intent from the view into the store. Returns the request
    /// the host must execute now, if any.
    pub fn dispatch(&mut self, intent: Intent) -> Option<HttpRequest> {
        debug!(?intent, "dispatch");
        match intent {
            // A blank title leaves its message in the notice.
            Intent::Submit => self.submit().ok().flatten(),
            Intent::Cancel => {
                self.cancel_edit();
                None
            }
            Intent::Retry => self.fetch_tasks(),
            Intent::Toggle(id) => self.toggle_complete(id),
            Intent::Edit(id) => {
                self.start_edit(id);
                None
            }
            Intent::Delete(id) => {
                self.delete_task(id);
                None
            }
            // Declining is silent; the prompt just closes.
            Intent::Confirm | Intent::Decline => self
                .resolve_confirmation(intent == Intent::Confirm)
                .ok()
                .flatten(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::TaskClient;
    use crate::error::ApiError;
    use crate::http::{HttpMethod, HttpResponse};

    fn store() -> Store {
        Store::new(TaskClient::new("http://localhost:8080/api"))
    }

    fn loaded(body: &str) -> Store {
        let mut s = store();
        s.fetch_tasks().unwrap();
        s.complete(Ok(HttpResponse::new(200, body)));
        s
    }

    const TWO_TASKS: &str = r#"[
        {"id":1,"title":"A","description":"","completed":false,"created_at":"2024-05-01T10:00:00Z"},
        {"id":2,"title":"B","description":"notes","completed":true,"created_at":"2024-06-02T23:30:00-03:00"}
    ]"#;

    #[test]
    fn create_mode_form_has_no_cancel() {
        let view = render(&store());
        assert_eq!(view.form.heading, "New task");
        assert_eq!(view.form.submit.label, "Create");
        assert!(view.form.cancel.is_none());
        assert!(view.confirm.is_none());
    }

    #[test]
    fn edit_mode_form_offers_update_and_cancel() {
        let mut s = loaded(TWO_TASKS);
        s.dispatch(Intent::Edit(TaskId(2)));

        let view = render(&s);
        assert_eq!(view.form.heading, "Edit task #2");
        assert_eq!(view.form.title, "B");
        assert_eq!(view.form.description, "notes");
        assert_eq!(view.form.submit.label, "Update");
        assert_eq!(view.form.cancel.as_ref().map(|c| c.intent), Some(Intent::Cancel));

        s.dispatch(Intent::Cancel);
        assert!(render(&s).form.cancel.is_none());
    }

    #[test]
    fn status_is_loading_while_fetching() {
        let mut s = loaded(TWO_TASKS);
        s.fetch_tasks().unwrap();
        assert_eq!(render(&s).status, StatusView::Loading);
    }

    #[test]
    fn status_shows_error_with_retry() {
        let mut s = store();
        s.fetch_tasks().unwrap();
        s.complete(Err(ApiError::Transport("refused".to_string())));

        match render(&s).status {
            StatusView::Failed { message, retry } => {
                assert_eq!(message, "transport failed: refused");
                assert_eq!(retry.intent, Intent::Retry);
            }
            other => panic!("expected error panel, got {other:?}"),
        }

        let req = s.dispatch(Intent::Retry).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
    }

    #[test]
    fn status_is_empty_without_tasks() {
        assert_eq!(render(&store()).status, StatusView::Empty);
        assert_eq!(render(&loaded("[]")).status, StatusView::Empty);
    }

    #[test]
    fn rows_carry_controls_for_their_task() {
        let view = render(&loaded(TWO_TASKS));
        let StatusView::List(rows) = view.status else {
            panic!("expected list");
        };
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].description, None);
        assert_eq!(rows[0].created, "2024-05-01");
        assert_eq!(rows[0].toggle.label, "Done");
        assert_eq!(rows[0].toggle.intent, Intent::Toggle(TaskId(1)));

        assert_eq!(rows[1].description.as_deref(), Some("notes"));
        assert_eq!(rows[1].created, "2024-06-02");
        assert!(rows[1].completed);
        assert_eq!(rows[1].toggle.label, "Undo");
        assert_eq!(rows[1].edit.intent, Intent::Edit(TaskId(2)));
        assert_eq!(rows[1].delete.intent, Intent::Delete(TaskId(2)));
    }

    #[test]
    fn delete_intent_opens_confirmation() {
        let mut s = loaded(TWO_TASKS);
        assert!(s.dispatch(Intent::Delete(TaskId(1))).is_none());

        let confirm = render(&s).confirm.unwrap();
        assert_eq!(confirm.prompt, "Delete \"A\"?");

        assert!(s.dispatch(Intent::Decline).is_none());
        assert!(render(&s).confirm.is_none());

        s.dispatch(Intent::Delete(TaskId(1)));
        let req = s.dispatch(Intent::Confirm).unwrap();
        assert_eq!(req.method, HttpMethod::Delete);
    }

    #[test]
    fn blank_submit_shows_validation_notice() {
        let mut s = store();
        assert!(s.dispatch(Intent::Submit).is_none());
        assert_eq!(
            render(&s).notice,
            Some(Notice::Error("Title is required".to_string()))
        );
    }
}
