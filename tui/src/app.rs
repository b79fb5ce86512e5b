//! Event loop and key handling for the terminal client.

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{backend::Backend, Terminal};
use task_core::store::Field;
use task_core::view::{render, StatusView, TaskRow};
use task_core::{FormMode, HttpRequest, Intent, Store};
use tracing::{debug, info};

use crate::executor::{Executor, Outcome};
use crate::ui;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Title,
    Description,
    List,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Title => Focus::Description,
            Focus::Description => Focus::List,
            Focus::List => Focus::Title,
        }
    }

    fn prev(self) -> Self {
        match self {
            Focus::Title => Focus::List,
            Focus::Description => Focus::Title,
            Focus::List => Focus::Description,
        }
    }

    fn field(self) -> Option<Field> {
        match self {
            Focus::Title => Some(Field::Title),
            Focus::Description => Some(Field::Description),
            Focus::List => None,
        }
    }
}

/// The store plus the presentation state only the terminal cares about.
pub struct Screen {
    pub store: Store,
    pub focus: Focus,
    pub selected: usize,
    quit: bool,
}

impl Screen {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            focus: Focus::Title,
            selected: 0,
            quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Keeps the selection on a row after the list changed size.
    pub fn clamp_selection(&mut self) {
        let len = self.store.tasks().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    pub fn complete(&mut self, outcome: Outcome) -> Option<HttpRequest> {
        let next = self.store.complete(outcome);
        self.clamp_selection();
        next
    }

    /// Handles one key press; returns the request to execute, if any.
    pub fn on_key(&mut self, key: KeyEvent) -> Option<HttpRequest> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit = true;
            return None;
        }

        if self.store.pending_delete().is_some() {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    self.store.dispatch(Intent::Confirm)
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.store.dispatch(Intent::Decline)
                }
                _ => None,
            };
        }

        match key.code {
            KeyCode::Tab => {
                self.focus = self.focus.next();
                return None;
            }
            KeyCode::BackTab => {
                self.focus = self.focus.prev();
                return None;
            }
            KeyCode::Esc => {
                if matches!(self.store.form().mode(), FormMode::Edit(_)) {
                    return self.store.dispatch(Intent::Cancel);
                }
                self.focus = Focus::List;
                return None;
            }
            _ => {}
        }

        match self.focus.field() {
            Some(field) => self.on_form_key(field, key),
            None => self.on_list_key(key),
        }
    }

    fn on_form_key(&mut self, field: Field, key: KeyEvent) -> Option<HttpRequest> {
        match key.code {
            KeyCode::Enter => self.store.dispatch(Intent::Submit),
            KeyCode::Backspace => {
                self.store.pop_char(field);
                None
            }
            KeyCode::Char(c) => {
                self.store.push_char(field, c);
                None
            }
            _ => None,
        }
    }

    fn on_list_key(&mut self, key: KeyEvent) -> Option<HttpRequest> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected += 1;
                self.clamp_selection();
                None
            }
            KeyCode::Char('r') => self.store.dispatch(Intent::Retry),
            KeyCode::Char('n') => {
                self.focus = Focus::Title;
                None
            }
            KeyCode::Char('q') => {
                self.quit = true;
                None
            }
            KeyCode::Char(' ') => self.row_intent(|row| row.toggle.intent),
            KeyCode::Char('d') => self.row_intent(|row| row.delete.intent),
            KeyCode::Char('e') => {
                let request = self.row_intent(|row| row.edit.intent);
                if matches!(self.store.form().mode(), FormMode::Edit(_)) {
                    self.focus = Focus::Title;
                }
                request
            }
            _ => None,
        }
    }

    /// Dispatches the chosen control of the selected row, if the list is shown.
    fn row_intent(&mut self, pick: impl Fn(&TaskRow) -> Intent) -> Option<HttpRequest> {
        let intent = match render(&self.store).status {
            StatusView::List(rows) => rows.get(self.selected).map(pick),
            _ => None,
        }?;
        self.store.dispatch(intent)
    }
}

pub fn run<B: Backend>(terminal: &mut Terminal<B>, screen: &mut Screen, executor: &Executor) -> Result<()> {
    info!("event loop starting");
    if let Some(request) = screen.store.fetch_tasks() {
        executor.submit(request)?;
    }

    loop {
        terminal.draw(|frame| ui::draw(frame, screen))?;

        while let Some(outcome) = executor.try_recv() {
            if let Some(request) = screen.complete(outcome) {
                executor.submit(request)?;
            }
        }

        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(request) = screen.on_key(key) {
                        executor.submit(request)?;
                    }
                }
            }
        }

        if screen.should_quit() {
            debug!("quit requested");
            return Ok(());
        }
    }
}
