//! The interactive check state machine.
//!
//! `Listing → Checking → Showing → Listing ...`, with quit accepted
//! everywhere. The session owns at most one [`ProbeTask`]; while it is
//! pending every selection is refused.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::task::ProbeTask;
use super::view::{self, Layout, Viewport};

/// Produces the document for one endpoint. Runs on the worker thread.
pub type CheckFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Listing,
    Checking,
    Showing,
}

/// User and terminal events, already decoded from raw keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Up,
    Down,
    PageUp,
    PageDown,
    Select,
    Back,
    Quit,
    Resize { width: u16, height: u16 },
    /// Animation clock
    Tick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

pub struct Session {
    endpoints: Vec<String>,
    selection: usize,
    state: State,
    pending: Option<ProbeTask>,
    check: CheckFn,
    layout: Layout,
    viewport: Viewport,
    spinner_frame: usize,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("endpoints", &self.endpoints)
            .field("selection", &self.selection)
            .field("state", &self.state)
            .field("pending", &self.pending)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(endpoints: Vec<String>, check: CheckFn) -> Self {
        let layout = Layout::default();
        Session {
            endpoints,
            selection: 0,
            state: State::Listing,
            pending: None,
            check,
            viewport: Viewport::new(layout.width, layout.body_height()),
            layout,
            spinner_frame: 0,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn selection(&self) -> usize {
        self.selection
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Applies one input.
    pub fn handle(&mut self, input: Input) -> Control {
        match input {
            Input::Quit => return Control::Quit,
            Input::Resize { width, height } => {
                self.resize(width, height);
                return Control::Continue;
            }
            _ => {}
        }

        match self.state {
            State::Listing => self.handle_listing(input),
            State::Checking => {
                if input == Input::Tick {
                    self.spinner_frame = self.spinner_frame.wrapping_add(1);
                }
            }
            State::Showing => self.handle_showing(input),
        }
        Control::Continue
    }

    fn handle_listing(&mut self, input: Input) {
        let last = self.endpoints.len().saturating_sub(1);
        let page = self.layout.list_page_size();
        match input {
            Input::Up => self.selection = self.selection.saturating_sub(1),
            Input::Down => self.selection = (self.selection + 1).min(last),
            Input::PageUp => self.selection = self.selection.saturating_sub(page),
            Input::PageDown => self.selection = (self.selection + page).min(last),
            Input::Select => self.start_check(),
            _ => {}
        }
    }

    fn handle_showing(&mut self, input: Input) {
        let page = self.viewport.height().max(1);
        match input {
            Input::Up => self.viewport.scroll_up(1),
            Input::Down => self.viewport.scroll_down(1),
            Input::PageUp => self.viewport.scroll_up(page),
            Input::PageDown => self.viewport.scroll_down(page),
            Input::Back => self.state = State::Listing,
            _ => {}
        }
    }

    fn start_check(&mut self) {
        if let Some(task) = &self.pending {
            debug!(endpoint = task.endpoint(), "probe already in flight, selection refused");
            return;
        }
        let Some(endpoint) = self.endpoints.get(self.selection).cloned() else {
            return;
        };

        debug!(%endpoint, "starting probe");
        let check = Arc::clone(&self.check);
        self.pending = Some(ProbeTask::spawn(endpoint, move |target| check(target)));
        self.spinner_frame = 0;
        self.state = State::Checking;
    }

    /// Picks up a finished probe. Returns true when the state changed.
    pub fn poll(&mut self) -> bool {
        let Some(task) = self.pending.as_mut() else {
            return false;
        };
        let Some(document) = task.poll() else {
            return false;
        };

        self.pending = None;
        self.show(&document);
        true
    }

    fn show(&mut self, document: &str) {
        self.viewport.set_content(document);
        self.spinner_frame = 0;
        self.state = State::Showing;
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.layout = Layout::new(width, height);
        self.viewport
            .resize(self.layout.width, self.layout.body_height());
    }

    /// The current screen, one entry per row.
    pub fn view(&self) -> Vec<String> {
        match self.state {
            State::Listing => view::list_view(&self.layout, &self.endpoints, self.selection),
            State::Checking => {
                let endpoint = self
                    .pending
                    .as_ref()
                    .map(ProbeTask::endpoint)
                    .unwrap_or_default();
                view::checking_view(self.spinner_frame, endpoint)
            }
            State::Showing => view::document_view(&self.layout, &self.viewport),
        }
    }
}
