//! Interactive terminal view.
//!
//! The foreground loop owns the [`Session`]; a reader thread turns key presses
//! into messages, and every [`TICK`] the loop animates the spinner, checks for
//! a resized terminal and polls the pending probe. Network I/O only ever
//! happens on the probe worker.

pub mod session;
pub mod task;
pub mod view;

use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use console::{Key, Term};
use tracing::{debug, warn};

pub use session::{CheckFn, Control, Input, Session, State};

/// Redraw and poll interval.
pub const TICK: Duration = Duration::from_millis(100);

const ENTER_ALTERNATE_SCREEN: &str = "\x1b[?1049h";
const LEAVE_ALTERNATE_SCREEN: &str = "\x1b[?1049l";

/// Runs the interactive view over `endpoints` until the user quits.
///
/// # Errors
///
/// Fails when stdout is not a terminal or cannot be written.
pub fn launch(endpoints: Vec<String>, timeout: Duration) -> io::Result<()> {
    let term = Term::buffered_stdout();
    if !term.is_term() {
        return Err(io::Error::other("interactive mode needs a terminal"));
    }

    let check: CheckFn = Arc::new(move |endpoint: &str| crate::check_json(endpoint, timeout));
    let mut session = Session::new(endpoints, check);

    term.write_str(ENTER_ALTERNATE_SCREEN)?;
    term.hide_cursor()?;

    let keys = spawn_key_reader(term.clone());
    let result = run(&term, &mut session, &keys);

    if let Err(e) = term.show_cursor() {
        warn!(error = %e, "could not restore the cursor");
    }
    term.write_str(LEAVE_ALTERNATE_SCREEN)?;
    term.flush()?;

    if session.is_pending() {
        debug!("quitting with a probe in flight; its result will be discarded");
    }
    result
}

fn run(term: &Term, session: &mut Session, keys: &Receiver<Key>) -> io::Result<()> {
    let mut size = term.size();
    session.handle(resize_input(size));
    draw(term, session)?;

    let mut clock = TickClock::new(Instant::now());
    loop {
        match keys.recv_timeout(clock.until_next(Instant::now())) {
            Ok(key) => {
                if let Some(input) = input_for(&key) {
                    if session.handle(input) == Control::Quit {
                        return Ok(());
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            // The reader only stops on a quit key or a dead stdin.
            Err(RecvTimeoutError::Disconnected) => return Ok(()),
        }

        // Key presses must not starve the animation.
        if clock.due(Instant::now()) {
            session.handle(Input::Tick);
        }

        let current = term.size();
        if current != size {
            size = current;
            session.handle(resize_input(size));
        }

        session.poll();
        draw(term, session)?;
    }
}

/// Fires once per [`TICK`] of wall time, however often it is asked.
#[derive(Debug, Clone, Copy)]
struct TickClock {
    next: Instant,
}

impl TickClock {
    fn new(now: Instant) -> Self {
        TickClock { next: now + TICK }
    }

    /// How long to wait for input before the next tick is due.
    fn until_next(&self, now: Instant) -> Duration {
        self.next.saturating_duration_since(now)
    }

    fn due(&mut self, now: Instant) -> bool {
        if now < self.next {
            return false;
        }
        self.next = now + TICK;
        true
    }
}

fn draw(term: &Term, session: &Session) -> io::Result<()> {
    term.clear_screen()?;
    // The reader thread keeps the terminal in raw mode, so rows need an
    // explicit carriage return.
    term.write_str(&session.view().join("\r\n"))?;
    term.flush()
}

fn spawn_key_reader(term: Term) -> Receiver<Key> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || loop {
        let key = match term.read_key() {
            Ok(key) => key,
            Err(e) => {
                debug!(error = %e, "key reader stopped");
                break;
            }
        };
        // Stop before reading again so the terminal is not left in raw mode.
        let quit = input_for(&key) == Some(Input::Quit);
        if sender.send(key).is_err() || quit {
            break;
        }
    });
    receiver
}

/// `console` reports the size as (rows, columns).
fn resize_input((rows, columns): (u16, u16)) -> Input {
    Input::Resize {
        width: columns,
        height: rows,
    }
}

/// Key bindings.
pub fn input_for(key: &Key) -> Option<Input> {
    let input = match key {
        Key::Enter | Key::ArrowRight | Key::Char('l') => Input::Select,
        Key::ArrowDown | Key::Char('j') => Input::Down,
        Key::ArrowUp | Key::Char('k') => Input::Up,
        Key::PageDown | Key::Char(' ') => Input::PageDown,
        Key::PageUp => Input::PageUp,
        Key::ArrowLeft | Key::Char('h') => Input::Back,
        Key::Char('q') | Key::Escape | Key::CtrlC => Input::Quit,
        _ => return None,
    };
    Some(input)
}
