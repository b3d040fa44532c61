mod log_panel;
mod view;

use std::cell::Cell;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    MouseButton, MouseEventKind,
};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use glam::Vec2;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;

use unitsync::sim::{PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH};
use unitsync::{InputEvent, InputSource, NetEvent, Renderer, SessionStatus, UnitWorld};

pub use log_panel::LogPanel;

/// Enter the alternate screen and hand out both halves of the UI. They share
/// the playfield rectangle so clicks map to the area last drawn.
pub fn open(log: LogPanel) -> io::Result<(TuiInput, TuiRenderer)> {
    terminal::enable_raw_mode()?;
    let terminal = match enter_screen() {
        Ok(terminal) => terminal,
        Err(e) => {
            let mut stdout = io::stdout();
            let _ = execute!(stdout, DisableMouseCapture, LeaveAlternateScreen, cursor::Show);
            let _ = terminal::disable_raw_mode();
            return Err(e);
        }
    };
    let field = Rc::new(Cell::new(Rect::default()));

    let input = TuiInput {
        field: Rc::clone(&field),
        pointer: Vec2::new(PLAYFIELD_WIDTH / 2.0, PLAYFIELD_HEIGHT / 2.0),
    };
    let renderer = TuiRenderer {
        terminal,
        field,
        log,
        last_event: None,
    };
    Ok((input, renderer))
}

fn enter_screen() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, cursor::Hide)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

pub struct TuiInput {
    field: Rc<Cell<Rect>>,
    pointer: Vec2,
}

impl TuiInput {
    fn map_key(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<InputEvent> {
        if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
            return Some(InputEvent::Quit);
        }

        match code {
            KeyCode::Esc | KeyCode::Char('q') => Some(InputEvent::Quit),
            KeyCode::Char('s') | KeyCode::Char('S') => Some(InputEvent::StartSession),
            KeyCode::Char(' ') => Some(InputEvent::ToggleAll),
            KeyCode::Enter => Some(InputEvent::ToggleLast),
            KeyCode::Char('1') => Some(InputEvent::CreateMovingUnit(self.pointer)),
            KeyCode::Char('2') => Some(InputEvent::CreateRandomUnit),
            _ => None,
        }
    }
}

impl InputSource for TuiInput {
    fn poll(&mut self) -> io::Result<Vec<InputEvent>> {
        let mut events = Vec::new();

        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    events.extend(self.map_key(key.code, key.modifiers));
                }
                Event::Mouse(mouse) => {
                    let Some(at) = to_playfield(self.field.get(), mouse.column, mouse.row) else {
                        continue;
                    };
                    self.pointer = at;
                    match mouse.kind {
                        MouseEventKind::Down(MouseButton::Left) => {
                            events.push(InputEvent::CreateUnit(at));
                        }
                        MouseEventKind::Down(MouseButton::Right) => {
                            events.push(InputEvent::DestroyUnits(at));
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        Ok(events)
    }
}

pub struct TuiRenderer {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    field: Rc<Cell<Rect>>,
    log: LogPanel,
    last_event: Option<String>,
}

impl Renderer for TuiRenderer {
    fn render(
        &mut self,
        world: &UnitWorld,
        status: &SessionStatus,
        events: &[NetEvent],
    ) -> io::Result<()> {
        if let Some(event) = events.last() {
            self.last_event = Some(event.describe());
        }

        let logs = self.log.tail(view::LOG_LINES);
        let last_event = self.last_event.as_deref();
        let mut field = Rect::default();
        self.terminal.draw(|frame| {
            field = view::render(frame, world, status, last_event, &logs);
        })?;
        self.field.set(field);

        Ok(())
    }
}

impl Drop for TuiRenderer {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            DisableMouseCapture,
            LeaveAlternateScreen,
            cursor::Show
        );
    }
}

/// Map a terminal cell inside `area` to the center of the matching playfield
/// region.
fn to_playfield(area: Rect, column: u16, row: u16) -> Option<Vec2> {
    if area.width == 0
        || area.height == 0
        || column < area.x
        || row < area.y
        || column >= area.x + area.width
        || row >= area.y + area.height
    {
        return None;
    }

    let x = ((column - area.x) as f32 + 0.5) * PLAYFIELD_WIDTH / area.width as f32;
    let y = ((row - area.y) as f32 + 0.5) * PLAYFIELD_HEIGHT / area.height as f32;
    Some(Vec2::new(x, y))
}
