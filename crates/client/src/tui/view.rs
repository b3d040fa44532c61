use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use unitsync::sim::{AnimationSlot, PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH, Unit, UnitKind};
use unitsync::{SessionState, SessionStatus, UnitWorld};

use super::log_panel::LogLine;

pub const LOG_LINES: usize = 50;

/// Draw the whole screen and return the inner playfield area.
pub fn render(
    frame: &mut Frame,
    world: &UnitWorld,
    status: &SessionStatus,
    last_event: Option<&str>,
    logs: &[LogLine],
) -> Rect {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(chunks[1]);

    render_header(frame, chunks[0], world, status, last_event);
    let field = render_playfield(frame, body[0], world);
    render_log(frame, body[1], logs);
    render_help(frame, chunks[2]);

    field
}

fn state_color(state: SessionState) -> Color {
    match state {
        SessionState::Uninitialized => Color::DarkGray,
        SessionState::Delayed => Color::Yellow,
        SessionState::Active => Color::Green,
    }
}

fn render_header(
    frame: &mut Frame,
    area: Rect,
    world: &UnitWorld,
    status: &SessionStatus,
    last_event: Option<&str>,
) {
    let title = format!(" unitsync - {} ", status.name);
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let role = status.role.map_or("unbound", |r| r.as_str());
    let player = status
        .player_id
        .map_or_else(|| "-".to_string(), |id| id.to_string());
    let state = if status.state == SessionState::Active && !status.started {
        "Active (waiting to start)".to_string()
    } else {
        status.state.as_str().to_string()
    };

    let lines = vec![
        Line::from(vec![
            Span::styled("Role: ", Style::default().fg(Color::Gray)),
            Span::styled(role, Style::default().fg(Color::White)),
            Span::styled("  State: ", Style::default().fg(Color::Gray)),
            Span::styled(state, Style::default().fg(state_color(status.state))),
            Span::styled("  Player: ", Style::default().fg(Color::Gray)),
            Span::styled(player, Style::default().fg(Color::White)),
            Span::styled("  Peers: ", Style::default().fg(Color::Gray)),
            Span::styled(status.peer_count.to_string(), Style::default().fg(Color::White)),
            Span::styled("  Units: ", Style::default().fg(Color::Gray)),
            Span::styled(world.unit_count().to_string(), Style::default().fg(Color::White)),
            Span::styled("  Queued: ", Style::default().fg(Color::Gray)),
            Span::styled(status.queued.to_string(), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::styled(
                format!("{}  ", status.local_addr),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(
                last_event.unwrap_or("").to_string(),
                Style::default().fg(Color::Magenta),
            ),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn glyph(unit: &Unit) -> char {
    match (unit.kind, unit.animation) {
        (UnitKind::Base, AnimationSlot::Primary) => '@',
        (UnitKind::Base, AnimationSlot::Secondary) => 'a',
        (UnitKind::RandomSpawn, AnimationSlot::Primary) => '*',
        (UnitKind::RandomSpawn, AnimationSlot::Secondary) => '+',
        (UnitKind::RandomDirection, AnimationSlot::Primary) => 'o',
        (UnitKind::RandomDirection, AnimationSlot::Secondary) => 'O',
    }
}

fn unit_style(unit: &Unit) -> Style {
    let color = match unit.kind {
        UnitKind::Base => Color::Cyan,
        UnitKind::RandomSpawn => Color::Yellow,
        UnitKind::RandomDirection => Color::Green,
    };
    if unit.paused {
        return Style::default().fg(Color::DarkGray);
    }

    let style = Style::default().fg(color);
    if unit.frame % 2 == 0 {
        style.add_modifier(Modifier::BOLD)
    } else {
        style
    }
}

fn render_playfield(frame: &mut Frame, area: Rect, world: &UnitWorld) -> Rect {
    let block = Block::default()
        .title(" Playfield ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cols = inner.width as usize;
    let rows = inner.height as usize;
    if cols == 0 || rows == 0 {
        return inner;
    }

    // Later units draw over earlier ones, like sprites.
    let mut cells: Vec<Option<&Unit>> = vec![None; cols * rows];
    for unit in world.units() {
        let col = ((unit.position.x / PLAYFIELD_WIDTH) * cols as f32) as usize;
        let row = ((unit.position.y / PLAYFIELD_HEIGHT) * rows as f32) as usize;
        cells[row.min(rows - 1) * cols + col.min(cols - 1)] = Some(unit);
    }

    let lines: Vec<Line> = cells
        .chunks(cols)
        .map(|row| {
            let spans: Vec<Span> = row
                .iter()
                .map(|cell| match cell {
                    Some(unit) => Span::styled(glyph(unit).to_string(), unit_style(unit)),
                    None => Span::raw(" "),
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
    inner
}

fn render_log(frame: &mut Frame, area: Rect, logs: &[LogLine]) {
    let block = Block::default()
        .title(" Log ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let visible = area.height.saturating_sub(2) as usize;
    let skip = logs.len().saturating_sub(visible);
    let lines: Vec<Line> = logs
        .iter()
        .skip(skip)
        .map(|line| {
            let color = match line.level {
                log::Level::Error => Color::Red,
                log::Level::Warn => Color::Yellow,
                log::Level::Info => Color::White,
                log::Level::Debug | log::Level::Trace => Color::DarkGray,
            };
            Line::from(Span::styled(line.text.clone(), Style::default().fg(color)))
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(" Controls ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let text = Paragraph::new(
        "S start  Space pause all  Enter swap last  LMB create  RMB destroy  1 mover  2 random  q quit",
    )
    .block(block)
    .style(
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    );

    frame.render_widget(text, area);
}
