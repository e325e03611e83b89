//! Stateless UI rendering for the chess board.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use strictly_chess::{Side, Square, TurnState};

use super::app::App;
use super::input::CELL_WIDTH;

const LIGHT_SQUARE: Color = Color::Rgb(240, 217, 181);
const DARK_SQUARE: Color = Color::Rgb(181, 136, 99);
const LAST_MOVE: Color = Color::Rgb(205, 210, 106);
const SELECTED: Color = Color::Rgb(100, 180, 220);
const DESTINATION: Color = Color::Rgb(120, 190, 120);
const CURSOR: Color = Color::Rgb(230, 120, 90);

/// Width of the rank labels left of the grid.
const LABEL_WIDTH: u16 = 2;

/// Renders the whole screen and returns the area of the 8x8 grid, for
/// mapping mouse positions back to squares.
pub fn draw(frame: &mut Frame, app: &App) -> Rect {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Title
            Constraint::Min(11),    // Board and move log
            Constraint::Length(3),  // Status
            Constraint::Length(1),  // Help
        ])
        .split(area);

    // Title
    let title = Paragraph::new(format!("Strictly Chess - You (White) vs {}", app.engine_name()))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    frame.render_widget(title, chunks[0]);

    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(LABEL_WIDTH + 8 * CELL_WIDTH + 2),
            Constraint::Min(20),
        ])
        .split(chunks[1]);

    let grid = draw_board(frame, main[0], app);
    draw_log(frame, main[1], app);

    // Status
    let status_style = match app.state() {
        TurnState::GameOver => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        TurnState::AwaitingOracleMove => Style::default().fg(Color::Magenta),
        TurnState::AwaitingHumanMove => Style::default().fg(Color::Yellow),
    };
    let status = Paragraph::new(app.status_message())
        .style(status_style)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, chunks[2]);

    let help = Paragraph::new(
        "arrows: move cursor | enter/space: select | drag with mouse | esc: cancel | r: new game | q: quit",
    )
    .style(Style::default().fg(Color::DarkGray))
    .alignment(Alignment::Center);
    frame.render_widget(help, chunks[3]);

    grid
}

fn draw_board(frame: &mut Frame, area: Rect, app: &App) -> Rect {
    let block = Block::default().borders(Borders::ALL).title(" Board ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let destinations = app.legal_destinations();
    let last_move = *app.position().last_move();

    let mut lines = Vec::with_capacity(9);
    for rank in (0..8u8).rev() {
        let mut spans = vec![Span::styled(
            format!("{} ", rank + 1),
            Style::default().fg(Color::DarkGray),
        )];
        for file in 0..8u8 {
            let Some(square) = Square::from_coords(file, rank) else {
                continue;
            };
            let background = if square == app.cursor() && app.accepts_input() {
                CURSOR
            } else if Some(square) == app.selected() {
                SELECTED
            } else if destinations.contains(&square) {
                DESTINATION
            } else if last_move.is_some_and(|mv| mv.from == square || mv.to == square) {
                LAST_MOVE
            } else if (file + rank) % 2 == 0 {
                DARK_SQUARE
            } else {
                LIGHT_SQUARE
            };
            spans.push(draw_cell(app, square, background, destinations.contains(&square)));
        }
        lines.push(Line::from(spans));
    }

    let files: String = (b'a'..=b'h').map(|f| format!(" {} ", f as char)).collect();
    lines.push(Line::from(Span::styled(
        format!("  {}", files),
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(Paragraph::new(lines), inner);

    Rect::new(
        inner.x + LABEL_WIDTH,
        inner.y,
        (8 * CELL_WIDTH).min(inner.width.saturating_sub(LABEL_WIDTH)),
        8u16.min(inner.height),
    )
}

fn draw_cell(app: &App, square: Square, background: Color, is_destination: bool) -> Span<'static> {
    let style = Style::default().bg(background);
    match app.position().piece_at(square) {
        Some(piece) => {
            let fg = match piece.side {
                Side::White => Color::White,
                Side::Black => Color::Black,
            };
            Span::styled(
                format!(" {} ", piece.glyph()),
                style.fg(fg).add_modifier(Modifier::BOLD),
            )
        }
        None if is_destination => Span::styled(" · ", style.fg(Color::Black)),
        None => Span::styled("   ", style),
    }
}

fn draw_log(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default().borders(Borders::ALL).title(" Moves ");
    let visible = area.height.saturating_sub(2) as usize;
    let log = app.log();
    let start = log.len().saturating_sub(visible);

    let mut lines: Vec<Line> = log[start..]
        .iter()
        .enumerate()
        .map(|(i, entry)| Line::from(format!("{:>3}. {}", start + i + 1, entry)))
        .collect();

    if let Some(conclusion) = app.conclusion() {
        lines.push(Line::from(Span::styled(
            conclusion.to_string(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    }

    if let Some(promotion) = app.promotion() {
        lines.push(Line::from(Span::styled(
            format!("Promotion on {}{}: q / r / b / n", promotion.from, promotion.to),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
    }

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}
