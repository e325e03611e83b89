//! Terminal UI for Strictly Chess

mod app;
mod input;
mod session;
mod ui;

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend, layout::Rect};
use std::io;
use std::time::Duration;
use strictly_chess::{GameEvent, Move, Oracle, PieceKind, TurnCoordinator};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use app::App;
use session::{SessionCommand, spawn_session};

/// How long the UI waits for a terminal event before redrawing.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long a quitting session may take to shut its oracle down.
const SHUTDOWN_WAIT: Duration = Duration::from_secs(3);

/// What the UI loop should do after an input.
enum Flow {
    Continue,
    Quit,
}

/// Run the TUI against `oracle`, giving it `move_time` per move.
pub async fn run_tui(oracle: Box<dyn Oracle>, move_time: Duration) -> Result<()> {
    info!(oracle = %oracle.name(), "Starting Strictly Chess TUI");

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let (command_tx, command_rx) = mpsc::unbounded_channel();

    let mut app = App::new(oracle.name());
    let coordinator = TurnCoordinator::new(oracle, move_time).with_events(event_tx);
    let mut session = spawn_session(coordinator, command_rx);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, &command_tx, &mut event_rx).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    drop(command_tx);
    if app.session_busy() {
        info!("Abandoning outstanding engine request");
        session.abort();
    } else {
        close_session(&mut session).await;
    }

    if let Err(err) = res {
        error!(error = ?err, "Game loop error");
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

/// Lets the session shut its oracle down, aborting it if it is stuck
/// waiting on the engine.
async fn close_session(session: &mut JoinHandle<()>) {
    match tokio::time::timeout(SHUTDOWN_WAIT, &mut *session).await {
        Ok(Ok(())) => debug!("Game session finished"),
        Ok(Err(e)) => warn!(error = %e, "Game session task failed"),
        Err(_) => {
            warn!("Game session did not finish, aborting it");
            session.abort();
        }
    }
}

#[instrument(skip_all)]
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    commands: &mpsc::UnboundedSender<SessionCommand>,
    events: &mut mpsc::UnboundedReceiver<GameEvent>,
) -> Result<()> {
    let mut grid = Rect::default();

    loop {
        while let Ok(event) = events.try_recv() {
            app.handle_event(event);
        }

        terminal.draw(|frame| grid = ui::draw(frame, app))?;

        if !event::poll(POLL_INTERVAL)? {
            tokio::task::yield_now().await;
            continue;
        }

        let flow = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key, commands),
            Event::Mouse(mouse) => {
                handle_mouse(app, mouse, grid, commands);
                Flow::Continue
            }
            _ => Flow::Continue,
        };

        if let Flow::Quit = flow {
            info!("User quit");
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent, commands: &mpsc::UnboundedSender<SessionCommand>) -> Flow {
    if app.promotion().is_some() {
        let choice = match key.code {
            KeyCode::Char('q') => Some(PieceKind::Queen),
            KeyCode::Char('r') => Some(PieceKind::Rook),
            KeyCode::Char('b') => Some(PieceKind::Bishop),
            KeyCode::Char('n') => Some(PieceKind::Knight),
            KeyCode::Esc => {
                app.cancel();
                None
            }
            _ => None,
        };
        if let Some(kind) = choice {
            let mv = app.choose_promotion(kind);
            send_move(commands, mv);
        }
        return Flow::Continue;
    }

    match key.code {
        KeyCode::Char('q') => return Flow::Quit,
        KeyCode::Char('r') => {
            app.request_new_game();
            send(commands, SessionCommand::NewGame);
        }
        KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right => app.move_cursor(key.code),
        KeyCode::Enter | KeyCode::Char(' ') => {
            let mv = app.activate_cursor();
            send_move(commands, mv);
        }
        KeyCode::Esc => app.cancel(),
        _ => {}
    }
    Flow::Continue
}

fn handle_mouse(
    app: &mut App,
    mouse: MouseEvent,
    grid: Rect,
    commands: &mpsc::UnboundedSender<SessionCommand>,
) {
    let square = input::square_at(grid, mouse.column, mouse.row);
    let mv = match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => square.and_then(|sq| app.press(sq)),
        MouseEventKind::Up(MouseButton::Left) => app.release(square),
        _ => None,
    };
    send_move(commands, mv);
}

fn send_move(commands: &mpsc::UnboundedSender<SessionCommand>, mv: Option<Move>) {
    if let Some(mv) = mv {
        info!(mv = %mv, "Sending move to game session");
        send(commands, SessionCommand::Propose(mv));
    }
}

fn send(commands: &mpsc::UnboundedSender<SessionCommand>, command: SessionCommand) {
    if commands.send(command).is_err() {
        error!("Game session is gone");
    }
}
