mod board;
mod config;
mod input;
mod render;
mod source;
mod view;

use anyhow::{Result, bail};
use config::Config;
use console::Term;
use input::Command;
use render::Screen;
use source::{BoardSource, HttpSource, fetch_cycle};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use view::{BoardView, Event, FetchRequest};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let config = Config::from_args()?;

    let source = Arc::new(HttpSource::new(&config.server)?);
    info!(server = source.server(), stale = %config.stale, "chessboard viewer starting");

    if config.once {
        run_once(source.as_ref(), &config).await
    } else {
        run_interactive(source, &config).await
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// View for the first fetch cycle, with `--select` applied before it.
fn initial_view(config: &Config) -> (BoardView, FetchRequest) {
    let mut view = BoardView::new(config.stale);
    let request = match config.select {
        Some(pos) => view.apply(Event::CellClicked(pos)),
        None => None,
    };
    let request = request.unwrap_or_else(|| view.start());
    (view, request)
}

async fn run_once<S: BoardSource>(source: &S, config: &Config) -> Result<()> {
    let (mut view, request) = initial_view(config);
    fetch_cycle(source, request, |event| {
        view.apply(event);
    })
    .await;

    if view.is_loading() {
        bail!("No board could be retrieved from {}", config.server);
    }
    print!("{}", render::render_view(&view, config.style));
    Ok(())
}

async fn run_interactive<S>(source: Arc<S>, config: &Config) -> Result<()>
where
    S: BoardSource + Send + Sync + 'static,
{
    let (mut view, request) = initial_view(config);
    let (events_tx, mut events) = mpsc::unbounded_channel();
    let (commands_tx, mut commands) = mpsc::unbounded_channel();
    let term = Term::stdout();
    let mut screen = Screen::default();

    std::thread::spawn(move || input::read_commands(commands_tx));

    spawn_fetch(&source, request, &events_tx);
    draw(&mut screen, &view, config, &term);

    let mut input_open = true;
    loop {
        let event = tokio::select! {
            Some(event) = events.recv() => event,
            command = commands.recv(), if input_open => match command {
                Some(Command::Select(pos)) => Event::CellClicked(pos),
                Some(Command::Refresh) => Event::Refresh,
                Some(Command::Quit) => break,
                None => {
                    // Input ran out; keep showing fetch results until interrupted
                    input_open = false;
                    continue;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        };

        if let Some(request) = view.apply(event) {
            spawn_fetch(&source, request, &events_tx);
        }
        draw(&mut screen, &view, config, &term);
    }

    info!("chessboard viewer stopped");
    Ok(())
}

/// Prints the view when it changed. On a terminal the screen is cleared and
/// the prompt written again, since the prompt thread is still waiting on it.
fn draw(screen: &mut Screen, view: &BoardView, config: &Config, term: &Term) {
    let Some(frame) = screen.frame(view, config.style) else {
        return;
    };

    if !term.is_term() {
        print!("{}", frame);
        return;
    }

    let redraw = term
        .clear_screen()
        .and_then(|_| term.write_str(frame))
        .and_then(|_| term.write_str(&format!("{}: ", input::PROMPT)));
    if let Err(e) = redraw {
        warn!("Failed to redraw board: {}", e);
    }
}

/// Runs a fetch cycle on the runtime without waiting for it. Nothing cancels
/// it; its events land whenever the responses do.
fn spawn_fetch<S>(source: &Arc<S>, request: FetchRequest, events: &UnboundedSender<Event>)
where
    S: BoardSource + Send + Sync + 'static,
{
    let source = Arc::clone(source);
    let events = events.clone();
    tokio::spawn(async move {
        fetch_cycle(source.as_ref(), request, |event| {
            let _ = events.send(event);
        })
        .await;
    });
}
