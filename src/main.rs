use std::fs::File;
use std::io;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::mpsc::TryRecvError;
use std::thread;
use std::time;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use crossterm::cursor;
use crossterm::event;
use crossterm::event::Event as CtEvent;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyModifiers;
use crossterm::execute;
use crossterm::style;
use crossterm::terminal;
use tracing::info;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use lifeview::draw::Canvas;
use lifeview::params::ViewerParams;
use lifeview::settings::Viewport;
use lifeview::stream::EventStream;
use lifeview::stream::StreamError;
use lifeview::stream::StreamEvent;
use lifeview::viewer::Viewer;

#[derive(Parser, Debug)]
#[command(name = "lifeview", version, about = "Watch a live Game of Life board in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a board event stream
    Watch {
        /// File holding a `text/event-stream`, or `-` for stdin
        #[arg(default_value = "-", value_name = "INPUT")]
        input: PathBuf,

        /// Display refresh rate
        #[arg(long, default_value_t = 60, value_name = "FPS")]
        fps: u32,

        /// Read the whole stream, then print the last frame and exit
        #[arg(long)]
        once: bool,
    },

    /// Print the event stream URL for a board
    Url {
        #[arg(long, default_value = "http://localhost:7676", value_name = "URL")]
        origin: String,

        #[arg(long)]
        rows: Option<String>,

        #[arg(long)]
        seed: Option<String>,

        /// Initial board, in the server's bitmap text encoding
        #[arg(long)]
        init_state: Option<String>,
    },
}

enum Event {
    Exit,
    Resize { cols: u16, rows: u16 },
}

fn handle_event(event: CtEvent) -> Option<Event> {
    match event {
        CtEvent::Key(
            KeyEvent {
                code: KeyCode::Char('q'),
                ..
            }
            | KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                ..
            }
            | KeyEvent {
                code: KeyCode::Esc, ..
            },
        ) => Some(Event::Exit),
        CtEvent::Resize(cols, rows) => Some(Event::Resize { cols, rows }),
        _ => None,
    }
}

fn open_input(input: &Path) -> anyhow::Result<Box<dyn BufRead + Send>> {
    if input.as_os_str() == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }

    let file = File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;

    Ok(Box::new(BufReader::new(file)))
}

/// Pixel area a terminal of `cols x rows` characters offers, keeping the last line free.
fn terminal_viewport(cols: u16, rows: u16) -> Viewport {
    Viewport::new(cols as u32 * 2, rows.saturating_sub(1) as u32 * 4)
}

fn watch_once(input: Box<dyn BufRead + Send>) -> anyhow::Result<()> {
    let (cols, rows) = terminal::size().unwrap_or((80, 24));

    let mut viewer = Viewer::new(
        Canvas::new(0, 0),
        terminal_viewport(cols, rows),
        ViewerParams::default(),
    );
    viewer.connect();

    for event in EventStream::new(input) {
        let event = event.context("Failed to read event stream")?;

        if let Err(err) = viewer.handle_event(&event) {
            warn!(kind = event.kind(), payload = event.payload(), "{err}");
        }
    }

    if viewer.on_refresh().is_none() {
        warn!("No frame to paint");
    }

    print!("{}", viewer.surface_mut().render());

    Ok(())
}

fn watch(input: Box<dyn BufRead + Send>, fps: u32) -> anyhow::Result<()> {
    let frametime = Duration::from_secs(1) / fps.max(1);

    let (tx, rx) = mpsc::channel::<Result<StreamEvent, StreamError>>();
    thread::spawn(move || {
        for event in EventStream::new(input) {
            if tx.send(event).is_err() {
                break;
            }
        }
    });

    let (cols, rows) = terminal::size()?;
    let mut viewer = Viewer::new(
        Canvas::new(0, 0),
        terminal_viewport(cols, rows),
        ViewerParams::default(),
    );
    viewer.connect();

    let mut stdout = io::stdout();
    let mut stream_open = true;

    loop {
        let t = time::Instant::now();

        // Poll input for as long as one refresh
        if event::poll(frametime)? {
            match handle_event(event::read()?) {
                None => {}
                Some(Event::Exit) => break,
                Some(Event::Resize { cols, rows }) => {
                    viewer.set_viewport(terminal_viewport(cols, rows));
                }
            }
        }

        while stream_open {
            match rx.try_recv() {
                Ok(Ok(event)) => {
                    if let Err(err) = viewer.handle_event(&event) {
                        warn!(kind = event.kind(), payload = event.payload(), "{err}");
                    }
                }
                Ok(Err(err)) => warn!("{err}"),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    info!("Event stream ended");
                    stream_open = false;
                }
            }
        }

        if viewer.on_refresh().is_some() {
            let s = viewer.surface_mut().render();

            execute!(
                stdout,
                terminal::Clear(terminal::ClearType::All),
                cursor::MoveTo(0, 0),
            )?;

            for line in s.lines() {
                execute!(stdout, style::Print(line), cursor::MoveToNextLine(1))?;
            }
        }

        thread::sleep(frametime.saturating_sub(t.elapsed()));
    }

    viewer.disconnect();

    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Watch { input, fps, once } => {
            let input = open_input(&input)?;

            if once {
                return watch_once(input);
            }

            terminal::enable_raw_mode()?;
            let res = watch(input, fps);
            terminal::disable_raw_mode()?;

            res
        }
        Command::Url {
            origin,
            rows,
            seed,
            init_state,
        } => {
            let params = ViewerParams::from_attributes(
                rows.as_deref(),
                seed.as_deref(),
                init_state.as_deref(),
            )?;

            println!("{}", params.connection_url(&origin)?);

            Ok(())
        }
    }
}
