use std::{io, path::PathBuf, time::{Duration, Instant}, fs::OpenOptions, io::Write};
use anyhow::{Result, Context};
use clap::Parser;
use ratatui::{
    backend::CrosstermBackend,
    Terminal,
    style::Color,
};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use marquee_core::{EventBus, MovieDescriptor, PlayerConfig, SimulatedHost};

// Debug logger to file; stderr is unusable while the terminal is in raw mode
fn debug_log(message: &str) {
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open("marquee_debug.log")
    {
        let datetime = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let _ = writeln!(file, "[{}] {}", datetime, message);
    }
}

mod app;
mod commands;
mod ui;

use app::App;

/// Terminal movie player
#[derive(Parser, Debug)]
#[command(name = "marquee", version, about)]
struct Args {
    /// Movie descriptor (JSON with title and videos)
    movie: PathBuf,

    /// Player config file; defaults to the platform config directory
    #[arg(long)]
    config: Option<PathBuf>,

    /// Duration reported for every direct source, in seconds
    #[arg(long)]
    duration: Option<f64>,
}

fn config_path(args: &Args) -> PathBuf {
    args.config.clone().unwrap_or_else(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("marquee")
            .join("config.json")
    })
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    debug_log("Application starting");

    let config = PlayerConfig::load(&config_path(&args)).context("Failed to load player config")?;
    let movie = MovieDescriptor::load(&args.movie)?;

    let host = SimulatedHost::new(EventBus::new());
    if let Some(secs) = args.duration {
        host.set_default_duration(secs);
    }

    // Restore the terminal before the default hook prints the panic
    let orig_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen, DisableMouseCapture);
        debug_log(&format!("PANIC: {}", panic_info));
        orig_hook(panic_info);
    }));

    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture) {
        let _ = disable_raw_mode();
        debug_log(&format!("Failed to setup terminal: {}", e));
        return Err(anyhow::anyhow!("Failed to setup terminal: {}", e));
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(term) => term,
        Err(e) => {
            let _ = disable_raw_mode();
            debug_log(&format!("Failed to create terminal: {}", e));
            return Err(anyhow::anyhow!("Failed to create terminal: {}", e));
        }
    };

    debug_log(&format!("Opening {}", movie.title));
    let mut app = App::new(movie, config, host);

    let tick_rate = Duration::from_millis(33);
    let mut last_tick = Instant::now() - tick_rate;

    debug_log("Entering main loop");

    while !app.should_quit {
        let now = Instant::now();
        if now.duration_since(last_tick) >= tick_rate {
            if let Err(e) = app.update() {
                debug_log(&format!("App update error: {}", e));
                app.set_status(format!("Error: {}", e), Color::Red);
            }

            if let Err(e) = terminal.draw(|f| {
                if let Err(e) = ui::draw_ui(f, &app) {
                    debug_log(&format!("ERROR: UI draw function error: {}", e));
                }
            }) {
                // Display glitches are not worth exiting over
                debug_log(&format!("ERROR: Terminal draw error: {}", e));
            }
            last_tick = now;
        }

        if event::poll(Duration::from_millis(10))? {
            match event::read() {
                Ok(Event::Key(key)) => {
                    debug_log(&format!("EVENT: Key {:?} with modifiers {:?}", key.code, key.modifiers));

                    if (key.code == event::KeyCode::Char('c') || key.code == event::KeyCode::Char('q'))
                        && key.modifiers.contains(event::KeyModifiers::CONTROL)
                    {
                        debug_log("ACTION: Quit key pressed");
                        app.shell.close();
                        app.should_quit = true;
                        break;
                    }

                    if key.code == event::KeyCode::Char(':') && !app.is_command_mode() {
                        app.enter_command_mode();
                    } else if app.is_command_mode() && key.code == event::KeyCode::Enter {
                        let cmd = app.get_command_buffer().to_string();
                        debug_log(&format!("Executing command: {}", cmd));
                        app.exit_command_mode();

                        if let Err(e) = commands::handle_command(&mut app, &cmd) {
                            debug_log(&format!("Command error: {}", e));
                            app.set_status(format!("Error: {}", e), Color::Red);
                        }
                    } else if let Err(e) = app.handle_key_event(key) {
                        debug_log(&format!("Key handler error: {}", e));
                        app.set_status(format!("{}", e), Color::Red);
                    }
                }
                Ok(Event::Mouse(mouse)) => {
                    let area = terminal.get_frame().area();
                    if let Err(e) = app.handle_mouse_event(mouse, area) {
                        app.set_status(format!("{}", e), Color::Red);
                    }
                }
                Ok(Event::Resize(w, h)) => {
                    debug_log(&format!("Resize event: {}x{}", w, h));
                    last_tick = Instant::now() - tick_rate;
                }
                Ok(_) => {}
                Err(e) => {
                    debug_log(&format!("Error reading event: {}", e));
                }
            }
        }
    }

    debug_log("Shutting down application");
    drop(app);

    let cleanup_result = (|| -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        ).context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    })();

    if let Err(e) = cleanup_result {
        debug_log(&format!("Error during cleanup: {}", e));
        eprintln!("Error during cleanup: {}", e);
    }

    debug_log("Application terminated");
    Ok(())
}
