use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, MouseEvent, MouseEventKind};
use ratatui::{layout::Rect, style::Color};
use marquee_core::{Key, MovieDescriptor, PlayerConfig, PlayerShell, SimulatedHost};

/// Controls fade out after this long without input while playing
const CONTROLS_TIMEOUT: Duration = Duration::from_secs(3);
const VOLUME_STEP: f64 = 0.1;
const LONG_SEEK_SECS: f64 = 30.0;

// App state
pub struct App {
    /// The mounted player
    pub shell: PlayerShell<SimulatedHost>,
    /// Handle on the host the player is mounted in
    pub host: SimulatedHost,
    /// Set by the player's close callback
    closed: Rc<Cell<bool>>,
    /// Status message to display
    pub status_message: Option<(String, Instant, Color)>,
    /// Whether the app should exit
    pub should_quit: bool,
    /// Help dialog visibility
    pub show_help: bool,
    /// Whether command mode is active
    pub command_mode: bool,
    /// Command buffer for command mode
    pub command_buffer: String,
    /// Last time the user touched anything
    pub last_ui_interaction: Instant,
    /// Spinner clock
    pub started: Instant,
    last_clock: Instant,
}

impl App {
    pub fn new(movie: MovieDescriptor, config: PlayerConfig, host: SimulatedHost) -> Self {
        let closed = Rc::new(Cell::new(false));
        let flag = closed.clone();
        let shell = PlayerShell::mount(movie, config, host.clone(), move || flag.set(true));

        Self {
            shell,
            host,
            closed,
            status_message: None,
            should_quit: false,
            show_help: false,
            command_mode: false,
            command_buffer: String::new(),
            last_ui_interaction: Instant::now(),
            started: Instant::now(),
            last_clock: Instant::now(),
        }
    }

    /// Set a status message with a color
    pub fn set_status(&mut self, message: impl Into<String>, color: Color) {
        let message_string = message.into();
        log::debug!("Status message: {} ({})", message_string, color);
        self.status_message = Some((message_string, Instant::now(), color));
    }

    pub fn is_command_mode(&self) -> bool {
        self.command_mode
    }

    pub fn enter_command_mode(&mut self) {
        self.command_mode = true;
        self.command_buffer.clear();
    }

    pub fn exit_command_mode(&mut self) {
        self.command_mode = false;
    }

    pub fn get_command_buffer(&self) -> &str {
        &self.command_buffer
    }

    fn touch(&mut self) {
        self.last_ui_interaction = Instant::now();
        self.shell.pointer_entered();
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        self.touch();

        if self.is_command_mode() {
            match key.code {
                KeyCode::Char(c) => self.command_buffer.push(c),
                KeyCode::Backspace => {
                    self.command_buffer.pop();
                }
                KeyCode::Esc => self.exit_command_mode(),
                _ => {}
            }
            return Ok(());
        }

        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('h') | KeyCode::F(1)) {
                self.show_help = false;
            }
            return Ok(());
        }

        let step = self.shell.config().seek_step_secs;
        match key.code {
            // Esc goes through the host like any window keydown
            KeyCode::Esc => {
                self.host.press(Key::Escape);
            }
            KeyCode::Char(' ') | KeyCode::Enter => self.shell.toggle_play()?,
            KeyCode::Left => self.shell.seek_by(-step)?,
            KeyCode::Right => self.shell.seek_by(step)?,
            KeyCode::Char('b') => self.shell.seek_by(-LONG_SEEK_SECS)?,
            KeyCode::Char('f') => self.shell.seek_by(LONG_SEEK_SECS)?,
            KeyCode::Char('+') | KeyCode::Char('=') => self.nudge_volume(VOLUME_STEP)?,
            KeyCode::Char('-') => self.nudge_volume(-VOLUME_STEP)?,
            KeyCode::Char('m') => self.shell.toggle_mute()?,
            KeyCode::Char('F') => self.shell.toggle_fullscreen()?,
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                self.shell.switch_to(index)?;
            }
            KeyCode::Char('h') | KeyCode::F(1) => self.show_help = true,
            _ => {}
        }
        Ok(())
    }

    fn nudge_volume(&mut self, delta: f64) -> Result<()> {
        let state = self.shell.state();
        let current = if state.is_muted { 0.0 } else { state.volume };
        self.shell.set_volume((current + delta).clamp(0.0, 1.0))?;
        Ok(())
    }

    /// Any pointer activity over the player counts as hovering it
    pub fn handle_mouse_event(&mut self, mouse: MouseEvent, area: Rect) -> Result<()> {
        let inside = mouse.column >= area.x
            && mouse.column < area.x + area.width
            && mouse.row >= area.y
            && mouse.row < area.y + area.height;
        if !inside {
            self.shell.pointer_left();
            return Ok(());
        }

        self.touch();
        if let MouseEventKind::Down(_) = mouse.kind {
            self.shell.toggle_play()?;
        }
        Ok(())
    }

    /// Advance the host by `dt` seconds and let the player catch up
    pub fn tick(&mut self, dt: f64) {
        self.host.advance(dt);
        let handled = self.shell.pump();
        if handled > 0 {
            log::trace!("Handled {} host events", handled);
        }

        if self.closed.get() {
            self.should_quit = true;
        }
    }

    /// Called from the main loop at UI rate
    pub fn update(&mut self) -> Result<()> {
        let now = Instant::now();
        let dt = now.duration_since(self.last_clock).as_secs_f64();
        self.last_clock = now;
        self.tick(dt);

        if self.last_ui_interaction.elapsed() > CONTROLS_TIMEOUT {
            self.shell.pointer_left();
        }

        if let Some((_, time, _)) = &self.status_message {
            if time.elapsed() > CONTROLS_TIMEOUT * 2 {
                self.status_message = None;
            }
        }
        Ok(())
    }
}
