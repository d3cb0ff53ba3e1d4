use anyhow::{Result, anyhow};
use ratatui::style::Color;

use crate::app::App;

/// Command handler for the application
pub struct CommandHandler;

impl CommandHandler {
    /// Parse and execute a command
    pub fn execute(app: &mut App, command_str: &str) -> Result<()> {
        let parts: Vec<&str> = command_str.trim().splitn(2, ' ').collect();
        let cmd = parts[0].to_lowercase();
        let args = parts.get(1).map(|s| s.trim());

        match cmd.as_str() {
            "seek" | "s" => {
                let Some(args) = args else {
                    return Err(anyhow!("Seek command requires a percentage (0-100)"));
                };
                let percent = args
                    .trim_end_matches('%')
                    .parse::<f64>()
                    .map_err(|_| anyhow!("Invalid position: {}", args))?;
                app.shell.seek_to(percent)?;
            }
            "play" | "p" => app.shell.play()?,
            "pause" => app.shell.pause()?,
            "toggle" | "t" => app.shell.toggle_play()?,
            "volume" | "vol" | "v" => {
                let Some(args) = args else {
                    return Err(anyhow!("Volume command requires a level argument (0-100)"));
                };
                let volume = args
                    .parse::<u8>()
                    .ok()
                    .filter(|v| *v <= 100)
                    .ok_or_else(|| anyhow!("Invalid volume: {}", args))?;
                app.shell.set_volume(volume as f64 / 100.0)?;
                app.set_status(format!("Volume set to {}", volume), Color::Yellow);
            }
            "quality" | "q" => {
                let Some(args) = args else {
                    return Err(anyhow!("Quality command requires a source number"));
                };
                let number = args
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n >= 1)
                    .ok_or_else(|| anyhow!("Invalid source number: {}", args))?;
                app.shell.switch_to(number - 1)?;
            }
            "mute" | "m" => app.shell.toggle_mute()?,
            "fullscreen" | "fs" => app.shell.toggle_fullscreen()?,
            "help" | "h" | "?" => {
                app.show_help = true;
            }
            "close" | "quit" | "exit" => {
                app.shell.close();
            }
            "" => {}
            _ => {
                return Err(anyhow!("Unknown command: {}", cmd));
            }
        }

        Ok(())
    }
}

/// Handle a command string entered by the user
pub fn handle_command(app: &mut App, command: &str) -> Result<()> {
    CommandHandler::execute(app, command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_core::{EventBus, MediaSource, MovieDescriptor, PlayerConfig, ShellPhase, SimulatedHost};

    fn app() -> App {
        let movie = MovieDescriptor::new(
            "Arrival",
            vec![
                MediaSource::new("1080p", "/arrival-1080.mp4"),
                MediaSource::new("720p", "/arrival-720.mp4"),
            ],
        );
        let mut app = App::new(movie, PlayerConfig::default(), SimulatedHost::new(EventBus::new()));
        app.tick(0.0);
        app
    }

    #[test]
    fn test_seek_and_volume_commands() {
        let mut app = app();
        handle_command(&mut app, "seek 50").unwrap();
        assert_eq!(app.shell.state().current_time, 60.0);

        handle_command(&mut app, "vol 40").unwrap();
        assert_eq!(app.shell.state().volume, 0.4);

        assert!(handle_command(&mut app, "volume 140").is_err());
        assert!(handle_command(&mut app, "seek").is_err());
    }

    #[test]
    fn test_quality_is_one_based() {
        let mut app = app();
        handle_command(&mut app, "quality 2").unwrap();
        app.tick(0.0);
        assert_eq!(app.shell.state().active_source_index, 1);

        assert!(handle_command(&mut app, "quality 0").is_err());
        assert!(handle_command(&mut app, "quality 7").is_err());
    }

    #[test]
    fn test_close_quits() {
        let mut app = app();
        handle_command(&mut app, "close").unwrap();
        app.tick(0.0);
        assert_eq!(app.shell.phase(), ShellPhase::Closed);
        assert!(app.should_quit);
    }

    #[test]
    fn test_unknown_command() {
        let mut app = app();
        assert!(handle_command(&mut app, "rewind").is_err());
        handle_command(&mut app, "  ").unwrap();
    }
}
