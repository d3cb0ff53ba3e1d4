pub mod app;
pub mod components;

// Re-export components for easier access
pub use components::*;

use anyhow::Result;
use crate::app::App;
use ratatui::Frame;

/// Draw the main UI
pub fn draw_ui(f: &mut Frame, app: &App) -> Result<()> {
    let size = f.area();
    let view = app.shell.view();

    app::draw_player_view(f, app, &view, size);

    if let Some((msg, time, color)) = &app.status_message {
        app::draw_status_message(f, msg, *color, time.elapsed());
    }

    if app.is_command_mode() {
        app::draw_command_prompt(f, app.get_command_buffer());
    }

    if app.show_help {
        app::draw_help_dialog(f);
    }

    Ok(())
}
