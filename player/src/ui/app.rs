use crate::app::App;
use crate::ui::components::*;
use marquee_core::{ShellPhase, ShellView, Surface};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap, Clear},
    Frame,
};
use std::time::Duration;

/// Draw the player: title bar with quality menu, surface, control row
pub fn draw_player_view(f: &mut Frame, app: &App, view: &ShellView, area: Rect) {
    let show_controls = view.controls_visible && view.transport.is_some();
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                                    // Title and quality menu
            Constraint::Min(1),                                       // Surface
            Constraint::Length(if show_controls { 7 } else { 0 }),    // Controls
        ])
        .split(area);

    draw_title_bar(f, view, vertical[0]);
    draw_surface(f, app, view, vertical[1]);
    if show_controls {
        draw_player_controls(f, app, view, vertical[2]);
    }
}

fn phase_label(phase: ShellPhase) -> &'static str {
    match phase {
        ShellPhase::Idle => "Idle",
        ShellPhase::Loading => "Loading",
        ShellPhase::Playing => "Playing",
        ShellPhase::Paused => "Paused",
        ShellPhase::Switching => "Switching quality",
        ShellPhase::Unavailable => "Unavailable",
        ShellPhase::Closed => "Closed",
    }
}

/// Draw the title bar with the quality menu inside it
pub fn draw_title_bar(f: &mut Frame, view: &ShellView, area: Rect) {
    f.render_widget(Block::default().style(Style::default().bg(Color::Black)), area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White).bg(Color::Black))
        .title(format!(" {} - {} ", view.title, phase_label(view.phase)))
        .title_alignment(Alignment::Center)
        .style(Style::default().bg(Color::Black));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if view.qualities.is_empty() {
        let hint = Paragraph::new(Text::from("Esc: Close | h: Help"))
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray));
        f.render_widget(hint, inner);
    } else {
        f.render_widget(QualityMenu::new(&view.qualities), inner);
    }
}

fn draw_surface(f: &mut Frame, app: &App, view: &ShellView, area: Rect) {
    f.render_widget(Block::default().style(Style::default().bg(Color::Black)), area);

    let spinner = get_spinner_frame(app.started.elapsed().as_millis());
    let mut lines = match &view.surface {
        Surface::Media { src } => {
            let mut lines = vec![Line::from(Span::styled(
                src.clone(),
                Style::default().fg(Color::Gray),
            ))];
            match view.phase {
                ShellPhase::Loading | ShellPhase::Switching => lines.push(Line::from(Span::styled(
                    format!("{} Loading media, please wait... {}", spinner, spinner),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ))),
                _ if view.play_overlay => lines.push(Line::from(Span::styled(
                    "[ ▶ PLAY ]",
                    Style::default()
                        .fg(Color::White)
                        .bg(Color::Blue)
                        .add_modifier(Modifier::BOLD),
                ))),
                _ => {}
            }
            lines
        }
        Surface::Frame { embed_url } => vec![
            Line::from(Span::styled(
                "Embedded player",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::from(embed_url.clone()),
            Line::from(Span::styled(
                "Playback controls belong to the embedded player",
                Style::default().fg(Color::Gray),
            )),
        ],
        Surface::Broken { reason } => vec![Line::from(Span::styled(
            reason.clone(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ))],
        Surface::Unavailable => vec![
            Line::from(Span::styled(
                "No playable sources for this movie",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )),
            Line::from("Press Esc to close"),
        ],
        Surface::Closed => vec![Line::from("Player closed")],
    };

    if let Some(error) = &view.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    }

    let padding = area.height.saturating_sub(lines.len() as u16) / 2;
    let mut text = vec![Line::from(""); padding as usize];
    text.extend(lines);

    let surface = Paragraph::new(Text::from(text))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(surface, area);
}

/// Draw the transport row under a directly played source
pub fn draw_player_controls(f: &mut Frame, app: &App, view: &ShellView, area: Rect) {
    let Some(transport) = &view.transport else {
        return;
    };

    let controls_bg = Block::default()
        .style(Style::default().bg(Color::Black))
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::White));
    f.render_widget(controls_bg, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Progress bar
            Constraint::Length(3), // Buttons and volume
            Constraint::Length(1), // Fullscreen state
        ])
        .split(area);

    let title = view.active_quality().map(|q| q.label.as_str());
    let progress_bar = ProgressBar::new(transport.progress_percent, &transport.clock)
        .playing(transport.is_playing)
        .title(title);
    f.render_widget(progress_bar, rows[0]);

    let buttons = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(14)])
        .split(rows[1]);

    let playback_controls = PlaybackControls::new(transport.is_playing)
        .can_seek(view.phase.accepts_transport())
        .seek_step(app.shell.config().seek_step_secs)
        .show_keyboard_hints(true);
    f.render_widget(playback_controls, buttons[0]);
    f.render_widget(
        VolumeIndicator::from_level(transport.volume_level, transport.is_muted),
        buttons[1],
    );

    let fullscreen = if transport.is_fullscreen { "Fullscreen (F to exit)" } else { "F: Fullscreen" };
    let info = Paragraph::new(Text::from(fullscreen))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    f.render_widget(info, rows[2]);
}

pub fn draw_status_message(f: &mut Frame, message: &str, color: Color, age: Duration) {
    let area = f.area();
    let message_area = Rect {
        x: area.x,
        y: area.y + area.height.saturating_sub(10),
        width: area.width,
        height: 3.min(area.height),
    };

    let status_message = StatusMessage::new(message, color, age).max_age(Duration::from_secs(3));
    f.render_widget(status_message, message_area);
}

/// Draw command prompt
pub fn draw_command_prompt(f: &mut Frame, command: &str) {
    let area = Rect::new(0, f.area().height.saturating_sub(1), f.area().width, 1);
    f.render_widget(Clear, area);

    let command_para = Paragraph::new(Text::from(format!(":{}", command)))
        .style(Style::default()
            .fg(Color::Yellow)
            .bg(Color::Black)
            .add_modifier(Modifier::BOLD))
        .alignment(Alignment::Left);
    f.render_widget(command_para, area);

    f.set_cursor_position((area.x + 1 + command.len() as u16, area.y));
}

/// Draw help dialog
pub fn draw_help_dialog(f: &mut Frame) {
    let area = centered_rect(60, 70, f.area());
    f.render_widget(Clear, area);
    f.render_widget(HelpOverlay::new(true), area);
}

/// Create a centered rect using up certain percentage of the available rect
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
