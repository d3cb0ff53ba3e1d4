use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Widget, Wrap, Clear, Gauge},
    buffer::Buffer,
};
use unicode_width::UnicodeWidthStr;
use std::time::Duration;

use marquee_core::QualityOption;

/// Scrubber with the clock text as its label
pub struct ProgressBar<'a> {
    percent: f64,
    clock: &'a str,
    is_playing: bool,
    title: Option<&'a str>,
}

impl<'a> ProgressBar<'a> {
    pub fn new(percent: f64, clock: &'a str) -> Self {
        Self {
            percent,
            clock,
            is_playing: false,
            title: None,
        }
    }

    pub fn playing(mut self, is_playing: bool) -> Self {
        self.is_playing = is_playing;
        self
    }

    pub fn title(mut self, title: Option<&'a str>) -> Self {
        self.title = title;
        self
    }
}

impl<'a> Widget for ProgressBar<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let display_title = match (self.is_playing, self.title) {
            (false, Some(title)) => format!("⏸  {} ", title),
            (true, Some(title)) => format!("▶  {} ", title),
            (false, None) => "⏸  Paused ".to_string(),
            (true, None) => "▶  Playing ".to_string(),
        };

        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(display_title))
            .gauge_style(
                Style::default()
                    .fg(Color::Blue)
                    .bg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            )
            .percent(self.percent.clamp(0.0, 100.0) as u16)
            .label(self.clock.to_string());

        gauge.render(area, buf);
    }
}

/// Transport button row
pub struct PlaybackControls {
    is_playing: bool,
    can_seek: bool,
    seek_step: f64,
    show_keyboard_hints: bool,
}

impl PlaybackControls {
    pub fn new(is_playing: bool) -> Self {
        Self {
            is_playing,
            can_seek: true,
            seek_step: 5.0,
            show_keyboard_hints: true,
        }
    }

    pub fn can_seek(mut self, can_seek: bool) -> Self {
        self.can_seek = can_seek;
        self
    }

    pub fn seek_step(mut self, secs: f64) -> Self {
        self.seek_step = secs;
        self
    }

    pub fn show_keyboard_hints(mut self, show: bool) -> Self {
        self.show_keyboard_hints = show;
        self
    }
}

impl Widget for PlaybackControls {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let step = format!("{}s", self.seek_step);
        let buttons = vec![
            ("⏪", "Back 30s".to_string(), self.can_seek, "b"),
            ("◀◀", format!("Back {}", step), self.can_seek, "←"),
            (
                if self.is_playing { "⏸" } else { "▶" },
                if self.is_playing { "Pause" } else { "Play" }.to_string(),
                true,
                "␣",
            ),
            ("▶▶", format!("Forward {}", step), self.can_seek, "→"),
            ("⏩", "Forward 30s".to_string(), self.can_seek, "f"),
        ];

        let constraints = vec![Constraint::Percentage(20); buttons.len()];
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(area);

        for ((symbol, tooltip, enabled, key), chunk) in buttons.into_iter().zip(chunks.iter()) {
            let style = if enabled {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            let key_hint = if self.show_keyboard_hints {
                format!(" ({})", key)
            } else {
                String::new()
            };

            let content = Paragraph::new(Line::from(vec![
                Span::styled(symbol, style.add_modifier(Modifier::BOLD)),
                Span::styled(format!(" {}{}", tooltip, key_hint), style),
            ]))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));

            content.render(*chunk, buf);
        }
    }
}

/// Display a status message with fade effect
pub struct StatusMessage<'a> {
    message: &'a str,
    color: Color,
    age: Duration,
    max_age: Duration,
}

impl<'a> StatusMessage<'a> {
    pub fn new(message: &'a str, color: Color, age: Duration) -> Self {
        Self {
            message,
            color,
            age,
            max_age: Duration::from_secs(3),
        }
    }

    pub fn max_age(mut self, duration: Duration) -> Self {
        self.max_age = duration;
        self
    }
}

impl<'a> Widget for StatusMessage<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let fade_factor = if self.age > self.max_age {
            0.0
        } else {
            1.0 - (self.age.as_secs_f32() / self.max_age.as_secs_f32())
        };

        if fade_factor <= 0.0 {
            return;
        }

        // Errors stay red until they expire
        let color = match (self.color, fade_factor) {
            (Color::Red, _) => Color::Red,
            (_, f) if f > 0.7 => self.color,
            _ => Color::DarkGray,
        };

        let text = Paragraph::new(Text::from(self.message))
            .style(Style::default().fg(color))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color))
                    .style(Style::default().bg(Color::Black)),
            );

        let message_width = self.message.width() as u16 + 4;
        let message_area = Rect {
            x: area.x + (area.width.saturating_sub(message_width)) / 2,
            y: area.y,
            width: message_width.min(area.width),
            height: area.height.min(3),
        };

        Clear.render(message_area, buf);
        text.render(message_area, buf);
    }
}

/// Volume slider readout
pub struct VolumeIndicator {
    volume: u8, // 0-100
    muted: bool,
}

impl VolumeIndicator {
    pub fn new(volume: u8, muted: bool) -> Self {
        Self {
            volume: volume.min(100),
            muted,
        }
    }

    /// From a 0.0 - 1.0 slider value
    pub fn from_level(level: f64, muted: bool) -> Self {
        Self::new((level.clamp(0.0, 1.0) * 100.0).round() as u8, muted)
    }
}

impl Widget for VolumeIndicator {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (icon, color) = if self.muted {
            ("🔇", Color::DarkGray)
        } else if self.volume == 0 {
            ("🔇", Color::White)
        } else if self.volume < 30 {
            ("🔈", Color::White)
        } else if self.volume < 70 {
            ("🔉", Color::White)
        } else {
            ("🔊", Color::White)
        };

        let vol_text = if self.muted {
            format!("{} Muted", icon)
        } else {
            format!("{} {}%", icon, self.volume)
        };

        Paragraph::new(Text::from(vol_text))
            .style(Style::default().fg(color))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Volume"))
            .render(area, buf);
    }
}

/// Quality picker; the active entry is highlighted
pub struct QualityMenu<'a> {
    options: &'a [QualityOption],
}

impl<'a> QualityMenu<'a> {
    pub fn new(options: &'a [QualityOption]) -> Self {
        Self { options }
    }
}

impl<'a> Widget for QualityMenu<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut spans = Vec::new();
        for (i, option) in self.options.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" | "));
            }
            let style = if option.active {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let label = match &option.detail {
                Some(detail) => format!("[{}] {} ({})", i + 1, option.label, detail),
                None => format!("[{}] {}", i + 1, option.label),
            };
            spans.push(Span::styled(label, style));
        }

        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}

/// Key reference
pub struct HelpOverlay {
    show_commands: bool,
}

impl HelpOverlay {
    pub fn new(show_commands: bool) -> Self {
        Self { show_commands }
    }
}

fn help_line(key: &'static str, action: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(key, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(action),
    ])
}

impl Widget for HelpOverlay {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let heading = Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
        let mut lines = vec![
            Line::from(Span::styled("Keyboard Controls", heading)),
            Line::from(""),
            help_line("Space/Enter", " - Play/Pause"),
            help_line("←/→", " - Seek by the configured step"),
            help_line("b/f", " - Seek 30 seconds back/forward"),
            help_line("+/-", " - Volume up/down"),
            help_line("m", " - Mute"),
            help_line("F", " - Fullscreen"),
            help_line("1-9", " - Pick quality"),
            help_line("Esc", " - Close the player"),
        ];

        if self.show_commands {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Commands (:)", heading)));
            lines.push(help_line("seek <pct>", " - Jump to a percentage"));
            lines.push(help_line("volume <0-100>", " - Set volume"));
            lines.push(help_line("quality <n>", " - Switch source"));
            lines.push(help_line("mute | fullscreen | close", ""));
        }

        let help = Paragraph::new(Text::from(lines))
            .block(Block::default().title("Help").borders(Borders::ALL))
            .style(Style::default().fg(Color::White).bg(Color::Black))
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });

        Clear.render(area, buf);
        help.render(area, buf);
    }
}

/// Get a spinner frame for loading animations
pub fn get_spinner_frame(duration_ms: u128) -> &'static str {
    const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠚", "⠞", "⠖", "⠦", "⠴", "⠲", "⠳", "⠓"];
    let frame_idx = (duration_ms / 80) % SPINNER_FRAMES.len() as u128;
    SPINNER_FRAMES[frame_idx as usize]
}
