use crate::controller::{PlaybackController, TransportIcon};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use std::time::Duration;

const APP_TITLE_WITH_VERSION: &str = "ShuffleBox v0.1.0  ";

#[derive(Clone, Copy)]
struct Palette {
    bg: Color,
    panel_bg: Color,
    panel_alt_bg: Color,
    border: Color,
    text: Color,
    muted: Color,
    accent: Color,
    alert: Color,
}

fn palette() -> Palette {
    Palette {
        bg: Color::Rgb(10, 15, 24),
        panel_bg: Color::Rgb(19, 29, 43),
        panel_alt_bg: Color::Rgb(24, 38, 58),
        border: Color::Rgb(69, 121, 176),
        text: Color::Rgb(214, 228, 248),
        muted: Color::Rgb(149, 173, 204),
        accent: Color::Rgb(100, 203, 184),
        alert: Color::Rgb(249, 174, 88),
    }
}

pub fn draw(frame: &mut Frame, controller: &PlaybackController) {
    let colors = palette();
    frame.render_widget(
        Block::default().style(Style::default().bg(colors.bg)),
        frame.area(),
    );

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    draw_header(frame, controller, &colors, vertical[0]);
    draw_now_playing(frame, controller, &colors, vertical[1]);
    draw_transport(frame, controller, &colors, vertical[2]);
    draw_footer(frame, controller, &colors, vertical[3]);
}

fn draw_header(frame: &mut Frame, controller: &PlaybackController, colors: &Palette, area: Rect) {
    frame.render_widget(
        panel_block("Status", colors.panel_bg, colors.text, colors.border),
        area,
    );

    let inner = area.inner(Margin {
        vertical: 1,
        horizontal: 1,
    });
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(inner);

    let left = Paragraph::new(Line::from(vec![
        Span::styled(
            APP_TITLE_WITH_VERSION,
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("Catalog {}", controller.catalog_len()),
            Style::default().fg(colors.text),
        ),
        Span::styled("  |  ", Style::default().fg(colors.muted)),
        Span::styled(
            format!("History {}", controller.history().len()),
            Style::default().fg(colors.alert),
        ),
    ]));
    frame.render_widget(left, chunks[0]);

    let right = Paragraph::new(Span::styled(
        clock_text(),
        Style::default()
            .fg(colors.text)
            .add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Right);
    frame.render_widget(right, chunks[1]);
}

fn draw_now_playing(
    frame: &mut Frame,
    controller: &PlaybackController,
    colors: &Palette,
    area: Rect,
) {
    let inner_width = area.width.saturating_sub(4) as usize;
    let marquee = controller.marquee_view(inner_width);
    let marquee = if marquee.is_empty() {
        String::from("Press Enter to start the shuffle")
    } else {
        marquee
    };

    let queue_position = controller
        .history()
        .cursor()
        .map(|cursor| format!("{}/{}", cursor + 1, controller.history().len()))
        .unwrap_or_else(|| format!("-/{}", controller.history().len()));

    let lines = vec![
        Line::from(vec![
            Span::styled(
                "Now",
                Style::default()
                    .fg(colors.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  {marquee}"), Style::default().fg(colors.text)),
        ]),
        Line::from(Span::styled(
            format!("Queue   {queue_position}"),
            Style::default().fg(colors.alert),
        )),
        Line::from(""),
        Line::from(Span::styled(
            timeline_line(controller, 32),
            Style::default().fg(colors.muted),
        )),
    ];

    let block = Paragraph::new(lines)
        .block(panel_block(
            "Now Playing",
            colors.panel_alt_bg,
            colors.text,
            colors.border,
        ))
        .wrap(Wrap { trim: true });
    frame.render_widget(block, area);
}

fn draw_transport(
    frame: &mut Frame,
    controller: &PlaybackController,
    colors: &Palette,
    area: Rect,
) {
    let prev_style = if controller.can_skip_prev() {
        Style::default().fg(colors.text)
    } else {
        Style::default().fg(colors.muted)
    };
    let next_style = if controller.can_skip_next() {
        Style::default().fg(colors.text)
    } else {
        Style::default().fg(colors.muted)
    };

    let icon = match controller.icon() {
        TransportIcon::Play => " |>  ",
        TransportIcon::Pause => " ||  ",
        TransportIcon::Loading => " ~~  ",
    };

    let transport = Paragraph::new(Line::from(vec![
        Span::styled(" |<  ", prev_style),
        Span::styled(
            icon,
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" >|  ", next_style),
        Span::styled("  |  ", Style::default().fg(colors.muted)),
        Span::styled(
            format!(
                "Vol {} {:>3}%",
                progress_bar(Some(f64::from(controller.volume())), 14),
                controller.volume_percent()
            ),
            Style::default().fg(colors.text),
        ),
    ]))
    .block(panel_block(
        "Transport",
        colors.panel_bg,
        colors.text,
        colors.border,
    ));
    frame.render_widget(transport, area);
}

fn draw_footer(frame: &mut Frame, controller: &PlaybackController, colors: &Palette, area: Rect) {
    let footer = Paragraph::new(Line::from(vec![
        Span::styled(
            "Keys: Enter/Space play-pause, Left prev, Right next, Up/Down volume, q quit",
            Style::default().fg(colors.muted),
        ),
        Span::styled("  |  ", Style::default().fg(colors.muted)),
        Span::styled(controller.status(), Style::default().fg(colors.text)),
    ]))
    .block(panel_block(
        "Message",
        colors.panel_bg,
        colors.text,
        colors.border,
    ));
    frame.render_widget(footer, area);
}

fn panel_block(title: &str, bg: Color, text: Color, border: Color) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(text).add_modifier(Modifier::BOLD),
        ))
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(bg))
}

fn clock_text() -> String {
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    format!("{:02}:{:02}:{:02}", now.hour(), now.minute(), now.second())
}

fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{minutes:02}:{seconds:02}")
}

fn progress_bar(ratio: Option<f64>, width: usize) -> String {
    let clamped = ratio.unwrap_or(0.0).clamp(0.0, 1.0);
    let filled = (clamped * width as f64).round() as usize;
    let mut bar = String::with_capacity(width + 2);
    bar.push('[');
    bar.push_str(&"#".repeat(filled));
    bar.push_str(&"-".repeat(width.saturating_sub(filled)));
    bar.push(']');
    bar
}

fn timeline_line(controller: &PlaybackController, bar_width: usize) -> String {
    let elapsed = controller.position().unwrap_or(Duration::ZERO);
    let total = controller.duration();
    let ratio = total.and_then(|duration| {
        let total_secs = duration.as_secs_f64();
        (total_secs > 0.0).then_some((elapsed.as_secs_f64() / total_secs).clamp(0.0, 1.0))
    });

    format!(
        "{} / {} {}",
        format_duration(elapsed),
        total
            .map(format_duration)
            .unwrap_or_else(|| String::from("--:--")),
        progress_bar(ratio, bar_width),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(progress_bar(Some(0.0), 4), "[----]");
        assert_eq!(progress_bar(Some(0.5), 4), "[##--]");
        assert_eq!(progress_bar(Some(1.0), 4), "[####]");
        assert_eq!(progress_bar(None, 4), "[----]");
    }

    #[test]
    fn durations_render_as_minutes_and_seconds() {
        assert_eq!(format_duration(Duration::from_secs(0)), "00:00");
        assert_eq!(format_duration(Duration::from_secs(75)), "01:15");
        assert_eq!(format_duration(Duration::from_secs(600)), "10:00");
    }
}
