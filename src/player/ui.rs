use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Wrap},
};
use shadow_studio::session::MediaOutput;
use shadow_studio::store::LibraryStore;

use super::app::{App, EditTarget, Focus};
use crate::cli::format_clock;

pub fn draw<S: LibraryStore, O: MediaOutput>(f: &mut Frame, app: &App<S, O>) {
    let size = f.area();

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(size);

    draw_playlist(f, columns[0], app);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Now playing
            Constraint::Length(3), // Progress bar
            Constraint::Length(3), // Subtitle
            Constraint::Length(3), // Note at playhead
            Constraint::Min(4),    // Notes and markers
            Constraint::Length(3), // Controls
            Constraint::Length(1), // Status or note input
        ])
        .split(columns[1]);

    draw_now_playing(f, rows[0], app);
    draw_progress_bar(f, rows[1], app);
    draw_subtitle(f, rows[2], app);
    draw_current_note(f, rows[3], app);
    draw_annotations(f, rows[4], app);
    draw_controls(f, rows[5], app);
    draw_status_line(f, rows[6], app);
}

fn focus_border(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn draw_playlist<S: LibraryStore, O: MediaOutput>(f: &mut Frame, area: Rect, app: &App<S, O>) {
    let catalog = app.library.catalog();
    let focused = matches!(app.focus, Focus::Playlist | Focus::ConfirmDelete);
    let current = app.session.current_index();

    let title = if app.playlist.searching || !app.playlist.query.is_empty() {
        format!(" Search: {}{} ", app.playlist.query, if app.playlist.searching { "_" } else { "" })
    } else {
        format!(" Library ({}) ", catalog.len())
    };

    let items: Vec<ListItem> = app
        .playlist
        .visible
        .iter()
        .enumerate()
        .filter_map(|(row, &index)| {
            let track = catalog.get(index)?;
            let is_current = current == Some(index);
            let is_selected = focused && row == app.playlist.selected;

            let style = if is_selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else if is_current {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let prefix = if is_current { "▶ " } else { "  " };

            Some(ListItem::new(format!("{prefix}{}", track.path)).style(style))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(focus_border(focused))
            .title(title),
    );
    f.render_widget(list, area);
}

fn draw_now_playing<S: LibraryStore, O: MediaOutput>(f: &mut Frame, area: Rect, app: &App<S, O>) {
    let session = &app.session;
    let track = session
        .current_index()
        .and_then(|i| app.library.catalog().get(i));

    let title_line = match track {
        Some(track) => Line::from(vec![
            Span::styled(
                if session.is_playing() { "▶ " } else { "⏸ " },
                Style::default().fg(Color::Green),
            ),
            Span::styled(
                track.name.clone(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  {}", track.path), Style::default().fg(Color::DarkGray)),
        ]),
        None => Line::from(Span::styled(
            "Nothing loaded. Press Tab to pick a track.",
            Style::default().fg(Color::DarkGray),
        )),
    };

    let modes = session.modes();
    let auto_replay = session.auto_replay();
    let mut mode_spans = vec![
        Span::styled(
            format!("{}x", session.playback_rate()),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw("  "),
        mode_flag("continuous", modes.continuous_play),
        mode_flag("loop", modes.loop_current),
        mode_flag("pause-between", modes.auto_pause),
    ];

    let region = session.loop_region();
    match (region.start, region.end) {
        (Some(a), Some(b)) => mode_spans.push(Span::styled(
            format!("A-B {}-{}  ", format_clock(a), format_clock(b)),
            Style::default().fg(Color::Magenta),
        )),
        (Some(a), None) => mode_spans.push(Span::styled(
            format!("A {}…  ", format_clock(a)),
            Style::default().fg(Color::Magenta),
        )),
        _ => {}
    }

    if auto_replay.count > 0 {
        let replay = if session.replay_pending() {
            format!("replay {}/{} (waiting)", session.replays_done() + 1, auto_replay.count)
        } else {
            format!("replay {}/{}", session.replays_done(), auto_replay.count)
        };
        mode_spans.push(Span::styled(replay, Style::default().fg(Color::Blue)));
    }

    let info = Paragraph::new(vec![title_line, Line::from(mode_spans)])
        .block(Block::default().borders(Borders::ALL).title(" Now playing "));
    f.render_widget(info, area);
}

fn mode_flag(name: &str, on: bool) -> Span<'static> {
    if on {
        Span::styled(format!("{name} ● "), Style::default().fg(Color::Green))
    } else {
        Span::styled(format!("{name} ○ "), Style::default().fg(Color::DarkGray))
    }
}

fn draw_progress_bar<S: LibraryStore, O: MediaOutput>(f: &mut Frame, area: Rect, app: &App<S, O>) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(21)])
        .split(area);

    draw_progress_with_marks(f, chunks[0], app);

    let time_info = format!(
        "{} / {}",
        format_clock(app.session.current_time()),
        format_clock(app.session.duration())
    );
    let time_widget = Paragraph::new(time_info)
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(time_widget, chunks[1]);
}

/// Fraction of the track at `seconds`, or None when the duration is unknown.
fn fraction(seconds: f64, duration: f64) -> Option<f64> {
    (duration > 0.0).then(|| (seconds / duration).clamp(0.0, 1.0))
}

fn draw_progress_with_marks<S: LibraryStore, O: MediaOutput>(
    f: &mut Frame,
    area: Rect,
    app: &App<S, O>,
) {
    let duration = app.session.duration();
    let progress = fraction(app.session.current_time(), duration).unwrap_or(0.0);

    let progress_widget = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(progress)
        .label("");
    f.render_widget(progress_widget, area);

    let inner_area = area.inner(Margin {
        horizontal: 1,
        vertical: 1,
    });
    let bar_width = inner_area.width;
    if bar_width == 0 {
        return;
    }
    let column = |seconds: f64| -> Option<u16> {
        let x = (fraction(seconds, duration)? * f64::from(bar_width - 1)) as u16;
        Some(x.min(bar_width - 1))
    };

    let region = app.session.loop_region();
    if let (Some(start), Some(end)) = (region.start, region.end)
        && let (Some(start_x), Some(end_x)) = (column(start), column(end))
    {
        let selection = Block::default().style(Style::default().bg(Color::DarkGray));
        f.render_widget(
            selection,
            Rect {
                x: inner_area.x + start_x,
                y: inner_area.y,
                width: end_x.saturating_sub(start_x).max(1),
                height: 1,
            },
        );
    }

    let mut overlay = |x: u16, symbol: &'static str, color: Color| {
        let mark = Paragraph::new(symbol)
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD));
        f.render_widget(
            mark,
            Rect {
                x: inner_area.x + x,
                y: inner_area.y,
                width: 1,
                height: 1,
            },
        );
    };

    for marker in app.annotations.markers() {
        if let Some(x) = column(marker.time) {
            overlay(x, "▼", Color::Yellow);
        }
    }
    if let Some(x) = region.start.and_then(column) {
        overlay(x, "┃", Color::Green);
    }
    if let Some(x) = region.end.and_then(column) {
        overlay(x, "┃", Color::Red);
    }
}

fn draw_subtitle<S: LibraryStore, O: MediaOutput>(f: &mut Frame, area: Rect, app: &App<S, O>) {
    let text = app
        .annotations
        .active_subtitle(app.session.current_time())
        .map(|segment| segment.text.as_str())
        .unwrap_or("");

    let subtitle = Paragraph::new(text)
        .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Subtitle "));
    f.render_widget(subtitle, area);
}

fn draw_current_note<S: LibraryStore, O: MediaOutput>(f: &mut Frame, area: Rect, app: &App<S, O>) {
    let line = match app.annotations.note_at_or_before(app.session.current_time()) {
        Some(note) => Line::from(vec![
            Span::styled(
                format!("[{}] ", format_clock(note.timestamp)),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw(note.content.clone()),
        ]),
        None => Line::from(""),
    };

    let note = Paragraph::new(line)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Note "));
    f.render_widget(note, area);
}

fn draw_annotations<S: LibraryStore, O: MediaOutput>(f: &mut Frame, area: Rect, app: &App<S, O>) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    if !app.annotations.is_ready() && app.annotations.active_track().is_some() {
        let loading = Paragraph::new("Loading…")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(" Notes "));
        f.render_widget(loading, chunks[0]);
    } else {
        let notes: Vec<ListItem> = app
            .annotations
            .notes()
            .iter()
            .map(|note| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{:>8} ", format_clock(note.timestamp)),
                        Style::default().fg(Color::Yellow),
                    ),
                    Span::raw(note.content.clone()),
                ]))
            })
            .collect();
        let title = format!(" Notes ({}) ", notes.len());
        f.render_widget(
            List::new(notes).block(Block::default().borders(Borders::ALL).title(title)),
            chunks[0],
        );
    }

    let markers: Vec<ListItem> = app
        .annotations
        .markers()
        .iter()
        .map(|marker| {
            ListItem::new(format!("{:>8} {}", format_clock(marker.time), marker.label))
                .style(Style::default().fg(Color::Yellow))
        })
        .collect();
    let title = format!(" Markers ({}) ", markers.len());
    f.render_widget(
        List::new(markers).block(Block::default().borders(Borders::ALL).title(title)),
        chunks[1],
    );
}

fn key_hint(key: &str, label: &str, color: Color) -> [Span<'static>; 2] {
    [
        Span::styled(format!("[{key}]"), Style::default().fg(color)),
        Span::raw(format!(" {label}  ")),
    ]
}

fn draw_controls<S: LibraryStore, O: MediaOutput>(f: &mut Frame, area: Rect, app: &App<S, O>) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    // Configured hotkeys first, then the fixed player keys
    let mut bound: Vec<Span> = Vec::new();
    for (action, code) in app.dispatcher.key_map().iter() {
        bound.extend(key_hint(code, action.description(), Color::Magenta));
    }

    let mut fixed: Vec<Span> = Vec::new();
    let hints: &[(&str, &str)] = if app.focus == Focus::Playlist {
        &[
            ("enter", "play"),
            ("/", "search"),
            ("d", "delete track"),
            ("D", "delete folder"),
            ("tab", "player"),
            ("q", "quit"),
        ]
    } else {
        &[
            ("tab", "library"),
            ("n/e/d", "note"),
            ("t/T/D", "subtitle"),
            ("i/o", "sub in/out"),
            ("a", "A-B"),
            ("[ ]", "markers"),
            ("x", "del marker"),
            ("s", "speed"),
            ("c/l/u", "modes"),
            (", .", "prev/next"),
            ("q", "quit"),
        ]
    };
    for (key, label) in hints {
        fixed.extend(key_hint(key, label, Color::Cyan));
    }

    f.render_widget(Block::default().borders(Borders::TOP), rows[0]);
    f.render_widget(
        Paragraph::new(Line::from(bound)).alignment(Alignment::Center),
        rows[1],
    );
    f.render_widget(
        Paragraph::new(Line::from(fixed)).alignment(Alignment::Center),
        rows[2],
    );
}

fn draw_status_line<S: LibraryStore, O: MediaOutput>(f: &mut Frame, area: Rect, app: &App<S, O>) {
    let line = match app.focus {
        Focus::Input(target) => {
            let prompt = match target {
                EditTarget::NewNote => {
                    format!("Note at {}: ", format_clock(app.session.current_time()))
                }
                EditTarget::Note(_) => "Edit note: ".to_string(),
                EditTarget::Subtitle(_) => "Subtitle text: ".to_string(),
            };
            Line::from(vec![
                Span::styled(prompt, Style::default().fg(Color::Yellow)),
                Span::raw(format!("{}_", app.input)),
            ])
        }
        Focus::ConfirmDelete => Line::from(Span::styled(
            format!(
                "Remove {} and its annotations? [y/N]",
                app.pending_delete.as_deref().unwrap_or_default()
            ),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        _ => match &app.status {
            Some((message, _)) => {
                Line::from(Span::styled(message.clone(), Style::default().fg(Color::Green)))
            }
            None => Line::from(""),
        },
    };
    f.render_widget(Paragraph::new(line), area);
}
