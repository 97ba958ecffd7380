//! Terminal frontend
//!
//! Renders the controller's `AppSnapshot` and turns key presses into
//! `AppCommand`s. The only state kept here is what the controller does not
//! care about: the text being typed, which pane has focus, and list cursors.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::Sender;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use ratatui::widgets::*;

use bookshelf::app::{AppCommand, AppSnapshot, NoticeKind, Screen};
use bookshelf::data::Book;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Input,
    Results,
}

struct UiState {
    running: bool,
    input: String,
    focus: Focus,
    result_cursor: usize,
    favorite_cursor: usize,
}

impl UiState {
    fn new() -> Self {
        Self {
            running: true,
            input: String::new(),
            focus: Focus::Input,
            result_cursor: 0,
            favorite_cursor: 0,
        }
    }

    /// Keep cursors inside lists that may have shrunk since the last frame
    fn clamp_to(&mut self, snapshot: &AppSnapshot) {
        self.result_cursor = self
            .result_cursor
            .min(snapshot.results.len().saturating_sub(1));
        self.favorite_cursor = self
            .favorite_cursor
            .min(snapshot.favorites.len().saturating_sub(1));
    }

    /// Map a key press to a controller command, updating local state
    fn handle_key(&mut self, key: KeyEvent, snapshot: &AppSnapshot) -> Option<AppCommand> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.running = false;
            return None;
        }
        // Any key acknowledges a notice
        if snapshot.notice.is_some() {
            return Some(AppCommand::DismissNotice);
        }
        match snapshot.screen {
            Screen::Search => self.search_key(key, snapshot),
            Screen::Detail => detail_key(key),
            Screen::Favorites => self.favorites_key(key, snapshot),
        }
    }

    fn search_key(&mut self, key: KeyEvent, snapshot: &AppSnapshot) -> Option<AppCommand> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('f') => Some(AppCommand::OpenFavorites),
                _ => None,
            };
        }

        match (self.focus, key.code) {
            (_, KeyCode::Esc) => {
                self.running = false;
                None
            }
            (_, KeyCode::Tab | KeyCode::BackTab) => {
                self.focus = match self.focus {
                    Focus::Input => Focus::Results,
                    Focus::Results => Focus::Input,
                };
                None
            }

            (Focus::Input, KeyCode::Enter) => {
                let query = self.input.trim();
                if query.is_empty() {
                    return None;
                }
                let cmd = AppCommand::Search(query.to_string());
                self.result_cursor = 0;
                self.focus = Focus::Results;
                Some(cmd)
            }
            (Focus::Input, KeyCode::Backspace) => {
                self.input.pop();
                None
            }
            (Focus::Input, KeyCode::Down) => {
                self.focus = Focus::Results;
                None
            }
            (Focus::Input, KeyCode::Char(c)) => {
                self.input.push(c);
                None
            }

            (Focus::Results, KeyCode::Up | KeyCode::Char('k')) => {
                if self.result_cursor == 0 {
                    self.focus = Focus::Input;
                } else {
                    self.result_cursor -= 1;
                }
                None
            }
            (Focus::Results, KeyCode::Down | KeyCode::Char('j')) => {
                self.result_cursor =
                    (self.result_cursor + 1).min(snapshot.results.len().saturating_sub(1));
                None
            }
            (Focus::Results, KeyCode::Enter) => snapshot
                .results
                .get(self.result_cursor)
                .cloned()
                .map(AppCommand::OpenDetail),
            (Focus::Results, KeyCode::Char('/')) => {
                self.focus = Focus::Input;
                None
            }

            _ => None,
        }
    }

    fn favorites_key(&mut self, key: KeyEvent, snapshot: &AppSnapshot) -> Option<AppCommand> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.favorite_cursor = self.favorite_cursor.saturating_sub(1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.favorite_cursor =
                    (self.favorite_cursor + 1).min(snapshot.favorites.len().saturating_sub(1));
                None
            }
            KeyCode::Enter => snapshot
                .favorites
                .get(self.favorite_cursor)
                .cloned()
                .map(AppCommand::OpenDetail),
            KeyCode::Char('r') => Some(AppCommand::RefreshFavorites),
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('q') => Some(AppCommand::Back),
            _ => None,
        }
    }
}

fn detail_key(key: KeyEvent) -> Option<AppCommand> {
    match key.code {
        KeyCode::Char('a') => Some(AppCommand::AddFavorite),
        KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('q') => Some(AppCommand::Back),
        _ => None,
    }
}

/// Run the UI until the user quits
pub fn run(cmd_tx: &Sender<AppCommand>, shared_state: &Arc<Mutex<AppSnapshot>>) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;

    let result = event_loop(cmd_tx, shared_state);

    // Restore terminal
    terminal::disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    result
}

fn event_loop(cmd_tx: &Sender<AppCommand>, shared_state: &Arc<Mutex<AppSnapshot>>) -> io::Result<()> {
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let tick_rate = Duration::from_millis(50);
    let mut ui = UiState::new();

    while ui.running {
        let snapshot = shared_state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        ui.clamp_to(&snapshot);

        terminal.draw(|f| draw_ui(f, &ui, &snapshot))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(cmd) = ui.handle_key(key, &snapshot) {
                        if cmd_tx.send(cmd).is_err() {
                            tracing::warn!("controller gone, leaving UI");
                            ui.running = false;
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

fn draw_ui(f: &mut Frame, ui: &UiState, snapshot: &AppSnapshot) {
    let area = f.area();

    let outer = Block::default()
        .title(format!(" Bookshelf v{} ", env!("CARGO_PKG_VERSION")))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let chunks = Layout::vertical([
        Constraint::Min(0),    // screen body
        Constraint::Length(1), // help bar
    ])
    .split(inner);

    match snapshot.screen {
        Screen::Search => draw_search(f, ui, snapshot, chunks[0]),
        Screen::Detail => draw_detail(f, snapshot, chunks[0]),
        Screen::Favorites => draw_favorites(f, ui, snapshot, chunks[0]),
    }
    draw_help(f, snapshot.screen, chunks[1]);

    if let Some(notice) = &snapshot.notice {
        let color = match notice.kind {
            NoticeKind::Info => Color::Green,
            NoticeKind::Error => Color::Red,
        };
        let popup = centered(chunks[0], 50, 5);
        let block = Block::default()
            .title(" Notice ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(color));
        let text = vec![
            Line::from(Span::styled(notice.text.as_str(), Style::default().fg(color))),
            Line::from(Span::styled(
                "press any key",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        f.render_widget(Clear, popup);
        f.render_widget(
            Paragraph::new(text)
                .block(block)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            popup,
        );
    }
}

fn draw_search(f: &mut Frame, ui: &UiState, snapshot: &AppSnapshot, area: Rect) {
    let rows = Layout::vertical([
        Constraint::Length(3), // query input (border + 1 line + border)
        Constraint::Length(1), // status
        Constraint::Min(0),    // results
    ])
    .split(area);

    let input_focused = ui.focus == Focus::Input;
    let input_block = Block::default()
        .title(" Search ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(focus_style(input_focused));
    let input_inner = input_block.inner(rows[0]);
    f.render_widget(
        Paragraph::new(format!(" {}", ui.input)).block(input_block),
        rows[0],
    );
    if input_focused {
        let offset = (ui.input.chars().count() + 1) as u16;
        let x = input_inner.x + offset.min(input_inner.width.saturating_sub(1));
        f.set_cursor_position((x, input_inner.y));
    }

    f.render_widget(Paragraph::new(search_status(snapshot)), rows[1]);

    let results_block = Block::default()
        .title(" Results ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(focus_style(!input_focused));
    let selected = (!input_focused).then_some(ui.result_cursor);
    draw_book_list(f, &snapshot.results, selected, results_block, rows[2]);
}

fn search_status(snapshot: &AppSnapshot) -> Line<'_> {
    if snapshot.is_searching {
        return Line::from(Span::styled(
            "  Searching...",
            Style::default().fg(Color::Yellow),
        ));
    }
    if let Some(err) = &snapshot.search_error {
        return Line::from(Span::styled(
            format!("  {err}"),
            Style::default().fg(Color::Red),
        ));
    }
    if snapshot.query.is_empty() {
        return Line::from(Span::styled(
            "  Type a query and press Enter",
            Style::default().fg(Color::DarkGray),
        ));
    }
    let summary = match snapshot.results.len() {
        0 => "No books found.".to_string(),
        1 => "1 book".to_string(),
        n => format!("{n} books"),
    };
    Line::from(vec![
        Span::styled(format!("  \"{}\": ", snapshot.query), Style::default().fg(Color::DarkGray)),
        Span::styled(summary, Style::default().fg(Color::White)),
    ])
}

fn draw_detail(f: &mut Frame, snapshot: &AppSnapshot, area: Rect) {
    let block = Block::default()
        .title(" Book ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::DarkGray));

    let Some(book) = &snapshot.detail else {
        f.render_widget(Paragraph::new("  No book selected.").block(block), area);
        return;
    };

    let authors = book.authors_line();
    let authors = if authors.is_empty() { "Unknown".to_string() } else { authors };
    let cover = book.thumbnail_url.as_deref().unwrap_or("---");
    let max_cover_len = area.width.saturating_sub(12) as usize; // "  Cover: " + borders
    let mut text = vec![
        Line::from(Span::styled(
            format!("  {}", book.display_title()),
            Style::default().fg(Color::White).bold(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Authors: ", Style::default().fg(Color::DarkGray)),
            Span::styled(authors, Style::default().fg(Color::Yellow)),
        ]),
        Line::from(vec![
            Span::styled("  Published: ", Style::default().fg(Color::DarkGray)),
            Span::styled(book.display_published_date(), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::styled("  Cover: ", Style::default().fg(Color::DarkGray)),
            Span::styled(truncate_str(cover, max_cover_len), Style::default().fg(Color::DarkGray)),
        ]),
    ];
    if snapshot.is_adding {
        text.push(Line::from(Span::styled(
            "  Saving...",
            Style::default().fg(Color::Yellow),
        )));
    } else if snapshot.in_favorites {
        text.push(Line::from(Span::styled(
            "  In your favorites",
            Style::default().fg(Color::Green),
        )));
    }
    text.push(Line::from(""));
    text.push(Line::from(format!("  {}", book.display_description())));

    f.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn draw_favorites(f: &mut Frame, ui: &UiState, snapshot: &AppSnapshot, area: Rect) {
    let block = Block::default()
        .title(" Favorites ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::DarkGray));

    if snapshot.is_loading_favorites && snapshot.favorites.is_empty() {
        let text = Span::styled("  Loading favorites...", Style::default().fg(Color::Yellow));
        f.render_widget(Paragraph::new(Line::from(text)).block(block), area);
        return;
    }
    if snapshot.favorites.is_empty() {
        let text = Span::styled("  No favorite books yet.", Style::default().fg(Color::DarkGray));
        f.render_widget(Paragraph::new(Line::from(text)).block(block), area);
        return;
    }
    draw_book_list(f, &snapshot.favorites, Some(ui.favorite_cursor), block, area);
}

fn draw_book_list(f: &mut Frame, books: &[Book], selected: Option<usize>, block: Block, area: Rect) {
    let max_len = area.width.saturating_sub(6) as usize; // borders + highlight symbol
    let items: Vec<ListItem> = books
        .iter()
        .map(|book| ListItem::new(book_line(book, max_len)))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !books.is_empty() {
        state.select(selected);
    }
    f.render_stateful_widget(list, area, &mut state);
}

/// "Title  Author, Author" fitted to `max` characters
fn book_line(book: &Book, max: usize) -> Line<'static> {
    let title = truncate_str(book.display_title(), max);
    let remaining = max.saturating_sub(title.chars().count() + 2);
    let authors = book.authors_line();
    if authors.is_empty() || remaining < 4 {
        return Line::from(Span::styled(title, Style::default().fg(Color::White)));
    }
    Line::from(vec![
        Span::styled(title, Style::default().fg(Color::White)),
        Span::raw("  "),
        Span::styled(truncate_str(&authors, remaining), Style::default().fg(Color::DarkGray)),
    ])
}

fn draw_help(f: &mut Frame, screen: Screen, area: Rect) {
    let keys: &[(&str, &str)] = match screen {
        Screen::Search => &[
            ("'Enter' ", "search/open"),
            ("'Tab' ", "focus"),
            ("'Ctrl-F' ", "favorites"),
            ("'Esc' ", "quit"),
        ],
        Screen::Detail => &[("'a' ", "add to favorites"), ("'Esc' ", "back")],
        Screen::Favorites => &[
            ("'Enter' ", "open"),
            ("'r' ", "refresh"),
            ("'Esc' ", "back"),
        ],
    };

    let mut spans = vec![Span::raw(" ")];
    for (i, (key, label)) in keys.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  |  "));
        }
        spans.push(Span::styled(*key, Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(*label));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

/// Rect of at most `width` x `height` centered in `area`
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn truncate_str(s: &str, max: usize) -> String {
    let len = s.chars().count();
    if len <= max {
        s.to_string()
    } else if max > 3 {
        let head: String = s.chars().take(max - 3).collect();
        format!("{head}...")
    } else {
        s.chars().take(max).collect()
    }
}
