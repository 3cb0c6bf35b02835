//! Line editor for the interactive console.
//!
//! Reads one line at a time in raw mode with:
//! - Up/Down history recall (the unfinished line is kept as a draft)
//! - a completion dropdown fed by [`Interpreter::complete`]
//! - Tab or Enter to accept the highlighted suggestion, Esc to close it
//! - Ctrl-C to discard the line, Ctrl-D on an empty line to end the session
//!
//! When stdin is not a terminal it falls back to plain buffered reads.

use crossterm::{
    cursor::{MoveToColumn, MoveUp},
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use quarry_core::{Interpreter, SessionOptions, Suggestion};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use unicode_width::UnicodeWidthStr;

/// Rows of the dropdown visible at once.
const DROPDOWN_ROWS: usize = 8;

/// Previously entered lines, optionally persisted one per line to a file.
pub struct InputHistory {
    entries: Vec<String>,
    file: Option<PathBuf>,
    max_entries: usize,
    /// Position while recalling; `None` when editing a fresh line.
    cursor: Option<usize>,
    draft: String,
}

impl InputHistory {
    pub fn new(file: Option<PathBuf>, max_entries: usize) -> Self {
        let mut entries = file.as_deref().map(read_history).unwrap_or_default();
        if entries.len() > max_entries {
            entries.drain(..entries.len() - max_entries);
        }
        Self {
            entries,
            file,
            max_entries,
            cursor: None,
            draft: String::new(),
        }
    }

    /// Record a submitted line. Blank lines and immediate repeats are skipped.
    pub fn record(&mut self, line: &str) {
        self.cursor = None;
        let line = line.trim();
        if line.is_empty() || self.max_entries == 0 {
            return;
        }
        if self.entries.last().is_some_and(|last| last == line) {
            return;
        }
        self.entries.push(line.to_string());
        if self.entries.len() > self.max_entries {
            self.entries.remove(0);
        }
        self.persist();
    }

    /// Step to an older entry, remembering `current` as the draft on the first step.
    fn older(&mut self, current: &str) -> Option<&str> {
        let next = match self.cursor {
            None if self.entries.is_empty() => return None,
            None => {
                self.draft = current.to_string();
                self.entries.len() - 1
            }
            Some(i) => i.saturating_sub(1),
        };
        self.cursor = Some(next);
        Some(&self.entries[next])
    }

    /// Step to a newer entry; past the newest, the draft comes back.
    fn newer(&mut self) -> Option<String> {
        let i = self.cursor?;
        if i + 1 < self.entries.len() {
            self.cursor = Some(i + 1);
            Some(self.entries[i + 1].clone())
        } else {
            self.cursor = None;
            Some(std::mem::take(&mut self.draft))
        }
    }

    fn persist(&self) {
        let Some(path) = &self.file else {
            return;
        };
        if let Some(dir) = path.parent()
            && let Err(e) = std::fs::create_dir_all(dir)
        {
            tracing::debug!(error = %e, "Failed to create history directory");
            return;
        }
        let mut contents = self.entries.join("\n");
        contents.push('\n');
        if let Err(e) = std::fs::write(path, contents) {
            tracing::debug!(error = %e, path = %path.display(), "Failed to write history");
        }
    }
}

fn read_history(path: &Path) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// The text being edited and a cursor counted in chars.
#[derive(Debug, Default)]
struct LineBuffer {
    text: String,
    cursor: usize,
}

impl LineBuffer {
    fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.chars().count();
    }

    fn byte_index(&self, char_pos: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_pos)
            .map_or(self.text.len(), |(i, _)| i)
    }

    fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.text.remove(at);
    }

    fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    /// Display width of the text before the cursor.
    fn cursor_width(&self) -> usize {
        self.text[..self.byte_index(self.cursor)].width()
    }
}

/// Replace the word being typed with `suggestion`.
///
/// A completed keyword gets a trailing space so the next argument can follow.
fn accept_suggestion(line: &str, suggestion: &str) -> String {
    match line.rfind(char::is_whitespace) {
        Some(pos) => format!("{}{suggestion}", &line[..=pos]),
        None => format!("{suggestion} "),
    }
}

/// Open completion list with a highlighted row.
struct Dropdown {
    items: Vec<Suggestion>,
    selected: usize,
    offset: usize,
}

impl Dropdown {
    /// Open a dropdown, or `None` when there is nothing useful to offer.
    fn open(line: &str, interpreter: &Interpreter, options: &SessionOptions) -> Option<Self> {
        if !options.autocomplete || !line.trim_start().starts_with('.') {
            return None;
        }
        let items = interpreter.complete(line, options);
        let typed = line.rsplit(char::is_whitespace).next().unwrap_or("");
        match items.as_slice() {
            [] => None,
            [only] if only.text == typed => None,
            _ => Some(Self {
                items,
                selected: 0,
                offset: 0,
            }),
        }
    }

    fn current(&self) -> &Suggestion {
        &self.items[self.selected]
    }

    fn up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
        self.offset = self.offset.min(self.selected);
    }

    fn down(&mut self) {
        if self.selected + 1 < self.items.len() {
            self.selected += 1;
        }
        if self.selected >= self.offset + DROPDOWN_ROWS {
            self.offset = self.selected + 1 - DROPDOWN_ROWS;
        }
    }

    fn visible(&self) -> &[Suggestion] {
        let end = (self.offset + DROPDOWN_ROWS).min(self.items.len());
        &self.items[self.offset..end]
    }

    /// Screen rows the dropdown occupies, including the overflow counter.
    fn height(&self) -> usize {
        let rows = self.visible().len();
        if self.items.len() > rows { rows + 1 } else { rows }
    }
}

/// What a key press means for the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Submit,
    Accept,
    Dismiss,
    Discard,
    EndOfInput,
    Previous,
    Next,
    Left,
    Right,
    Home,
    End,
    Backspace,
    Delete,
    Insert(char),
    Ignore,
}

fn classify(key: KeyEvent, dropdown_open: bool) -> KeyAction {
    if key.kind == KeyEventKind::Release {
        return KeyAction::Ignore;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => KeyAction::Discard,
        KeyCode::Char('d') if ctrl => KeyAction::EndOfInput,
        KeyCode::Char('a') if ctrl => KeyAction::Home,
        KeyCode::Char('e') if ctrl => KeyAction::End,
        KeyCode::Char(_) if ctrl || key.modifiers.contains(KeyModifiers::ALT) => KeyAction::Ignore,
        KeyCode::Char(c) => KeyAction::Insert(c),
        KeyCode::Enter | KeyCode::Tab | KeyCode::Right if dropdown_open => KeyAction::Accept,
        KeyCode::Enter => KeyAction::Submit,
        KeyCode::Esc => KeyAction::Dismiss,
        KeyCode::Up => KeyAction::Previous,
        KeyCode::Down => KeyAction::Next,
        KeyCode::Left => KeyAction::Left,
        KeyCode::Right => KeyAction::Right,
        KeyCode::Home => KeyAction::Home,
        KeyCode::End => KeyAction::End,
        KeyCode::Backspace => KeyAction::Backspace,
        KeyCode::Delete => KeyAction::Delete,
        _ => KeyAction::Ignore,
    }
}

/// Raw-mode line reader for the console.
pub struct ReplInput {
    history: InputHistory,
    /// Dropdown rows currently drawn under the input line.
    drawn_rows: usize,
}

impl ReplInput {
    pub fn new(history: InputHistory) -> Self {
        Self {
            history,
            drawn_rows: 0,
        }
    }

    /// Read one line. `Ok(None)` means the user ended the session with Ctrl-D.
    pub fn read_line(
        &mut self,
        prompt: &str,
        interpreter: &Interpreter,
        options: &SessionOptions,
    ) -> io::Result<Option<String>> {
        if !io::stdin().is_terminal() {
            return read_plain_line();
        }

        let mut out = io::stdout();
        terminal::enable_raw_mode()?;
        let result = self.edit(&mut out, prompt, interpreter, options);
        let cleanup = self.erase_dropdown(&mut out);
        terminal::disable_raw_mode()?;
        cleanup?;
        queue!(out, Print("\r\n"))?;
        out.flush()?;
        result
    }

    fn edit(
        &mut self,
        out: &mut impl Write,
        prompt: &str,
        interpreter: &Interpreter,
        options: &SessionOptions,
    ) -> io::Result<Option<String>> {
        let mut line = LineBuffer::default();
        let mut dropdown: Option<Dropdown> = None;
        self.paint(out, prompt, &line, None)?;

        loop {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            let mut refresh_completion = false;

            match classify(key, dropdown.is_some()) {
                KeyAction::Ignore => continue,
                KeyAction::Submit => {
                    self.history.record(&line.text);
                    return Ok(Some(line.text.trim().to_string()));
                }
                KeyAction::EndOfInput if line.text.is_empty() => return Ok(None),
                KeyAction::EndOfInput => continue,
                KeyAction::Discard => {
                    line.set("");
                    self.paint(out, prompt, &line, None)?;
                    return Ok(Some(String::new()));
                }
                KeyAction::Accept => {
                    if let Some(open) = dropdown.take() {
                        line.set(accept_suggestion(&line.text, &open.current().text));
                    }
                }
                KeyAction::Dismiss => dropdown = None,
                KeyAction::Previous => match dropdown.as_mut() {
                    Some(open) => open.up(),
                    None => {
                        if let Some(entry) = self.history.older(&line.text) {
                            line.set(entry);
                        }
                    }
                },
                KeyAction::Next => match dropdown.as_mut() {
                    Some(open) => open.down(),
                    None => {
                        if let Some(entry) = self.history.newer() {
                            line.set(entry);
                        }
                    }
                },
                KeyAction::Left => {
                    dropdown = None;
                    line.left();
                }
                KeyAction::Right => line.right(),
                KeyAction::Home => {
                    dropdown = None;
                    line.cursor = 0;
                }
                KeyAction::End => line.cursor = line.text.chars().count(),
                KeyAction::Backspace => {
                    line.backspace();
                    refresh_completion = true;
                }
                KeyAction::Delete => {
                    line.delete();
                    refresh_completion = true;
                }
                KeyAction::Insert(c) => {
                    line.insert(c);
                    refresh_completion = true;
                }
            }

            if refresh_completion {
                dropdown = Dropdown::open(&line.text, interpreter, options);
            }
            self.paint(out, prompt, &line, dropdown.as_ref())?;
        }
    }

    /// Redraw the prompt line and the dropdown, leaving the cursor in the line.
    fn paint(
        &mut self,
        out: &mut impl Write,
        prompt: &str,
        line: &LineBuffer,
        dropdown: Option<&Dropdown>,
    ) -> io::Result<()> {
        self.erase_dropdown(out)?;

        queue!(
            out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::Blue),
            SetAttribute(Attribute::Bold),
            Print(prompt),
            SetAttribute(Attribute::Reset),
            ResetColor,
            Print(&line.text)
        )?;

        if let Some(open) = dropdown {
            let preview = accept_suggestion(&line.text, &open.current().text);
            if let Some(ghost) = preview.strip_prefix(line.text.as_str()) {
                queue!(out, SetForegroundColor(Color::DarkGrey), Print(ghost), ResetColor)?;
            }
            self.draw_dropdown(out, open)?;
        }

        let column = prompt.width() + line.cursor_width();
        queue!(out, MoveToColumn(column.min(u16::MAX as usize) as u16))?;
        out.flush()
    }

    fn draw_dropdown(&mut self, out: &mut impl Write, dropdown: &Dropdown) -> io::Result<()> {
        let term_width = terminal::size().map_or(80, |(w, _)| w as usize);
        let visible = dropdown.visible();
        let name_width = visible.iter().map(|s| s.text.width()).max().unwrap_or(0).max(16);
        let desc_width = term_width.saturating_sub(name_width + 4);

        for (row, item) in visible.iter().enumerate() {
            let highlighted = dropdown.offset + row == dropdown.selected;
            let description: String = item.description.chars().take(desc_width).collect();
            let padding = " ".repeat(name_width - item.text.width().min(name_width));
            queue!(out, Print("\r\n"), Clear(ClearType::CurrentLine))?;
            if highlighted {
                queue!(
                    out,
                    SetAttribute(Attribute::Reverse),
                    Print(format!("  {}{padding} {description}", item.text)),
                    SetAttribute(Attribute::Reset)
                )?;
            } else {
                queue!(
                    out,
                    SetForegroundColor(Color::Cyan),
                    Print(format!("  {}{padding}", item.text)),
                    SetForegroundColor(Color::DarkGrey),
                    Print(format!(" {description}")),
                    ResetColor
                )?;
            }
        }
        if dropdown.items.len() > visible.len() {
            queue!(
                out,
                Print("\r\n"),
                Clear(ClearType::CurrentLine),
                SetForegroundColor(Color::DarkGrey),
                Print(format!(
                    "  ({} of {})",
                    dropdown.selected + 1,
                    dropdown.items.len()
                )),
                ResetColor
            )?;
        }

        self.drawn_rows = dropdown.height();
        queue!(out, MoveUp(self.drawn_rows as u16))
    }

    /// Blank the rows under the input line that the last dropdown used.
    fn erase_dropdown(&mut self, out: &mut impl Write) -> io::Result<()> {
        if self.drawn_rows == 0 {
            return Ok(());
        }
        for _ in 0..self.drawn_rows {
            queue!(out, Print("\r\n"), Clear(ClearType::CurrentLine))?;
        }
        queue!(out, MoveUp(self.drawn_rows as u16))?;
        self.drawn_rows = 0;
        out.flush()
    }
}

fn read_plain_line() -> io::Result<Option<String>> {
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}
