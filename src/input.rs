use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::{Position, Rect};

pub const PAGE: isize = 20;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    Refresh,
    Kill,
    BeginSearch,
    ClearFilter,
    ClearSelection,
    ToggleHelp,
    ToggleCores,
    Move(isize),
    First,
    Last,
    SelectRow(usize),
    Scroll(isize),
    SearchInput(char),
    SearchBackspace,
    SearchSubmit,
    SearchCancel,
}

/// Screen regions from the last draw, used to resolve mouse clicks.
#[derive(Default, Debug, Clone)]
pub struct HitMap {
    pub buttons: Vec<(Rect, Command)>,
    /// table rows below the header
    pub table_body: Rect,
    pub table_offset: usize,
    pub row_count: usize,
}

impl HitMap {
    pub fn row_at(&self, column: u16, row: u16) -> Option<usize> {
        if !self.table_body.contains(Position::new(column, row)) {
            return None;
        }
        let index = self.table_offset + (row - self.table_body.y) as usize;
        (index < self.row_count).then_some(index)
    }

    pub fn button_at(&self, column: u16, row: u16) -> Option<Command> {
        self.buttons
            .iter()
            .find(|(rect, _)| rect.contains(Position::new(column, row)))
            .map(|(_, cmd)| cmd.clone())
    }
}

pub fn map_key(key: KeyEvent, searching: bool) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Command::Quit);
    }
    if searching {
        return match key.code {
            KeyCode::Enter => Some(Command::SearchSubmit),
            KeyCode::Esc => Some(Command::SearchCancel),
            KeyCode::Backspace => Some(Command::SearchBackspace),
            KeyCode::Char(c) => Some(Command::SearchInput(c)),
            _ => None,
        };
    }
    let cmd = match key.code {
        KeyCode::Char('q') => Command::Quit,
        KeyCode::Char('r') | KeyCode::F(5) => Command::Refresh,
        KeyCode::Char('k') | KeyCode::Delete => Command::Kill,
        KeyCode::Char('/') | KeyCode::Char('s') => Command::BeginSearch,
        KeyCode::Char('c') => Command::ClearFilter,
        KeyCode::Esc => Command::ClearSelection,
        KeyCode::Char('?') | KeyCode::Char('h') => Command::ToggleHelp,
        KeyCode::Char('p') => Command::ToggleCores,
        KeyCode::Down => Command::Move(1),
        KeyCode::Up => Command::Move(-1),
        KeyCode::PageDown => Command::Move(PAGE),
        KeyCode::PageUp => Command::Move(-PAGE),
        KeyCode::Home => Command::First,
        KeyCode::End => Command::Last,
        _ => return None,
    };
    Some(cmd)
}

pub fn map_mouse(mouse: MouseEvent, hits: &HitMap) -> Option<Command> {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => hits
            .button_at(mouse.column, mouse.row)
            .or_else(|| hits.row_at(mouse.column, mouse.row).map(Command::SelectRow)),
        MouseEventKind::ScrollDown => Some(Command::Scroll(3)),
        MouseEventKind::ScrollUp => Some(Command::Scroll(-3)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn hits() -> HitMap {
        HitMap {
            buttons: vec![(Rect::new(0, 0, 8, 1), Command::BeginSearch)],
            table_body: Rect::new(1, 10, 60, 5),
            table_offset: 4,
            row_count: 7,
        }
    }

    #[test]
    fn keys_map_to_actions() {
        assert_eq!(map_key(key(KeyCode::Char('k')), false), Some(Command::Kill));
        assert_eq!(map_key(key(KeyCode::Char('q')), false), Some(Command::Quit));
        assert_eq!(map_key(key(KeyCode::Char('r')), false), Some(Command::Refresh));
        assert_eq!(map_key(key(KeyCode::Char('/')), false), Some(Command::BeginSearch));
        assert_eq!(map_key(key(KeyCode::PageUp), false), Some(Command::Move(-PAGE)));
        assert_eq!(map_key(key(KeyCode::Tab), false), None);
    }

    #[test]
    fn search_mode_captures_letters() {
        assert_eq!(
            map_key(key(KeyCode::Char('q')), true),
            Some(Command::SearchInput('q'))
        );
        assert_eq!(map_key(key(KeyCode::Enter), true), Some(Command::SearchSubmit));
        assert_eq!(map_key(key(KeyCode::Esc), true), Some(Command::SearchCancel));
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(ctrl_c, true), Some(Command::Quit));
    }

    #[test]
    fn key_release_is_ignored() {
        let mut release = key(KeyCode::Char('q'));
        release.kind = KeyEventKind::Release;
        assert_eq!(map_key(release, false), None);
    }

    #[test]
    fn click_resolves_row_with_scroll_offset() {
        let hits = hits();
        assert_eq!(map_mouse(click(5, 10), &hits), Some(Command::SelectRow(4)));
        assert_eq!(map_mouse(click(5, 12), &hits), Some(Command::SelectRow(6)));
        //past the last row
        assert_eq!(map_mouse(click(5, 13), &hits), None);
        //header line
        assert_eq!(map_mouse(click(5, 9), &hits), None);
    }

    #[test]
    fn click_on_button() {
        assert_eq!(map_mouse(click(3, 0), &hits()), Some(Command::BeginSearch));
    }
}
