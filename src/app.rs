use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseEvent};
use ratatui::Frame;
use std::time::Instant;

/// One full-screen visualization driven by the event loop
pub trait Screen {
    fn title(&self) -> &str;

    fn on_key(&mut self, key: KeyCode, now: Instant);

    fn on_mouse(&mut self, mouse: MouseEvent, now: Instant);

    /// Draw a frame. Animations are sampled at `now`.
    fn draw(&mut self, frame: &mut Frame, now: Instant);
}

/// Application state
pub struct App {
    screen: Box<dyn Screen>,
    pub should_quit: bool,
}

impl App {
    pub fn new(screen: Box<dyn Screen>) -> Self {
        Self {
            screen,
            should_quit: false,
        }
    }

    pub fn title(&self) -> &str {
        self.screen.title()
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        // Only handle key press events (not release)
        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit(),
            code => self.screen.on_key(code, now),
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        self.screen.on_mouse(mouse, now);
    }

    pub fn draw(&mut self, frame: &mut Frame, now: Instant) {
        self.screen.draw(frame, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, KeyModifiers};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder(Rc<RefCell<Vec<KeyCode>>>);

    impl Screen for Recorder {
        fn title(&self) -> &str {
            "recorder"
        }

        fn on_key(&mut self, key: KeyCode, _now: Instant) {
            self.0.borrow_mut().push(key);
        }

        fn on_mouse(&mut self, _mouse: MouseEvent, _now: Instant) {}

        fn draw(&mut self, _frame: &mut Frame, _now: Instant) {}
    }

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn test_keys_forwarded_until_quit() {
        let keys = Rc::new(RefCell::new(Vec::new()));
        let mut app = App::new(Box::new(Recorder(keys.clone())));
        let now = Instant::now();
        assert_eq!(app.title(), "recorder");

        app.handle_key(key(KeyCode::Char(']'), KeyEventKind::Press), now);
        app.handle_key(key(KeyCode::Char(']'), KeyEventKind::Release), now);
        assert_eq!(*keys.borrow(), vec![KeyCode::Char(']')]);
        assert!(!app.should_quit);

        app.handle_key(key(KeyCode::Char('q'), KeyEventKind::Press), now);
        assert!(app.should_quit);
        assert_eq!(keys.borrow().len(), 1);
    }
}
