/// Per-frame keyboard snapshot the stages and state read from
use std::collections::HashSet;

/// Keys the visualizer reacts to, independent of the input backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Space,
    Shift,
    W,
    A,
    S,
    D,
    Q,
    E,
    /// Free or lock the focused stage's observer camera
    Lock,
    /// Show or hide the vertex markers
    Markers,
    Digit(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub alt: bool,
    pub ctrl: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        alt: false,
        ctrl: false,
    };
    pub const ALT: Modifiers = Modifiers {
        alt: true,
        ctrl: false,
    };
}

/// Keys pressed this frame plus keys currently held down
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pressed: Vec<(Key, Modifiers)>,
    held: HashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press event; a pressed key also counts as held this frame
    pub fn press(&mut self, key: Key, modifiers: Modifiers) {
        self.pressed.push((key, modifiers));
        self.held.insert(key);
    }

    pub fn hold(&mut self, key: Key) {
        self.held.insert(key);
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.pressed.iter().any(|(k, _)| *k == key)
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// Digit pressed together with the mode modifier (Alt), if any
    pub fn mode_digit(&self) -> Option<u8> {
        self.pressed.iter().find_map(|(key, modifiers)| match key {
            Key::Digit(n) if modifiers.alt => Some(*n),
            _ => None,
        })
    }

    /// Axis value from a pair of opposing keys: -1, 0 or 1
    pub fn axis(&self, negative: Key, positive: Key) -> f32 {
        match (self.is_down(negative), self.is_down(positive)) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }

    pub fn clear(&mut self) {
        self.pressed.clear();
        self.held.clear();
    }
}
