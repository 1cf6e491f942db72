/// Terminal frontend: the four MVP stages drawn as ASCII, plus a parameter panel
use std::collections::HashMap;
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::{Color as TermColor, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal,
};
use mvp_core::{
    parse_command, Color, Command, DisplayMode, InputState, Key, Modifiers, StageKind, Viewport, VisualizationState,
    Visualizer, VisualizerConfig,
};
use tracing::{debug, info, warn};

pub mod renderer;

pub use renderer::{AsciiRenderer, SharedClipPlanes};

/// Share of the terminal width given to the parameter panel
const PANEL_FRACTION: f32 = 0.2;
/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: f32 = 2.0;
/// Terminals only report presses and repeats; a key counts as held this long
const HOLD_WINDOW: Duration = Duration::from_millis(150);
/// Movement keys as [`map_key`] binds them
pub const PLAYER_CONTROLS: &str = "[Arrows] [Space] [C] move player";

/// Where the panel and the visualization area sit on screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub panel_width: u16,
    pub area_width: u16,
    pub height: u16,
}

impl Layout {
    pub fn new(columns: u16, rows: u16) -> Self {
        let panel_width = ((columns as f32 * PANEL_FRACTION) as u16).min(columns);
        Self {
            panel_width,
            area_width: columns - panel_width,
            height: rows,
        }
    }

    /// Logical size of the visualization area, corrected for cell aspect
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.area_width as f32, self.height as f32 * CELL_ASPECT)
    }

    /// Cell size of one stage target in the given mode
    pub fn target_size(&self, mode: DisplayMode) -> (usize, usize) {
        match mode {
            DisplayMode::All => ((self.area_width / 2) as usize, (self.height / 2) as usize),
            DisplayMode::Single(_) => (self.area_width as usize, self.height as usize),
        }
    }

    /// Top-left terminal cell of a stage target
    pub fn target_origin(&self, mode: DisplayMode, stage: StageKind) -> (u16, u16) {
        match mode {
            DisplayMode::All => {
                let (w, h) = (self.area_width / 2, self.height / 2);
                let i = stage.index() as u16;
                (self.panel_width + (i % 2) * w, (i / 2) * h)
            }
            DisplayMode::Single(_) => (self.panel_width, 0),
        }
    }
}

/// Text being typed after `:`
#[derive(Debug, Default)]
struct CommandLine {
    active: bool,
    buffer: String,
    message: Option<(String, bool)>,
}

/// Main application struct for the terminal visualizer
pub struct TerminalApp {
    visualizer: Visualizer<SharedClipPlanes>,
    targets: [AsciiRenderer; 4],
    layout: Layout,
    held: HashMap<Key, Instant>,
    command: CommandLine,
    target_fps: u32,
    running: bool,
    last_frame: Instant,
    last_fps_sample: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(mut config: VisualizerConfig, target_fps: u32) -> anyhow::Result<Self> {
        let (columns, rows) = terminal::size()?;
        let layout = Layout::new(columns, rows);
        config.viewport = layout.viewport();
        config.player_controls = PLAYER_CONTROLS.to_string();

        let clip = SharedClipPlanes::default();
        let visualizer = Visualizer::new(&config, clip.clone())?;
        let (width, height) = layout.target_size(visualizer.state().mode());
        let targets = std::array::from_fn(|_| AsciiRenderer::new(width, height, config.viewport, clip.clone()));

        Ok(Self {
            visualizer,
            targets,
            layout,
            held: HashMap::new(),
            command: CommandLine::default(),
            target_fps: target_fps.max(1),
            running: true,
            last_frame: Instant::now(),
            last_fps_sample: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    /// Switch the display mode outside of the key handling, e.g. at startup
    pub fn set_mode(&mut self, mode: DisplayMode) -> anyhow::Result<()> {
        let before = self.visualizer.state().mode();
        self.visualizer.execute(Command::Mode(mode))?;
        self.sync_targets(before);
        Ok(())
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;
        self.visualizer.deinit();

        result
    }

    fn main_loop(&mut self) -> anyhow::Result<()> {
        let target_frame_time = Duration::from_secs_f32(1.0 / self.target_fps as f32);

        while self.running {
            let frame_start = Instant::now();
            let dt = (frame_start - self.last_frame).as_secs_f32();
            self.last_frame = frame_start;

            let mut input = InputState::new();
            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?, &mut input)?;
            }
            if !self.running {
                break;
            }
            self.apply_held(&mut input, frame_start);

            let before = self.visualizer.state().mode();
            self.visualizer.handle_input(&input);
            self.sync_targets(before);

            self.visualizer.frame(dt, self.fps, &input, &mut self.targets);
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_fps_sample).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_fps_sample).as_secs_f32();
                self.frame_count = 0;
                self.last_fps_sample = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event, input: &mut InputState) -> io::Result<()> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(key, input),
            Event::Resize(columns, rows) => self.resize(columns, rows),
            _ => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent, input: &mut InputState) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.running = false;
            return;
        }

        if self.command.active {
            self.edit_command(key.code);
            return;
        }

        match key.code {
            KeyCode::Esc => self.running = false,
            KeyCode::Char(':') => {
                self.command.active = true;
                self.command.buffer.clear();
            }
            code => {
                let modifiers = Modifiers {
                    alt: key.modifiers.contains(KeyModifiers::ALT),
                    ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
                };
                if let Some(mapped) = map_key(code) {
                    input.press(mapped, modifiers);
                    self.held.insert(mapped, Instant::now());
                }
            }
        }
    }

    fn edit_command(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.command.active = false;
                self.command.buffer.clear();
            }
            KeyCode::Backspace => {
                self.command.buffer.pop();
            }
            KeyCode::Enter => {
                self.command.active = false;
                let line = std::mem::take(&mut self.command.buffer);
                self.run_command(&line);
            }
            KeyCode::Char(c) => self.command.buffer.push(c),
            _ => {}
        }
    }

    fn run_command(&mut self, line: &str) {
        let before = self.visualizer.state().mode();
        let result = parse_command(line).and_then(|command| self.visualizer.execute(command));
        self.command.message = Some(match result {
            Ok(()) => (format!(":{line}"), false),
            Err(err) => {
                warn!(%err, line, "panel command failed");
                (err.to_string(), true)
            }
        });
        self.sync_targets(before);
    }

    /// Keys seen recently stay held; the rest are released
    fn apply_held(&mut self, input: &mut InputState, now: Instant) {
        self.held.retain(|_, seen| now.duration_since(*seen) < HOLD_WINDOW);
        for key in self.held.keys() {
            input.hold(*key);
        }
    }

    fn resize(&mut self, columns: u16, rows: u16) {
        self.layout = Layout::new(columns, rows);
        let viewport = self.layout.viewport();
        info!(columns, rows, ?viewport, "terminal resized");
        self.visualizer.set_viewport(viewport);
        let mode = self.visualizer.state().mode();
        self.resize_targets(mode);
    }

    /// Stage targets are sized to a quadrant or to the whole area
    fn sync_targets(&mut self, before: DisplayMode) {
        let mode = self.visualizer.state().mode();
        if mode != before {
            debug!(?mode, "resizing stage targets for display mode");
            self.resize_targets(mode);
        }
    }

    fn resize_targets(&mut self, mode: DisplayMode) {
        let (width, height) = self.layout.target_size(mode);
        let viewport = self.layout.viewport();
        for target in self.targets.iter_mut() {
            target.resize(width, height);
            target.set_viewport(viewport);
        }
    }

    fn render(&mut self) -> io::Result<()> {
        let mut stdout = stdout();
        let state = self.visualizer.state();
        let mode = state.mode();

        for stage in mode.visible_stages() {
            let (column, row) = self.layout.target_origin(mode, stage);
            self.targets[stage.index()].draw(&mut stdout, column, row)?;
        }
        if mode == DisplayMode::All {
            self.draw_crosshair(&mut stdout)?;
        }
        self.draw_mode_hint(&mut stdout, state)?;
        self.draw_panel(&mut stdout, state)?;

        stdout.flush()
    }

    fn draw_crosshair<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let layout = self.layout;
        let middle_column = layout.panel_width + layout.area_width / 2;
        let middle_row = layout.height / 2;
        queue!(out, SetForegroundColor(TermColor::DarkGrey), SetBackgroundColor(TermColor::Black))?;
        for row in 0..layout.height {
            queue!(out, cursor::MoveTo(middle_column, row), Print('│'))?;
        }
        let line: String = "─".repeat(layout.area_width as usize);
        queue!(out, cursor::MoveTo(layout.panel_width, middle_row), Print(line))?;
        queue!(out, cursor::MoveTo(middle_column, middle_row), Print('┼'), ResetColor)?;
        Ok(())
    }

    /// Centered label of the current mode, fading out after a switch
    fn draw_mode_hint<W: Write>(&self, out: &mut W, state: &VisualizationState) -> io::Result<()> {
        let Some((label, alpha)) = state.mode_hint() else {
            return Ok(());
        };
        let color = Color::BLACK.with_alpha(alpha).over(Color::WHITE);
        let column = self.layout.panel_width + (self.layout.area_width / 2).saturating_sub(label.len() as u16 / 2);
        queue!(
            out,
            cursor::MoveTo(column, self.layout.height / 2),
            SetBackgroundColor(TermColor::White),
            SetForegroundColor(to_term(color)),
            Print(label),
            ResetColor
        )
    }

    fn draw_panel<W: Write>(&self, out: &mut W, state: &VisualizationState) -> io::Result<()> {
        let width = self.layout.panel_width as usize;
        if width == 0 {
            return Ok(());
        }

        let mut lines = panel_lines(state);
        lines.push(String::new());
        if self.command.active {
            lines.push(format!(":{}_", self.command.buffer));
        } else if let Some((message, _)) = &self.command.message {
            lines.push(message.clone());
        }

        queue!(out, SetBackgroundColor(TermColor::Black))?;
        for row in 0..self.layout.height {
            let text = lines.get(row as usize).map(String::as_str).unwrap_or("");
            let is_error = row as usize == lines.len() - 1 && matches!(self.command.message, Some((_, true)));
            let color = if is_error && !self.command.active {
                TermColor::Red
            } else {
                TermColor::Grey
            };
            let cell: String = text.chars().chain(std::iter::repeat(' ')).take(width - 1).collect();
            queue!(
                out,
                cursor::MoveTo(0, row),
                SetForegroundColor(color),
                Print(cell),
                SetForegroundColor(TermColor::DarkGrey),
                Print('│')
            )?;
        }
        queue!(out, ResetColor)?;
        Ok(())
    }
}

/// The panel text, top to bottom
pub fn panel_lines(state: &VisualizationState) -> Vec<String> {
    let readout = state.readout();
    let mut lines = vec![
        "MVP Visualizer".to_string(),
        String::new(),
        format!("Mode  {}", state.mode().label()),
        String::new(),
        "Camera".to_string(),
        format!(" eye  {}", readout.eye),
        format!(" at   {}", readout.at),
        format!(" up   {}", readout.up),
        format!(" fov  {}", readout.fov),
        format!(" near {}  far {}", readout.near, readout.far),
        String::new(),
        "Player".to_string(),
        format!(" pos  {}", readout.player),
    ];
    for (title, rows) in [
        ("Model", &readout.model),
        ("View", &readout.view),
        ("Projection", &readout.projection),
    ] {
        lines.push(String::new());
        lines.push(title.to_string());
        lines.extend(rows.iter().map(|row| format!(" {row}")));
    }
    lines.extend(
        [
            "",
            "Alt+0..4  display mode",
            "M  markers   L  lock",
            ":  command   Esc quit",
        ]
        .map(String::from),
    );
    lines
}

/// Terminal key to visualizer key
pub fn map_key(code: KeyCode) -> Option<Key> {
    let key = match code {
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Char(' ') => Key::Space,
        // No terminal reports a lone Shift press
        KeyCode::Char('c') | KeyCode::Char('C') => Key::Shift,
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'w' => Key::W,
            'a' => Key::A,
            's' => Key::S,
            'd' => Key::D,
            'q' => Key::Q,
            'e' => Key::E,
            'l' => Key::Lock,
            'm' => Key::Markers,
            digit @ '0'..='9' => Key::Digit(digit as u8 - b'0'),
            _ => return None,
        },
        _ => return None,
    };
    Some(key)
}

fn to_term(color: Color) -> TermColor {
    TermColor::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}
