use chrono::{Local, Timelike};
use std::collections::VecDeque;

/// Box mode of the LINE statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineFill {
    Line,
    Box,
    FilledBox,
}

/// Pointer state reported to GETMOUSE.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Mouse {
    pub x: f64,
    pub y: f64,
    pub wheel: f64,
    pub buttons: i32,
    pub clip: i32,
}

impl Mouse {
    pub fn field(&self, index: usize) -> f64 {
        match index {
            0 => self.x,
            1 => self.y,
            2 => self.wheel,
            3 => self.buttons as f64,
            _ => self.clip as f64,
        }
    }
}

/// Geometry of a SCREEN mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenMode {
    pub mode: i32,
    pub width: u32,
    pub height: u32,
    pub text_width: u32,
    pub text_height: u32,
}

impl ScreenMode {
    pub fn lookup(mode: i32) -> Option<ScreenMode> {
        let (width, height, text_width, text_height) = match mode {
            0 => (640, 400, 80, 25),
            1 => (320, 200, 40, 25),
            2 => (640, 200, 80, 25),
            7 => (320, 200, 40, 25),
            8 => (640, 200, 80, 25),
            9 => (640, 350, 80, 25),
            10 => (640, 350, 80, 25),
            11 => (640, 480, 80, 30),
            12 => (640, 480, 80, 30),
            13 => (320, 200, 40, 25),
            _ => return None,
        };
        Some(ScreenMode {
            mode,
            width,
            height,
            text_width,
            text_height,
        })
    }

    pub fn is_text(&self) -> bool {
        self.mode == 0
    }
}

/// ## Host interface
///
/// Everything the runtime shows or reads goes through these calls.
/// Drawing calls default to no-ops for hosts without a display.
/// Colors and optional arguments that were not given arrive as `None`.

pub trait Bindings {
    /// Append a character, or complete the current line with `None`.
    fn put_ch(&mut self, ch: Option<char>);

    /// The program ended.
    fn halt(&mut self) {}

    fn locate(&mut self, _row: Option<i32>, _col: Option<i32>) {}
    fn color(&mut self, _fg: Option<i32>, _bg: Option<i32>) {}
    fn cls(&mut self, _mode: Option<i32>) {}
    fn screen(&mut self, _mode: &ScreenMode) {}
    fn width(&mut self, _cols: i32) {}
    fn line(&mut self, _from: (f64, f64), _to: (f64, f64), _color: Option<i32>, _fill: LineFill) {}
    #[allow(clippy::too_many_arguments)]
    fn circle(
        &mut self,
        _center: (f64, f64),
        _radius: f64,
        _color: Option<i32>,
        _start: f64,
        _end: f64,
        _aspect: f64,
        _fill: bool,
    ) {
    }
    fn pset(&mut self, _at: (f64, f64), _color: Option<i32>) {}
    fn paint(&mut self, _at: (f64, f64), _color: Option<i32>, _border: Option<i32>) {}
    fn draw(&mut self, _commands: &str) {}

    /// Non-blocking key poll for INKEY$.
    fn inkey(&mut self) -> Option<String> {
        None
    }

    fn get_mouse(&mut self) -> Mouse {
        Mouse::default()
    }

    /// Start collecting a new input line.
    fn line_clear(&mut self) {}

    /// Poll for a completed input line.
    fn line_input(&mut self) -> bool;

    /// The completed input line.
    fn line_value(&mut self) -> String;

    /// Operations per quantum, overriding the configuration.
    fn pace(&self) -> Option<usize> {
        None
    }

    /// Seconds since midnight.
    fn timer(&self) -> f64 {
        let now = Local::now();
        now.num_seconds_from_midnight() as f64 + now.nanosecond() as f64 / 1e9
    }
}

/// Bindings without a display. Output is collected by line and input
/// comes from scripted lines and keys. With no scripted lines left an
/// INPUT receives an empty line.
#[derive(Debug, Default)]
pub struct Headless {
    pub lines: Vec<String>,
    current: String,
    input: VecDeque<String>,
    keys: VecDeque<String>,
    value: String,
    pub mouse: Mouse,
    pub halted: bool,
    pub calls: Vec<String>,
}

impl Headless {
    pub fn new() -> Headless {
        Headless::default()
    }

    pub fn with_input(lines: &[&str]) -> Headless {
        Headless {
            input: lines.iter().map(|s| s.to_string()).collect(),
            ..Headless::default()
        }
    }

    pub fn push_key(&mut self, key: &str) {
        self.keys.push_back(key.to_string());
    }

    /// Completed lines plus any unterminated output, newline separated.
    pub fn transcript(&self) -> String {
        let mut s = String::new();
        for line in &self.lines {
            s.push_str(line);
            s.push('\n');
        }
        s.push_str(&self.current);
        s
    }
}

impl Bindings for Headless {
    fn put_ch(&mut self, ch: Option<char>) {
        match ch {
            Some(ch) => self.current.push(ch),
            None => self.lines.push(std::mem::take(&mut self.current)),
        }
    }

    fn halt(&mut self) {
        self.halted = true;
    }

    fn locate(&mut self, row: Option<i32>, col: Option<i32>) {
        self.calls.push(format!("LOCATE {:?} {:?}", row, col));
    }

    fn color(&mut self, fg: Option<i32>, bg: Option<i32>) {
        self.calls.push(format!("COLOR {:?} {:?}", fg, bg));
    }

    fn cls(&mut self, mode: Option<i32>) {
        self.calls.push(format!("CLS {:?}", mode));
    }

    fn screen(&mut self, mode: &ScreenMode) {
        self.calls.push(format!("SCREEN {}", mode.mode));
    }

    fn line(&mut self, from: (f64, f64), to: (f64, f64), color: Option<i32>, fill: LineFill) {
        self.calls
            .push(format!("LINE {:?} {:?} {:?} {:?}", from, to, color, fill));
    }

    fn circle(
        &mut self,
        center: (f64, f64),
        radius: f64,
        color: Option<i32>,
        _start: f64,
        _end: f64,
        _aspect: f64,
        fill: bool,
    ) {
        self.calls.push(format!(
            "CIRCLE {:?} {} {:?} {}",
            center, radius, color, fill
        ));
    }

    fn pset(&mut self, at: (f64, f64), color: Option<i32>) {
        self.calls.push(format!("PSET {:?} {:?}", at, color));
    }

    fn inkey(&mut self) -> Option<String> {
        self.keys.pop_front()
    }

    fn get_mouse(&mut self) -> Mouse {
        self.mouse
    }

    fn line_clear(&mut self) {
        self.value.clear();
    }

    fn line_input(&mut self) -> bool {
        self.value = self.input.pop_front().unwrap_or_default();
        true
    }

    fn line_value(&mut self) -> String {
        let mut echo = std::mem::take(&mut self.current);
        echo.push_str(&self.value);
        self.lines.push(echo);
        self.value.clone()
    }
}
