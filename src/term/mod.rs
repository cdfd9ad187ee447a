/*!
## Terminal Module

Runs a compiled program on the terminal. Output is written a line at a
time through `linefeed`, which also reads INPUT lines using the pending
partial line as the prompt.

*/

use crate::lang::Error;
use crate::mach::{Bindings, Config, LineFill, Program, RunState, Runtime, ScreenMode};
use ansi_term::{Colour, Style};
use linefeed::{DefaultTerminal, Interface, ReadResult};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Operations per quantum while a graphics screen is active.
const GRAPHICS_PACE: usize = 1000;

pub struct Console {
    interface: Interface<DefaultTerminal>,
    current: String,
    value: String,
    style: Style,
    graphics: bool,
    stopped: bool,
    io_error: Option<io::Error>,
}

impl Console {
    pub fn new() -> io::Result<Console> {
        let interface = Interface::new("BASIC")?;
        Ok(Console {
            interface,
            current: String::new(),
            value: String::new(),
            style: Style::new(),
            graphics: false,
            stopped: false,
            io_error: None,
        })
    }

    fn write(&mut self, s: &str) {
        if self.io_error.is_some() {
            return;
        }
        if let Err(error) = self.interface.write_fmt(format_args!("{}", s)) {
            self.io_error = Some(error);
        }
    }

    fn flush_line(&mut self) {
        let line = std::mem::take(&mut self.current);
        let painted = format!("{}\n", self.style.paint(line));
        self.write(&painted);
    }

    /// Print an error in bold.
    pub fn report(&mut self, error: &Error) {
        if !self.current.is_empty() {
            self.flush_line();
        }
        let text = format!("{}\n", Style::new().bold().paint(error.to_string()));
        self.write(&text);
    }
}

fn colour(n: i32) -> Colour {
    Colour::Fixed((n & 0xff) as u8)
}

impl Bindings for Console {
    fn put_ch(&mut self, ch: Option<char>) {
        match ch {
            Some(ch) => self.current.push(ch),
            None => self.flush_line(),
        }
    }

    fn halt(&mut self) {
        if !self.current.is_empty() {
            self.flush_line();
        }
    }

    fn locate(&mut self, row: Option<i32>, col: Option<i32>) {
        let seq = format!("\x1b[{};{}H", row.unwrap_or(1), col.unwrap_or(1));
        self.write(&seq);
    }

    fn color(&mut self, fg: Option<i32>, bg: Option<i32>) {
        if let Some(fg) = fg {
            self.style = self.style.fg(colour(fg));
        }
        if let Some(bg) = bg {
            self.style = self.style.on(colour(bg));
        }
    }

    fn cls(&mut self, _mode: Option<i32>) {
        self.current.clear();
        self.write("\x1b[2J\x1b[H");
    }

    fn screen(&mut self, mode: &ScreenMode) {
        self.graphics = !mode.is_text();
        log::debug!("screen {} {}x{}", mode.mode, mode.width, mode.height);
    }

    fn line(&mut self, from: (f64, f64), to: (f64, f64), _color: Option<i32>, fill: LineFill) {
        log::trace!("line {:?} {:?} {:?}", from, to, fill);
    }

    fn line_clear(&mut self) {
        self.value.clear();
    }

    fn line_input(&mut self) -> bool {
        let prompt = std::mem::take(&mut self.current);
        if let Err(error) = self.interface.set_prompt(&prompt) {
            self.io_error = Some(error);
            return true;
        }
        match self.interface.read_line() {
            Ok(ReadResult::Input(line)) => {
                if !line.is_empty() {
                    self.interface.add_history_unique(line.clone());
                }
                self.value = line;
            }
            Ok(ReadResult::Signal(_)) | Ok(ReadResult::Eof) => self.stopped = true,
            Err(error) => self.io_error = Some(error),
        }
        true
    }

    fn line_value(&mut self) -> String {
        self.value.clone()
    }

    fn pace(&self) -> Option<usize> {
        if self.graphics {
            Some(GRAPHICS_PACE)
        } else {
            None
        }
    }
}

/// Run a program until it ends or is interrupted. Fatal errors are
/// reported on the terminal.
pub fn run(program: Program, config: &Config) -> io::Result<()> {
    let interrupted = Arc::new(AtomicBool::new(false));
    let int_moved = interrupted.clone();
    ctrlc::set_handler(move || {
        int_moved.store(true, Ordering::SeqCst);
    })
    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    let mut console = Console::new()?;
    let mut runtime = match Runtime::new(program, config) {
        Ok(runtime) => runtime,
        Err(error) => {
            console.report(&error);
            return Ok(());
        }
    };
    loop {
        if interrupted.swap(false, Ordering::SeqCst) || console.stopped {
            log::info!("interrupted");
            runtime.stop();
            console.halt();
        }
        match runtime.execute(&mut console) {
            RunState::Running => {}
            RunState::Suspended(delay) => thread::sleep(delay),
            RunState::Halted => break,
        }
        if let Some(error) = console.io_error.take() {
            return Err(error);
        }
    }
    if let Some(error) = runtime.error() {
        console.report(error);
    }
    match console.io_error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
