#![allow(dead_code)]
use basic::mach::{compile, Config, Headless, Runtime};

/// Compile and run a program. Sources may start with a newline for
/// readability; it is not part of the program. Compile and fatal runtime
/// errors follow the printed output.
pub fn exec(src: &str) -> String {
    exec_with_input(src, &[])
}

pub fn exec_with_input(src: &str, input: &[&str]) -> String {
    let mut headless = Headless::with_input(input);
    run(src, &mut headless)
}

pub fn run(src: &str, headless: &mut Headless) -> String {
    let src = src.strip_prefix('\n').unwrap_or(src);
    let program = match compile(src) {
        Ok(program) => program,
        Err(error) => return format!("{}\n", error),
    };
    let mut runtime = Runtime::new(program, &Config::default()).unwrap();
    let result = runtime.run(headless);
    let mut s = headless.transcript();
    if let Err(error) = result {
        s.push_str(&format!("{}\n", error));
    }
    s
}

/// Join lines with a trailing newline.
pub fn lines(lines: &[&str]) -> String {
    let mut s = lines.join("\n");
    s.push('\n');
    s
}
