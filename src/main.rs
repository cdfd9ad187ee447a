//! # BASIC
//!
//! Compile and run a BASIC program in the terminal.
//!

use ansi_term::Style;
use basic::mach::{compile, Config};
use clap::{App, Arg, ArgMatches};
use log::{LevelFilter, Metadata, Record};
use std::io::Read;
use std::str::FromStr;

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}: {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn level(verbose: u64) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn number<T: FromStr>(args: &ArgMatches, name: &str, default: T) -> Result<T, String> {
    match args.value_of(name) {
        Some(s) => s
            .parse()
            .map_err(|_| format!("Invalid value for --{}: {}", name, s)),
        None => Ok(default),
    }
}

fn config(args: &ArgMatches) -> Result<Config, String> {
    let default = Config::default();
    Ok(Config {
        memory_size: number(args, "memory", default.memory_size)?,
        stack_size: number(args, "stack", default.stack_size)?,
        quantum: number(args, "quantum", default.quantum)?,
        ..default
    })
}

fn source(args: &ArgMatches) -> std::io::Result<String> {
    match args.value_of("file") {
        Some(path) if path != "-" => std::fs::read_to_string(path),
        _ => {
            let mut s = String::new();
            std::io::stdin().read_to_string(&mut s)?;
            Ok(s)
        }
    }
}

fn main() {
    let args = App::new("basic")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compile and run a BASIC program")
        .arg(
            Arg::new("file")
                .value_name("FILE")
                .help("Program source, standard input when absent"),
        )
        .arg(
            Arg::new("quantum")
                .long("quantum")
                .takes_value(true)
                .value_name("N")
                .help("Operations executed between host updates"),
        )
        .arg(
            Arg::new("memory")
                .long("memory")
                .takes_value(true)
                .value_name("BYTES")
                .help("Size of program memory"),
        )
        .arg(
            Arg::new("stack")
                .long("stack")
                .takes_value(true)
                .value_name("BYTES")
                .help("Size of the call stack"),
        )
        .arg(
            Arg::new("listing")
                .long("listing")
                .help("Print the compiled operations instead of running"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .multiple_occurrences(true)
                .help("Log to standard error, repeat for more detail"),
        )
        .get_matches();

    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level(args.occurrences_of("verbose")));
    }

    let config = match config(&args) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{}", message);
            std::process::exit(2);
        }
    };
    let src = match source(&args) {
        Ok(src) => src,
        Err(error) => {
            eprintln!("{}", error);
            std::process::exit(1);
        }
    };
    let program = match compile(&src) {
        Ok(program) => program,
        Err(error) => {
            eprintln!("{}", Style::new().bold().paint(error.to_string()));
            std::process::exit(1);
        }
    };
    if args.is_present("listing") {
        print!("{}", program);
        return;
    }
    if let Err(error) = basic::term::run(program, &config) {
        eprintln!("{}", error);
        std::process::exit(1);
    }
}
