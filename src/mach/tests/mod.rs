use crate::mach::{compile, Bindings, Config, Headless, RunState, Runtime};


fn runtime(src: &str, quantum: usize) -> Runtime {
    let config = Config {
        quantum,
        ..Config::default()
    };
    Runtime::new(compile(src).unwrap(), &config).unwrap()
}

fn run(src: &str) -> String {
    run_cycles(src, 5000)
}

/// Run one quantum at a time until the program halts. Fails the test
/// when the program is still running after `limit` quanta.
fn run_cycles(src: &str, quantum: usize) -> String {
    let mut runtime = runtime(src, quantum);
    let mut headless = Headless::new();
    let limit = 1000;
    for _ in 0..limit {
        if drive(&mut runtime, &mut headless) {
            let mut s = headless.transcript();
            if let Some(error) = runtime.error() {
                s.push_str(&format!("{}\n", error));
            }
            return s;
        }
    }
    panic!("{} quanta of {} operations exceeded", limit, quantum);
}

fn drive(runtime: &mut Runtime, bindings: &mut dyn Bindings) -> bool {
    match runtime.execute(bindings) {
        RunState::Halted => true,
        RunState::Running | RunState::Suspended(_) => false,
    }
}
