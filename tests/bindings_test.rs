mod common;
use basic::mach::{Headless, Mouse};
use common::*;

fn calls(src: &str) -> (String, Vec<String>) {
    let mut headless = Headless::new();
    let out = run(src, &mut headless);
    (out, headless.calls)
}

#[test]
fn test_screen_and_drawing() {
    let src = r#"
SCREEN 13
PSET (1, 2), 4
LINE (0, 0)-(10, 20), 15, BF
CIRCLE (160, 100), 50, 2
"#;
    let (out, calls) = calls(src);
    assert_eq!(out, "");
    assert_eq!(
        calls,
        vec![
            "SCREEN 13",
            "PSET (1.0, 2.0) Some(4)",
            "LINE (0.0, 0.0) (10.0, 20.0) Some(15) FilledBox",
            "CIRCLE (160.0, 100.0) 50 Some(2) false",
        ]
    );
}

#[test]
fn test_optional_arguments() {
    let src = r#"
COLOR 14
COLOR , 1
LOCATE 5
CLS
LINE (1, 1)-(2, 2)
"#;
    let (_, calls) = calls(src);
    assert_eq!(
        calls,
        vec![
            "COLOR Some(14) None",
            "COLOR None Some(1)",
            "LOCATE Some(5) None",
            "CLS None",
            "LINE (1.0, 1.0) (2.0, 2.0) None Line",
        ]
    );
}

#[test]
fn test_bad_screen_mode() {
    assert_eq!(exec("SCREEN 5\n"), "ILLEGAL FUNCTION CALL at line 1\n");
}

#[test]
fn test_getmouse() {
    let src = r#"
GETMOUSE x, y, , b
PRINT x; y; b
"#;
    let mut headless = Headless::new();
    headless.mouse = Mouse {
        x: 12.0,
        y: 34.0,
        wheel: 0.0,
        buttons: 1,
        clip: 0,
    };
    assert_eq!(run(src, &mut headless), "12341\n");
}

#[test]
fn test_beep_writes_bell() {
    assert_eq!(exec("BEEP\nPRINT \"x\"\n"), "\u{7}x\n");
}

#[test]
fn test_timer_is_seconds_since_midnight() {
    assert_eq!(exec("t = TIMER\nPRINT t >= 0 AND t < 86400\n"), "-1\n");
}
