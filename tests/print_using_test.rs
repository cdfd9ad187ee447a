mod common;
use common::*;

#[test]
fn test_simple_decimal() {
    assert_eq!(
        exec("PRINT USING \"abc #.#### def\"; 1.23\n"),
        "abc 1.2300 def\n"
    );
}

#[test]
fn test_comma_decimal() {
    assert_eq!(
        exec("PRINT USING \"abc ##,###.#### def\"; 8989.23\n"),
        "abc  8,989.2300 def\n"
    );
    assert_eq!(
        exec("PRINT USING \"abc ##,###.#### def\"; 989.23\n"),
        "abc    989.2300 def\n"
    );
}

#[test]
fn test_integer_fields() {
    let src = r#"
PRINT USING "abc ##### def"; 8989.23
PRINT USING "abc ##,### def"; 8989.23
PRINT USING "abc ##,### def"; 989.23
"#;
    assert_eq!(
        exec(src),
        lines(&["abc  8989 def", "abc  8,989 def", "abc    989 def"])
    );
}

#[test]
fn test_overflow() {
    assert_eq!(
        exec("PRINT USING \"abc ##,### def\"; 123456\n"),
        "abc ****** def\n"
    );
}

#[test]
fn test_multiple_fields() {
    let src = r#"
PRINT USING "abc ##,### def ##,### ghi"; 123456; 23456
PRINT USING "abc #,### def ##,### ghi"; 1456; 23456
"#;
    assert_eq!(
        exec(src),
        lines(&["abc ****** def 23,456 ghi", "abc 1,456 def 23,456 ghi"])
    );
}

#[test]
fn test_format_from_variable() {
    let src = r#"
f$ = "[##.#]"
PRINT USING f$; 3.14159
"#;
    assert_eq!(exec(src), "[ 3.1]\n");
}
