mod common;
use common::*;

#[test]
fn test_on_error_goto() {
    let src = r#"
ON ERROR GOTO a
ERROR 123
PRINT "BAD"
END
a:
  PRINT "PASS"
  END
"#;
    assert_eq!(exec(src), "PASS\n");
}

#[test]
fn test_on_error_resume_next() {
    let src = r#"
ON ERROR RESUME NEXT
ERROR 123
print "PASS"
END
"#;
    assert_eq!(exec(src), "PASS\n");
}

#[test]
fn test_resume_next() {
    let src = r#"
ON ERROR GOTO a
ERROR 123
PRINT "PASS2"
END
a:
  PRINT "PASS1"
  RESUME NEXT
"#;
    assert_eq!(exec(src), lines(&["PASS1", "PASS2"]));
}

#[test]
fn test_resume_label() {
    let src = r#"
ON ERROR GOTO a
ERROR 123
PRINT "PASS2"
END
a:
  PRINT "PASS1"
  RESUME b
  PRINT "BAD"
  END
b:
  PRINT "DONE"
  END
"#;
    assert_eq!(exec(src), lines(&["PASS1", "DONE"]));
}

#[test]
fn test_plain_resume_continues_after_statement() {
    let src = r#"
ON ERROR GOTO a
ERROR 123
PRINT "PASS2"
END
a:
  PRINT "PASS1"
  RESUME
"#;
    assert_eq!(exec(src), lines(&["PASS1", "PASS2"]));
}

#[test]
fn test_resume_zero_retries() {
    let src = r#"
ON ERROR GOTO fix
d = 0
PRINT 10 / d
END
fix:
  d = 2
  RESUME 0
"#;
    assert_eq!(exec(src), "5\n");
}

#[test]
fn test_err_and_erl() {
    let src = r#"
ON ERROR GOTO handler
x = 1
ERROR 42
END
handler:
  PRINT ERR; ERL
  RESUME NEXT
"#;
    assert_eq!(exec(src), "423\n");
}

#[test]
fn test_runtime_error_inside_handler_is_fatal() {
    let src = r#"
ON ERROR GOTO handler
ERROR 5
END
handler:
  ERROR 6
"#;
    assert_eq!(exec(src), "OVERFLOW at line 5\n");
}

#[test]
fn test_unhandled_error() {
    assert_eq!(exec("PRINT 1\nERROR 4\nPRINT 2\n"), lines(&["1", "OUT OF DATA at line 2"]));
    assert_eq!(exec("ERROR 200\n"), "UNPRINTABLE ERROR at line 1\n");
    assert_eq!(exec("ERROR 0\n"), "ILLEGAL FUNCTION CALL at line 1\n");
}

#[test]
fn test_on_error_goto_zero_disables() {
    let src = r#"
ON ERROR GOTO a
ON ERROR GOTO 0
ERROR 11
END
a:
  PRINT "BAD"
"#;
    assert_eq!(exec(src), "DIVISION BY ZERO at line 3\n");
}

#[test]
fn test_resume_without_error() {
    assert_eq!(exec("RESUME NEXT\n"), "RESUME WITHOUT ERROR at line 1\n");
}

#[test]
fn test_error_inside_routine_unwinds() {
    let src = r#"
SUB Fail(n)
  ERROR n
  PRINT "after"
END SUB
ON ERROR GOTO handler
Fail 7
PRINT "next"; STACKDEPTH()
END
handler:
  PRINT "caught"; ERR
  RESUME NEXT
"#;
    assert_eq!(exec(src), lines(&["caught7", "after", "next0"]));
}

#[test]
fn test_handler_with_pending_operands() {
    let src = r#"
ON ERROR GOTO handler
PRINT 1 + 2 * (3 / 0)
PRINT "ok"
END
handler:
  RESUME NEXT
"#;
    assert_eq!(exec(src), "ok\n");
}

#[test]
fn test_resume_next_skips_single_line_else() {
    let src = r#"
ON ERROR GOTO h
IF 1 THEN ERROR 5 ELSE PRINT "else"
PRINT "after"
END
h:
  RESUME NEXT
"#;
    assert_eq!(exec(src), "after\n");
}

#[test]
fn test_huge_operands_are_trappable() {
    let src = r#"
ON ERROR GOTO h
SLEEP 1e300
x = -1e300 MOD -1
s$ = SPACE$(1e19)
t$ = STRING$(40000, "x")
PRINT "done"; LEN(s$); LEN(t$)
END
h:
  PRINT ERR;
  RESUME NEXT
"#;
    assert_eq!(exec(src), "6655done00\n");
}

#[test]
fn test_huge_sleep_is_overflow() {
    assert_eq!(exec("SLEEP 1e300\n"), "OVERFLOW at line 1\n");
}
