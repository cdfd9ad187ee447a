mod common;
use common::*;

#[test]
fn test_simple() {
    let src = r#"
SUB MyPrint(x AS INTEGER, y AS DOUBLE)
  PRINT x; " oh "; y
END SUB
MyPrint 123, 12.5
CALL MyPrint(456, 2.5)
"#;
    assert_eq!(exec(src), lines(&["123 oh 12.5", "456 oh 2.5"]));
}

#[test]
fn test_predeclare() {
    let src = r#"
DECLARE SUB MyPrint(x AS INTEGER)
MyPrint 123
CALL MyPrint(456)
SUB MyPrint(x AS INTEGER)
  PRINT x
END SUB
"#;
    assert_eq!(exec(src), lines(&["123", "456"]));
}

#[test]
fn test_no_args_nested_with_local() {
    let src = r#"
DECLARE SUB DumpIt()
SUB DumpIt()
  x = 1
  PRINT "hello there"
END SUB
SUB DoIt2()
  PRINT "a"
  DumpIt
  PRINT "b"
  DumpIt
  PRINT "c"
END SUB
DoIt2
"#;
    assert_eq!(
        exec(src),
        lines(&["a", "hello there", "b", "hello there", "c"])
    );
}

#[test]
fn test_stack_depth() {
    let src = r#"
SUB Inner(a AS DOUBLE, b AS DOUBLE, c AS DOUBLE)
  PRINT STACKDEPTH()
END SUB
SUB Outer(x AS DOUBLE)
  PRINT STACKDEPTH()
  Inner 1, 2, 3
END SUB
PRINT STACKDEPTH()
Outer 1
PRINT STACKDEPTH()
"#;
    assert_eq!(exec(src), lines(&["0", "24", "64", "0"]));
}

#[test]
fn test_locals_are_cleared() {
    let src = r#"
SUB Count
  n = n + 1
  s$ = s$ + "x"
  PRINT n; s$
END SUB
Count
Count
"#;
    assert_eq!(exec(src), lines(&["1x", "1x"]));
}

#[test]
fn test_parameters_by_value() {
    let src = r#"
SUB Change(v)
  v = 99
END SUB
v = 1
Change v
PRINT v
"#;
    assert_eq!(exec(src), "1\n");
}

#[test]
fn test_shared_globals() {
    let src = r#"
DIM SHARED total
x = 5
SUB Add(n)
  total = total + n
  x = 100
END SUB
Add 2
Add 3
PRINT total; x
"#;
    assert_eq!(exec(src), "55\n");
}

#[test]
fn test_array_parameter() {
    let src = r#"
SUB Fill(a(), n)
  FOR i = LBOUND(a) TO UBOUND(a)
    a(i) = i * n
  NEXT i
END SUB
FUNCTION Total(a())
  t = 0
  FOR i = LBOUND(a) TO UBOUND(a)
    t = t + a(i)
  NEXT i
  Total = t
END FUNCTION
DIM v(1 TO 4)
Fill v(), 2
PRINT Total(v())
"#;
    assert_eq!(exec(src), "20\n");
}

#[test]
fn test_exit_sub_and_function() {
    let src = r#"
SUB Early(n)
  IF n > 1 THEN EXIT SUB
  PRINT "small"
END SUB
FUNCTION Sign$(n)
  Sign$ = "positive"
  IF n > 0 THEN EXIT FUNCTION
  Sign$ = "not positive"
END FUNCTION
Early 1
Early 2
PRINT Sign$(1)
PRINT Sign$(-1)
"#;
    assert_eq!(exec(src), lines(&["small", "positive", "not positive"]));
}

#[test]
fn test_gosub_inside_sub() {
    let src = r#"
SUB Work
  GOSUB helper
  PRINT "back"
  EXIT SUB
helper:
  PRINT "helping"
  RETURN
END SUB
Work
"#;
    assert_eq!(exec(src), lines(&["helping", "back"]));
}

#[test]
fn test_return_cannot_leave_sub() {
    let src = r#"
SUB Work
  RETURN
END SUB
GOSUB start
END
start:
  Work
  RETURN
"#;
    assert_eq!(exec(src), "RETURN WITHOUT GOSUB at line 2\n");
}

#[test]
fn test_deep_recursion_runs_out_of_stack() {
    let src = r#"
SUB Forever(n)
  Forever n + 1
END SUB
Forever 1
"#;
    assert_eq!(exec(src), "OUT OF STACK SPACE at line 2\n");
}

#[test]
fn test_undefined_sub() {
    assert_eq!(
        exec("CALL Missing(1)\n"),
        "Subprogram missing not defined at line 1\n"
    );
}

#[test]
fn test_declared_but_not_defined() {
    let src = r#"
DECLARE SUB Later()
Later
PRINT "unreached"
"#;
    assert_eq!(exec(src), "Subprogram later not defined at line 2\n");
}

#[test]
fn test_static_and_nested_definition() {
    let src = r#"
SUB Outer STATIC
  SUB Inner
  END SUB
END SUB
"#;
    assert_eq!(exec(src), "Nested SUB or FUNCTION at line 2\n");
}
