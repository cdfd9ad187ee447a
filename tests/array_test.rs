mod common;
use common::*;

#[test]
fn test_2d_does_not_clobber_globals() {
    let src = r#"
x = 123
DIM a(17,11) AS SINGLE
addr = VARPTR(a)
y = 456
z = 789
w = 100
FOR i = 0 to 17
  FOR j = 0 to 11
    a(i, j) = i + j * 1000
  NEXT j
NEXT i
FOR i = 0 to 17
  FOR j = 0 to 11
    IF a(i, j) <> i + j * 1000 THEN
      PRINT "FAIL", i, j, a(i, j)
      END
    END IF
  NEXT j
NEXT i
PRINT VARPTR(a) - addr
PRINT x
PRINT y
PRINT z
PRINT w
PRINT "ok"
"#;
    assert_eq!(exec(src), lines(&["0", "123", "456", "789", "100", "ok"]));
}

#[test]
fn test_1d_initializer() {
    let src = r#"
DIM a(10) = {10,9,8,7,6,5,4,3,2,1,0}
FOR i = 0 to 10
  IF a(i) <> 10 - i THEN
    PRINT "FAIL","FAIL", i, a(i)
    END
  END IF
NEXT i
PRINT "ok"
"#;
    assert_eq!(exec(src), "ok\n");
}

#[test]
fn test_string_array() {
    let src = r#"
DIM a$(10)
FOR i = 0 to 10
  a$(i) = str$(i+1)
NEXT i
FOR i = 0 to 10
  IF val(a$(i)) <> i + 1 THEN
    PRINT "FAIL", i
  END IF
NEXT i
PRINT "ok"
"#;
    assert_eq!(exec(src), "ok\n");
}

#[test]
fn test_explicit_bounds() {
    let src = r#"
DIM a(-2 TO 2, 1 TO 3) AS INTEGER
a(-2, 1) = 5
a(2, 3) = 7
PRINT a(-2, 1); a(2, 3)
PRINT LBOUND(a); UBOUND(a); LBOUND(a, 2); UBOUND(a, 2)
"#;
    assert_eq!(exec(src), lines(&["57", "-2213"]));
}

#[test]
fn test_subscript_out_of_range() {
    let src = r#"
DIM a(5)
a(6) = 1
"#;
    assert_eq!(exec(src), "SUBSCRIPT OUT OF RANGE at line 2\n");
}

#[test]
fn test_bad_dimension_for_bound() {
    assert_eq!(
        exec("DIM a(5)\nPRINT UBOUND(a, 2)\n"),
        "SUBSCRIPT OUT OF RANGE at line 2\n"
    );
}

#[test]
fn test_wrong_number_of_subscripts() {
    assert_eq!(
        exec("DIM a(5, 5)\na(1) = 2\n"),
        "Wrong number of subscripts for a at line 2\n"
    );
}

#[test]
fn test_automatic_array() {
    let src = r#"
b(10) = 3
PRINT b(10); b(0); UBOUND(b)
b(11) = 1
"#;
    assert_eq!(exec(src), lines(&["3010", "SUBSCRIPT OUT OF RANGE at line 3"]));
}

#[test]
fn test_option_base() {
    let src = r#"
OPTION BASE 1
c(1) = 9
PRINT LBOUND(c); c(1)
c(0) = 1
"#;
    assert_eq!(exec(src), lines(&["19", "SUBSCRIPT OUT OF RANGE at line 4"]));
}

#[test]
fn test_redim_is_skipped() {
    let src = r#"
FOR k = 1 TO 2
  DIM a(3)
  a(k) = a(k - 1) + k
NEXT k
PRINT a(2)
"#;
    assert_eq!(exec(src), "3\n");
}

#[test]
fn test_local_array_in_routine() {
    let src = r#"
FUNCTION Sum(n)
  DIM t(n)
  FOR i = 0 TO n
    t(i) = i
    s = s + t(i)
  NEXT i
  Sum = s
END FUNCTION
PRINT Sum(4); Sum(10)
"#;
    assert_eq!(exec(src), "1055\n");
}

#[test]
fn test_out_of_memory() {
    assert_eq!(
        exec("DIM big(10000000) AS DOUBLE\n"),
        "OUT OF MEMORY at line 1\n"
    );
}

#[test]
fn test_too_many_dimensions() {
    assert_eq!(
        exec("DIM a(1,1,1,1,1,1,1,1,1)\n"),
        "Too many array dimensions at line 1\n"
    );
}

#[test]
fn test_swap_elements() {
    let src = r#"
DIM a(2)
a(0) = 1
a(2) = 3
SWAP a(0), a(2)
PRINT a(0); a(2)
"#;
    assert_eq!(exec(src), "31\n");
}
