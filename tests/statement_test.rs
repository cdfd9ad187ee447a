mod common;
use common::*;

#[test]
fn test_negate() {
    assert_eq!(exec("PRINT -123\n"), "-123\n");
}

#[test]
fn test_four_ops() {
    let src = r#"
PRINT -123+123
PRINT -123-123
PRINT 1+2*4
PRINT 1+2/4
"#;
    assert_eq!(exec(src), lines(&["0", "-246", "9", "1.5"]));
}

#[test]
fn test_power_precedence() {
    let src = r#"
PRINT 2^3
PRINT -2^4
PRINT 2^4*3
PRINT 3*2^4
"#;
    assert_eq!(exec(src), lines(&["8", "-16", "48", "48"]));
}

#[test]
fn test_question_mark_prints() {
    assert_eq!(exec("? \"hi\"; 2\n"), "hi2\n");
}

#[test]
fn test_print_separators() {
    let src = r#"
PRINT "a", "b"
PRINT "a";
PRINT "b"
PRINT
PRINT "c";
"#;
    assert_eq!(
        exec(src),
        lines(&["a             b", "ab", "", "c"])
    );
}

#[test]
fn test_if_single_then() {
    let src = r#"
x = 0
FOR i = 1 TO 5
  IF i = 4 THEN x = i
NEXT i
PRINT x
"#;
    assert_eq!(exec(src), "4\n");
}

#[test]
fn test_if_single_then_colon() {
    let src = r#"
x = 0
FOR i = 1 TO 5
  IF i = 4 THEN x = i : x = 9
NEXT i
PRINT x
"#;
    assert_eq!(exec(src), "9\n");
}

#[test]
fn test_if_then_end_if_on_one_line() {
    let src = r#"
x = 0
y = 0
FOR i = 1 to 5
  IF i = 4 THEN : x = i ELSE : y = i END IF
NEXT i
PRINT x
PRINT y
"#;
    assert_eq!(exec(src), lines(&["4", "5"]));
}

#[test]
fn test_if_elseif_blocks() {
    let src = r#"
x = 0
y = 0
z = 0
FOR i = 1 to 5
  IF i = 4 THEN
    x = i
  ELSEIF i = 2 THEN
    z = i
  ELSEIF i = 3 THEN
    z = i
  ELSE
    y = i
  END IF
NEXT i
PRINT x
PRINT y
PRINT z
"#;
    assert_eq!(exec(src), lines(&["4", "5", "3"]));
}

#[test]
fn test_if_keywords_any_case() {
    let src = r#"
pz = 0
IF pz < 1 Then
  pz = 1
ELSEIF PZ > 80000/3 Then
  pz = 80000/3
END IF
PRINT pz
"#;
    assert_eq!(exec(src), "1\n");
}

#[test]
fn test_if_line_numbers() {
    let src = r#"
10 FOR I=1 TO 5
20 IF I MOD 2 = 0 THEN 40 ELSE 30
30 PRINT "ODD"
31 GOTO 50
40 PRINT "EVEN"
50 NEXT I
"#;
    assert_eq!(exec(src), lines(&["ODD", "EVEN", "ODD", "EVEN", "ODD"]));
}

#[test]
fn test_labels() {
    let src = r#"
i = 1
Again:
  PRINT i
  i = i + 1
  IF i <> 5 THEN GOTO Again
PRINT "done"
"#;
    assert_eq!(exec(src), lines(&["1", "2", "3", "4", "done"]));
}

#[test]
fn test_line_number_loop() {
    let src = r#"
10 i = 1
20 PRINT i
30 i = i + 1
40 IF i <> 5 THEN GOTO 20
50 PRINT "done"
"#;
    assert_eq!(exec(src), lines(&["1", "2", "3", "4", "done"]));
}

#[test]
fn test_gosub_return() {
    let src = r#"
GOSUB greet
GOSUB greet
END
greet:
  PRINT "hi"
  RETURN
"#;
    assert_eq!(exec(src), lines(&["hi", "hi"]));
}

#[test]
fn test_return_without_gosub() {
    assert_eq!(exec("PRINT 1\nRETURN\n"), lines(&["1", "RETURN WITHOUT GOSUB at line 2"]));
}

#[test]
fn test_on_goto_in_order() {
    let src = r#"
x = 1
ON x GOTO a,b,c
END
a:
  PRINT "1"
  x = x + 1
  ON x GOTO a,b,c
  END
b:
  PRINT "2"
  ON x+1 GOTO a,b,c
  END
c:
  PRINT "3"
  PRINT "done"
  END
"#;
    assert_eq!(exec(src), lines(&["1", "2", "3", "done"]));
}

#[test]
fn test_on_goto_out_of_range() {
    let src = r#"
ON 5 GOTO a,b
PRINT "done"
END
a:
  END
b:
  END
"#;
    assert_eq!(exec(src), "done\n");
}

#[test]
fn test_on_gosub() {
    let src = r#"
FOR i%=1 TO 2
  ON i% GOSUB One, Two
NEXT i%
PRINT "done"
END
One:
  PRINT i%
  RETURN
Two:
  PRINT i%
  RETURN
"#;
    assert_eq!(exec(src), lines(&["1", "2", "done"]));
}

#[test]
fn test_on_gosub_line_numbers() {
    let src = r#"
10  FOR i=1 TO 2
20    ON i GOSUB 60,80
30  NEXT i
40  PRINT "done"
50  END
60  PRINT "1"
70  RETURN
80  PRINT "2"
90  RETURN
"#;
    assert_eq!(exec(src), lines(&["1", "2", "done"]));
}

#[test]
fn test_on_gosub_out_of_range() {
    let src = r#"
ON 0 GOSUB a,b
ON 5 GOSUB a,b
ON 3 GOSUB a,b,c
PRINT "done"
END
a:
  PRINT "a"
  RETURN
b:
  PRINT "b"
  RETURN
"#;
    assert_eq!(exec(src), "done\n");
}

#[test]
fn test_swap_and_compound_assignment() {
    let src = r#"
a = 1
b = 2
SWAP a, b
PRINT a; b
a += 10
b *= 3
a$ = "x"
a$ &= "y"
a$ += "z"
PRINT a; b; a$
"#;
    assert_eq!(exec(src), lines(&["21", "123xyz"]));
}

#[test]
fn test_let() {
    assert_eq!(exec("LET x = 5\nPRINT x\n"), "5\n");
}

#[test]
fn test_rem_and_comments() {
    let src = r#"
REM nothing here: PRINT "no"
PRINT "yes" ' trailing
"#;
    assert_eq!(exec(src), "yes\n");
}

#[test]
fn test_end_flushes_partial_line() {
    assert_eq!(exec("PRINT \"a\";\nEND\nPRINT \"b\"\n"), "a\n");
}

#[test]
fn test_stop() {
    assert_eq!(exec("PRINT 1\nSTOP\nPRINT 2\n"), "1\n");
}

#[test]
fn test_integer_division_and_mod() {
    let src = r#"
PRINT 7 \ 2
PRINT -7 \ 2
PRINT 7 MOD 3
PRINT 7.9 MOD 3
"#;
    assert_eq!(exec(src), lines(&["3", "-4", "1", "1"]));
}

#[test]
fn test_division_by_zero() {
    assert_eq!(exec("PRINT 1 / 0\n"), "DIVISION BY ZERO at line 1\n");
}

#[test]
fn test_logical_operators() {
    let src = r#"
PRINT 1 < 2
PRINT 1 > 2
PRINT NOT 0
PRINT 12 AND 10
PRINT 12 OR 3
PRINT 12 XOR 10
PRINT "a" < "b"
"#;
    assert_eq!(exec(src), lines(&["-1", "0", "-1", "8", "15", "6", "-1"]));
}

#[test]
fn test_string_concat() {
    assert_eq!(exec("a$ = \"ab\" + \"cd\"\nPRINT a$ + \"!\"\n"), "abcd!\n");
}
