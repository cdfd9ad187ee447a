mod common;
use common::*;

#[test]
fn test_invalid_type() {
    let src = r#"
DIM x AS SINGLE
PRINT x.y
"#;
    assert_eq!(exec(src), "Not a struct type at line 2\n");
}

#[test]
fn test_invalid_field() {
    let src = r#"
TYPE vector
  x AS SINGLE
  y AS SINGLE
END TYPE

DIM v AS vector
PRINT v.z
"#;
    assert_eq!(exec(src), "Invalid field name at line 7\n");
}

#[test]
fn test_simple() {
    let src = r#"
TYPE vector
  x AS SINGLE
  y AS SINGLE
END TYPE

DIM u AS vector
DIM v AS vector

u.x = 1
u.y = 2
v.x = 3
v.y = 4

PRINT u.x
PRINT u.y
PRINT v.x
PRINT v.y
"#;
    assert_eq!(exec(src), lines(&["1", "2", "3", "4"]));
}

#[test]
fn test_array_of_records() {
    let src = r#"
TYPE vector
  x AS SINGLE
  y AS SINGLE
END TYPE

DIM points(10) AS vector

FOR i = 1 to 10
  points(i).x = i
  points(i).y = i + 1
NEXT i

total = 0
FOR i = 1 to 10
  total = total + points(i).x
NEXT i

PRINT total
"#;
    assert_eq!(exec(src), "55\n");
}

#[test]
fn test_nested_records() {
    let src = r#"
TYPE point
  x AS INTEGER
  y AS INTEGER
END TYPE
TYPE box
  name AS STRING * 8
  corner AS point
END TYPE
DIM b AS box
b.name = "crate"
b.corner.x = 3
b.corner.y = b.corner.x * 2
PRINT b.name; b.corner.x; b.corner.y
"#;
    assert_eq!(exec(src), "crate36\n");
}

#[test]
fn test_type_defined_twice() {
    let src = r#"
TYPE t
  a AS INTEGER
END TYPE
TYPE t
  b AS INTEGER
END TYPE
"#;
    assert!(exec(src).starts_with("Type t defined twice"));
}
