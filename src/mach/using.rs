use super::Val;
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    Field(String),
}

fn is_field_char(ch: char) -> bool {
    matches!(ch, '#' | ',' | '.' | '+' | '-')
}

/// ## PRINT USING format state
///
/// The format is split into literal text and numeric fields. Each value
/// consumes the next field, wrapping to the start of the format when the
/// fields run out.

#[derive(Debug, Clone)]
pub struct Using {
    segments: Vec<Segment>,
    cursor: usize,
}

impl Using {
    pub fn new(format: &str) -> Using {
        let mut segments = vec![];
        let mut text = String::new();
        let chars: Vec<char> = format.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            if is_field_char(chars[i]) {
                let mut end = i;
                while end < chars.len() && is_field_char(chars[end]) {
                    end += 1;
                }
                let run: String = chars[i..end].iter().collect();
                if run.contains('#') {
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(Segment::Field(run));
                } else {
                    text.push_str(&run);
                }
                i = end;
            } else {
                text.push(chars[i]);
                i += 1;
            }
        }
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }
        Using {
            segments,
            cursor: 0,
        }
    }

    fn has_fields(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Field(_)))
    }

    /// Text up to and including the value formatted by the next field.
    pub fn next_value(&mut self, val: &Val) -> Result<String> {
        let mut out = String::new();
        if !self.has_fields() {
            out.push_str(&self.finish());
            self.cursor = 0;
            out.push_str(&val.to_string());
            return Ok(out);
        }
        loop {
            if self.cursor >= self.segments.len() {
                self.cursor = 0;
            }
            let segment = &self.segments[self.cursor];
            self.cursor += 1;
            match segment {
                Segment::Text(s) => out.push_str(s),
                Segment::Field(field) => {
                    match val {
                        Val::String(s) => out.push_str(s),
                        _ => out.push_str(&format_field(field, val.to_f64()?)),
                    }
                    return Ok(out);
                }
            }
        }
    }

    /// Literal text remaining before the next field or the end.
    pub fn finish(&mut self) -> String {
        let mut out = String::new();
        while let Some(Segment::Text(s)) = self.segments.get(self.cursor) {
            out.push_str(s);
            self.cursor += 1;
        }
        out
    }
}

/// Format a number through one field. Digits that do not fit turn the
/// field into asterisks.
pub fn format_field(field: &str, value: f64) -> String {
    let chars: Vec<char> = field.chars().collect();
    let point = chars
        .iter()
        .position(|c| *c == '.')
        .unwrap_or_else(|| chars.len());
    let before = chars[..point].iter().filter(|c| **c == '#').count() as i32;
    let after = chars[point..].iter().filter(|c| **c == '#').count() as i32;
    let negative = value < 0.0;
    let mut v = (value.abs() * 10f64.powi(after)).round();
    let fail = !v.is_finite() || (v / 10f64.powi(after)).floor() >= 10f64.powi(before);
    let has_sign = chars.iter().any(|c| *c == '+' || *c == '-');

    let mut out: Vec<char> = Vec::with_capacity(chars.len());
    let mut done = false;
    let mut units = true;
    for (i, ch) in chars.iter().enumerate().rev() {
        let c = match ch {
            '#' if fail => '*',
            '#' if i > point => next_digit(&mut v),
            '#' if units => {
                units = false;
                let d = next_digit(&mut v);
                done = v == 0.0;
                d
            }
            '#' if done => ' ',
            '#' => {
                let d = next_digit(&mut v);
                done = v == 0.0;
                d
            }
            ',' if fail => '*',
            ',' if done => ' ',
            '+' => {
                if negative {
                    '-'
                } else {
                    '+'
                }
            }
            '-' if negative => '-',
            '-' => continue,
            c => *c,
        };
        out.push(c);
    }
    out.reverse();
    let mut s: String = out.into_iter().collect();
    if negative && !has_sign && !fail {
        match s.rfind(|c: char| c == ' ') {
            Some(pos) if s[..pos].trim().is_empty() => s.replace_range(pos..=pos, "-"),
            _ => s.insert(0, '-'),
        }
    }
    s
}

fn next_digit(v: &mut f64) -> char {
    let d = (*v % 10.0).floor() as u32;
    *v = (*v / 10.0).floor();
    std::char::from_digit(d.min(9), 10).unwrap_or('0')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn using(format: &str, values: &[f64]) -> String {
        let mut u = Using::new(format);
        let mut s = String::new();
        for v in values {
            s.push_str(&u.next_value(&Val::Double(*v)).unwrap());
        }
        s.push_str(&u.finish());
        s
    }

    #[test]
    fn test_fields() {
        assert_eq!(using("abc #.#### def", &[1.23]), "abc 1.2300 def");
        assert_eq!(using("abc ##,###.#### def", &[8989.23]), "abc  8,989.2300 def");
        assert_eq!(using("abc ##,###.#### def", &[989.23]), "abc    989.2300 def");
        assert_eq!(using("abc ##### def", &[8989.23]), "abc  8989 def");
        assert_eq!(using("abc ##,### def", &[123456.0]), "abc ****** def");
        assert_eq!(using("#,### ", &[1456.0]), "1,456 ");
    }

    #[test]
    fn test_consecutive_clauses() {
        assert_eq!(
            using("abc ##,### def ##,### ghi", &[123456.0, 23456.0]),
            "abc ****** def 23,456 ghi"
        );
        assert_eq!(using("[##]", &[1.0, 2.0]), "[ 1][ 2]");
    }

    #[test]
    fn test_small_and_negative() {
        assert_eq!(format_field("##.##", 0.5), " 0.50");
        assert_eq!(format_field("###", 0.0), "  0");
        assert_eq!(format_field("###", -12.0), "-12");
        assert_eq!(format_field("+##", -5.0), "- 5");
    }

    #[test]
    fn test_minus_placeholder() {
        assert_eq!(format_field("##-", -5.0), " 5-");
        assert_eq!(format_field("##-", 5.0), " 5");
        assert_eq!(format_field("-##", 42.0), "42");
    }
}
