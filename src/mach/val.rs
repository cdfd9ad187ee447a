use crate::error;
use crate::lang::Error;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// ## Runtime values
///
/// Byte, INTEGER and LONG slots all load as `Integer`.

#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    String(Rc<str>),
    Integer(i32),
    Single(f32),
    Double(f64),
}

impl Default for Val {
    fn default() -> Self {
        Val::Integer(0)
    }
}

impl From<bool> for Val {
    fn from(b: bool) -> Self {
        Val::Integer(if b { -1 } else { 0 })
    }
}

impl From<&str> for Val {
    fn from(s: &str) -> Self {
        Val::String(s.into())
    }
}

impl From<String> for Val {
    fn from(s: String) -> Self {
        Val::String(s.into())
    }
}

impl From<f64> for Val {
    /// Integral values that fit become `Integer`.
    fn from(f: f64) -> Self {
        if f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 {
            Val::Integer(f as i32)
        } else {
            Val::Double(f)
        }
    }
}

impl Val {
    /// Parse numeric literal text as produced by the lexer.
    pub fn from_literal(s: &str) -> Result<Val> {
        if let Some(hex) = s.strip_prefix("0x") {
            return match i64::from_str_radix(hex, 16) {
                Ok(n) if n <= i32::MAX as i64 => Ok(Val::Integer(n as i32)),
                Ok(n) => Ok(Val::Double(n as f64)),
                Err(_) => Err(error!(SyntaxError; "Bad hex number")),
            };
        }
        if !s.contains(|c| c == '.' || c == 'e') {
            if let Ok(n) = s.parse::<i32>() {
                return Ok(Val::Integer(n));
            }
        }
        match s.parse::<f64>() {
            Ok(f) => Ok(Val::Double(f)),
            Err(_) => Err(error!(SyntaxError; "Bad number \"{}\"", s)),
        }
    }

    /// The `VAL` conversion: longest numeric prefix, zero when there is none.
    pub fn parse(s: &str) -> Val {
        let s = s.trim_start();
        let lower = s.to_ascii_lowercase();
        if let Some(hex) = lower.strip_prefix("&h") {
            let end = hex
                .find(|c: char| !c.is_ascii_hexdigit())
                .unwrap_or_else(|| hex.len());
            return match i64::from_str_radix(&hex[..end], 16) {
                Ok(n) => Val::from(n as f64),
                Err(_) => Val::Integer(0),
            };
        }
        let bytes = lower.as_bytes();
        let mut end = 0;
        if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
            end += 1;
        }
        let digits_start = end;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end < bytes.len() && bytes[end] == b'.' {
            end += 1;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
        }
        if end == digits_start || &lower[digits_start..end] == "." {
            return Val::Integer(0);
        }
        if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'd') {
            let mut exp = end + 1;
            if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
                exp += 1;
            }
            if exp < bytes.len() && bytes[exp].is_ascii_digit() {
                while exp < bytes.len() && bytes[exp].is_ascii_digit() {
                    exp += 1;
                }
                let text = lower[..exp].replace('d', "e");
                return text.parse::<f64>().map(Val::from).unwrap_or_default();
            }
        }
        lower[..end]
            .parse::<f64>()
            .map(Val::from)
            .unwrap_or_default()
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Val::String(_))
    }

    pub fn to_f64(&self) -> Result<f64> {
        match self {
            Val::Integer(n) => Ok(*n as f64),
            Val::Single(n) => Ok(*n as f64),
            Val::Double(n) => Ok(*n),
            Val::String(_) => Err(error!(TypeMismatch)),
        }
    }

    /// Truncate toward zero and wrap into 32 bits.
    pub fn to_i32(&self) -> Result<i32> {
        match self {
            Val::Integer(n) => Ok(*n),
            _ => Ok(wrap_i32(self.to_f64()?)),
        }
    }

    pub fn to_index(&self) -> Result<i64> {
        let f = self.to_f64()?;
        if f.is_finite() {
            Ok(f.trunc() as i64)
        } else {
            Err(error!(Overflow))
        }
    }

    pub fn is_true(&self) -> Result<bool> {
        Ok(self.to_f64()? != 0.0)
    }

    pub fn to_rc_str(&self) -> Result<Rc<str>> {
        match self {
            Val::String(s) => Ok(s.clone()),
            _ => Err(error!(TypeMismatch)),
        }
    }

    /// The `STR$` text: non-negative numbers get a leading space.
    pub fn str(&self) -> Result<String> {
        if self.is_string() {
            return Err(error!(TypeMismatch));
        }
        let s = self.to_string();
        if s.starts_with('-') {
            Ok(s)
        } else {
            Ok(format!(" {}", s))
        }
    }
}

pub fn wrap_i32(f: f64) -> i32 {
    if !f.is_finite() {
        return 0;
    }
    (f.trunc() as i64 as u64 & 0xffff_ffff) as u32 as i32
}

fn format_float(f: f64, shortest: String, exponent: String) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if f == 0.0 {
        return "0".to_string();
    }
    let abs = f.abs();
    if abs >= 1e21 || abs < 1e-6 {
        match exponent.find('e') {
            Some(e) if !exponent[e + 1..].starts_with('-') => {
                format!("{}e+{}", &exponent[..e], &exponent[e + 1..])
            }
            _ => exponent,
        }
    } else {
        shortest
    }
}

impl std::fmt::Display for Val {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Val::String(s) => write!(f, "{}", s),
            Val::Integer(n) => write!(f, "{}", n),
            Val::Single(n) => write!(
                f,
                "{}",
                format_float(*n as f64, format!("{}", n), format!("{:e}", n))
            ),
            Val::Double(n) => write!(
                f,
                "{}",
                format_float(*n, format!("{}", n), format!("{:e}", n))
            ),
        }
    }
}
