use super::Val;
use crate::error;
use crate::lang::Error;
use chrono::Local;
use std::convert::TryFrom;
use std::ops::RangeInclusive;

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Abs,
    Asc,
    Atn,
    Atan2,
    Chr,
    Cint,
    Cos,
    Date,
    ErrLine,
    ErrNumber,
    Exp,
    Fix,
    Hex,
    Inkey,
    Instr,
    Int,
    Lcase,
    Left,
    Len,
    Log,
    Ltrim,
    Mid,
    Right,
    Rnd,
    Rtrim,
    Sgn,
    Sin,
    Space,
    Sqr,
    StackDepth,
    Str,
    StringFn,
    Tan,
    Time,
    Timer,
    Ucase,
    Value,
}

impl Function {
    pub fn function_and_arity(name: &str) -> Option<(Function, RangeInclusive<usize>)> {
        use Function::*;
        Some(match name {
            "abs" => (Abs, 1..=1),
            "asc" => (Asc, 1..=1),
            "atn" => (Atn, 1..=1),
            "atan2" => (Atan2, 2..=2),
            "chr$" => (Chr, 1..=1),
            "cint" => (Cint, 1..=1),
            "cos" => (Cos, 1..=1),
            "date$" => (Date, 0..=0),
            "erl" => (ErrLine, 0..=0),
            "err" => (ErrNumber, 0..=0),
            "exp" => (Exp, 1..=1),
            "fix" => (Fix, 1..=1),
            "hex$" => (Hex, 1..=1),
            "inkey$" => (Inkey, 0..=0),
            "instr" => (Instr, 2..=3),
            "int" => (Int, 1..=1),
            "lcase$" => (Lcase, 1..=1),
            "left$" => (Left, 2..=2),
            "len" => (Len, 1..=1),
            "log" => (Log, 1..=1),
            "ltrim$" => (Ltrim, 1..=1),
            "mid$" => (Mid, 2..=3),
            "right$" => (Right, 2..=2),
            "rnd" => (Rnd, 0..=1),
            "rtrim$" => (Rtrim, 1..=1),
            "sgn" => (Sgn, 1..=1),
            "sin" => (Sin, 1..=1),
            "space$" => (Space, 1..=1),
            "sqr" => (Sqr, 1..=1),
            "stackdepth" => (StackDepth, 0..=0),
            "str$" => (Str, 1..=1),
            "string$" => (StringFn, 2..=2),
            "tan" => (Tan, 1..=1),
            "time$" => (Time, 0..=0),
            "timer" => (Timer, 0..=0),
            "ucase$" => (Ucase, 1..=1),
            "val" => (Value, 1..=1),
            _ => return None,
        })
    }

    pub fn returns_string(self) -> bool {
        use Function::*;
        matches!(
            self,
            Chr | Date | Hex | Inkey | Lcase | Left | Ltrim | Mid | Right | Rtrim | Space | Str
                | StringFn | Time | Ucase
        )
    }

    /// Functions that read machine state are evaluated by the runtime.
    pub fn is_pure(self) -> bool {
        use Function::*;
        !matches!(self, ErrLine | ErrNumber | Inkey | Rnd | StackDepth | Timer)
    }

    pub fn call(self, mut args: Vec<Val>) -> Result<Val> {
        use Function::*;
        let arg = |args: &mut Vec<Val>| args.remove(0);
        match self {
            Abs => match arg(&mut args) {
                Val::Integer(n) => Ok(match n.checked_abs() {
                    Some(n) => Val::Integer(n),
                    None => Val::Double((n as f64).abs()),
                }),
                Val::Single(n) => Ok(Val::Single(n.abs())),
                v => Ok(Val::Double(v.to_f64()?.abs())),
            },
            Asc => match arg(&mut args).to_rc_str()?.chars().next() {
                Some(ch) => Ok(Val::Integer(ch as i32)),
                None => Err(error!(IllegalFunctionCall)),
            },
            Atn => float(&mut args, f64::atan),
            Atan2 => {
                let y = arg(&mut args).to_f64()?;
                let x = arg(&mut args).to_f64()?;
                Ok(Val::Double(y.atan2(x)))
            }
            Chr => {
                let n = arg(&mut args).to_index()?;
                if (0..=255).contains(&n) {
                    Ok(Val::from(char::from(n as u8).to_string()))
                } else {
                    Err(error!(IllegalFunctionCall))
                }
            }
            Cint => {
                let f = arg(&mut args).to_f64()?;
                let r = if (f - f.trunc()).abs() == 0.5 {
                    2.0 * (f / 2.0).round()
                } else {
                    f.round()
                };
                Ok(Val::from(r))
            }
            Cos => float(&mut args, f64::cos),
            Date => Ok(Val::from(Local::now().format("%m-%d-%Y").to_string())),
            Exp => float(&mut args, f64::exp),
            Fix => Ok(Val::from(arg(&mut args).to_f64()?.trunc())),
            Hex => Ok(Val::from(format!("{:X}", arg(&mut args).to_i32()? as u32))),
            Instr => {
                let start = if args.len() == 3 {
                    arg(&mut args).to_index()?
                } else {
                    1
                };
                let hay = arg(&mut args).to_rc_str()?;
                let needle = arg(&mut args).to_rc_str()?;
                if start < 1 {
                    return Err(error!(IllegalFunctionCall));
                }
                let skip = (start - 1) as usize;
                let chars: Vec<char> = hay.chars().collect();
                if skip > chars.len() {
                    return Ok(Val::Integer(0));
                }
                let rest: String = chars[skip..].iter().collect();
                Ok(match rest.find(&*needle) {
                    Some(byte) => Val::Integer((rest[..byte].chars().count() + skip + 1) as i32),
                    None => Val::Integer(0),
                })
            }
            Int => match arg(&mut args) {
                Val::Integer(n) => Ok(Val::Integer(n)),
                v => Ok(Val::from(v.to_f64()?.floor())),
            },
            Lcase => Ok(Val::from(arg(&mut args).to_rc_str()?.to_lowercase())),
            Left => {
                let s = arg(&mut args).to_rc_str()?;
                let n = count(arg(&mut args))?;
                Ok(Val::from(s.chars().take(n).collect::<String>()))
            }
            Len => Ok(Val::Integer(
                arg(&mut args).to_rc_str()?.chars().count() as i32,
            )),
            Log => {
                let f = arg(&mut args).to_f64()?;
                if f <= 0.0 {
                    return Err(error!(IllegalFunctionCall));
                }
                Ok(Val::Double(f.ln()))
            }
            Ltrim => Ok(Val::from(
                arg(&mut args).to_rc_str()?.trim_start_matches(' ').to_string(),
            )),
            Mid => {
                let s = arg(&mut args).to_rc_str()?;
                let start = arg(&mut args).to_index()?;
                if start < 1 {
                    return Err(error!(IllegalFunctionCall));
                }
                let len = match args.is_empty() {
                    true => usize::MAX,
                    false => count(arg(&mut args))?,
                };
                Ok(Val::from(
                    s.chars()
                        .skip((start - 1) as usize)
                        .take(len)
                        .collect::<String>(),
                ))
            }
            Right => {
                let s = arg(&mut args).to_rc_str()?;
                let n = count(arg(&mut args))?;
                let len = s.chars().count();
                Ok(Val::from(
                    s.chars().skip(len.saturating_sub(n)).collect::<String>(),
                ))
            }
            Rtrim => Ok(Val::from(
                arg(&mut args).to_rc_str()?.trim_end_matches(' ').to_string(),
            )),
            Sgn => {
                let f = arg(&mut args).to_f64()?;
                Ok(Val::Integer(if f > 0.0 {
                    1
                } else if f < 0.0 {
                    -1
                } else {
                    0
                }))
            }
            Sin => float(&mut args, f64::sin),
            Space => Ok(Val::from(" ".repeat(repeat_count(arg(&mut args))?))),
            Sqr => {
                let f = arg(&mut args).to_f64()?;
                if f < 0.0 {
                    return Err(error!(IllegalFunctionCall));
                }
                Ok(Val::Double(f.sqrt()))
            }
            Str => Ok(Val::from(arg(&mut args).str()?)),
            StringFn => {
                let n = repeat_count(arg(&mut args))?;
                let ch = match arg(&mut args) {
                    Val::String(s) => s.chars().next(),
                    v => u8::try_from(v.to_index()?).ok().map(char::from),
                };
                match ch {
                    Some(ch) => Ok(Val::from(std::iter::repeat(ch).take(n).collect::<String>())),
                    None => Err(error!(IllegalFunctionCall)),
                }
            }
            Tan => float(&mut args, f64::tan),
            Time => Ok(Val::from(Local::now().format("%H:%M:%S").to_string())),
            Ucase => Ok(Val::from(arg(&mut args).to_rc_str()?.to_uppercase())),
            Value => Ok(Val::parse(&arg(&mut args).to_rc_str()?)),
            ErrLine | ErrNumber | Inkey | Rnd | StackDepth | Timer => {
                Err(error!(InternalError; "{} is evaluated by the runtime", self))
            }
        }
    }
}

fn float(args: &mut Vec<Val>, f: fn(f64) -> f64) -> Result<Val> {
    Ok(Val::Double(f(args.remove(0).to_f64()?)))
}

/// Longest string SPACE$ and STRING$ will build.
const MAX_REPEAT: usize = 32767;

fn repeat_count(val: Val) -> Result<usize> {
    match count(val)? {
        n if n > MAX_REPEAT => Err(error!(IllegalFunctionCall)),
        n => Ok(n),
    }
}

fn count(val: Val) -> Result<usize> {
    let n = val.to_index()?;
    if n < 0 {
        Err(error!(IllegalFunctionCall))
    } else {
        Ok(n as usize)
    }
}

impl std::fmt::Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Function::*;
        let s = match self {
            Abs => "ABS",
            Asc => "ASC",
            Atn => "ATN",
            Atan2 => "ATAN2",
            Chr => "CHR$",
            Cint => "CINT",
            Cos => "COS",
            Date => "DATE$",
            ErrLine => "ERL",
            ErrNumber => "ERR",
            Exp => "EXP",
            Fix => "FIX",
            Hex => "HEX$",
            Inkey => "INKEY$",
            Instr => "INSTR",
            Int => "INT",
            Lcase => "LCASE$",
            Left => "LEFT$",
            Len => "LEN",
            Log => "LOG",
            Ltrim => "LTRIM$",
            Mid => "MID$",
            Right => "RIGHT$",
            Rnd => "RND",
            Rtrim => "RTRIM$",
            Sgn => "SGN",
            Sin => "SIN",
            Space => "SPACE$",
            Sqr => "SQR",
            StackDepth => "STACKDEPTH",
            Str => "STR$",
            StringFn => "STRING$",
            Tan => "TAN",
            Time => "TIME$",
            Timer => "TIMER",
            Ucase => "UCASE$",
            Value => "VAL",
        };
        write!(f, "{}", s)
    }
}
