use super::Val;
use crate::error;
use crate::lang::Error;
use std::cmp::Ordering;

type Result<T> = std::result::Result<T, Error>;

enum Pair {
    Integer(i32, i32),
    Single(f32, f32),
    Double(f64, f64),
}

fn pair(lhs: &Val, rhs: &Val) -> Result<Pair> {
    use Val::*;
    Ok(match (lhs, rhs) {
        (Integer(l), Integer(r)) => Pair::Integer(*l, *r),
        (Integer(l), Single(r)) => Pair::Single(*l as f32, *r),
        (Single(l), Integer(r)) => Pair::Single(*l, *r as f32),
        (Single(l), Single(r)) => Pair::Single(*l, *r),
        (String(_), _) | (_, String(_)) => return Err(error!(TypeMismatch)),
        (l, r) => Pair::Double(l.to_f64()?, r.to_f64()?),
    })
}

/// ## Expression operators
///
/// Integer arithmetic that overflows continues in double precision.

pub struct Operation {}

impl Operation {
    pub fn negate(val: Val) -> Result<Val> {
        use Val::*;
        match val {
            Integer(n) => Ok(match n.checked_neg() {
                Some(n) => Integer(n),
                None => Double(-(n as f64)),
            }),
            Single(n) => Ok(Single(-n)),
            Double(n) => Ok(Double(-n)),
            String(_) => Err(error!(TypeMismatch)),
        }
    }

    pub fn sum(lhs: Val, rhs: Val) -> Result<Val> {
        if let (Val::String(l), Val::String(r)) = (&lhs, &rhs) {
            let mut s = String::with_capacity(l.len() + r.len());
            s.push_str(l);
            s.push_str(r);
            return Ok(Val::from(s));
        }
        Ok(match pair(&lhs, &rhs)? {
            Pair::Integer(l, r) => match l.checked_add(r) {
                Some(n) => Val::Integer(n),
                None => Val::Double(l as f64 + r as f64),
            },
            Pair::Single(l, r) => Val::Single(l + r),
            Pair::Double(l, r) => Val::Double(l + r),
        })
    }

    pub fn subtract(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(match pair(&lhs, &rhs)? {
            Pair::Integer(l, r) => match l.checked_sub(r) {
                Some(n) => Val::Integer(n),
                None => Val::Double(l as f64 - r as f64),
            },
            Pair::Single(l, r) => Val::Single(l - r),
            Pair::Double(l, r) => Val::Double(l - r),
        })
    }

    pub fn multiply(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(match pair(&lhs, &rhs)? {
            Pair::Integer(l, r) => match l.checked_mul(r) {
                Some(n) => Val::Integer(n),
                None => Val::Double(l as f64 * r as f64),
            },
            Pair::Single(l, r) => Val::Single(l * r),
            Pair::Double(l, r) => Val::Double(l * r),
        })
    }

    pub fn divide(lhs: Val, rhs: Val) -> Result<Val> {
        match pair(&lhs, &rhs)? {
            Pair::Single(l, r) => {
                if r == 0.0 {
                    return Err(error!(DivisionByZero));
                }
                Ok(Val::Single(l / r))
            }
            _ => {
                let (l, r) = (lhs.to_f64()?, rhs.to_f64()?);
                if r == 0.0 {
                    return Err(error!(DivisionByZero));
                }
                Ok(Val::Double(l / r))
            }
        }
    }

    /// Floor division.
    pub fn divide_int(lhs: Val, rhs: Val) -> Result<Val> {
        let (l, r) = (lhs.to_f64()?, rhs.to_f64()?);
        if r == 0.0 {
            return Err(error!(DivisionByZero));
        }
        Ok(Val::from((l / r).floor()))
    }

    pub fn modulo(lhs: Val, rhs: Val) -> Result<Val> {
        let (l, r) = (lhs.to_index()?, rhs.to_index()?);
        if r == 0 {
            return Err(error!(DivisionByZero));
        }
        match l.checked_rem(r) {
            Some(n) => Ok(Val::from(n as f64)),
            None => Err(error!(Overflow)),
        }
    }

    pub fn power(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(match pair(&lhs, &rhs)? {
            Pair::Integer(l, r) if r >= 0 => match l.checked_pow(r as u32) {
                Some(n) => Val::Integer(n),
                None => Val::Double((l as f64).powf(r as f64)),
            },
            Pair::Integer(l, r) => Val::Double((l as f64).powf(r as f64)),
            Pair::Single(l, r) => Val::Single(l.powf(r)),
            Pair::Double(l, r) => Val::Double(l.powf(r)),
        })
    }

    fn compare(lhs: &Val, rhs: &Val) -> Result<Option<Ordering>> {
        match (lhs, rhs) {
            (Val::String(l), Val::String(r)) => Ok(Some(l.cmp(r))),
            (Val::String(_), _) | (_, Val::String(_)) => Err(error!(TypeMismatch)),
            (Val::Integer(l), Val::Integer(r)) => Ok(Some(l.cmp(r))),
            (l, r) => Ok(l.to_f64()?.partial_cmp(&r.to_f64()?)),
        }
    }

    pub fn equal(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Val::from(Operation::compare(&lhs, &rhs)? == Some(Ordering::Equal)))
    }

    pub fn not_equal(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Val::from(Operation::compare(&lhs, &rhs)? != Some(Ordering::Equal)))
    }

    pub fn less(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Val::from(Operation::compare(&lhs, &rhs)? == Some(Ordering::Less)))
    }

    pub fn less_equal(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Val::from(matches!(
            Operation::compare(&lhs, &rhs)?,
            Some(Ordering::Less) | Some(Ordering::Equal)
        )))
    }

    pub fn greater(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Val::from(Operation::compare(&lhs, &rhs)? == Some(Ordering::Greater)))
    }

    pub fn greater_equal(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Val::from(matches!(
            Operation::compare(&lhs, &rhs)?,
            Some(Ordering::Greater) | Some(Ordering::Equal)
        )))
    }

    pub fn not(val: Val) -> Result<Val> {
        Ok(Val::Integer(!val.to_i32()?))
    }

    pub fn and(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Val::Integer(lhs.to_i32()? & rhs.to_i32()?))
    }

    pub fn or(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Val::Integer(lhs.to_i32()? | rhs.to_i32()?))
    }

    pub fn xor(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Val::Integer(lhs.to_i32()? ^ rhs.to_i32()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_overflow_widens() {
        let v = Operation::multiply(Val::Integer(65536), Val::Integer(65536)).unwrap();
        assert_eq!(v, Val::Double(4294967296.0));
    }

    #[test]
    fn test_divisions() {
        assert_eq!(
            Operation::divide(Val::Integer(3), Val::Integer(2)).unwrap(),
            Val::Double(1.5)
        );
        assert_eq!(
            Operation::divide_int(Val::Integer(-7), Val::Integer(2)).unwrap(),
            Val::Integer(-4)
        );
        assert_eq!(
            Operation::modulo(Val::Integer(7), Val::Double(2.9)).unwrap(),
            Val::Integer(1)
        );
        assert!(Operation::divide(Val::Integer(1), Val::Integer(0)).is_err());
    }

    #[test]
    fn test_modulo_of_huge_operands() {
        assert!(Operation::modulo(Val::Double(-1e300), Val::Integer(-1)).is_err());
        assert_eq!(
            Operation::modulo(Val::Integer(-7), Val::Integer(2)).unwrap(),
            Val::Integer(-1)
        );
    }

    #[test]
    fn test_relational_truth() {
        assert_eq!(
            Operation::less(Val::from("abc"), Val::from("abd")).unwrap(),
            Val::Integer(-1)
        );
        assert_eq!(
            Operation::equal(Val::Integer(2), Val::Double(2.0)).unwrap(),
            Val::Integer(-1)
        );
        assert!(Operation::equal(Val::Integer(2), Val::from("2")).is_err());
    }
}
