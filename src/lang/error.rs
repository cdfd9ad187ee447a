#[derive(Clone, PartialEq)]
pub struct Error {
    code: u16,
    line: Option<usize>,
    message: String,
}

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($err:ident) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
    };
    ($err:ident, $line:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).in_line($line)
    };
    ($err:ident; $($arg:tt)+) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).message(format!($($arg)+))
    };
    ($err:ident, $line:expr; $($arg:tt)+) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line($line)
            .message(format!($($arg)+))
    };
}

impl Error {
    pub fn new(code: ErrorCode) -> Error {
        Error {
            code: code as u16,
            line: None,
            message: String::new(),
        }
    }

    /// Error raised by the `ERROR n` statement.
    pub fn raised(code: u16) -> Error {
        Error {
            code,
            line: None,
            message: String::new(),
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn line(&self) -> Option<usize> {
        self.line
    }

    pub fn in_line(self, line: usize) -> Error {
        Error {
            line: Some(line),
            ..self
        }
    }

    /// Attach a line unless one is already known.
    pub fn or_line(self, line: Option<usize>) -> Error {
        match (self.line, line) {
            (None, Some(line)) => self.in_line(line),
            _ => self,
        }
    }

    pub fn message<S: Into<String>>(self, message: S) -> Error {
        Error {
            message: message.into(),
            ..self
        }
    }

    fn code_str(&self) -> &'static str {
        match self.code {
            1 => "NEXT WITHOUT FOR",
            2 => "SYNTAX ERROR",
            3 => "RETURN WITHOUT GOSUB",
            4 => "OUT OF DATA",
            5 => "ILLEGAL FUNCTION CALL",
            6 => "OVERFLOW",
            7 => "OUT OF MEMORY",
            8 => "UNDEFINED LINE",
            9 => "SUBSCRIPT OUT OF RANGE",
            10 => "REDIMENSIONED ARRAY",
            11 => "DIVISION BY ZERO",
            13 => "TYPE MISMATCH",
            14 => "OUT OF STRING SPACE",
            18 => "UNDEFINED USER FUNCTION",
            19 => "NO RESUME",
            20 => "RESUME WITHOUT ERROR",
            22 => "MISSING OPERAND",
            26 => "FOR WITHOUT NEXT",
            28 => "OUT OF STACK SPACE",
            29 => "WHILE WITHOUT WEND",
            30 => "WEND WITHOUT WHILE",
            35 => "SUBPROGRAM NOT DEFINED",
            51 => "INTERNAL ERROR",
            73 => "ADVANCED FEATURE UNAVAILABLE",
            _ => "UNPRINTABLE ERROR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorCode {
    SyntaxError = 2,
    ReturnWithoutGosub = 3,
    OutOfData = 4,
    IllegalFunctionCall = 5,
    Overflow = 6,
    OutOfMemory = 7,
    UndefinedLine = 8,
    SubscriptOutOfRange = 9,
    RedimensionedArray = 10,
    DivisionByZero = 11,
    TypeMismatch = 13,
    UndefinedUserFunction = 18,
    ResumeWithoutError = 20,
    OutOfStackSpace = 28,
    SubprogramNotDefined = 35,
    InternalError = 51,
    FeatureUnavailable = 73,
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error {{ {} }}", self.to_string())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.code_str())?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(line) = self.line {
            write!(f, " at line {}", line)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    #[test]
    fn test_message_with_line() {
        let e = error!(SyntaxError, 7; "Invalid field name");
        assert_eq!(e.to_string(), "Invalid field name at line 7");
        assert_eq!(e.code(), 2);
    }

    #[test]
    fn test_code_text() {
        assert_eq!(error!(OutOfData).to_string(), "OUT OF DATA");
        assert_eq!(super::Error::raised(123).to_string(), "UNPRINTABLE ERROR");
        assert_eq!(
            error!(DivisionByZero).or_line(Some(3)).or_line(Some(4)).to_string(),
            "DIVISION BY ZERO at line 3"
        );
    }
}
