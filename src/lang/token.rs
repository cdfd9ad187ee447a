use std::collections::HashMap;

thread_local!(
    static STRING_TO_TOKEN: HashMap<&'static str, Token> = Word::ALL
        .iter()
        .map(|w| (w.as_str(), Token::Word(*w)))
        .chain(
            Operator::WORDS
                .iter()
                .map(|op| (op.as_str(), Token::Operator(*op))),
        )
        .collect();
);

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    /// End of statement: a newline.
    Eol,
    /// End of source text.
    Eof,
    Literal(Literal),
    Word(Word),
    Operator(Operator),
    /// Compound assignment such as `+=`.
    Compound(Operator),
    /// Case folded identifier including any type suffix.
    Ident(String),
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Semicolon,
    Dot,
}

impl Token {
    /// Keyword or word operator for a case folded identifier.
    pub fn from_word(s: &str) -> Option<Token> {
        STRING_TO_TOKEN.with(|stt| stt.get(s).cloned())
    }

    pub fn is_word(&self, word: Word) -> bool {
        *self == Token::Word(word)
    }

    pub fn ends_statement(&self) -> bool {
        matches!(self, Token::Eol | Token::Eof | Token::Colon)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Token::*;
        match self {
            Eol => write!(f, "<EOL>"),
            Eof => Ok(()),
            Literal(s) => write!(f, "{}", s),
            Word(s) => write!(f, "{}", s),
            Operator(s) => write!(f, "{}", s),
            Compound(s) => write!(f, "{}=", s),
            Ident(s) => write!(f, "{}", s),
            LParen => write!(f, "("),
            RParen => write!(f, ")"),
            LBrace => write!(f, "{{"),
            RBrace => write!(f, "}}"),
            Comma => write!(f, ","),
            Colon => write!(f, ":"),
            Semicolon => write!(f, ";"),
            Dot => write!(f, "."),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Literal {
    /// Numeric text; hexadecimal is normalized to a `0x` prefix.
    Number(String),
    String(String),
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Literal::Number(s) => write!(f, "{}", s),
            Literal::String(s) => write!(f, "\"{}\"", s),
        }
    }
}

macro_rules! words {
    ($($word:ident => $text:literal,)*) => {
        #[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
        pub enum Word {
            $($word,)*
        }

        impl Word {
            pub const ALL: &'static [Word] = &[$(Word::$word,)*];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Word::$word => $text,)*
                }
            }
        }
    };
}

words! {
    As => "as",
    Base => "base",
    Beep => "beep",
    Byte => "byte",
    Call => "call",
    Case => "case",
    Circle => "circle",
    Close => "close",
    Cls => "cls",
    Color => "color",
    Const => "const",
    Data => "data",
    Declare => "declare",
    Def => "def",
    Defdbl => "defdbl",
    Defint => "defint",
    Deflng => "deflng",
    Defsng => "defsng",
    Defstr => "defstr",
    Dim => "dim",
    Do => "do",
    Double => "double",
    Draw => "draw",
    Else => "else",
    ElseIf => "elseif",
    End => "end",
    Error => "error",
    Exit => "exit",
    Explicit => "explicit",
    For => "for",
    Function => "function",
    GetMouse => "getmouse",
    Gosub => "gosub",
    Goto => "goto",
    If => "if",
    Input => "input",
    Integer => "integer",
    Is => "is",
    Let => "let",
    Line => "line",
    Locate => "locate",
    Long => "long",
    Loop => "loop",
    Next => "next",
    On => "on",
    Open => "open",
    Option => "option",
    Paint => "paint",
    Palette => "palette",
    Play => "play",
    Print => "print",
    Pset => "pset",
    Randomize => "randomize",
    Read => "read",
    Rem => "rem",
    Restore => "restore",
    Resume => "resume",
    Return => "return",
    Screen => "screen",
    Select => "select",
    Shared => "shared",
    Single => "single",
    Sleep => "sleep",
    Sound => "sound",
    Static => "static",
    Step => "step",
    Stop => "stop",
    String => "string",
    Sub => "sub",
    Swap => "swap",
    Then => "then",
    To => "to",
    Type => "type",
    Until => "until",
    Using => "using",
    Wend => "wend",
    While => "while",
    Width => "width",
}

impl std::fmt::Display for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Operator {
    Caret,
    Multiply,
    Divide,
    DivideInt,
    Mod,
    Plus,
    Minus,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Not,
    And,
    Or,
    Xor,
}

impl Operator {
    pub const WORDS: &'static [Operator] = &[
        Operator::Mod,
        Operator::Not,
        Operator::And,
        Operator::Or,
        Operator::Xor,
    ];

    pub fn as_str(self) -> &'static str {
        use Operator::*;
        match self {
            Caret => "^",
            Multiply => "*",
            Divide => "/",
            DivideInt => "\\",
            Mod => "mod",
            Plus => "+",
            Minus => "-",
            Equal => "=",
            NotEqual => "<>",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            Not => "not",
            And => "and",
            Or => "or",
            Xor => "xor",
        }
    }

    pub fn is_relational(self) -> bool {
        use Operator::*;
        matches!(
            self,
            Equal | NotEqual | Less | LessEqual | Greater | GreaterEqual
        )
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
