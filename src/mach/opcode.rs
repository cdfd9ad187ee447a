use super::alloc::{Place, SimpleType};
use super::bindings::LineFill;
use super::{Address, Function, Val};
use std::rc::Rc;

/// A typed slot at a compile time known place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub place: Place,
    pub ty: SimpleType,
}

/// Installed by `ON ERROR`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Handler {
    Fatal,
    Goto(Address),
    ResumeNext,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resume {
    /// `RESUME 0`: run the failing statement again.
    Retry,
    /// `RESUME` and `RESUME NEXT`: continue after the failing statement.
    Next,
    Label(Address),
}

/// Statements delegated to the bindings. Each pops a fixed number of
/// arguments; absent optional arguments are compiled as -1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Binding {
    Beep,
    Circle { fill: bool },
    Cls,
    Color,
    Draw,
    Line(LineFill),
    Locate,
    Paint,
    Pset,
    Screen,
    Width,
}

impl Binding {
    pub fn arity(self) -> usize {
        use Binding::*;
        match self {
            Beep => 0,
            Cls | Draw | Screen | Width => 1,
            Color | Locate => 2,
            Pset => 3,
            Paint => 4,
            Line(_) => 5,
            Circle { .. } => 7,
        }
    }
}

/// ## Virtual machine instruction set
///
/// Expressions are evaluated on an operand stack. Variables live in the
/// byte addressed memory, either at an absolute address or relative to
/// the frame pointer.
///
/// For example: `A=3*B` compiles to `[Literal(3), Load(B), Mul, Store(A)]`

#[derive(Clone, PartialEq)]
pub enum Opcode {
    // *** Stack manipulation
    /// Push literal value on to the stack.
    Literal(Val),
    Pop,
    Dup,
    /// Push the value of a slot.
    Load(Slot),
    /// Pop the stack into a slot. Numbers are converted to the slot type.
    Store(Slot),
    /// Push the absolute address of a place.
    Address(Place),
    /// Push the address held in a pointer cell.
    Deref(Place),
    /// Pop an address and push the value stored there.
    LoadAt(SimpleType),
    /// Pop a value then an address and store the value there.
    StoreAt(SimpleType),
    /// Add a constant to the address on the stack.
    Offset(usize),
    /// Pop `dims` indexes and a dope vector address, push the element
    /// address. An unallocated array with an automatic lower bound is
    /// allocated with an upper bound of 10.
    Element {
        dims: usize,
        size: usize,
        auto: Option<i32>,
    },
    /// Pop lower and upper bounds for each dimension and a dope vector
    /// address. Allocates storage, or branches to `skip` when the array
    /// already has storage.
    Dim {
        dims: usize,
        size: usize,
        skip: Address,
    },
    /// Pop a value and a dope vector address, store the value at the
    /// element with the linear `index`.
    InitElem {
        index: usize,
        size: usize,
        ty: SimpleType,
    },
    /// Pop a dimension number and a dope vector address, push a bound.
    Bound { upper: bool },
    /// Pop two addresses and exchange their values.
    Swap(SimpleType),

    // *** Branch control
    /// Unconditional branch to Address.
    Jump(Address),
    /// Pop stack and branch to Address if not zero.
    JumpIf(Address),
    /// Pop stack and branch to Address if zero.
    JumpIfNot(Address),
    /// Branch to `exit` when the counter has passed the limit in the
    /// direction of the step.
    ForCheck {
        counter: Slot,
        limit: Place,
        step: Place,
        exit: Address,
    },
    /// Add the step to the counter and branch back to the check.
    ForStep {
        counter: Slot,
        step: Place,
        check: Address,
    },
    /// Push the return address on the call stack and branch.
    Gosub(Address),
    /// Pop a return address pushed by GOSUB. Inside a routine the routine
    /// number bounds the call stack.
    Return(Option<usize>),
    /// Pop a one based index and branch to that target. Indexes out of
    /// range and unresolved targets fall through.
    OnGoto(Vec<Option<Address>>),
    OnGosub(Vec<Option<Address>>),
    /// Call routine number. Arguments are on the operand stack.
    Call(usize),
    /// Return from routine number.
    Exit(usize),
    End,

    // *** Errors
    OnError(Handler),
    /// Pop an error number and raise it.
    Raise,
    Resume(Resume),

    // *** Statements
    /// Pop and print a value.
    Print,
    /// Advance to the next print zone.
    PrintComma,
    PrintNewline,
    /// Pop a format string for PRINT USING.
    Using,
    /// Pop a value and print it through the next format field.
    UsingVal,
    /// Print the format text that follows the last field.
    UsingEnd,
    /// Push the next DATA item converted to the type.
    Read(SimpleType),
    /// Set the DATA cursor.
    Restore(usize),
    /// Print the prompt and wait for a line from the bindings.
    Input { prompt: Rc<str>, question: bool },
    /// As `Input` but the line is one field.
    LineInput(Rc<str>),
    /// Push the next input field converted to the type.
    InputField(SimpleType),
    /// Pop seconds to suspend.
    Sleep,
    Yield,
    /// Pop a seed for the random number generator.
    Randomize,
    Bind(Binding),
    /// Push one of the mouse fields: x, y, wheel, buttons, clip.
    Mouse(usize),

    // *** Expression operations
    Neg,
    Pow,
    Mul,
    Div,
    DivInt,
    Mod,
    Add,
    Sub,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Not,
    And,
    Or,
    Xor,

    // *** Built-in functions
    /// Pop arguments and push the function result.
    Fn(Function, usize),
}

impl std::fmt::Debug for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string())
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Opcode::*;
        match self {
            Literal(val) => match val {
                Val::String(s) => write!(f, "LITERAL(\"{}\")", s),
                _ => write!(f, "LITERAL({})", val),
            },
            Pop => write!(f, "POP"),
            Dup => write!(f, "DUP"),
            Load(slot) => write!(f, "LOAD({} {})", slot.ty, slot.place),
            Store(slot) => write!(f, "STORE({} {})", slot.ty, slot.place),
            Address(place) => write!(f, "ADDRESS({})", place),
            Deref(place) => write!(f, "DEREF({})", place),
            LoadAt(ty) => write!(f, "LOADAT({})", ty),
            StoreAt(ty) => write!(f, "STOREAT({})", ty),
            Offset(n) => write!(f, "OFFSET({})", n),
            Element { dims, size, .. } => write!(f, "ELEMENT({}, {})", dims, size),
            Dim { dims, size, skip } => write!(f, "DIM({}, {}, {})", dims, size, skip),
            InitElem { index, .. } => write!(f, "INITELEM({})", index),
            Bound { upper } => write!(f, "{}", if *upper { "UBOUND" } else { "LBOUND" }),
            Swap(ty) => write!(f, "SWAP({})", ty),
            Jump(a) => write!(f, "JUMP({})", a),
            JumpIf(a) => write!(f, "JUMPIF({})", a),
            JumpIfNot(a) => write!(f, "JUMPIFNOT({})", a),
            ForCheck { counter, exit, .. } => write!(f, "FORCHECK({}, {})", counter.place, exit),
            ForStep { counter, check, .. } => write!(f, "FORSTEP({}, {})", counter.place, check),
            Gosub(a) => write!(f, "GOSUB({})", a),
            Return(_) => write!(f, "RETURN"),
            OnGoto(v) => write!(f, "ONGOTO({:?})", v),
            OnGosub(v) => write!(f, "ONGOSUB({:?})", v),
            Call(r) => write!(f, "CALL({})", r),
            Exit(r) => write!(f, "EXIT({})", r),
            End => write!(f, "END"),
            OnError(h) => write!(f, "ONERROR({:?})", h),
            Raise => write!(f, "RAISE"),
            Resume(r) => write!(f, "RESUME({:?})", r),
            Print => write!(f, "PRINT"),
            PrintComma => write!(f, "PRINTCOMMA"),
            PrintNewline => write!(f, "PRINTNEWLINE"),
            Using => write!(f, "USING"),
            UsingVal => write!(f, "USINGVAL"),
            UsingEnd => write!(f, "USINGEND"),
            Read(ty) => write!(f, "READ({})", ty),
            Restore(n) => write!(f, "RESTORE({})", n),
            Input { .. } => write!(f, "INPUT"),
            LineInput(_) => write!(f, "LINEINPUT"),
            InputField(ty) => write!(f, "INPUTFIELD({})", ty),
            Sleep => write!(f, "SLEEP"),
            Yield => write!(f, "YIELD"),
            Randomize => write!(f, "RANDOMIZE"),
            Bind(b) => write!(f, "BIND({:?})", b),
            Mouse(n) => write!(f, "MOUSE({})", n),
            Neg => write!(f, "NEG"),
            Pow => write!(f, "POW"),
            Mul => write!(f, "MUL"),
            Div => write!(f, "DIV"),
            DivInt => write!(f, "DIVINT"),
            Mod => write!(f, "MOD"),
            Add => write!(f, "ADD"),
            Sub => write!(f, "SUB"),
            Eq => write!(f, "EQ"),
            NotEq => write!(f, "NOTEQ"),
            Lt => write!(f, "LT"),
            LtEq => write!(f, "LTEQ"),
            Gt => write!(f, "GT"),
            GtEq => write!(f, "GTEQ"),
            Not => write!(f, "NOT"),
            And => write!(f, "AND"),
            Or => write!(f, "OR"),
            Xor => write!(f, "XOR"),
            Fn(func, argc) => write!(f, "{}({})", func, argc),
        }
    }
}
