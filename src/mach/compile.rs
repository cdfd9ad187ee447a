use super::alloc::{Allocator, Dims, Field, Place, Record, Scope, SimpleType, Var, VarType};
use super::bindings::LineFill;
use super::expr::{compound, fold, Access, Kind};
use super::opcode::{Binding, Handler, Opcode, Resume, Slot};
use super::program::{Program, Routine};
use super::{Address, Function, Link, Val};
use crate::error;
use crate::lang::{Error, Lexer, Literal, Operator, Token, Word};
use std::collections::HashMap;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// Compile BASIC source text into a linked program.
pub fn compile(src: &str) -> Result<Program> {
    let mut compiler = Compiler::new(src)?;
    match compiler.program() {
        Ok(()) => compiler.finish(),
        Err(error) => Err(error.or_line(Some(compiler.line))),
    }
}

enum Test {
    Value(Vec<Opcode>),
    Range(Vec<Opcode>, Vec<Opcode>),
    Is(Opcode, Vec<Opcode>),
}

struct Case {
    entry: Address,
    tests: Vec<Test>,
}

struct Select {
    temp: Slot,
    kind: Kind,
    dispatch: Address,
    cases: Vec<Case>,
    ends: Vec<Address>,
    otherwise: Option<Address>,
}

/// Open block structures. Jumps that leave a block are patched when it
/// closes.
enum Flow {
    If {
        next: Option<Address>,
        ends: Vec<Address>,
    },
    Do {
        top: Address,
        exits: Vec<Address>,
    },
    While {
        top: Address,
        exit: Address,
    },
    For {
        check: Address,
        counter: Slot,
        step: Place,
        exits: Vec<Address>,
    },
    Select(Select),
    Routine {
        index: usize,
        skip: Address,
    },
}

impl Flow {
    fn kind(&self) -> &'static str {
        match self {
            Flow::If { .. } => "if",
            Flow::Do { .. } => "do",
            Flow::While { .. } => "while",
            Flow::For { .. } => "for",
            Flow::Select(_) => "select",
            Flow::Routine { .. } => "sub",
        }
    }
}

/// ## Single pass compiler
///
/// Statements are compiled straight from the token stream into
/// operations. Forward references to labels go through `Link`; block
/// structures keep their pending jumps on the flow stack.

pub struct Compiler<'a> {
    pub(super) lex: Lexer<'a>,
    pub(super) ops: Vec<Opcode>,
    pub(super) alloc: Allocator,
    pub(super) routines: Vec<Routine>,
    pub(super) routine_index: HashMap<String, usize>,
    pub(super) consts: HashMap<String, Val>,
    pub(super) deftypes: [SimpleType; 26],
    pub(super) explicit: bool,
    pub(super) option_base: i32,
    pub(super) def_fn: bool,
    current: Option<usize>,
    types: HashMap<String, Rc<Record>>,
    link: Link,
    flow: Vec<Flow>,
    data: Vec<Rc<str>>,
    program: Program,
    line: usize,
}

impl<'a> Compiler<'a> {
    pub fn new(src: &'a str) -> Result<Compiler<'a>> {
        Ok(Compiler {
            lex: Lexer::new(src)?,
            ops: vec![],
            alloc: Allocator::default(),
            routines: vec![],
            routine_index: HashMap::new(),
            consts: HashMap::new(),
            deftypes: [SimpleType::Single; 26],
            explicit: false,
            option_base: 0,
            def_fn: false,
            current: None,
            types: HashMap::new(),
            link: Link::new(),
            flow: vec![],
            data: vec![],
            program: Program::new(),
            line: 1,
        })
    }

    fn program(&mut self) -> Result<()> {
        loop {
            if let Token::Literal(Literal::Number(n)) = self.lex.token() {
                let label = n.clone();
                self.label(&label)?;
                self.lex.next()?;
            }
            self.statements()?;
            match self.lex.next()? {
                Token::Eol => {}
                Token::Eof => break,
                t => return Err(error!(SyntaxError; "Expected \"<EOL>\" found \"{}\"", t)),
            }
        }
        match self.flow.last() {
            Some(flow) => Err(error!(SyntaxError; "Unmatched {}", flow.kind())),
            None => Ok(()),
        }
    }

    fn finish(mut self) -> Result<Program> {
        self.program.statement(self.ops.len(), self.lex.line());
        self.emit(Opcode::End);
        self.link.link(&mut self.ops)?;
        let mut program = self.program;
        program.ops = self.ops;
        program.routines = self.routines;
        program.data = self.data;
        program.globals_size = self.alloc.global_size();
        log::debug!(
            "compiled {} ops, {} routines, {} data items, {} bytes of globals",
            program.len(),
            program.routines.len(),
            program.data.len(),
            program.globals_size
        );
        Ok(program)
    }

    fn statements(&mut self) -> Result<()> {
        self.statement()?;
        loop {
            match self.lex.token() {
                Token::Colon => {
                    self.lex.next()?;
                    self.statement()?;
                }
                Token::Word(Word::Else) | Token::Word(Word::ElseIf) | Token::Word(Word::End)
                    if matches!(self.flow.last(), Some(Flow::If { .. })) =>
                {
                    self.statement()?
                }
                _ => return Ok(()),
            }
        }
    }

    fn statement(&mut self) -> Result<()> {
        self.line = self.lex.line();
        self.program.statement(self.ops.len(), self.line);
        match self.lex.token().clone() {
            Token::Eol | Token::Eof | Token::Colon => Ok(()),
            Token::Word(Word::Rem) => {
                self.lex.rest_of_line()?;
                Ok(())
            }
            Token::Word(Word::Data) => self.data(),
            Token::Word(word) => {
                self.lex.next()?;
                self.word(word)
            }
            Token::Ident(name) => {
                self.lex.next()?;
                self.identifier_statement(name)
            }
            t => Err(error!(SyntaxError; "Unexpected \"{}\"", t)),
        }
    }

    fn word(&mut self, word: Word) -> Result<()> {
        match word {
            Word::Beep => self.bind(Binding::Beep),
            Word::Call => self.call(),
            Word::Case => self.case(),
            Word::Circle => self.circle(),
            Word::Cls => self.cls(),
            Word::Color => self.color(),
            Word::Const => self.r#const(),
            Word::Declare => self.declare(),
            Word::Def => self.def(),
            Word::Defdbl => self.deftype(SimpleType::Double),
            Word::Defint => self.deftype(SimpleType::Integer),
            Word::Deflng => self.deftype(SimpleType::Long),
            Word::Defsng => self.deftype(SimpleType::Single),
            Word::Defstr => self.deftype(SimpleType::String),
            Word::Dim => self.dim(),
            Word::Do => self.r#do(),
            Word::Draw => self.draw(),
            Word::Else => self.r#else(),
            Word::ElseIf => self.elseif(),
            Word::End => self.end(),
            Word::Error => self.error(),
            Word::Exit => self.exit(),
            Word::For => self.r#for(),
            Word::Function => self.routine(false),
            Word::GetMouse => self.getmouse(),
            Word::Gosub => self.gosub(),
            Word::Goto => self.goto(),
            Word::If => self.r#if(),
            Word::Input => self.input(),
            Word::Let => self.r#let(),
            Word::Line => self.line(),
            Word::Locate => self.locate(),
            Word::Loop => self.r#loop(),
            Word::Next => self.next(),
            Word::On => self.on(),
            Word::Option => self.option(),
            Word::Paint => self.paint(),
            Word::Print => self.print(),
            Word::Pset => self.pset(),
            Word::Randomize => self.randomize(),
            Word::Read => self.read(),
            Word::Restore => self.restore(),
            Word::Resume => self.resume(),
            Word::Return => self.r#return(),
            Word::Screen => self.screen(),
            Word::Select => self.select(),
            Word::Sleep => self.sleep(),
            Word::Stop => self.emit_statement(Opcode::End),
            Word::Sub => self.routine(true),
            Word::Swap => self.swap(),
            Word::Type => self.r#type(),
            Word::Wend => self.wend(),
            Word::While => self.r#while(),
            Word::Width => self.width(),
            Word::Close | Word::Open | Word::Palette | Word::Play | Word::Sound => Err(error!(FeatureUnavailable;
                "{} is not supported", word.as_str().to_uppercase())),
            _ => Err(error!(SyntaxError; "Unexpected \"{}\"", word)),
        }
    }

    // *** Token helpers

    pub(super) fn emit(&mut self, op: Opcode) -> Address {
        self.ops.push(op);
        self.ops.len() - 1
    }

    fn emit_statement(&mut self, op: Opcode) -> Result<()> {
        self.emit(op);
        Ok(())
    }

    fn patch(&mut self, at: Address, target: Address) -> Result<()> {
        match self.ops.get_mut(at) {
            Some(Opcode::Jump(a))
            | Some(Opcode::JumpIf(a))
            | Some(Opcode::JumpIfNot(a))
            | Some(Opcode::ForCheck { exit: a, .. })
            | Some(Opcode::Dim { skip: a, .. }) => {
                *a = target;
                Ok(())
            }
            _ => Err(error!(InternalError; "BAD BACKPATCH AT {}", at)),
        }
    }

    fn patch_here(&mut self, at: Address) -> Result<()> {
        let here = self.ops.len();
        self.patch(at, here)
    }

    pub(super) fn accept(&mut self, token: &Token) -> Result<bool> {
        if self.lex.token() == token {
            self.lex.next()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn accept_word(&mut self, word: Word) -> Result<bool> {
        self.accept(&Token::Word(word))
    }

    pub(super) fn expect(&mut self, token: Token) -> Result<()> {
        if self.lex.token() == &token {
            self.lex.next()?;
            Ok(())
        } else {
            Err(error!(SyntaxError;
                "Expected \"{}\" found \"{}\"", token, self.lex.token()))
        }
    }

    fn expect_word(&mut self, word: Word) -> Result<()> {
        self.expect(Token::Word(word))
    }

    pub(super) fn ident(&mut self) -> Result<String> {
        match self.lex.token() {
            Token::Ident(name) => {
                let name = name.clone();
                self.lex.next()?;
                Ok(name)
            }
            t => Err(error!(SyntaxError; "Expected identifier found \"{}\"", t)),
        }
    }

    /// The statement ends here, including before the ELSE of a one line IF.
    pub(super) fn at_end(&self) -> bool {
        let token = self.lex.token();
        token.ends_statement() || token.is_word(Word::Else)
    }

    fn label_name(&mut self) -> Result<String> {
        match self.lex.next()? {
            Token::Ident(name) => Ok(name),
            Token::Literal(Literal::Number(n)) => Ok(n),
            t => Err(error!(SyntaxError; "Expected label found \"{}\"", t)),
        }
    }

    fn label(&mut self, label: &str) -> Result<()> {
        self.link.define(label, self.ops.len(), self.data.len())
    }

    fn jump_to_label(&mut self, label: &str, op: Opcode) {
        let at = self.emit(op);
        self.link.link_addr_to_label(at, label, self.line);
    }

    /// Compile an expression into a detached fragment.
    fn fragment(&mut self) -> Result<(Vec<Opcode>, Kind)> {
        let saved = std::mem::take(&mut self.ops);
        let result = self.expression();
        let fragment = std::mem::replace(&mut self.ops, saved);
        Ok((fragment, result?))
    }

    fn fragment_of(&mut self, kind: Kind) -> Result<Vec<Opcode>> {
        match self.fragment()? {
            (ops, k) if k == kind => Ok(ops),
            _ => Err(error!(TypeMismatch)),
        }
    }

    // *** Assignment

    fn identifier_statement(&mut self, name: String) -> Result<()> {
        if let Some(&index) = self.routine_index.get(&name) {
            if self.routines[index].is_sub {
                let delimited = self.lex.token() == &Token::LParen;
                return self.call_arguments(index, delimited);
            }
        }
        if self.lex.token() == &Token::Colon {
            self.lex.next()?;
            self.label(&name)?;
            if !self.at_end() {
                self.statement()?;
            }
            return Ok(());
        }
        self.assignment(&name)
    }

    fn r#let(&mut self) -> Result<()> {
        let name = self.ident()?;
        self.assignment(&name)
    }

    fn assignment(&mut self, name: &str) -> Result<()> {
        let result = self
            .current
            .filter(|_| !self.def_fn)
            .map(|index| &self.routines[index])
            .filter(|routine| routine.name == name)
            .and_then(|routine| routine.result);
        let target = match result {
            Some(slot) => Access::Slot(slot),
            None => self.access(name)?,
        };
        let op = match self.lex.next()? {
            Token::Operator(Operator::Equal) => None,
            Token::Compound(op) => match compound(op) {
                Some(op) => Some(op),
                None => return Err(error!(SyntaxError; "Unexpected \"{}=\"", op)),
            },
            t => return Err(error!(SyntaxError; "Expected \"=\" or \"x=\" found \"{}\"", t)),
        };
        if op.is_some() {
            match target {
                Access::Slot(slot) => self.emit(Opcode::Load(slot)),
                Access::Dynamic(ty) => {
                    self.emit(Opcode::Dup);
                    self.emit(Opcode::LoadAt(ty))
                }
            };
        }
        let kind = self.expression()?;
        if kind != target.kind() {
            return Err(error!(TypeMismatch));
        }
        if let Some(op) = op {
            if kind == Kind::String && op != Opcode::Add {
                return Err(error!(TypeMismatch));
            }
            self.emit(op);
        }
        self.store(target);
        Ok(())
    }

    fn swap(&mut self) -> Result<()> {
        let name = self.ident()?;
        let lhs = self.address_of(&name)?;
        self.expect(Token::Comma)?;
        let name = self.ident()?;
        let rhs = self.address_of(&name)?;
        if lhs != rhs {
            return Err(error!(TypeMismatch));
        }
        self.emit_statement(Opcode::Swap(lhs))
    }

    // *** Declarations

    fn type_name(&mut self) -> Result<VarType> {
        let ty = match self.lex.next()? {
            Token::Word(Word::Byte) => SimpleType::Byte,
            Token::Word(Word::Integer) => SimpleType::Integer,
            Token::Word(Word::Long) => SimpleType::Long,
            Token::Word(Word::Single) => SimpleType::Single,
            Token::Word(Word::Double) => SimpleType::Double,
            Token::Word(Word::String) => {
                if self.accept(&Token::Operator(Operator::Multiply))? {
                    self.lex.next()?;
                }
                SimpleType::String
            }
            Token::Ident(name) => match self.types.get(&name) {
                Some(record) => return Ok(VarType::Record(record.clone())),
                None => return Err(error!(SyntaxError; "Unexpected type \"{}\"", name)),
            },
            t => return Err(error!(SyntaxError; "Unexpected type \"{}\"", t)),
        };
        Ok(VarType::Simple(ty))
    }

    fn simple_type_name(&mut self) -> Result<SimpleType> {
        match self.type_name()? {
            VarType::Simple(ty) => Ok(ty),
            VarType::Record(record) => {
                Err(error!(SyntaxError; "Unexpected type \"{}\"", record.name))
            }
        }
    }

    fn dim(&mut self) -> Result<()> {
        let shared = self.accept_word(Word::Shared)?;
        let common = if self.accept_word(Word::As)? {
            Some(self.type_name()?)
        } else {
            None
        };
        loop {
            self.dim_variable(shared, common.clone())?;
            if !self.accept(&Token::Comma)? {
                return Ok(());
            }
        }
    }

    fn dim_variable(&mut self, shared: bool, common: Option<VarType>) -> Result<()> {
        let name = self.ident()?;
        let mut bounds = vec![];
        if self.accept(&Token::LParen)? {
            loop {
                let first = self.fragment_of(Kind::Number)?;
                if self.accept_word(Word::To)? {
                    bounds.push((first, self.fragment_of(Kind::Number)?));
                } else {
                    let base = vec![Opcode::Literal(Val::Integer(self.option_base))];
                    bounds.push((base, first));
                }
                if !self.accept(&Token::Comma)? {
                    break;
                }
            }
            self.expect(Token::RParen)?;
        }
        let mut values = vec![];
        if self.accept(&Token::Operator(Operator::Equal))? {
            if !bounds.is_empty() && self.accept(&Token::LBrace)? {
                loop {
                    values.push(self.fragment()?);
                    if !self.accept(&Token::Comma)? {
                        break;
                    }
                }
                self.expect(Token::RBrace)?;
            } else {
                values.push(self.fragment()?);
            }
        }
        let var_type = if self.accept_word(Word::As)? {
            self.type_name()?
        } else {
            match common {
                Some(var_type) => var_type,
                None => VarType::Simple(self.implicit_type(&name)),
            }
        };
        let dims = match bounds.len() {
            0 => Dims::Scalar,
            n => Dims::Array(n),
        };
        let var = self.alloc.declare(&name, var_type.clone(), dims, shared)?;
        let ty = var_type.simple();
        if bounds.is_empty() {
            if let Some((value, kind)) = values.pop() {
                let ty = ty.filter(|ty| Kind::from(*ty) == kind);
                let ty = ty.ok_or_else(|| error!(TypeMismatch))?;
                self.ops.extend(value);
                self.emit(Opcode::Store(Slot {
                    place: var.place,
                    ty,
                }));
            }
            return Ok(());
        }
        let size = var_type.size();
        self.emit(Opcode::Address(var.place));
        for (lower, upper) in bounds {
            self.ops.extend(lower);
            self.ops.extend(upper);
        }
        let dim = self.emit(Opcode::Dim {
            dims: dims_len(dims),
            size,
            skip: 0,
        });
        for (index, (value, kind)) in values.into_iter().enumerate() {
            let ty = ty.filter(|ty| Kind::from(*ty) == kind);
            let ty = ty.ok_or_else(|| error!(TypeMismatch))?;
            self.emit(Opcode::Address(var.place));
            self.ops.extend(value);
            self.emit(Opcode::InitElem { index, size, ty });
        }
        self.patch_here(dim)
    }

    fn r#const(&mut self) -> Result<()> {
        loop {
            let name = self.ident()?;
            if self.consts.contains_key(&name) || self.lookup(&name).is_some() {
                return Err(error!(SyntaxError; "Constant {} defined twice", name));
            }
            self.expect(Token::Operator(Operator::Equal))?;
            let (ops, _) = self.fragment()?;
            match fold(&ops) {
                Some(val) => self.consts.insert(name, val),
                None => return Err(error!(SyntaxError; "Constant {} is not constant", name)),
            };
            if !self.accept(&Token::Comma)? {
                return Ok(());
            }
        }
    }

    fn r#type(&mut self) -> Result<()> {
        let name = self.ident()?;
        if self.types.contains_key(&name) {
            return Err(error!(SyntaxError; "Type {} defined twice", name));
        }
        self.alloc.enter(Scope::Record);
        let mut fields = vec![];
        loop {
            self.line = self.lex.line();
            match self.lex.token().clone() {
                Token::Eol | Token::Colon => {
                    self.lex.next()?;
                }
                Token::Word(Word::Rem) => {
                    self.lex.rest_of_line()?;
                }
                Token::Word(Word::End) => {
                    self.lex.next()?;
                    self.expect_word(Word::Type)?;
                    break;
                }
                Token::Ident(field) => {
                    self.lex.next()?;
                    self.expect_word(Word::As)?;
                    let var_type = self.type_name()?;
                    let var = self
                        .alloc
                        .declare(&field, var_type.clone(), Dims::Scalar, false)?;
                    let offset = match var.place {
                        Place::Global(offset) | Place::Local(offset) => offset,
                    };
                    fields.push((field, Field { offset, var_type }));
                }
                Token::Eof => return Err(error!(SyntaxError; "Unmatched type")),
                t => return Err(error!(SyntaxError; "Unexpected \"{}\"", t)),
            }
        }
        let size = self.alloc.leave();
        log::trace!("type {} is {} bytes", name, size);
        let record = Record {
            name: name.clone(),
            fields,
            size,
        };
        self.types.insert(name, Rc::new(record));
        Ok(())
    }

    fn deftype(&mut self, ty: SimpleType) -> Result<()> {
        loop {
            let first = self.letter()?;
            let last = if self.accept(&Token::Operator(Operator::Minus))? {
                self.letter()?
            } else {
                first
            };
            match (first, last) {
                (Some(first), Some(last)) if first <= last => {
                    for slot in &mut self.deftypes[first..=last] {
                        *slot = ty;
                    }
                }
                _ => return Err(error!(SyntaxError; "Invalid variable range")),
            }
            if !self.accept(&Token::Comma)? {
                return Ok(());
            }
        }
    }

    fn letter(&mut self) -> Result<Option<usize>> {
        Ok(match self.lex.next()? {
            Token::Ident(s) if s.len() == 1 => match s.as_bytes()[0] {
                c @ b'a'..=b'z' => Some((c - b'a') as usize),
                _ => None,
            },
            _ => None,
        })
    }

    fn option(&mut self) -> Result<()> {
        match self.lex.next()? {
            Token::Word(Word::Explicit) => self.explicit = true,
            Token::Word(Word::Base) => match self.lex.next()? {
                Token::Literal(Literal::Number(n)) if n == "0" => self.option_base = 0,
                Token::Literal(Literal::Number(n)) if n == "1" => self.option_base = 1,
                t => return Err(error!(SyntaxError; "Unexpected option base \"{}\"", t)),
            },
            t => return Err(error!(SyntaxError; "Unexpected option \"{}\"", t)),
        }
        Ok(())
    }

    // *** SUB, FUNCTION and DEF FN

    fn parameters(&mut self) -> Result<Vec<Var>> {
        let mut params = vec![];
        if !self.accept(&Token::LParen)? || self.accept(&Token::RParen)? {
            return Ok(params);
        }
        loop {
            let name = self.ident()?;
            let array = if self.accept(&Token::LParen)? {
                self.expect(Token::RParen)?;
                true
            } else {
                false
            };
            let var_type = if self.accept_word(Word::As)? {
                self.type_name()?
            } else {
                VarType::Simple(self.implicit_type(&name))
            };
            let dims = if array {
                Dims::Indirect
            } else if var_type.simple().is_some() {
                Dims::Scalar
            } else {
                return Err(error!(SyntaxError; "Unexpected type for parameter {}", name));
            };
            params.push(self.alloc.declare(&name, var_type, dims, false)?);
            if !self.accept(&Token::Comma)? {
                break;
            }
        }
        self.expect(Token::RParen)?;
        Ok(params)
    }

    fn result_slot(&mut self, name: &str) -> Result<Slot> {
        let ty = if self.accept_word(Word::As)? {
            self.simple_type_name()?
        } else {
            self.implicit_type(name)
        };
        Ok(Slot {
            place: self.alloc.temp(ty),
            ty,
        })
    }

    /// Add a routine, or complete one announced by DECLARE.
    fn register(&mut self, routine: Routine) -> Result<usize> {
        match self.routine_index.get(&routine.name).copied() {
            Some(index) => {
                let existing = &self.routines[index];
                if existing.is_defined() && routine.is_defined() {
                    return Err(error!(SyntaxError; "{} defined twice", routine.name));
                }
                if existing.is_sub != routine.is_sub
                    || existing.params.len() != routine.params.len()
                {
                    return Err(error!(SyntaxError;
                        "Declaration of {} does not match", routine.name));
                }
                if routine.is_defined() {
                    self.routines[index] = routine;
                }
                Ok(index)
            }
            None => {
                let index = self.routines.len();
                self.routine_index.insert(routine.name.clone(), index);
                self.routines.push(routine);
                Ok(index)
            }
        }
    }

    fn routine(&mut self, is_sub: bool) -> Result<()> {
        if self.current.is_some() {
            return Err(error!(SyntaxError; "Nested SUB or FUNCTION"));
        }
        let name = self.ident()?;
        let skip = self.emit(Opcode::Jump(0));
        let entry = self.ops.len();
        self.alloc.enter(Scope::Routine);
        let params = self.parameters()?;
        let result = if is_sub {
            None
        } else {
            Some(self.result_slot(&name)?)
        };
        self.accept_word(Word::Static)?;
        let index = self.register(Routine {
            name,
            params,
            entry: Some(entry),
            frame_size: 0,
            is_sub,
            result,
            line: self.line,
        })?;
        self.current = Some(index);
        self.flow.push(Flow::Routine { index, skip });
        Ok(())
    }

    fn end_routine(&mut self, is_sub: bool) -> Result<()> {
        match self.flow.pop() {
            Some(Flow::Routine { index, skip }) if self.routines[index].is_sub == is_sub => {
                self.emit(Opcode::Exit(index));
                let frame_size = self.alloc.leave();
                self.routines[index].frame_size = frame_size;
                self.current = None;
                log::trace!(
                    "{} frame is {} bytes",
                    self.routines[index].name,
                    frame_size
                );
                self.patch_here(skip)
            }
            Some(flow) => Err(error!(SyntaxError; "Unmatched {}", flow.kind())),
            None if is_sub => Err(error!(SyntaxError; "END SUB without SUB")),
            None => Err(error!(SyntaxError; "END FUNCTION without FUNCTION")),
        }
    }

    fn declare(&mut self) -> Result<()> {
        let is_sub = match self.lex.next()? {
            Token::Word(Word::Sub) => true,
            Token::Word(Word::Function) => false,
            t => return Err(error!(SyntaxError; "Expected \"sub\" found \"{}\"", t)),
        };
        let name = self.ident()?;
        self.alloc.enter(Scope::Routine);
        let params = self.parameters();
        let result = match (&params, is_sub) {
            (Ok(_), false) => Some(self.result_slot(&name)),
            _ => None,
        };
        self.alloc.leave();
        let params = params?;
        let result = result.transpose()?;
        self.register(Routine {
            name,
            params,
            entry: None,
            frame_size: 0,
            is_sub,
            result,
            line: self.line,
        })?;
        Ok(())
    }

    fn def(&mut self) -> Result<()> {
        if self.current.is_some() {
            return Err(error!(SyntaxError; "DEF FN inside SUB or FUNCTION"));
        }
        let name = self.ident()?;
        if !name.starts_with("fn") {
            return Err(error!(SyntaxError; "Expected FN name found \"{}\"", name));
        }
        let skip = self.emit(Opcode::Jump(0));
        let entry = self.ops.len();
        self.alloc.enter(Scope::Routine);
        let params = self.parameters()?;
        let result = self.result_slot(&name)?;
        let index = self.register(Routine {
            name,
            params,
            entry: Some(entry),
            frame_size: 0,
            is_sub: false,
            result: Some(result),
            line: self.line,
        })?;
        self.expect(Token::Operator(Operator::Equal))?;
        self.current = Some(index);
        self.def_fn = true;
        let kind = self.expression();
        self.current = None;
        self.def_fn = false;
        if kind? != Kind::from(result.ty) {
            return Err(error!(TypeMismatch));
        }
        self.emit(Opcode::Store(result));
        self.emit(Opcode::Exit(index));
        self.routines[index].frame_size = self.alloc.leave();
        self.patch_here(skip)
    }

    fn call(&mut self) -> Result<()> {
        let name = self.ident()?;
        match self.routine_index.get(&name) {
            Some(&index) if self.routines[index].is_sub => self.call_arguments(index, true),
            _ => Err(error!(SubprogramNotDefined; "Subprogram {} not defined", name)),
        }
    }

    // *** Block structures

    fn r#if(&mut self) -> Result<()> {
        self.number()?;
        if !self.lex.token().is_word(Word::Goto) {
            self.expect_word(Word::Then)?;
        }
        let jump = self.emit(Opcode::JumpIfNot(0));
        if self.lex.token().ends_statement() {
            self.flow.push(Flow::If {
                next: Some(jump),
                ends: vec![],
            });
            return Ok(());
        }
        self.clause()?;
        if self.accept_word(Word::Else)? {
            self.program.statement(self.ops.len(), self.line);
            let end = self.emit(Opcode::Jump(0));
            self.patch_here(jump)?;
            self.clause()?;
            self.patch_here(end)
        } else {
            self.patch_here(jump)
        }
    }

    /// The THEN or ELSE part of a one line IF. A bare line number is a GOTO.
    fn clause(&mut self) -> Result<()> {
        if let Token::Literal(Literal::Number(n)) = self.lex.token() {
            let label = n.clone();
            self.lex.next()?;
            self.jump_to_label(&label, Opcode::Jump(0));
            return Ok(());
        }
        self.statement()?;
        while self.lex.token() == &Token::Colon {
            self.lex.next()?;
            if self.lex.token().is_word(Word::Else) {
                break;
            }
            self.statement()?;
        }
        Ok(())
    }

    fn r#else(&mut self) -> Result<()> {
        match self.flow.pop() {
            Some(Flow::If {
                next: Some(next),
                mut ends,
            }) => {
                ends.push(self.emit(Opcode::Jump(0)));
                self.patch_here(next)?;
                self.flow.push(Flow::If { next: None, ends });
                Ok(())
            }
            _ => Err(error!(SyntaxError; "ELSE without IF")),
        }
    }

    fn elseif(&mut self) -> Result<()> {
        match self.flow.pop() {
            Some(Flow::If {
                next: Some(next),
                mut ends,
            }) => {
                ends.push(self.emit(Opcode::Jump(0)));
                self.patch_here(next)?;
                self.number()?;
                self.expect_word(Word::Then)?;
                let next = self.emit(Opcode::JumpIfNot(0));
                self.flow.push(Flow::If {
                    next: Some(next),
                    ends,
                });
                Ok(())
            }
            _ => Err(error!(SyntaxError; "ELSEIF without IF")),
        }
    }

    fn end_if(&mut self) -> Result<()> {
        match self.flow.pop() {
            Some(Flow::If { next, ends }) => {
                if let Some(next) = next {
                    self.patch_here(next)?;
                }
                for end in ends {
                    self.patch_here(end)?;
                }
                Ok(())
            }
            _ => Err(error!(SyntaxError; "END IF without IF")),
        }
    }

    /// An optional `WHILE cond` or `UNTIL cond`. Returns whether it was WHILE.
    fn loop_test(&mut self) -> Result<Option<bool>> {
        let is_while = match self.lex.token() {
            Token::Word(Word::While) => true,
            Token::Word(Word::Until) => false,
            _ => return Ok(None),
        };
        self.lex.next()?;
        self.number()?;
        Ok(Some(is_while))
    }

    fn r#do(&mut self) -> Result<()> {
        let top = self.ops.len();
        let mut exits = vec![];
        match self.loop_test()? {
            Some(true) => exits.push(self.emit(Opcode::JumpIfNot(0))),
            Some(false) => exits.push(self.emit(Opcode::JumpIf(0))),
            None => {}
        }
        self.flow.push(Flow::Do { top, exits });
        Ok(())
    }

    fn r#loop(&mut self) -> Result<()> {
        let (top, exits) = match self.flow.pop() {
            Some(Flow::Do { top, exits }) => (top, exits),
            _ => return Err(error!(SyntaxError; "LOOP without DO")),
        };
        match self.loop_test()? {
            Some(true) => self.emit(Opcode::JumpIf(top)),
            Some(false) => self.emit(Opcode::JumpIfNot(top)),
            None => self.emit(Opcode::Jump(top)),
        };
        for exit in exits {
            self.patch_here(exit)?;
        }
        Ok(())
    }

    fn r#while(&mut self) -> Result<()> {
        let top = self.ops.len();
        self.number()?;
        let exit = self.emit(Opcode::JumpIfNot(0));
        self.flow.push(Flow::While { top, exit });
        Ok(())
    }

    fn wend(&mut self) -> Result<()> {
        match self.flow.pop() {
            Some(Flow::While { top, exit }) => {
                self.emit(Opcode::Jump(top));
                self.patch_here(exit)
            }
            _ => Err(error!(SyntaxError; "WEND without WHILE")),
        }
    }

    fn r#for(&mut self) -> Result<()> {
        let name = self.ident()?;
        let counter = match self.access(&name)? {
            Access::Slot(slot) if !slot.ty.is_string() => slot,
            _ => return Err(error!(SyntaxError; "Invalid FOR variable {}", name)),
        };
        self.expect(Token::Operator(Operator::Equal))?;
        self.number()?;
        self.emit(Opcode::Store(counter));
        self.expect_word(Word::To)?;
        let limit = self.alloc.temp(SimpleType::Double);
        self.number()?;
        self.emit(Opcode::Store(Slot {
            place: limit,
            ty: SimpleType::Double,
        }));
        let step = self.alloc.temp(SimpleType::Double);
        if self.accept_word(Word::Step)? {
            self.number()?;
        } else {
            self.emit(Opcode::Literal(Val::Integer(1)));
        }
        self.emit(Opcode::Store(Slot {
            place: step,
            ty: SimpleType::Double,
        }));
        let check = self.emit(Opcode::ForCheck {
            counter,
            limit,
            step,
            exit: 0,
        });
        self.flow.push(Flow::For {
            check,
            counter,
            step,
            exits: vec![],
        });
        Ok(())
    }

    fn next(&mut self) -> Result<()> {
        loop {
            match self.flow.pop() {
                Some(Flow::For {
                    check,
                    counter,
                    step,
                    exits,
                }) => {
                    self.emit(Opcode::ForStep {
                        counter,
                        step,
                        check,
                    });
                    self.patch_here(check)?;
                    for exit in exits {
                        self.patch_here(exit)?;
                    }
                }
                _ => return Err(error!(SyntaxError; "NEXT without FOR")),
            }
            if let Token::Ident(_) = self.lex.token() {
                self.lex.next()?;
            }
            if !self.accept(&Token::Comma)? {
                return Ok(());
            }
        }
    }

    fn exit(&mut self) -> Result<()> {
        let word = match self.lex.next()? {
            Token::Word(word) => word,
            t => return Err(error!(SyntaxError; "Unexpected \"{}\"", t)),
        };
        match word {
            Word::Do | Word::For => {
                let at = self.ops.len();
                let frame = self
                    .flow
                    .iter_mut()
                    .rev()
                    .take_while(|flow| !matches!(flow, Flow::Routine { .. }))
                    .find(|flow| match flow {
                        Flow::Do { .. } => word == Word::Do,
                        Flow::For { .. } => word == Word::For,
                        _ => false,
                    });
                match frame {
                    Some(Flow::Do { exits, .. }) | Some(Flow::For { exits, .. }) => exits.push(at),
                    _ => return Err(error!(SyntaxError; "EXIT {} outside {}", word, word)),
                }
                self.emit_statement(Opcode::Jump(0))
            }
            Word::Sub | Word::Function => match self.current {
                Some(index) if self.routines[index].is_sub == (word == Word::Sub) => {
                    self.emit_statement(Opcode::Exit(index))
                }
                _ => Err(error!(SyntaxError; "EXIT {} outside {}", word, word)),
            },
            _ => Err(error!(SyntaxError; "Unexpected \"{}\"", word)),
        }
    }

    fn select(&mut self) -> Result<()> {
        self.expect_word(Word::Case)?;
        let kind = self.expression()?;
        let ty = match kind {
            Kind::Number => SimpleType::Double,
            Kind::String => SimpleType::String,
        };
        let temp = Slot {
            place: self.alloc.temp(ty),
            ty,
        };
        self.emit(Opcode::Store(temp));
        let dispatch = self.emit(Opcode::Jump(0));
        self.flow.push(Flow::Select(Select {
            temp,
            kind,
            dispatch,
            cases: vec![],
            ends: vec![],
            otherwise: None,
        }));
        Ok(())
    }

    fn case(&mut self) -> Result<()> {
        let mut select = match self.flow.pop() {
            Some(Flow::Select(select)) => select,
            _ => return Err(error!(SyntaxError; "CASE without SELECT")),
        };
        if !select.cases.is_empty() || select.otherwise.is_some() {
            select.ends.push(self.emit(Opcode::Jump(0)));
        }
        let entry = self.ops.len();
        if self.accept_word(Word::Else)? {
            select.otherwise = Some(entry);
        } else {
            let mut tests = vec![];
            loop {
                tests.push(self.case_test(select.kind)?);
                if !self.accept(&Token::Comma)? {
                    break;
                }
            }
            select.cases.push(Case { entry, tests });
        }
        self.flow.push(Flow::Select(select));
        Ok(())
    }

    fn case_test(&mut self, kind: Kind) -> Result<Test> {
        if self.accept_word(Word::Is)? {
            let op = match self.lex.next()? {
                Token::Operator(Operator::Equal) => Opcode::Eq,
                Token::Operator(Operator::NotEqual) => Opcode::NotEq,
                Token::Operator(Operator::Less) => Opcode::Lt,
                Token::Operator(Operator::LessEqual) => Opcode::LtEq,
                Token::Operator(Operator::Greater) => Opcode::Gt,
                Token::Operator(Operator::GreaterEqual) => Opcode::GtEq,
                t => return Err(error!(SyntaxError; "Expected comparison found \"{}\"", t)),
            };
            return Ok(Test::Is(op, self.fragment_of(kind)?));
        }
        let value = self.fragment_of(kind)?;
        if self.accept_word(Word::To)? {
            Ok(Test::Range(value, self.fragment_of(kind)?))
        } else {
            Ok(Test::Value(value))
        }
    }

    /// The comparisons run after all case bodies; each case body is
    /// entered from here.
    fn end_select(&mut self) -> Result<()> {
        let select = match self.flow.pop() {
            Some(Flow::Select(select)) => select,
            _ => return Err(error!(SyntaxError; "END SELECT without SELECT")),
        };
        let mut ends = select.ends;
        ends.push(self.emit(Opcode::Jump(0)));
        self.patch_here(select.dispatch)?;
        let temp = select.temp;
        for case in select.cases {
            for test in case.tests {
                self.emit(Opcode::Load(temp));
                match test {
                    Test::Value(value) => {
                        self.ops.extend(value);
                        self.emit(Opcode::Eq);
                    }
                    Test::Range(low, high) => {
                        self.ops.extend(low);
                        self.emit(Opcode::GtEq);
                        self.emit(Opcode::Load(temp));
                        self.ops.extend(high);
                        self.emit(Opcode::LtEq);
                        self.emit(Opcode::And);
                    }
                    Test::Is(op, value) => {
                        self.ops.extend(value);
                        self.emit(op);
                    }
                }
                self.emit(Opcode::JumpIf(case.entry));
            }
        }
        let fallback = self.emit(Opcode::Jump(0));
        let end = self.ops.len();
        self.patch(fallback, select.otherwise.unwrap_or(end))?;
        for at in ends {
            self.patch(at, end)?;
        }
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        let word = match self.lex.token() {
            Token::Word(word) => *word,
            _ => return self.emit_statement(Opcode::End),
        };
        match word {
            Word::If => {
                self.lex.next()?;
                self.end_if()
            }
            Word::Select => {
                self.lex.next()?;
                self.end_select()
            }
            Word::Sub | Word::Function => {
                self.lex.next()?;
                self.end_routine(word == Word::Sub)
            }
            Word::Type => Err(error!(SyntaxError; "END TYPE without TYPE")),
            _ => self.emit_statement(Opcode::End),
        }
    }

    // *** Branches and errors

    fn goto(&mut self) -> Result<()> {
        let label = self.label_name()?;
        self.jump_to_label(&label, Opcode::Jump(0));
        Ok(())
    }

    fn gosub(&mut self) -> Result<()> {
        let label = self.label_name()?;
        self.jump_to_label(&label, Opcode::Gosub(0));
        Ok(())
    }

    fn r#return(&mut self) -> Result<()> {
        let routine = self.current;
        self.emit_statement(Opcode::Return(routine))
    }

    fn on(&mut self) -> Result<()> {
        if self.accept_word(Word::Error)? {
            if self.accept_word(Word::Resume)? {
                self.expect_word(Word::Next)?;
                return self.emit_statement(Opcode::OnError(Handler::ResumeNext));
            }
            self.expect_word(Word::Goto)?;
            let label = self.label_name()?;
            if label == "0" {
                self.emit(Opcode::OnError(Handler::Fatal));
            } else {
                self.jump_to_label(&label, Opcode::OnError(Handler::Goto(0)));
            }
            return Ok(());
        }
        self.number()?;
        let gosub = match self.lex.next()? {
            Token::Word(Word::Goto) => false,
            Token::Word(Word::Gosub) => true,
            t => return Err(error!(SyntaxError; "Expected \"goto\" found \"{}\"", t)),
        };
        let mut labels = vec![];
        loop {
            labels.push(self.label_name()?);
            if !self.accept(&Token::Comma)? {
                break;
            }
        }
        let targets = vec![None; labels.len()];
        let at = self.emit(if gosub {
            Opcode::OnGosub(targets)
        } else {
            Opcode::OnGoto(targets)
        });
        for (slot, label) in labels.iter().enumerate() {
            self.link.link_slot_to_label(at, slot, label, self.line);
        }
        Ok(())
    }

    fn error(&mut self) -> Result<()> {
        self.number()?;
        self.emit_statement(Opcode::Raise)
    }

    fn resume(&mut self) -> Result<()> {
        if self.at_end() {
            return self.emit_statement(Opcode::Resume(Resume::Next));
        }
        if self.accept_word(Word::Next)? {
            return self.emit_statement(Opcode::Resume(Resume::Next));
        }
        let label = self.label_name()?;
        if label == "0" {
            return self.emit_statement(Opcode::Resume(Resume::Retry));
        }
        self.jump_to_label(&label, Opcode::Resume(Resume::Label(0)));
        Ok(())
    }

    // *** DATA

    fn data(&mut self) -> Result<()> {
        let text = self.lex.rest_of_line()?;
        for item in split_data(text)? {
            self.data.push(item.into());
        }
        Ok(())
    }

    fn read(&mut self) -> Result<()> {
        loop {
            let name = self.ident()?;
            let target = self.access(&name)?;
            self.emit(Opcode::Read(target.ty()));
            self.store(target);
            if !self.accept(&Token::Comma)? {
                return Ok(());
            }
        }
    }

    fn restore(&mut self) -> Result<()> {
        if self.at_end() {
            return self.emit_statement(Opcode::Restore(0));
        }
        let label = self.label_name()?;
        self.jump_to_label(&label, Opcode::Restore(0));
        Ok(())
    }

    // *** Console

    fn print(&mut self) -> Result<()> {
        let using = self.accept_word(Word::Using)?;
        if using {
            if self.expression()? != Kind::String {
                return Err(error!(TypeMismatch));
            }
            self.expect(Token::Semicolon)?;
            self.emit(Opcode::Using);
        }
        let mut newline = true;
        while !self.at_end() {
            if self.accept(&Token::Semicolon)? {
                newline = false;
                continue;
            }
            if self.accept(&Token::Comma)? {
                if !using {
                    self.emit(Opcode::PrintComma);
                }
                newline = false;
                continue;
            }
            self.expression()?;
            self.emit(if using {
                Opcode::UsingVal
            } else {
                Opcode::Print
            });
            newline = true;
        }
        if using {
            self.emit(Opcode::UsingEnd);
        }
        if newline {
            self.emit(Opcode::PrintNewline);
        }
        Ok(())
    }

    /// A literal prompt followed by `;` or `,`. Returns the prompt and
    /// whether the question mark is shown.
    fn prompt(&mut self) -> Result<(Rc<str>, bool)> {
        let prompt = match self.lex.token() {
            Token::Literal(Literal::String(s)) => s.clone(),
            _ => return Ok(("".into(), true)),
        };
        self.lex.next()?;
        match self.lex.next()? {
            Token::Semicolon => Ok((prompt.into(), true)),
            Token::Comma => Ok((prompt.into(), false)),
            t => Err(error!(SyntaxError; "Expected \";\" found \"{}\"", t)),
        }
    }

    fn input(&mut self) -> Result<()> {
        let (prompt, question) = self.prompt()?;
        self.emit(Opcode::Input { prompt, question });
        loop {
            let name = self.ident()?;
            let target = self.access(&name)?;
            self.emit(Opcode::InputField(target.ty()));
            self.store(target);
            if !self.accept(&Token::Comma)? {
                return Ok(());
            }
        }
    }

    fn line_input(&mut self) -> Result<()> {
        let (prompt, _) = self.prompt()?;
        self.emit(Opcode::LineInput(prompt));
        let name = self.ident()?;
        let target = self.access(&name)?;
        if target.kind() != Kind::String {
            return Err(error!(TypeMismatch));
        }
        self.emit(Opcode::InputField(SimpleType::String));
        self.store(target);
        Ok(())
    }

    fn sleep(&mut self) -> Result<()> {
        if self.at_end() {
            self.emit(Opcode::Literal(Val::Integer(0)));
        } else {
            self.number()?;
        }
        self.emit_statement(Opcode::Sleep)
    }

    fn randomize(&mut self) -> Result<()> {
        if self.at_end() {
            self.emit(Opcode::Fn(Function::Timer, 0));
        } else {
            self.number()?;
        }
        self.emit_statement(Opcode::Randomize)
    }

    // *** Graphics and screen

    fn bind(&mut self, binding: Binding) -> Result<()> {
        self.emit_statement(Opcode::Bind(binding))
    }

    /// A numeric argument that may be left out, compiled as -1 when absent.
    fn optional(&mut self) -> Result<()> {
        if self.at_end() || self.lex.token() == &Token::Comma {
            self.emit(Opcode::Literal(Val::Integer(-1)));
            Ok(())
        } else {
            self.number()
        }
    }

    /// Further optional arguments are evaluated and discarded.
    fn ignored(&mut self) -> Result<()> {
        while self.accept(&Token::Comma)? {
            if !self.at_end() && self.lex.token() != &Token::Comma {
                self.number()?;
                self.emit(Opcode::Pop);
            }
        }
        Ok(())
    }

    fn point(&mut self) -> Result<()> {
        self.expect(Token::LParen)?;
        self.number()?;
        self.expect(Token::Comma)?;
        self.number()?;
        self.expect(Token::RParen)
    }

    fn line(&mut self) -> Result<()> {
        if self.accept_word(Word::Input)? {
            return self.line_input();
        }
        self.point()?;
        self.expect(Token::Operator(Operator::Minus))?;
        self.point()?;
        let mut fill = LineFill::Line;
        if self.accept(&Token::Comma)? {
            self.optional()?;
            if self.accept(&Token::Comma)? {
                fill = match self.lex.next()? {
                    Token::Ident(s) if s == "b" => LineFill::Box,
                    Token::Ident(s) if s == "bf" => LineFill::FilledBox,
                    t => return Err(error!(SyntaxError; "Unexpected \"{}\"", t)),
                };
            }
        } else {
            self.emit(Opcode::Literal(Val::Integer(-1)));
        }
        self.bind(Binding::Line(fill))
    }

    fn circle(&mut self) -> Result<()> {
        self.point()?;
        self.expect(Token::Comma)?;
        self.number()?;
        let defaults = [
            Val::Integer(-1),
            Val::Integer(0),
            Val::Double(2.0 * std::f64::consts::PI),
            Val::Integer(1),
        ];
        let mut given = 0;
        while given < defaults.len() && self.accept(&Token::Comma)? {
            if self.at_end() || self.lex.token() == &Token::Comma {
                self.emit(Opcode::Literal(defaults[given].clone()));
            } else {
                self.number()?;
            }
            given += 1;
        }
        for val in &defaults[given..] {
            self.emit(Opcode::Literal(val.clone()));
        }
        let mut fill = false;
        if given == defaults.len() && self.accept(&Token::Comma)? {
            match self.lex.next()? {
                Token::Ident(s) if s == "f" => fill = true,
                t => return Err(error!(SyntaxError; "Unexpected \"{}\"", t)),
            }
        }
        self.bind(Binding::Circle { fill })
    }

    fn pset(&mut self) -> Result<()> {
        self.point()?;
        if self.accept(&Token::Comma)? {
            self.optional()?;
        } else {
            self.emit(Opcode::Literal(Val::Integer(-1)));
        }
        self.bind(Binding::Pset)
    }

    fn paint(&mut self) -> Result<()> {
        self.point()?;
        for _ in 0..2 {
            if self.accept(&Token::Comma)? {
                self.optional()?;
            } else {
                self.emit(Opcode::Literal(Val::Integer(-1)));
            }
        }
        self.bind(Binding::Paint)
    }

    fn draw(&mut self) -> Result<()> {
        if self.expression()? != Kind::String {
            return Err(error!(TypeMismatch));
        }
        self.bind(Binding::Draw)
    }

    fn cls(&mut self) -> Result<()> {
        self.optional()?;
        self.bind(Binding::Cls)
    }

    fn color(&mut self) -> Result<()> {
        self.two_optional()?;
        self.ignored()?;
        self.bind(Binding::Color)
    }

    fn locate(&mut self) -> Result<()> {
        self.two_optional()?;
        self.ignored()?;
        self.bind(Binding::Locate)
    }

    fn two_optional(&mut self) -> Result<()> {
        self.optional()?;
        if self.accept(&Token::Comma)? {
            self.optional()
        } else {
            self.emit(Opcode::Literal(Val::Integer(-1)));
            Ok(())
        }
    }

    fn screen(&mut self) -> Result<()> {
        self.number()?;
        self.ignored()?;
        self.bind(Binding::Screen)
    }

    fn width(&mut self) -> Result<()> {
        self.number()?;
        self.ignored()?;
        self.bind(Binding::Width)
    }

    /// `GETMOUSE x, y[, wheel[, buttons[, clip]]]`
    fn getmouse(&mut self) -> Result<()> {
        self.emit(Opcode::Yield);
        for field in 0..5 {
            if field > 0 && !self.accept(&Token::Comma)? {
                break;
            }
            if field >= 2 && (self.at_end() || self.lex.token() == &Token::Comma) {
                continue;
            }
            let name = self.ident()?;
            let target = self.access(&name)?;
            if target.kind() != Kind::Number {
                return Err(error!(TypeMismatch));
            }
            self.emit(Opcode::Mouse(field));
            self.store(target);
        }
        Ok(())
    }
}

fn dims_len(dims: Dims) -> usize {
    match dims {
        Dims::Array(n) => n,
        Dims::Scalar | Dims::Indirect => 0,
    }
}

/// Split the text of a DATA statement into items. Unquoted items are
/// trimmed; quoted items keep their spaces and commas.
pub fn split_data(text: &str) -> Result<Vec<String>> {
    let mut items = vec![];
    let mut rest = text;
    loop {
        let trimmed = rest.trim_start();
        if let Some(body) = trimmed.strip_prefix('"') {
            let (item, after) = match body.find('"') {
                Some(end) => (&body[..end], &body[end + 1..]),
                None => (body, ""),
            };
            items.push(item.to_string());
            let after = after.trim_start();
            if after.is_empty() {
                return Ok(items);
            }
            match after.strip_prefix(',') {
                Some(next) => rest = next,
                None => {
                    return Err(error!(SyntaxError;
                        "Data statement extra text: \"{}\"", after.trim_end()))
                }
            }
        } else {
            match trimmed.find(',') {
                Some(comma) => {
                    items.push(trimmed[..comma].trim().to_string());
                    rest = &trimmed[comma + 1..];
                }
                None => {
                    items.push(trimmed.trim().to_string());
                    return Ok(items);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_data() {
        assert_eq!(
            split_data(" this is   , a   test, \" of , strings \"").unwrap(),
            vec!["this is", "a   test", " of , strings "]
        );
        assert_eq!(split_data("   that's it").unwrap(), vec!["that's it"]);
        let e = split_data("\"a\" b").unwrap_err();
        assert_eq!(e.to_string(), "Data statement extra text: \"b\"");
    }

    #[test]
    fn test_for_loop_shape() {
        let program = compile("FOR i = 1 TO 3\nNEXT i\n").unwrap();
        let check = program
            .ops
            .iter()
            .position(|op| matches!(op, Opcode::ForCheck { .. }))
            .unwrap();
        match (&program.ops[check], &program.ops[check + 1]) {
            (Opcode::ForCheck { exit, .. }, Opcode::ForStep { check: back, .. }) => {
                assert_eq!(*exit, check + 2);
                assert_eq!(*back, check);
            }
            ops => panic!("{:?}", ops),
        }
    }

    #[test]
    fn test_constant_folding() {
        let program = compile("CONST foo = 314159 * 2\nPRINT foo\n").unwrap();
        assert_eq!(program.ops[0], Opcode::Literal(Val::Integer(628318)));
    }

    #[test]
    fn test_error_lines() {
        let e = compile("x = 1\nDEFSTR Z-A\n").unwrap_err();
        assert_eq!(e.to_string(), "Invalid variable range at line 2");
        let e = compile("PRINT 1\nDIM a(2), b(1,1,1,1,1,1,1,1,1)\nPRINT 2\n").unwrap_err();
        assert_eq!(e.to_string(), "Too many array dimensions at line 2");
        let e = compile("PRINT (1\n").unwrap_err();
        assert_eq!(e.code(), 2);
    }

    #[test]
    fn test_unmatched_blocks() {
        assert_eq!(
            compile("FOR i = 1 TO 2\n").unwrap_err().to_string(),
            "Unmatched for at line 2"
        );
        assert_eq!(
            compile("PRINT 1\nWEND").unwrap_err().to_string(),
            "WEND without WHILE at line 2"
        );
    }

    #[test]
    fn test_unsupported_statement() {
        let e = compile("OPEN \"x\" FOR INPUT AS 1\n").unwrap_err();
        assert_eq!(e.code(), 73);
        assert_eq!(e.to_string(), "OPEN is not supported at line 1");
    }
}
