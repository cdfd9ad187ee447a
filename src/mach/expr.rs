use super::alloc::{Dims, Place, SimpleType, Var, VarType};
use super::compile::Compiler;
use super::opcode::{Opcode, Slot};
use super::{Function, Operation, Val};
use crate::error;
use crate::lang::{Error, Literal, Operator, Token};

type Result<T> = std::result::Result<T, Error>;

/// Static type of a compiled expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Kind {
    Number,
    String,
}

impl From<SimpleType> for Kind {
    fn from(ty: SimpleType) -> Self {
        if ty.is_string() {
            Kind::String
        } else {
            Kind::Number
        }
    }
}

impl From<&Val> for Kind {
    fn from(val: &Val) -> Self {
        if val.is_string() {
            Kind::String
        } else {
            Kind::Number
        }
    }
}

/// Where an assignable value lives once its access chain is compiled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Access {
    /// A slot known at compile time.
    Slot(Slot),
    /// The address is left on the operand stack.
    Dynamic(SimpleType),
}

impl Access {
    pub fn ty(self) -> SimpleType {
        match self {
            Access::Slot(slot) => slot.ty,
            Access::Dynamic(ty) => ty,
        }
    }

    pub fn kind(self) -> Kind {
        Kind::from(self.ty())
    }
}

enum Base {
    Static(Place),
    Dynamic,
}

fn relational(op: Operator) -> Option<Opcode> {
    Some(match op {
        Operator::Equal => Opcode::Eq,
        Operator::NotEqual => Opcode::NotEq,
        Operator::Less => Opcode::Lt,
        Operator::LessEqual => Opcode::LtEq,
        Operator::Greater => Opcode::Gt,
        Operator::GreaterEqual => Opcode::GtEq,
        _ => return None,
    })
}

/// The opcode for the arithmetic of a compound assignment like `+=`.
pub fn compound(op: Operator) -> Option<Opcode> {
    Some(match op {
        Operator::Plus => Opcode::Add,
        Operator::Minus => Opcode::Sub,
        Operator::Multiply => Opcode::Mul,
        Operator::Divide => Opcode::Div,
        Operator::DivideInt => Opcode::DivInt,
        Operator::Caret => Opcode::Pow,
        _ => return None,
    })
}

/// Evaluate a fragment made only of literals, operators and pure functions.
pub fn fold(ops: &[Opcode]) -> Option<Val> {
    let mut stack: Vec<Val> = vec![];
    for op in ops {
        let result = match op {
            Opcode::Literal(val) => Ok(val.clone()),
            Opcode::Neg => Operation::negate(stack.pop()?),
            Opcode::Not => Operation::not(stack.pop()?),
            Opcode::Fn(func, argc) if func.is_pure() => {
                let at = stack.len().checked_sub(*argc)?;
                func.call(stack.split_off(at))
            }
            op => {
                let rhs = stack.pop()?;
                let lhs = stack.pop()?;
                match op {
                    Opcode::Pow => Operation::power(lhs, rhs),
                    Opcode::Mul => Operation::multiply(lhs, rhs),
                    Opcode::Div => Operation::divide(lhs, rhs),
                    Opcode::DivInt => Operation::divide_int(lhs, rhs),
                    Opcode::Mod => Operation::modulo(lhs, rhs),
                    Opcode::Add => Operation::sum(lhs, rhs),
                    Opcode::Sub => Operation::subtract(lhs, rhs),
                    Opcode::Eq => Operation::equal(lhs, rhs),
                    Opcode::NotEq => Operation::not_equal(lhs, rhs),
                    Opcode::Lt => Operation::less(lhs, rhs),
                    Opcode::LtEq => Operation::less_equal(lhs, rhs),
                    Opcode::Gt => Operation::greater(lhs, rhs),
                    Opcode::GtEq => Operation::greater_equal(lhs, rhs),
                    Opcode::And => Operation::and(lhs, rhs),
                    Opcode::Or => Operation::or(lhs, rhs),
                    Opcode::Xor => Operation::xor(lhs, rhs),
                    _ => return None,
                }
            }
        };
        stack.push(result.ok()?);
    }
    match stack.len() {
        1 => stack.pop(),
        _ => None,
    }
}

/// ## Expressions
///
/// Recursive descent from the loosest binding level down to factors.
/// Every level returns the kind of value it leaves on the operand stack.

impl<'a> Compiler<'a> {
    pub(super) fn expression(&mut self) -> Result<Kind> {
        let mut kind = self.conjunction()?;
        loop {
            let op = match self.lex.token() {
                Token::Operator(Operator::Or) => Opcode::Or,
                Token::Operator(Operator::Xor) => Opcode::Xor,
                _ => return Ok(kind),
            };
            self.lex.next()?;
            let rhs = self.conjunction()?;
            kind = self.binary(op, kind, rhs)?;
        }
    }

    /// An expression that must be numeric.
    pub(super) fn number(&mut self) -> Result<()> {
        match self.expression()? {
            Kind::Number => Ok(()),
            Kind::String => Err(error!(TypeMismatch)),
        }
    }

    fn conjunction(&mut self) -> Result<Kind> {
        let mut kind = self.negation()?;
        while self.lex.token() == &Token::Operator(Operator::And) {
            self.lex.next()?;
            let rhs = self.negation()?;
            kind = self.binary(Opcode::And, kind, rhs)?;
        }
        Ok(kind)
    }

    fn negation(&mut self) -> Result<Kind> {
        if self.lex.token() != &Token::Operator(Operator::Not) {
            return self.comparison();
        }
        self.lex.next()?;
        if self.negation()? != Kind::Number {
            return Err(error!(TypeMismatch));
        }
        self.emit(Opcode::Not);
        Ok(Kind::Number)
    }

    fn comparison(&mut self) -> Result<Kind> {
        let mut kind = self.additive()?;
        loop {
            let op = match self.lex.token() {
                Token::Operator(op) => match relational(*op) {
                    Some(op) => op,
                    None => return Ok(kind),
                },
                _ => return Ok(kind),
            };
            self.lex.next()?;
            let rhs = self.additive()?;
            kind = self.binary(op, kind, rhs)?;
        }
    }

    fn additive(&mut self) -> Result<Kind> {
        let mut kind = self.modulus()?;
        loop {
            let op = match self.lex.token() {
                Token::Operator(Operator::Plus) => Opcode::Add,
                Token::Operator(Operator::Minus) => Opcode::Sub,
                _ => return Ok(kind),
            };
            self.lex.next()?;
            let rhs = self.modulus()?;
            kind = self.binary(op, kind, rhs)?;
        }
    }

    fn modulus(&mut self) -> Result<Kind> {
        let mut kind = self.int_division()?;
        while self.lex.token() == &Token::Operator(Operator::Mod) {
            self.lex.next()?;
            let rhs = self.int_division()?;
            kind = self.binary(Opcode::Mod, kind, rhs)?;
        }
        Ok(kind)
    }

    fn int_division(&mut self) -> Result<Kind> {
        let mut kind = self.multiplicative()?;
        while self.lex.token() == &Token::Operator(Operator::DivideInt) {
            self.lex.next()?;
            let rhs = self.multiplicative()?;
            kind = self.binary(Opcode::DivInt, kind, rhs)?;
        }
        Ok(kind)
    }

    fn multiplicative(&mut self) -> Result<Kind> {
        let mut kind = self.unary()?;
        loop {
            let op = match self.lex.token() {
                Token::Operator(Operator::Multiply) => Opcode::Mul,
                Token::Operator(Operator::Divide) => Opcode::Div,
                _ => return Ok(kind),
            };
            self.lex.next()?;
            let rhs = self.unary()?;
            kind = self.binary(op, kind, rhs)?;
        }
    }

    /// Leading signs bind looser than `^`, so `-2^4` is -16.
    fn unary(&mut self) -> Result<Kind> {
        let mut signs = 0;
        let mut negative = false;
        loop {
            match self.lex.token() {
                Token::Operator(Operator::Minus) => negative = !negative,
                Token::Operator(Operator::Plus) => {}
                _ => break,
            }
            signs += 1;
            self.lex.next()?;
        }
        let kind = self.power()?;
        if signs > 0 && kind != Kind::Number {
            return Err(error!(TypeMismatch));
        }
        if negative {
            self.emit(Opcode::Neg);
        }
        Ok(kind)
    }

    fn power(&mut self) -> Result<Kind> {
        let mut kind = self.factor()?;
        while self.lex.token() == &Token::Operator(Operator::Caret) {
            self.lex.next()?;
            let rhs = match self.lex.token() {
                Token::Operator(Operator::Minus) | Token::Operator(Operator::Plus) => {
                    self.unary()?
                }
                _ => self.factor()?,
            };
            kind = self.binary(Opcode::Pow, kind, rhs)?;
        }
        Ok(kind)
    }

    fn binary(&mut self, op: Opcode, lhs: Kind, rhs: Kind) -> Result<Kind> {
        if lhs != rhs {
            return Err(error!(TypeMismatch));
        }
        let is_relational = matches!(
            op,
            Opcode::Eq | Opcode::NotEq | Opcode::Lt | Opcode::LtEq | Opcode::Gt | Opcode::GtEq
        );
        let kind = match lhs {
            Kind::String if is_relational => Kind::Number,
            Kind::String if op == Opcode::Add => Kind::String,
            Kind::String => return Err(error!(TypeMismatch)),
            Kind::Number => Kind::Number,
        };
        self.emit(op);
        Ok(kind)
    }

    fn factor(&mut self) -> Result<Kind> {
        match self.lex.next()? {
            Token::LParen => {
                let kind = self.expression()?;
                self.expect(Token::RParen)?;
                Ok(kind)
            }
            Token::Literal(Literal::Number(s)) => {
                self.emit(Opcode::Literal(Val::from_literal(&s)?));
                Ok(Kind::Number)
            }
            Token::Literal(Literal::String(s)) => {
                self.emit(Opcode::Literal(Val::from(s)));
                Ok(Kind::String)
            }
            Token::Ident(name) => self.identifier(name),
            t => Err(error!(SyntaxError; "Expected expression found \"{}\"", t)),
        }
    }

    fn identifier(&mut self, name: String) -> Result<Kind> {
        match name.as_str() {
            "varptr" => return self.varptr(),
            "lbound" => return self.bound(false),
            "ubound" => return self.bound(true),
            _ => {}
        }
        if let Some((func, arity)) = Function::function_and_arity(&name) {
            let argc = self.builtin_arguments()?;
            if !arity.contains(&argc) {
                return Err(error!(SyntaxError; "Wrong number of arguments to {}", name));
            }
            self.emit(Opcode::Fn(func, argc));
            return Ok(if func.returns_string() {
                Kind::String
            } else {
                Kind::Number
            });
        }
        if let Some(val) = self.consts.get(&name) {
            let kind = Kind::from(val);
            let op = Opcode::Literal(val.clone());
            self.emit(op);
            return Ok(kind);
        }
        if let Some(&index) = self.routine_index.get(&name) {
            if !self.routines[index].is_sub {
                self.call_arguments(index, true)?;
                return match self.routines[index].result {
                    Some(slot) => Ok(Kind::from(slot.ty)),
                    None => Err(error!(InternalError; "FUNCTION WITHOUT RESULT")),
                };
            }
        }
        let access = self.access(&name)?;
        self.load(access);
        Ok(access.kind())
    }

    fn builtin_arguments(&mut self) -> Result<usize> {
        if !self.accept(&Token::LParen)? {
            return Ok(0);
        }
        let mut argc = 0;
        if !self.accept(&Token::RParen)? {
            loop {
                self.expression()?;
                argc += 1;
                if !self.accept(&Token::Comma)? {
                    break;
                }
            }
            self.expect(Token::RParen)?;
        }
        Ok(argc)
    }

    /// Arguments to a SUB or FUNCTION followed by the call. With
    /// `delimited` the list may be wrapped in parentheses, otherwise it
    /// runs to the end of the statement.
    pub(super) fn call_arguments(&mut self, index: usize, delimited: bool) -> Result<()> {
        let params: Vec<Var> = self.routines[index].params.clone();
        let parens = delimited && self.accept(&Token::LParen)?;
        let any = if parens {
            self.lex.token() != &Token::RParen
        } else {
            !delimited && !self.at_end()
        };
        let mut count = 0;
        if any {
            loop {
                match params.get(count) {
                    Some(param) if param.dims == Dims::Indirect => self.array_argument()?,
                    Some(param) => {
                        let kind = self.expression()?;
                        if param.var_type.simple().map(Kind::from) != Some(kind) {
                            return Err(error!(TypeMismatch));
                        }
                    }
                    None => {
                        self.expression()?;
                    }
                }
                count += 1;
                if !self.accept(&Token::Comma)? {
                    break;
                }
            }
        }
        if parens {
            self.expect(Token::RParen)?;
        }
        if count != params.len() {
            return Err(error!(SyntaxError;
                "Wrong number of arguments to {}", self.routines[index].name));
        }
        self.emit(Opcode::Call(index));
        Ok(())
    }

    /// An array passed by reference: `name` or `name()`.
    fn array_argument(&mut self) -> Result<()> {
        let name = self.ident()?;
        if self.accept(&Token::LParen)? {
            self.expect(Token::RParen)?;
        }
        match self.lookup(&name) {
            Some(var) => self.dope_address(&var),
            None => Err(error!(TypeMismatch; "Array {} not declared", name)),
        }
    }

    fn dope_address(&mut self, var: &Var) -> Result<()> {
        match var.dims {
            Dims::Array(_) => self.emit(Opcode::Address(var.place)),
            Dims::Indirect => self.emit(Opcode::Deref(var.place)),
            Dims::Scalar => return Err(error!(TypeMismatch)),
        };
        Ok(())
    }

    fn subscripts(&mut self) -> Result<usize> {
        self.expect(Token::LParen)?;
        let mut dims = 0;
        loop {
            self.number()?;
            dims += 1;
            if !self.accept(&Token::Comma)? {
                break;
            }
        }
        self.expect(Token::RParen)?;
        Ok(dims)
    }

    /// Visible variable: the current frame, then globals when shared or
    /// when compiling a `DEF FN`.
    pub(super) fn lookup(&self, name: &str) -> Option<Var> {
        if let Some(var) = self.alloc.local(name) {
            return Some(var.clone());
        }
        match self.alloc.global(name) {
            Some(var) if var.shared || self.def_fn => Some(var.clone()),
            _ => None,
        }
    }

    /// Compile the access chain of a variable, array element or record
    /// field. Undeclared names are declared unless OPTION EXPLICIT.
    pub(super) fn access(&mut self, name: &str) -> Result<Access> {
        let (mut var_type, mut base) = match self.lookup(name) {
            Some(var) if var.is_array() => {
                self.dope_address(&var)?;
                let dims = self.subscripts()?;
                if let Dims::Array(n) = var.dims {
                    if n != dims {
                        return Err(error!(SubscriptOutOfRange;
                            "Wrong number of subscripts for {}", name));
                    }
                }
                self.emit(Opcode::Element {
                    dims,
                    size: var.var_type.size(),
                    auto: None,
                });
                (var.var_type, Base::Dynamic)
            }
            Some(var) => (var.var_type, Base::Static(var.place)),
            None => {
                if self.explicit {
                    return Err(error!(SyntaxError; "Undeclared variable {}", name));
                }
                let var_type = VarType::Simple(self.implicit_type(name));
                if self.lex.token() == &Token::LParen {
                    let at = self.emit(Opcode::Pop);
                    let dims = self.subscripts()?;
                    let var = self
                        .alloc
                        .declare(name, var_type.clone(), Dims::Array(dims), false)?;
                    self.ops[at] = Opcode::Address(var.place);
                    self.emit(Opcode::Element {
                        dims,
                        size: var_type.size(),
                        auto: Some(self.option_base),
                    });
                    (var_type, Base::Dynamic)
                } else {
                    let var = self.alloc.declare(name, var_type, Dims::Scalar, false)?;
                    (var.var_type, Base::Static(var.place))
                }
            }
        };
        while self.lex.token() == &Token::Dot {
            let record = match &var_type {
                VarType::Record(record) => record.clone(),
                VarType::Simple(_) => return Err(error!(SyntaxError; "Not a struct type")),
            };
            self.lex.next()?;
            let field = match self.lex.token() {
                Token::Ident(field) => record.field(field),
                _ => None,
            };
            let (offset, field_type) = match field {
                Some(field) => (field.offset, field.var_type.clone()),
                None => return Err(error!(SyntaxError; "Invalid field name")),
            };
            self.lex.next()?;
            var_type = field_type;
            base = match base {
                Base::Static(place) => Base::Static(place.offset(offset)),
                Base::Dynamic => {
                    if offset > 0 {
                        self.emit(Opcode::Offset(offset));
                    }
                    Base::Dynamic
                }
            };
        }
        let ty = match var_type {
            VarType::Simple(ty) => ty,
            VarType::Record(_) => return Err(error!(TypeMismatch)),
        };
        Ok(match base {
            Base::Static(place) => Access::Slot(Slot { place, ty }),
            Base::Dynamic => Access::Dynamic(ty),
        })
    }

    pub(super) fn load(&mut self, access: Access) {
        match access {
            Access::Slot(slot) => self.emit(Opcode::Load(slot)),
            Access::Dynamic(ty) => self.emit(Opcode::LoadAt(ty)),
        };
    }

    pub(super) fn store(&mut self, access: Access) {
        match access {
            Access::Slot(slot) => self.emit(Opcode::Store(slot)),
            Access::Dynamic(ty) => self.emit(Opcode::StoreAt(ty)),
        };
    }

    /// Leave the address of a variable or element on the stack.
    pub(super) fn address_of(&mut self, name: &str) -> Result<SimpleType> {
        match self.access(name)? {
            Access::Slot(slot) => {
                self.emit(Opcode::Address(slot.place));
                Ok(slot.ty)
            }
            Access::Dynamic(ty) => Ok(ty),
        }
    }

    /// `VARPTR(a)` of an array name is its dope vector.
    fn varptr(&mut self) -> Result<Kind> {
        self.expect(Token::LParen)?;
        let name = self.ident()?;
        match self.lookup(&name) {
            Some(var) if var.is_array() && self.lex.token() != &Token::LParen => {
                self.dope_address(&var)?
            }
            _ => {
                self.address_of(&name)?;
            }
        }
        self.expect(Token::RParen)?;
        Ok(Kind::Number)
    }

    fn bound(&mut self, upper: bool) -> Result<Kind> {
        self.expect(Token::LParen)?;
        let name = self.ident()?;
        match self.lookup(&name) {
            Some(var) if var.is_array() => self.dope_address(&var)?,
            _ => return Err(error!(TypeMismatch; "Array {} not declared", name)),
        }
        if self.accept(&Token::Comma)? {
            self.number()?;
        } else {
            self.emit(Opcode::Literal(Val::Integer(1)));
        }
        self.expect(Token::RParen)?;
        self.emit(Opcode::Bound { upper });
        Ok(Kind::Number)
    }

    pub(super) fn implicit_type(&self, name: &str) -> SimpleType {
        SimpleType::from_suffix(name).unwrap_or_else(|| {
            let first = name.bytes().next().unwrap_or(b'a');
            match first {
                b'a'..=b'z' => self.deftypes[(first - b'a') as usize],
                _ => SimpleType::Single,
            }
        })
    }
}
