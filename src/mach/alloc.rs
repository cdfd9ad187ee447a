use crate::error;
use crate::lang::Error;
use std::collections::HashMap;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// Most dimensions an array may declare.
pub const MAX_DIMENSIONS: usize = 8;

/// Bytes in a call stack or dope vector cell.
pub const CELL: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleType {
    Byte,
    Integer,
    Long,
    Single,
    Double,
    String,
}

impl SimpleType {
    /// Strings occupy a handle slot; their text lives in the string table.
    pub fn size(self) -> usize {
        use SimpleType::*;
        match self {
            Byte => 1,
            Integer => 2,
            Long | Single | String => 4,
            Double => 8,
        }
    }

    pub fn from_suffix(name: &str) -> Option<SimpleType> {
        match name.chars().last() {
            Some('$') => Some(SimpleType::String),
            Some('%') => Some(SimpleType::Integer),
            Some('&') => Some(SimpleType::Long),
            Some('!') => Some(SimpleType::Single),
            Some('#') => Some(SimpleType::Double),
            _ => None,
        }
    }

    pub fn is_string(self) -> bool {
        self == SimpleType::String
    }
}

impl std::fmt::Display for SimpleType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use SimpleType::*;
        let s = match self {
            Byte => "BYTE",
            Integer => "INTEGER",
            Long => "LONG",
            Single => "SINGLE",
            Double => "DOUBLE",
            String => "STRING",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, PartialEq)]
pub struct Field {
    pub offset: usize,
    pub var_type: VarType,
}

/// A `TYPE` definition. Field offsets are relative to the record base.
#[derive(Debug, PartialEq)]
pub struct Record {
    pub name: String,
    pub fields: Vec<(String, Field)>,
    pub size: usize,
}

impl Record {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|(field_name, _)| field_name == name)
            .map(|(_, field)| field)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VarType {
    Simple(SimpleType),
    Record(Rc<Record>),
}

impl VarType {
    pub fn size(&self) -> usize {
        match self {
            VarType::Simple(ty) => ty.size(),
            VarType::Record(record) => record.size,
        }
    }

    pub fn simple(&self) -> Option<SimpleType> {
        match self {
            VarType::Simple(ty) => Some(*ty),
            VarType::Record(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dims {
    Scalar,
    /// Array parameter: the slot holds the address of the caller's dope vector.
    Indirect,
    Array(usize),
}

/// Location of a slot: absolute, or relative to the frame pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Place {
    Global(usize),
    Local(usize),
}

impl Place {
    pub fn offset(self, n: usize) -> Place {
        match self {
            Place::Global(addr) => Place::Global(addr + n),
            Place::Local(addr) => Place::Local(addr + n),
        }
    }
}

impl std::fmt::Display for Place {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Place::Global(addr) => write!(f, "{}", addr),
            Place::Local(addr) => write!(f, "BP+{}", addr),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Var {
    pub place: Place,
    pub var_type: VarType,
    pub dims: Dims,
    pub shared: bool,
}

impl Var {
    pub fn is_array(&self) -> bool {
        self.dims != Dims::Scalar
    }
}

pub fn dope_size(dims: usize) -> usize {
    CELL + CELL * dims
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scope {
    Global,
    Routine,
    Record,
}

#[derive(Debug)]
struct Frame {
    scope: Scope,
    vars: HashMap<String, Var>,
    cursor: usize,
}

impl Frame {
    fn new(scope: Scope) -> Frame {
        Frame {
            scope,
            vars: HashMap::new(),
            cursor: 0,
        }
    }
}

/// ## Symbol and memory allocator
///
/// A stack of allocation frames. The bottom frame is the global region;
/// routines and record layouts push a frame with its own cursor.

#[derive(Debug)]
pub struct Allocator {
    frames: Vec<Frame>,
}

impl Default for Allocator {
    fn default() -> Self {
        Allocator {
            frames: vec![Frame::new(Scope::Global)],
        }
    }
}

impl Allocator {
    fn frame(&self) -> &Frame {
        &self.frames[self.frames.len() - 1]
    }

    fn frame_mut(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    pub fn scope(&self) -> Scope {
        self.frame().scope
    }

    pub fn enter(&mut self, scope: Scope) {
        self.frames.push(Frame::new(scope));
    }

    /// Close the current frame and return its size.
    pub fn leave(&mut self) -> usize {
        if self.frames.len() > 1 {
            if self.scope() == Scope::Routine {
                self.align(CELL);
            }
            if let Some(frame) = self.frames.pop() {
                return frame.cursor;
            }
        }
        self.frame().cursor
    }

    pub fn align(&mut self, n: usize) {
        let frame = self.frame_mut();
        frame.cursor = (frame.cursor + n - 1) / n * n;
    }

    pub fn allocate(&mut self, size: usize) -> usize {
        self.align(size.clamp(1, CELL));
        let frame = self.frame_mut();
        let offset = frame.cursor;
        frame.cursor += size;
        offset
    }

    pub fn size(&self) -> usize {
        self.frame().cursor
    }

    /// Size of the global region, rounded to a cell.
    pub fn global_size(&self) -> usize {
        let size = self.frames[0].cursor;
        (size + CELL - 1) / CELL * CELL
    }

    fn place(&self, offset: usize) -> Place {
        match self.scope() {
            Scope::Routine => Place::Local(offset),
            Scope::Global | Scope::Record => Place::Global(offset),
        }
    }

    pub fn local(&self, name: &str) -> Option<&Var> {
        self.frame().vars.get(name)
    }

    pub fn global(&self, name: &str) -> Option<&Var> {
        self.frames[0].vars.get(name)
    }

    pub fn declare(
        &mut self,
        name: &str,
        var_type: VarType,
        dims: Dims,
        shared: bool,
    ) -> Result<Var> {
        if self.local(name).is_some() {
            return Err(error!(SyntaxError; "Variable {} defined twice", name));
        }
        let size = match dims {
            Dims::Scalar => var_type.size(),
            Dims::Indirect => CELL,
            Dims::Array(n) => {
                if n > MAX_DIMENSIONS {
                    return Err(error!(SyntaxError; "Too many array dimensions"));
                }
                dope_size(n)
            }
        };
        let offset = self.allocate(size);
        let var = Var {
            place: self.place(offset),
            var_type,
            dims,
            shared: shared && self.scope() == Scope::Global,
        };
        self.frame_mut().vars.insert(name.to_string(), var.clone());
        log::trace!("allocated {} at {}", name, var.place);
        Ok(var)
    }

    /// Anonymous slot for compiler temporaries.
    pub fn temp(&mut self, ty: SimpleType) -> Place {
        let offset = self.allocate(ty.size());
        self.place(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment() {
        let mut a = Allocator::default();
        assert_eq!(a.allocate(1), 0);
        assert_eq!(a.allocate(2), 2);
        assert_eq!(a.allocate(8), 8);
        assert_eq!(a.allocate(12), 16);
        assert_eq!(a.size(), 28);
        assert_eq!(a.global_size(), 32);
    }

    #[test]
    fn test_routine_frame() {
        let mut a = Allocator::default();
        a.declare("g", VarType::Simple(SimpleType::Single), Dims::Scalar, false)
            .unwrap();
        a.enter(Scope::Routine);
        let x = a
            .declare("x", VarType::Simple(SimpleType::Double), Dims::Scalar, false)
            .unwrap();
        assert_eq!(x.place, Place::Local(0));
        a.temp(SimpleType::Integer);
        assert_eq!(a.leave(), 16);
        assert_eq!(a.global("g").unwrap().place, Place::Global(0));
    }

    #[test]
    fn test_defined_twice() {
        let mut a = Allocator::default();
        let ty = VarType::Simple(SimpleType::Single);
        a.declare("x", ty.clone(), Dims::Scalar, false).unwrap();
        let e = a.declare("x", ty, Dims::Array(1), false).unwrap_err();
        assert_eq!(e.to_string(), "Variable x defined twice");
    }
}
