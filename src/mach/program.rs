use super::alloc::Var;
use super::opcode::{Opcode, Slot};
use super::Address;
use std::rc::Rc;

/// A SUB or FUNCTION. The frame holds parameters, the function result,
/// locals and compiler temporaries.
#[derive(Debug, Clone)]
pub struct Routine {
    pub name: String,
    pub params: Vec<Var>,
    pub entry: Option<Address>,
    pub frame_size: usize,
    pub is_sub: bool,
    pub result: Option<Slot>,
    pub line: usize,
}

impl Routine {
    pub fn is_defined(&self) -> bool {
        self.entry.is_some()
    }
}

/// ## Compiled program
///
/// Besides the operations, the program keeps where each statement
/// starts and on which source line, for error reporting and RESUME.

#[derive(Debug, Default)]
pub struct Program {
    pub ops: Vec<Opcode>,
    pub routines: Vec<Routine>,
    pub data: Vec<Rc<str>>,
    pub globals_size: usize,
    statements: Vec<(Address, usize)>,
}

impl Program {
    pub fn new() -> Program {
        Program::default()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Record a statement beginning at `addr`.
    pub fn statement(&mut self, addr: Address, line: usize) {
        match self.statements.last_mut() {
            Some(last) if last.0 == addr => last.1 = line,
            _ => self.statements.push((addr, line)),
        }
    }

    fn index_at(&self, ip: Address) -> Option<usize> {
        match self.statements.binary_search_by(|(addr, _)| addr.cmp(&ip)) {
            Ok(i) => Some(i),
            Err(0) => None,
            Err(i) => Some(i - 1),
        }
    }

    pub fn line_for(&self, ip: Address) -> Option<usize> {
        self.index_at(ip).map(|i| self.statements[i].1)
    }

    /// Start of the statement containing `ip`.
    pub fn statement_start(&self, ip: Address) -> Address {
        self.index_at(ip).map_or(0, |i| self.statements[i].0)
    }

    /// Start of the statement after the one containing `ip`.
    pub fn next_statement(&self, ip: Address) -> Address {
        let i = self.statements.partition_point(|(addr, _)| *addr <= ip);
        self.statements
            .get(i)
            .map_or_else(|| self.ops.len(), |(addr, _)| *addr)
    }
}

impl std::fmt::Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut statements = self.statements.iter().peekable();
        for (addr, op) in self.ops.iter().enumerate() {
            for routine in self.routines.iter().filter(|r| r.entry == Some(addr)) {
                writeln!(f, "{} ({} bytes):", routine.name.to_uppercase(), routine.frame_size)?;
            }
            let mut line = None;
            while let Some((start, n)) = statements.peek() {
                if *start > addr {
                    break;
                }
                line = Some(*n);
                statements.next();
            }
            match line {
                Some(n) => writeln!(f, "{:>5} {:>6}  {}", n, addr, op)?,
                None => writeln!(f, "{:>5} {:>6}  {}", "", addr, op)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_table() {
        let mut p = Program::new();
        p.ops = vec![Opcode::Pop; 10];
        p.statement(0, 1);
        p.statement(3, 1);
        p.statement(3, 2);
        p.statement(7, 4);
        assert_eq!(p.line_for(0), Some(1));
        assert_eq!(p.line_for(5), Some(2));
        assert_eq!(p.line_for(9), Some(4));
        assert_eq!(p.statement_start(5), 3);
        assert_eq!(p.next_statement(3), 7);
        assert_eq!(p.next_statement(8), 10);
    }
}
