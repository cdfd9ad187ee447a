use super::opcode::{Handler, Opcode, Resume};
use super::Address;
use crate::error;
use crate::lang::Error;
use std::collections::HashMap;

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
struct Fixup {
    at: Address,
    slot: Option<usize>,
    label: String,
    line: usize,
}

/// ## Label resolution
///
/// Labels and line numbers share one namespace. Each label also records
/// the DATA position reached when it was declared, for `RESTORE label`.
/// References are collected while compiling and patched in `link`.

#[derive(Debug, Default)]
pub struct Link {
    labels: HashMap<String, Address>,
    data_labels: HashMap<String, usize>,
    unlinked: Vec<Fixup>,
}

impl Link {
    pub fn new() -> Link {
        Link::default()
    }

    pub fn define(&mut self, label: &str, addr: Address, data_pos: usize) -> Result<()> {
        if self.labels.contains_key(label) {
            return Err(error!(SyntaxError; "Label {} defined twice", label));
        }
        self.labels.insert(label.to_string(), addr);
        self.data_labels.insert(label.to_string(), data_pos);
        Ok(())
    }

    /// The op at `at` takes the label's address when linked.
    pub fn link_addr_to_label(&mut self, at: Address, label: &str, line: usize) {
        self.unlinked.push(Fixup {
            at,
            slot: None,
            label: label.to_string(),
            line,
        });
    }

    /// One entry of an `ON ... GOTO` list.
    pub fn link_slot_to_label(&mut self, at: Address, slot: usize, label: &str, line: usize) {
        self.unlinked.push(Fixup {
            at,
            slot: Some(slot),
            label: label.to_string(),
            line,
        });
    }

    pub fn link(&mut self, ops: &mut [Opcode]) -> Result<()> {
        for fixup in std::mem::take(&mut self.unlinked) {
            let undefined = || {
                error!(UndefinedLine, fixup.line; "Label {} not defined", fixup.label)
            };
            let op = match ops.get_mut(fixup.at) {
                Some(op) => op,
                None => return Err(error!(InternalError; "LINK FAILURE")),
            };
            if let Opcode::Restore(pos) = &mut *op {
                *pos = *self.data_labels.get(&fixup.label).ok_or_else(undefined)?;
                continue;
            }
            let dest = *self.labels.get(&fixup.label).ok_or_else(undefined)?;
            match (op, fixup.slot) {
                (Opcode::OnGoto(v), Some(i)) | (Opcode::OnGosub(v), Some(i)) if i < v.len() => {
                    v[i] = Some(dest)
                }
                (Opcode::Jump(a), None)
                | (Opcode::JumpIf(a), None)
                | (Opcode::JumpIfNot(a), None)
                | (Opcode::Gosub(a), None)
                | (Opcode::OnError(Handler::Goto(a)), None)
                | (Opcode::Resume(Resume::Label(a)), None) => *a = dest,
                _ => return Err(error!(InternalError, fixup.line; "LINK FAILURE")),
            }
        }
        Ok(())
    }
}
