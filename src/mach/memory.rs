use super::alloc::SimpleType;
use super::Val;
use crate::error;
use crate::lang::Error;
use std::collections::BTreeMap;
use std::convert::TryInto;
use std::ops::Range;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// ## Linear memory
///
/// Numbers are stored little endian at their byte address. A string slot
/// reserves its bytes but the text is kept in a table keyed by address.

pub struct Memory {
    bytes: Vec<u8>,
    strings: BTreeMap<usize, Rc<str>>,
}

impl Memory {
    pub fn new(size: usize) -> Memory {
        Memory {
            bytes: vec![0; size],
            strings: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn range(&self, addr: usize, len: usize) -> Result<Range<usize>> {
        match addr.checked_add(len) {
            Some(end) if end <= self.bytes.len() => Ok(addr..end),
            _ => Err(error!(OutOfMemory; "Memory access out of range at {}", addr)),
        }
    }

    fn array<const N: usize>(&self, addr: usize) -> Result<[u8; N]> {
        let range = self.range(addr, N)?;
        self.bytes[range]
            .try_into()
            .map_err(|_| error!(InternalError; "Misread at {}", addr))
    }

    fn put(&mut self, addr: usize, bytes: &[u8]) -> Result<()> {
        let range = self.range(addr, bytes.len())?;
        self.bytes[range].copy_from_slice(bytes);
        Ok(())
    }

    pub fn read(&self, addr: usize, ty: SimpleType) -> Result<Val> {
        use SimpleType::*;
        Ok(match ty {
            Byte => Val::Integer(self.array::<1>(addr)?[0] as i32),
            Integer => Val::Integer(i16::from_le_bytes(self.array(addr)?) as i32),
            Long => Val::Integer(i32::from_le_bytes(self.array(addr)?)),
            Single => Val::Single(f32::from_le_bytes(self.array(addr)?)),
            Double => Val::Double(f64::from_le_bytes(self.array(addr)?)),
            String => {
                self.range(addr, ty.size())?;
                Val::String(match self.strings.get(&addr) {
                    Some(s) => s.clone(),
                    None => "".into(),
                })
            }
        })
    }

    /// Store with conversion to the slot type. Integer slots truncate
    /// toward zero and wrap.
    pub fn write(&mut self, addr: usize, ty: SimpleType, val: Val) -> Result<()> {
        use SimpleType::*;
        match (ty, val) {
            (String, Val::String(s)) => {
                self.range(addr, ty.size())?;
                self.strings.insert(addr, s);
                Ok(())
            }
            (String, _) | (_, Val::String(_)) => Err(error!(TypeMismatch)),
            (Byte, val) => self.put(addr, &[val.to_i32()? as u8]),
            (Integer, val) => self.put(addr, &(val.to_i32()? as i16).to_le_bytes()),
            (Long, val) => self.put(addr, &val.to_i32()?.to_le_bytes()),
            (Single, val) => self.put(addr, &(val.to_f64()? as f32).to_le_bytes()),
            (Double, val) => self.put(addr, &val.to_f64()?.to_le_bytes()),
        }
    }

    /// Read an address or count cell.
    pub fn read_cell(&self, addr: usize) -> Result<usize> {
        Ok(u64::from_le_bytes(self.array(addr)?) as usize)
    }

    pub fn write_cell(&mut self, addr: usize, value: usize) -> Result<()> {
        self.put(addr, &(value as u64).to_le_bytes())
    }

    pub fn read_i32(&self, addr: usize) -> Result<i32> {
        Ok(i32::from_le_bytes(self.array(addr)?))
    }

    pub fn write_i32(&mut self, addr: usize, value: i32) -> Result<()> {
        self.put(addr, &value.to_le_bytes())
    }

    /// Zero a region and drop the strings stored in it.
    pub fn clear(&mut self, addr: usize, len: usize) -> Result<()> {
        let range = self.range(addr, len)?;
        for b in &mut self.bytes[range.clone()] {
            *b = 0;
        }
        let doomed: Vec<usize> = self.strings.range(range).map(|(k, _)| *k).collect();
        for k in doomed {
            self.strings.remove(&k);
        }
        Ok(())
    }

    pub fn swap(&mut self, a: usize, b: usize, ty: SimpleType) -> Result<()> {
        let va = self.read(a, ty)?;
        let vb = self.read(b, ty)?;
        self.write(a, ty, vb)?;
        self.write(b, ty, va)
    }
}
