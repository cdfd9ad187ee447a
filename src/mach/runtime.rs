use super::alloc::{Dims, Place, SimpleType, CELL};
use super::bindings::{Bindings, ScreenMode};
use super::memory::Memory;
use super::opcode::{Binding, Handler, Opcode, Resume};
use super::using::Using;
use super::{Address, Config, Function, Operation, Program, Stack, Val};
use crate::error;
use crate::lang::Error;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::convert::TryFrom;
use std::rc::Rc;
use std::time::Duration;

type Result<T> = std::result::Result<T, Error>;

/// Width of a PRINT zone.
const ZONE: usize = 14;

/// What the host should do after a quantum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunState {
    Running,
    /// Call again after the delay.
    Suspended(Duration),
    Halted,
}

enum Step {
    Continue,
    Yield,
    Sleep(Duration),
    End,
}

#[derive(Debug)]
struct CallRecord {
    operand_depth: usize,
    heap_mark: usize,
}

/// Machine state saved when an error handler is entered.
#[derive(Debug)]
struct Pending {
    ip: Address,
    sp: usize,
    bp: usize,
    calls: usize,
}

/// ## Virtual machine
///
/// Runs a compiled program in quanta so the host can keep its display
/// and input responsive. Memory holds the globals, then the call stack,
/// then the array heap.

pub struct Runtime {
    program: Rc<Program>,
    quantum: usize,
    memory: Memory,
    stack: Stack<Val>,
    ip: Address,
    sp: usize,
    bp: usize,
    stack_base: usize,
    stack_limit: usize,
    heap: usize,
    pinned: usize,
    calls: Vec<CallRecord>,
    handler: Handler,
    pending: Option<Pending>,
    err: (u16, usize),
    data_pos: usize,
    column: usize,
    using: Option<Using>,
    fields: VecDeque<String>,
    prompted: bool,
    rng: StdRng,
    last_rnd: f64,
    halted: bool,
    error: Option<Error>,
}

impl Runtime {
    pub fn new(program: Program, config: &Config) -> Result<Runtime> {
        let stack_base = program.globals_size;
        let stack_limit = stack_base + config.stack_size;
        if stack_limit > config.memory_size {
            return Err(error!(OutOfMemory;
                "{} bytes of memory cannot hold {} bytes of globals and stack",
                config.memory_size, stack_limit));
        }
        log::debug!(
            "memory {} bytes, stack {}..{}",
            config.memory_size,
            stack_base,
            stack_limit
        );
        Ok(Runtime {
            program: Rc::new(program),
            quantum: config.quantum.max(1),
            memory: Memory::new(config.memory_size),
            stack: Stack::with_max_len("EXPRESSION TOO COMPLEX", config.operand_stack),
            ip: 0,
            sp: stack_base,
            bp: stack_base,
            stack_base,
            stack_limit,
            heap: stack_limit.max(CELL),
            pinned: 0,
            calls: vec![],
            handler: Handler::Fatal,
            pending: None,
            err: (0, 0),
            data_pos: 0,
            column: 0,
            using: None,
            fields: VecDeque::new(),
            prompted: false,
            rng: StdRng::seed_from_u64(0),
            last_rnd: 0.0,
            halted: false,
            error: None,
        })
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// The error that stopped the program.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Stop at the next quantum, as for a break from the keyboard.
    pub fn stop(&mut self) {
        self.halted = true;
    }

    /// Run until the program ends, ignoring suspensions.
    pub fn run(&mut self, bindings: &mut dyn Bindings) -> Result<()> {
        while self.execute(bindings) != RunState::Halted {}
        match self.error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Execute one quantum.
    pub fn execute(&mut self, bindings: &mut dyn Bindings) -> RunState {
        if self.halted {
            return RunState::Halted;
        }
        let program = Rc::clone(&self.program);
        let quantum = bindings.pace().unwrap_or(self.quantum);
        for _ in 0..quantum {
            let ip = self.ip;
            let op = match program.ops.get(ip) {
                Some(op) => op,
                None => {
                    self.end(bindings);
                    return RunState::Halted;
                }
            };
            self.ip += 1;
            match self.step(op, bindings) {
                Ok(Step::Continue) => {}
                Ok(Step::Yield) => return RunState::Running,
                Ok(Step::Sleep(delay)) => return RunState::Suspended(delay),
                Ok(Step::End) => {
                    self.end(bindings);
                    return RunState::Halted;
                }
                Err(error) => {
                    if let Some(state) = self.fail(ip, error, bindings) {
                        return state;
                    }
                }
            }
        }
        RunState::Running
    }

    fn end(&mut self, bindings: &mut dyn Bindings) {
        if self.column > 0 {
            bindings.put_ch(None);
            self.column = 0;
        }
        self.halted = true;
        bindings.halt();
    }

    fn fail(&mut self, ip: Address, error: Error, bindings: &mut dyn Bindings) -> Option<RunState> {
        let line = self.program.line_for(ip);
        match self.handler {
            Handler::Goto(target) if self.pending.is_none() => {
                log::debug!("error {} at op {} trapped", error.code(), ip);
                self.err = (error.code(), line.unwrap_or(0));
                self.pending = Some(Pending {
                    ip,
                    sp: self.sp,
                    bp: self.bp,
                    calls: self.calls.len(),
                });
                self.reset_operands();
                self.ip = target;
                None
            }
            Handler::ResumeNext => {
                self.err = (error.code(), line.unwrap_or(0));
                self.reset_operands();
                self.ip = self.program.next_statement(ip);
                None
            }
            _ => {
                let error = error.or_line(line);
                log::info!("program stopped: {}", error);
                self.error = Some(error);
                self.end(bindings);
                Some(RunState::Halted)
            }
        }
    }

    /// Drop operands belonging to the interrupted statement.
    fn reset_operands(&mut self) {
        let depth = self.calls.last().map_or(0, |call| call.operand_depth);
        self.stack.truncate(depth);
        self.using = None;
    }

    fn resolve(&self, place: Place) -> usize {
        match place {
            Place::Global(addr) => addr,
            Place::Local(offset) => self.bp + offset,
        }
    }

    fn pop_address(&mut self) -> Result<usize> {
        let addr = self.stack.pop()?.to_index()?;
        if addr < 0 {
            return Err(error!(IllegalFunctionCall));
        }
        Ok(addr as usize)
    }

    fn push_address(&mut self, addr: usize) -> Result<()> {
        self.stack.push(Val::from(addr as f64))
    }

    fn binary(&mut self, op: fn(Val, Val) -> Result<Val>) -> Result<()> {
        let (lhs, rhs) = self.stack.pop_2()?;
        self.stack.push(op(lhs, rhs)?)
    }

    fn jump_if(&mut self, target: Address, when: bool) -> Result<()> {
        if self.stack.pop()?.is_true()? == when {
            self.ip = target;
        }
        Ok(())
    }

    fn step(&mut self, op: &Opcode, bindings: &mut dyn Bindings) -> Result<Step> {
        match op {
            Opcode::Literal(val) => self.stack.push(val.clone())?,
            Opcode::Pop => {
                self.stack.pop()?;
            }
            Opcode::Dup => {
                let val = self.stack.pop()?;
                self.stack.push(val.clone())?;
                self.stack.push(val)?;
            }
            Opcode::Load(slot) => {
                let val = self.memory.read(self.resolve(slot.place), slot.ty)?;
                self.stack.push(val)?;
            }
            Opcode::Store(slot) => {
                let val = self.stack.pop()?;
                let addr = self.resolve(slot.place);
                self.memory.write(addr, slot.ty, val)?;
            }
            Opcode::Address(place) => self.push_address(self.resolve(*place))?,
            Opcode::Deref(place) => {
                let addr = self.memory.read_cell(self.resolve(*place))?;
                self.push_address(addr)?;
            }
            Opcode::LoadAt(ty) => {
                let addr = self.pop_address()?;
                let val = self.memory.read(addr, *ty)?;
                self.stack.push(val)?;
            }
            Opcode::StoreAt(ty) => {
                let val = self.stack.pop()?;
                let addr = self.pop_address()?;
                self.memory.write(addr, *ty, val)?;
            }
            Opcode::Offset(n) => {
                let addr = self.pop_address()?;
                self.push_address(addr + n)?;
            }
            Opcode::Element { dims, size, auto } => self.element(*dims, *size, *auto)?,
            Opcode::Dim { dims, size, skip } => self.dim(*dims, *size, *skip)?,
            Opcode::InitElem { index, size, ty } => {
                let val = self.stack.pop()?;
                let dope = self.pop_address()?;
                let (base, counts) = self.dope(dope)?;
                let total: i64 = counts.iter().map(|(_, count)| count).product();
                if *index as i64 >= total {
                    return Err(error!(SubscriptOutOfRange));
                }
                self.memory.write(base + index * size, *ty, val)?;
            }
            Opcode::Bound { upper } => {
                let dim = self.stack.pop()?.to_index()?;
                let dope = self.pop_address()?;
                let (_, bounds) = self.dope(dope)?;
                let (lower, count) = match usize::try_from(dim - 1).ok().and_then(|d| bounds.get(d)) {
                    Some(bound) => *bound,
                    None => return Err(error!(SubscriptOutOfRange)),
                };
                let bound = if *upper { lower + count - 1 } else { lower };
                self.stack.push(Val::from(bound as f64))?;
            }
            Opcode::Swap(ty) => {
                let b = self.pop_address()?;
                let a = self.pop_address()?;
                self.memory.swap(a, b, *ty)?;
            }
            Opcode::Jump(target) => self.ip = *target,
            Opcode::JumpIf(target) => self.jump_if(*target, true)?,
            Opcode::JumpIfNot(target) => self.jump_if(*target, false)?,
            Opcode::ForCheck {
                counter,
                limit,
                step,
                exit,
            } => {
                let value = self
                    .memory
                    .read(self.resolve(counter.place), counter.ty)?
                    .to_f64()?;
                let limit = self
                    .memory
                    .read(self.resolve(*limit), SimpleType::Double)?
                    .to_f64()?;
                let step = self
                    .memory
                    .read(self.resolve(*step), SimpleType::Double)?
                    .to_f64()?;
                if (step >= 0.0 && value > limit) || (step < 0.0 && value < limit) {
                    self.ip = *exit;
                }
            }
            Opcode::ForStep {
                counter,
                step,
                check,
            } => {
                let addr = self.resolve(counter.place);
                let value = self.memory.read(addr, counter.ty)?.to_f64()?;
                let step = self
                    .memory
                    .read(self.resolve(*step), SimpleType::Double)?
                    .to_f64()?;
                self.memory
                    .write(addr, counter.ty, Val::from(value + step))?;
                self.ip = *check;
            }
            Opcode::Gosub(target) => {
                self.push_return()?;
                self.ip = *target;
            }
            Opcode::Return(routine) => self.r#return(*routine)?,
            Opcode::OnGoto(targets) => {
                if let Some(target) = self.select_target(targets)? {
                    self.ip = target;
                }
            }
            Opcode::OnGosub(targets) => {
                if let Some(target) = self.select_target(targets)? {
                    self.push_return()?;
                    self.ip = target;
                }
            }
            Opcode::Call(index) => self.call(*index)?,
            Opcode::Exit(index) => self.exit(*index)?,
            Opcode::End => return Ok(Step::End),
            Opcode::OnError(handler) => self.handler = *handler,
            Opcode::Raise => {
                let code = self.stack.pop()?.to_index()?;
                if !(1..=255).contains(&code) {
                    return Err(error!(IllegalFunctionCall));
                }
                return Err(Error::raised(code as u16));
            }
            Opcode::Resume(resume) => self.resume(*resume)?,
            Opcode::Print => {
                let val = self.stack.pop()?;
                self.print(&val.to_string(), bindings);
            }
            Opcode::PrintComma => {
                let pad = ZONE - self.column % ZONE;
                self.print(&" ".repeat(pad), bindings);
            }
            Opcode::PrintNewline => self.print("\n", bindings),
            Opcode::Using => {
                let format = self.stack.pop()?.to_rc_str()?;
                self.using = Some(Using::new(&format));
            }
            Opcode::UsingVal => {
                let val = self.stack.pop()?;
                let text = match &mut self.using {
                    Some(using) => using.next_value(&val)?,
                    None => val.to_string(),
                };
                self.print(&text, bindings);
            }
            Opcode::UsingEnd => {
                if let Some(mut using) = self.using.take() {
                    let text = using.finish();
                    self.print(&text, bindings);
                }
            }
            Opcode::Read(ty) => {
                let item = match self.program.data.get(self.data_pos) {
                    Some(item) => item.clone(),
                    None => return Err(error!(OutOfData)),
                };
                self.data_pos += 1;
                let val = if ty.is_string() {
                    Val::String(item)
                } else {
                    Val::parse(&item)
                };
                self.stack.push(val)?;
            }
            Opcode::Restore(pos) => self.data_pos = *pos,
            Opcode::Input { prompt, question } => {
                if !self.input_line(prompt, *question, bindings) {
                    return Ok(Step::Yield);
                }
                let line = bindings.line_value();
                self.fields = line.split(',').map(|s| s.trim().to_string()).collect();
            }
            Opcode::LineInput(prompt) => {
                if !self.input_line(prompt, false, bindings) {
                    return Ok(Step::Yield);
                }
                self.fields.clear();
                self.fields.push_back(bindings.line_value());
            }
            Opcode::InputField(ty) => {
                let field = self.fields.pop_front().unwrap_or_default();
                let val = if ty.is_string() {
                    Val::from(field)
                } else {
                    Val::parse(&field)
                };
                self.stack.push(val)?;
            }
            Opcode::Sleep => {
                let seconds = self.stack.pop()?.to_f64()?;
                if seconds > 0.0 {
                    let duration = Duration::try_from_secs_f64(seconds)
                        .map_err(|_| error!(Overflow))?;
                    return Ok(Step::Sleep(duration));
                }
                return Ok(Step::Yield);
            }
            Opcode::Yield => return Ok(Step::Yield),
            Opcode::Randomize => {
                let seed = self.stack.pop()?.to_f64()?;
                self.rng = StdRng::seed_from_u64(seed.to_bits());
            }
            Opcode::Bind(binding) => self.bind(*binding, bindings)?,
            Opcode::Mouse(field) => {
                let value = bindings.get_mouse().field(*field);
                self.stack.push(Val::from(value))?;
            }
            Opcode::Neg => {
                let val = self.stack.pop()?;
                self.stack.push(Operation::negate(val)?)?;
            }
            Opcode::Not => {
                let val = self.stack.pop()?;
                self.stack.push(Operation::not(val)?)?;
            }
            Opcode::Pow => self.binary(Operation::power)?,
            Opcode::Mul => self.binary(Operation::multiply)?,
            Opcode::Div => self.binary(Operation::divide)?,
            Opcode::DivInt => self.binary(Operation::divide_int)?,
            Opcode::Mod => self.binary(Operation::modulo)?,
            Opcode::Add => self.binary(Operation::sum)?,
            Opcode::Sub => self.binary(Operation::subtract)?,
            Opcode::Eq => self.binary(Operation::equal)?,
            Opcode::NotEq => self.binary(Operation::not_equal)?,
            Opcode::Lt => self.binary(Operation::less)?,
            Opcode::LtEq => self.binary(Operation::less_equal)?,
            Opcode::Gt => self.binary(Operation::greater)?,
            Opcode::GtEq => self.binary(Operation::greater_equal)?,
            Opcode::And => self.binary(Operation::and)?,
            Opcode::Or => self.binary(Operation::or)?,
            Opcode::Xor => self.binary(Operation::xor)?,
            Opcode::Fn(func, argc) => return self.function(*func, *argc, bindings),
        }
        Ok(Step::Continue)
    }

    fn print(&mut self, text: &str, bindings: &mut dyn Bindings) {
        for ch in text.chars() {
            if ch == '\n' {
                bindings.put_ch(None);
                self.column = 0;
            } else {
                bindings.put_ch(Some(ch));
                self.column += 1;
            }
        }
    }

    /// Show the prompt once, then poll for the line. When the line is not
    /// ready the instruction runs again after the host regains control.
    fn input_line(&mut self, prompt: &str, question: bool, bindings: &mut dyn Bindings) -> bool {
        if !self.prompted {
            self.print(prompt, bindings);
            if question {
                self.print("? ", bindings);
            }
            bindings.line_clear();
            self.prompted = true;
        }
        if !bindings.line_input() {
            self.ip -= 1;
            return false;
        }
        self.prompted = false;
        self.column = 0;
        true
    }

    fn function(&mut self, func: Function, argc: usize, bindings: &mut dyn Bindings) -> Result<Step> {
        let args = self.stack.pop_n(argc)?;
        let val = match func {
            Function::ErrNumber => Val::Integer(self.err.0 as i32),
            Function::ErrLine => Val::from(self.err.1 as f64),
            Function::Inkey => {
                let key = bindings.inkey().unwrap_or_default();
                self.stack.push(Val::from(key))?;
                return Ok(Step::Yield);
            }
            Function::Rnd => {
                let n = match args.first() {
                    Some(val) => val.to_f64()?,
                    None => 1.0,
                };
                if n < 0.0 {
                    self.rng = StdRng::seed_from_u64(n.to_bits());
                }
                if n != 0.0 {
                    self.last_rnd = self.rng.gen::<f64>();
                }
                Val::Double(self.last_rnd)
            }
            Function::StackDepth => Val::from((self.sp - self.stack_base) as f64),
            Function::Timer => Val::from(bindings.timer()),
            _ => func.call(args)?,
        };
        self.stack.push(val)?;
        Ok(Step::Continue)
    }

    fn bind(&mut self, binding: Binding, bindings: &mut dyn Bindings) -> Result<()> {
        let args = self.stack.pop_n(binding.arity())?;
        let num = |i: usize| args[i].to_f64();
        let opt = |i: usize| -> Result<Option<i32>> {
            let n = args[i].to_i32()?;
            Ok(if n < 0 { None } else { Some(n) })
        };
        match binding {
            Binding::Beep => bindings.put_ch(Some('\u{7}')),
            Binding::Circle { fill } => bindings.circle(
                (num(0)?, num(1)?),
                num(2)?,
                opt(3)?,
                num(4)?,
                num(5)?,
                num(6)?,
                fill,
            ),
            Binding::Cls => bindings.cls(opt(0)?),
            Binding::Color => bindings.color(opt(0)?, opt(1)?),
            Binding::Draw => bindings.draw(&args[0].to_rc_str()?),
            Binding::Line(fill) => {
                bindings.line((num(0)?, num(1)?), (num(2)?, num(3)?), opt(4)?, fill)
            }
            Binding::Locate => bindings.locate(opt(0)?, opt(1)?),
            Binding::Paint => bindings.paint((num(0)?, num(1)?), opt(2)?, opt(3)?),
            Binding::Pset => bindings.pset((num(0)?, num(1)?), opt(2)?),
            Binding::Screen => match ScreenMode::lookup(args[0].to_i32()?) {
                Some(mode) => bindings.screen(&mode),
                None => return Err(error!(IllegalFunctionCall)),
            },
            Binding::Width => bindings.width(args[0].to_i32()?),
        }
        Ok(())
    }

    // *** Call stack

    fn push_return(&mut self) -> Result<()> {
        if self.sp + CELL > self.stack_limit {
            return Err(error!(OutOfStackSpace));
        }
        self.memory.write_cell(self.sp, self.ip)?;
        self.sp += CELL;
        Ok(())
    }

    fn r#return(&mut self, routine: Option<usize>) -> Result<()> {
        let floor = match routine {
            Some(index) => self.bp + self.program.routines[index].frame_size + CELL,
            None => self.stack_base,
        };
        if self.sp < floor + CELL {
            return Err(error!(ReturnWithoutGosub));
        }
        self.sp -= CELL;
        self.ip = self.memory.read_cell(self.sp)?;
        Ok(())
    }

    fn select_target(&mut self, targets: &[Option<Address>]) -> Result<Option<Address>> {
        let n = self.stack.pop()?.to_index()?;
        Ok(usize::try_from(n - 1)
            .ok()
            .and_then(|i| targets.get(i))
            .and_then(|target| *target))
    }

    /// Frame layout: saved frame pointer, the frame, the return address.
    fn call(&mut self, index: usize) -> Result<()> {
        let program = Rc::clone(&self.program);
        let routine = &program.routines[index];
        let entry = match routine.entry {
            Some(entry) => entry,
            None => {
                return Err(error!(SubprogramNotDefined;
                    "Subprogram {} not defined", routine.name))
            }
        };
        let frame = routine.frame_size;
        if self.sp + CELL + frame + CELL > self.stack_limit {
            return Err(error!(OutOfStackSpace));
        }
        let args = self.stack.pop_n(routine.params.len())?;
        self.memory.write_cell(self.sp, self.bp)?;
        self.sp += CELL;
        self.bp = self.sp;
        self.memory.clear(self.bp, frame)?;
        self.sp += frame;
        for (param, arg) in routine.params.iter().zip(args) {
            let addr = self.resolve(param.place);
            match (param.dims, param.var_type.simple()) {
                (Dims::Indirect, _) => self.memory.write_cell(addr, arg.to_index()? as usize)?,
                (_, Some(ty)) => self.memory.write(addr, ty, arg)?,
                (_, None) => return Err(error!(InternalError; "RECORD PARAMETER")),
            }
        }
        self.memory.write_cell(self.sp, self.ip)?;
        self.sp += CELL;
        self.calls.push(CallRecord {
            operand_depth: self.stack.len(),
            heap_mark: self.heap,
        });
        log::trace!("call {} frame at {}", routine.name, self.bp);
        self.ip = entry;
        Ok(())
    }

    fn exit(&mut self, index: usize) -> Result<()> {
        let program = Rc::clone(&self.program);
        let routine = &program.routines[index];
        let result = match routine.result {
            Some(slot) => Some(self.memory.read(self.resolve(slot.place), slot.ty)?),
            None => None,
        };
        let ret = self.memory.read_cell(self.bp + routine.frame_size)?;
        self.sp = match self.bp.checked_sub(CELL) {
            Some(sp) if sp >= self.stack_base => sp,
            _ => return Err(error!(InternalError; "FRAME UNDERFLOW")),
        };
        self.bp = self.memory.read_cell(self.sp)?;
        self.ip = ret;
        if let Some(call) = self.calls.pop() {
            self.stack.truncate(call.operand_depth);
            self.heap = call.heap_mark.max(self.pinned);
        }
        if let Some(val) = result {
            self.stack.push(val)?;
        }
        Ok(())
    }

    fn resume(&mut self, resume: Resume) -> Result<()> {
        let pending = match self.pending.take() {
            Some(pending) => pending,
            None => return Err(error!(ResumeWithoutError)),
        };
        self.sp = pending.sp;
        self.bp = pending.bp;
        self.calls.truncate(pending.calls);
        self.reset_operands();
        self.ip = match resume {
            Resume::Retry => self.program.statement_start(pending.ip),
            Resume::Next => self.program.next_statement(pending.ip),
            Resume::Label(target) => target,
        };
        Ok(())
    }

    // *** Arrays

    /// Storage address and `(lower, count)` per dimension.
    fn dope(&self, dope: usize) -> Result<(usize, Vec<(i64, i64)>)> {
        let base = self.memory.read_i32(dope)? as u32 as usize;
        if base == 0 {
            return Err(error!(SubscriptOutOfRange));
        }
        let dims = self.memory.read_i32(dope + 4)? as usize;
        let mut bounds = Vec::with_capacity(dims);
        for d in 1..=dims {
            let lower = self.memory.read_i32(dope + CELL * d)? as i64;
            let count = self.memory.read_i32(dope + CELL * d + 4)? as i64;
            bounds.push((lower, count));
        }
        Ok((base, bounds))
    }

    fn allocate(&mut self, dope: usize, bounds: &[(i64, i64)], size: usize) -> Result<()> {
        let mut total = size;
        for &(lower, upper) in bounds {
            if upper < lower || lower < i32::MIN as i64 || upper > i32::MAX as i64 {
                return Err(error!(SubscriptOutOfRange));
            }
            let count = (upper - lower + 1) as usize;
            total = match total.checked_mul(count) {
                Some(total) => total,
                None => return Err(error!(OutOfMemory)),
            };
        }
        let base = (self.heap + CELL - 1) / CELL * CELL;
        let end = match base.checked_add(total) {
            Some(end) if end <= self.memory.len() => end,
            _ => return Err(error!(OutOfMemory)),
        };
        self.memory.clear(base, total)?;
        self.memory.write_i32(dope, base as u32 as i32)?;
        self.memory.write_i32(dope + 4, bounds.len() as i32)?;
        for (d, &(lower, upper)) in bounds.iter().enumerate() {
            self.memory.write_i32(dope + CELL * (d + 1), lower as i32)?;
            self.memory
                .write_i32(dope + CELL * (d + 1) + 4, (upper - lower + 1) as i32)?;
        }
        self.heap = end;
        if dope < self.stack_base {
            self.pinned = self.heap;
        }
        log::trace!("allocated {} bytes at {} for {}", total, base, dope);
        Ok(())
    }

    fn dim(&mut self, dims: usize, size: usize, skip: Address) -> Result<()> {
        let flat = self.stack.pop_n(dims * 2)?;
        let dope = self.pop_address()?;
        if self.memory.read_i32(dope)? != 0 {
            self.ip = skip;
            return Ok(());
        }
        let mut bounds = Vec::with_capacity(dims);
        for pair in flat.chunks(2) {
            bounds.push((pair[0].to_index()?, pair[1].to_index()?));
        }
        self.allocate(dope, &bounds, size)
    }

    fn element(&mut self, dims: usize, size: usize, auto: Option<i32>) -> Result<()> {
        let indexes = self.stack.pop_n(dims)?;
        let dope = self.pop_address()?;
        if self.memory.read_i32(dope)? == 0 {
            match auto {
                Some(lower) => self.allocate(dope, &vec![(lower as i64, 10); dims], size)?,
                None => return Err(error!(SubscriptOutOfRange)),
            }
        }
        let (base, bounds) = self.dope(dope)?;
        if bounds.len() != dims {
            return Err(error!(SubscriptOutOfRange));
        }
        let mut offset = 0;
        let mut stride = 1;
        for (index, (lower, count)) in indexes.iter().zip(bounds) {
            let i = index.to_index()? - lower;
            if i < 0 || i >= count {
                return Err(error!(SubscriptOutOfRange));
            }
            offset += i * stride;
            stride *= count;
        }
        self.push_address(base + offset as usize * size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mach::{compile, Headless};

    fn run(src: &str) -> (Runtime, Headless) {
        let program = compile(src).unwrap();
        let mut runtime = Runtime::new(program, &Config::default()).unwrap();
        let mut headless = Headless::new();
        runtime.run(&mut headless).unwrap();
        (runtime, headless)
    }

    #[test]
    fn test_frames_are_released() {
        let (runtime, _) = run("SUB a(x AS DOUBLE)\nx = x + 1\nEND SUB\na 1\na 2\n");
        assert_eq!(runtime.sp, runtime.stack_base);
        assert!(runtime.calls.is_empty());
        assert!(runtime.stack.is_empty());
    }

    #[test]
    fn test_local_arrays_return_heap() {
        let (runtime, _) = run("SUB a\nDIM t(100)\nt(5) = 1\nEND SUB\na\n");
        assert_eq!(runtime.heap, runtime.stack_limit);
    }

    #[test]
    fn test_global_arrays_survive_calls() {
        let (_, headless) = run(
            "DIM SHARED g(3)\nSUB a\nDIM t(100)\nt(1) = 7\ng(1) = t(1)\nEND SUB\na\nPRINT g(1)\n",
        );
        assert_eq!(headless.transcript(), "7\n");
    }

    #[test]
    fn test_suspends_for_sleep() {
        let program = compile("SLEEP 2\nPRINT 1\n").unwrap();
        let mut runtime = Runtime::new(program, &Config::default()).unwrap();
        let mut headless = Headless::new();
        assert_eq!(
            runtime.execute(&mut headless),
            RunState::Suspended(Duration::from_secs(2))
        );
        assert_eq!(runtime.execute(&mut headless), RunState::Halted);
        assert_eq!(headless.transcript(), "1\n");
    }

    #[test]
    fn test_memory_too_small() {
        let program = compile("PRINT 1\n").unwrap();
        let config = Config {
            memory_size: 1024,
            ..Config::default()
        };
        assert_eq!(Runtime::new(program, &config).err().map(|e| e.code()), Some(7));
    }
}
