/// ## Runtime configuration
///
/// Memory holds the globals at offset 0, then `stack_size` bytes of call
/// stack, then the array heap up to `memory_size`.

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub memory_size: usize,
    pub stack_size: usize,
    /// Operations executed before control returns to the host.
    pub quantum: usize,
    /// Entries allowed on the operand stack.
    pub operand_stack: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            memory_size: 4 * 1024 * 1024,
            stack_size: 64 * 1024,
            quantum: 100_000,
            operand_stack: u16::max_value() as usize,
        }
    }
}
