//! CPU execution engine for the LGP-30.
//!
//! Implements the fetch-decode-execute cycle against the rotating drum.
//! Every drum access costs the rotational latency the drum reports, and the
//! shared clock is ticked once per word-time so the head is always where a
//! real machine's head would be.

use crate::cpu::config::CpuConfig;
use crate::cpu::decode::{self, Instruction, InstructionSet, Opcode};
use crate::cpu::drum::{Address, Drum};
use crate::cpu::Registers;
use crate::word::Word;
use serde::{Serialize, Deserialize};
use std::collections::VecDeque;

/// Diagnostics kept between drains; older entries are dropped first.
pub const DIAGNOSTIC_CAPACITY: usize = 256;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is fetching and executing orders.
    Running,
    /// CPU executed a Stop order. Terminal until reset.
    Halted,
}

/// A recoverable condition observed while executing an order.
///
/// Diagnostics never stop the machine; they are queued on the CPU, returned
/// in the [`StepReport`], and logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// The order has no behavior in the configured instruction set and was
    /// treated as a no-op.
    UnimplementedInstruction { opcode: Opcode, location: Address },
    /// Divide by zero, or a quotient that does not fit in a word.
    /// The accumulator was left unchanged.
    DivideOverflow { location: Address },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::UnimplementedInstruction { opcode, location } => write!(
                f,
                "instruction {:X} ({}) at {} not implemented",
                opcode.code(), opcode, location
            ),
            Diagnostic::DivideOverflow { location } => {
                write!(f, "divide overflow at {}", location)
            }
        }
    }
}

/// What a single `step()` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    /// Address the order was fetched from.
    pub location: Address,
    /// The decoded order.
    pub instruction: Instruction,
    /// Word-times spent fetching (rotational wait + 1 transfer word-time).
    pub fetch_ticks: u64,
    /// Word-times spent waiting for the operand.
    pub execute_ticks: u64,
    /// Any diagnostic raised by this order.
    pub diagnostic: Option<Diagnostic>,
}

impl StepReport {
    /// Total word-times consumed by the order.
    pub fn ticks(&self) -> u64 {
        self.fetch_ticks + self.execute_ticks
    }
}

/// How the counter moves once an order completes.
enum Flow {
    Next,
    Jump(Address),
}

/// The LGP-30 processing unit, bound to its drum.
#[derive(Clone)]
pub struct Cpu {
    regs: Registers,
    drum: Drum,
    state: CpuState,
    instruction_set: InstructionSet,
    start: Address,
    /// Word-times elapsed since construction or reset.
    ticks: u64,
    /// Orders executed (for profiling).
    steps: u64,
    diagnostics: VecDeque<Diagnostic>,
}

impl Cpu {
    /// Create a CPU with a zeroed drum and the core instruction set.
    pub fn new() -> Self {
        Self::with_drum(Drum::new(), CpuConfig::default())
    }

    /// Bind a CPU to an already loaded drum.
    pub fn with_drum(drum: Drum, config: CpuConfig) -> Self {
        Self {
            regs: Registers::starting_at(config.start),
            drum,
            state: CpuState::Running,
            instruction_set: config.instruction_set,
            start: config.start,
            ticks: 0,
            steps: 0,
            diagnostics: VecDeque::with_capacity(DIAGNOSTIC_CAPACITY),
        }
    }

    /// Reset registers, state and clock. The drum keeps its words and rotation.
    pub fn reset(&mut self) {
        self.regs = Registers::starting_at(self.start);
        self.state = CpuState::Running;
        self.ticks = 0;
        self.steps = 0;
        self.diagnostics.clear();
        tracing::debug!(start = %self.start, "cpu reset");
    }

    /// Store a word directly on the drum, bypassing the timing model.
    ///
    /// # Panics
    /// Panics if `track` or `sector` is out of range.
    pub fn poke(&mut self, track: u8, sector: u8, value: Word) {
        self.drum.poke(track, sector, value);
    }

    /// Execute a single order.
    ///
    /// Returns `None` without touching anything if the CPU is halted.
    pub fn step(&mut self) -> Option<StepReport> {
        if self.state != CpuState::Running {
            return None;
        }

        // Fetch
        let location = self.regs.counter;
        let (word, fetch_wait) = self.drum.read(location.track(), location.sector());
        let fetch_ticks = self.sync_clock(fetch_wait + 1);

        // Decode
        let instr = decode::decode(word);

        // Execute
        let start_ticks = self.ticks;
        let (flow, diagnostic) = self.execute(location, instr);
        let execute_ticks = self.ticks - start_ticks;

        match flow {
            Flow::Next => {
                self.regs.advance_counter();
            }
            Flow::Jump(target) => self.regs.jump(target),
        }

        if let Some(diag) = diagnostic {
            tracing::warn!(%location, "{}", diag);
            if self.diagnostics.len() == DIAGNOSTIC_CAPACITY {
                self.diagnostics.pop_front();
            }
            self.diagnostics.push_back(diag);
        }

        self.steps += 1;
        tracing::trace!(
            %location,
            opcode = %instr.opcode,
            operand = %instr.operand,
            fetch_ticks,
            execute_ticks,
            accumulator = %self.regs.accumulator,
            "step"
        );

        Some(StepReport {
            location,
            instruction: instr,
            fetch_ticks,
            execute_ticks,
            diagnostic,
        })
    }

    /// Run until halted or `max_steps` orders have executed.
    ///
    /// Returns the number of orders executed.
    pub fn run(&mut self, max_steps: u64) -> u64 {
        let start_steps = self.steps;
        let limit = self.steps.saturating_add(max_steps);

        while self.state == CpuState::Running && self.steps < limit {
            self.step();
        }

        self.steps - start_steps
    }

    /// Execute a decoded order.
    fn execute(&mut self, location: Address, instr: Instruction) -> (Flow, Option<Diagnostic>) {
        let Instruction { opcode, operand } = instr;

        if !self.instruction_set.implements(opcode) {
            return (
                Flow::Next,
                Some(Diagnostic::UnimplementedInstruction { opcode, location }),
            );
        }

        match opcode {
            // ==================== Transfer ====================

            Opcode::Bring => {
                self.regs.accumulator = self.read_operand(operand);
            }

            Opcode::Hold => {
                self.write_operand(operand, self.regs.accumulator);
            }

            Opcode::Clear => {
                self.write_operand(operand, self.regs.accumulator);
                self.regs.accumulator = Word::ZERO;
            }

            Opcode::StoreAddress => {
                let field = self.regs.accumulator.address_field();
                self.modify_address_field(operand, field);
            }

            Opcode::ReturnAddress => {
                let target = location.next().next();
                self.modify_address_field(operand, target.value());
            }

            // ==================== Arithmetic ====================

            Opcode::Add => {
                let value = self.read_operand(operand);
                self.regs.accumulator = self.regs.accumulator.wrapping_add(value);
            }

            Opcode::Subtract => {
                let value = self.read_operand(operand);
                self.regs.accumulator = self.regs.accumulator.wrapping_sub(value);
            }

            Opcode::MultiplyLow => {
                let value = self.read_operand(operand);
                self.regs.accumulator = self.regs.accumulator.wrapping_mul(value);
            }

            Opcode::MultiplyHigh => {
                let value = self.read_operand(operand);
                self.regs.accumulator = self.regs.accumulator.mul_high(value);
            }

            Opcode::Divide => {
                let divisor = self.read_operand(operand);
                match self.regs.accumulator.checked_div(divisor) {
                    Some(quotient) => self.regs.accumulator = quotient,
                    None => return (Flow::Next, Some(Diagnostic::DivideOverflow { location })),
                }
            }

            Opcode::Extract => {
                let mask = self.read_operand(operand);
                self.regs.accumulator = self.regs.accumulator.extract(mask);
            }

            // ==================== Control ====================

            Opcode::Transfer => return (Flow::Jump(operand), None),

            Opcode::Test => {
                if self.regs.accumulator.is_negative() {
                    return (Flow::Jump(operand), None);
                }
            }

            Opcode::Stop => {
                self.state = CpuState::Halted;
            }

            // I/O orders are never in an instruction set
            Opcode::Input | Opcode::Print => {
                return (
                    Flow::Next,
                    Some(Diagnostic::UnimplementedInstruction { opcode, location }),
                );
            }
        }

        (Flow::Next, None)
    }

    /// Wait for the operand sector, then read it.
    fn read_operand(&mut self, addr: Address) -> Word {
        let (value, wait) = self.drum.read_at(addr);
        self.sync_clock(wait);
        value
    }

    /// Wait for the operand sector, then write it.
    fn write_operand(&mut self, addr: Address, value: Word) {
        let wait = self.drum.write_at(addr, value);
        self.sync_clock(wait);
    }

    /// Rewrite the address field of a drum word in a single pass under the head.
    fn modify_address_field(&mut self, addr: Address, field: u16) {
        let (old, wait) = self.drum.read_at(addr);
        self.drum.write_at(addr, old.with_address_field(field));
        self.sync_clock(wait);
    }

    /// Advance the drum and the global clock one word-time at a time.
    fn sync_clock(&mut self, ticks: u32) -> u64 {
        for _ in 0..ticks {
            self.drum.tick();
            self.ticks += 1;
        }
        ticks as u64
    }

    /// The accumulator.
    pub fn accumulator(&self) -> Word {
        self.regs.accumulator
    }

    /// Address of the next order to fetch.
    pub fn instruction_counter(&self) -> Address {
        self.regs.counter
    }

    /// Both registers.
    pub fn regs(&self) -> &Registers {
        &self.regs
    }

    /// The bound drum, read-only.
    pub fn drum(&self) -> &Drum {
        &self.drum
    }

    pub fn state(&self) -> CpuState {
        self.state
    }

    pub fn instruction_set(&self) -> InstructionSet {
        self.instruction_set
    }

    /// Word-times elapsed since construction or reset.
    pub fn total_ticks(&self) -> u64 {
        self.ticks
    }

    /// Orders executed since construction or reset.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Diagnostics raised since the last call, oldest first.
    ///
    /// At most [`DIAGNOSTIC_CAPACITY`] are kept; the report returned by
    /// `step()` always carries its own diagnostic.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.drain(..).collect()
    }

    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("ticks", &self.ticks)
            .field("regs", &self.regs)
            .field("drum", &self.drum)
            .finish()
    }
}
