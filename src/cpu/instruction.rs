/*!
 * Instruction Set
 * Tagged-variant instructions decoded once from their textual form
 */

use crate::core::errors::ProgramError;
use crate::core::limits::NUM_REGISTERS;
use serde::{Serialize, Serializer};
use std::fmt;

/// General-purpose register index (R0..R7)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Register(u8);

impl Register {
    /// Create a register reference, `None` if outside the register file
    #[inline]
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < NUM_REGISTERS {
            Some(Self(index))
        } else {
            None
        }
    }

    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Parse the `R<0-7>` operand form
    fn parse(token: &str) -> Option<Self> {
        let mut chars = token.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some('R' | 'r'), Some(digit), None) => {
                let index = digit.to_digit(10)?;
                Self::new(index as u8)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// Arithmetic operation shared by ADD, SUB and MUL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
}

impl ArithOp {
    #[inline(always)]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Mul => "MUL",
        }
    }

    /// Apply with two's complement wrap-around
    #[inline(always)]
    pub const fn apply(&self, lhs: i32, rhs: i32) -> i32 {
        match self {
            Self::Add => lhs.wrapping_add(rhs),
            Self::Sub => lhs.wrapping_sub(rhs),
            Self::Mul => lhs.wrapping_mul(rhs),
        }
    }

    const fn symbol(&self) -> char {
        match self {
            Self::Add => '+',
            Self::Sub => '-',
            Self::Mul => '*',
        }
    }
}

/// A decoded instruction
///
/// The two-operand arithmetic form `ADD Rd, Rs` decodes with `lhs == rd`,
/// so both forms share one variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// `rd <- imm`
    Load { rd: Register, imm: i32 },
    /// `rd <- lhs op rhs`
    Arith {
        op: ArithOp,
        rd: Register,
        lhs: Register,
        rhs: Register,
    },
    /// Push `rs` onto the task stack
    Push { rs: Register },
    /// Pop the task stack into `rd`
    Pop { rd: Register },
    /// Stop the task and mark it completed
    Halt,
    /// Mnemonic outside the instruction set, kept verbatim for reporting
    Unknown(String),
}

impl Instruction {
    /// Decode one instruction line
    ///
    /// `line` is the 1-based source line, used only for error reporting.
    /// Operands may be separated by commas, whitespace or both.
    pub fn decode(line: usize, text: &str) -> Result<Self, ProgramError> {
        let mut tokens = text
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty());

        let Some(mnemonic) = tokens.next() else {
            return Ok(Self::Unknown(String::new()));
        };
        let operands: Vec<&str> = tokens.collect();
        let opcode = mnemonic.to_ascii_uppercase();

        let arity = |expected: &str| ProgramError::OperandCount {
            line,
            opcode: opcode.clone(),
            expected: expected.to_string(),
            found: operands.len(),
        };
        let reg = |operand: &str| {
            Register::parse(operand).ok_or_else(|| ProgramError::InvalidRegister {
                line,
                operand: operand.to_string(),
            })
        };

        let op = match opcode.as_str() {
            "LOAD" => {
                let [rd, imm] = operands[..] else {
                    return Err(arity("2"));
                };
                let imm = imm
                    .parse::<i32>()
                    .map_err(|_| ProgramError::InvalidImmediate {
                        line,
                        operand: imm.to_string(),
                    })?;
                return Ok(Self::Load { rd: reg(rd)?, imm });
            }
            "ADD" => ArithOp::Add,
            "SUB" => ArithOp::Sub,
            "MUL" => ArithOp::Mul,
            "PUSH" => {
                let [rs] = operands[..] else {
                    return Err(arity("1"));
                };
                return Ok(Self::Push { rs: reg(rs)? });
            }
            "POP" => {
                let [rd] = operands[..] else {
                    return Err(arity("1"));
                };
                return Ok(Self::Pop { rd: reg(rd)? });
            }
            "HALT" => {
                if !operands.is_empty() {
                    return Err(arity("0"));
                }
                return Ok(Self::Halt);
            }
            _ => return Ok(Self::Unknown(text.trim().to_string())),
        };

        match operands[..] {
            [rd, rs] => {
                let rd = reg(rd)?;
                Ok(Self::Arith {
                    op,
                    rd,
                    lhs: rd,
                    rhs: reg(rs)?,
                })
            }
            [rd, lhs, rhs] => Ok(Self::Arith {
                op,
                rd: reg(rd)?,
                lhs: reg(lhs)?,
                rhs: reg(rhs)?,
            }),
            _ => Err(arity("2 or 3")),
        }
    }

    /// Human-readable effect, e.g. `R2 = R0 + R1`
    pub fn describe(&self) -> String {
        match self {
            Self::Load { rd, imm } => format!("{} = {}", rd, imm),
            Self::Arith { op, rd, lhs, rhs } => {
                format!("{} = {} {} {}", rd, lhs, op.symbol(), rhs)
            }
            Self::Push { rs } => format!("push {}", rs),
            Self::Pop { rd } => format!("pop {}", rd),
            Self::Halt => "halt".to_string(),
            Self::Unknown(text) => format!("unknown '{}'", text),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load { rd, imm } => write!(f, "LOAD {}, {}", rd, imm),
            Self::Arith { op, rd, lhs, rhs } if lhs == rd => {
                write!(f, "{} {}, {}", op.as_str(), rd, rhs)
            }
            Self::Arith { op, rd, lhs, rhs } => {
                write!(f, "{} {}, {}, {}", op.as_str(), rd, lhs, rhs)
            }
            Self::Push { rs } => write!(f, "PUSH {}", rs),
            Self::Pop { rd } => write!(f, "POP {}", rd),
            Self::Halt => f.write_str("HALT"),
            Self::Unknown(text) => f.write_str(text),
        }
    }
}

impl Serialize for Instruction {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}
