/*!
 * Programs
 * Immutable decoded instruction sequences shared between a caller and its task
 */

use super::instruction::Instruction;
use crate::core::errors::ProgramError;
use std::path::Path;
use std::str::FromStr;

/// A decoded, immutable program
///
/// The end of the instruction vector is the program's sentinel. Tasks hold
/// programs behind an `Arc`, so admission never copies instructions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    /// Decode a sequence of instruction lines
    ///
    /// Blank lines and lines starting with `;` or `#` are skipped. Line
    /// numbers in errors count every input line, skipped ones included.
    pub fn parse<I, S>(lines: I) -> Result<Self, ProgramError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut instructions = Vec::new();
        for (index, line) in lines.into_iter().enumerate() {
            let text = line.as_ref().trim();
            if text.is_empty() || text.starts_with(';') || text.starts_with('#') {
                continue;
            }
            instructions.push(Instruction::decode(index + 1, text)?);
        }
        Ok(Self { instructions })
    }

    /// Load a program from a file, one instruction per line
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProgramError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| ProgramError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        source.parse()
    }

    /// Instruction at `pc`, `None` past the sentinel
    #[inline(always)]
    pub fn get(&self, pc: usize) -> Option<&Instruction> {
        self.instructions.get(pc)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter()
    }

    /// Whether any instruction is a HALT
    pub fn halts(&self) -> bool {
        self.instructions.contains(&Instruction::Halt)
    }
}

impl FromStr for Program {
    type Err = ProgramError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Self::parse(source.lines())
    }
}

impl From<Vec<Instruction>> for Program {
    fn from(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }
}
