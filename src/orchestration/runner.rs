//! Process runner abstraction
//!
//! The extraction pipeline never spawns processes directly; it goes
//! through this trait so tests can substitute a recording runner.

use crate::error::DanceResult;
use async_trait::async_trait;
use std::fmt;

/// A program invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Create an invocation with no arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Executes external commands for the extraction pipeline
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run a command to completion; non-zero exit is an error
    async fn run(&self, command: &CommandSpec) -> DanceResult<()>;

    /// Run `producer | consumer`; an error if either side fails
    async fn run_piped(&self, producer: &CommandSpec, consumer: &CommandSpec) -> DanceResult<()>;
}
