use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

/// Checkpoint error type.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("- Could not talk to the operator:\n{0}")]
    Io(#[from] std::io::Error),
    #[error("- Could not install the Ctrl-C handler:\n{0}")]
    Signal(#[from] ctrlc::Error),
}

/// Operator gate between pipeline steps.
/// `Ok(false)` means the operator wants to stop.
pub trait Checkpoint {
    fn confirm(&mut self, prompt: &str) -> Result<bool, CheckpointError>;

    /// Whether the operator interrupted the run.
    /// Checked by the driver before every step.
    fn interrupted(&self) -> bool {
        false
    }
}

/// Closures work as checkpoints in tests and embedders.
impl<F> Checkpoint for F
where F: FnMut(&str) -> bool
{
    fn confirm(&mut self, prompt: &str) -> Result<bool, CheckpointError> {
        Ok(self(prompt))
    }
}

/// Confirms everything without asking (`--yes`).
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoConfirm;
impl Checkpoint for AutoConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool, CheckpointError> {
        tracing::debug!("Auto-confirmed: {}", prompt);
        Ok(true)
    }
}

/// Blocking prompt on a line-based terminal.
/// Enter continues; `q`, `quit`, `n`, `no`, `abort` or end of input stop.
pub struct PromptCheckpoint<R, W> {
    input: R,
    output: W,
}
impl<R: BufRead, W: Write> PromptCheckpoint<R, W> {
    pub fn new(input: R, output: W) -> Self {
        PromptCheckpoint{input, output}
    }
}
impl PromptCheckpoint<std::io::StdinLock<'static>, std::io::Stdout> {
    /// Prompt on the process terminal.
    pub fn stdin() -> Self {
        PromptCheckpoint::new(std::io::stdin().lock(), std::io::stdout())
    }
}
impl<R: BufRead, W: Write> Checkpoint for PromptCheckpoint<R, W> {
    fn confirm(&mut self, prompt: &str) -> Result<bool, CheckpointError> {
        write!(self.output, "{} [Enter to continue, q to abort] ", prompt)?;
        self.output.flush()?;

        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            return Ok(false);
        }
        let answer = answer.trim().to_lowercase();
        Ok(!matches!(answer.as_str(), "q" | "quit" | "n" | "no" | "abort"))
    }
}

/// Interrupt flag shared between the signal handler and the driver.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);
impl Interrupt {
    pub fn new() -> Self {
        Interrupt::default()
    }

    /// Raise the flag on Ctrl-C instead of terminating the process,
    /// so the run stops at the next step and the engine is closed.
    /// A second Ctrl-C exits right away.
    pub fn on_ctrl_c() -> Result<Self, CheckpointError> {
        let interrupt = Interrupt::new();
        let flag = interrupt.clone();
        ctrlc::set_handler(move || {
            if flag.0.swap(true, Ordering::SeqCst) {
                eprintln!("Second interrupt, exiting without closing the engine");
                std::process::exit(130);
            }
            tracing::warn!("Interrupt received, stopping after the current engine call (Ctrl-C again to force quit)");
        })?;
        Ok(interrupt)
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Checkpoint that also answers to an `Interrupt`.
/// Once the flag is raised, every prompt is refused without asking.
pub struct Interruptible {
    inner: Box<dyn Checkpoint>,
    interrupt: Interrupt,
}
impl Interruptible {
    pub fn new(inner: Box<dyn Checkpoint>, interrupt: Interrupt) -> Self {
        Interruptible{inner, interrupt}
    }
}
impl Checkpoint for Interruptible {
    fn confirm(&mut self, prompt: &str) -> Result<bool, CheckpointError> {
        if self.interrupt.is_raised() {
            return Ok(false);
        }
        let answer = self.inner.confirm(prompt)?;
        Ok(answer && !self.interrupt.is_raised())
    }

    fn interrupted(&self) -> bool {
        self.interrupt.is_raised() || self.inner.interrupted()
    }
}
