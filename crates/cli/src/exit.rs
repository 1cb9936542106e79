use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    InventoryFailed,
    VerifyFailed,
    Invalid,
    Partial,
    Fatal,
}

impl ExitCode {
    pub const fn as_i32(self) -> i32 {
        match self {
            ExitCode::Success => 0,
            ExitCode::InventoryFailed | ExitCode::VerifyFailed => 1,
            ExitCode::Invalid => 3,
            ExitCode::Partial => 10,
            ExitCode::Fatal => 20,
        }
    }
}

#[derive(Debug)]
pub struct ExitError {
    pub code: ExitCode,
    pub err: anyhow::Error,
}

impl ExitError {
    pub fn new(code: ExitCode, err: anyhow::Error) -> Self {
        Self { code, err }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.err.fmt(f)
    }
}

impl std::error::Error for ExitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.err.as_ref())
    }
}

/// Process exit status for an error. Anything without an explicit code is
/// fatal.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(exit) = err.downcast_ref::<ExitError>() {
        return exit.code.as_i32();
    }
    ExitCode::Fatal.as_i32()
}

pub fn inventory_failed_err(err: anyhow::Error) -> anyhow::Error {
    ExitError::new(ExitCode::InventoryFailed, err).into()
}

pub fn verify_failed_err(err: anyhow::Error) -> anyhow::Error {
    ExitError::new(ExitCode::VerifyFailed, err).into()
}

pub fn fatal_err(err: anyhow::Error) -> anyhow::Error {
    ExitError::new(ExitCode::Fatal, err).into()
}
