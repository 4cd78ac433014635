// Copyright 2024 Cornell University
// released under MIT License
// author: Nikil Shyamunder <nvs26@cornell.edu>
// author: Kevin Laeufer <laeufer@cornell.edu>
// author: Francis Pham <fdp25@cornell.edu>
// author: Ernest Ng <eyn5@cornell.edu>

use std::fmt;

/// Main error type for the communication composition pass
#[derive(Debug, Clone, PartialEq)]
pub enum LineariseError {
    /// A communication rule cannot be applied
    Communication(CommunicationError),
    /// The caller-supplied rewriter failed; surfaced unchanged
    Rewrite(RewriteError),
}

/// Errors raised while applying the communication function
#[derive(Debug, Clone, PartialEq)]
pub enum CommunicationError {
    /// A communication would synchronise into the silent action or an
    /// empty right-hand side; this cannot be linearised and must be
    /// reported rather than guessed around.
    UnsupportedCommunication { lhs: String, rhs: String },
}

/// Errors raised by the caller-supplied rewriter
#[derive(Debug, Clone, PartialEq)]
pub enum RewriteError {
    /// The rewriter rejected a term
    Rejected { message: String },
}

impl fmt::Display for LineariseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineariseError::Communication(e) => write!(f, "Communication error: {}", e),
            LineariseError::Rewrite(e) => write!(f, "Rewrite error: {}", e),
        }
    }
}

impl fmt::Display for CommunicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommunicationError::UnsupportedCommunication { lhs, rhs } => {
                write!(
                    f,
                    "Cannot linearise a process with a communication operator containing the \
                     communication '{} -> {}', which results in tau or has an empty right hand side",
                    lhs, rhs
                )
            }
        }
    }
}

impl fmt::Display for RewriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewriteError::Rejected { message } => {
                write!(f, "the rewriter rejected a term: {}", message)
            }
        }
    }
}

// Convenience constructors
impl LineariseError {
    pub fn unsupported_communication(lhs: String, rhs: String) -> Self {
        LineariseError::Communication(CommunicationError::UnsupportedCommunication { lhs, rhs })
    }

    pub fn rewriter_rejected(message: String) -> Self {
        LineariseError::Rewrite(RewriteError::Rejected { message })
    }
}

impl From<CommunicationError> for LineariseError {
    fn from(e: CommunicationError) -> Self {
        LineariseError::Communication(e)
    }
}

impl From<RewriteError> for LineariseError {
    fn from(e: RewriteError) -> Self {
        LineariseError::Rewrite(e)
    }
}

/// Type alias for Results
pub type LineariseResult<T> = Result<T, LineariseError>;
