use crate::Error;
use std::fmt::{self, Display};

/// Classification attached (as `anyhow` context) to every error surfaced by
/// the execution layer.
///
/// Each failure is labeled exactly once, where it originates, so
/// [`Failure::of`] returns the stage that failed:
/// ```rust,ignore
/// match Failure::of(&error) {
///     Some(Failure::Mapping) => { /* the row did not fit the entity */ }
///     _ => return Err(error),
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// The connection could not be opened.
    Open,
    /// The command (or bulk copy channel) could not be built, nothing was executed.
    Build,
    /// The driver failed while executing a command or advancing a cursor.
    Execute,
    /// A column value is incompatible with the entity member it maps to.
    Mapping,
    /// Column mapping or streaming of a bulk copy failed.
    BulkLoad,
}

impl Failure {
    pub fn of(error: &Error) -> Option<Failure> {
        error.downcast_ref::<Failure>().copied()
    }
}

impl Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Failure::Open => "Could not open the connection",
            Failure::Build => "Could not build the command",
            Failure::Execute => "Error while executing the command",
            Failure::Mapping => "Could not map the row to the entity",
            Failure::BulkLoad => "Bulk load failed",
        })
    }
}

/// Attaches the failure label and logs the resulting error.
pub(crate) fn fail(error: Error, failure: Failure) -> Error {
    let error = error.context(failure);
    log::error!("{:#}", error);
    error
}
