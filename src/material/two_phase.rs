use crate::StrError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Holds the trial and committed (reached-equilibrium) copies of a state
///
/// The trial copy is the only one that can be mutated; it is valid only within the current
/// iteration. The committed copy changes exclusively via [TwoPhase::commit].
///
/// ```text
///            init_trial
///        ┌───────────────┐
///        ▼               │
///     [trial] ──────► [committed]
///              commit
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TwoPhase<T> {
    trial: T,
    committed: T,
}

impl<T> TwoPhase<T>
where
    T: Clone,
{
    /// Allocates a new instance with both copies equal to the initial state
    pub fn new(initial: T) -> Self {
        TwoPhase {
            trial: initial.clone(),
            committed: initial,
        }
    }

    /// Re-seeds the trial state from the committed state
    pub fn init_trial(&mut self) {
        self.trial.clone_from(&self.committed);
    }

    /// Returns the trial state
    pub fn trial(&self) -> &T {
        &self.trial
    }

    /// Returns an access to the trial state
    pub fn trial_mut(&mut self) -> &mut T {
        &mut self.trial
    }

    /// Returns the committed state
    pub fn committed(&self) -> &T {
        &self.committed
    }

    /// Commits the trial state
    pub fn commit(&mut self) {
        self.committed.clone_from(&self.trial);
    }
}

/// Writes a context (checkpoint) record to a stream
///
/// Each record is written as a JSON value followed by a newline; thus, several records
/// may be written to the same stream and read back in the same order.
pub fn save_context<T, W>(value: &T, writer: &mut W) -> Result<(), StrError>
where
    T: Serialize,
    W: Write,
{
    serde_json::to_writer(&mut *writer, value).map_err(|_| "cannot write context")?;
    writer.write_all(b"\n").map_err(|_| "cannot write context")?;
    Ok(())
}

/// Reads the next context (checkpoint) record from a stream
pub fn restore_context<T, R>(reader: &mut R) -> Result<T, StrError>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut stream = serde_json::Deserializer::from_reader(reader).into_iter::<T>();
    match stream.next() {
        Some(Ok(value)) => Ok(value),
        _ => Err("cannot read context"),
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
