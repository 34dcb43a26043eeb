//! Result of one executed command.

use crate::parser::UntaggedResponse;
use crate::types::{ResponseCode, Status, Tag};
use crate::{Error, Result};

/// The terminal line of a command: its tagged status.
///
/// A completion with [`Status::Bye`] is synthesized when the server said
/// `BYE` and closed the stream before tagging the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Tag the command was sent under.
    pub tag: Tag,
    /// Reported status.
    pub status: Status,
    /// Bracketed response code, if any.
    pub code: Option<ResponseCode>,
    /// Human-readable text.
    pub text: String,
}

impl Completion {
    pub(crate) fn bye(tag: Tag, code: Option<ResponseCode>, text: String) -> Self {
        Self {
            tag,
            status: Status::Bye,
            code,
            text,
        }
    }

    /// Classifies the completion as OK, NO, BAD or BYE.
    #[must_use]
    pub const fn classify(&self) -> Status {
        match self.status {
            Status::Ok | Status::PreAuth => Status::Ok,
            other => other,
        }
    }

    /// Maps anything but OK to an error.
    ///
    /// # Errors
    ///
    /// [`Error::No`] carries the response code so callers can tell
    /// over-quota from already-exists and the like.
    pub fn check(&self) -> Result<()> {
        match self.classify() {
            Status::Ok | Status::PreAuth => Ok(()),
            Status::No => Err(Error::No {
                code: self.code.clone(),
                text: self.text.clone(),
            }),
            Status::Bad => Err(Error::Bad(self.text.clone())),
            Status::Bye => Err(Error::ConnectionBroken(self.text.clone())),
        }
    }
}

/// Untagged responses collected while a command ran, plus its completion.
///
/// Callers pull out what they understand with [`Responses::take`]; whatever
/// is left goes to the connection's observers on
/// [`Connection::dispatch`](super::Connection::dispatch).
#[derive(Debug, Clone, PartialEq)]
pub struct Responses {
    untagged: Vec<Option<UntaggedResponse>>,
    completion: Completion,
}

impl Responses {
    pub(crate) fn new(untagged: Vec<UntaggedResponse>, completion: Completion) -> Self {
        Self {
            untagged: untagged.into_iter().map(Some).collect(),
            completion,
        }
    }

    /// The tagged completion.
    #[must_use]
    pub const fn completion(&self) -> &Completion {
        &self.completion
    }

    /// Shorthand for `completion().check()`.
    ///
    /// # Errors
    ///
    /// See [`Completion::check`].
    pub fn check(&self) -> Result<()> {
        self.completion.check()
    }

    /// Removes every response `extract` accepts, in arrival order.
    ///
    /// `extract` hands back responses it does not want as `Err`, and those
    /// stay in place for dispatch.
    pub fn take<T>(
        &mut self,
        mut extract: impl FnMut(UntaggedResponse) -> std::result::Result<T, UntaggedResponse>,
    ) -> Vec<T> {
        let mut taken = Vec::new();
        for slot in &mut self.untagged {
            if let Some(response) = slot.take() {
                match extract(response) {
                    Ok(value) => taken.push(value),
                    Err(response) => *slot = Some(response),
                }
            }
        }
        taken
    }

    /// Responses nobody has consumed yet.
    pub fn remaining(&self) -> impl Iterator<Item = &UntaggedResponse> {
        self.untagged.iter().flatten()
    }

    pub(crate) fn into_remaining(self) -> impl Iterator<Item = UntaggedResponse> {
        self.untagged.into_iter().flatten()
    }
}
