//! The dialogue's state tagged-union and the event/reply payloads exchanged with the chat
//! transport.

/// The states of the transaction-entry conversation, from first prompt to confirmation.
/// `SelectCategory` serves two paths: the expense flow (before the account is chosen) and the
/// income flow (after the amount has been entered); the handler branches on the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    SelectType,
    SelectDate,
    SelectCategory,
    SelectAccount,
    SelectToAccount,
    EnterAmount,
    EnterComment,
    EnterHours,
    Confirm,
}

/// One user-originated event: either a discrete option token (a button press) or a line of
/// free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Select(String),
    Text(String),
}

/// A selectable option offered to the user: the label is for display, the token comes back in
/// an [`Event::Select`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    label: String,
    token: String,
}

impl Choice {
    pub(crate) fn new(label: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            token: token.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

/// The rendering payload returned from every dialogue step: prompt text plus the options the
/// user can pick from (empty when free text is expected).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    text: String,
    options: Vec<Choice>,
}

impl Reply {
    /// A prompt with no options, i.e. the next input is free text.
    pub(crate) fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: Vec::new(),
        }
    }

    /// A prompt with selectable options.
    pub(crate) fn with_options(text: impl Into<String>, options: Vec<Choice>) -> Self {
        Self {
            text: text.into(),
            options,
        }
    }

    pub fn message(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[Choice] {
        &self.options
    }
}
