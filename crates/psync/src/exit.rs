use std::process::ExitCode;

/// Outcome of a command: its exit status and an optional closing message.
#[derive(Debug)]
pub struct Exit {
    code: u8,
    message: Option<String>,
}

impl Exit {
    #[must_use]
    pub fn success() -> Self {
        Self {
            code: 0,
            message: None,
        }
    }

    #[must_use]
    pub fn error() -> Self {
        Self {
            code: 1,
            message: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Print the message, errors to stderr, and turn into an [`ExitCode`].
    ///
    /// `quiet` only silences success messages.
    pub fn report(self, quiet: bool) -> ExitCode {
        if let Some(message) = &self.message {
            if self.code != 0 {
                eprintln!("{message}");
            } else if !quiet {
                println!("{message}");
            }
        }
        ExitCode::from(self.code)
    }
}
