/// Outcome of one pipeline stage that did not hit a hard error.
///
/// Missing configuration and failed upstream calls end up as `Skipped`;
/// hard local failures travel separately as `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage<T> {
    Done(T),
    Skipped(String),
}

impl<T> Stage<T> {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped(reason.into())
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    pub fn done(self) -> Option<T> {
        match self {
            Self::Done(value) => Some(value),
            Self::Skipped(_) => None,
        }
    }
}

impl<T: Default> Stage<T> {
    /// The produced value, or the empty value of a skipped stage.
    pub fn unwrap_or_default(self) -> T {
        self.done().unwrap_or_default()
    }
}
