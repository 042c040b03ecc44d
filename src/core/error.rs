use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// The completion provider rejected the request or could not be reached.
    LlmProvider { provider: String, details: String },
    /// The completion provider answered with a body we could not decode.
    MalformedResponse(String),
    /// The completion provider answered without a usable first choice.
    EmptyCompletion,
    /// An error occurred while rendering the page.
    TemplateRendering(String),
    /// A generic system or unknown error.
    System(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::LlmProvider { provider, details } => {
                write!(f, "LLM error ({provider}): {details}")
            }
            Error::MalformedResponse(msg) => write!(f, "Malformed completion response: {msg}"),
            Error::EmptyCompletion => write!(f, "Completion response contained no choices"),
            Error::TemplateRendering(msg) => write!(f, "Template error: {msg}"),
            Error::System(msg) => write!(f, "System error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
