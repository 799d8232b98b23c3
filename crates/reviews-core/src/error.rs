/// Errors that can occur while collecting review reports.
///
/// Library crates return this type directly; the binary converts it into a
/// `miette::Report` at the boundary, so every variant carries the exact text
/// the user sees on stderr.
///
/// # Examples
///
/// ```
/// use reviews_core::ReviewsError;
///
/// let err = ReviewsError::Remote("Session key is invalid.".into());
/// assert_eq!(err.to_string(), "Session key is invalid.");
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ReviewsError {
    /// A required positional argument was missing or empty.
    #[error("{0}")]
    #[diagnostic(code(my_reviews::argument))]
    Argument(String),

    /// The external conduit client could not be found.
    #[error("Could not find the `{binary}` binary.")]
    #[diagnostic(
        code(my_reviews::tool_not_found),
        help(
            "Install Arcanist by following https://we.phorge.it/book/phorge/article/installation_guide/, \
             or point MY_REVIEWS_ARC_PATH at an existing `arc` binary."
        )
    )]
    ToolNotFound {
        /// The binary that was looked up.
        binary: String,
    },

    /// The remote service answered with an application-level error.
    #[error("{0}")]
    #[diagnostic(code(my_reviews::remote))]
    Remote(String),

    /// A subprocess or HTTP request failed below the application layer.
    #[error("error running `{command}`: {message}")]
    #[diagnostic(code(my_reviews::transport))]
    Transport {
        /// The command or request that failed.
        command: String,
        /// What went wrong, usually the captured stderr.
        message: String,
    },

    /// A response could not be parsed into the expected shape.
    #[error("malformed response: {0}")]
    #[diagnostic(code(my_reviews::malformed_response))]
    MalformedResponse(String),

    /// Terminal or filesystem I/O failure.
    #[error("IO error: {0}")]
    #[diagnostic(code(my_reviews::io))]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ReviewsError {
    fn from(err: serde_json::Error) -> Self {
        ReviewsError::MalformedResponse(err.to_string())
    }
}
