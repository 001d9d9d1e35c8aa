use snafu::Snafu;

pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// The input does not start with `curl`, so there is nothing to parse.
    /// Callers typically surface this as a warning and leave their form state
    /// untouched.
    #[snafu(display("Input is not a curl command"))]
    NotCurlCommand,

    #[snafu(display("Failed to render command template"))]
    Render { source: minijinja::Error },
}
