use std::fmt;

/// Error type for relay operations
/// Implements Clone for sending through channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// Prompt was empty or absent, rejected before dispatch
    MissingPrompt
  , /// Resolved endpoint has no URL configured
    EndpointNotConfigured(String)
  , /// Named profile absent from the profile list
    ProfileNotFound(String)
  , /// Cancellation timer fired before the call completed
    Timeout(u64)
  , /// Caller cancelled the in-flight call
    Cancelled
  , /// DNS/connection/TLS level failure
    Transport(String)
  , /// Response received with a status outside 200-299
    Http(u16)
  , /// Failed to decode a response body
    Parse(String)
  , /// Generic error
    Other(String)
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::MissingPrompt => {
              write!(f, "Missing prompt")
            }
          , Error::EndpointNotConfigured(label) => {
              write!(f, "{} endpoint not configured", label)
            }
          , Error::ProfileNotFound(name) => {
              write!(f, "Profile '{}' not found", name)
            }
          , Error::Timeout(ms) => {
              write!(f, "Request timed out after {}ms", ms)
            }
          , Error::Cancelled => {
              write!(f, "Request cancelled")
            }
          , Error::Transport(msg) => {
              write!(f, "{}", msg)
            }
          , Error::Http(status) => {
              write!(f, "HTTP {}", status)
            }
          , Error::Parse(msg) => {
              write!(f, "Parse error: {}", msg)
            }
          , Error::Other(msg) => {
              write!(f, "{}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Other(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Other(s.to_string())
    }
}
