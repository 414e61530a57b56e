//! Error taxonomy at the controller boundary.
//!
//! Every variant is recoverable: the controller turns it into a dismissible
//! notification and keeps running.

/// A backend call failed: transport error, non-2xx status, or an undecodable body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct GatewayError {
  /// Server-supplied `error` field when present, a generic description otherwise.
  pub message: String,
  /// HTTP status, if a response was received at all.
  pub status: Option<u16>,
}

impl GatewayError {
  pub fn new<S: Into<String>>(message: S) -> Self {
    Self { message: message.into(), status: None }
  }

  pub fn with_status<S: Into<String>>(message: S, status: u16) -> Self {
    Self { message: message.into(), status: Some(status) }
  }
}

/// A host-privileged operation failed.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
  /// The player executable could not be found.
  #[error("Media player '{0}' not found. Install VLC or set `player` in prefs.toml")]
  PlayerNotFound(String),

  /// The process could not be spawned.
  #[error("Failed to launch {program}: {source}")]
  Launch {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// The native file dialog failed or isn't available.
  #[error("File dialog failed: {0}")]
  Dialog(String),

  /// The seek position isn't a valid `HH:MM:SS` timecode.
  #[error("Invalid timecode '{0}'")]
  InvalidTimecode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
  /// Rejected before dispatch. Never reaches the gateway.
  #[error("{0}")]
  Validation(String),

  #[error(transparent)]
  Gateway(#[from] GatewayError),

  #[error(transparent)]
  Bridge(#[from] BridgeError),
}

impl ConsoleError {
  pub fn validation<S: Into<String>>(msg: S) -> Self {
    Self::Validation(msg.into())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn gateway_message_is_displayed_verbatim() {
    let err = ConsoleError::from(GatewayError::with_status("name_taken", 400));
    assert_eq!(err.to_string(), "name_taken");
  }

  #[test]
  fn launch_error_names_program() {
    let err = BridgeError::Launch {
      program: "open".into(),
      source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
    };
    assert_eq!(err.to_string(), "Failed to launch open: denied");
  }
}
