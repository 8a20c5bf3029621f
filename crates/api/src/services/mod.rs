//! Application services.

pub mod auth;
pub mod email;
pub mod session;

pub use auth::{AuthError, AuthService};
pub use email::{EmailError, LogNotifier, Notifier, SmtpNotifier};
pub use session::{SessionError, SessionIssuer};
