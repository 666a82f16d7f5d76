mod bootstrap;
mod config_cmd;
pub mod status;
mod sync_cmd;

pub use bootstrap::BootstrapCommand;
pub use config_cmd::ConfigCommand;
pub use sync_cmd::SyncCommand;

use hevymirror::db::MirrorError;
use hevymirror::sync::{BootstrapError, ClientError, SyncError};

/// Errors from mirror commands
#[derive(Debug)]
pub enum CommandError {
    Client(ClientError),
    Bootstrap(BootstrapError),
    Mirror(MirrorError),
    Sync(SyncError),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::Client(e) => write!(f, "{}", e),
            CommandError::Bootstrap(e) => write!(f, "{}", e),
            CommandError::Mirror(e) => write!(f, "{}", e),
            CommandError::Sync(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::Client(e) => Some(e),
            CommandError::Bootstrap(e) => Some(e),
            CommandError::Mirror(e) => Some(e),
            CommandError::Sync(e) => Some(e),
        }
    }
}

impl From<ClientError> for CommandError {
    fn from(e: ClientError) -> Self {
        CommandError::Client(e)
    }
}

impl From<BootstrapError> for CommandError {
    fn from(e: BootstrapError) -> Self {
        CommandError::Bootstrap(e)
    }
}

impl From<MirrorError> for CommandError {
    fn from(e: MirrorError) -> Self {
        CommandError::Mirror(e)
    }
}

impl From<SyncError> for CommandError {
    fn from(e: SyncError) -> Self {
        CommandError::Sync(e)
    }
}
