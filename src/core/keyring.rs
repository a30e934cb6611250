use std::error::Error;
use std::fmt;

use keyring::Entry;
use tracing::debug;

use crate::core::settings::Credential;

const KEYRING_SERVICE: &str = "parlance";
const KEYRING_ENTRY: &str = "api-key";

/// Describes failures when attempting to access the system keyring.
///
/// Recoverable errors indicate that the credential backend was
/// temporarily unavailable (for example when the keychain service is
/// locked or inaccessible). Permanent errors surface the underlying
/// cause directly so callers can report them to the user.
#[derive(Debug)]
pub enum KeyringAccessError {
    Recoverable(keyring::Error),
    Permanent(keyring::Error),
}

impl KeyringAccessError {
    fn inner(&self) -> &keyring::Error {
        match self {
            KeyringAccessError::Recoverable(err) | KeyringAccessError::Permanent(err) => err,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, KeyringAccessError::Recoverable(_))
    }
}

impl From<keyring::Error> for KeyringAccessError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_) => {
                KeyringAccessError::Recoverable(err)
            }
            other => KeyringAccessError::Permanent(other),
        }
    }
}

impl fmt::Display for KeyringAccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "keyring unavailable: {}", self.inner())
    }
}

impl Error for KeyringAccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.inner())
    }
}

/// Reads and writes the user's API key in the platform keyring.
pub struct CredentialStore {
    use_keyring: bool,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::new_with_keyring(true)
    }

    /// Construct a store, optionally disabling keyring access (useful for
    /// tests and `--no-keyring`). A disabled store holds nothing.
    pub fn new_with_keyring(use_keyring: bool) -> Self {
        Self { use_keyring }
    }

    pub fn is_enabled(&self) -> bool {
        self.use_keyring
    }

    fn entry(&self) -> Result<Entry, KeyringAccessError> {
        Entry::new(KEYRING_SERVICE, KEYRING_ENTRY).map_err(KeyringAccessError::from)
    }

    pub fn get(&self) -> Result<Option<String>, KeyringAccessError> {
        if !self.use_keyring {
            return Ok(None);
        }
        match self.entry()?.get_password() {
            Ok(secret) => {
                debug!("Keyring lookup: credential present");
                Ok(Some(secret))
            }
            Err(keyring::Error::NoEntry) => {
                debug!("Keyring lookup: no credential stored");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn store(&self, credential: &Credential) -> Result<(), KeyringAccessError> {
        if !self.use_keyring {
            return Ok(());
        }
        self.entry()?
            .set_password(credential.expose())
            .map_err(KeyringAccessError::from)?;
        debug!(credential = %credential.redacted(), "Stored credential in keyring");
        Ok(())
    }

    /// Remove the stored key. Returns `false` when nothing was stored.
    pub fn remove(&self) -> Result<bool, KeyringAccessError> {
        if !self.use_keyring {
            return Ok(false);
        }
        match self.entry()?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}
