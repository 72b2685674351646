//! KRB-CRED messages carrying forwarded credentials.

use std::fmt;

use kerbcred_core::{Destroyable, KerberosPrincipal};
use parking_lot::RwLock;
use zeroize::{Zeroize, Zeroizing};

use crate::error::{CredError, Result};

struct CredMessageState {
    sender: KerberosPrincipal,
    recipient: KerberosPrincipal,
    message: Zeroizing<Vec<u8>>,
}

/// An encoded KRB-CRED message and the two principals it passes between.
pub struct KerberosCredMessage {
    state: RwLock<Option<CredMessageState>>,
}

impl KerberosCredMessage {
    pub fn new(sender: KerberosPrincipal, recipient: KerberosPrincipal, message: &[u8]) -> Result<Self> {
        if message.is_empty() {
            return Err(CredError::InvalidArgument(
                "KRB-CRED message cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            state: RwLock::new(Some(CredMessageState {
                sender,
                recipient,
                message: Zeroizing::new(message.to_vec()),
            })),
        })
    }

    fn with_state<R>(&self, f: impl FnOnce(&CredMessageState) -> R) -> Result<R> {
        self.state
            .read()
            .as_ref()
            .map(f)
            .ok_or(CredError::InvalidState("KRB-CRED message"))
    }

    /// A fresh copy of the encoded message.
    pub fn encoded(&self) -> Result<Vec<u8>> {
        self.with_state(|s| s.message.to_vec())
    }

    pub fn sender(&self) -> Result<KerberosPrincipal> {
        self.with_state(|s| s.sender.clone())
    }

    pub fn recipient(&self) -> Result<KerberosPrincipal> {
        self.with_state(|s| s.recipient.clone())
    }
}

impl Destroyable for KerberosCredMessage {
    fn destroy(&self) -> kerbcred_core::Result<()> {
        if let Some(mut state) = self.state.write().take() {
            state.message.zeroize();
        }
        Ok(())
    }

    fn is_destroyed(&self) -> bool {
        self.state.read().is_none()
    }
}

impl PartialEq for KerberosCredMessage {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        let (first, second) = if (self as *const Self) < (other as *const Self) {
            (self, other)
        } else {
            (other, self)
        };
        let a = first.state.read();
        let b = second.state.read();
        match (a.as_ref(), b.as_ref()) {
            (Some(a), Some(b)) => {
                a.sender == b.sender
                    && a.recipient == b.recipient
                    && a.message.as_slice() == b.message.as_slice()
            }
            _ => false,
        }
    }
}

impl fmt::Debug for KerberosCredMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for KerberosCredMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state.read().as_ref() {
            Some(s) => write!(
                f,
                "KRB_CRED from {} to {} ({} bytes)",
                s.sender,
                s.recipient,
                s.message.len()
            ),
            None => f.write_str("Destroyed KerberosCredMessage"),
        }
    }
}
