use std::collections::HashMap;

pub(crate) const ID_LEN: usize = 5;
pub(crate) const ID_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

// Largest multiple of 62 that fits in a byte; anything above is rejected.
const ACCEPT_BELOW: u8 = 248;

const MAX_ISSUE_ATTEMPTS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("random source unavailable: {0}")]
    Entropy(String),
    #[error("session id collided {attempts} times in a row")]
    Collision { attempts: usize },
}

/// Returns a fresh 5-character id drawn uniformly from `[A-Za-z0-9]`.
pub fn make_id() -> Result<String, IdError> {
    make_id_with(|buf| getrandom::getrandom(buf).map_err(|e| IdError::Entropy(e.to_string())))
}

pub(crate) fn make_id_with(
    mut fill: impl FnMut(&mut [u8]) -> Result<(), IdError>,
) -> Result<String, IdError> {
    let mut out = String::with_capacity(ID_LEN);
    let mut buf = [0u8; 16];

    while out.len() < ID_LEN {
        fill(&mut buf)?;
        for b in buf {
            if b < ACCEPT_BELOW {
                out.push(ID_ALPHABET[(b % ID_ALPHABET.len() as u8) as usize] as char);
                if out.len() == ID_LEN {
                    break;
                }
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
pub(crate) fn is_session_id(s: &str) -> bool {
    s.len() == ID_LEN && s.bytes().all(|b| ID_ALPHABET.contains(&b))
}

/// Live session ids and the recipient each container was created under.
#[derive(Debug, Default)]
pub(crate) struct SessionRegistry {
    sessions: HashMap<String, String>,
}

impl SessionRegistry {
    pub fn issue(&mut self, recipient: &str) -> Result<String, IdError> {
        self.issue_with(recipient, make_id)
    }

    pub fn issue_with(
        &mut self,
        recipient: &str,
        mut gen: impl FnMut() -> Result<String, IdError>,
    ) -> Result<String, IdError> {
        for _ in 0..MAX_ISSUE_ATTEMPTS {
            let id = gen()?;
            if self.sessions.contains_key(&id) {
                leptos::logging::warn!("session id {id} already live, regenerating");
                continue;
            }
            self.sessions.insert(id.clone(), recipient.to_string());
            return Ok(id);
        }

        Err(IdError::Collision {
            attempts: MAX_ISSUE_ATTEMPTS,
        })
    }

    pub fn recipient(&self, id: &str) -> Option<&str> {
        self.sessions.get(id).map(|s| s.as_str())
    }

    /// Forgets every session whose container lived in `recipient`.
    pub fn retire_recipient(&mut self, recipient: &str) {
        self.sessions.retain(|_, r| r != recipient);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }
}
