use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::error::{Result, TransportError};

/// Highest GPIO line number the registry accepts.
pub const MAX_PIN: u32 = 1023;

/// A bus resource a session holds exclusively while it is open.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    /// A serial device, identified by its path (e.g. `/dev/ttyUSB0`).
    Transport(String),
    /// A direction-control GPIO line for half-duplex adapters.
    Pin(u32),
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(name) => write!(f, "transport {name}"),
            Self::Pin(pin) => write!(f, "pin {pin}"),
        }
    }
}

/// Tracks which transports and pins are currently claimed.
///
/// Cloning yields another handle to the same registry. Claims are released
/// when the returned [`ResourceGuard`] is dropped.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    claimed: Arc<Mutex<HashSet<Resource>>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim every resource in `resources`, or none of them.
    pub fn claim(&self, resources: &[Resource]) -> Result<ResourceGuard> {
        for resource in resources {
            if let Resource::Pin(pin) = resource {
                if *pin > MAX_PIN {
                    return Err(TransportError::InvalidResource(format!(
                        "pin {pin} exceeds {MAX_PIN}"
                    )));
                }
            }
        }

        let mut claimed = self.lock();
        let mut unique: Vec<Resource> = Vec::with_capacity(resources.len());
        for resource in resources {
            if claimed.contains(resource) || unique.contains(resource) {
                return Err(TransportError::ResourceInUse(resource.clone()));
            }
            unique.push(resource.clone());
        }
        claimed.extend(unique.iter().cloned());
        debug!(resources = ?unique, "claimed bus resources");

        Ok(ResourceGuard {
            registry: self.clone(),
            resources: unique,
        })
    }

    /// True if `resource` is held by some live guard.
    pub fn is_claimed(&self, resource: &Resource) -> bool {
        self.lock().contains(resource)
    }

    fn release(&self, resources: &[Resource]) {
        let mut claimed = self.lock();
        for resource in resources {
            claimed.remove(resource);
        }
        debug!(?resources, "released bus resources");
    }

    // A panic while holding the lock cannot leave the set half-updated, so a
    // poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, HashSet<Resource>> {
        self.claimed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Holds a set of claimed resources until dropped.
#[derive(Debug)]
pub struct ResourceGuard {
    registry: ResourceRegistry,
    resources: Vec<Resource>,
}

impl ResourceGuard {
    /// The resources held by this guard.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }
}

impl Drop for ResourceGuard {
    fn drop(&mut self) {
        self.registry.release(&self.resources);
    }
}
