//! Persisted node identity.
//!
//! Written when discovery completes and read once at boot, so a configured
//! grid comes back up without rediscovery. Stored as a versioned postcard
//! blob through [`StoragePort`]; anything unreadable counts as "no identity".

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{StorageError, StoragePort};
use crate::protocol::{DirectionSet, NodeType};

pub const IDENTITY_NAMESPACE: &str = "grid";
pub const IDENTITY_KEY: &str = "ident";

/// Bumped whenever the record layout changes. Older records are ignored.
pub const IDENTITY_VERSION: u8 = 1;

const MAX_RECORD: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedIdentity {
    pub version: u8,
    pub configured: bool,
    pub is_master: bool,
    pub node_type: NodeType,
    pub node_id: u8,
    /// Watch mask bits (see [`DirectionSet::bits`]).
    pub watch: u8,
    /// Hold mask bits.
    pub hold: u8,
}

impl PersistedIdentity {
    pub fn node(node_id: u8, node_type: NodeType, watch: DirectionSet, hold: DirectionSet) -> Self {
        Self {
            version: IDENTITY_VERSION,
            configured: true,
            is_master: false,
            node_type,
            node_id,
            watch: watch.bits(),
            hold: hold.bits(),
        }
    }

    pub fn master(master_id: u8, hold: DirectionSet) -> Self {
        Self {
            version: IDENTITY_VERSION,
            configured: true,
            is_master: true,
            node_type: NodeType::MasterPanel,
            node_id: master_id,
            watch: 0,
            hold: hold.bits(),
        }
    }

    pub const fn watch_set(&self) -> DirectionSet {
        DirectionSet::from_bits(self.watch)
    }

    pub const fn hold_set(&self) -> DirectionSet {
        DirectionSet::from_bits(self.hold)
    }
}

/// Load / save / clear of the single identity record.
pub struct IdentityStore;

impl IdentityStore {
    /// The stored identity, if one exists with the current version.
    pub fn load(storage: &impl StoragePort) -> Option<PersistedIdentity> {
        let mut buf = [0u8; MAX_RECORD];
        let len = match storage.read(IDENTITY_NAMESPACE, IDENTITY_KEY, &mut buf) {
            Ok(len) => len,
            Err(StorageError::NotFound) => return None,
            Err(e) => {
                warn!("identity read failed: {e}");
                return None;
            }
        };
        match postcard::from_bytes::<PersistedIdentity>(&buf[..len]) {
            Ok(ident) if ident.version == IDENTITY_VERSION => Some(ident),
            Ok(ident) => {
                warn!("identity version {} != {IDENTITY_VERSION}, ignoring", ident.version);
                None
            }
            Err(e) => {
                warn!("identity record corrupt: {e}");
                None
            }
        }
    }

    pub fn save(storage: &mut impl StoragePort, ident: &PersistedIdentity) -> Result<(), StorageError> {
        let mut buf = [0u8; MAX_RECORD];
        let bytes = postcard::to_slice(ident, &mut buf).map_err(|_| StorageError::BufferTooSmall)?;
        storage.write(IDENTITY_NAMESPACE, IDENTITY_KEY, bytes)?;
        info!(
            "identity saved: id {} {:?}{}",
            ident.node_id,
            ident.node_type,
            if ident.is_master { " (master)" } else { "" }
        );
        Ok(())
    }

    pub fn clear(storage: &mut impl StoragePort) -> Result<(), StorageError> {
        storage.delete(IDENTITY_NAMESPACE, IDENTITY_KEY)?;
        info!("identity cleared");
        Ok(())
    }
}
