//! Administrator and voter registration.

use runoff_store::{ReadTxn, StoreError, WriteTxn};
use runoff_types::Identity;

use crate::error::ElectionError;

pub(crate) const ADMIN_KEY: &str = "admin";

/// Knows the single administrator and which identities may vote.
#[derive(Clone, Debug)]
pub struct IdentityRegistry {
    admin: Identity,
}

impl IdentityRegistry {
    /// Bind the registry to the ledger's administrator.
    ///
    /// The first call against an empty store records `admin`; later calls
    /// must name the same identity.
    pub fn establish<T: WriteTxn>(txn: &mut T, admin: Identity) -> Result<Self, ElectionError> {
        match txn.get_meta(ADMIN_KEY)? {
            Some(bytes) => {
                let stored = String::from_utf8(bytes)
                    .ok()
                    .and_then(|s| Identity::new(s).ok())
                    .ok_or_else(|| StoreError::Corruption("stored admin is not an identity".into()))?;
                if stored != admin {
                    return Err(ElectionError::AdminMismatch {
                        stored,
                        requested: admin,
                    });
                }
            }
            None => {
                txn.put_meta(ADMIN_KEY, admin.as_bytes())?;
                tracing::info!(admin = %admin, "recorded ledger administrator");
            }
        }
        Ok(Self { admin })
    }

    pub fn admin(&self) -> &Identity {
        &self.admin
    }

    pub fn is_admin(&self, identity: &Identity) -> bool {
        *identity == self.admin
    }

    pub fn require_admin(&self, identity: &Identity) -> Result<(), ElectionError> {
        if self.is_admin(identity) {
            Ok(())
        } else {
            Err(ElectionError::Unauthorized(identity.clone()))
        }
    }

    pub fn register<T: WriteTxn>(&self, txn: &mut T, identity: &Identity) -> Result<(), ElectionError> {
        if txn.is_registered(identity)? {
            return Err(ElectionError::AlreadyRegistered(identity.clone()));
        }
        txn.put_registration(identity)?;
        Ok(())
    }

    pub fn is_registered<T: ReadTxn>(&self, txn: &T, identity: &Identity) -> Result<bool, ElectionError> {
        Ok(txn.is_registered(identity)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runoff_nullables::NullStore;
    use runoff_store::Store;

    fn id(s: &str) -> Identity {
        Identity::new(s).unwrap()
    }

    #[test]
    fn admin_is_fixed_on_first_establish() {
        let store = NullStore::new();
        let mut txn = store.write_txn().unwrap();
        IdentityRegistry::establish(&mut txn, id("root")).unwrap();
        txn.commit().unwrap();

        let mut txn = store.write_txn().unwrap();
        let registry = IdentityRegistry::establish(&mut txn, id("root")).unwrap();
        assert!(registry.is_admin(&id("root")));
        assert!(!registry.is_admin(&id("mallory")));

        let err = IdentityRegistry::establish(&mut txn, id("mallory")).unwrap_err();
        assert!(matches!(err, ElectionError::AdminMismatch { .. }));
    }

    #[test]
    fn register_twice_fails() {
        let store = NullStore::new();
        let mut txn = store.write_txn().unwrap();
        let registry = IdentityRegistry::establish(&mut txn, id("root")).unwrap();
        registry.register(&mut txn, &id("v1")).unwrap();
        assert!(registry.is_registered(&txn, &id("v1")).unwrap());
        let err = registry.register(&mut txn, &id("v1")).unwrap_err();
        assert!(matches!(err, ElectionError::AlreadyRegistered(_)));
    }

    #[test]
    fn admin_is_not_implicitly_a_voter() {
        let store = NullStore::new();
        let mut txn = store.write_txn().unwrap();
        let registry = IdentityRegistry::establish(&mut txn, id("root")).unwrap();
        assert!(!registry.is_registered(&txn, &id("root")).unwrap());
        assert!(registry.require_admin(&id("root")).is_ok());
    }
}
