//! Local accounts and their link to remote identities

pub mod linker;
pub mod store;

pub use linker::{IdentityLinker, LinkedAccount};
pub use store::{
    AccountRef, AccountStore, AccountStoreError, InMemoryAccountStore, Provisioning,
    TokenAssociation,
};
