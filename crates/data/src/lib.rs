//! Data layer for the Puente accounting back-office.
//!
//! - `remote` - remote procedure seam, HTTP adapter, response normalization
//! - `entities` - accounts, account groups, cost centers, transactions
//! - `repository` - paginated reads merged with the overlay cache, mutations
//! - `gateway` - batch transaction create and sale registration
//! - `composer` - draft lifecycle from editing to commit

pub mod composer;
pub mod entities;
pub mod error;
pub mod gateway;
pub mod remote;
pub mod repository;

pub use composer::{ComposerState, TransactionComposer};
pub use entities::{
    Account, AccountDraft, AccountGroup, AccountGroupDraft, CostCenter, CostCenterDraft, Entity,
    EntityDraft, MutationMode, Transaction, TransactionRecordDraft,
};
pub use error::{DataError, DataResult, TransportError};
pub use gateway::{CommittedTransaction, PreparedTransaction, TransactionGateway};
pub use remote::{HttpRemote, RemoteProcedures};
pub use repository::{
    AccountGroupRepository, AccountRepository, CostCenterRepository, EntityRepository,
    TransactionRepository,
};
