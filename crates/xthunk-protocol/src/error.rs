use crate::codes::TableSignature;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("dispatch table mismatch: client {client:?}, host {host:?}")]
    TableMismatch {
        client: TableSignature,
        host: TableSignature,
    },

    #[error("host table slot {index} holds {found}, expected {expected}")]
    TableOrder {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("a dispatcher is already attached")]
    AlreadyAttached,
}
