//! Shared conversion from the persistence crate's error type into
//! [`ReservaError`]. Lives here (not as a `From` impl) because neither
//! `reserva-core` nor `reserva-agent` owns both types.

use reserva_core::ReservaError;
use reserva_persistence::PersistenceError;

pub(crate) fn map_persistence(e: PersistenceError) -> ReservaError {
    match e {
        PersistenceError::StockConflict { product_id, message } => {
            ReservaError::stock_conflict(product_id, message)
        }
        PersistenceError::NotFound(msg) => ReservaError::validation("reservation", msg),
        other => ReservaError::Internal(other.to_string()),
    }
}
