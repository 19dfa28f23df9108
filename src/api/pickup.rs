//! Pickup (dispense) endpoint: `{id}` → implementation-defined acknowledgement.

use serde::Serialize;

use crate::session::SessionId;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickupRequest {
    pub id: SessionId,
}
