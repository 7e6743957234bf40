use common::CustomerId;
use serde::{Deserialize, Serialize};

/// The Order service's local, read-only replica of customer identity,
/// populated from the `customer` topic (§4.6). The core requires only that
/// an entry exists before an order referencing that customer can be
/// validated; cross-replica consistency is eventual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerReplicaEntry {
    pub id: CustomerId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}
