use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a `Uuid`-backed identifier newtype with the conversions every
/// aggregate id in this workspace needs, without mixing ids of different
/// kinds up at the type level.
macro_rules! uuid_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id!(OrderId, "Identity of an Order aggregate.");
uuid_id!(CustomerId, "Identity of a customer, owned by the Customer replica.");
uuid_id!(RestaurantId, "Identity of a restaurant, owned by the Restaurant replica.");
uuid_id!(ProductId, "Identity of a product listed by a restaurant.");

/// The saga id is, by contract, the originating order id: it is used as the
/// partition key on every topic so all messages belonging to one saga land
/// on the same partition and are applied in publish order.
pub type SagaId = OrderId;
