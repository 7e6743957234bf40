use serde::{Deserialize, Serialize};

/// The state of an order in its lifecycle.
///
/// ```text
///             pay()            approve()
/// PENDING ─────────────► PAID ──────────────► APPROVED
///    │                    │
///    │ initCancel()       │ initCancel(failures)
///    ▼                    ▼
///  CANCELLED         CANCELLING
///                         │
///                         │ cancel(failures)
///                         ▼
///                     CANCELLED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Approved,
    Cancelling,
    Cancelled,
}

impl OrderStatus {
    pub fn can_pay(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    pub fn can_approve(&self) -> bool {
        matches!(self, OrderStatus::Paid)
    }

    /// `initCancel` is legal from PENDING (payment failed before any
    /// approval work started) or from PAID (restaurant rejected, a
    /// compensation must now run).
    pub fn can_init_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Paid)
    }

    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Cancelling)
    }

    /// (I4) once CANCELLED or APPROVED, no further business transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Approved)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Approved => "APPROVED",
            OrderStatus::Cancelling => "CANCELLING",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
