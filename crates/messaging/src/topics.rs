/// Topic and direction contract (§6 of the design). Every publish on these
/// topics is keyed by `sagaId` except `customer`, which is keyed by
/// `customerId` — there is no saga in play for customer replication.
pub const PAYMENT_REQUEST: &str = "payment-request";
pub const PAYMENT_RESPONSE: &str = "payment-response";
pub const RESTAURANT_APPROVAL_REQUEST: &str = "restaurant-approval-request";
pub const RESTAURANT_APPROVAL_RESPONSE: &str = "restaurant-approval-response";
pub const CUSTOMER: &str = "customer";
