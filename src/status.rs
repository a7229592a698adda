//! Order & Payment Status

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use thiserror::Error;

/// An unrecognised status string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} status: {value}")]
pub struct StatusParseError {
    kind: &'static str,
    value: String,
}

/// A status change the state machine does not allow.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// Order status cannot move from `from` to `to`.
    #[error("order cannot move from {from} to {to}")]
    Order {
        /// Current status.
        from: OrderStatus,

        /// Requested status.
        to: OrderStatus,
    },

    /// Payment status cannot move from `from` to `to`.
    #[error("payment cannot move from {from} to {to}")]
    Payment {
        /// Current status.
        from: PaymentStatus,

        /// Requested status.
        to: PaymentStatus,
    },
}

/// Order lifecycle status.
///
/// `Pending` is the only initial state. `Delivered`, `Cancelled` and
/// `Refunded` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    /// Placed, awaiting settlement.
    Pending,

    /// Payment settled.
    Confirmed,

    /// Being prepared for shipping.
    Processing,

    /// Handed to a carrier.
    Shipped,

    /// Received by the customer.
    Delivered,

    /// Cancelled before fulfilment.
    Cancelled,

    /// Refunded after payment.
    Refunded,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 7] = [
        Self::Pending,
        Self::Confirmed,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
        Self::Refunded,
    ];

    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Processing => "PROCESSING",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
            Self::Refunded => "REFUNDED",
        }
    }

    /// Whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled | Self::Refunded)
    }

    /// Whether the order may move directly to `next`.
    pub fn can_transition_to(&self, next: Self) -> bool {
        use OrderStatus::{
            Cancelled, Confirmed, Delivered, Pending, Processing, Refunded, Shipped,
        };

        matches!(
            (self, next),
            (Pending, Confirmed | Cancelled)
                | (Confirmed, Processing | Cancelled | Refunded)
                | (Processing, Shipped | Cancelled | Refunded)
                | (Shipped, Delivered | Cancelled | Refunded)
        )
    }

    /// Validate a move to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::Order`] when the move is not allowed.
    pub fn transition_to(self, next: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError::Order {
                from: self,
                to: next,
            })
        }
    }

    /// Whether moving to `next` must hand reserved stock back to inventory.
    pub fn releases_reservation(&self, next: Self) -> bool {
        !self.is_terminal() && matches!(next, Self::Cancelled | Self::Refunded)
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = StatusParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| StatusParseError {
                kind: "order",
                value: value.to_string(),
            })
    }
}

/// Payment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    /// Not yet settled.
    Pending,

    /// Settled successfully.
    Completed,

    /// Settlement failed.
    Failed,

    /// Money returned to the customer.
    Refunded,
}

impl PaymentStatus {
    /// Every status.
    pub const ALL: [Self; 4] = [Self::Pending, Self::Completed, Self::Failed, Self::Refunded];

    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Refunded => "REFUNDED",
        }
    }

    /// Whether the payment may move directly to `next`.
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Completed | Self::Failed) | (Self::Completed, Self::Refunded)
        )
    }

    /// Validate a move to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::Payment`] when the move is not allowed.
    pub fn transition_to(self, next: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError::Payment {
                from: self,
                to: next,
            })
        }
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = StatusParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| StatusParseError {
                kind: "payment",
                value: value.to_string(),
            })
    }
}

/// Result of resolving a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// Payment went through.
    Succeeded,

    /// Payment was declined, errored or timed out.
    Failed,
}

impl SettlementOutcome {
    /// Order and payment status an order settles into.
    pub fn statuses(&self) -> (OrderStatus, PaymentStatus) {
        match self {
            Self::Succeeded => (OrderStatus::Confirmed, PaymentStatus::Completed),
            Self::Failed => (OrderStatus::Cancelled, PaymentStatus::Failed),
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn pending_moves_to_confirmed_or_cancelled_only() {
        let allowed: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(|next| OrderStatus::Pending.can_transition_to(*next))
            .collect();

        assert_eq!(allowed, [OrderStatus::Confirmed, OrderStatus::Cancelled]);
    }

    #[test]
    fn fulfilment_path_is_linear() -> TestResult {
        let status = OrderStatus::Confirmed
            .transition_to(OrderStatus::Processing)?
            .transition_to(OrderStatus::Shipped)?
            .transition_to(OrderStatus::Delivered)?;

        assert_eq!(status, OrderStatus::Delivered);

        Ok(())
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for from in [
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
            OrderStatus::Refunded,
        ] {
            assert!(from.is_terminal());
            assert!(
                OrderStatus::ALL.iter().all(|to| !from.can_transition_to(*to)),
                "{from} should be terminal"
            );
        }
    }

    #[test]
    fn skipping_states_is_rejected() {
        assert_eq!(
            OrderStatus::Pending.transition_to(OrderStatus::Shipped),
            Err(TransitionError::Order {
                from: OrderStatus::Pending,
                to: OrderStatus::Shipped,
            })
        );
    }

    #[test]
    fn cancelling_or_refunding_live_orders_releases_stock() {
        assert!(OrderStatus::Pending.releases_reservation(OrderStatus::Cancelled));
        assert!(OrderStatus::Shipped.releases_reservation(OrderStatus::Refunded));
        assert!(!OrderStatus::Pending.releases_reservation(OrderStatus::Confirmed));
        assert!(!OrderStatus::Cancelled.releases_reservation(OrderStatus::Refunded));
    }

    #[test]
    fn statuses_round_trip_through_storage_form() -> TestResult {
        assert_eq!("CONFIRMED".parse::<OrderStatus>()?, OrderStatus::Confirmed);
        assert_eq!("refunded".parse::<PaymentStatus>()?, PaymentStatus::Refunded);
        assert!("LOST".parse::<OrderStatus>().is_err());

        Ok(())
    }

    #[test]
    fn payment_can_only_settle_once() {
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Completed));
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Failed));
        assert!(!PaymentStatus::Failed.can_transition_to(PaymentStatus::Completed));
        assert!(!PaymentStatus::Completed.can_transition_to(PaymentStatus::Pending));
    }

    #[test]
    fn settlement_outcomes_map_to_statuses() {
        assert_eq!(
            SettlementOutcome::Succeeded.statuses(),
            (OrderStatus::Confirmed, PaymentStatus::Completed)
        );
        assert_eq!(
            SettlementOutcome::Failed.statuses(),
            (OrderStatus::Cancelled, PaymentStatus::Failed)
        );
    }
}
