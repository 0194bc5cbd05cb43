//! Status enums mapping to SMALLSERIAL/SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding `*_statuses` database table.

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Decode a database status ID back into the enum.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Lesson lifecycle status.
    LessonStatus {
        Open = 1,
        Closed = 2,
        Ongoing = 3,
        Completed = 4,
    }
}

define_status_enum! {
    /// Enrollment lifecycle status.
    EnrollmentStatus {
        Applied = 1,
        Canceled = 2,
        CanceledReq = 3,
        CanceledByAdmin = 4,
        Expired = 5,
    }
}

define_status_enum! {
    /// Enrollment payment status.
    PayStatus {
        Unpaid = 1,
        Paid = 2,
        PartiallyRefunded = 3,
        Refunded = 4,
        RefundRequested = 5,
        RefundPendingAdminCancel = 6,
        Expired = 7,
    }
}

define_status_enum! {
    /// Cancellation-request status.
    CancelStatus {
        None = 1,
        Req = 2,
        Pending = 3,
        Approved = 4,
        Denied = 5,
    }
}

define_status_enum! {
    /// Payment record status.
    PaymentStatus {
        Paid = 1,
        PartialRefunded = 2,
        Canceled = 3,
        Failed = 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lesson_status_ids_match_seed_data() {
        assert_eq!(LessonStatus::Open.id(), 1);
        assert_eq!(LessonStatus::Closed.id(), 2);
        assert_eq!(LessonStatus::Ongoing.id(), 3);
        assert_eq!(LessonStatus::Completed.id(), 4);
    }

    #[test]
    fn pay_status_ids_match_seed_data() {
        assert_eq!(PayStatus::Unpaid.id(), 1);
        assert_eq!(PayStatus::Paid.id(), 2);
        assert_eq!(PayStatus::PartiallyRefunded.id(), 3);
        assert_eq!(PayStatus::Refunded.id(), 4);
        assert_eq!(PayStatus::RefundRequested.id(), 5);
        assert_eq!(PayStatus::RefundPendingAdminCancel.id(), 6);
        assert_eq!(PayStatus::Expired.id(), 7);
    }

    #[test]
    fn cancel_status_ids_match_state_machine_constants() {
        use swimdesk_core::cancel;
        assert_eq!(CancelStatus::None.id(), cancel::CANCEL_NONE);
        assert_eq!(CancelStatus::Req.id(), cancel::CANCEL_REQ);
        assert_eq!(CancelStatus::Pending.id(), cancel::CANCEL_PENDING);
        assert_eq!(CancelStatus::Approved.id(), cancel::CANCEL_APPROVED);
        assert_eq!(CancelStatus::Denied.id(), cancel::CANCEL_DENIED);
    }

    #[test]
    fn from_id_round_trips() {
        assert_eq!(
            EnrollmentStatus::from_id(EnrollmentStatus::Expired.id()),
            Some(EnrollmentStatus::Expired)
        );
        assert_eq!(PaymentStatus::from_id(4), Some(PaymentStatus::Failed));
    }

    #[test]
    fn from_id_rejects_unknown_values() {
        assert_eq!(EnrollmentStatus::from_id(0), None);
        assert_eq!(CancelStatus::from_id(99), None);
    }

    #[test]
    fn status_into_status_id() {
        let id: StatusId = PayStatus::Paid.into();
        assert_eq!(id, 2);
    }
}
