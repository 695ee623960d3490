//! Priority ranking over reservations.
//!
//! Automatic matching: carrier-switch (MNP) customers strictly first, then
//! registration order. Registration order is the store-assigned `seq`, not
//! wall-clock time, so the order is total and replay-stable.
//!
//! Manual candidate lists add paperwork readiness as a middle tier — the
//! operator sees document-complete customers first within each subscription
//! tier, but nothing is hidden.

use pmd_schemas::{DocumentStatus, Reservation};

fn carrier_tier(r: &Reservation) -> u8 {
    if r.subscription_type.is_carrier_switch() {
        0
    } else {
        1
    }
}

/// Order used by the matching engine (eligibility has already gated paperwork).
pub fn rank_for_matching(reservations: &mut [Reservation]) {
    reservations.sort_by_key(|r| (carrier_tier(r), r.seq));
}

/// Order used for manual-override candidate lists:
/// MNP first, then paperwork complete, then registration order.
pub fn rank_for_manual(reservations: &mut [Reservation]) {
    reservations.sort_by_key(|r| {
        let doc_tier: u8 = if r.document_status == DocumentStatus::Complete { 0 } else { 1 };
        (carrier_tier(r), doc_tier, r.seq)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmd_schemas::{
        GroupId, ReservationId, ReservationStatus, SubscriptionType,
    };

    fn res(seq: u64, st: SubscriptionType, doc: DocumentStatus) -> Reservation {
        Reservation {
            id: ReservationId::new(),
            group_id: GroupId::new(),
            store_name: "Main".into(),
            recruiter: "Kim".into(),
            subscription_type: st,
            customer_name: format!("cust-{seq}"),
            product_number: "010".into(),
            model: "S26".into(),
            color: "Black".into(),
            storage: None,
            activation_timing: "launch".into(),
            pre_order_number: None,
            matched_serial_number: None,
            status: ReservationStatus::Pending,
            document_status: doc,
            registered_at: chrono::Utc::now(),
            seq,
        }
    }

    #[test]
    fn mnp_outranks_earlier_registrations() {
        let mut rs = vec![
            res(1, SubscriptionType::NewLine, DocumentStatus::Complete),
            res(2, SubscriptionType::DeviceChange, DocumentStatus::Complete),
            res(3, SubscriptionType::Mnp, DocumentStatus::Complete),
        ];
        rank_for_matching(&mut rs);
        let seqs: Vec<u64> = rs.iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![3, 1, 2]);
    }

    #[test]
    fn same_tier_is_registration_order() {
        let mut rs = vec![
            res(9, SubscriptionType::Mnp, DocumentStatus::Complete),
            res(4, SubscriptionType::Mnp, DocumentStatus::Complete),
            res(7, SubscriptionType::NewLine, DocumentStatus::Complete),
            res(5, SubscriptionType::NewLine, DocumentStatus::Complete),
        ];
        rank_for_matching(&mut rs);
        let seqs: Vec<u64> = rs.iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![4, 9, 5, 7]);
    }

    #[test]
    fn manual_order_inserts_document_tier() {
        let mut rs = vec![
            res(1, SubscriptionType::NewLine, DocumentStatus::Complete),
            res(2, SubscriptionType::Mnp, DocumentStatus::NotStarted),
            res(3, SubscriptionType::Mnp, DocumentStatus::Complete),
            res(4, SubscriptionType::NewLine, DocumentStatus::OnHold),
        ];
        rank_for_manual(&mut rs);
        let seqs: Vec<u64> = rs.iter().map(|r| r.seq).collect();
        // MNP+docs, MNP without, others+docs, others without.
        assert_eq!(seqs, vec![3, 2, 1, 4]);
    }
}
