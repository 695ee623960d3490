//! Intake invariants (serial uniqueness, all-or-nothing bulk) and the
//! reservation/unit lifecycle guards outside the matching path.

use pmd_engine::{inventory, reservations, EngineError};
use pmd_schemas::{DocumentStatus, ReservationStatus, StorageTier};
use pmd_store::{EntityStore, NewInventoryUnit};
use pmd_testkit::{load_units_csv, make_group, some_date, write_units_csv, ReservationBuilder, UnitBuilder};

fn bulk_row(serial: &str) -> inventory::BulkUnit {
    inventory::BulkUnit {
        model: "S26".into(),
        color: "Black".into(),
        storage: Some(StorageTier::Gb512),
        serial_number: serial.into(),
        arrival_date: some_date(),
    }
}

#[test]
fn duplicate_serial_is_rejected_on_single_intake() {
    let store = EntityStore::new();
    let g = make_group(&store, "Alpha");
    UnitBuilder::new(g.id, "SN-1").insert(&store);

    let err = inventory::register_unit(
        &store,
        NewInventoryUnit {
            group_id: g.id,
            model: "S26+".into(),
            color: "White".into(),
            storage: None,
            serial_number: "SN-1".into(),
            arrival_date: some_date(),
        },
    )
    .unwrap_err();
    assert_eq!(err, EngineError::DuplicateSerial("SN-1".into()));
}

#[test]
fn bulk_intake_is_all_or_nothing_on_store_collision() {
    let store = EntityStore::new();
    let g = make_group(&store, "Alpha");
    UnitBuilder::new(g.id, "SN-2").insert(&store);

    let err = inventory::register_bulk(
        &store,
        g.id,
        vec![bulk_row("SN-1"), bulk_row("SN-2"), bulk_row("SN-3")],
    )
    .unwrap_err();
    assert_eq!(err, EngineError::DuplicateSerial("SN-2".into()));

    // Nothing from the batch landed, not even the rows before the duplicate.
    let snap = store.read();
    assert!(snap.unit_by_serial("SN-1").is_none());
    assert!(snap.unit_by_serial("SN-3").is_none());
}

#[test]
fn bulk_intake_rejects_duplicates_within_the_batch() {
    let store = EntityStore::new();
    let g = make_group(&store, "Alpha");
    let err = inventory::register_bulk(&store, g.id, vec![bulk_row("SN-1"), bulk_row("SN-1")])
        .unwrap_err();
    assert_eq!(err, EngineError::DuplicateSerial("SN-1".into()));
    assert!(store.read().unit_by_serial("SN-1").is_none());
}

#[test]
fn bulk_intake_from_csv_manifest() {
    let store = EntityStore::new();
    let g = make_group(&store, "Alpha");
    let dir = tempfile::tempdir().unwrap();
    let path = write_units_csv(
        &dir,
        &[
            ("S26", "Black", "512GB", "SN-10", "2026-02-01"),
            ("S26+", "White", "", "SN-11", "2026-02-02"),
        ],
    )
    .unwrap();

    let rows = load_units_csv(&path, g.id).unwrap();
    let mut w = store.write();
    for row in rows {
        w.insert_unit(row).unwrap();
    }
    drop(w);

    let snap = store.read();
    assert_eq!(snap.inventory_by_group(g.id).len(), 2);
    // Empty storage column means "not recorded".
    assert_eq!(snap.unit_by_serial("SN-11").unwrap().storage, None);
}

#[test]
fn transfer_and_match_are_mutually_exclusive() {
    let store = EntityStore::new();
    let g = make_group(&store, "Alpha");
    let matched = UnitBuilder::new(g.id, "SN-M").insert(&store);
    let shipped = UnitBuilder::new(g.id, "SN-T").insert(&store);
    let r = ReservationBuilder::new(g.id).insert(&store);

    pmd_engine::manual::manual_match(&store, matched.id, r.id).unwrap();
    inventory::transfer_unit(&store, shipped.id, Some("to Busan branch".into())).unwrap();

    assert_eq!(
        inventory::transfer_unit(&store, matched.id, None).unwrap_err(),
        EngineError::MatchedUnitUntransferable { serial: "SN-M".into() }
    );
    assert_eq!(
        inventory::transfer_unit(&store, shipped.id, None).unwrap_err(),
        EngineError::AlreadyTransferred { serial: "SN-T".into() }
    );
}

#[test]
fn completed_reservations_are_locked_down() {
    let store = EntityStore::new();
    let g = make_group(&store, "Alpha");
    let unit = UnitBuilder::new(g.id, "SN-1").insert(&store);
    let r = ReservationBuilder::new(g.id).insert(&store);
    pmd_engine::manual::manual_match(&store, unit.id, r.id).unwrap();

    assert_eq!(
        reservations::cancel_reservation(&store, r.id).unwrap_err(),
        EngineError::ReservationCompleted(r.id)
    );
    assert_eq!(
        reservations::change_device(&store, r.id, "S26+".into(), "White".into()).unwrap_err(),
        EngineError::ReservationCompleted(r.id)
    );
    assert_eq!(
        reservations::change_color(&store, r.id, "White".into()).unwrap_err(),
        EngineError::ReservationCompleted(r.id)
    );
    // Paperwork edits stay allowed.
    reservations::set_document_status(&store, r.id, DocumentStatus::OnHold).unwrap();
}

#[test]
fn cancel_is_pending_only_and_not_repeatable() {
    let store = EntityStore::new();
    let g = make_group(&store, "Alpha");
    let r = ReservationBuilder::new(g.id).insert(&store);

    let cancelled = reservations::cancel_reservation(&store, r.id).unwrap();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);
    assert_eq!(
        reservations::cancel_reservation(&store, r.id).unwrap_err(),
        EngineError::ReservationAlreadyCancelled(r.id)
    );
}

#[test]
fn demand_and_stock_overviews_count_the_right_things() {
    let store = EntityStore::new();
    let g = make_group(&store, "Alpha");
    UnitBuilder::new(g.id, "SN-1").insert(&store);
    UnitBuilder::new(g.id, "SN-2").insert(&store);
    let shipped = UnitBuilder::new(g.id, "SN-3").insert(&store);
    inventory::transfer_unit(&store, shipped.id, None).unwrap();

    let matched = ReservationBuilder::new(g.id).customer("m").pre_order("PO-1").insert(&store);
    ReservationBuilder::new(g.id).customer("p").doc(DocumentStatus::NotStarted).insert(&store);
    let cancelled = ReservationBuilder::new(g.id).customer("c").insert(&store);
    reservations::cancel_reservation(&store, cancelled.id).unwrap();
    pmd_engine::matching::execute(&store, g.id).unwrap();
    // `matched` got SN-1; the doc-incomplete one stayed pending.
    assert_eq!(
        store
            .read()
            .reservation(matched.id)
            .unwrap()
            .matched_serial_number
            .as_deref(),
        Some("SN-1")
    );

    let stock = inventory::stock_overview(&store, g.id).unwrap();
    assert_eq!(stock.len(), 1);
    assert_eq!(
        (stock[0].total, stock[0].available, stock[0].matched, stock[0].transferred),
        (3, 1, 1, 1)
    );

    let demand = reservations::demand_overview(&store, g.id).unwrap();
    assert_eq!(demand.len(), 1);
    assert_eq!(demand[0].total, 2); // cancelled excluded
    assert_eq!(demand[0].matched, 1);
    assert_eq!(demand[0].doc_complete, 1);
    assert_eq!(demand[0].with_pre_order, 1);

    let listed = inventory::list_units(&store, g.id, Some(true)).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].matched_customer_name.as_deref(), Some("m"));
}
