//! pmd-testkit
//!
//! Fixture builders shared by the scenario tests. Builders insert through
//! the real Entity Store so every fixture record carries a store-assigned
//! `seq` — registration order in a test is simply the order of `insert`
//! calls.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use pmd_schemas::{
    DocumentStatus, Group, GroupId, InventoryUnit, Reservation, StorageTier, SubscriptionType,
};
use pmd_store::{EntityStore, NewInventoryUnit, NewReservation};

/// Arrival date used by fixtures that don't care.
pub fn some_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 1).expect("valid date")
}

pub fn make_group(store: &EntityStore, name: &str) -> Group {
    store.write().insert_group(name)
}

// ---------------------------------------------------------------------------
// ReservationBuilder
// ---------------------------------------------------------------------------

/// Builder with launch-day defaults: S26 / Black / no storage recorded,
/// new-line subscription, paperwork complete (the common case for matching
/// tests — call [`ReservationBuilder::doc`] to change it).
pub struct ReservationBuilder {
    new: NewReservation,
    doc: DocumentStatus,
}

impl ReservationBuilder {
    pub fn new(group_id: GroupId) -> Self {
        Self {
            new: NewReservation {
                group_id,
                store_name: "Main".into(),
                recruiter: "Kim".into(),
                subscription_type: SubscriptionType::NewLine,
                customer_name: "customer".into(),
                product_number: "010-0000-0000".into(),
                model: "S26".into(),
                color: "Black".into(),
                storage: None,
                activation_timing: "launch day".into(),
                pre_order_number: None,
            },
            doc: DocumentStatus::Complete,
        }
    }

    pub fn customer(mut self, name: &str) -> Self {
        self.new.customer_name = name.into();
        self
    }

    pub fn recruiter(mut self, name: &str) -> Self {
        self.new.recruiter = name.into();
        self
    }

    pub fn store_name(mut self, name: &str) -> Self {
        self.new.store_name = name.into();
        self
    }

    pub fn subscription(mut self, st: SubscriptionType) -> Self {
        self.new.subscription_type = st;
        self
    }

    pub fn mnp(self) -> Self {
        self.subscription(SubscriptionType::Mnp)
    }

    pub fn bucket(mut self, model: &str, color: &str, storage: Option<StorageTier>) -> Self {
        self.new.model = model.into();
        self.new.color = color.into();
        self.new.storage = storage;
        self
    }

    pub fn pre_order(mut self, number: &str) -> Self {
        self.new.pre_order_number = Some(number.into());
        self
    }

    pub fn doc(mut self, status: DocumentStatus) -> Self {
        self.doc = status;
        self
    }

    pub fn insert(self, store: &EntityStore) -> Reservation {
        let mut w = store.write();
        let r = w.insert_reservation(self.new).expect("fixture group exists");
        w.patch_reservation(r.id, |r| r.document_status = self.doc)
            .expect("just inserted")
    }
}

// ---------------------------------------------------------------------------
// UnitBuilder
// ---------------------------------------------------------------------------

pub struct UnitBuilder {
    new: NewInventoryUnit,
}

impl UnitBuilder {
    pub fn new(group_id: GroupId, serial: &str) -> Self {
        Self {
            new: NewInventoryUnit {
                group_id,
                model: "S26".into(),
                color: "Black".into(),
                storage: None,
                serial_number: serial.into(),
                arrival_date: some_date(),
            },
        }
    }

    pub fn bucket(mut self, model: &str, color: &str, storage: Option<StorageTier>) -> Self {
        self.new.model = model.into();
        self.new.color = color.into();
        self.new.storage = storage;
        self
    }

    pub fn insert(self, store: &EntityStore) -> InventoryUnit {
        store.write().insert_unit(self.new).expect("unique fixture serial")
    }
}

// ---------------------------------------------------------------------------
// Canned scenario
// ---------------------------------------------------------------------------

/// The contested-bucket scenario: 2 units of (S26, Black, 512GB-by-default)
/// against 3 eligible reservations for the same bucket, where the
/// carrier-switch customer registered last.
///
/// Expected allocation: `late_mnp` and `first_new_line` each get a unit;
/// `second_new_line` is the shortage.
pub struct ContestedBucket {
    pub group: Group,
    pub units: Vec<InventoryUnit>,
    pub first_new_line: Reservation,
    pub second_new_line: Reservation,
    pub late_mnp: Reservation,
}

pub fn contested_bucket(store: &EntityStore) -> ContestedBucket {
    let group = make_group(store, "Alpha Telecom");
    let units = vec![
        UnitBuilder::new(group.id, "SN-0001").insert(store),
        UnitBuilder::new(group.id, "SN-0002").insert(store),
    ];
    let first_new_line = ReservationBuilder::new(group.id).customer("first").insert(store);
    let second_new_line = ReservationBuilder::new(group.id).customer("second").insert(store);
    let late_mnp = ReservationBuilder::new(group.id)
        .customer("switcher")
        .mnp()
        .insert(store);
    ContestedBucket {
        group,
        units,
        first_new_line,
        second_new_line,
        late_mnp,
    }
}

// ---------------------------------------------------------------------------
// CSV fixtures
// ---------------------------------------------------------------------------

/// Parse a carrier manifest CSV (`model,color,storage,serial_number,
/// arrival_date`; empty storage means "not recorded") into insert payloads
/// for the given group.
pub fn load_units_csv(path: &std::path::Path, group_id: GroupId) -> Result<Vec<NewInventoryUnit>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("open units csv: {}", path.display()))?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let storage = match &rec[2] {
            "" => None,
            s => Some(s.parse::<StorageTier>().map_err(anyhow::Error::msg)?),
        };
        out.push(NewInventoryUnit {
            group_id,
            model: rec[0].to_string(),
            color: rec[1].to_string(),
            storage,
            serial_number: rec[3].to_string(),
            arrival_date: rec[4].parse().context("parse arrival_date")?,
        });
    }
    Ok(out)
}

/// Write a manifest CSV into a temp dir and return its path (the TempDir
/// must stay alive for the path to remain valid).
pub fn write_units_csv(
    dir: &tempfile::TempDir,
    rows: &[(&str, &str, &str, &str, &str)],
) -> Result<std::path::PathBuf> {
    let path = dir.path().join("units.csv");
    let mut wtr = csv::Writer::from_path(&path).context("create units csv")?;
    wtr.write_record(["model", "color", "storage", "serial_number", "arrival_date"])?;
    for (model, color, storage, serial, date) in rows {
        wtr.write_record([*model, *color, *storage, *serial, *date])?;
    }
    wtr.flush().context("flush units csv")?;
    Ok(path)
}
