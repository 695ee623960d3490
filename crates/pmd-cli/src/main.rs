//! pmd — operator CLI for the pre-order matching desk.
//!
//! Every command is a thin call against the daemon's HTTP surface; the CLI
//! holds no state of its own. Responses are printed as pretty JSON.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "pmd")]
#[command(about = "Pre-order matching desk CLI", long_about = None)]
struct Cli {
    /// Daemon base URL (or set PMD_ADDR).
    #[arg(long, global = true)]
    addr: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Daemon status (uptime, config hash, record counts)
    Status,

    /// Group administration
    Group {
        #[command(subcommand)]
        cmd: GroupCmd,
    },

    /// Reservation intake and lifecycle
    Reservation {
        #[command(subcommand)]
        cmd: ReservationCmd,
    },

    /// Inventory intake and stock operations
    Inventory {
        #[command(subcommand)]
        cmd: InventoryCmd,
    },

    /// The matching engine: preview, execute, reset, manual override
    Match {
        #[command(subcommand)]
        cmd: MatchCmd,
    },

    /// Performance rankings
    Reports {
        #[command(subcommand)]
        cmd: ReportsCmd,
    },
}

#[derive(Subcommand)]
enum GroupCmd {
    /// Create a group
    Add { name: String },
    List,
}

#[derive(Subcommand)]
enum ReservationCmd {
    /// Register a reservation (enters pending, paperwork not started)
    Add {
        #[arg(long)]
        group: String,
        #[arg(long)]
        store: String,
        #[arg(long)]
        recruiter: String,
        /// new_line | mnp | device_change
        #[arg(long)]
        subscription: String,
        #[arg(long)]
        customer: String,
        /// Customer phone number
        #[arg(long)]
        phone: String,
        #[arg(long)]
        model: String,
        #[arg(long)]
        color: String,
        /// 256GB | 512GB | 1TB (omit if not recorded)
        #[arg(long)]
        storage: Option<String>,
        #[arg(long, default_value = "launch day")]
        timing: String,
        #[arg(long)]
        pre_order: Option<String>,
    },
    List {
        #[arg(long)]
        group: String,
        #[arg(long)]
        store: Option<String>,
    },
    /// Demand overview per (model, color)
    Overview {
        #[arg(long)]
        group: String,
    },
    Cancel { id: String },
    /// Revert a matched reservation to pending, freeing its unit
    Unmatch { id: String },
    /// Update paperwork readiness: not_started | complete | on_hold
    Doc { id: String, status: String },
    /// Hard delete (frees a linked unit)
    Rm { id: String },
}

#[derive(Subcommand)]
enum InventoryCmd {
    /// Register a single unit
    Add {
        #[arg(long)]
        group: String,
        #[arg(long)]
        model: String,
        #[arg(long)]
        color: String,
        #[arg(long)]
        storage: Option<String>,
        #[arg(long)]
        serial: String,
        /// YYYY-MM-DD
        #[arg(long)]
        arrival: String,
    },
    /// Bulk-register from a manifest CSV
    /// (model,color,storage,serial_number,arrival_date)
    Import {
        #[arg(long)]
        group: String,
        path: String,
    },
    List {
        #[arg(long)]
        group: String,
        /// Only matched (true) or only available (false)
        #[arg(long)]
        matched: Option<bool>,
    },
    /// Stock overview per (model, color)
    Overview {
        #[arg(long)]
        group: String,
    },
    /// Ship a unit to another location
    Transfer {
        id: String,
        #[arg(long)]
        note: Option<String>,
    },
    /// Free a matched unit (reverts the holding reservation)
    Unmatch { id: String },
    Rm { id: String },
}

#[derive(Subcommand)]
enum MatchCmd {
    /// Simulate a matching run (no writes)
    Preview { group: String },
    /// Run and commit a matching run
    Execute { group: String },
    /// Revert every match in the group
    Reset { group: String },
    /// Ranked candidate reservations for a unit
    Assignable { unit: String },
    /// Hand-pick: pair a unit with a reservation
    Assign { unit: String, reservation: String },
}

#[derive(Subcommand)]
enum ReportsCmd {
    Recruiters {
        #[arg(long)]
        group: String,
    },
    Stores {
        #[arg(long)]
        group: String,
    },
}

// ---------------------------------------------------------------------------
// HTTP plumbing
// ---------------------------------------------------------------------------

struct Desk {
    base: String,
    http: reqwest::Client,
}

impl Desk {
    fn new(addr: Option<String>) -> Self {
        let base = addr
            .or_else(|| std::env::var("PMD_ADDR").ok())
            .unwrap_or_else(|| "http://127.0.0.1:8787".to_string());
        Self {
            base,
            http: reqwest::Client::new(),
        }
    }

    async fn get(&self, path: &str) -> Result<Value> {
        let resp = self
            .http
            .get(format!("{}{}", self.base, path))
            .send()
            .await
            .with_context(|| format!("GET {path}"))?;
        Self::body(resp).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        let resp = self
            .http
            .post(format!("{}{}", self.base, path))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("POST {path}"))?;
        Self::body(resp).await
    }

    async fn delete(&self, path: &str) -> Result<Value> {
        let resp = self
            .http
            .delete(format!("{}{}", self.base, path))
            .send()
            .await
            .with_context(|| format!("DELETE {path}"))?;
        Self::body(resp).await
    }

    async fn body(resp: reqwest::Response) -> Result<Value> {
        let status = resp.status();
        let value: Value = resp.json().await.unwrap_or(Value::Null);
        if !status.is_success() {
            let msg = value["error"].as_str().unwrap_or("unknown error");
            bail!("{status}: {msg}");
        }
        Ok(value)
    }
}

fn print_json(v: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(v)?);
    Ok(())
}

/// Read a manifest CSV into the bulk-intake payload. Empty storage column
/// means "not recorded".
fn read_manifest(path: &str) -> Result<Vec<Value>> {
    let mut rdr = csv::Reader::from_path(path).with_context(|| format!("open manifest: {path}"))?;
    let mut items = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let storage = match &rec[2] {
            "" => Value::Null,
            s => Value::String(s.to_string()),
        };
        items.push(json!({
            "model": &rec[0],
            "color": &rec[1],
            "storage": storage,
            "serial_number": &rec[3],
            "arrival_date": &rec[4],
        }));
    }
    Ok(items)
}

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let cli = Cli::parse();
    let desk = Desk::new(cli.addr.clone());

    let out = match cli.cmd {
        Commands::Status => desk.get("/v1/status").await?,

        Commands::Group { cmd } => match cmd {
            GroupCmd::Add { name } => desk.post("/v1/groups", json!({ "name": name })).await?,
            GroupCmd::List => desk.get("/v1/groups").await?,
        },

        Commands::Reservation { cmd } => match cmd {
            ReservationCmd::Add {
                group,
                store,
                recruiter,
                subscription,
                customer,
                phone,
                model,
                color,
                storage,
                timing,
                pre_order,
            } => {
                desk.post(
                    "/v1/reservations",
                    json!({
                        "group_id": group,
                        "store_name": store,
                        "recruiter": recruiter,
                        "subscription_type": subscription,
                        "customer_name": customer,
                        "product_number": phone,
                        "model": model,
                        "color": color,
                        "storage": storage,
                        "activation_timing": timing,
                        "pre_order_number": pre_order,
                    }),
                )
                .await?
            }
            ReservationCmd::List { group, store } => {
                let mut path = format!("/v1/reservations?group_id={group}");
                if let Some(store) = store {
                    path.push_str(&format!("&store_name={store}"));
                }
                desk.get(&path).await?
            }
            ReservationCmd::Overview { group } => {
                desk.get(&format!("/v1/reservations/overview?group_id={group}"))
                    .await?
            }
            ReservationCmd::Cancel { id } => {
                desk.post(&format!("/v1/reservations/{id}/cancel"), json!({})).await?
            }
            ReservationCmd::Unmatch { id } => {
                desk.post(&format!("/v1/reservations/{id}/unmatch"), json!({})).await?
            }
            ReservationCmd::Doc { id, status } => {
                desk.post(
                    &format!("/v1/reservations/{id}/document-status"),
                    json!({ "document_status": status }),
                )
                .await?
            }
            ReservationCmd::Rm { id } => desk.delete(&format!("/v1/reservations/{id}")).await?,
        },

        Commands::Inventory { cmd } => match cmd {
            InventoryCmd::Add {
                group,
                model,
                color,
                storage,
                serial,
                arrival,
            } => {
                desk.post(
                    "/v1/inventory",
                    json!({
                        "group_id": group,
                        "model": model,
                        "color": color,
                        "storage": storage,
                        "serial_number": serial,
                        "arrival_date": arrival,
                    }),
                )
                .await?
            }
            InventoryCmd::Import { group, path } => {
                let items = read_manifest(&path)?;
                desk.post(
                    "/v1/inventory/bulk",
                    json!({ "group_id": group, "items": items }),
                )
                .await?
            }
            InventoryCmd::List { group, matched } => {
                let mut path = format!("/v1/inventory?group_id={group}");
                if let Some(m) = matched {
                    path.push_str(&format!("&matched={m}"));
                }
                desk.get(&path).await?
            }
            InventoryCmd::Overview { group } => {
                desk.get(&format!("/v1/inventory/overview?group_id={group}")).await?
            }
            InventoryCmd::Transfer { id, note } => {
                desk.post(&format!("/v1/inventory/{id}/transfer"), json!({ "note": note }))
                    .await?
            }
            InventoryCmd::Unmatch { id } => {
                desk.post(&format!("/v1/inventory/{id}/unmatch"), json!({})).await?
            }
            InventoryCmd::Rm { id } => desk.delete(&format!("/v1/inventory/{id}")).await?,
        },

        Commands::Match { cmd } => match cmd {
            MatchCmd::Preview { group } => {
                desk.get(&format!("/v1/matching/{group}/preview")).await?
            }
            MatchCmd::Execute { group } => {
                desk.post(&format!("/v1/matching/{group}/execute"), json!({})).await?
            }
            MatchCmd::Reset { group } => {
                desk.post(&format!("/v1/matching/{group}/reset"), json!({})).await?
            }
            MatchCmd::Assignable { unit } => {
                desk.get(&format!("/v1/inventory/{unit}/assignable")).await?
            }
            MatchCmd::Assign { unit, reservation } => {
                desk.post(
                    &format!("/v1/inventory/{unit}/assign"),
                    json!({ "reservation_id": reservation }),
                )
                .await?
            }
        },

        Commands::Reports { cmd } => match cmd {
            ReportsCmd::Recruiters { group } => {
                desk.get(&format!("/v1/reports/recruiters?group_id={group}")).await?
            }
            ReportsCmd::Stores { group } => {
                desk.get(&format!("/v1/reports/stores?group_id={group}")).await?
            }
        },
    };

    print_json(&out)
}
