#![allow(clippy::result_large_err)]

use clap::{Parser, Subcommand};
use crease_store::{
    config::{catalog, database, settings},
    core::{
        analytics, cart::CartProduct, coupon, guest::JsonFileStore, order, product,
        sync::CartSession, user,
    },
    entities::{OrderStatus, UserRole},
    errors::{Error, Result},
};
use dotenvy::dotenv;
use sea_orm::DatabaseConnection;
use std::{path::PathBuf, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "crease-store", version, about = "Cricket storefront maintenance tool")]
struct Cli {
    /// Settings file
    #[arg(long, default_value = "store.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create any missing tables
    InitDb,
    /// Print every admin account
    ListAdmins,
    /// Print the catalog
    ListProducts,
    /// Delete the catalog and load one from a TOML file
    ReplaceProducts { path: PathBuf },
    /// Grant or revoke the admin role
    SetRole { uid: String, role: String },
    /// Print one page of orders, newest first
    ListOrders {
        #[arg(long)]
        status: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u64,
    },
    /// Print one page of a customer's order history
    OrderHistory {
        uid: String,
        #[arg(long, default_value_t = 1)]
        page: u64,
    },
    /// Move an order to a new status
    SetStatus {
        order_id: i64,
        status: String,
        #[arg(long)]
        partner: Option<String>,
        #[arg(long)]
        awb: Option<String>,
    },
    /// Create a percentage coupon
    CreateCoupon {
        code: String,
        percent_off: i32,
        #[arg(long, default_value_t = 0.0)]
        min_order: f64,
    },
    /// Print store totals
    Stats,
    /// Add a product to the local guest cart, or to a user's cart with `--user`
    CartAdd {
        product_id: i64,
        #[arg(long, default_value_t = 1)]
        quantity: i32,
        #[arg(long)]
        user: Option<String>,
    },
}

fn parse_status(value: &str) -> Result<OrderStatus> {
    OrderStatus::parse(value).ok_or_else(|| Error::Validation {
        message: format!("Unknown order status '{value}'"),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    let cli = Cli::parse();

    // 3. Load settings and connect
    let settings = settings::load_settings(&cli.config)
        .inspect_err(|e| error!("Failed to load settings: {e}"))?;
    let db = database::create_connection(&settings.database_url())
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))?;

    // 4. Run the command
    run(cli.command, &settings, db).await
}

async fn run(
    command: Command,
    settings: &settings::Settings,
    db: DatabaseConnection,
) -> Result<()> {
    match command {
        Command::InitDb => {}
        Command::ListAdmins => {
            for admin in user::list_admins(&db).await? {
                println!(
                    "{}\t{}\t{}",
                    admin.uid,
                    admin.email,
                    admin.display_name.unwrap_or_default()
                );
            }
        }
        Command::ListProducts => {
            for p in product::get_all_products(&db).await? {
                println!(
                    "{}\t{}\t{:.2}\t{}% off\tstock {}",
                    p.id, p.name, p.price, p.discount, p.stock
                );
            }
        }
        Command::ReplaceProducts { path } => {
            let loaded = catalog::load_catalog(&path)?;
            let inputs = loaded.products.into_iter().map(Into::into).collect();
            let inserted = product::replace_all_products(&db, inputs).await?;
            info!("Catalog replaced with {} products from {path:?}", inserted.len());
        }
        Command::SetRole { uid, role } => {
            let role = UserRole::parse(&role).ok_or_else(|| Error::Validation {
                message: format!("Role must be 'user' or 'admin', got '{role}'"),
            })?;
            user::set_role(&db, &uid, role).await?;
        }
        Command::ListOrders { status, page } => {
            let status = status.as_deref().map(parse_status).transpose()?;
            let listing = order::list_orders(&db, status, page, settings.orders_per_page).await?;
            for o in &listing.items {
                println!(
                    "#{}\t{}\t{}\t{:.2}\t{}",
                    o.id, o.user_id, o.status, o.total_amount, o.created_at
                );
            }
            println!(
                "page {}/{} ({} orders)",
                listing.page, listing.total_pages, listing.total_items
            );
        }
        Command::OrderHistory { uid, page } => {
            let history = order::order_history(&db, &uid, page, settings.history_per_page).await?;
            for copy in &history.items {
                println!(
                    "#{}\t{}\t{:.2}\t{}",
                    copy.order_id,
                    copy.status,
                    copy.total_amount,
                    copy.awb_id.as_deref().unwrap_or("-")
                );
            }
            println!("page {}/{}", history.page, history.total_pages);
        }
        Command::SetStatus {
            order_id,
            status,
            partner,
            awb,
        } => {
            let shipment = partner
                .zip(awb)
                .map(|(partner, awb)| order::ShipmentDetails::new(partner, awb));
            order::update_order_status(&db, order_id, parse_status(&status)?, shipment.as_ref())
                .await?;
        }
        Command::CreateCoupon {
            code,
            percent_off,
            min_order,
        } => {
            coupon::create_coupon(&db, &code, percent_off, min_order, None).await?;
        }
        Command::Stats => {
            let stats = analytics::store_stats(&db).await?;
            println!("orders:  {}", stats.total_orders);
            println!("users:   {}", stats.total_users);
            println!("revenue: {:.2}", stats.revenue);
        }
        Command::CartAdd {
            product_id,
            quantity,
            user,
        } => {
            let item = product::get_product_by_id(&db, product_id)
                .await?
                .ok_or(Error::ProductNotFound { id: product_id })?;
            let store = Arc::new(JsonFileStore::new(&settings.guest_cart_path));
            let session = CartSession::new(Arc::new(db), store, settings.abandoned_cart_idle())?;
            if let Some(uid) = user {
                session.sign_in(&uid).await?;
            }
            let view = session.add(&CartProduct::from(&item), quantity).await?;
            println!("{} items, total {:.2}", view.count, view.total);
        }
    }
    Ok(())
}
