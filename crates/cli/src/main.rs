//! RYJ CLI - Command-line storefront.
//!
//! Every invocation opens a storefront session (restoring the persisted cart
//! and login from `RYJ_STORAGE_DIR`), runs one command and exits. The cart
//! survives between invocations until `ryj session end` or a checkout.
//!
//! # Usage
//!
//! ```bash
//! # Browse
//! ryj catalog list --category Laptops
//! ryj catalog search "dell"
//! ryj catalog show 64f1c0
//!
//! # Shop
//! ryj cart add 64f1c0 -q 2
//! ryj cart set 64f1c0 5
//! ryj cart show
//! ryj checkout --name "Ana Torres" --document 12345678 \
//!     --email ana@example.com --phone 987654321
//!
//! # Manage the catalog
//! ryj auth login -e admin@ryjcomputer.pe -p secret
//! ryj admin create --title "Laptop Dell" --price 1571.08 --stock 3 -c Laptops
//! ryj admin bulk products.json
//! ```
//!
//! # Commands
//!
//! - `catalog` - Browse and search products
//! - `cart` - Inspect and change the cart
//! - `checkout` - Submit the cart as an order
//! - `auth` - Log in, log out, register
//! - `admin` - Create, update and upload images for products
//! - `session` - Refresh stock or end the session

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use ryj_core::{DeliveryMethod, PaymentMethod, ProductKind};
use ryj_storefront::StorefrontConfig;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "ryj")]
#[command(author, version, about = "RYJ Computer storefront CLI")]
struct Cli {
    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Inspect and change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Submit the cart as an order
    Checkout(CheckoutArgs),
    /// Log in and out
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Manage catalog products (admin only)
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Session lifecycle
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List products
    List {
        /// Only products in this category
        #[arg(short, long)]
        category: Option<String>,

        /// Only featured products
        #[arg(short, long)]
        featured: bool,
    },
    /// Search titles and categories
    Search {
        query: String,
    },
    /// Show one product with related products
    Show {
        id: String,

        /// Number of related products to list
        #[arg(long, default_value_t = 4)]
        related: usize,
    },
    /// List categories in use
    Categories,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show lines and totals
    Show,
    /// Add a product
    Add {
        id: String,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Add one unit to a line
    Inc {
        id: String,
    },
    /// Remove one unit from a line (never below one)
    Dec {
        id: String,
    },
    /// Set a line's quantity
    Set {
        id: String,

        /// New quantity, as typed
        #[arg(allow_hyphen_values = true)]
        quantity: String,
    },
    /// Remove a line
    Remove {
        id: String,
    },
    /// Remove every line
    Clear,
}

#[derive(Args)]
struct CheckoutArgs {
    /// First and last names
    #[arg(long)]
    name: String,

    /// Identity document number
    #[arg(long)]
    document: String,

    #[arg(long)]
    email: String,

    #[arg(long)]
    phone: String,

    /// `store_pickup` or `home_delivery`
    #[arg(long, default_value = "store_pickup")]
    delivery: DeliveryMethod,

    /// Required for home delivery
    #[arg(long)]
    address: Option<String>,

    /// `card` or `mobile_wallet`
    #[arg(long, default_value = "card")]
    payment: PaymentMethod,

    #[arg(long)]
    notes: Option<String>,
}

#[derive(Subcommand)]
enum AuthAction {
    /// Log in and remember the token
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Forget the login
    Logout,
    /// Create an account
    Register {
        #[arg(long)]
        name: String,

        #[arg(long)]
        last_name: String,

        /// `YYYY-MM-DD`
        #[arg(long)]
        birth_date: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Show the logged-in user
    Whoami,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a product
    Create(ProductFields),
    /// Update an existing product; omitted fields keep their value
    Update {
        id: String,

        #[command(flatten)]
        fields: UpdateFields,
    },
    /// Upload a product image
    Upload {
        id: String,

        /// Image file
        path: PathBuf,
    },
    /// Import products from a JSON array (or a single object)
    Bulk {
        path: PathBuf,

        /// Fill empty specs from the template of the detected product type
        #[arg(long)]
        template: bool,
    },
}

#[derive(Args)]
struct ProductFields {
    #[arg(long)]
    title: String,

    #[arg(long)]
    price: Decimal,

    #[arg(long, default_value_t = 0)]
    stock: u32,

    /// Category (repeatable)
    #[arg(short, long = "category")]
    categories: Vec<String>,

    /// Create a service instead of a product
    #[arg(long)]
    service: bool,

    #[arg(long)]
    featured: bool,

    #[arg(long)]
    summary: Option<String>,

    #[arg(long)]
    description: Option<String>,

    /// Specs as JSON (object, array of "Label: value" or text)
    #[arg(long)]
    specs: Option<String>,

    /// Fill specs from the template of the detected product type
    #[arg(long)]
    template: bool,
}

#[derive(Args)]
struct UpdateFields {
    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    price: Option<Decimal>,

    #[arg(long)]
    stock: Option<u32>,

    /// Replace categories (repeatable)
    #[arg(short, long = "category")]
    categories: Vec<String>,

    #[arg(long)]
    featured: Option<bool>,

    #[arg(long)]
    summary: Option<String>,

    #[arg(long)]
    description: Option<String>,

    /// Replace specs with this JSON
    #[arg(long)]
    specs: Option<String>,
}

#[derive(Subcommand)]
enum SessionAction {
    /// Re-read stock levels and re-clamp the cart
    Refresh,
    /// Discard the cart and its persisted record
    End,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = StorefrontConfig::from_env();
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ryj_cli=info,ryj_storefront=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(CliError::from(ryj_storefront::StorefrontError::from(e))),
    };

    if let Err(e) = result {
        if e.is_internal() {
            sentry::capture_error(&e);
        }
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

#[allow(clippy::too_many_lines)]
async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), CliError> {
    let out = commands::Output::new(cli.json);
    let mut session = ryj_storefront::StorefrontSession::open(config).await?;
    commands::set_sentry_user(&session);

    match cli.command {
        Commands::Catalog { action } => match action {
            CatalogAction::List { category, featured } => {
                commands::catalog::list(&session, &out, category.as_deref(), featured).await?;
            }
            CatalogAction::Search { query } => {
                commands::catalog::search(&session, &out, &query).await?;
            }
            CatalogAction::Show { id, related } => {
                commands::catalog::show(&session, &out, &id, related).await?;
            }
            CatalogAction::Categories => commands::catalog::categories(&session, &out).await?,
        },
        Commands::Cart { action } => {
            let notifications = commands::cart::watch(&session, out);
            match action {
                CartAction::Show => {}
                CartAction::Add { id, quantity } => {
                    commands::cart::add(&mut session, &id, quantity).await?;
                }
                CartAction::Inc { id } => commands::cart::increment(&mut session, &id),
                CartAction::Dec { id } => commands::cart::decrement(&mut session, &id),
                CartAction::Set { id, quantity } => {
                    commands::cart::set_quantity(&mut session, &id, &quantity);
                }
                CartAction::Remove { id } => commands::cart::remove(&mut session, &id),
                CartAction::Clear => commands::cart::clear(&mut session),
            }
            notifications.close();
            commands::cart::show(&session, &out);
        }
        Commands::Checkout(args) => {
            let form = ryj_storefront::checkout::CheckoutForm {
                full_name: args.name,
                document_id: args.document,
                email: args.email,
                phone: args.phone,
                delivery: args.delivery,
                address: args.address,
                payment: args.payment,
                notes: args.notes,
            };
            commands::checkout::submit(&mut session, &out, &form).await?;
        }
        Commands::Auth { action } => match action {
            AuthAction::Login { email, password } => {
                commands::auth::login(&mut session, &out, &email, &password).await?;
            }
            AuthAction::Logout => commands::auth::logout(&mut session),
            AuthAction::Register {
                name,
                last_name,
                birth_date,
                email,
                password,
            } => {
                let request = ryj_storefront::api::RegisterRequest {
                    name,
                    last_name,
                    birth_date,
                    email,
                    password,
                };
                commands::auth::register(&session, &out, &request).await?;
            }
            AuthAction::Whoami => commands::auth::whoami(&session, &out),
        },
        Commands::Admin { action } => match action {
            AdminAction::Create(fields) => {
                let kind = if fields.service {
                    ProductKind::Service
                } else {
                    ProductKind::Product
                };
                let edit = commands::admin::DraftEdit {
                    title: Some(fields.title),
                    price: Some(fields.price),
                    stock: Some(fields.stock),
                    categories: fields.categories,
                    featured: Some(fields.featured),
                    summary: fields.summary,
                    description: fields.description,
                    specs: fields.specs,
                };
                commands::admin::create(&session, &out, kind, edit, fields.template).await?;
            }
            AdminAction::Update { id, fields } => {
                let edit = commands::admin::DraftEdit {
                    title: fields.title,
                    price: fields.price,
                    stock: fields.stock,
                    categories: fields.categories,
                    featured: fields.featured,
                    summary: fields.summary,
                    description: fields.description,
                    specs: fields.specs,
                };
                commands::admin::update(&session, &out, &id, edit).await?;
            }
            AdminAction::Upload { id, path } => {
                commands::admin::upload(&session, &out, &id, &path).await?;
            }
            AdminAction::Bulk { path, template } => {
                commands::admin::bulk(&session, &out, &path, template).await?;
            }
        },
        Commands::Session { action } => match action {
            SessionAction::Refresh => {
                let notifications = commands::cart::watch(&session, out);
                commands::cart::refresh(&mut session, &out).await?;
                notifications.close();
                commands::cart::show(&session, &out);
            }
            SessionAction::End => {
                session.end();
                out.line("Session ended; cart cleared.");
            }
        },
    }
    Ok(())
}
