// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Packdesk - order back-office service.
//!
//! This is the binary entry point: the long-running `serve` command plus
//! one-shot maintenance and query commands over the same database.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod commands;
mod serve;
mod stack;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use packdesk_config::PackdeskConfig;

/// Packdesk - customer metrics and segmentation for the order back-office.
#[derive(Parser, Debug)]
#[command(name = "packdesk", version, about, long_about = None)]
struct Cli {
    /// Configuration file, layered over the defaults instead of the standard search path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP gateway, stream consumer and expiry sweeper.
    Serve,
    /// Process a change batch file (`{"Records": [...]}`) through the maintainer.
    Ingest {
        file: PathBuf,
    },
    /// Load orders from a JSON array or JSON-lines file and refresh their customers.
    ImportOrders {
        file: PathBuf,
    },
    /// Recompute and cache one customer's metrics.
    Recompute {
        contact_id: String,
    },
    /// Show one customer with metrics.
    Customer {
        contact_id: String,
    },
    /// List customers by lifetime spend.
    Customers {
        #[arg(long)]
        limit: Option<usize>,
        /// Case-insensitive match on name, email or company.
        #[arg(long)]
        search: Option<String>,
        /// New, Active, Dormant or VIP.
        #[arg(long)]
        segment: Option<String>,
    },
    /// Show a customer's orders, newest first.
    CustomerOrders {
        contact_id: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Delete expired cache records.
    PurgeExpired,
}

fn load_config(path: Option<&PathBuf>) -> PackdeskConfig {
    let loaded = match path {
        Some(path) => packdesk_config::load_and_validate_path(path),
        None => packdesk_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            packdesk_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());
    serve::init_tracing(&config.service.log_level);

    let result = match cli.command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Ingest { file } => commands::ingest(&config, &file).await,
        Commands::ImportOrders { file } => commands::import_orders(&config, &file).await,
        Commands::Recompute { contact_id } => commands::recompute(&config, &contact_id).await,
        Commands::Customer { contact_id } => commands::customer(&config, &contact_id).await,
        Commands::Customers {
            limit,
            search,
            segment,
        } => commands::customers(&config, limit, search, segment).await,
        Commands::CustomerOrders { contact_id, limit } => {
            commands::customer_orders(&config, &contact_id, limit).await
        }
        Commands::PurgeExpired => commands::purge_expired(&config).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
