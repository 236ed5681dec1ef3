//! # cart-session: One Request-Scoped Cart Session
//!
//! Drives a [`CartSession`] from the command line: load config, register
//! drivers, run one cart operation, autosave on the way out.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         cart-session run                                │
//! │                                                                         │
//! │  1. Initialize Logging ───────────────────────────────────────────────► │
//! │     • tracing-subscriber with env filter (stderr)                       │
//! │     • Default: info,cartkit=debug, can be overridden with RUST_LOG      │
//! │                                                                         │
//! │  2. Determine Data Directory ─────────────────────────────────────────► │
//! │     • CARTKIT_DATA_DIR, else the platform data dir                      │
//! │     • Linux: ~/.local/share/carts/carts                                 │
//! │                                                                         │
//! │  3. Load Config ──────────────────────────────────────────────────────► │
//! │     • --config PATH (JSON), else file driver + autosave                 │
//! │     • CARTKIT_* environment overrides on the defaults                   │
//! │                                                                         │
//! │  4. Register Drivers ─────────────────────────────────────────────────► │
//! │     • "session" (in memory, this process only)                          │
//! │     • "file" (one file per storage key)                                 │
//! │                                                                         │
//! │  5. Open CartSession, run the command, finish (autosave)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;

use std::path::{Path, PathBuf};

use cartkit_core::{Cart, ManagedCart, ManagerConfig, Money, StorageConfig};
use cartkit_manager::{CartSession, NewCart};
use cartkit_storage::{DriverRegistry, FileStorage, SessionStorage};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

pub use error::{CliError, CliResult};

pub const USAGE: &str = "\
CartKit Session

Usage: cart-session [OPTIONS] <cart-id> <command>

Commands:
  add <sku> <name> <price-cents> <qty>   Add an item (merges with an existing line)
  show [--json]                           Print the cart's items and totals
  clear                                   Remove every item, keep the cart
  destroy                                 Destroy the cart and its saved state

Options:
  -c, --config <PATH>    JSON config document (default: file driver, autosave)
  -h, --help             Show this help message

Environment:
  CARTKIT_DATA_DIR        Directory for the file driver
  CARTKIT_STORAGE_DRIVER  Default driver name (empty disables storage)
  CARTKIT_AUTOSAVE        Default autosave flag
  CARTKIT_KEY_PREFIX      Default storage key prefix
  CARTKIT_KEY_SUFFIX      Default storage key suffix
  CARTKIT_TAX_RATE        Default tax rate as a percentage";

// =============================================================================
// Arguments
// =============================================================================

/// One cart operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add {
        sku: String,
        name: String,
        price_cents: i64,
        quantity: i64,
    },
    Show,
    Clear,
    Destroy,
}

impl Command {
    /// Whether the command changes a cart that outlives it.
    fn mutates(&self) -> bool {
        matches!(self, Command::Add { .. } | Command::Clear)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub config_path: Option<PathBuf>,
    pub cart_id: String,
    pub command: Command,
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Help,
    Run(Invocation),
}

/// Parses the arguments after the program name.
pub fn parse_args<I>(args: I) -> CliResult<Parsed>
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = args.into_iter().collect();

    let mut config_path = None;
    let mut json = false;
    let mut positional = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                let path = args
                    .get(i + 1)
                    .ok_or_else(|| CliError::usage("--config expects a path"))?;
                config_path = Some(PathBuf::from(path));
                i += 1;
            }
            "--json" => json = true,
            "--help" | "-h" => return Ok(Parsed::Help),
            flag if flag.starts_with("--") => {
                return Err(CliError::usage(format!("Unknown option '{flag}'")));
            }
            value => positional.push(value.to_string()),
        }
        i += 1;
    }

    let mut positional = positional.into_iter();
    let cart_id = positional
        .next()
        .ok_or_else(|| CliError::usage("Missing <cart-id>"))?;
    let verb = positional
        .next()
        .ok_or_else(|| CliError::usage("Missing <command>"))?;
    let rest: Vec<String> = positional.collect();

    let command = match (verb.as_str(), rest.as_slice()) {
        ("add", [sku, name, price, quantity]) => Command::Add {
            sku: sku.clone(),
            name: name.clone(),
            price_cents: parse_integer("price-cents", price)?,
            quantity: parse_integer("qty", quantity)?,
        },
        ("add", _) => {
            return Err(CliError::usage(
                "add expects <sku> <name> <price-cents> <qty>",
            ))
        }
        ("show", []) => Command::Show,
        ("clear", []) => Command::Clear,
        ("destroy", []) => Command::Destroy,
        ("show" | "clear" | "destroy", extra) => {
            return Err(CliError::usage(format!(
                "{verb} takes no arguments, got {}",
                extra.len()
            )))
        }
        (other, _) => return Err(CliError::usage(format!("Unknown command '{other}'"))),
    };

    Ok(Parsed::Run(Invocation {
        config_path,
        cart_id,
        command,
        json,
    }))
}

fn parse_integer(field: &str, raw: &str) -> CliResult<i64> {
    raw.parse()
        .map_err(|_| CliError::usage(format!("{field}: expected an integer, got '{raw}'")))
}

// =============================================================================
// Setup
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Logs go to stderr so command output on stdout stays clean.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,cartkit=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// File storage rooted at the data directory.
///
/// ## Development Override
/// Set `CARTKIT_DATA_DIR` to use a custom directory.
pub fn file_storage() -> CliResult<FileStorage> {
    if let Ok(dir) = std::env::var("CARTKIT_DATA_DIR") {
        return Ok(FileStorage::new(dir));
    }
    Ok(FileStorage::in_default_dir()?)
}

/// Config used when no `--config` is given: everything persists to the
/// file driver and is saved when the session ends.
pub fn default_config() -> ManagerConfig {
    let mut config = ManagerConfig::default();
    config.defaults.storage = StorageConfig::with_driver("file").autosave(true);
    config
}

/// Reads the config document (or the default) and applies `CARTKIT_*`
/// overrides.
pub fn load_config(path: Option<&Path>) -> CliResult<ManagerConfig> {
    let mut config = match path {
        Some(path) => {
            let bytes = std::fs::read(path).map_err(|source| CliError::ConfigRead {
                path: path.to_path_buf(),
                source,
            })?;
            ManagerConfig::from_json_slice(&bytes)?
        }
        None => default_config(),
    };

    config.apply_env()?;
    debug!(carts = config.carts.len(), "Config loaded");
    Ok(config)
}

/// The drivers every session can name.
pub fn build_drivers(file: FileStorage) -> CliResult<DriverRegistry> {
    Ok(DriverRegistry::new()
        .with_driver("session", SessionStorage::new())?
        .with_driver("file", file)?)
}

// =============================================================================
// Run
// =============================================================================

/// Parses `args`, sets everything up from the environment and runs.
pub fn execute<I>(args: I) -> CliResult<String>
where
    I: IntoIterator<Item = String>,
{
    let invocation = match parse_args(args)? {
        Parsed::Help => return Ok(USAGE.to_string()),
        Parsed::Run(invocation) => invocation,
    };

    let config = load_config(invocation.config_path.as_deref())?;
    let drivers = build_drivers(file_storage()?)?;
    run(&invocation, config, drivers)
}

/// Runs one command inside a fresh session and returns what to print.
///
/// The cart is created if the config didn't declare it. Mutations are
/// persisted by autosave, or explicitly when autosave is off but a driver
/// is configured.
pub fn run(
    invocation: &Invocation,
    config: ManagerConfig,
    drivers: DriverRegistry,
) -> CliResult<String> {
    let id = invocation.cart_id.as_str();
    let mut session: CartSession = CartSession::open(config, drivers)?;

    if session.cart_exists(id) {
        session.set_context(id)?;
    } else {
        session.new_cart(id, NewCart::new())?;
    }

    let output = match &invocation.command {
        Command::Add {
            sku,
            name,
            price_cents,
            quantity,
        } => {
            let cart = session.get_cart_mut(None)?;
            cart.add_item(sku, name, Money::from_cents(*price_cents), *quantity)?;
            format!(
                "Added {quantity} x {sku} to '{id}' ({} line(s), total {})",
                cart.item_count(),
                cart.total()
            )
        }
        Command::Show => render_cart(session.get_cart(None)?, invocation.json)?,
        Command::Clear => {
            session.get_cart_mut(None)?.clear();
            format!("Cleared '{id}'")
        }
        Command::Destroy => {
            session.destroy_cart(None, true)?;
            format!("Destroyed '{id}'")
        }
    };

    if invocation.command.mutates() {
        let config = session.get_cart_config(id);
        if config.driver().is_some() && !config.storage.autosave {
            session.save_cart_state(id)?;
        }
    }

    let failures = session.finish();
    if let Some(failure) = failures.into_iter().next() {
        return Err(failure.error.into());
    }

    info!(cart_id = id, "Command complete");
    Ok(output)
}

fn render_cart(cart: &Cart, json: bool) -> CliResult<String> {
    if json {
        let value = serde_json::json!({
            "cartId": cart.id(),
            "items": cart.items(),
            "totals": cart.totals(),
        });
        return Ok(serde_json::to_string_pretty(&value)?);
    }

    let mut lines = vec![format!(
        "Cart '{}' ({} line(s), {} unit(s))",
        cart.id(),
        cart.item_count(),
        cart.total_quantity()
    )];
    for item in cart.items() {
        lines.push(format!(
            "  {:<16} {:<24} {:>4} x {:>9} = {:>10}",
            item.sku,
            item.name,
            item.quantity,
            item.unit_price().to_string(),
            item.line_total().to_string()
        ));
    }
    lines.push(format!("Subtotal: {}", cart.subtotal()));
    lines.push(format!("Tax:      {}", cart.tax()));
    lines.push(format!("Total:    {}", cart.total()));

    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartkit_core::CartConfigOverride;
    use tempfile::TempDir;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn invocation(list: &[&str]) -> Invocation {
        match parse_args(args(list)).unwrap() {
            Parsed::Run(invocation) => invocation,
            Parsed::Help => panic!("unexpected help"),
        }
    }

    fn run_in(dir: &Path, config: ManagerConfig, list: &[&str]) -> CliResult<String> {
        let drivers = build_drivers(FileStorage::new(dir)).unwrap();
        run(&invocation(list), config, drivers)
    }

    #[test]
    fn test_parse_add() {
        let parsed = invocation(&["-c", "carts.json", "main", "add", "SKU-1", "Cola", "199", "2"]);
        assert_eq!(parsed.config_path, Some(PathBuf::from("carts.json")));
        assert_eq!(parsed.cart_id, "main");
        assert_eq!(
            parsed.command,
            Command::Add {
                sku: "SKU-1".to_string(),
                name: "Cola".to_string(),
                price_cents: 199,
                quantity: 2,
            }
        );
    }

    #[test]
    fn test_parse_show_json_and_help() {
        let parsed = invocation(&["main", "show", "--json"]);
        assert_eq!(parsed.command, Command::Show);
        assert!(parsed.json);

        assert_eq!(parse_args(args(&["main", "--help"])).unwrap(), Parsed::Help);
    }

    #[test]
    fn test_parse_errors_are_usage_errors() {
        for bad in [
            &[][..],
            &["main"][..],
            &["main", "add", "SKU-1"][..],
            &["main", "add", "SKU-1", "Cola", "abc", "1"][..],
            &["main", "show", "extra"][..],
            &["main", "checkout"][..],
            &["main", "show", "--verbose"][..],
            &["--config"][..],
        ] {
            let err = parse_args(args(bad)).unwrap_err();
            assert!(err.is_usage(), "{bad:?} gave {err}");
        }
    }

    #[test]
    fn test_add_persists_between_runs() {
        let scratch = TempDir::new().unwrap();
        let dir = scratch.path();

        run_in(dir, default_config(), &["main", "add", "COKE", "Cola", "199", "2"]).unwrap();
        run_in(dir, default_config(), &["main", "add", "COKE", "Cola", "199", "1"]).unwrap();

        let shown = run_in(dir, default_config(), &["main", "show"]).unwrap();
        assert!(shown.starts_with("Cart 'main' (1 line(s), 3 unit(s))"));
        assert!(shown.contains("Total:    $5.97"));
    }

    #[test]
    fn test_show_json() {
        let scratch = TempDir::new().unwrap();
        let dir = scratch.path();
        run_in(dir, default_config(), &["main", "add", "A", "Apple", "50", "4"]).unwrap();

        let shown = run_in(dir, default_config(), &["main", "show", "--json"]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&shown).unwrap();
        assert_eq!(value["cartId"], "main");
        assert_eq!(value["totals"]["totalCents"], 200);
        assert_eq!(value["items"][0]["sku"], "A");
    }

    #[test]
    fn test_destroy_removes_saved_state() {
        let scratch = TempDir::new().unwrap();
        let dir = scratch.path();
        run_in(dir, default_config(), &["main", "add", "A", "Apple", "50", "1"]).unwrap();
        run_in(dir, default_config(), &["main", "destroy"]).unwrap();

        let storage = FileStorage::new(dir);
        assert!(!storage.path_for("main").unwrap().exists());
    }

    #[test]
    fn test_explicit_save_without_autosave() {
        let scratch = TempDir::new().unwrap();
        let dir = scratch.path();
        let config = || {
            let mut config =
                ManagerConfig::default().with_cart("main", CartConfigOverride::default());
            config.defaults.storage = StorageConfig::with_driver("file").prefix("pos_");
            config
        };

        run_in(dir, config(), &["main", "add", "A", "Apple", "50", "1"]).unwrap();
        run_in(dir, config(), &["main", "clear"]).unwrap();
        run_in(dir, config(), &["main", "add", "B", "Banana", "25", "2"]).unwrap();

        let drivers = build_drivers(FileStorage::new(dir)).unwrap();
        let session: CartSession = CartSession::open(config(), drivers).unwrap();
        let cart = session.get_cart(Some("main")).unwrap();
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.items()[0].sku, "B");
        assert_eq!(cart.id(), "main");
        drop(session);
    }

    #[test]
    fn test_cart_limits_surface_as_errors() {
        let scratch = TempDir::new().unwrap();
        let dir = scratch.path();
        let err = run_in(dir, default_config(), &["main", "add", "A", "Apple", "50", "5000"])
            .unwrap_err();
        assert!(matches!(err, CliError::Core(_)));
    }

    #[test]
    fn test_out_of_range_price_is_an_error() {
        let scratch = TempDir::new().unwrap();
        let dir = scratch.path();
        let huge = (i64::MAX / 2).to_string();

        let err = run_in(dir, default_config(), &["main", "add", "X", "Y", huge.as_str(), "3"])
            .unwrap_err();
        assert!(matches!(err, CliError::Core(_)));

        let shown = run_in(dir, default_config(), &["main", "show"]).unwrap();
        assert!(shown.contains("Total:    $0.00"));
    }

    #[test]
    fn test_load_config_reads_document() {
        let scratch = TempDir::new().unwrap();
        let dir = scratch.path();
        let path = dir.join("carts.json");
        std::fs::write(&path, r#"{ "carts": { "main": {}, "wishlist": {} } }"#).unwrap();

        let config = load_config(Some(path.as_path())).unwrap();
        assert_eq!(config.carts.keys().collect::<Vec<_>>(), ["main", "wishlist"]);

        assert!(matches!(
            load_config(Some(dir.join("missing.json").as_path())),
            Err(CliError::ConfigRead { .. })
        ));
    }
}
