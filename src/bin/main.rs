//! bitcoin-kit CLI - composition without a running engine
//!
//!   bitcoin-kit first-address -m "<words>" -p bip84 -n mainnet
//!   bitcoin-kit first-address -k zpub6r... -p bip84
//!   bitcoin-kit validate-address bitcoin:bc1q...?amount=0.1 -n mainnet
//!   bitcoin-kit namespace -w wallet-1 -p bip44 -n testnet -s full
//!   bitcoin-kit inspect -w wallet-1 -m "<words>" -p bip84
//!   bitcoin-kit clear --except wallet-1,wallet-2
//!
//! Output is JSON on stdout. Errors are `{"error": ...}` on stderr with exit code 1.
//! Options fall back to `BITCOIN_KIT_*` environment variables.

use std::env;
use std::io::IsTerminal;

use anyhow::{anyhow, bail, Context, Result};
use bitcoin_kit::logging::init_logging;
use bitcoin_kit::storage::WalletSessionKey;
use bitcoin_kit::{
    AddressConverterChain, Blueprint, BlueprintBuilder, Kit, KitConfig, NetworkType, PaymentAddressParser, Purpose,
    SyncMode,
};
use serde_json::{json, Value};
use tracing::debug;

fn main() {
    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);
    init_logging(opts.log_level.as_deref().or(Some("warn")));

    if opts.help {
        print_usage();
        return;
    }
    if opts.version {
        println!("bitcoin-kit {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let result = match opts.command.as_deref() {
        Some("first-address") => cmd_first_address(&opts),
        Some("validate-address") => cmd_validate_address(&opts),
        Some("namespace") => cmd_namespace(&opts),
        Some("inspect") => cmd_inspect(&opts),
        Some("clear") => cmd_clear(&opts),
        Some(cmd) => Err(anyhow!("Unknown command: {}", cmd)),
        None => {
            print_usage();
            return;
        }
    };

    let pretty = opts.pretty || std::io::stdout().is_terminal();
    match result {
        Ok(output) => println!("{}", render(&output, pretty)),
        Err(e) => {
            eprintln!("{}", render(&json!({ "error": format!("{:#}", e) }), pretty));
            std::process::exit(1);
        }
    }
}

fn render(value: &Value, pretty: bool) -> String {
    let text = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    text.unwrap_or_else(|_| value.to_string())
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    positional: Vec<String>,
    wallet_id: Option<String>,
    mnemonic: Option<String>,
    passphrase: Option<String>,
    key: Option<String>,
    watch: Option<String>,
    purpose: Option<String>,
    network: Option<String>,
    sync_mode: Option<String>,
    data_dir: Option<String>,
    except: Vec<String>,
    log_level: Option<String>,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            let value = args.get(i + 1).cloned();
            let mut consumed = true;
            match arg.as_str() {
                "--help" | "-h" => { opts.help = true; consumed = false }
                "--version" | "-V" => { opts.version = true; consumed = false }
                "--pretty" => { opts.pretty = true; consumed = false }
                "--wallet" | "-w" => opts.wallet_id = value,
                "--mnemonic" | "-m" => opts.mnemonic = value,
                "--passphrase" => opts.passphrase = value,
                "--key" | "-k" => opts.key = value,
                "--watch" => opts.watch = value,
                "--purpose" | "-p" => opts.purpose = value,
                "--network" | "-n" => opts.network = value,
                "--sync-mode" | "-s" => opts.sync_mode = value,
                "--data-dir" | "-d" => opts.data_dir = value,
                "--log-level" => opts.log_level = value,
                "--except" | "-e" => {
                    if let Some(ids) = value {
                        opts.except.extend(ids.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()));
                    }
                }
                _ if !arg.starts_with('-') => { positional.push(arg.clone()); consumed = false }
                _ => consumed = false,
            }
            i += if consumed { 2 } else { 1 };
        }

        if !positional.is_empty() {
            opts.command = Some(positional.remove(0));
        }
        opts.positional = positional;

        // Environment (lower priority than flags)
        let from_env = |name: &str| env::var(name).ok().filter(|s| !s.is_empty());
        opts.wallet_id = opts.wallet_id.or_else(|| from_env("BITCOIN_KIT_WALLET"));
        opts.mnemonic = opts.mnemonic.or_else(|| from_env("BITCOIN_KIT_MNEMONIC"));
        opts.network = opts.network.or_else(|| from_env("BITCOIN_KIT_NETWORK"));
        opts.sync_mode = opts.sync_mode.or_else(|| from_env("BITCOIN_KIT_SYNC_MODE"));
        opts.data_dir = opts.data_dir.or_else(|| from_env("BITCOIN_KIT_DATA_DIR"));
        opts
    }

    fn network(&self) -> Result<NetworkType> {
        match self.network.as_deref() {
            None => Ok(NetworkType::default()),
            Some(name) => NetworkType::from_str(name).ok_or_else(|| anyhow!("Unknown network: {}", name)),
        }
    }

    fn purpose(&self) -> Result<Purpose> {
        let name = self.purpose.as_deref().unwrap_or("bip84");
        Purpose::from_str(name).ok_or_else(|| anyhow!("Unknown purpose: {}", name))
    }

    fn sync_mode(&self) -> Result<SyncMode> {
        match self.sync_mode.as_deref() {
            None => Ok(SyncMode::default()),
            Some(name) => SyncMode::from_str(name).ok_or_else(|| anyhow!("Unknown sync mode: {}", name)),
        }
    }

    fn wallet_id(&self) -> Result<&str> {
        self.wallet_id.as_deref().ok_or_else(|| anyhow!("--wallet is required"))
    }

    fn kit_config(&self) -> Result<KitConfig> {
        let mut config = KitConfig::new(self.wallet_id()?, self.purpose()?)
            .with_network(self.network()?)
            .with_sync_mode(self.sync_mode()?);
        if let Some(dir) = &self.data_dir {
            config = config.with_data_dir(dir);
        }
        Ok(config)
    }
}

fn print_usage() {
    println!(
        r#"bitcoin-kit - Bitcoin wallet composition

USAGE:
    bitcoin-kit <command> [args] [options]

COMMANDS:
    first-address           First receive address of a mnemonic or extended key
    validate-address <a>    Decode an address or bitcoin: URI
    namespace               Storage namespace for a wallet session
    inspect                 Compose a session and print its configuration
    clear                   Remove stored sessions (keeps --except ids)

KEY OPTIONS:
    --mnemonic, -m <words>  BIP39 mnemonic (env: BITCOIN_KIT_MNEMONIC)
    --passphrase <text>     BIP39 passphrase
    --key, -k <xkey>        Extended key (xprv/xpub/yprv/ypub/zprv/zpub and test variants)
    --watch <address>       Watch-only address (inspect)

SESSION OPTIONS:
    --wallet, -w <id>       Wallet id (env: BITCOIN_KIT_WALLET)
    --purpose, -p <p>       bip44|bip49|bip84|bip86 (default: bip84)
    --network, -n <net>     mainnet|testnet|regtest (env: BITCOIN_KIT_NETWORK)
    --sync-mode, -s <mode>  api|full|blockchair (env: BITCOIN_KIT_SYNC_MODE)
    --data-dir, -d <path>   Data directory (env: BITCOIN_KIT_DATA_DIR, BITCOIN_KIT_ROOT)
    --except, -e <ids>      Comma-separated wallet ids to keep (clear)

OUTPUT OPTIONS:
    --pretty                Pretty-print JSON
    --log-level <level>     Log filter when RUST_LOG is unset (default: warn)
    --version, -V           Print version
"#
    );
}

fn cmd_first_address(opts: &ParsedArgs) -> Result<Value> {
    let purpose = opts.purpose()?;
    let network = opts.network()?;

    let address = match (&opts.mnemonic, &opts.key) {
        (Some(words), None) => {
            Kit::<Blueprint>::first_address_from_mnemonic(words, opts.passphrase.as_deref().unwrap_or(""), purpose, network)?
        }
        (None, Some(key)) => Kit::<Blueprint>::first_address_from_extended_key(key, purpose, network)?,
        (Some(_), Some(_)) => bail!("Pass either --mnemonic or --key, not both"),
        (None, None) => bail!("--mnemonic or --key is required"),
    };
    Ok(json!({ "address": address, "purpose": purpose.as_str(), "network": network.as_str() }))
}

fn cmd_validate_address(opts: &ParsedArgs) -> Result<Value> {
    let input = opts.positional.first().context("address argument is required")?;
    let network = opts.network()?;

    let payment = PaymentAddressParser::default().parse(input);
    debug!("Parsed payment data {:?}", payment);
    let decoded = AddressConverterChain::for_network(network.identity()).convert(&payment.address)?;

    Ok(json!({
        "valid": true,
        "network": network.as_str(),
        "address": decoded,
        "payment": payment,
    }))
}

fn cmd_namespace(opts: &ParsedArgs) -> Result<Value> {
    let key = WalletSessionKey::new(opts.wallet_id()?, opts.network()?, opts.purpose()?, opts.sync_mode()?)?;
    Ok(json!({ "namespace": key.name(), "file": key.file_name() }))
}

fn cmd_inspect(opts: &ParsedArgs) -> Result<Value> {
    let config = opts.kit_config()?;
    let kit: Kit<Blueprint> = match (&opts.mnemonic, &opts.key, &opts.watch) {
        (Some(words), None, None) => {
            Kit::from_mnemonic(words, opts.passphrase.as_deref().unwrap_or(""), config, BlueprintBuilder)?
        }
        (None, Some(key), None) => Kit::from_extended_key(key, config, BlueprintBuilder)?,
        (None, None, Some(address)) => Kit::from_watch_address(address, config, BlueprintBuilder)?,
        (None, None, None) => bail!("--mnemonic, --key or --watch is required"),
        _ => bail!("Pass exactly one of --mnemonic, --key, --watch"),
    };

    let mut summary = kit.engine().summary();
    summary["namespace"] = json!(kit.storage_name());
    Ok(summary)
}

fn cmd_clear(opts: &ParsedArgs) -> Result<Value> {
    let removed = match &opts.data_dir {
        Some(dir) => Kit::<Blueprint>::clear_in(std::path::Path::new(dir), &opts.except)?,
        None => Kit::<Blueprint>::clear(&opts.except)?,
    };
    Ok(json!({ "removed": removed, "kept": opts.except }))
}
