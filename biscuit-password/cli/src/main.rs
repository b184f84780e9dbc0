//! CLI for hashing and verifying passwords with Argon2.
//!
//! ## Usage
//!
//! ```bash
//! # Hash a password (Argon2id, default parameters)
//! bp hash "mysecret"
//! echo "mysecret" | bp hash -
//!
//! # Pick a variant and cost parameters
//! bp hash --variant argon2i --iterations 3 --memory 65536 "mysecret"
//!
//! # Verify a password against a stored hash
//! bp verify "$STORED" "mysecret"
//!
//! # Show how a stored hash was made
//! bp inspect "$STORED"
//!
//! # Generate shell completions
//! source <(COMPLETE=bash bp)
//! ```

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueHint};
use clap_complete::Shell;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use zeroize::Zeroizing;

use biscuit_password::{Argon2Variant, HashContext, HashParameters, StoredHash};

/// Environment variable holding the optional application-wide known secret.
const KNOWN_SECRET_ENV: &str = "BP_KNOWN_SECRET";

/// Hash and verify passwords with Argon2 (d, i, id)
#[derive(Parser)]
#[command(name = "bp", version, about, long_about = None)]
#[command(after_help = AFTER_HELP)]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    log_verbosity: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Hash a password and print the encoded result
    Hash(HashArgs),

    /// Check a password against an encoded hash (exit 0 = valid, 1 = invalid)
    Verify(VerifyArgs),

    /// Show the variant and parameters recorded in an encoded hash
    Inspect(InspectArgs),
}

#[derive(Args)]
struct HashArgs {
    /// Password to hash (use "-" to read from stdin)
    #[arg(value_name = "PASSWORD")]
    password: Option<String>,

    /// Argon2 variant: argon2d, argon2i or argon2id
    #[arg(long, default_value_t = Argon2Variant::Id)]
    variant: Argon2Variant,

    /// JSON file with hash parameters; flags below override its fields
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Salt length in bytes
    #[arg(long, value_name = "BYTES")]
    salt_length: Option<usize>,

    /// Derived hash length in bytes
    #[arg(long, value_name = "BYTES")]
    hash_length: Option<usize>,

    /// Number of parallel lanes
    #[arg(long, value_name = "LANES")]
    parallelism: Option<u32>,

    /// Number of passes over memory
    #[arg(long, value_name = "PASSES")]
    iterations: Option<u32>,

    /// Memory cost in KiB
    #[arg(long = "memory", value_name = "KIB")]
    memory_kib: Option<u32>,

    /// Context bytes mixed into the hash, e.g. a user id (max 32 bytes)
    #[arg(long, value_name = "TEXT")]
    associated_data: Option<String>,

    /// Print only base64(salt || hash) instead of the self-describing envelope.
    /// Export-only: `bp verify` and `bp inspect` cannot read this form
    #[arg(long)]
    raw: bool,
}

#[derive(Args)]
struct VerifyArgs {
    /// Encoded hash as printed by `bp hash`
    #[arg(value_name = "ENCODED")]
    encoded: String,

    /// Candidate password (use "-" to read from stdin)
    #[arg(value_name = "PASSWORD")]
    password: Option<String>,

    /// Context bytes the hash was bound to
    #[arg(long, value_name = "TEXT")]
    associated_data: Option<String>,
}

#[derive(Args)]
struct InspectArgs {
    /// Encoded hash as printed by `bp hash`
    #[arg(value_name = "ENCODED")]
    encoded: String,

    /// Print as JSON
    #[arg(long)]
    json: bool,
}

const AFTER_HELP: &str = "\
SHELL COMPLETIONS:
  Enable tab completions by adding one line to your shell config:

  Bash (~/.bashrc):
    source <(COMPLETE=bash bp)

  Zsh (~/.zshrc):
    source <(COMPLETE=zsh bp)

  Fish (~/.config/fish/config.fish):
    COMPLETE=fish bp | source

KNOWN SECRET:
  Set BP_KNOWN_SECRET to mix an application-wide secret into hash and
  verify. It is never written into the output.

RAW OUTPUT:
  `bp hash --raw` prints base64(salt || hash) with no variant or parameters.
  It is export-only, for stores that record those out of band; `bp verify`
  and `bp inspect` accept only the default envelope form.

EXIT CODES:
  0  success (verify: password matches)
  1  verify: password does not match
  2  error

EXAMPLES:
  bp hash \"secret\"                        # Argon2id, default parameters
  echo \"secret\" | bp hash -                # Password from stdin
  bp hash --variant i --iterations 3 \"pw\"  # Argon2i, custom cost
  bp verify \"$HASH\" \"secret\"               # Check a password
  bp inspect --json \"$HASH\"                # Show recorded parameters
";

/// Exit code for errors, kept apart from a verification mismatch.
const EXIT_ERROR: u8 = 2;

fn main() -> ExitCode {
    // Check for shell completion generation before parsing args
    if let Ok(shell_name) = std::env::var("COMPLETE") {
        return generate_completions(&shell_name);
    }

    let cli = Cli::parse();
    init_tracing(cli.log_verbosity);

    tracing::debug!("bp starting");

    let result = match cli.command {
        Command::Hash(args) => run_hash(&args),
        Command::Verify(args) => run_verify(&args),
        Command::Inspect(args) => run_inspect(&args),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run_hash(args: &HashArgs) -> Result<ExitCode, String> {
    let params = resolve_params(args)?;
    let password = get_password(args.password.as_deref())?;
    let secret = known_secret();

    let mut context = HashContext::new();
    if let Some(data) = args.associated_data.as_deref() {
        context = context.with_associated_data(data.as_bytes());
    }
    if let Some(secret) = secret.as_deref() {
        context = context.with_known_secret(secret.as_bytes());
    }

    let stored = StoredHash::new(args.variant, password.as_bytes(), &params, &context)
        .map_err(|e| format!("Failed to hash password: {e}"))?;

    if args.raw {
        println!("{}", BASE64.encode(stored.hash().as_bytes()));
    } else {
        println!("{stored}");
    }

    Ok(ExitCode::SUCCESS)
}

fn run_verify(args: &VerifyArgs) -> Result<ExitCode, String> {
    let stored: StoredHash = args
        .encoded
        .parse()
        .map_err(|e| format!("Failed to read stored hash: {e}"))?;
    let password = get_password(args.password.as_deref())?;
    let secret = known_secret();

    let mut context = HashContext::new();
    if let Some(data) = args.associated_data.as_deref() {
        context = context.with_associated_data(data.as_bytes());
    }
    if let Some(secret) = secret.as_deref() {
        context = context.with_known_secret(secret.as_bytes());
    }

    let valid = stored
        .verify(password.as_bytes(), &context)
        .map_err(|e| format!("Failed to verify password: {e}"))?;

    if valid {
        println!("valid");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("invalid");
        Ok(ExitCode::FAILURE)
    }
}

fn run_inspect(args: &InspectArgs) -> Result<ExitCode, String> {
    let stored: StoredHash = args
        .encoded
        .parse()
        .map_err(|e| format!("Failed to read stored hash: {e}"))?;
    let params = stored.params();

    if args.json {
        let value = serde_json::json!({
            "variant": stored.variant().name(),
            "parameters": params,
        });
        println!("{value}");
    } else {
        println!("variant:     {}", stored.variant());
        println!("memory_kib:  {}", params.memory_kib);
        println!("iterations:  {}", params.iterations);
        println!("parallelism: {}", params.parallelism);
        println!("salt_length: {}", params.salt_length);
        println!("hash_length: {}", params.hash_length);
    }

    Ok(ExitCode::SUCCESS)
}

/// Start from the config file (or defaults) and apply flag overrides.
fn resolve_params(args: &HashArgs) -> Result<HashParameters, String> {
    let mut params = match args.config {
        Some(ref path) => load_config(path)?,
        None => HashParameters::default(),
    };

    if let Some(v) = args.salt_length {
        params = params.with_salt_length(v);
    }
    if let Some(v) = args.hash_length {
        params = params.with_hash_length(v);
    }
    if let Some(v) = args.parallelism {
        params = params.with_parallelism(v);
    }
    if let Some(v) = args.iterations {
        params = params.with_iterations(v);
    }
    if let Some(v) = args.memory_kib {
        params = params.with_memory_kib(v);
    }

    Ok(params)
}

fn load_config(path: &Path) -> Result<HashParameters, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config '{}': {e}", path.display()))?;
    serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config '{}': {e}", path.display()))
}

/// Get the password from the positional arg or stdin.
///
/// An explicitly empty argument is a valid (empty) password.
fn get_password(arg: Option<&str>) -> Result<Zeroizing<String>, String> {
    match arg {
        Some("-") => read_from_stdin(),
        Some(password) => Ok(Zeroizing::new(password.to_string())),
        None => {
            if !io::stdin().is_terminal() {
                read_from_stdin()
            } else {
                Err("No password provided. Use a positional argument or pipe to stdin.".into())
            }
        }
    }
}

/// Read a password from stdin, dropping one trailing line ending.
fn read_from_stdin() -> Result<Zeroizing<String>, String> {
    let mut content = Zeroizing::new(String::new());
    io::stdin()
        .read_to_string(&mut content)
        .map_err(|e| format!("Failed to read from stdin: {e}"))?;

    let trimmed_len = content
        .strip_suffix("\r\n")
        .or_else(|| content.strip_suffix('\n'))
        .map(str::len);
    if let Some(len) = trimmed_len {
        content.truncate(len);
    }

    Ok(content)
}

fn known_secret() -> Option<Zeroizing<String>> {
    std::env::var(KNOWN_SECRET_ENV).ok().map(Zeroizing::new)
}

/// Initialize tracing on stderr based on verbosity; `RUST_LOG` wins if set.
fn init_tracing(verbose: u8) {
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "warn".to_string(),
            1 => "warn,biscuit_password=info".to_string(),
            2 => "info,biscuit_password=debug".to_string(),
            _ => "debug,biscuit_password=trace".to_string(),
        },
    };

    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(io::stderr)
                .compact(),
        )
        .init();
}

/// Generate shell completions.
fn generate_completions(shell_name: &str) -> ExitCode {
    let shell = match shell_name.to_lowercase().as_str() {
        "bash" => Shell::Bash,
        "zsh" => Shell::Zsh,
        "fish" => Shell::Fish,
        "powershell" => Shell::PowerShell,
        "elvish" => Shell::Elvish,
        _ => {
            eprintln!(
                "Unknown shell: {shell_name}. Supported: bash, zsh, fish, powershell, elvish"
            );
            return ExitCode::from(EXIT_ERROR);
        }
    };

    clap_complete::generate(shell, &mut Cli::command(), "bp", &mut io::stdout());
    ExitCode::SUCCESS
}
