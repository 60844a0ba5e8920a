use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use keystore_bootstrap::{
    config::BootstrapConfig, error::BootstrapError, keystore, BootstrapOutcome, KeystoreBootstrap,
};

#[derive(Parser)]
#[command(name = "keystore-bootstrap")]
#[command(version)]
#[command(about = "Produces a PKCS#12 keystore from PEM material before TLS starts", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when it does not exist.
    #[arg(short = 'c', long = "config", global = true, default_value = "keystore-bootstrap.toml")]
    config: PathBuf,

    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the keystore unless a usable one already exists.
    Run(SslOverrides),
    /// Print the entry stored in a keystore.
    Inspect(InspectArgs),
    /// Print database credentials from the configured secret as JSON.
    DbCredentials(StoreOverrides),
}

#[derive(Args)]
struct SslOverrides {
    #[arg(long = "keystore-path", env = "KEYSTORE_PATH")]
    keystore_path: Option<String>,

    #[arg(long = "keystore-password", env = "KEYSTORE_PASSWORD", hide_env_values = true)]
    keystore_password: Option<String>,

    #[arg(long = "key-alias", env = "KEY_ALIAS")]
    key_alias: Option<String>,

    /// Name of a secret holding `certificate` and `privateKey`. Overrides local paths.
    #[arg(long = "remote-secret-name", env = "REMOTE_SECRET_NAME")]
    remote_secret_name: Option<String>,

    #[command(flatten)]
    store: StoreOverrides,
}

#[derive(Args)]
struct StoreOverrides {
    /// Secret store endpoint.
    #[arg(long = "secret-store-endpoint", env = "SECRET_STORE_ENDPOINT")]
    secret_store_endpoint: Option<String>,
}

#[derive(Args)]
struct InspectArgs {
    #[arg(short = 'k', long = "keystore-path", env = "KEYSTORE_PATH")]
    keystore_path: PathBuf,

    #[arg(short = 'p', long = "password", env = "KEYSTORE_PASSWORD", hide_env_values = true)]
    password: String,
}

impl SslOverrides {
    fn apply(self, config: &mut BootstrapConfig) {
        if let Some(path) = self.keystore_path {
            config.ssl.keystore_path = path;
        }
        if let Some(password) = self.keystore_password {
            config.ssl.keystore_password = password;
        }
        if let Some(alias) = self.key_alias {
            config.ssl.key_alias = alias;
        }
        if let Some(name) = self.remote_secret_name {
            config.ssl.remote_secret_name = Some(name);
        }
        self.store.apply(config);
    }
}

impl StoreOverrides {
    fn apply(self, config: &mut BootstrapConfig) {
        if let Some(endpoint) = self.secret_store_endpoint {
            config.secret_store.endpoint = Some(endpoint);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = execute(cli) {
        log::error!("{}: {}", e.kind(), e);
        std::process::exit(1);
    }
}

fn execute(cli: Cli) -> Result<(), BootstrapError> {
    match cli.commands {
        Commands::Run(overrides) => {
            let mut config = BootstrapConfig::load_or_default(&cli.config)?;
            overrides.apply(&mut config);
            log::debug!("{:?}", config.ssl);

            let outcome = KeystoreBootstrap::from_config(config)?.run()?;
            match &outcome {
                BootstrapOutcome::Disabled | BootstrapOutcome::Skipped => {}
                BootstrapOutcome::Reused(handoff) => {
                    println!("reused {} (alias {})", handoff.path.display(), handoff.alias)
                }
                BootstrapOutcome::Generated(handoff) => {
                    println!("generated {} (alias {})", handoff.path.display(), handoff.alias)
                }
            }
        }
        Commands::Inspect(args) => {
            let contents = keystore::open(&args.keystore_path, &args.password)?;
            let summary = contents.certificate.summary()?;
            println!("alias:       {}", contents.alias.as_deref().unwrap_or("<none>"));
            println!("subject:     {}", summary.subject);
            println!("issuer:      {}", summary.issuer);
            println!("not before:  {}", summary.not_before);
            println!("not after:   {}", summary.not_after);
            println!("valid now:   {}", summary.currently_valid);
            println!("sha256:      {}", summary.fingerprint);
            println!("chain extra: {}", contents.chain_len);
            println!("key matches: {}", contents.key_matches_certificate());
        }
        Commands::DbCredentials(overrides) => {
            let mut config = BootstrapConfig::load_or_default(&cli.config)?;
            overrides.apply(&mut config);

            match KeystoreBootstrap::from_config(config)?.database_credentials()? {
                Some(credentials) => {
                    let json = serde_json::to_string_pretty(&credentials).map_err(|e| {
                        BootstrapError::SecretFetchFailure(format!("could not encode credentials: {e}"))
                    })?;
                    println!("{json}");
                }
                None => log::info!("No database credentials configured"),
            }
        }
    }
    Ok(())
}
