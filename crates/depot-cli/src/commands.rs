use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use depot_crypto::PublicKeyInfo;
use depot_server::{DepotServer, LogConfig, LogFormat};
use depot_store::layout;
use depot_types::PlatformRef;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Key(KeyArgs {
            action: KeyAction::Inspect { file, format },
        }) => cmd_key_inspect(&file, format),
        Command::Layout(args) => cmd_layout(args),
    }
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = args.load_config()?;
    init_tracing(&config.log)?;
    tracing::debug!(backend = config.backend.kind(), base_url = %config.base_url, "configuration loaded");
    let server = DepotServer::new(config).context("cannot build storage backend")?;
    server.serve().await?;
    Ok(())
}

/// `RUST_LOG` wins over the configured level when set.
fn init_tracing(log: &LogConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&log.level)
            .with_context(|| format!("invalid log level {:?}", log.level))?,
    };
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match log.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("cannot initialise logging: {e}"))
}

fn inspect_file(path: &Path) -> anyhow::Result<PublicKeyInfo> {
    let armored = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    depot_crypto::inspect_public_key(&armored)
        .with_context(|| format!("{} is not a usable public key", path.display()))
}

fn cmd_key_inspect(path: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let info = inspect_file(path)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&info)?),
        OutputFormat::Text => {
            println!("{}  {}", "key id:     ".bold(), info.key_id.yellow().bold());
            match &info.fingerprint {
                Some(fp) => println!("{}  {}", "fingerprint:".bold(), fp.cyan()),
                None => println!("{}  {}", "fingerprint:".bold(), "(v3 key)".dimmed()),
            }
            println!("{}  v{}", "version:    ".bold(), info.version);
            println!("{}  {}", "algorithm:  ".bold(), info.algorithm);
            println!("{}  {}", "created:    ".bold(), info.created_at.to_rfc3339());
        }
    }
    Ok(())
}

fn layout_entries(platform: &PlatformRef) -> Vec<(&'static str, String)> {
    let version = platform.version_ref();
    vec![
        ("binary", layout::binary_key(platform)),
        ("shasums", layout::shasums_key(version)),
        ("signature", layout::shasums_sig_key(version)),
        ("metadata", layout::metadata_key(version)),
        ("keys", layout::keys_root(version.namespace())),
    ]
}

fn cmd_layout(args: LayoutArgs) -> anyhow::Result<()> {
    let platform = PlatformRef::new(
        &args.namespace,
        &args.name,
        &args.version,
        &args.os,
        &args.arch,
    )?;
    println!("{}", platform.to_string().bold());
    for (label, key) in layout_entries(&platform) {
        println!("  {:<10} {}", label.green(), key);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../depot-crypto/tests/fixtures")
            .join(name)
    }

    #[test]
    fn inspects_fixture_keys() {
        let info = inspect_file(&fixture("ed25519_public.asc")).unwrap();
        assert_eq!(info.key_id, "8442047DE3AAFF63");

        let info = inspect_file(&fixture("rsa_public.asc")).unwrap();
        assert_eq!(info.key_id, "C04521F4E263C3C4");
    }

    #[test]
    fn inspect_rejects_signature_block() {
        let err = inspect_file(&fixture("manifest.sig")).unwrap_err();
        assert!(err.to_string().contains("not a usable public key"));
    }

    #[test]
    fn inspect_reports_missing_file() {
        let err = inspect_file(Path::new("/nonexistent/key.asc")).unwrap_err();
        assert!(err.to_string().starts_with("cannot read"));
    }

    #[test]
    fn layout_lists_every_artifact() {
        let platform = PlatformRef::new("acme", "widget", "1.0.0", "linux", "amd64").unwrap();
        let entries = layout_entries(&platform);
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[0].1, layout::binary_key(&platform));
        assert!(entries[0].1.ends_with("terraform-provider-widget_1.0.0_linux_amd64.zip"));
        assert!(entries[1].1.ends_with("terraform-provider-widget_1.0.0_SHA256SUMS"));
    }

    #[test]
    fn layout_rejects_bad_version() {
        let args = LayoutArgs {
            namespace: "acme".into(),
            name: "widget".into(),
            version: "latest".into(),
            os: "linux".into(),
            arch: "amd64".into(),
        };
        assert!(cmd_layout(args).is_err());
    }
}
