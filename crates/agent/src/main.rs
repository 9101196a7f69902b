use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use kbm_agent::{
    KbmapiClient, KeySlot, PivBackend, PivtokenRegistration, PivyTool, RecoveryCredentials,
    SigningEngine, SystemClock,
};

#[derive(Parser)]
#[command(
    name = "kbm-agent",
    about = "Node agent for the Key Backup and Management API (KBMAPI)"
)]
struct Args {
    /// Base URL of the KBMAPI service.
    #[clap(long, env = "KBMAPI_URL")]
    url: String,
    /// PIV slot holding the node's key-management key.
    #[clap(long, env = "KBM_PIV_SLOT", default_value = "9e")]
    slot: KeySlot,
    /// Path to the pivy-tool binary.
    #[clap(long, env = "KBM_PIVY_TOOL", default_value = "pivy-tool")]
    pivy_tool: String,
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Fetch the PIN of an enrolled token.
    GetPin {
        #[clap(long)]
        guid: String,
    },
    /// Enroll this node's PIV token with KBMAPI.
    RegisterPivtoken {
        #[clap(long)]
        guid: String,
        /// UUID of the compute node the token lives in.
        #[clap(long, env = "KBM_CN_UUID")]
        cn_uuid: String,
    },
    /// Replace an enrolled token, authenticated by its recovery token.
    ReplacePivtoken {
        /// GUID of the token being replaced.
        #[clap(long)]
        guid: String,
        /// GUID of the replacement token.
        #[clap(long)]
        new_guid: String,
        #[clap(long, env = "KBM_CN_UUID")]
        cn_uuid: String,
        /// Recovery token issued for the old GUID, base64.
        #[clap(long, env = "KBM_RECOVERY_TOKEN")]
        recovery_token: String,
    },
    /// Ask KBMAPI to mint a fresh recovery token.
    NewRtoken {
        #[clap(long)]
        guid: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "kbm_agent=info".into()),
        )
        .init();

    let args = Args::parse();
    let backend: Arc<dyn PivBackend> = Arc::new(PivyTool::new(args.pivy_tool));
    let engine = SigningEngine::new(Box::new(SystemClock), backend.clone(), args.slot);
    let client = KbmapiClient::new(&args.url);

    match args.command {
        Cmd::GetPin { guid } => {
            let pin = client.get_pin(&engine, &guid).await?;
            println!("{pin}");
        }
        Cmd::RegisterPivtoken { guid, cn_uuid } => {
            let registration = registration_document(backend.as_ref(), args.slot, guid, cn_uuid)?;
            let grant = client.register_pivtoken(&engine, &registration).await?;
            println!("{}", serde_json::to_string_pretty(&grant)?);
        }
        Cmd::ReplacePivtoken {
            guid,
            new_guid,
            cn_uuid,
            recovery_token,
        } => {
            let registration =
                registration_document(backend.as_ref(), args.slot, new_guid, cn_uuid)?;
            let credentials = RecoveryCredentials {
                guid,
                token: recovery_token,
            };
            let grant = client
                .replace_pivtoken(&engine, &credentials, &registration)
                .await?;
            println!("{}", serde_json::to_string_pretty(&grant)?);
        }
        Cmd::NewRtoken { guid } => {
            let token = client.new_rtoken(&engine, &guid).await?;
            println!("{token}");
        }
    }
    Ok(())
}

/// Build the registration document from the key the device actually holds.
fn registration_document(
    backend: &dyn PivBackend,
    slot: KeySlot,
    guid: String,
    cn_uuid: String,
) -> Result<PivtokenRegistration> {
    let blob = backend.public_key(slot)?;
    let mut pubkeys = BTreeMap::new();
    pubkeys.insert(slot.to_string(), BASE64.encode(blob));
    Ok(PivtokenRegistration {
        guid,
        cn_uuid,
        pubkeys,
    })
}
