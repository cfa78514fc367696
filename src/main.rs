use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use parley::content::ContentItem;
use parley::protocol::{self, Invocation};
use parley::voice::{AudioCache, AudioKey};
use parley::{Config, Error, config, llm, tools};

/// Parley - Text-protocol tool calling for chat backends
#[derive(Parser)]
#[command(name = "parley", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the tool preamble for the built-in tools
    Describe,
    /// Parse a model reply for a tool call
    Parse {
        /// Reply text
        reply: String,
    },
    /// Run one turn against the configured backend with the built-in tools
    Chat {
        /// User message
        prompt: String,
    },
    /// Store or fetch synthesized audio in the local cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Store the bytes of a file under a key
    Put {
        #[command(flatten)]
        key: KeyArgs,
        /// Audio file to store
        file: PathBuf,
    },
    /// Write the cached bytes for a key to a file
    Get {
        #[command(flatten)]
        key: KeyArgs,
        /// Destination file
        out: PathBuf,
    },
}

#[derive(Args)]
struct KeyArgs {
    /// Voice identifier
    #[arg(long, default_value = "alloy")]
    voice: String,
    /// Sample rate in Hz
    #[arg(long, default_value_t = 16_000)]
    rate: u32,
    #[arg(long, default_value_t = 1)]
    channels: u16,
    /// Bits per sample
    #[arg(long, default_value_t = 16)]
    bits: u16,
    /// Spoken text
    #[arg(long)]
    text: String,
}

impl From<KeyArgs> for AudioKey {
    fn from(args: KeyArgs) -> Self {
        Self {
            voice: args.voice,
            rate: args.rate,
            channels: args.channels,
            bits: args.bits,
            text: args.text,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,parley=info",
        1 => "info,parley=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Describe => {
            if let Some(preamble) = tools::describe(&tools::demo_tools()) {
                println!("{preamble}");
            }
            Ok(())
        }
        Command::Parse { reply } => {
            cmd_parse(&reply);
            Ok(())
        }
        Command::Chat { prompt } => cmd_chat(prompt).await,
        Command::Cache { action } => cmd_cache(action),
    }
}

fn cmd_cache(action: CacheAction) -> anyhow::Result<()> {
    let dir = config::cache_dir();
    let mut cache = AudioCache::open(&dir)?;

    match action {
        CacheAction::Put { key, file } => {
            let audio = std::fs::read(&file)?;
            cache.put(&key.into(), &audio)?;
            println!("cached {} bytes in {}", audio.len(), dir.display());
        }
        CacheAction::Get { key, out } => {
            let Some(audio) = cache.get(&key.into())? else {
                anyhow::bail!("no cached audio for that key in {}", dir.display());
            };
            std::fs::write(&out, &audio)?;
            println!("wrote {} bytes to {}", audio.len(), out.display());
        }
    }
    Ok(())
}

fn cmd_parse(reply: &str) {
    match protocol::parse_invocation(reply) {
        Ok(Some(Invocation {
            name, arguments, ..
        })) => {
            println!("function: {name}");
            for (i, arg) in arguments.iter().enumerate() {
                println!("  arg {i}: {}", arg.to_source());
            }
        }
        Ok(None) => println!("no tool call"),
        Err(e) if e.is_protocol_violation() => println!("protocol violation: {e}"),
        Err(e) => println!("invalid: {e}"),
    }
}

async fn cmd_chat(prompt: String) -> anyhow::Result<()> {
    let config = Config::load()?;
    tracing::debug!(?config, "loaded configuration");

    let mut backend = llm::connect(&config.backend).await?;
    let transcript = vec![ContentItem::user(prompt)];

    let segments = match parley::run_turn(&mut backend, &transcript, &tools::demo_tools()).await {
        Ok(segments) => segments,
        Err(e @ (Error::EmbeddedInvocation(_) | Error::ProtocolViolation(_))) => {
            anyhow::bail!("model broke the tool-call protocol: {e}")
        }
        Err(e) => return Err(e.into()),
    };

    for segment in segments {
        println!("{segment}");
    }
    Ok(())
}
