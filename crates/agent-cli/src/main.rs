use anyhow::Result;
use clap::{Parser, Subcommand};

use agent_cli::commands;
use agent_cli::commands::config::ConfigAction;
use agent_cli::config::AgentConfig;

#[derive(Parser)]
#[command(name = "agent")]
#[command(about = "Operator CLI for the agent platform", long_about = None)]
#[command(version)]
struct Cli {
    /// Agent host to bind (serve) or talk to (health/version/reload)
    #[arg(long, global = true, default_value = "127.0.0.1")]
    host: String,

    /// Agent port to bind (serve) or talk to (health/version/reload)
    #[arg(long, global = true, default_value_t = 3000)]
    port: u16,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose the configured template and serve the agent's operational
    /// surface until interrupted.
    Serve {
        /// Directory holding the template tree to compose
        #[arg(long)]
        template_dir: Option<String>,

        /// Name of the template to resolve out of `template_dir`
        #[arg(long)]
        template_name: Option<String>,

        /// Name this agent advertises
        #[arg(long)]
        agent_name: Option<String>,
    },

    /// Show or edit an installed skill instance's configuration
    Config {
        /// Skill name
        skill: String,

        /// Instance name
        #[arg(short = 'i', long)]
        instance: Option<String>,

        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Query a running agent's `/health` endpoint
    Health,

    /// Query a running agent's `/version` endpoint
    Version,

    /// Trigger a hot-reload of a loaded skill via `/skills/{name}/reload`
    Reload {
        /// Skill name to reload
        skill: String,

        /// Bearer token, if the agent's operational surface requires one
        #[arg(long, env = "AGENT_AUTH_TOKEN")]
        token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let result = match cli.command {
        Commands::Serve { template_dir, template_name, agent_name } => {
            let cwd = std::env::current_dir()?;
            let mut agent_config = AgentConfig::load(&cwd)?;
            agent_config.host = cli.host;
            agent_config.port = cli.port;
            if let Some(dir) = template_dir {
                agent_config.template_dir = Some(dir);
            }
            if let Some(name) = template_name {
                agent_config.template_name = Some(name);
            }
            if let Some(name) = agent_name {
                agent_config.agent_name = name;
            }
            commands::serve::execute(agent_config).await
        }
        Commands::Config { skill, instance, action } => {
            commands::config::execute(&skill, instance.as_deref(), action).await
        }
        Commands::Health => commands::client::health(&cli.host, cli.port).await,
        Commands::Version => commands::client::version(&cli.host, cli.port).await,
        Commands::Reload { skill, token } => {
            commands::client::reload(&cli.host, cli.port, &skill, token.as_deref()).await
        }
    };

    if let Err(err) = &result {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }

    result
}
