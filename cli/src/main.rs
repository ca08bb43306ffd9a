mod atomic_write;
mod commands;
mod config;
mod logging;
mod send_log;
mod short_link_store;
mod template_store;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use studio_protocol::TemplateId;
use studio_protocol::TenantId;
use studio_protocol::preview::LinkResolver;
use studio_protocol::variables::VariableBindings;
use studio_tui::ManagerContext;
use studio_tui::ManagerExit;
use studio_tui::StudioTui;

use crate::commands::Studio;
use crate::commands::TokenArgs;
use crate::config::ConfigStore;
use crate::config::StudioConfig;
use crate::send_log::SendLog;
use crate::send_log::whatsapp_deep_link;
use crate::short_link_store::JsonShortLinkStore;
use crate::template_store::JsonTemplateStore;

#[derive(Parser, Debug)]
#[command(
    author = "Studio",
    version,
    about = "Manage WhatsApp message templates for a photography studio"
)]
struct Cli {
    /// Tenant (studio) to work on. Defaults to the `tenant` key of the config file.
    #[arg(long, env = "STUDIO_TENANT", global = true)]
    tenant: Option<String>,

    /// Path to the config file (default: `~/.studio/config.toml`).
    #[arg(long, env = "STUDIO_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Open the interactive template manager (the default).
    Manage {
        /// Portfolio slug offered by Ctrl+L.
        #[arg(long)]
        portfolio: Option<String>,

        /// Preview value for a variable, as `key=value`. Repeatable.
        #[arg(long = "var", value_name = "KEY=VALUE")]
        vars: Vec<String>,

        /// Recipient for Ctrl+E; prints a WhatsApp link after sending.
        #[arg(long)]
        phone: Option<String>,
    },

    /// List templates in display order.
    List,

    /// Create a template.
    Add {
        title: String,
        message: String,

        /// Append a `[[key]]` variable chip. Repeatable.
        #[arg(long = "var-token", value_name = "KEY")]
        var_tokens: Vec<String>,

        /// Append a portfolio link chip for this slug.
        #[arg(long)]
        portfolio: Option<String>,
    },

    /// Change a template's title or message.
    Edit {
        id: TemplateId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        message: Option<String>,
    },

    /// Delete a template.
    Delete { id: TemplateId },

    /// Move a template to a zero-based position.
    Move {
        id: TemplateId,
        #[arg(long)]
        to: usize,
    },

    /// Print a template with variables and links resolved.
    Preview {
        id: TemplateId,
        #[arg(long = "var", value_name = "KEY=VALUE")]
        vars: Vec<String>,
    },

    /// Resolve a template and log it as sent.
    Send {
        id: TemplateId,
        #[arg(long = "var", value_name = "KEY=VALUE")]
        vars: Vec<String>,

        /// Recipient phone number; prints a WhatsApp link when given.
        #[arg(long)]
        phone: Option<String>,
    },

    /// Update the config file.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Set the default tenant.
    SetTenant { tenant: String },

    /// Set the base URLs used to build portfolio links.
    SetLinks {
        #[arg(long)]
        portfolio_base_url: Option<String>,
        #[arg(long)]
        short_link_base_url: Option<String>,
    },
}

fn parse_bindings(vars: &[String]) -> anyhow::Result<VariableBindings> {
    let mut bindings = VariableBindings::new();
    for pair in vars {
        bindings.insert_pair(pair)?;
    }
    Ok(bindings)
}

fn link_resolver(config: &StudioConfig) -> LinkResolver {
    let links = LinkResolver::new(config.portfolio_base_url.clone());
    match config.short_link_base_url.as_deref() {
        Some(base) => links.with_short_link_base_url(base),
        None => links,
    }
}

fn open_studio(config: &StudioConfig, tenant: TenantId) -> Studio {
    Studio {
        tenant,
        store: Arc::new(JsonTemplateStore::new(config.data_dir.clone())),
        short_links: Arc::new(JsonShortLinkStore::new(config.data_dir.clone())),
        sink: Arc::new(SendLog::new(config.data_dir.clone())),
        links: link_resolver(config),
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_store = match cli.config {
        Some(path) => ConfigStore::new(path),
        None => ConfigStore::new_default()?,
    };
    let tenant_flag = cli.tenant;
    // Config commands run without loading the config, so they can repair an invalid tenant.
    let open = || -> anyhow::Result<Studio> {
        let config = config_store.load()?;
        logging::init_logging(&config.data_dir)?;
        let tenant = TenantId::new(tenant_flag.clone().unwrap_or_else(|| config.tenant.clone()))?;
        tracing::info!("studio starting for tenant {tenant}");
        Ok(open_studio(&config, tenant))
    };

    let command = cli.command.unwrap_or(CliCommand::Manage {
        portfolio: None,
        vars: Vec::new(),
        phone: None,
    });
    let output = match command {
        CliCommand::Config { command } => return run_config_command(&config_store, &command),
        CliCommand::Manage {
            portfolio,
            vars,
            phone,
        } => {
            let session = ManageSession::new(portfolio, &vars, phone)?;
            return manage(open()?, session).await;
        }
        CliCommand::List => open()?.list()?,
        CliCommand::Add {
            title,
            message,
            var_tokens,
            portfolio,
        } => open()?.add(
            &title,
            &message,
            &TokenArgs {
                variables: var_tokens,
                portfolio,
            },
        )?,
        CliCommand::Edit { id, title, message } => {
            open()?.edit(id, title.as_deref(), message.as_deref())?
        }
        CliCommand::Delete { id } => open()?.delete(id)?,
        CliCommand::Move { id, to } => open()?.move_to(id, to)?,
        CliCommand::Preview { id, vars } => {
            let bindings = parse_bindings(&vars)?;
            open()?.preview(id, &bindings)?
        }
        CliCommand::Send { id, vars, phone } => {
            let bindings = parse_bindings(&vars)?;
            open()?.send(id, &bindings, phone.as_deref())?
        }
    };
    print!("{output}");
    Ok(())
}

fn run_config_command(store: &ConfigStore, command: &ConfigCommand) -> anyhow::Result<()> {
    match command {
        ConfigCommand::SetTenant { tenant } => {
            let tenant = TenantId::new(tenant.clone())?;
            store.set_tenant(tenant.as_str())?;
            println!("Default tenant set to {tenant} in {}", store.path().display());
        }
        ConfigCommand::SetLinks {
            portfolio_base_url,
            short_link_base_url,
        } => {
            if portfolio_base_url.is_none() && short_link_base_url.is_none() {
                anyhow::bail!("pass --portfolio-base-url and/or --short-link-base-url");
            }
            for (key, value) in [
                ("portfolio_base_url", portfolio_base_url),
                ("short_link_base_url", short_link_base_url),
            ] {
                if let Some(value) = value {
                    url::Url::parse(value).with_context(|| format!("invalid {key} `{value}`"))?;
                    store.set_link(key, value)?;
                }
            }
            println!("Links updated in {}", store.path().display());
        }
    }
    Ok(())
}

/// Validated `manage` arguments.
#[derive(Debug)]
struct ManageSession {
    portfolio: Option<String>,
    bindings: VariableBindings,
    phone: Option<String>,
}

impl ManageSession {
    fn new(
        portfolio: Option<String>,
        vars: &[String],
        phone: Option<String>,
    ) -> anyhow::Result<Self> {
        if let Some(slug) = portfolio.as_deref() {
            commands::check_portfolio_slug(slug)?;
        }
        if let Some(phone) = phone.as_deref() {
            if whatsapp_deep_link(phone, "").is_none() {
                anyhow::bail!("invalid phone number `{phone}`: it has no digits");
            }
        }
        Ok(Self {
            portfolio,
            bindings: parse_bindings(vars)?,
            phone,
        })
    }
}

async fn manage(studio: Studio, session: ManageSession) -> anyhow::Result<()> {
    let ctx = ManagerContext {
        tenant: studio.tenant.clone(),
        store: Arc::clone(&studio.store),
        short_links: Arc::clone(&studio.short_links),
        bindings: session.bindings,
        links: studio.links.clone(),
        portfolio_slug: session.portfolio,
    };

    let mut ui = StudioTui::new()?;
    let exit = ui.manage_templates(ctx).await;
    // Restore the terminal before printing anything.
    drop(ui);

    match exit.context("run template manager")? {
        ManagerExit::Quit => {}
        ManagerExit::Send {
            template_id,
            canonical,
            resolved,
        } => {
            tracing::info!("sending composed message ({} chars canonical)", canonical.len());
            print!(
                "{}",
                studio.send_text(template_id, resolved, session.phone.as_deref())?
            );
        }
    }
    Ok(())
}
