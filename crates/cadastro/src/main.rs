#![forbid(unsafe_code)]

//! # Cadastro CLI
//!
//! ## Usage
//!
//! ```bash
//! cadastro login ana@example.com --password secreta
//! cadastro list pessoas --page 2 --filter acme
//! cadastro show items 7
//! cadastro delete pre-orcamento 3 --yes
//! cadastro menu
//! ```

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;

use cadastro::{
    AuthSession, Config, DeleteOutcome, DetailPage, Dialogs, Entities, EntityKind, History, Items,
    ListController, LoginForm, Record, RestAuthService, RestClient, RestService, Scripted,
    TerminalDialogs, TransactionSummary, WorkOrders, drawer_options, logging,
};

/// Command-line access to the cadastro REST API.
#[derive(Parser, Debug)]
#[command(name = "cadastro", author, version, about)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, short = 'c', env = "CADASTRO_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and print the token
    Login {
        email: String,
        #[arg(long, env = "CADASTRO_PASSWORD")]
        password: String,
    },
    /// List one page of records
    List {
        resource: Resource,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value = "")]
        filter: String,
    },
    /// Show one record
    Show { resource: Resource, id: u64 },
    /// Delete one record
    Delete {
        resource: Resource,
        id: u64,
        /// Do not ask for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Print the navigation menu
    Menu,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Resource {
    Pessoas,
    Items,
    PreOrcamento,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    config.log.json |= cli.json_logs;
    logging::init(&config.log);
    debug!(?config, "configuration loaded");

    let client = RestClient::new(&config.api)?;

    match cli.command {
        Command::Login { email, password } => login(client, &email, &password).await,
        Command::List {
            resource,
            page,
            filter,
        } => match resource {
            Resource::Pessoas => list::<RestService<cadastro::Entity>>(client, &config, page, &filter).await,
            Resource::Items => list::<RestService<cadastro::Item>>(client, &config, page, &filter).await,
            Resource::PreOrcamento => {
                list::<RestService<TransactionSummary>>(client, &config, page, &filter).await
            }
        },
        Command::Show { resource, id } => match resource {
            Resource::Pessoas => show(Entities, client, id).await,
            Resource::Items => show(Items, client, id).await,
            Resource::PreOrcamento => show(WorkOrders, client, id).await,
        },
        Command::Delete { resource, id, yes } => {
            let dialogs: Box<dyn Dialogs> = if yes {
                Box::new(Scripted::answering(true).echo(true))
            } else {
                Box::new(TerminalDialogs)
            };
            match resource {
                Resource::Pessoas => delete(Entities, client, id, dialogs).await,
                Resource::Items => delete(Items, client, id, dialogs).await,
                Resource::PreOrcamento => delete(WorkOrders, client, id, dialogs).await,
            }
        }
        Command::Menu => {
            for option in drawer_options() {
                println!("{:<16} {}", option.path, option.label);
            }
            Ok(())
        }
    }
}

async fn login(client: RestClient, email: &str, password: &str) -> anyhow::Result<()> {
    let form = LoginForm::new();
    let mut session = AuthSession::new(RestAuthService::new(client));
    form.fill(email, password);

    if let Err(err) = form.submit(&mut session).await {
        for (path, message) in form.form().form().errors() {
            eprintln!("{path}: {message}");
        }
        bail!("{err}");
    }
    if let Some(token) = session.token() {
        println!("{token}");
    }
    Ok(())
}

async fn list<S>(client: RestClient, config: &Config, page: u32, filter: &str) -> anyhow::Result<()>
where
    S: cadastro::PersistenceService + From<RestClient>,
{
    let mut controller = ListController::new(S::from(client), TerminalDialogs, config.api.page_limit);
    controller.load(page, filter).await?;

    for row in controller.rows() {
        let id = row.id().map_or_else(|| "-".to_string(), |id| id.to_string());
        println!("{id:>6}  {}", row.label());
    }
    println!(
        "página {} de {} ({} registros)",
        controller.page(),
        controller.page_count().max(1),
        controller.total_count()
    );
    Ok(())
}

async fn show<K: EntityKind>(kind: K, client: RestClient, id: u64) -> anyhow::Result<()> {
    let history = History::new();
    let mut page = DetailPage::new(kind, RestService::<K::Record>::new(client), &history, TerminalDialogs);
    page.open(&id.to_string()).await?;

    println!("{}", page.title());
    let data = page.form().form().get_data().to_value();
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

async fn delete<K: EntityKind>(
    kind: K,
    client: RestClient,
    id: u64,
    dialogs: Box<dyn Dialogs>,
) -> anyhow::Result<()> {
    let history = History::new();
    let mut page = DetailPage::new(kind, RestService::<K::Record>::new(client), &history, dialogs.as_ref());
    page.open(&id.to_string()).await?;

    match page.delete().await {
        DeleteOutcome::Deleted => {
            debug!(route = ?history.current(), "deleted");
            Ok(())
        }
        DeleteOutcome::Declined | DeleteOutcome::Unsaved => Ok(()),
        DeleteOutcome::Failed(err) => Err(err.into()),
    }
}
