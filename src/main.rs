//! stillpoint - meditation catalog client
//!
//! Browse, search and edit the catalog, upload assets, and play miracles or
//! episodes in a local player.
//!
//! # Usage
//!
//! ```bash
//! # Try it without a store
//! stillpoint --demo search sleep
//!
//! # Against a configured store
//! stillpoint login admin@example.com hunter2
//! stillpoint list meditations --json
//! stillpoint play miracle 3 --player mpv
//! ```

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stillpoint::cli::{Cli, Command, ExitCode, Output};
use stillpoint::commands::{self, Context};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut ctx = Context::new(cli.config.clone(), cli.demo);

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(ctx.config.log_filter())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let exit_code = run_cli(cli, &mut ctx).await;
    std::process::exit(exit_code.into());
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli, ctx: &mut Context) -> ExitCode {
    let output = Output::new(&cli);

    match cli.command {
        Command::Load => commands::load_cmd(ctx, &output).await,

        Command::List(cmd) => commands::list_cmd(cmd, ctx, &output).await,

        Command::Search(cmd) => commands::search_cmd(cmd, ctx, &output).await,

        Command::Episodes(cmd) => commands::episodes_cmd(cmd, ctx, &output).await,

        Command::Banners => commands::banners_cmd(ctx, &output).await,

        Command::Create(cmd) => commands::create_cmd(cmd, ctx, &output).await,

        Command::Update(cmd) => commands::update_cmd(cmd, ctx, &output).await,

        Command::Delete(cmd) => commands::delete_cmd(cmd, ctx, &output).await,

        Command::Setting(cmd) => commands::setting_cmd(cmd, ctx, &output).await,

        Command::Upload(cmd) => commands::upload_cmd(cmd, ctx, &output).await,

        Command::Resolve(cmd) => commands::resolve_cmd(cmd, &output),

        Command::Play(cmd) => commands::play_cmd(cmd, ctx, &output).await,

        Command::Login(cmd) => commands::login_cmd(cmd, ctx, &output).await,

        Command::Logout => commands::logout_cmd(ctx, &output).await,

        Command::Whoami => commands::whoami_cmd(ctx, &output).await,

        Command::AddAdmin(cmd) => commands::add_admin_cmd(cmd, ctx, &output).await,
    }
}
