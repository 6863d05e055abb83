// CLI modules
mod cli;

use clap::{Parser, Subcommand};
use cli::{args::Args, op::Op, Init, Key, Keygen, Login, Logout, Recover, Register, Users, Version, Whoami};

use pseudonym_client::logging::init_logging;
use pseudonym_client::AppState;

command_enum! {
    (Init, Init),
    (Keygen, Keygen),
    (Login, Login),
    (Logout, Logout),
    (Whoami, Whoami),
    (Users, Users),
    (Register, Register),
    (Recover, Recover),
    (Key, Key),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let state = match AppState::load_or_default(args.config_path.clone()) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    // load_or_default already validated the level
    let level = state.config.level().unwrap_or(tracing::Level::INFO);
    let _guards = init_logging(&state.config, level);

    let api_url = cli::op::resolve_remote(args.api_url, &state.config.api_url);
    let directory_url = cli::op::resolve_remote(args.directory_url, &state.config.directory_url);

    let ctx = match cli::op::OpContext::new(state, api_url, directory_url, args.config_path) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: Failed to create API client: {}", e);
            std::process::exit(1);
        }
    };

    let result = args.command.execute(&ctx).await;

    // the notification slot is rendered once, after the command settles
    let notice = ctx.dispatcher.read(|m| {
        let slot = m.notifications().current();
        slot.open.then(|| slot.message.clone())
    });
    if let Some(message) = notice {
        eprintln!("[{}]", message);
    }

    match result {
        Ok(output) => {
            println!("{}", output);
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
