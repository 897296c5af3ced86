mod cli;

use clap::Parser;

use cli::{Cli, Commands, Context, RulesCommands};
use kontoregel::settings::load_settings;

fn init_tracing(default_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let settings = load_settings();
    init_tracing(&settings.log_level);

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir, cli.workspace),
        Commands::Rules { command } => {
            let ctx = Context::resolve(cli.db, cli.workspace, &settings);
            match command {
                RulesCommands::Add {
                    name,
                    condition,
                    value,
                    action,
                    target,
                    priority,
                    description,
                    inactive,
                } => cli::rules::add(
                    &ctx,
                    &name,
                    condition,
                    &value,
                    action,
                    &target,
                    priority,
                    description.as_deref(),
                    inactive,
                ),
                RulesCommands::List { all } => cli::rules::list(&ctx, all),
                RulesCommands::Update {
                    id,
                    name,
                    condition,
                    value,
                    action,
                    target,
                    priority,
                    description,
                } => cli::rules::update(
                    &ctx, id, name, condition, value, action, target, priority, description,
                ),
                RulesCommands::Enable { id } => cli::rules::set_active(&ctx, id, true),
                RulesCommands::Disable { id } => cli::rules::set_active(&ctx, id, false),
                RulesCommands::Delete { id } => cli::rules::delete(&ctx, id),
                RulesCommands::Reorder { assignments } => cli::rules::reorder(&ctx, &assignments),
                RulesCommands::Hit { id } => cli::rules::hit(&ctx, id),
                RulesCommands::Test {
                    condition,
                    value,
                    text,
                    amount,
                } => cli::rules::test(condition, &value, &text, amount),
            }
        }
        Commands::Evaluate {
            description,
            amount,
            record,
        } => {
            let ctx = Context::resolve(cli.db, cli.workspace, &settings);
            cli::evaluate::run(&ctx, &description, amount, record)
        }
        Commands::Batch { file, delimiter } => {
            let ctx = Context::resolve(cli.db, cli.workspace, &settings);
            cli::batch::run(&ctx, &file, delimiter)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
