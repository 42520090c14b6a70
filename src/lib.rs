pub mod commands;
pub mod config_store;
pub mod engine;
pub mod models;
pub mod node_graph;
pub mod playback;
pub mod session;
pub mod settings;
pub mod share;

use clap::Parser;

use crate::commands::{Cli, Commands, SettingsAction};

pub use crate::config_store::ConfigStore;
pub use crate::playback::{PatternRunner, RunnerSettings, RunnerStatus, SubmitOutcome};
pub use crate::session::FlowSession;

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn load_settings_or_default() -> settings::AppSettings {
    commands::settings::get_settings().unwrap_or_else(|e| {
        log::warn!("Using default settings: {}", e);
        settings::AppSettings::default()
    })
}

fn execute(command: Commands) -> Result<(), String> {
    let settings = load_settings_or_default();

    match command {
        Commands::Compile { project } => {
            let output = commands::node_graph::compile_project(&project, &settings)?;
            if output.is_empty() {
                log::info!("Nothing to play");
            } else {
                println!("{}", output);
            }
        }
        Commands::Groups { project } => {
            for line in commands::node_graph::list_groups(&project, &settings)? {
                println!("{}", line);
            }
        }
        Commands::Share { project, base_url } => {
            let link =
                commands::share::share_project(&project, base_url.as_deref(), &settings)?;
            println!("{}", link);
        }
        Commands::Open { input } => {
            println!("{}", commands::share::open_shared(&input, &settings)?);
        }
        Commands::Play { project } => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .map_err(|e| format!("Failed to start runtime: {}", e))?;
            let report =
                runtime.block_on(commands::node_graph::play_project(&project, &settings))?;
            for line in report {
                println!("{}", line);
            }
        }
        Commands::Settings { action } => match action {
            SettingsAction::Get => {
                let json = serde_json::to_string_pretty(&settings)
                    .map_err(|e| format!("Failed to format settings: {}", e))?;
                println!("{}", json);
            }
            SettingsAction::Set { key, value } => {
                commands::settings::set_setting(&key, &value)?;
            }
        },
        Commands::NodeTypes => {
            for def in commands::node_graph::get_node_types() {
                println!(
                    "{:<14} {:<12} {}",
                    def.id,
                    def.category.unwrap_or_default(),
                    def.description.unwrap_or_default()
                );
            }
        }
    }

    Ok(())
}

pub fn run() {
    let cli = Cli::parse();
    init_logging();

    if let Err(err) = execute(cli.command) {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
