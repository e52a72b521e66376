use crate::config::ConfigLoader;
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration (merged)
    Show,
    /// Show configuration and database paths
    Path,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => {
            let config = ConfigLoader::load()?;
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigCommands::Path => {
            let config = ConfigLoader::load()?;
            match ConfigLoader::user_config_path() {
                Some(path) => println!("User config:    {}", path.display()),
                None => println!("User config:    (no home directory)"),
            }
            println!(
                "Project config: {}",
                ConfigLoader::project_config_path().display()
            );
            println!("Database:       {}", config.memory.database.display());
        }
    }
    Ok(())
}
