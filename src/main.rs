mod args;

use anyhow::Context;
use args::{Args, Command};
use clap::Parser;
use rentalhub::config::{AppConfig, ConfigLoader};
use rentalhub::errors::AppError;
use rentalhub::infrastructure::composition::{build_fresh, keys};
use rentalhub::infrastructure::container::ServiceRegistry;
use rentalhub::logging::{init_logging, LoggingConfig};
use std::fs;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let loader = match &args.config {
        Some(path) => ConfigLoader::with_config_path(path.clone()),
        None => ConfigLoader::new(),
    };
    let mut config = loader.load_config().context("loading configuration")?;
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    init_logging(&LoggingConfig::from_app(config.environment, &config.logging));

    match args.command {
        Command::Config => {
            let rendered = toml::to_string_pretty(&config).context("rendering configuration")?;
            print!("{rendered}");
        }
        Command::Services => {
            let registry = compose(config)?;
            print_services(&registry);
        }
        Command::Check => {
            let registry = compose(config)?;
            check(&registry)?;
        }
        Command::Graph { output } => {
            let dot = compose(config)?.to_dot();
            match output {
                Some(path) => {
                    fs::write(&path, dot)
                        .map_err(|e| AppError::IO(format!("writing {}", path.display()), e))?;
                    println!("Dependency graph written to {}", path.display());
                }
                None => print!("{dot}"),
            }
        }
    }
    Ok(())
}

fn compose(config: AppConfig) -> anyhow::Result<Arc<ServiceRegistry>> {
    build_fresh(Arc::new(config)).context("composing service registry")
}

fn print_services(registry: &ServiceRegistry) {
    let services = registry.describe();
    let width = services.iter().map(|info| info.key.len()).max().unwrap_or(0);

    println!("{:<width$}  {:<9}  {:<9}  DEPENDENCIES", "SERVICE", "KIND", "LIFETIME");
    for info in &services {
        let lifetime = registry
            .lifetime(&info.key)
            .map(|lifetime| lifetime.to_string())
            .unwrap_or_else(|| "-".to_string());
        let dependencies = if info.dependencies.is_empty() {
            "-".to_string()
        } else {
            info.dependencies.join(", ")
        };
        println!(
            "{:<width$}  {:<9}  {:<9}  {}",
            info.key,
            info.kind.to_string(),
            lifetime,
            dependencies
        );
    }
    println!("\n{} services registered", services.len());
}

fn check(registry: &ServiceRegistry) -> anyhow::Result<()> {
    for key in keys::CONTROLLERS {
        registry
            .resolve_instance(key)
            .with_context(|| format!("constructing '{key}'"))?;
        println!("ok  {key}");
    }
    let stats = registry.stats();
    println!("{}", stats.performance_summary());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_constructs_controllers() {
        let registry = compose(AppConfig::default()).unwrap();
        check(&registry).unwrap();
        assert!(registry.is_constructed(keys::DATABASE));
        assert!(registry.is_constructed(keys::RENTAL_FORMATTER));
    }
}
