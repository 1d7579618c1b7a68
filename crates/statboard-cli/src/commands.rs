//! Command handlers.

use anyhow::{Context, Result};
use tracing::{debug, warn};

use statboard_core::cache::{CacheService, CacheStore};
use statboard_core::config::DefaultEntity;
use statboard_core::export::export_csv;
use statboard_core::indicators;
use statboard_core::utils::{format_date, format_number, truncate_string};
use statboard_core::{Config, Entity, EntityLevel, Indicator, Profile, StatsApiClient};

use crate::cli::{CacheCommands, Cli, Commands, ConfigCommands};

/// Column width for indicator names in tables
const NAME_WIDTH: usize = 36;

pub async fn run(cli: &Cli, mut config: Config) -> Result<()> {
    match &cli.command {
        Commands::Indicators => {
            list_indicators();
            Ok(())
        }
        Commands::Config { action } => run_config(action, &mut config),
        Commands::Cache { action } => {
            let store = CacheStore::new(config.cache_dir()?)?;
            run_cache(action, &store)
        }
        Commands::Summary => {
            let ctx = EntitySession::new(cli, &config)?;
            summary(ctx).await
        }
        Commands::Chart {
            indicator,
            frequency,
            app,
            profile,
            refresh,
        } => {
            let ctx = EntitySession::new(cli, &config)?;
            let mut indicator = find_indicator(indicator)?;
            if let Some(freq) = frequency {
                if !indicator.set_frequency(*freq) {
                    anyhow::bail!("{} does not offer {} frequency", indicator.name, freq);
                }
            }
            if let Some(profile) = profile {
                select_profile(&mut indicator, *profile)?;
            }
            chart(ctx, &indicator, app.as_deref(), *refresh).await
        }
        Commands::Export { indicator, output } => {
            let ctx = EntitySession::new(cli, &config)?;
            let indicator = find_indicator(indicator)?;
            export(ctx, &indicator, output.as_deref()).await
        }
    }
}

/// What the data commands share: the cache service, the on-disk store and
/// the entity being looked at.
struct EntitySession {
    service: CacheService<StatsApiClient>,
    store: CacheStore,
    entity: Entity,
}

impl EntitySession {
    fn new(cli: &Cli, config: &Config) -> Result<Self> {
        let (id, level) = resolve_entity(cli.entity.as_deref(), cli.level, config.default_entity.as_ref())?;

        let mut client = StatsApiClient::new(config.api_base_url.clone())?;
        if let Some(ref token) = config.token {
            client.set_token(token.clone());
        }
        let service = CacheService::new(client)
            .with_ttl(config.cache_ttl())
            .with_since_months(config.since_months);

        let store = CacheStore::new(config.cache_dir()?)?;
        let entity = store.load_or_new(level, &id);
        debug!(entity = %entity.id, level = %entity.level, age = %entity.cache_data.age_display(), "Entity loaded");

        Ok(Self { service, store, entity })
    }

    fn save(&self) {
        if let Err(e) = self.store.save_entity(&self.entity) {
            warn!(entity = %self.entity.id, error = %e, "Failed to save entity cache");
        }
    }
}

fn resolve_entity(
    id: Option<&str>,
    level: Option<EntityLevel>,
    default: Option<&DefaultEntity>,
) -> Result<(String, EntityLevel)> {
    match (id, default) {
        (Some(id), _) => Ok((id.to_string(), level.unwrap_or(EntityLevel::Structure))),
        (None, Some(d)) => Ok((d.id.clone(), level.unwrap_or(d.level))),
        (None, None) => anyhow::bail!(
            "No entity given. Pass --entity or run `statboard config set default_entity <level>:<id>`"
        ),
    }
}

fn find_indicator(name: &str) -> Result<Indicator> {
    indicators::find(name).ok_or_else(|| {
        let known: Vec<String> = indicators::all().into_iter().map(|i| i.name).collect();
        anyhow::anyhow!("Unknown indicator {}. Known indicators: {}", name, known.join(", "))
    })
}

fn select_profile(indicator: &mut Indicator, profile: Profile) -> Result<()> {
    let offered = indicator.chart_profiles.as_deref().unwrap_or_default();
    if !offered.contains(&profile) {
        anyhow::bail!("{} has no {} profile selector", indicator.name, profile);
    }
    indicator.chart_profile = Some(profile);
    Ok(())
}

fn list_indicators() {
    println!(
        "{:<w$} {:<6} {:<9} {:<16} FREQUENCIES",
        "NAME",
        "CHART",
        "API",
        "METRIC",
        w = NAME_WIDTH
    );
    for indicator in indicators::all() {
        let frequencies: Vec<&str> = indicator.chart_frequencies.iter().map(|f| f.as_str()).collect();
        println!(
            "{:<w$} {:<6} {:<9} {:<16} {}",
            truncate_string(&indicator.name, NAME_WIDTH),
            indicator.chart_type.as_str(),
            indicator.api.as_str(),
            indicator.api_type.as_str(),
            frequencies.join(","),
            w = NAME_WIDTH
        );
    }
}

async fn summary(mut ctx: EntitySession) -> Result<()> {
    let all = indicators::all();
    ctx.service
        .init_entity_month_cache_data(&all, &mut ctx.entity)
        .await
        .with_context(|| format!("Failed to load stats for {}", ctx.entity.display_name()))?;
    ctx.save();

    let since = ctx.service.since();
    println!(
        "{} ({}) - monthly data since {}, updated {}",
        ctx.entity.display_name(),
        ctx.entity.level,
        format_date(&since),
        ctx.entity.cache_data.age_display()
    );
    for indicator in &all {
        let cached = ctx
            .entity
            .cache_data
            .find(&indicator.name, indicator.frequency)
            .map(|c| c.data.len())
            .unwrap_or(0);
        let total = ctx
            .entity
            .cache_data
            .total_value(&indicator.name)
            .map(format_number)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<w$} {:>12} {:>6} records",
            indicator.name,
            total,
            cached,
            w = NAME_WIDTH
        );
    }
    Ok(())
}

async fn chart(mut ctx: EntitySession, indicator: &Indicator, app: Option<&str>, refresh: bool) -> Result<()> {
    if refresh {
        ctx.entity.cache_data.last_update = None;
    }

    if indicator.name == indicators::CONNECTOR_DETAILS && app.is_none() {
        let data = ctx.service.get_indicator_data(indicator, &mut ctx.entity).await?;
        let apps = indicators::post_init(indicator, &data);
        if !apps.is_empty() {
            let names: Vec<&str> = apps.iter().map(|a| a.key.as_str()).collect();
            eprintln!("Available connectors: {}", names.join(", "));
        }
    }

    let data = indicators::chart_data(indicator, &mut ctx.entity, &ctx.service, app).await?;
    ctx.save();

    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

async fn export(mut ctx: EntitySession, indicator: &Indicator, output: Option<&std::path::Path>) -> Result<()> {
    let indicator = indicator.for_export();
    // Check before hitting the API
    export_csv(&indicator, &[])?;

    let data = ctx.service.get_indicator_data(&indicator, &mut ctx.entity).await?;
    ctx.save();
    let csv = export_csv(&indicator, &data)?;

    match output {
        Some(path) => {
            std::fs::write(path, csv).with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Exported {} records to {}", data.len(), path.display());
        }
        None => print!("{}", csv),
    }
    Ok(())
}

fn run_cache(action: &CacheCommands, store: &CacheStore) -> Result<()> {
    match action {
        CacheCommands::Status => {
            let entries = store.entries()?;
            if entries.is_empty() {
                println!("No cached entities in {}", store.dir().display());
            }
            for (entity, age) in entries {
                println!(
                    "{:<10} {:<40} {:>3} indicators, updated {}",
                    entity.level.as_str(),
                    entity.display_name(),
                    entity.cache_data.indicators.len(),
                    age
                );
            }
        }
        CacheCommands::Clear => {
            let removed = store.clear()?;
            println!("Removed {} cached entities", removed);
        }
    }
    Ok(())
}

fn run_config(action: &ConfigCommands, config: &mut Config) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let mut shown = config.clone();
            if shown.token.is_some() {
                shown.token = Some("********".to_string());
            }
            println!("# {}", Config::config_path()?.display());
            println!("{}", serde_json::to_string_pretty(&shown)?);
        }
        ConfigCommands::Set { key, value } => {
            // Start from the file, not the env-overridden values
            let mut stored = Config::load()?;
            stored.set(key, value)?;
            stored.save()?;
            *config = stored;
            println!("Set {}", key);
        }
    }
    Ok(())
}
