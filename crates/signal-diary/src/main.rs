//! `sigdiary` - CLI for signal-diary
//!
//! This binary provides the command-line interface for logging signal
//! problems, reviewing patterns, and exporting reports.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::fs;
use std::io::{self, Write};
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::debug;

use signal_diary::cli::{
    ClearCommand, Cli, Command, ConfigCommand, ExportCommand, HistoryCommand, LocationsCommand,
    LogCommand, PatternsCommand, ProfileCommand, ProfileFields, ProvidersCommand,
};
use signal_diary::providers::{self, OTHER_PROVIDER};
use signal_diary::{
    init_logging, Config, EntryQuery, EntryStore, Export, LocationIndex, PatternAnalyzer,
    PatternSummary, ProfileStore, Region, ReportExporter, SqliteStore,
};

/// The opened diary: one database shared by both stores.
struct Diary {
    db: Rc<SqliteStore>,
    entries: EntryStore<Rc<SqliteStore>>,
    profiles: ProfileStore<Rc<SqliteStore>>,
}

impl std::fmt::Debug for Diary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diary")
            .field("db", &self.db.path())
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl Diary {
    fn open(config: &Config) -> Result<Self> {
        let path = config.database_path();
        let db = Rc::new(
            SqliteStore::open(&path)
                .with_context(|| format!("failed to open diary at {}", path.display()))?,
        );
        let entries = EntryStore::load(Rc::clone(&db))?;
        let profiles = ProfileStore::new(Rc::clone(&db));
        Ok(Self {
            db,
            entries,
            profiles,
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;
    debug!(database = %config.database_path().display(), "Configuration loaded");

    // Execute the command
    match cli.command {
        Command::Log(cmd) => handle_log(&mut Diary::open(&config)?, &cmd),
        Command::History(cmd) => handle_history(&Diary::open(&config)?, &cmd),
        Command::Delete(cmd) => handle_delete(&mut Diary::open(&config)?, &cmd.id),
        Command::Clear(cmd) => handle_clear(&mut Diary::open(&config)?, &cmd),
        Command::Locations(cmd) => handle_locations(&Diary::open(&config)?, &config, &cmd),
        Command::Patterns(cmd) => handle_patterns(&Diary::open(&config)?, &config, &cmd),
        Command::Export(cmd) => handle_export(&Diary::open(&config)?, &config, &cmd),
        Command::Profile(cmd) => handle_profile(&Diary::open(&config)?, cmd),
        Command::Providers(cmd) => {
            handle_providers(&cmd);
            Ok(())
        }
        Command::Status(cmd) => handle_status(&Diary::open(&config)?, &config, cmd.json),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn handle_log(diary: &mut Diary, cmd: &LogCommand) -> Result<()> {
    let entry = diary.entries.add(
        cmd.issue_type.into(),
        cmd.location.as_deref().unwrap_or_default(),
        cmd.notes.as_deref(),
    )?;
    println!(
        "Logged \"{}\" at {} ({})",
        entry.issue_type.label(),
        entry.location,
        entry.id
    );
    Ok(())
}

fn handle_history(diary: &Diary, cmd: &HistoryCommand) -> Result<()> {
    let query = EntryQuery {
        issue_type: cmd.issue_type.map(Into::into),
        location: cmd.location.clone(),
        from: cmd.since,
        to: cmd.until,
    };
    let mut results = diary.entries.query(&query);
    if let Some(limit) = cmd.limit {
        results.truncate(limit);
    }

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No entries found.");
        return Ok(());
    }
    for entry in &results {
        let when = entry.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M");
        println!(
            "{when}  {:<20} {:<24} {}",
            entry.issue_type.label(),
            entry.location,
            entry.id
        );
        if let Some(notes) = &entry.notes {
            println!("                  {notes}");
        }
    }
    Ok(())
}

fn handle_delete(diary: &mut Diary, id: &str) -> Result<()> {
    if diary.entries.delete(id)? {
        println!("Deleted entry {id}.");
    } else {
        println!("No entry with id {id}; nothing deleted.");
    }
    Ok(())
}

fn handle_clear(diary: &mut Diary, cmd: &ClearCommand) -> Result<()> {
    let request = diary.entries.request_clear();
    let scope = if cmd.all { " and your saved profile" } else { "" };

    if !cmd.yes {
        println!(
            "This will delete {} entries{scope}.",
            request.entry_count
        );
        println!("Use --yes to confirm.");
        return Ok(());
    }

    if !diary.entries.confirm_clear(&request)? {
        bail!("the diary changed while clearing; nothing was deleted, please retry");
    }
    if cmd.all {
        diary.profiles.clear()?;
    }
    println!("Deleted {} entries{scope}.", request.entry_count);
    Ok(())
}

fn handle_locations(diary: &Diary, config: &Config, cmd: &LocationsCommand) -> Result<()> {
    let index = LocationIndex::new(diary.entries.entries());
    let recent = index.recent_locations(cmd.recent.unwrap_or(config.locations.recent_limit));
    let common = index.common_locations(
        config.locations.common_threshold,
        cmd.common.unwrap_or(config.locations.common_limit),
    );

    if cmd.json {
        let value = serde_json::json!({ "recent": recent, "common": common });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Recent locations");
    if recent.is_empty() {
        println!("  (none)");
    }
    for location in &recent {
        println!("  {location}");
    }
    println!();
    println!(
        "Common locations (logged {}+ times)",
        config.locations.common_threshold
    );
    if common.is_empty() {
        println!("  (none)");
    }
    for item in &common {
        println!("  {:<24} {}", item.location, item.count);
    }
    Ok(())
}

fn handle_patterns(diary: &Diary, config: &Config, cmd: &PatternsCommand) -> Result<()> {
    let timeframe = cmd.timeframe.map_or(config.analysis.timeframe, Into::into);
    let analyzer = PatternAnalyzer::new(diary.entries.entries(), timeframe);
    let summary = analyzer.summary(config.analysis.top_locations);

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &PatternSummary) {
    let period = summary.timeframe.period();
    println!("Patterns {period}");
    println!("=================");
    if summary.total == 0 {
        println!("No issues logged {period}.");
        return;
    }

    println!("Total issues:  {}", summary.total);
    println!(
        "Connection:    {} ({})",
        summary.tier.label(),
        summary.tier.indicator()
    );

    println!();
    println!("By issue type");
    for stat in &summary.issue_types {
        println!(
            "  {:<22} {:>4} {:>4}%",
            stat.issue_type.label(),
            stat.count,
            stat.percentage
        );
    }

    println!();
    println!("Top locations");
    for stat in &summary.locations {
        let split: Vec<String> = stat
            .by_type
            .iter()
            .map(|(t, n)| format!("{} {n}", t.label()))
            .collect();
        println!(
            "  {:<22} {:>4} {:>4}%  ({})",
            stat.location,
            stat.count,
            stat.percentage,
            split.join(", ")
        );
    }

    println!();
    println!("By time of day");
    for stat in &summary.time_of_day {
        println!(
            "  {:<22} {:>4} {:>4}%",
            stat.bucket.label(),
            stat.count,
            stat.percentage
        );
    }

    if !summary.insights.is_empty() {
        println!();
        println!("Insights");
        for insight in &summary.insights {
            println!("  - {insight}");
        }
    }
}

fn handle_export(diary: &Diary, config: &Config, cmd: &ExportCommand) -> Result<()> {
    let timeframe = cmd.timeframe.map_or(config.report.timeframe, Into::into);
    let region = config.report.region.unwrap_or_default();
    let exporter = ReportExporter::new(timeframe, region);
    let profile = diary.profiles.get()?;

    match exporter.export(cmd.format.into(), diary.entries.entries(), &profile)? {
        Export::NothingToExport => {
            eprintln!("Nothing to export: the diary has no entries yet.");
        }
        Export::Ready(document) => match &cmd.output {
            Some(path) => {
                fs::write(path, document)
                    .with_context(|| format!("failed to write report to {}", path.display()))?;
                eprintln!("Report written to {}", path.display());
            }
            None => io::stdout().write_all(document.as_bytes())?,
        },
    }
    Ok(())
}

fn handle_profile(diary: &Diary, cmd: ProfileCommand) -> Result<()> {
    match cmd {
        ProfileCommand::Show { json } => {
            let profile = diary.profiles.get()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
                return Ok(());
            }
            let show = |value: &str| {
                if value.trim().is_empty() {
                    "(not set)".to_string()
                } else {
                    value.replace('\n', ", ")
                }
            };
            println!("Name:          {}", show(&profile.name));
            println!("Phone number:  {}", show(&profile.phone_number));
            println!("Address:       {}", show(&profile.address));
            match profile.resolve_provider() {
                Some(provider) => {
                    println!("Provider:      {}", provider.name);
                    if let Some(phone) = provider.support_phone {
                        println!("  Support:     {phone}");
                    }
                    if let Some(email) = provider.support_email {
                        println!("  Email:       {email}");
                    }
                }
                None => println!("Provider:      (not set)"),
            }
            let region = profile
                .region
                .map_or_else(|| "(default)".to_string(), |r| r.to_string());
            println!("Region:        {region}");
        }
        ProfileCommand::Set(fields) => {
            let mut profile = diary.profiles.get()?;
            apply_fields(&mut profile, fields)?;
            diary.profiles.save(&profile)?;
            println!("Profile saved.");
        }
        ProfileCommand::Clear => {
            diary.profiles.clear()?;
            println!("Profile cleared.");
        }
    }
    Ok(())
}

fn apply_fields(profile: &mut signal_diary::UserProfile, fields: ProfileFields) -> Result<()> {
    let trimmed = |s: String| s.trim().to_string();
    if let Some(name) = fields.name {
        profile.name = trimmed(name);
    }
    if let Some(address) = fields.address {
        profile.address = trimmed(address);
    }
    if let Some(phone) = fields.phone {
        profile.phone_number = trimmed(phone);
    }
    if let Some(region) = fields.region {
        profile.region = Some(region.into());
    }
    if let Some(custom) = fields.custom_provider {
        profile.custom_provider = trimmed(custom);
    }
    if let Some(provider) = fields.provider {
        let key = provider.trim().to_ascii_lowercase();
        if !key.is_empty()
            && key != OTHER_PROVIDER
            && providers::lookup(&key, profile.region).is_none()
        {
            bail!("unknown provider '{key}'; run `sigdiary providers` to list valid keys");
        }
        profile.network_provider = key;
    }
    Ok(())
}

fn handle_providers(cmd: &ProvidersCommand) {
    let region: Option<Region> = cmd.region.map(Into::into);
    println!("{:<18} {:<20} {:<16} EMAIL", "KEY", "NAME", "PHONE");
    for provider in providers::providers_for(region) {
        println!(
            "{:<18} {:<20} {:<16} {}",
            provider.key, provider.name, provider.support_phone, provider.support_email
        );
    }
    println!("{OTHER_PROVIDER:<18} (use --custom-provider to name it)");
}

fn handle_status(diary: &Diary, config: &Config, json: bool) -> Result<()> {
    let stats = diary.db.stats()?;
    let profile = diary.profiles.get()?;
    let analyzer = PatternAnalyzer::new(diary.entries.entries(), config.analysis.timeframe);

    if json {
        let status = serde_json::json!({
            "database_path": diary.db.path(),
            "entries": diary.entries.len(),
            "records": stats.record_count,
            "last_updated": stats.last_updated,
            "db_size_bytes": stats.db_size_bytes,
            "profile_saved": profile.has_contact_details(),
            "timeframe": analyzer.timeframe(),
            "window_total": analyzer.total(),
            "tier": analyzer.tier(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("sigdiary status");
        println!("---------------");
        println!("Database:      {}", diary.db.path().display());
        println!("Size:          {} bytes", stats.db_size_bytes);
        println!("Entries:       {}", diary.entries.len());
        if let Some(updated) = stats.last_updated {
            println!(
                "Last updated:  {}",
                updated.with_timezone(&Local).format("%Y-%m-%d %H:%M")
            );
        }
        println!(
            "Profile:       {}",
            if profile.has_contact_details() { "saved" } else { "not set" }
        );
        println!(
            "Connection:    {} ({} issues {})",
            analyzer.tier().label(),
            analyzer.total(),
            analyzer.timeframe().period()
        );
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", config.to_pretty_json()?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Locations]");
                println!("  Recent limit:       {}", config.locations.recent_limit);
                println!("  Common threshold:   {}", config.locations.common_threshold);
                println!("  Common limit:       {}", config.locations.common_limit);
                println!();
                println!("[Analysis]");
                println!("  Timeframe:          {}", config.analysis.timeframe);
                println!("  Top locations:      {}", config.analysis.top_locations);
                println!();
                println!("[Report]");
                println!("  Timeframe:          {}", config.report.timeframe);
                println!(
                    "  Region:             {}",
                    config.report.region.unwrap_or_default()
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
