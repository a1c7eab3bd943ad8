use anyhow::{Context, Result, bail};
use attendance_tracker::analyzer::report::{build_report, save_report_files};
use attendance_tracker::api;
use attendance_tracker::calendar::{Weekday, format_date, parse_date, shift_date, today};
use attendance_tracker::cli::onboard::run_onboarding;
use attendance_tracker::cli::{
    Cli, Commands, ConfigCommands, ExtraCommands, ProxyCommands, SubjectCommands,
};
use attendance_tracker::config::Config;
use attendance_tracker::identity::{IdentityProvider, StaticIdentity};
use attendance_tracker::ledger::Status;
use attendance_tracker::session::Session;
use attendance_tracker::store::RemoteStore;
use attendance_tracker::timetable::{Timetable, default_timetable};
use chrono::NaiveDate;
use clap::Parser;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

type AppSession = Session<Box<dyn RemoteStore>>;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Onboard => {
            let _ = run_onboarding()?;
            Ok(())
        }
        Commands::Config { command } => handle_config_command(command),
        Commands::Status => handle_status(),
        Commands::Doctor => handle_doctor(),
        Commands::Timetable => handle_timetable(),
        Commands::Subject { command } => handle_subject_command(command),
        Commands::Day { date, offset } => handle_day(date, offset),
        Commands::Mark {
            subject,
            status,
            date,
        } => handle_mark(&subject, &status, date),
        Commands::Proxy { command } => handle_proxy_command(command),
        Commands::Extra { command } => handle_extra_command(command),
        Commands::Stats => handle_stats(),
        Commands::Report { date } => handle_report(date),
        Commands::Serve => {
            let config = load_config()?;
            run_server(config).await
        }
    }
}

fn handle_config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Set { key, value } => {
            let mut config = load_or_default_config()?;
            config.set_value(&key, &value)?;
            config.ensure_bootstrap_files()?;
            config.save()?;

            let masked = if key.contains("api_key") {
                "***hidden***".to_string()
            } else {
                value
            };
            println!("Config saved: {key} = {masked}");
            Ok(())
        }
        ConfigCommands::Get { key } => {
            let config = load_config()?;
            let value = config
                .get_value(&key)
                .with_context(|| format!("Unsupported config key: {key}"))?;

            println!("{value}");
            Ok(())
        }
    }
}

fn handle_status() -> Result<()> {
    let config = load_config()?;
    let session = open_session(&config)?;

    println!("Attendance tracker status");
    println!("- user: {}", session.user().uid);
    println!("- store: {}", config.store);
    println!("- week_mode: {}", config.week_mode);
    println!("- extra_lectures: {}", config.extra_lectures);
    println!("- subjects: {}", session.timetable().all_subjects().len());
    println!("- recorded_dates: {}", session.ledger().len());
    println!(
        "- last_recorded_date: {}",
        session
            .ledger()
            .records()
            .last()
            .map(|(date, _)| format_date(date))
            .unwrap_or_else(|| "none".to_string())
    );

    Ok(())
}

fn handle_doctor() -> Result<()> {
    let config_path = Config::config_path()?;
    let mut issues = Vec::new();

    if config_path.exists() {
        println!("[OK] config.json found: {}", config_path.display());
    } else {
        println!("[WARN] config.json not found: {}", config_path.display());
        issues.push("config missing".to_string());
    }

    let config = load_or_default_config()?;

    let identity = StaticIdentity::resolve(config.user_id.as_deref());
    match identity.current_user() {
        Some(user) => println!("[OK] signed in as: {}", user.uid),
        None => {
            println!("[WARN] no user id configured");
            issues.push("signed out".to_string());
        }
    }

    match config.build_store() {
        Ok(store) => match identity.current_user().map(|user| store.read(&user)) {
            Some(Err(error)) => {
                println!("[WARN] {} store read failed: {error}", config.store);
                issues.push("store unreachable".to_string());
            }
            _ => println!("[OK] {} store reachable", config.store),
        },
        Err(error) => {
            println!("[WARN] {} store check failed: {error}", config.store);
            issues.push("store unavailable".to_string());
        }
    }

    if config.report_dir.exists() {
        println!("[OK] report dir exists: {}", config.report_dir.display());
    } else {
        println!("[WARN] report dir missing: {}", config.report_dir.display());
        issues.push("report dir missing".to_string());
    }

    if issues.is_empty() {
        println!("Doctor result: healthy");
    } else {
        println!("Doctor result: {} issue(s): {}", issues.len(), issues.join(", "));
    }

    Ok(())
}

fn handle_timetable() -> Result<()> {
    let config = load_config()?;
    let session = open_session(&config)?;

    for day in config.week_mode.days() {
        let slots = session.timetable().subjects_for(*day);
        if slots.is_empty() {
            println!("{day}: no classes");
            continue;
        }

        let line = slots
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" | ");
        println!("{day}: {line}");
    }

    Ok(())
}

fn handle_subject_command(command: SubjectCommands) -> Result<()> {
    let config = load_config()?;
    let mut session = open_session(&config)?;

    match command {
        SubjectCommands::Add { name, days } => {
            let days = days
                .iter()
                .map(|day| day.parse::<Weekday>())
                .collect::<Result<BTreeSet<_>, _>>()?;
            session.add_subject(&name, &days)?;

            let listed = days.iter().map(|day| day.name()).collect::<Vec<_>>().join(", ");
            println!("Subject added: {name} ({listed})");
        }
        SubjectCommands::Remove { name } => {
            let removed = session.remove_subject(&name)?;
            println!("Subject removed: {name} ({removed} mark(s) deleted)");
        }
    }

    warn_if_unsaved(&session);
    Ok(())
}

fn handle_day(date: Option<String>, offset: i64) -> Result<()> {
    let config = load_config()?;
    let session = open_session(&config)?;
    let date = shift_date(parse_optional_date(date)?, offset);
    let view = session.day_view(date);

    match view.weekday {
        Some(weekday) => println!("{} ({weekday})", format_date(date)),
        None => println!("{} (no classes in {} day mode)", format_date(date), config.week_mode),
    }

    for slot in &view.slots {
        let subject = slot.subject.as_deref().unwrap_or("-");
        let status = slot
            .status
            .map(|status| status.to_string())
            .unwrap_or_else(|| "unmarked".to_string());
        println!("  {}. {subject}: {status}", slot.period);
    }

    if !view.other_marks.is_empty() {
        println!("Unscheduled marks");
        for mark in &view.other_marks {
            println!("  {}: {}", mark.subject, mark.status);
        }
    }

    if !view.proxies.is_empty() {
        println!("Proxy lectures");
        for (index, proxy) in view.proxies.iter().enumerate() {
            println!(
                "  [{index}] {} -> {}: {}",
                proxy.scheduled_subject, proxy.replacement_subject, proxy.status
            );
        }
    }

    if !view.extras.is_empty() {
        println!("Extra lectures");
        for (index, extra) in view.extras.iter().enumerate() {
            let teacher = extra
                .teacher
                .as_deref()
                .map(|teacher| format!(" ({teacher})"))
                .unwrap_or_default();
            println!("  [{index}] {}{teacher}: {}", extra.subject, extra.status);
        }
    }

    Ok(())
}

fn handle_mark(subject: &str, status: &str, date: Option<String>) -> Result<()> {
    let config = load_config()?;
    let mut session = open_session(&config)?;
    let date = parse_optional_date(date)?;
    let status = parse_status(status)?;

    session.mark(date, subject, status)?;
    println!("Marked {subject} {status} on {}", format_date(date));

    warn_if_unsaved(&session);
    Ok(())
}

fn handle_proxy_command(command: ProxyCommands) -> Result<()> {
    let config = load_config()?;
    let mut session = open_session(&config)?;

    match command {
        ProxyCommands::Add {
            scheduled,
            replacement,
            date,
        } => {
            let date = parse_optional_date(date)?;
            if !session.add_proxy(date, &scheduled, &replacement)? {
                bail!("Replacement subject cannot be empty");
            }
            println!(
                "Proxy recorded on {}: {scheduled} -> {replacement}",
                format_date(date)
            );
        }
        ProxyCommands::Status {
            index,
            status,
            date,
        } => {
            let date = parse_optional_date(date)?;
            let status = parse_status(&status)?;
            session.set_proxy_status(date, index, status)?;
            println!("Proxy #{index} on {} set to {status}", format_date(date));
        }
    }

    warn_if_unsaved(&session);
    Ok(())
}

fn handle_extra_command(command: ExtraCommands) -> Result<()> {
    let config = load_config()?;
    let mut session = open_session(&config)?;

    match command {
        ExtraCommands::Add {
            subject,
            teacher,
            date,
        } => {
            let date = parse_optional_date(date)?;
            if !session.add_extra(date, &subject, teacher.as_deref())? {
                bail!("Extra lecture subject cannot be empty");
            }
            println!("Extra lecture recorded on {}: {subject}", format_date(date));
        }
        ExtraCommands::Status {
            index,
            status,
            date,
        } => {
            let date = parse_optional_date(date)?;
            let status = parse_status(&status)?;
            session.set_extra_status(date, index, status)?;
            println!("Extra #{index} on {} set to {status}", format_date(date));
        }
    }

    warn_if_unsaved(&session);
    Ok(())
}

fn handle_stats() -> Result<()> {
    let config = load_config()?;
    let session = open_session(&config)?;
    let report = build_report(today(), &session.user().uid, &session.stats());

    for row in &report.subjects {
        println!(
            "{:<12} {:>3} / {:<3} {:>3}%  {}",
            row.subject, row.present, row.total, row.percent, row.standing
        );
    }
    println!(
        "Overall: {} / {} ({}%)",
        report.present, report.total, report.percent
    );

    Ok(())
}

fn handle_report(date: Option<String>) -> Result<()> {
    let config = load_config()?;
    let session = open_session(&config)?;
    let date = parse_optional_date(date)?;

    let report = build_report(date, &session.user().uid, &session.stats());
    let saved = save_report_files(&report, &config.report_dir)?;

    println!("Report generated: {}", report.date);
    println!("- Markdown: {}", saved.markdown_path.display());
    println!("- JSON: {}", saved.json_path.display());

    Ok(())
}

async fn run_server(config: Config) -> Result<()> {
    config.ensure_bootstrap_files()?;
    let session = open_session(&config)?;

    info!(user = %session.user().uid, store = %config.store, "attendance service started");

    tokio::select! {
        api_result = api::run_server(Arc::new(config), session) => {
            api_result?;
        }
        _ = signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    Ok(())
}

fn open_session(config: &Config) -> Result<AppSession> {
    let identity = StaticIdentity::resolve(config.user_id.as_deref());
    let user = identity.current_user().context(
        "Not signed in. Run `attendance onboard` or set ATTENDANCE_USER_ID first.",
    )?;

    let default = if config.seed_default_timetable {
        default_timetable()
    } else {
        Timetable::new()
    };

    Session::open(
        user,
        config.build_store()?,
        config.session_settings(),
        default,
    )
}

fn warn_if_unsaved(session: &AppSession) {
    if session.is_dirty() {
        warn!("change applied but could not be saved to the store");
    }
}

fn parse_optional_date(input: Option<String>) -> Result<NaiveDate> {
    match input.as_deref() {
        Some(raw) => Ok(parse_date(raw)?),
        None => Ok(today()),
    }
}

fn parse_status(raw: &str) -> Result<Status> {
    raw.parse::<Status>().map_err(anyhow::Error::msg)
}

fn load_or_default_config() -> Result<Config> {
    Config::load().or_else(|_| {
        let config = Config::default();
        config.ensure_bootstrap_files()?;
        config.save()?;
        Ok(config)
    })
}

fn load_config() -> Result<Config> {
    Config::load()
        .with_context(|| "Config file not found. Run `attendance onboard` first.".to_string())
}
