use crate::calendar::WeekMode;
use crate::config::{Config, StoreKind, default_report_dir, expand_home};
use anyhow::{Context, Result};
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};

pub fn run_onboarding() -> Result<Config> {
    println!("──────────────────────────────────────────");
    println!("  Welcome to attendance tracker onboarding.");
    println!("──────────────────────────────────────────");

    let theme = ColorfulTheme::default();

    println!("\n[1/5] Account");
    let user_id: String = Input::with_theme(&theme)
        .with_prompt("  User id (keys your stored attendance)")
        .validate_with(|input: &String| -> std::result::Result<(), &str> {
            if input.trim().is_empty() {
                Err("User id cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()
        .context("Failed to read user id")?;
    println!("  ✓ Signed in as {}", user_id.trim());

    println!("\n[2/5] Teaching week");
    let week_modes = ["Monday to Friday", "Monday to Sunday"];
    let week_index = Select::with_theme(&theme)
        .with_prompt("  Which days can classes be scheduled on?")
        .default(0)
        .items(&week_modes)
        .interact()
        .context("Failed to select week mode")?;
    let week_mode = if week_index == 1 {
        WeekMode::Seven
    } else {
        WeekMode::Five
    };
    println!("  ✓ {} day week", week_mode);

    println!("\n[3/5] Storage");
    let stores = ["Local SQLite database", "Remote document store (HTTP)"];
    let store_index = Select::with_theme(&theme)
        .with_prompt("  Where should attendance be stored?")
        .default(0)
        .items(&stores)
        .interact()
        .context("Failed to select store")?;

    let (store, remote_base_url) = if store_index == 1 {
        let base_url: String = Input::with_theme(&theme)
            .with_prompt("  Remote store base URL")
            .interact_text()
            .context("Failed to read remote store URL")?;
        (
            StoreKind::Http,
            Some(base_url.trim().trim_end_matches('/').to_string()),
        )
    } else {
        (StoreKind::Sqlite, None)
    };
    println!("  ✓ Using {store} store");

    println!("\n[4/5] Timetable");
    let seed_default_timetable = Confirm::with_theme(&theme)
        .with_prompt("  Start from the default timetable? (No starts empty)")
        .default(true)
        .interact()
        .context("Failed to read timetable choice")?;
    let extra_lectures = Confirm::with_theme(&theme)
        .with_prompt("  Track proxy and extra lectures?")
        .default(true)
        .interact()
        .context("Failed to read extra lecture choice")?;

    println!("\n[5/5] Report output directory");
    let default_report_dir = default_report_dir().display().to_string();
    let report_dir_input: String = Input::with_theme(&theme)
        .with_prompt("  Folder where reports will be saved")
        .default(default_report_dir)
        .interact_text()
        .context("Failed to read report directory")?;

    let report_dir = expand_home(&report_dir_input);
    println!("  ✓ {}", report_dir.display());

    let config = Config {
        user_id: Some(user_id.trim().to_string()),
        week_mode,
        store,
        remote_base_url,
        seed_default_timetable,
        extra_lectures,
        report_dir,
        ..Config::default()
    };

    config.ensure_bootstrap_files()?;
    config.save()?;
    if config.store == StoreKind::Sqlite {
        config.build_store()?;
    }

    println!("\n──────────────────────────────────────────");
    println!("  Onboarding complete!");
    println!("  Run `attendance day` to see today's classes.");
    println!("──────────────────────────────────────────");

    Ok(config)
}
