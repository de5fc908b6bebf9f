use std::process::ExitCode;

use colored::Colorize;
use refbot_sdk::{compute_discounts, BotConfig, FileService, SdkError, StartOutcome};
use tracing::error;

use crate::cli::*;

/// How a command finished, beyond hard failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Success,
    /// The input was rejected; the user was told how to correct it.
    Rejected,
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        match status {
            Status::Success => ExitCode::SUCCESS,
            Status::Rejected => ExitCode::from(2),
        }
    }
}

pub fn run_command(cli: Cli) -> anyhow::Result<Status> {
    let format = &cli.format;
    let result = match &cli.command {
        Command::Discounts(args) => return cmd_discounts(args, format),
        Command::Start(args) => cmd_start(&open_service(&cli)?, args, format),
        Command::Profile(args) => cmd_profile(&open_service(&cli)?, args, format),
        Command::Referrals(args) => cmd_referrals(&open_service(&cli)?, args, format),
        Command::Remove(args) => cmd_remove(&open_service(&cli)?, args),
        Command::List => cmd_list(&open_service(&cli)?, format),
        Command::Link(args) => {
            println!("{}", open_service(&cli)?.referral_link(args.platform_id).blue());
            Ok(())
        }
    };
    result.map(|()| Status::Success).or_else(report)
}

fn open_service(cli: &Cli) -> anyhow::Result<FileService> {
    let config = load_config(cli)?;
    Ok(FileService::from_config(&config)?)
}

/// Config file (if any), then environment, then command-line flags.
fn load_config(cli: &Cli) -> anyhow::Result<BotConfig> {
    let mut config = match &cli.config {
        Some(path) => BotConfig::from_file(path)?,
        None => BotConfig::default(),
    };
    config.apply_env();
    if let Some(data) = &cli.data {
        config.data_path = data.clone();
    }
    if let Some(link) = &cli.link {
        config.bot_link = Some(link.clone());
    }
    Ok(config)
}

/// Map a failed operation the way a chat handler would.
fn report(err: SdkError) -> anyhow::Result<Status> {
    if err.is_correctable() {
        eprintln!("{} {}", "✗".yellow().bold(), err);
        return Ok(Status::Rejected);
    }
    error!(error = %err, "operation failed");
    eprintln!("{} Something went wrong. Please try again later.", "✗".red().bold());
    Err(err.into())
}

fn cmd_start(service: &FileService, args: &StartArgs, format: &OutputFormat) -> Result<(), SdkError> {
    let outcome = service.start(&args.user_id, args.platform_id, args.referrer.as_deref())?;
    if let OutputFormat::Json = format {
        print_json(&outcome);
        return Ok(());
    }
    match &outcome {
        StartOutcome::AlreadyRegistered => println!("{} {}", "•".dimmed(), outcome),
        StartOutcome::Registered { referred_by, .. } => {
            println!("{} {}", "✓".green().bold(), outcome);
            if let Some(referrer) = referred_by {
                println!("  Invited by: {}", referrer.yellow());
            }
        }
    }
    Ok(())
}

fn cmd_profile(service: &FileService, args: &UserArgs, format: &OutputFormat) -> Result<(), SdkError> {
    let profile = service.profile(&args.user_id)?;
    match (profile, format) {
        (Some(profile), OutputFormat::Json) => print_json(&profile),
        (Some(profile), OutputFormat::Text) => println!("{profile}"),
        (None, _) => println!(
            "Profile {} not found. Use {} to register.",
            args.user_id.yellow(),
            "start".bold()
        ),
    }
    Ok(())
}

fn cmd_referrals(service: &FileService, args: &UserArgs, format: &OutputFormat) -> Result<(), SdkError> {
    let count = service.count_referrals(&args.user_id)?;
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "user_id": args.user_id, "referrals": count })),
        OutputFormat::Text => println!("{} referred {} user(s)", args.user_id.yellow(), count.to_string().bold()),
    }
    Ok(())
}

fn cmd_remove(service: &FileService, args: &UserArgs) -> Result<(), SdkError> {
    if service.remove(&args.user_id)? {
        println!("{} Removed {}", "✓".green(), args.user_id.yellow());
    } else {
        println!("No user {}.", args.user_id.yellow());
    }
    Ok(())
}

fn cmd_list(service: &FileService, format: &OutputFormat) -> Result<(), SdkError> {
    let users = service.users()?;
    if let OutputFormat::Json = format {
        print_json(&users);
        return Ok(());
    }
    if users.is_empty() {
        println!("No users registered.");
    }
    for (id, record) in &users {
        match &record.referred_by {
            Some(referrer) => println!("{}  {}  ← {}", id.yellow(), record.telegram_id, referrer.cyan()),
            None => println!("{}  {}", id.yellow(), record.telegram_id),
        }
    }
    Ok(())
}

fn cmd_discounts(args: &DiscountsArgs, format: &OutputFormat) -> anyhow::Result<Status> {
    let discounts = compute_discounts(args.referral_count);
    match format {
        OutputFormat::Json => print_json(&discounts),
        OutputFormat::Text => println!("{discounts}"),
    }
    Ok(Status::Success)
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => error!(error = %e, "failed to encode output"),
    }
}
