use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "refbot",
    about = "Referral bot core: users, referrals and discounts",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Data file (overrides config and REFBOT_DATA_PATH)
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    /// Base invitation link (overrides config and BOT_LINK)
    #[arg(long, global = true)]
    pub link: Option<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Register a user the way the start command does
    Start(StartArgs),
    /// Show a user's profile with referral count and discounts
    Profile(UserArgs),
    /// Count the users a user has referred
    Referrals(UserArgs),
    /// Remove a user (their referrals keep pointing at them)
    Remove(UserArgs),
    /// List all registered users
    List,
    /// Show the discounts earned by a referral count
    Discounts(DiscountsArgs),
    /// Print the referral link for a platform id
    Link(LinkArgs),
}

#[derive(Args)]
pub struct StartArgs {
    pub user_id: String,
    pub platform_id: i64,
    /// Referrer id, as carried by a referral link
    #[arg(long = "ref")]
    pub referrer: Option<String>,
}

#[derive(Args)]
pub struct UserArgs {
    pub user_id: String,
}

#[derive(Args)]
pub struct DiscountsArgs {
    pub referral_count: usize,
}

#[derive(Args)]
pub struct LinkArgs {
    pub platform_id: u64,
}
