use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use fishon_core::config::{ConfigError, API_ORIGIN_ENV, DEFAULT_API_ORIGIN, HOME_ENV};
use fishon_core::ClientConfig;

#[derive(Parser, Debug)]
#[command(name = "fishon")]
#[command(about = "FishOn - share your catches from the command line")]
#[command(version)]
pub struct Cli {
    /// Server origin; `/api` is appended
    #[arg(long, global = true, value_name = "URL", env = API_ORIGIN_ENV)]
    pub api_origin: Option<String>,

    /// Directory holding the stored credential
    #[arg(long, global = true, value_name = "DIR", env = HOME_ENV)]
    pub storage_dir: Option<PathBuf>,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Flags over environment over defaults.
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        let config = match &self.storage_dir {
            Some(dir) => ClientConfig::new(DEFAULT_API_ORIGIN, dir),
            None => ClientConfig::from_env()?,
        };
        Ok(match &self.api_origin {
            Some(origin) => config.with_api_origin(origin),
            None => config,
        })
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and remember the session
    Login {
        /// Email address or user name
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Create an account, then log in with it
    Register(RegisterArgs),

    /// Forget the stored session
    Logout,

    /// Show who is logged in
    Whoami,

    /// View or edit profiles
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Show the latest catches from everyone
    Feed,

    /// Manage catch posts
    #[command(subcommand)]
    Posts(PostsCommand),

    /// Manage comments on posts
    #[command(subcommand)]
    Comments(CommentsCommand),
}

impl Commands {
    /// Commands the server only answers for a logged-in caller.
    pub fn needs_session(&self) -> bool {
        matches!(
            self,
            Commands::Profile(_) | Commands::Feed | Commands::Posts(_) | Commands::Comments(_)
        )
    }
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    #[arg(long)]
    pub user_name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub password: String,
    #[arg(long, default_value = "")]
    pub first_name: String,
    #[arg(long, default_value = "")]
    pub last_name: String,
    /// Leading number is used, e.g. "42" or "42 years"
    #[arg(long, default_value = "")]
    pub age: String,
    /// Picture URL
    #[arg(long, default_value = "")]
    pub profile_picture: String,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// Show a user's public profile
    Show { user_name: String },
    /// Update your own profile
    Update(ProfileArgs),
}

/// Profile fields to change. Omitted flags are left untouched.
#[derive(Args, Debug, Default)]
pub struct ProfileArgs {
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub age: Option<i64>,
    #[arg(long)]
    pub profile_picture: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum PostsCommand {
    /// List a user's posts
    List { user_name: String },
    /// Publish a new catch
    Create(PostArgs),
    /// Edit one of your posts
    Update {
        id: String,
        #[command(flatten)]
        post: PostArgs,
    },
    /// Delete one of your posts
    Delete { id: String },
}

/// Catch details. Omitted flags are not sent.
#[derive(Args, Debug, Default)]
pub struct PostArgs {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub fish_name: Option<String>,
    /// Weight in kilograms
    #[arg(long)]
    pub weight: Option<f64>,
    /// Length in centimetres
    #[arg(long)]
    pub length: Option<f64>,
    #[arg(long)]
    pub location: Option<String>,
    /// When the fish was caught, e.g. 2024-05-01T10:00
    #[arg(long)]
    pub catch_date: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum CommentsCommand {
    /// Comment on a post
    Add { post_id: String, content: String },
    /// Change one of your comments
    Edit { id: String, content: String },
    /// Delete one of your comments
    Delete { id: String },
}
