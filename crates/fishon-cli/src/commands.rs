//! Command dispatch: each subcommand maps onto one session or gateway call and
//! yields the JSON value to print.

use chrono::SecondsFormat;
use fishon_core::models::parse_timestamp;
use fishon_core::{FishOnContext, LoginCredentials, RegistrationForm};
use serde::Serialize;
use serde_json::Value;

use crate::cli::{
    Commands, CommentsCommand, PostArgs, PostsCommand, ProfileArgs, ProfileCommand, RegisterArgs,
};
use crate::error::{CliError, Result};

pub async fn dispatch(ctx: &FishOnContext, command: Commands) -> Result<Value> {
    let session = ctx.session();
    let api = ctx.api();

    if command.needs_session() && session.state().is_anonymous() {
        log::warn!("Not logged in; the server will likely reject this request");
    }

    match command {
        Commands::Login { email, password } => {
            let user = session
                .login(&LoginCredentials::new(email, password))
                .await?;
            Ok(serde_json::to_value(user)?)
        }
        Commands::Register(args) => Ok(session.register(&registration_form(args)).await?),
        Commands::Logout => {
            session.logout()?;
            Ok(serde_json::to_value(session.state())?)
        }
        Commands::Whoami => Ok(serde_json::to_value(session.state())?),
        Commands::Profile(ProfileCommand::Show { user_name }) => {
            Ok(api.user_profile(&user_name).await?)
        }
        Commands::Profile(ProfileCommand::Update(args)) => {
            let user = session.update_profile(&profile_changes(&args)?).await?;
            Ok(serde_json::to_value(user)?)
        }
        Commands::Feed => Ok(api.feed().await?),
        Commands::Posts(PostsCommand::List { user_name }) => Ok(api.user_posts(&user_name).await?),
        Commands::Posts(PostsCommand::Create(args)) => {
            for (flag, value) in [
                ("--title", &args.title),
                ("--description", &args.description),
                ("--fish-name", &args.fish_name),
            ] {
                if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
                    return Err(CliError::InvalidInput(format!("{flag} is required")));
                }
            }
            Ok(api.create_post(&post_payload(&args)?).await?)
        }
        Commands::Posts(PostsCommand::Update { id, post }) => {
            Ok(api.update_post(&id, &post_payload(&post)?).await?)
        }
        Commands::Posts(PostsCommand::Delete { id }) => Ok(api.delete_post(&id).await?),
        Commands::Comments(CommentsCommand::Add { post_id, content }) => {
            Ok(api.create_comment(&post_id, &content).await?)
        }
        Commands::Comments(CommentsCommand::Edit { id, content }) => {
            Ok(api.update_comment(&id, &content).await?)
        }
        Commands::Comments(CommentsCommand::Delete { id }) => Ok(api.delete_comment(&id).await?),
    }
}

fn registration_form(args: RegisterArgs) -> RegistrationForm {
    RegistrationForm {
        user_name: args.user_name,
        email: args.email,
        first_name: args.first_name,
        last_name: args.last_name,
        age: args.age,
        password: args.password,
        profile_picture: args.profile_picture,
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileChanges<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    first_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    age: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile_picture: Option<&'a str>,
}

fn profile_changes(args: &ProfileArgs) -> Result<Value> {
    let changes = serde_json::to_value(ProfileChanges {
        first_name: args.first_name.as_deref(),
        last_name: args.last_name.as_deref(),
        email: args.email.as_deref(),
        age: args.age,
        profile_picture: args.profile_picture.as_deref(),
    })?;
    if changes.as_object().map_or(true, |fields| fields.is_empty()) {
        return Err(CliError::InvalidInput(
            "nothing to update; pass at least one field".to_string(),
        ));
    }
    Ok(changes)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PostPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fish_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    catch_date: Option<String>,
}

/// Catch dates go out as UTC ISO timestamps with milliseconds.
fn post_payload(args: &PostArgs) -> Result<Value> {
    let catch_date = match args.catch_date.as_deref() {
        None => None,
        Some(raw) => {
            let parsed = parse_timestamp(raw).ok_or_else(|| {
                CliError::InvalidInput(format!(
                    "--catch-date '{raw}' is not a date, expected e.g. 2024-05-01T10:00"
                ))
            })?;
            Some(parsed.to_rfc3339_opts(SecondsFormat::Millis, true))
        }
    };

    Ok(serde_json::to_value(PostPayload {
        title: args.title.as_deref(),
        description: args.description.as_deref(),
        fish_name: args.fish_name.as_deref(),
        weight: args.weight,
        length: args.length,
        location: args.location.as_deref(),
        catch_date,
    })?)
}
