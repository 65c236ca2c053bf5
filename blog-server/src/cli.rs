use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::application::auth_service::AuthService;
use crate::application::group_service::GroupService;
use crate::data::Repositories;
use crate::domain::group::NewGroup;
use crate::infrastructure::security::JwtKeys;

#[derive(Parser, Debug)]
#[command(name = "social-blog-server", about = "Social blog HTTP server and admin tool")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server (default).
    Serve,
    #[command(subcommand)]
    Group(GroupCommand),
    #[command(subcommand)]
    User(UserCommand),
}

#[derive(Subcommand, Debug)]
pub enum GroupCommand {
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        slug: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    Delete {
        slug: String,
    },
    List,
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Removes the user with their posts, comments and follow edges.
    Delete { username: String },
}

pub async fn run_group(repos: Repositories, command: GroupCommand) -> anyhow::Result<()> {
    let groups = GroupService::new(Arc::clone(&repos.groups));
    match command {
        GroupCommand::Create {
            title,
            slug,
            description,
        } => {
            let group = groups
                .create(NewGroup {
                    title,
                    slug,
                    description,
                })
                .await?;
            info!(group_id = group.id, slug = %group.slug, "group created");
            println!("{}", serde_json::to_string_pretty(&group)?);
        }
        GroupCommand::Delete { slug } => {
            groups.delete(&slug).await?;
            info!(slug = %slug, "group deleted");
        }
        GroupCommand::List => {
            for group in groups.list().await? {
                println!("{}\t{}\t{}", group.id, group.slug, group.title);
            }
        }
    }
    Ok(())
}

pub async fn run_user(
    repos: Repositories,
    keys: JwtKeys,
    command: UserCommand,
) -> anyhow::Result<()> {
    let auth = AuthService::new(Arc::clone(&repos.users), keys);
    match command {
        UserCommand::Delete { username } => {
            auth.delete_user(&username).await?;
            info!(username = %username, "user deleted");
        }
    }
    Ok(())
}
