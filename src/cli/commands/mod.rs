//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod comments;
mod companies;
mod connections;
mod login;
mod staff;
mod users;

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use staffscout::export::OutputFormat;
use staffscout::scraper::StaffAction;

use super::helpers::Context;

#[derive(Parser)]
#[command(name = "staffscout")]
#[command(about = "Collect company staff and profile data from an authenticated LinkedIn session")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Session file path (overrides config and STAFFSCOUT_SESSION_FILE)
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    /// Increase logging verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Count `-v` flags before clap runs so logging is ready for parse errors.
pub fn verbosity() -> u8 {
    count_verbosity(std::env::args_os().skip(1))
}

/// Arguments that are not valid UTF-8 (paths, mostly) never carry `-v`.
fn count_verbosity(args: impl IntoIterator<Item = OsString>) -> u8 {
    args.into_iter()
        .filter_map(|arg| arg.into_string().ok())
        .map(|arg| match arg.as_str() {
            "--verbose" => 1,
            a if a.starts_with('-') && !a.starts_with("--") && a[1..].chars().all(|c| c == 'v') => {
                u8::try_from(a.len() - 1).unwrap_or(u8::MAX)
            }
            _ => 0,
        })
        .fold(0u8, u8::saturating_add)
}

/// Where and how rows are written.
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format: csv or json (defaults to the output file's extension)
    #[arg(short, long)]
    format: Option<OutputFormat>,
}

impl OutputArgs {
    pub fn output(&self) -> Option<&std::path::Path> {
        self.output.as_deref()
    }

    pub fn format(&self) -> Option<OutputFormat> {
        self.format
    }
}

/// Post-enrichment action flags.
#[derive(Args, Debug, Clone, Default)]
pub struct ActionArgs {
    /// Block every enriched identity
    #[arg(long, conflicts_with = "connect")]
    block: bool,

    /// Send a connection request to every enriched identity
    #[arg(long)]
    connect: bool,
}

impl ActionArgs {
    fn action(&self) -> Option<StaffAction> {
        if self.block {
            Some(StaffAction::Block)
        } else if self.connect {
            Some(StaffAction::Connect)
        } else {
            None
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate and save the session
    Login {
        /// Discard any saved session and log in again
        #[arg(long)]
        fresh: bool,
    },

    /// Search a company's staff
    Staff {
        /// Company name or universal name
        company: String,

        /// Keyword facet (repeatable; each runs as its own query)
        #[arg(short, long = "term")]
        terms: Vec<String>,

        /// Location facet (repeatable; each runs as its own query)
        #[arg(short, long = "location")]
        locations: Vec<String>,

        /// Maximum results per facet
        #[arg(short, long)]
        max: Option<usize>,

        /// Fetch experiences, schools, skills and the rest for each identity
        #[arg(short, long)]
        enrich: bool,

        #[command(flatten)]
        action: ActionArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Enrich explicit profiles by public handle
    Users {
        /// Public profile handles (the part after /in/)
        #[arg(required = true)]
        public_ids: Vec<String>,

        #[command(flatten)]
        action: ActionArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Look up companies
    Companies {
        /// Company names or universal names
        #[arg(required = true)]
        names: Vec<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Collect comments from posts
    Comments {
        /// Post ids
        #[arg(required = true)]
        post_ids: Vec<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List the logged-in account's connections
    Connections {
        /// Maximum connections to collect
        #[arg(short, long)]
        max: Option<usize>,

        /// Fetch profile details for each connection
        #[arg(short, long)]
        enrich: bool,

        #[command(flatten)]
        output: OutputArgs,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let ctx = Context::load(cli.config.as_deref(), cli.session_file).await?;

    match cli.command {
        Commands::Login { fresh } => login::cmd_login(&ctx, fresh).await,
        Commands::Staff {
            company,
            terms,
            locations,
            max,
            enrich,
            action,
            output,
        } => {
            let action = action.action();
            if action.is_some() && !enrich {
                anyhow::bail!("--block and --connect require --enrich");
            }
            staff::cmd_staff(
                &ctx,
                staff::StaffArgs {
                    company,
                    terms,
                    locations,
                    max,
                    enrich,
                    action,
                },
                &output,
            )
            .await
        }
        Commands::Users {
            public_ids,
            action,
            output,
        } => users::cmd_users(&ctx, &public_ids, action.action(), &output).await,
        Commands::Companies { names, output } => {
            companies::cmd_companies(&ctx, &names, &output).await
        }
        Commands::Comments { post_ids, output } => {
            comments::cmd_comments(&ctx, &post_ids, &output).await
        }
        Commands::Connections {
            max,
            enrich,
            output,
        } => connections::cmd_connections(&ctx, max, enrich, &output).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staff_args() {
        let cli = Cli::try_parse_from([
            "staffscout", "-vv", "staff", "acme", "--term", "engineer", "--term", "sales",
            "--location", "Berlin", "--enrich", "--block", "-o", "out.json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Staff {
                company,
                terms,
                locations,
                enrich,
                action,
                output,
                ..
            } => {
                assert_eq!(company, "acme");
                assert_eq!(terms, vec!["engineer", "sales"]);
                assert_eq!(locations, vec!["Berlin"]);
                assert!(enrich);
                assert_eq!(action.action(), Some(StaffAction::Block));
                assert_eq!(output.output, Some(PathBuf::from("out.json")));
            }
            _ => panic!("expected staff command"),
        }
    }

    #[test]
    fn test_block_conflicts_with_connect() {
        let parsed = Cli::try_parse_from(["staffscout", "users", "ada", "--block", "--connect"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_format_flag() {
        let cli = Cli::try_parse_from(["staffscout", "companies", "acme", "--format", "json"]).unwrap();
        match cli.command {
            Commands::Companies { output, .. } => assert_eq!(output.format, Some(OutputFormat::Json)),
            _ => panic!("expected companies command"),
        }
    }

    #[test]
    fn test_count_verbosity() {
        let args = |items: &[&str]| items.iter().map(OsString::from).collect::<Vec<_>>();
        assert_eq!(count_verbosity(args(&["staff", "acme"])), 0);
        assert_eq!(count_verbosity(args(&["-v", "staff"])), 1);
        assert_eq!(count_verbosity(args(&["-vv", "--verbose", "login"])), 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_count_verbosity_skips_non_utf8() {
        use std::os::unix::ffi::OsStringExt;

        let path = OsString::from_vec(vec![b'o', b'u', b't', 0xff, b'.', b'c', b's', b'v']);
        let args = vec![OsString::from("-vv"), OsString::from("-o"), path];
        assert_eq!(count_verbosity(args), 2);
    }

    #[test]
    fn test_users_requires_ids() {
        assert!(Cli::try_parse_from(["staffscout", "users"]).is_err());
    }
}
