use std::io::{IsTerminal, Write};

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reviews_core::{ArcBinary, LinkConfig, OutputFormat, Palette};
use reviews_github::GitHubOptions;
use reviews_phabricator::PhabricatorOptions;

#[derive(Parser)]
#[command(
    name = "my-reviews",
    version,
    about = "List code reviews waiting on you in Phabricator and GitHub",
    long_about = "List code reviews waiting on you in Phabricator and GitHub.\n\n\
                   Examples:\n  \
                     my-reviews phabricator ~/src/gecko PHID-USER-xxxx   Phabricator revisions\n  \
                     my-reviews phabricator-user ~/src/gecko             Look up your PHID\n  \
                     my-reviews github mozilla pdf.js octocat            GitHub pull requests"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text  Colored report (default)\n  \
                         json  The partitioned results as JSON with camelCase keys"
    )]
    format: OutputFormat,

    /// Enable debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,

    /// Base URL for revision links
    #[arg(long, global = true, value_name = "URL")]
    phabricator_url: Option<String>,

    /// Base URL for bug links
    #[arg(long, global = true, value_name = "URL")]
    bugzilla_url: Option<String>,

    /// GitHub Enterprise API root (default: https://api.github.com)
    #[arg(long, global = true, value_name = "URL")]
    github_api_url: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Show your revisions and the ones waiting on your review
    #[command(long_about = "Show your revisions and the ones waiting on your review.\n\n\
        Runs `arc call-conduit` inside GECKO_DIR, so arcanist must be configured there.\n\
        Set MY_REVIEWS_ARC_PATH to use a specific `arc` binary.\n\n\
        Example:\n  my-reviews phabricator ~/src/gecko PHID-USER-xxxx")]
    Phabricator {
        /// Checkout where arcanist is configured
        gecko_dir: Option<String>,
        /// Your Phabricator PHID (see `phabricator-user`)
        user_phid: Option<String>,
    },
    /// Print the Phabricator username and PHID arcanist is logged in as
    PhabricatorUser {
        /// Checkout where arcanist is configured
        gecko_dir: Option<String>,
    },
    /// Show pull requests waiting on your review and your own open pull requests
    #[command(long_about = "Show pull requests waiting on your review and your own open pull requests.\n\n\
        Uses GITHUB_TOKEN or GH_TOKEN when set, anonymous access otherwise.\n\
        Titles marked [wip] or [deploy-preview] are skipped.\n\n\
        Example:\n  my-reviews github mozilla pdf.js octocat")]
    Github {
        /// Repository owner or organization
        org: Option<String>,
        /// Repository name
        repo: Option<String>,
        /// Your GitHub login
        username: Option<String>,
    },
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Parse arguments; anything but `--help`/`--version` that clap rejects exits 1 with usage.
fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    let mut cmd = Cli::command();
    let _ = cmd.print_help();
    println!();
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "warn,my_reviews=debug,reviews_core=debug,reviews_phabricator=debug,reviews_github=debug"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Text reports stream to stdout; JSON mode swallows them and prints the result instead.
fn report_sink(format: OutputFormat) -> Box<dyn Write> {
    match format {
        OutputFormat::Text => Box::new(std::io::stdout()),
        OutputFormat::Json => Box::new(std::io::sink()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = parse_cli();
    init_tracing(cli.verbose);

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };
    let palette = Palette::new(use_color && cli.format == OutputFormat::Text);
    let links = LinkConfig::new(cli.phabricator_url.as_deref(), cli.bugzilla_url.as_deref());

    let Some(command) = cli.command else {
        print_usage();
        std::process::exit(1);
    };

    match command {
        Command::Phabricator {
            gecko_dir,
            user_phid,
        } => {
            let options = PhabricatorOptions {
                arc: ArcBinary::from_env(),
                palette,
                links,
            };
            tracing::debug!(arc = %options.arc.display_name(), "resolved arc binary");
            let mut out = report_sink(cli.format);
            let report = reviews_phabricator::run_reviews(
                gecko_dir.as_deref().unwrap_or_default(),
                user_phid.as_deref().unwrap_or_default(),
                &options,
                &mut *out,
            )
            .await?;
            out.flush().into_diagnostic()?;
            if cli.format == OutputFormat::Json {
                print_json(&report)?;
            }
        }
        Command::PhabricatorUser { gecko_dir } => {
            let options = PhabricatorOptions {
                arc: ArcBinary::from_env(),
                palette,
                links,
            };
            let user = reviews_phabricator::current_user(
                gecko_dir.as_deref().unwrap_or_default(),
                &options,
            )
            .await?;
            match cli.format {
                OutputFormat::Json => print_json(&user)?,
                OutputFormat::Text => {
                    println!("Phabricator username: {}", user.user_name);
                    println!("Phabricator PHID: {}", user.phid);
                }
            }
        }
        Command::Github {
            org,
            repo,
            username,
        } => {
            let options = GitHubOptions {
                token: reviews_core::config::github_token_from_env(),
                api_url: cli.github_api_url.clone(),
                palette,
            };
            let mut out = report_sink(cli.format);
            let report = reviews_github::run_reviews(
                org.as_deref().unwrap_or_default(),
                repo.as_deref().unwrap_or_default(),
                username.as_deref().unwrap_or_default(),
                &options,
                &mut *out,
            )
            .await?;
            out.flush().into_diagnostic()?;
            if cli.format == OutputFormat::Json {
                print_json(&report)?;
            }
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "my-reviews", &mut std::io::stdout());
        }
    }

    Ok(())
}
