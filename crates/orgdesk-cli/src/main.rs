// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod credentials;
mod feed;
mod logging;
mod runtime;
#[cfg(test)]
mod test_env;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use credentials::FileCredentialStore;
use feed::{FeedDetector, NoDetector};
use orgdesk_api::Client;
use orgdesk_app::{AppState, FaceDetector, Route, SessionManager};
use runtime::ApiRuntime;
use std::env;
use std::io::{self, BufRead};
use std::path::PathBuf;
use tracing::info;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `orgdesk --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let log_file = config.log_file()?;
    logging::init(&log_file, config.log_level())?;

    let client = Client::new(&config.api_base_url(), config.api_timeout()?).with_context(|| {
        format!(
            "invalid [api] config in {}; fix base_url/timeout values or ORGDESK_API_URL",
            options.config_path.display()
        )
    })?;

    let session_path = FileCredentialStore::default_path()?;
    let mut sessions = SessionManager::new(FileCredentialStore::new(&session_path));
    sessions.restore()?;

    if options.logout {
        sessions.sign_out()?;
        println!("signed out; removed {}", session_path.display());
        return Ok(());
    }

    if let Some(username) = &options.login {
        let password = read_password()?;
        let response = client
            .login(username, &password)
            .with_context(|| format!("sign in to {} as {username}", client.base_url()))?;
        sessions.establish(response, username)?;
        println!("signed in as {username}");
        return Ok(());
    }

    let detector: Box<dyn FaceDetector> = match config.feed_path() {
        Some(path) => Box::new(FeedDetector::open(&path)?),
        None => Box::new(NoDetector),
    };
    if options.check_only {
        return Ok(());
    }

    let mut runtime = ApiRuntime::new(
        client,
        sessions,
        detector,
        config.visitor_threshold(),
        config.visitor_max_known(),
    );
    let mut state = AppState {
        route: if runtime.is_signed_in() {
            config.start_route()
        } else {
            Route::SignIn
        },
        ..AppState::default()
    };
    info!(base_url = %config.api_base_url(), route = %state.route.path(), "starting dashboard");
    orgdesk_tui::run_app(&mut state, &mut runtime, config.rows_per_page())
}

/// `ORGDESK_PASSWORD` for scripts, otherwise the first line of stdin.
fn read_password() -> Result<String> {
    if let Ok(password) = env::var("ORGDESK_PASSWORD")
        && !password.is_empty()
    {
        return Ok(password);
    }
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("read password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']).to_owned();
    if password.is_empty() {
        bail!("no password given; pipe it on stdin or set ORGDESK_PASSWORD");
    }
    Ok(password)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    login: Option<String>,
    logout: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        check_only: false,
        login: None,
        logout: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--login" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--login requires a username"))?;
                options.login = Some(value.as_ref().to_owned());
            }
            "--logout" => {
                options.logout = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    if options.login.is_some() && options.logout {
        bail!("--login and --logout cannot be used together");
    }

    Ok(options)
}

fn print_help() {
    println!("orgdesk");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --check                  Validate config, session and visitor feed");
    println!("  --login <username>       Sign in (password from ORGDESK_PASSWORD or stdin)");
    println!("  --logout                 Forget the stored session");
    println!("  --help                   Show this help");
}
