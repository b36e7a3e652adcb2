//! `vaultcore` - terminal front end for the VaultCore banking backend

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::{Arg, ArgMatches, Command};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vaultcore_dashboard::{
    BankClient, Config, Dashboard, DashboardError, ExpiryPolicy, FileSessionStore, LoginFlow,
    PriceSimulator, Result, Route, SessionContext, SignupWizard, Ticker, TransferStep, view,
};

fn cli() -> Command {
    Command::new("vaultcore")
        .version(env!("CARGO_PKG_VERSION"))
        .about("VaultCore banking dashboard")
        .subcommand_required(true)
        .subcommand(
            Command::new("login")
                .about("Sign in and store the session")
                .arg(Arg::new("email").short('e').long("email").value_name("EMAIL"))
                .arg(
                    Arg::new("password")
                        .short('p')
                        .long("password")
                        .value_name("PASSWORD"),
                ),
        )
        .subcommand(
            Command::new("signup")
                .about("Create an account with an emailed OTP")
                .arg(Arg::new("email").short('e').long("email").value_name("EMAIL")),
        )
        .subcommand(Command::new("logout").about("Forget the stored session"))
        .subcommand(Command::new("dashboard").about("Show balance and recent transactions"))
        .subcommand(
            Command::new("transfer")
                .about("Send money, confirmed by OTP")
                .arg(Arg::new("to").short('t').long("to").value_name("ACCOUNT"))
                .arg(Arg::new("amount").short('a').long("amount").value_name("AMOUNT")),
        )
        .subcommand(
            Command::new("buy")
                .about("Buy stock at the live ticker price")
                .arg(
                    Arg::new("quantity")
                        .short('q')
                        .long("quantity")
                        .value_name("QTY"),
                ),
        )
        .subcommand(Command::new("portfolio").about("Show owned positions"))
        .subcommand(
            Command::new("statement")
                .about("Download the PDF account statement")
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("Defaults to Statement_<username>.pdf"),
                ),
        )
        .subcommand(
            Command::new("ticker")
                .about("Watch the live price feed")
                .arg(
                    Arg::new("samples")
                        .short('n')
                        .long("samples")
                        .value_name("COUNT")
                        .value_parser(clap::value_parser!(u32))
                        .default_value("30"),
                ),
        )
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();

    let config = Config::from_env();
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return ExitCode::from(2);
    }

    match run(&config, &matches).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(DashboardError::NotLoggedIn) => {
            eprintln!("Not logged in. Run `vaultcore login` first.");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(error = %e, "Command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &Config, matches: &ArgMatches) -> Result<()> {
    let policy = if config.enforce_token_expiry {
        ExpiryPolicy::RejectExpired
    } else {
        ExpiryPolicy::PresenceOnly
    };
    let session = SessionContext::new(Arc::new(FileSessionStore::new(&config.session_file)))
        .with_policy(policy);
    let client = BankClient::new(config)?;
    info!(backend = client.base_url(), "VaultCore client ready");

    match matches.subcommand() {
        Some(("login", args)) => login(&client, session, args).await,
        Some(("signup", args)) => signup(&client, session, args).await,
        Some(("logout", _)) => {
            session.clear()?;
            println!("Logged out.");
            Ok(())
        }
        Some(("dashboard", _)) => {
            let dashboard = open_dashboard(client, session, config).await?;
            print_overview(&dashboard);
            Ok(())
        }
        Some(("transfer", args)) => {
            let mut dashboard = open_dashboard(client, session, config).await?;
            transfer(&mut dashboard, args).await
        }
        Some(("buy", args)) => {
            let mut dashboard = open_dashboard(client, session, config).await?;
            buy(&mut dashboard, config, args).await
        }
        Some(("portfolio", _)) => {
            let mut dashboard = open_dashboard(client, session, config).await?;
            show_portfolio(&mut dashboard, config).await
        }
        Some(("statement", args)) => {
            let mut dashboard = open_dashboard(client, session, config).await?;
            statement(&mut dashboard, args).await
        }
        Some(("ticker", args)) => ticker(config, args).await,
        _ => Err(DashboardError::Validation("unknown command".into())),
    }
}

async fn login(client: &BankClient, session: SessionContext, args: &ArgMatches) -> Result<()> {
    let mut flow = LoginFlow::new(session);
    if flow.mount() == Route::Dashboard {
        println!("Already logged in.");
        return Ok(());
    }

    let email = arg_or_prompt(args, "email", "Email")?;
    let password = arg_or_prompt(args, "password", "Password")?;

    match flow.submit(client, &email, &password).await {
        Ok(_) => {
            println!("Logged in.");
            Ok(())
        }
        Err(e) => {
            print_error(flow.error.as_deref());
            Err(e)
        }
    }
}

async fn signup(client: &BankClient, session: SessionContext, args: &ArgMatches) -> Result<()> {
    let mut wizard = SignupWizard::new(session);
    if wizard.mount() == Route::Dashboard {
        println!("Already logged in.");
        return Ok(());
    }

    let email = arg_or_prompt(args, "email", "Email")?;
    if let Err(e) = wizard.request_otp(client, &email).await {
        print_error(wizard.error.as_deref());
        return Err(e);
    }
    print_notice(wizard.notice.as_deref());

    let otp = prompt("OTP")?;
    let password = prompt("Choose a password")?;
    match wizard.verify(client, &otp, &password).await {
        Ok(route) => {
            print_notice(wizard.notice.as_deref());
            if route == Route::Login {
                println!("Run `vaultcore login` to sign in.");
            }
            Ok(())
        }
        Err(e) => {
            print_error(wizard.error.as_deref());
            Err(e)
        }
    }
}

async fn open_dashboard(
    client: BankClient,
    session: SessionContext,
    config: &Config,
) -> Result<Dashboard<BankClient>> {
    let mut dashboard = Dashboard::new(client, session, config);
    if dashboard.mount().await == Route::Login {
        return Err(DashboardError::NotLoggedIn);
    }
    print_error(dashboard.error.as_deref());
    Ok(dashboard)
}

fn print_overview(dashboard: &Dashboard<BankClient>) {
    let username = dashboard.session().username();
    if let Some(account) = &dashboard.account {
        println!("{}\n", view::account_card(account, username.as_deref()));
        println!(
            "{}",
            view::history_table(&dashboard.transactions, account.id)
        );
    }
}

async fn transfer(dashboard: &mut Dashboard<BankClient>, args: &ArgMatches) -> Result<()> {
    dashboard.transfer.receiver_account = arg_or_prompt(args, "to", "Recipient account")?;
    dashboard.transfer.amount = arg_or_prompt(args, "amount", "Amount")?;

    if let Err(e) = dashboard.request_transfer_otp().await {
        print_error(dashboard.transfer.error());
        return Err(e);
    }
    println!("{}", view::transfer_status(&dashboard.transfer));

    while dashboard.transfer.step() == TransferStep::AwaitingOtp {
        let otp = prompt("OTP (empty to cancel)")?;
        if otp.is_empty() {
            dashboard.transfer.cancel();
            println!("Transfer cancelled.");
            return Ok(());
        }

        dashboard.transfer.otp = otp;
        if let Err(e) = dashboard.confirm_transfer().await {
            if e.is_auth_failure() {
                return Err(e);
            }
            println!("{}", view::transfer_status(&dashboard.transfer));
        }
    }

    println!("{}\n", view::transfer_status(&dashboard.transfer));
    print_overview(dashboard);
    Ok(())
}

async fn buy(dashboard: &mut Dashboard<BankClient>, config: &Config, args: &ArgMatches) -> Result<()> {
    let price = current_price(config);
    println!("{} trading at ${price:.2}", dashboard.stock_symbol());

    let quantity = arg_or_prompt(args, "quantity", "Quantity")?;
    match dashboard.buy_stock(&quantity, price).await {
        Ok(()) => {
            print_notice(dashboard.notice.as_deref());
            println!("{}", view::portfolio_table(&dashboard.portfolio, Some(price)));
            Ok(())
        }
        Err(e) => {
            print_error(dashboard.error.as_deref());
            Err(e)
        }
    }
}

async fn show_portfolio(dashboard: &mut Dashboard<BankClient>, config: &Config) -> Result<()> {
    if let Err(e) = dashboard.load_portfolio().await {
        print_error(dashboard.error.as_deref());
        return Err(e);
    }
    let price = current_price(config);
    println!("{}", view::portfolio_table(&dashboard.portfolio, Some(price)));
    Ok(())
}

async fn statement(dashboard: &mut Dashboard<BankClient>, args: &ArgMatches) -> Result<()> {
    let statement = match dashboard.download_statement().await {
        Ok(statement) => statement,
        Err(e) => {
            print_error(dashboard.error.as_deref());
            return Err(e);
        }
    };

    let path = args
        .get_one::<String>("output")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&statement.file_name));
    std::fs::write(&path, &statement.bytes)?;
    println!("Saved {}", path.display());
    Ok(())
}

async fn ticker(config: &Config, args: &ArgMatches) -> Result<()> {
    let samples = args.get_one::<u32>("samples").copied().unwrap_or(30);
    let period = Duration::from_millis(config.ticker_interval_ms);
    let mut handle = Ticker::start(
        PriceSimulator::from_config(config).aligned_to(Utc::now(), period),
        period,
    );

    for _ in 0..samples {
        if !handle.changed().await {
            break;
        }
        println!("{}", view::ticker_line(&config.stock_symbol, &handle.snapshot()));
    }
    handle.stop();
    Ok(())
}

/// Quote for the buy and portfolio commands, on the same curve the ticker shows
fn current_price(config: &Config) -> f64 {
    let now = Utc::now();
    PriceSimulator::from_config(config)
        .aligned_to(now, Duration::from_millis(config.ticker_interval_ms))
        .advance(now)
        .price
}

fn arg_or_prompt(args: &ArgMatches, name: &str, label: &str) -> Result<String> {
    match args.get_one::<String>(name) {
        Some(value) => Ok(value.clone()),
        None => prompt(label),
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn print_notice(notice: Option<&str>) {
    if let Some(notice) = notice {
        println!("{notice}");
    }
}

fn print_error(message: Option<&str>) {
    if let Some(message) = message {
        eprintln!("Error: {message}");
    }
}
