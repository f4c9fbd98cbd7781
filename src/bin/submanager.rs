use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};
use submanager_client::{
    AuthForm, Client, ClientOptions, Config, Cycle, Dashboard, Overview, Payment,
    ProcessOutcome, Route, SubManagerError, Subscription, SubscriptionDraft, SubscriptionUpdate,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "submanager")]
#[command(about = "Track recurring subscriptions and payments", long_about = None)]
struct Cli {
    /// Base URL of the API, e.g. http://localhost:8080/api
    #[arg(short, long)]
    url: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print status lines
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and log in
    Register {
        username: String,
        email: String,
        password: String,
    },
    /// Log in with an existing account
    Login { username: String, password: String },
    /// Forget the stored session
    Logout,
    /// Spending summary and charts
    Overview {
        /// Year to aggregate, defaults to the current one
        #[arg(long)]
        year: Option<i32>,
    },
    /// List subscriptions
    Subscriptions,
    /// Add a subscription
    Add {
        title: String,
        price: f64,
        #[arg(long, default_value = "MONTHLY")]
        cycle: Cycle,
        /// Date of the last payment (yyyy-mm-dd), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value_t = 1)]
        currency: i64,
    },
    /// Edit a subscription's title, description or price
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        price: Option<f64>,
    },
    /// Delete a subscription
    Delete { id: i64 },
    /// List payments, unprocessed first
    Payments,
    /// Mark a payment as paid
    Process {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// List available currencies
    Currencies,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "submanager_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err.user_message());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), SubManagerError> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = cli.url {
        config.api_url = url;
    }
    config.debug |= cli.debug;
    config.validate()?;

    let client = Client::new(ClientOptions::from(&config))?;
    let today = Local::now().date_naive();

    match cli.command {
        Commands::Register {
            username,
            email,
            password,
        } => {
            if client.route(Route::Auth)? == Route::Dashboard {
                println!("Already logged in.");
                return show_overview(&client, &config, today.year());
            }
            client.register(&AuthForm::register(username, email, password))?;
            show_overview(&client, &config, today.year())
        }
        Commands::Login { username, password } => {
            if client.route(Route::Auth)? == Route::Dashboard {
                println!("Already logged in.");
                return show_overview(&client, &config, today.year());
            }
            client.login(&AuthForm::login(username, password))?;
            show_overview(&client, &config, today.year())
        }
        Commands::Logout => client.logout(),
        Commands::Overview { year } => {
            show_overview(&client, &config, year.unwrap_or_else(|| today.year()))
        }
        Commands::Subscriptions => {
            let dashboard = open_dashboard(&client)?;
            print_subscriptions(&dashboard.subscriptions);
            Ok(())
        }
        Commands::Add {
            title,
            price,
            cycle,
            date,
            description,
            currency,
        } => {
            let mut dashboard = open_dashboard(&client)?;
            let draft = SubscriptionDraft {
                title,
                description,
                price,
                cycle,
                date_of_last_payment: date.unwrap_or(today),
                currency_id: currency,
            };
            let created = dashboard.add_subscription(&draft, today)?;
            println!(
                "Added \"{}\" (id {}).",
                created.title, created.subscription_id
            );
            Ok(())
        }
        Commands::Edit {
            id,
            title,
            description,
            price,
        } => {
            let mut dashboard = open_dashboard(&client)?;
            let current = dashboard
                .subscriptions
                .iter()
                .find(|s| s.subscription_id == id)
                .ok_or(SubManagerError::NotFound)?;

            let mut update = SubscriptionUpdate::from_subscription(current);
            if let Some(title) = title {
                update.title = title;
            }
            if let Some(description) = description {
                update.description = description;
            }
            if let Some(price) = price {
                update.price = price;
            }

            dashboard.edit_subscription(id, &update)?;
            println!("Updated subscription {}.", id);
            Ok(())
        }
        Commands::Delete { id } => {
            let mut dashboard = open_dashboard(&client)?;
            dashboard.delete_subscription(id)?;
            println!("Deleted subscription {}.", id);
            print_subscriptions(&dashboard.subscriptions);
            Ok(())
        }
        Commands::Payments => {
            let dashboard = open_dashboard(&client)?;
            print_payments(&dashboard.sorted_payments(), &dashboard.subscriptions);
            Ok(())
        }
        Commands::Process { id, yes } => {
            let mut dashboard = open_dashboard(&client)?;
            let subscriptions = dashboard.subscriptions.clone();
            let outcome = dashboard.process_payment(id, |payment| {
                yes || confirm(&format!(
                    "Mark payment {} ({}) as paid?",
                    payment.payment_id,
                    payment.title_in(&subscriptions).unwrap_or("unknown")
                ))
            })?;

            match outcome {
                ProcessOutcome::Declined => println!("Cancelled."),
                ProcessOutcome::Processed(next) if next.payment_id != id => println!(
                    "Payment {} processed. Next payment due {}.",
                    id,
                    display_date(next.payment_date(), &next.date_of_payment)
                ),
                ProcessOutcome::Processed(_) => println!("Payment {} processed.", id),
            }
            Ok(())
        }
        Commands::Currencies => {
            let session = client.session()?;
            for currency in session.currencies()? {
                println!(
                    "{:>3}  {:<4} {:<4} {}",
                    currency.currency_id, currency.short_name, currency.sign, currency.name
                );
            }
            Ok(())
        }
    }
}

/// Loads the dashboard, sending unauthenticated users to the login page.
fn open_dashboard(client: &Client) -> Result<Dashboard, SubManagerError> {
    if client.route(Route::Dashboard)? == Route::Auth {
        eprintln!("Please log in first: submanager login <username> <password>");
        return Err(SubManagerError::NotAuthenticated);
    }

    let mut dashboard = Dashboard::new(client.session()?);
    dashboard.refresh();

    if dashboard.logged_out {
        return Err(SubManagerError::InvalidToken);
    }
    if let Some(message) = &dashboard.message {
        eprintln!("{}", message);
    }
    Ok(dashboard)
}

fn show_overview(client: &Client, config: &Config, year: i32) -> Result<(), SubManagerError> {
    let dashboard = open_dashboard(client)?;
    print_overview(&dashboard.overview(year, config.budget));
    Ok(())
}

fn print_overview(overview: &Overview) {
    println!("Overview {}", overview.year);
    println!("  Active subscriptions: {}", overview.active_subscriptions);
    println!("  Current usage:        {:.2}/month", overview.monthly_cost);
    println!("  Overall this year:    {:.2}", overview.spent_this_year);
    println!("  Overall all time:     {:.2}", overview.spent_all_time);
    println!(
        "  Budget:               {:.2} spent, {:.2} remaining",
        overview.budget.spent, overview.budget.remaining
    );

    println!();
    println!("Payments");
    let peak = overview
        .monthly_totals
        .iter()
        .map(|m| m.total)
        .fold(0.0_f64, f64::max);
    for month in &overview.monthly_totals {
        let bar = if peak > 0.0 {
            "#".repeat((month.total / peak * 30.0).round() as usize)
        } else {
            String::new()
        };
        println!("  {:<3} {:>10.2} {}", &month.month[..3], month.total, bar);
    }

    println!();
    if overview.shares.is_empty() {
        println!("No active subscriptions");
        return;
    }
    println!("Subscriptions share");
    for share in &overview.shares {
        println!(
            "  {:<24} {:>10.2} {:>6.1}%",
            share.name, share.value, share.percentage
        );
    }
}

fn print_subscriptions(subscriptions: &[Subscription]) {
    println!(
        "{:>5}  {:<24} {:>10}  {:<8} {:<12} {}",
        "ID", "Title", "Price", "Cycle", "Last paid", "Description"
    );
    for sub in subscriptions {
        println!(
            "{:>5}  {:<24} {:>10.2}  {:<8} {:<12} {}",
            sub.subscription_id,
            sub.title,
            sub.price,
            sub.cycle,
            display_date(sub.last_payment_date(), &sub.date_of_last_payment),
            sub.description.as_deref().unwrap_or("")
        );
    }
}

fn print_payments(payments: &[Payment], subscriptions: &[Subscription]) {
    println!(
        "{:>5}  {:<24} {:>10}  {:<12} {}",
        "ID", "Name", "Price", "Date", "Status"
    );
    for pay in payments {
        println!(
            "{:>5}  {:<24} {:>10.2}  {:<12} {}",
            pay.payment_id,
            pay.title_in(subscriptions).unwrap_or(""),
            pay.amount_in(subscriptions),
            display_date(pay.payment_date(), &pay.date_of_payment),
            pay.status
        );
    }
}

fn display_date(parsed: Option<NaiveDate>, raw: &str) -> String {
    match parsed {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => raw.to_string(),
    }
}

fn confirm(question: &str) -> bool {
    print!("{} [y/N] ", question);
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
