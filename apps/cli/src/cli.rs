use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use storefront_client::{ClientContext, ClientResult, SessionState};

#[derive(Debug, Parser)]
#[command(name = "storefront", about = "Storefront counter client", long_about = None)]
pub(crate) struct Cli {
    /// Path to client.toml (defaults to the platform config directory)
    #[arg(long, env = "STOREFRONT_CONFIG")]
    pub(crate) config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login(LoginArgs),
    /// Clear the stored session
    Logout,
    /// Show who is signed in
    Status,
    /// Load and list master data
    Catalog,
    /// Cash/UPI takings for a date range
    Summary(SummaryArgs),
    /// Show or change the UI language
    Language(LanguageArgs),
}

#[derive(Debug, Args)]
struct LoginArgs {
    #[arg(long)]
    username: String,

    #[arg(long, env = "STOREFRONT_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Debug, Args)]
struct SummaryArgs {
    /// First day (YYYY-MM-DD); defaults to today
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last day (YYYY-MM-DD); defaults to the start day
    #[arg(long)]
    end: Option<NaiveDate>,
}

#[derive(Debug, Args)]
struct LanguageArgs {
    /// Language code to store, e.g. `en` or `ta`
    code: Option<String>,
}

impl Cli {
    pub(crate) async fn run(self, context: &ClientContext) -> ClientResult<()> {
        match self.command {
            Commands::Login(args) => login(context, args).await,
            Commands::Logout => {
                context.sign_out().await?;
                println!("signed out");
                Ok(())
            }
            Commands::Status => {
                status(context);
                Ok(())
            }
            Commands::Catalog => catalog(context).await,
            Commands::Summary(args) => summary(context, args).await,
            Commands::Language(args) => language(context, args).await,
        }
    }
}

async fn login(context: &ClientContext, args: LoginArgs) -> ClientResult<()> {
    let session = context.session.sign_in(&args.username, &args.password).await?;
    println!("signed in as {}", session.profile.name);
    if let Some(expires_at) = session.expires_at {
        println!("session expires at {}", expires_at.with_timezone(&Local));
    }
    Ok(())
}

fn status(context: &ClientContext) {
    match context.session.state() {
        SessionState::Authenticated(session) => {
            println!("user: {}", session.profile.name);
            if let Some(id) = session.profile.user_id {
                println!("user_id: {}", id);
            }
            let roles: Vec<_> = session.profile.roles.iter().map(String::as_str).collect();
            println!("roles: {}", roles.join(", "));
            if let Some(expires_at) = session.expires_at {
                println!("expires_at: {}", expires_at.with_timezone(&Local));
            }
        }
        SessionState::Unauthenticated | SessionState::Unknown => println!("not signed in"),
    }
}

async fn catalog(context: &ClientContext) -> ClientResult<()> {
    let report = context.master_data.load().await?;
    if let Some(warning) = &report.error {
        eprintln!("warning: {}", warning);
    }

    let data = report.data;
    println!("products ({}):", data.products.len());
    for product in &data.products {
        let flavours: Vec<_> = data
            .available_flavours(Some(product.id))
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        println!("  {:>4}  {:<24} {}  [{}]", product.id, product.name, product.unit_price, flavours.join(", "));
    }
    println!("add-ons ({}):", data.add_ons.len());
    for add_on in &data.add_ons {
        println!("  {:>4}  {:<24} +{}", add_on.id, add_on.name, add_on.price);
    }
    let methods: Vec<_> = data.payment_methods.iter().map(|m| m.name.as_str()).collect();
    println!("payment methods: {}", methods.join(", "));
    Ok(())
}

async fn summary(context: &ClientContext, args: SummaryArgs) -> ClientResult<()> {
    let start = args.start.unwrap_or_else(|| Local::now().date_naive());
    let end = args.end.unwrap_or(start);

    let summary = context.reports.daily_summary(start, end).await?;
    println!("{} .. {}", start, end);
    println!("cash:  {}", summary.cash);
    println!("upi:   {}", summary.upi);
    println!("total: {}", summary.total);
    Ok(())
}

async fn language(context: &ClientContext, args: LanguageArgs) -> ClientResult<()> {
    if let Some(code) = args.code {
        context.preferences.set_language(&code).await?;
    }
    println!("{}", context.preferences.language().await);
    Ok(())
}
