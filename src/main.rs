use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use newsdesk::config::SiteConfig;
use newsdesk::forms::SignupForm;
use newsdesk::web::{Method, Params, Request, Response, Site};
use newsdesk::{Error, Permission, Table};

/// Newsdesk - serve site pages from the command line
#[derive(Parser, Debug)]
#[command(name = "newsdesk")]
#[command(version)]
#[command(about = "Dispatch requests to the news site and manage accounts", long_about = None)]
struct Cli {
    /// Configuration file (TOML); defaults apply when omitted
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Handle one request and print the response as JSON
    Dispatch {
        /// Request method
        #[arg(value_enum)]
        method: MethodArg,
        /// Request path, with optional query string
        path: String,
        /// Form field as name=value (repeatable)
        #[arg(short = 'f', long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
    /// Read `METHOD PATH [FORM]` lines from stdin and answer each one,
    /// carrying the session from line to line
    Batch,
    /// Create an account directly in the database
    CreateUser {
        /// Login name
        #[arg(long)]
        username: String,
        /// Password (8 to 32 characters)
        #[arg(long)]
        password: String,
        /// Given name
        #[arg(long)]
        firstname: String,
        /// Family name
        #[arg(long)]
        surname: String,
        /// Contact email
        #[arg(long)]
        email: String,
        /// UK phone number
        #[arg(long)]
        phone: String,
        /// Permission tier: 0 user, 1 admin, 2 sysadmin
        #[arg(long, default_value_t = 0)]
        permissions: i64,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MethodArg {
    Get,
    Post,
}

impl From<MethodArg> for Method {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::Get => Method::Get,
            MethodArg::Post => Method::Post,
        }
    }
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected name=value, got `{raw}`"))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let config = match &cli.config {
        Some(path) => SiteConfig::from_file(path)?,
        None => {
            let mut config = SiteConfig::default();
            config.apply_env_overrides()?;
            config.validate()?;
            config
        }
    };
    newsdesk::logging::init(&config.logging)?;
    let site = Site::from_config(&config)?;

    match cli.command {
        Command::Dispatch {
            method,
            path,
            fields,
        } => {
            let request = Request::new(method.into(), path)
                .with_form_params(fields.into_iter().collect());
            print_response(&site.handle(&request))
        }
        Command::Batch => batch(&site),
        Command::CreateUser {
            username,
            password,
            firstname,
            surname,
            email,
            phone,
            permissions,
        } => {
            let form = SignupForm::from_params(&Params::from_iter([
                ("username", username),
                ("password", password),
                ("firstname", firstname),
                ("surname", surname),
                ("email", email),
                ("tel", phone),
            ]));
            create_user(&site, &form, permissions)
        }
    }
}

fn batch(site: &Site) -> Result<(), Error> {
    let mut session: Option<String> = None;
    for line in io::stdin().lock().lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        let (Some(method), Some(path)) = (parts.next(), parts.next()) else {
            continue;
        };
        let method = match method.to_ascii_uppercase().as_str() {
            "GET" => Method::Get,
            "POST" => Method::Post,
            other => return Err(Error::argument(format!("unknown method `{other}`"))),
        };
        let mut request = Request::new(method, path);
        if let Some(body) = parts.next() {
            request = request.with_form_params(Params::parse(body));
        }
        if let Some(id) = &session {
            request = request.with_session(id.clone());
        }
        let response = site.handle(&request);
        session = response.session_id.clone();
        print_response(&response)?;
    }
    Ok(())
}

fn create_user(site: &Site, form: &SignupForm, permissions: i64) -> Result<(), Error> {
    let tier = Permission::try_from(permissions)
        .map_err(|tier| Error::argument(format!("unknown permission tier {tier}")))?;
    let users = site.database().table(Table::Users);
    if let Err(errors) = form.check(&users)?.finish() {
        return Err(Error::argument(errors.messages().join(" ")));
    }

    let hash = site.hasher().hash(&form.password)?;
    let mut row = form.record(hash);
    row.insert("permissions".to_string(), tier.tier().into());
    let uid = users.insert(&row)?;
    tracing::info!(uid, username = %form.username.to_lowercase(), role = %tier, "user created");
    println!("created user {} ({tier}) with uid {uid}", form.username.to_lowercase());
    Ok(())
}

fn print_response(response: &Response) -> Result<(), Error> {
    let json = serde_json::to_string(response)
        .map_err(|e| Error::argument(format!("response is not serializable: {e}")))?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{json}")?;
    Ok(())
}
