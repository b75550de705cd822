//! shelfdesk entry point.

use clap::Parser;
use shelfdesk::{
    ApiClient, AuthService, BooksController, ControllerOptions,
    auth::Credentials,
    catalog::{BookForm, BookInput, BooksQuery, FilterUpdate, FilterValue, Genre, ListParams},
    client::BookSource,
    config::{BooksCommand, Cli, Command, Config},
    session::FileSessionStore,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shelfdesk=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    // Find or load config
    let config_path = cli.config.clone().or_else(Config::find_config_file);

    let mut config = if let Some(ref path) = config_path {
        Config::load(path)?
    } else {
        Config::default()
    };

    if let Some(url) = cli.api_url.clone() {
        config.api.base_url = url;
    }

    if let Command::Init { force } = cli.command {
        return cmd_init(force);
    }

    let api = Arc::new(ApiClient::new(config.api.base_url.clone())?);
    let store = Arc::new(FileSessionStore::open(&config.session.path)?);
    let auth = AuthService::new(api.clone(), store)?;

    tracing::debug!(api = %api.base_url(), "Using backend");

    match cli.command {
        Command::Init { .. } => Ok(()),
        Command::Login {
            email,
            password,
            remember,
        } => cmd_login(&auth, email, password, remember).await,
        Command::Logout => {
            auth.logout()?;
            println!("Logged out.");
            Ok(())
        }
        Command::Register {
            name,
            email,
            password,
        } => cmd_register(&auth, name, email, password).await,
        Command::Whoami => {
            match auth.state().user {
                Some(user) => println!("{} <{}> ({:?}, {:?} session)", user.name, user.email, user.role, auth.tier()),
                None => println!("Not logged in."),
            }
            Ok(())
        }
        Command::Books { action } => cmd_books(action, &config, api).await,
    }
}

/// Write a default config file.
fn cmd_init(force: bool) -> anyhow::Result<()> {
    let config_path = PathBuf::from("shelfdesk.toml");

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, Config::generate_default())?;
    println!("Created config file: {}", config_path.display());
    println!("\nEdit shelfdesk.toml to point at your backend.");
    println!("Then run: shelfdesk login <email> --remember");

    Ok(())
}

async fn cmd_login(
    auth: &AuthService,
    email: String,
    password: Option<String>,
    remember: bool,
) -> anyhow::Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt_password("Password: ")?,
    };

    let credentials = Credentials { email, password };
    match auth.login(&credentials, remember).await {
        Ok(user) => {
            println!("Logged in as {} <{}>", user.name, user.email);
            if !remember {
                println!("(session not remembered; use --remember to keep it)");
            }
            Ok(())
        }
        Err(e) => anyhow::bail!("{} ({})", e.message_key(), e),
    }
}

async fn cmd_register(
    auth: &AuthService,
    name: String,
    email: String,
    password: Option<String>,
) -> anyhow::Result<()> {
    let (password, confirm) = match password {
        Some(p) => (p.clone(), p),
        None => (
            prompt_password("Password: ")?,
            prompt_password("Confirm password: ")?,
        ),
    };

    match auth.register(&name, &email, &password, &confirm).await {
        Ok(user) => {
            println!("Created account {} <{}>", user.name, user.email);
            Ok(())
        }
        Err(e) => anyhow::bail!("{} ({})", e.message_key(), e),
    }
}

/// Book catalog commands.
async fn cmd_books(action: BooksCommand, config: &Config, api: Arc<ApiClient>) -> anyhow::Result<()> {
    match action {
        BooksCommand::List {
            page,
            page_size,
            search,
            genre,
            author,
            publisher,
            available,
            sort,
            json,
        } => {
            let mut query = BooksQuery::default();
            query.set_page_size(page_size.unwrap_or(config.list.page_size))?;
            if !sort.is_empty() {
                query.sort.clear();
                for key in sort {
                    query.add_sort_with(key.field, key.direction);
                }
            }
            if let Some(genre) = genre {
                let genre = Genre::from_label(&genre)
                    .ok_or_else(|| anyhow::anyhow!("Unknown genre: {}", genre))?;
                query.set_filter(FilterUpdate::Genre(FilterValue::Only(genre)));
            }
            query.set_filter(FilterUpdate::Author(author.into()));
            query.set_filter(FilterUpdate::Publisher(publisher.into()));
            query.set_filter(FilterUpdate::Available(available.into()));
            query.set_search(search.unwrap_or_default());
            query.set_page(page)?;

            let mut options = ControllerOptions::from(&config.list);
            options.metadata_sample_size = 0;
            let controller = BooksController::with_query(api, options, query)?;

            let view = controller.settled().await;
            if let Some(key) = view.error {
                anyhow::bail!("{}", key);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&view.result)?);
                return Ok(());
            }

            println!(
                "{:<10} {:<32} {:<20} {:<12} {:>4} {:>6} AVAILABLE",
                "ID", "TITLE", "AUTHOR", "GENRE", "YEAR", "RATING"
            );
            println!("{}", "-".repeat(100));
            for book in &view.result.data {
                println!(
                    "{:<10} {:<32} {:<20} {:<12} {:>4} {:>6} {}",
                    truncate(&book.id, 10),
                    truncate(&book.title, 32),
                    truncate(&book.author, 20),
                    book.genre.label(),
                    book.published_year,
                    book.rating,
                    if book.available { "yes" } else { "no" }
                );
            }
            println!(
                "\nPage {}/{} ({} books)",
                view.result.page,
                view.result.total_pages(),
                view.result.total
            );
        }

        BooksCommand::Get { id } => {
            let book = api
                .get_book(&id)
                .await
                .map_err(|e| anyhow::anyhow!("books.form.loadError ({})", e))?;
            println!("{}", serde_json::to_string_pretty(&book)?);
        }

        BooksCommand::Create {
            title,
            author,
            year,
            isbn,
            description,
            image_url,
        } => {
            let form = BookForm {
                title,
                author,
                published_year: year.unwrap_or_default(),
                isbn: isbn.unwrap_or_default(),
                description: description.unwrap_or_default(),
                image_url: image_url.unwrap_or_default(),
            };
            let input = validated(&form)?;
            api.create_book(&input).await?;
            println!("books.form.created");
        }

        BooksCommand::Update {
            id,
            title,
            author,
            year,
            isbn,
            description,
            image_url,
        } => {
            let current = api
                .get_book(&id)
                .await
                .map_err(|e| anyhow::anyhow!("books.form.loadError ({})", e))?;

            let mut form = BookForm::from_book(&current);
            if let Some(v) = title {
                form.title = v;
            }
            if let Some(v) = author {
                form.author = v;
            }
            if let Some(v) = year {
                form.published_year = v;
            }
            if let Some(v) = isbn {
                form.isbn = v;
            }
            if let Some(v) = description {
                form.description = v;
            }
            if let Some(v) = image_url {
                form.image_url = v;
            }

            let input = validated(&form)?;
            api.update_book(&id, &input).await?;
            println!("books.form.updated");
        }

        BooksCommand::SetAvailable { id, available } => {
            api.set_available(&id, available).await?;
            println!(
                "{}: {}",
                id,
                if available { "available" } else { "not available" }
            );
        }

        BooksCommand::Export {
            output,
            search,
            sort,
        } => {
            let mut params = ListParams::sample(config.list.page_size);
            params.search = search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
            params.sort = sort
                .into_iter()
                .filter(|k| k.field.is_server_sortable())
                .collect();

            let bytes = api.export_csv(&params, &CancellationToken::new()).await?;
            tokio::fs::write(&output, &bytes).await?;
            println!("Wrote {} bytes to {}", bytes.len(), output.display());
        }

        BooksCommand::Metadata => {
            let metadata = api
                .load_metadata(config.list.metadata_sample_size, &CancellationToken::new())
                .await?;
            println!("Authors:    {}", metadata.authors.join(", "));
            println!("Publishers: {}", metadata.publishers.join(", "));
            println!("Genres:     {}", metadata.genres.join(", "));
        }
    }

    Ok(())
}

/// Validate a form, printing every field error.
fn validated(form: &BookForm) -> anyhow::Result<BookInput> {
    let errors = form.validate();
    if !errors.is_empty() {
        for (field, key) in &errors {
            eprintln!("{}: {}", field, key);
        }
        anyhow::bail!("books.form.submitError");
    }
    Ok(form.to_input()?)
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

/// Prompt for password input.
fn prompt_password(prompt: &str) -> anyhow::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut password = String::new();
    io::stdin().read_line(&mut password)?;

    Ok(password.trim().to_string())
}
