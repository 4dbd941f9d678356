use std::{process, sync::Arc, time::Duration};

use foglio::{
    application::{
        auth::AuthService,
        catalog::CatalogService,
        comments::CommentService,
        editor::EditorService,
        error::AppError,
        repos::{CommentsRepo, CommentsWriteRepo, PostsRepo, PostsWriteRepo, UsersRepo},
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::User(args) => match args.command {
            config::UserCommand::Add(add) => run_user_add(settings, add).await,
        },
    }
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_http_state(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> HttpState {
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
    let comments_repo: Arc<dyn CommentsRepo> = repositories.clone();
    let comments_write_repo: Arc<dyn CommentsWriteRepo> = repositories.clone();
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();

    HttpState {
        catalog: Arc::new(CatalogService::new(
            posts_repo.clone(),
            comments_repo.clone(),
        )),
        editor: Arc::new(EditorService::new(posts_repo.clone(), posts_write_repo)),
        comments: Arc::new(CommentService::new(
            posts_repo,
            comments_repo,
            comments_write_repo,
        )),
        auth: Arc::new(AuthService::new(users_repo, &settings.auth)),
        db: repositories,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let state = build_http_state(repositories, &settings);
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "foglio::serve",
        addr = %settings.server.addr,
        "listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(settings.server.graceful_shutdown))
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn run_user_add(
    settings: config::Settings,
    args: config::UserAddArgs,
) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let users_repo: Arc<dyn UsersRepo> = repositories;
    let auth = AuthService::new(users_repo, &settings.auth);

    let user = auth
        .create_user(&args.username, &args.password)
        .await
        .map_err(|err| AppError::unexpected(format!("failed to create user: {err}")))?;

    info!(
        target = "foglio::users",
        user_id = %user.id,
        username = %user.username,
        "user created"
    );
    Ok(())
}

async fn shutdown_signal(grace: Duration) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => error!(error = %err, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!(
        target = "foglio::serve",
        grace_secs = grace.as_secs(),
        "shutdown signal received, draining connections"
    );

    // Hard stop if connections fail to drain within the configured window.
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        warn!(target = "foglio::serve", "graceful shutdown window elapsed");
        process::exit(0);
    });
}
