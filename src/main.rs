use clap::Parser;
use rolegate::cli::{
    Args, build_config, build_mailer, handle_create_superadmin, handle_seed_roles, init_logging,
    load_jwt_secrets, open_database, validate_frontend_url,
};
use rolegate::{init_cleanup, run_server};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let Some((access_secret, refresh_secret)) = load_jwt_secrets(
        args.access_secret_file.as_deref(),
        args.refresh_secret_file.as_deref(),
    ) else {
        std::process::exit(1);
    };

    let Some(frontend_url) = validate_frontend_url(&args.frontend_url) else {
        std::process::exit(1);
    };

    let Some(mailer) = build_mailer(&args) else {
        std::process::exit(1);
    };

    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    if args.seed_roles && !handle_seed_roles(&db).await {
        std::process::exit(1);
    }

    if let Some(email) = args.create_superadmin.as_deref() {
        if !handle_create_superadmin(&db, email).await {
            std::process::exit(1);
        }
    }

    init_cleanup(&db).await;

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    match listener.local_addr() {
        Ok(local_addr) => info!(address = %local_addr, "Listening"),
        Err(e) => error!(error = %e, "Failed to read local address"),
    }

    let config = build_config(
        db,
        access_secret,
        refresh_secret,
        frontend_url,
        mailer,
    );
    if let Err(e) = run_server(config, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
