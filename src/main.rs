use storefront::{app, auth::User, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "storefront=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;

    sqlx::migrate!("./migrations").run(&app_state.db).await?;

    if let Some(phone) = app_state.config.admin_phone.as_deref() {
        if User::promote_to_admin(&app_state.db, phone).await? {
            tracing::info!(%phone, "admin role granted");
        } else {
            tracing::warn!(%phone, "ADMIN_PHONE is not a registered user; no admin granted");
        }
    }

    app::serve(app::build_app(app_state)).await
}
