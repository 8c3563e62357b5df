use clap::Parser;
use skillswap::core::session::BrowsePage;
use skillswap::domain::ports::ListingStore;
use skillswap::utils::error::{ErrorSeverity, MarketError};
use skillswap::utils::{logger, validation::Validate};
use skillswap::{
    BackendClient, BrowseSession, CliConfig, InMemoryListingStore, ListingFeed, LoadState,
    ServiceResponse, SortKey, TomlConfig,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 先讀取配置，日誌等級可能來自 [logging] level
    let settings = if cli.offline {
        None
    } else {
        Some(load_settings(&cli.config))
    };
    let level = settings
        .as_ref()
        .and_then(|loaded| loaded.as_ref().ok())
        .and_then(|config| config.log_level());

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose, level);
    } else {
        logger::init_cli_logger(cli.verbose, level);
    }

    tracing::info!("Starting skillswap CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證命令列參數
    if let Err(e) = cli.validate() {
        fail(&e);
    }

    let state = match settings {
        None => {
            tracing::info!("Offline mode: browsing sample listings");
            let store = Arc::new(InMemoryListingStore::with_sample_data());
            let session = BrowseSession::default()
                .with_spec(cli.filter_spec(), cli.sort_key(SortKey::default()));
            browse(store, &cli, session).await
        }
        Some(Err(e)) => fail(&e),
        Some(Ok(settings)) => {
            let client = match BackendClient::new(&settings) {
                Ok(client) => client,
                Err(e) => fail(&e),
            };
            let session = BrowseSession::new(settings.page_size())
                .with_spec(cli.filter_spec(), cli.sort_key(settings.default_sort()));
            browse(Arc::new(client), &cli, session).await
        }
    };

    match state {
        LoadState::Loaded(page) => {
            tracing::info!("✅ Showing {} of {} listings", page.items.len(), page.total);
            if cli.json {
                let response = ServiceResponse::from(skillswap::Result::Ok(page));
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print_page(&page);
            }
        }
        LoadState::Failed(message) => {
            tracing::error!("❌ Could not load listings: {}", message);
            if cli.json {
                let response: ServiceResponse<BrowsePage> = ServiceResponse {
                    success: false,
                    data: None,
                    error: Some(message),
                };
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                eprintln!("❌ {}", message);
            }
            // 載入失敗視為可重試
            std::process::exit(2);
        }
        LoadState::Idle | LoadState::Loading => {
            tracing::warn!("Listing feed ended without a result");
        }
    }

    Ok(())
}

fn load_settings(path: &str) -> skillswap::Result<TomlConfig> {
    let settings = TomlConfig::from_file(path)?;
    settings.validate()?;
    Ok(settings)
}

/// Fetch through the feed, then page the result the way the browse screen does.
async fn browse<S: ListingStore + 'static>(
    store: Arc<S>,
    cli: &CliConfig,
    mut session: BrowseSession,
) -> LoadState<BrowsePage> {
    for _ in 1..cli.page {
        session.load_more();
    }

    let feed = ListingFeed::new(store);
    match feed.fetch(session.spec().clone(), session.sort()).await {
        LoadState::Loaded(listings) => LoadState::Loaded(session.view(&listings)),
        LoadState::Failed(message) => LoadState::Failed(message),
        LoadState::Idle => LoadState::Idle,
        LoadState::Loading => LoadState::Loading,
    }
}

fn print_page(page: &BrowsePage) {
    if page.items.is_empty() {
        println!("No skills found. Try adjusting your search criteria or filters.");
        return;
    }

    for listing in &page.items {
        println!(
            "#{:<4} {:<36} {:<16} ★ {:.1} ({:>3})  {} · {}",
            listing.id,
            listing.title,
            listing.price.to_string(),
            listing.rating,
            listing.review_count,
            listing.creator.name,
            listing.creator.university,
        );
    }

    println!("Showing {} of {} skills", page.items.len(), page.total);
    if page.has_more {
        println!("Use --page to load more");
    }
}

/// Report `e` and exit with a code matching its severity.
fn fail(e: &MarketError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    // 輸出用戶友好的錯誤信息
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0, // 警告
        ErrorSeverity::Medium => 2, // 重試錯誤
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3, // 系統錯誤
    };
    std::process::exit(exit_code);
}
