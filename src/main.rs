//! Runs one search against the listings backend and prints the results.
//!
//! Usage: `pushkind-stays [QUERY] [PAGE]`, e.g.
//! `pushkind-stays 'location=Bali&number_of_guests=2' 2`. Without a query the
//! remembered last search is repeated; `--logout` forgets it.

use std::env;
use std::sync::Arc;

use config::Config;
use dotenvy::dotenv;

use pushkind_stays::api::HttpListingsApi;
use pushkind_stays::cache::ResultCache;
use pushkind_stays::domain::types::ViewName;
use pushkind_stays::dto::search::{ResultStatus, SearchView};
use pushkind_stays::forms::search::SearchForm;
use pushkind_stays::models::config::AppConfig;
use pushkind_stays::query;
use pushkind_stays::repository::JsonFileRepository;
use pushkind_stays::runtime::SearchSession;
use pushkind_stays::store::PersistedQueryStore;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenv().ok(); // Load .env file
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    // Select config profile (defaults to `local`).
    let app_env = env::var("APP_ENV").unwrap_or_else(|_| "local".into());

    let settings = Config::builder()
        .add_source(config::File::with_name("config/default"))
        .add_source(config::File::with_name(&format!("config/{}", app_env)).required(false))
        .add_source(config::Environment::with_prefix("APP"))
        .build();

    let settings = match settings {
        Ok(settings) => settings,
        Err(err) => {
            log::error!("Error loading settings: {}", err);
            std::process::exit(1);
        }
    };

    let app_config = match settings.try_deserialize::<AppConfig>() {
        Ok(app_config) => app_config,
        Err(err) => {
            log::error!("Error loading app config: {}", err);
            std::process::exit(1);
        }
    };

    let view_name = match ViewName::new(app_config.view_name.as_str()) {
        Ok(view_name) => view_name,
        Err(err) => {
            log::error!("Invalid view name in config: {}", err);
            std::process::exit(1);
        }
    };

    let mut args = env::args().skip(1);
    let raw_query = args.next().unwrap_or_default();
    let page = args.next().and_then(|raw| raw.parse::<usize>().ok());

    let repo = JsonFileRepository::new(&app_config.storage_path);
    let store = PersistedQueryStore::hydrate(repo);
    let api = Arc::new(HttpListingsApi::new(app_config.api_base_url.as_str()));
    let mut session = SearchSession::new(
        api,
        ResultCache::new(app_config.cache_policy()),
        store,
        app_config.fetch_timeout(),
    );

    if raw_query == "--logout" {
        session.context().store.borrow_mut().clear();
        println!("Сохранённый поиск удалён.");
        return;
    }

    let mut controller = session.controller(view_name, app_config.page_size);

    if let Err(err) = controller.mount("") {
        log::error!("Failed to open the search view: {err}");
        std::process::exit(1);
    }

    // An explicit query is submitted like a filled-in form; a bare run
    // repeats the remembered search the draft was pre-filled with.
    let params = query::parse_query_string(&raw_query);
    if query::has_search_params(&params) {
        controller.set_draft(SearchForm::from(&query::decode(&params)));
    } else if session.context().store.borrow().get().is_none() {
        println!("Нет сохранённого поиска. Укажите параметры, например: location=Bali");
        return;
    }

    match controller.submit() {
        Ok(outcome) => log::info!("Searching ?{}", outcome.url.unwrap_or_default()),
        Err(err) => {
            log::error!("Search rejected: {err}");
            std::process::exit(1);
        }
    }
    session.settle(&mut controller).await;

    if let Some(page) = page {
        match controller.go_to_page(page) {
            Ok(outcome) => {
                if let Some(url) = outcome.url {
                    log::info!("Showing ?{url}");
                }
            }
            Err(err) => log::warn!("Cannot open page {page}: {err}"),
        }
        session.settle(&mut controller).await;
    }

    print_view(&controller.view());
    controller.teardown();
}

fn print_view(view: &SearchView) {
    if let Some(error) = &view.error {
        println!("Ошибка: {error}");
    }
    let Some(results) = &view.results else {
        if view.status != ResultStatus::Failed {
            println!("Ничего не найдено.");
        }
        return;
    };
    if view.stale {
        println!("(показаны предыдущие результаты)");
    }
    println!(
        "Найдено: {}, страница {} из {}",
        results.total, results.page, results.total_pages
    );
    for listing in &results.items {
        let rating = listing
            .rating
            .map(|rating| format!(" ★{rating:.1}"))
            .unwrap_or_default();
        println!(
            "  [{}] {}: {:.0} за ночь{}",
            listing.id, listing.title, listing.nightly_price, rating
        );
    }
}
