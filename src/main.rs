mod aggregate;
mod calendar;
mod cancel;
mod clock;
mod collector;
mod config;
mod error;
mod extract;
mod output;
mod progress;
mod sources;
mod throttle;
mod transport;
mod types;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use indicatif::MultiProgress;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cancel::{CancelSource, CancelToken};
use crate::clock::{Clock, SystemClock};
use crate::collector::collect_batch;
use crate::config::Config;
use crate::error::Result;
use crate::output::SummaryRow;
use crate::progress::ProgressSink;
use crate::sources::players::{self, PLAYERS_LABEL};
use crate::sources::prices::{self, PRICES_LABEL};
use crate::sources::steam::{self, AppDetails, ReviewSummary, DETAILS_LABEL, REVIEWS_LABEL};
use crate::sources::steamspy::{self, SpyStats, STEAMSPY_LABEL};
use crate::throttle::Basket;
use crate::types::{AppId, MonthlyPrice, PlayerMonth, PlayerSummary, PricePoint};

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cancel_source = CancelSource::new();
    let cancel = cancel_source.token();

    // Ctrl-C preempts throttle sleeps; running batches return their partial
    // accumulation instead of waiting out the window.
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing with partial results");
            cancel_source.cancel();
        }
    });

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config::REQUEST_TIMEOUT_SECS))
        .user_agent(concat!("steam-harvester/", env!("CARGO_PKG_VERSION")))
        .build()?;

    // --- Catalog: the identifier universe for this run ---
    let catalog = steam::fetch_catalog(&client, &cfg).await?;
    info!("catalog fetched: {} apps", catalog.len());
    let all_ids: Vec<AppId> = catalog.iter().map(|e| e.appid).collect();

    let cutoff = calendar::month_start(clock.now().date_naive());
    let multi = MultiProgress::new();

    // The store chain (details → reviews → players) needs release dates and
    // review counts before the player batch can start. SteamSpy and the
    // price site have their own baskets and run alongside it.
    let (store, spy, price_points) = tokio::join!(
        store_chain(&cfg, &client, &clock, &cancel, &multi, &all_ids),
        spy_batch(&cfg, &client, &clock, &cancel, &multi, &all_ids),
        price_batch(&cfg, &client, &clock, &cancel, &multi, &all_ids),
    );
    let store = store?;
    let spy = spy?;
    let price_points = price_points?;

    // --- Reconcile price history into monthly grids ---
    let mut price_months: Vec<(AppId, Vec<MonthlyPrice>)> = Vec::new();
    let mut mean_prices: HashMap<AppId, f64> = HashMap::new();
    for (appid, points) in price_points {
        let series = calendar::reconcile(&points, cutoff);
        let months = aggregate::monthly_average_prices(&series);
        if let Some(mean) = aggregate::mean_price(&months) {
            mean_prices.insert(appid, mean);
        }
        if !months.is_empty() {
            price_months.push((appid, months));
        }
    }

    // --- Player summaries ---
    let mut player_months: Vec<(AppId, Vec<PlayerMonth>)> = Vec::new();
    let mut player_summaries: HashMap<AppId, PlayerSummary> = HashMap::new();
    for (appid, months) in store.players {
        let Some(months) = months else { continue };
        if months.is_empty() {
            continue;
        }
        player_summaries.insert(appid, aggregate::player_summary(&months));
        player_months.push((appid, months));
    }

    // --- Assemble summary rows for every released game ---
    let rows: Vec<SummaryRow> = store
        .games
        .iter()
        .map(|d| {
            let reviews = store.reviews.get(&d.appid);
            let stats = spy.get(&d.appid);
            let mean_price = mean_prices.get(&d.appid).copied();
            let player = player_summaries.get(&d.appid).copied().unwrap_or_default();
            let owners = match (reviews, d.release_year()) {
                (Some(r), Some(year)) => Some(aggregate::estimate_owners(r.reviews_total, year)),
                _ => None,
            };
            let revenue = match (owners, mean_price) {
                (Some(o), Some(p)) => Some(aggregate::estimate_revenue(o, p)),
                _ => None,
            };
            SummaryRow {
                appid: d.appid,
                name: d.name.clone(),
                release_date: d.release_date,
                windows: d.windows,
                mac: d.mac,
                linux: d.linux,
                developer: d.developer.clone(),
                publisher: d.publisher.clone(),
                price_cents: d.price_cents,
                reviews_total: reviews.map(|r| r.reviews_total),
                positive: stats.map(|s| s.positive),
                negative: stats.map(|s| s.negative),
                playtime_mean: stats.map(|s| s.playtime_mean),
                playtime_median: stats.map(|s| s.playtime_median),
                mean_price,
                peak_launch: player.peak_launch,
                peak_year_mean: player.peak_year_mean,
                owners,
                revenue,
            }
        })
        .collect();

    // --- Review counts, ordered for stable diffs ---
    let mut review_rows: Vec<(AppId, ReviewSummary)> =
        store.reviews.iter().map(|(appid, r)| (*appid, *r)).collect();
    review_rows.sort_by_key(|(appid, _)| *appid);

    // --- Community tags, long form, ordered for stable diffs ---
    let mut tag_rows: Vec<(AppId, Vec<(String, u64)>)> = spy
        .iter()
        .filter(|(_, s)| !s.tags.is_empty())
        .map(|(appid, s)| {
            let mut tags: Vec<(String, u64)> = s.tags.iter().map(|(t, v)| (t.clone(), *v)).collect();
            tags.sort();
            (*appid, tags)
        })
        .collect();
    tag_rows.sort_by_key(|(appid, _)| *appid);

    std::fs::create_dir_all(&cfg.data_dir)?;
    output::write_summary(&cfg.data_dir.join("summary.csv"), &rows)?;
    output::write_price_months(&cfg.data_dir.join("price_months.csv"), &price_months)?;
    output::write_player_months(&cfg.data_dir.join("player_months.csv"), &player_months)?;
    output::write_reviews(&cfg.data_dir.join("reviews.csv"), &review_rows)?;
    output::write_tags(&cfg.data_dir.join("tags.csv"), &tag_rows)?;

    info!(
        games = rows.len(),
        price_series = price_months.len(),
        player_series = player_months.len(),
        "run complete, outputs in {}",
        cfg.data_dir.display()
    );
    Ok(())
}

struct StoreData {
    games: Vec<AppDetails>,
    reviews: HashMap<AppId, ReviewSummary>,
    players: Vec<(AppId, Option<Vec<PlayerMonth>>)>,
}

/// Details for the whole catalog, then review summaries for the released
/// games, then player history for the games that cleared the review
/// threshold. All three batches share the store's basket parameters except
/// the player site, which has its own.
async fn store_chain(
    cfg: &Config,
    client: &reqwest::Client,
    clock: &Arc<dyn Clock>,
    cancel: &CancelToken,
    multi: &MultiProgress,
    all_ids: &[AppId],
) -> Result<StoreData> {
    let mut basket = Basket::new(DETAILS_LABEL, cfg.store_basket, Arc::clone(clock));
    let progress = progress::batch_sink(multi, DETAILS_LABEL, all_ids.len());
    let details = collect_batch(DETAILS_LABEL, all_ids, &mut basket, cancel, progress.as_ref(), |id| {
        steam::fetch_details(client, cfg, id)
    })
    .await?;
    progress.finish();

    let games: Vec<AppDetails> = details
        .payloads()
        .into_iter()
        .map(|(_, d)| d)
        .filter(|d| d.is_released_game())
        .collect();
    let game_ids: Vec<AppId> = games.iter().map(|d| d.appid).collect();
    info!("{} of {} catalog apps are released games", game_ids.len(), all_ids.len());

    let mut basket = Basket::new(REVIEWS_LABEL, cfg.store_basket, Arc::clone(clock));
    let progress = progress::batch_sink(multi, REVIEWS_LABEL, game_ids.len());
    let reviews_batch = collect_batch(REVIEWS_LABEL, &game_ids, &mut basket, cancel, progress.as_ref(), |id| {
        steam::fetch_review_summary(client, cfg, id)
    })
    .await?;
    progress.finish();
    let reviews: HashMap<AppId, ReviewSummary> = reviews_batch.payloads().into_iter().collect();

    // Player history only for games with an audience worth tracking.
    let eligible: Vec<AppId> = game_ids
        .iter()
        .copied()
        .filter(|id| {
            reviews.get(id).is_some_and(|r| r.reviews_total >= cfg.min_reviews_for_players)
        })
        .collect();
    let release_dates: HashMap<AppId, Option<NaiveDate>> =
        games.iter().map(|d| (d.appid, d.release_date)).collect();

    let mut basket = Basket::new(PLAYERS_LABEL, cfg.player_basket, Arc::clone(clock));
    let progress = progress::batch_sink(multi, PLAYERS_LABEL, eligible.len());
    let players_batch = collect_batch(PLAYERS_LABEL, &eligible, &mut basket, cancel, progress.as_ref(), |id| {
        players::fetch_player_history(client, cfg, id)
    })
    .await?;
    progress.finish();

    let players = players_batch
        .rows
        .into_iter()
        .map(|(appid, months)| {
            let window = months
                .map(|m| players::release_window(m, release_dates.get(&appid).copied().flatten()));
            (appid, window)
        })
        .collect();

    Ok(StoreData { games, reviews, players })
}

async fn spy_batch(
    cfg: &Config,
    client: &reqwest::Client,
    clock: &Arc<dyn Clock>,
    cancel: &CancelToken,
    multi: &MultiProgress,
    all_ids: &[AppId],
) -> Result<HashMap<AppId, SpyStats>> {
    let mut basket = Basket::new(STEAMSPY_LABEL, cfg.steamspy_basket, Arc::clone(clock));
    let progress = progress::batch_sink(multi, STEAMSPY_LABEL, all_ids.len());
    let batch = collect_batch(STEAMSPY_LABEL, all_ids, &mut basket, cancel, progress.as_ref(), |id| {
        steamspy::fetch_spy_stats(client, cfg, id)
    })
    .await?;
    progress.finish();
    Ok(batch.payloads().into_iter().collect())
}

async fn price_batch(
    cfg: &Config,
    client: &reqwest::Client,
    clock: &Arc<dyn Clock>,
    cancel: &CancelToken,
    multi: &MultiProgress,
    all_ids: &[AppId],
) -> Result<Vec<(AppId, Vec<PricePoint>)>> {
    let mut basket = Basket::new(PRICES_LABEL, cfg.price_basket, Arc::clone(clock));
    let progress = progress::batch_sink(multi, PRICES_LABEL, all_ids.len());
    let batch = collect_batch(PRICES_LABEL, all_ids, &mut basket, cancel, progress.as_ref(), |id| {
        prices::fetch_price_history(client, cfg, id)
    })
    .await?;
    progress.finish();
    Ok(batch.payloads())
}
