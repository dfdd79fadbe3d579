use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use futures::future::join_all;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

use crate::api;
use crate::app::{AppContext, NewswireError, Result};
use crate::bridge::{
    Bridge, BusConsumer, BusProducer, ChannelBus, HttpQueryClient, QueryClient, RouterClient,
};
use crate::config::format_interval;
use crate::domain::{Article, PageEnvelope};
use crate::pipeline::{Batch, FeedPoller, IngestionWriter, Pipeline, PipelineStats};
use crate::query;

const BUS_CAPACITY: usize = 64;

/// Poll each source once, concurrently, and write the batches in source order.
pub async fn update_sources(ctx: &AppContext) -> Result<()> {
    let sources = ctx.config.source_descriptors();

    if sources.is_empty() {
        println!("No sources configured");
        return Ok(());
    }

    println!("Updating {} sources...", sources.len());

    let polls = sources.into_iter().map(|source| {
        let mut poller = FeedPoller::new(source, ctx.fetcher.clone(), ctx.normalizer.clone());
        async move {
            let url = poller.source().url.clone();
            (url, poller.poll_once().await)
        }
    });
    let results = join_all(polls).await;

    let writer = IngestionWriter::new(ctx.store.clone(), Arc::new(PipelineStats::default()));
    let mut total_new = 0;
    let mut errors = 0;

    for (source, result) in results {
        let articles = match result {
            Ok(articles) => articles,
            Err(e) => {
                errors += 1;
                eprintln!("  Error polling {}: {}", source, e);
                continue;
            }
        };

        match writer.write_batch(Batch {
            source: source.clone(),
            articles,
        }) {
            Ok(outcome) => {
                total_new += outcome.inserted;
                println!(
                    "  {}: {} new, {} already stored",
                    source, outcome.inserted, outcome.duplicates
                );
            }
            Err(e) => {
                errors += 1;
                eprintln!("  Error storing {}: {}", source, e);
            }
        }
    }

    println!("Update complete: {} new articles, {} errors", total_new, errors);
    Ok(())
}

pub fn list_articles(ctx: &AppContext, count: i64, page: i64) -> Result<()> {
    let envelope = query::list(ctx.store.as_ref(), count, page)?;
    print_page(&envelope);
    Ok(())
}

pub fn search_articles(ctx: &AppContext, text: &str, page: i64) -> Result<()> {
    let envelope = query::filter_by_content(ctx.store.as_ref(), text, page)?;
    print_page(&envelope);
    Ok(())
}

fn print_page(envelope: &PageEnvelope) {
    if envelope.results.is_empty() {
        println!("No articles");
    }
    for article in &envelope.results {
        print_article(article);
    }
    println!(
        "Page {}/{} ({} results)",
        envelope.current_page, envelope.total_pages, envelope.total_results
    );
}

fn print_article(article: &Article) {
    let date = DateTime::from_timestamp(article.published, 0)
        .filter(|_| article.published > 0)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "          ".to_string());

    println!("{:>6} {} {}", article.id, date, article.title);
    if !article.preview.is_empty() {
        println!("       {}", article.preview);
    }
}

/// Run the pipeline, the HTTP API and the bridge until SIGINT/SIGTERM.
///
/// With `api_base`, the bridge queries that API over HTTP rather than this process's router.
pub async fn serve(
    ctx: AppContext,
    interval: Option<Duration>,
    stdin_bus: bool,
    api_base: Option<&str>,
) -> Result<()> {
    let config = &ctx.config;
    let addr = config.bind_addr().map_err(|e| NewswireError::Config(e.to_string()))?;

    let every = interval.unwrap_or_else(|| config.interval());
    let sources = config.source_descriptors_every(every);
    if sources.is_empty() {
        tracing::warn!("no sources configured, serving stored articles only");
    } else {
        tracing::info!(interval = %format_interval(every.as_secs()), "polling every source");
    }

    let pipeline = Pipeline::start(
        sources,
        ctx.fetcher.clone(),
        ctx.store.clone(),
        config.pipeline_config(),
    );
    tracing::info!(sources = pipeline.source_count(), "pipeline started");

    let router = api::router(ctx.store.clone());

    let bus = Arc::new(ChannelBus::new(BUS_CAPACITY));
    let input = bus.subscribe(&config.bus.input_channel)?;
    let topics = config.topics();
    for topic in &topics {
        let mut outbound = bus.subscribe(topic)?;
        tokio::spawn(async move {
            while let Some(message) = outbound.recv().await {
                tracing::info!(topic = %message.topic, bytes = message.payload.len(), "outbound message");
            }
        });
    }

    let client: Arc<dyn QueryClient + Send + Sync> = match api_base {
        Some(base) => {
            tracing::info!(base, "bridge queries go over HTTP");
            Arc::new(HttpQueryClient::new(base)?)
        }
        None => Arc::new(RouterClient::new(router.clone())),
    };

    let (bridge_shutdown, bridge_shutdown_rx) = watch::channel(false);
    let bridge = Bridge::new(Box::new(input), bus.clone(), client, topics);
    let bridge = tokio::spawn(bridge.run(bridge_shutdown_rx));

    if stdin_bus {
        tokio::spawn(feed_bus_from_stdin(bus.clone(), config.bus.input_channel.clone()));
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "query API listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down");
    let _ = bridge_shutdown.send(true);
    if let Err(e) = bridge.await {
        tracing::error!("Bridge join error: {}", e);
    }
    pipeline.shutdown().await;

    Ok(())
}

async fn feed_bus_from_stdin(bus: Arc<ChannelBus>, channel: String) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) => {
                if let Err(e) = bus.publish(&channel, line.into_bytes()).await {
                    tracing::warn!(error = %e, "could not queue bridge input");
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "stdin read failed");
                break;
            }
        }
    }
    tracing::debug!("stdin bus input closed");
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {},
                    _ = sigint.recv() => {},
                }
            }
            _ => {
                tracing::warn!("signal handlers unavailable, falling back to ctrl-c");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
