// Bus message in, query through the real API router, republish out.

use std::sync::Arc;

use tokio::sync::watch;

use newswire::api;
use newswire::bridge::{
    Bridge, BusConsumer, BusProducer, ChannelBus, HttpQueryClient, QueryClient, RouterClient,
};
use newswire::domain::Article;
use newswire::store::{ArticleStore, SharedStore, SqliteStore};

const TOPICS: [&str; 4] = ["news_detail", "news_list", "news_filtered", "news_filtered_date"];

fn store_with(count: i64) -> SharedStore {
    let store = SqliteStore::in_memory().unwrap();
    for i in 1..=count {
        let article = Article::new(
            format!("Item {}", i),
            format!("Body {}", i),
            i * 10,
            format!("https://news.example/{}", i),
        )
        .with_preview();
        store.insert(&article).unwrap();
    }
    Arc::new(store)
}

#[tokio::test]
async fn detail_path_is_republished_once_to_first_topic() {
    let store = store_with(42);
    let router = api::router(store);
    let client = Arc::new(RouterClient::new(router.clone()));
    let expected = client.get("/newsdetail/42").await.unwrap();
    assert!(expected.is_success());

    let bus = Arc::new(ChannelBus::new(16));
    let input = bus.subscribe("news_input").unwrap();
    let mut outbound: Vec<_> = TOPICS.iter().map(|t| bus.subscribe(t).unwrap()).collect();

    let bridge = Bridge::new(
        Box::new(input),
        bus.clone(),
        client,
        TOPICS.map(String::from),
    );
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    bus.publish("news_input", b"/newsdetail/42".to_vec()).await.unwrap();
    bus.close("news_input").unwrap();
    let report = bridge.run(shutdown_rx).await;
    assert_eq!(report.received, 1);
    assert_eq!(report.republished, 1);

    for topic in TOPICS {
        bus.close(topic).unwrap();
    }

    let detail = outbound[0].recv().await.unwrap();
    assert_eq!(detail.topic, "news_detail");
    assert_eq!(detail.payload, expected.body);
    assert!(outbound[0].recv().await.is_none());

    for other in outbound.iter_mut().skip(1) {
        assert!(other.recv().await.is_none());
    }
}

#[tokio::test]
async fn each_route_reaches_its_topic_and_unknown_paths_are_dropped() {
    let router = api::router(store_with(3));
    let bus = Arc::new(ChannelBus::new(16));
    let input = bus.subscribe("news_input").unwrap();
    let mut outbound: Vec<_> = TOPICS.iter().map(|t| bus.subscribe(t).unwrap()).collect();

    let bridge = Bridge::new(
        Box::new(input),
        bus.clone(),
        Arc::new(RouterClient::new(router)),
        TOPICS.map(String::from),
    );
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    for path in [
        "/newslist/filtered/date/?date=20",
        "/newslist/filtered/?s=item&page=1",
        "/metrics",
        "/newslist/?n=2&page=1",
        "/newsdetail/1",
    ] {
        bus.publish("news_input", path.as_bytes().to_vec()).await.unwrap();
    }
    bus.close("news_input").unwrap();

    let report = bridge.run(shutdown_rx).await;
    assert_eq!(report.received, 5);
    assert_eq!(report.republished, 4);
    assert_eq!(report.dropped, 1);

    for (i, consumer) in outbound.iter_mut().enumerate() {
        let message = consumer.recv().await.unwrap();
        assert_eq!(message.topic, TOPICS[i]);
        assert!(!message.payload.is_empty());
    }
}

#[tokio::test]
async fn error_responses_are_still_republished() {
    let router = api::router(store_with(1));
    let bus = Arc::new(ChannelBus::new(16));
    let input = bus.subscribe("news_input").unwrap();
    let mut detail = bus.subscribe(TOPICS[0]).unwrap();

    let bridge = Bridge::new(
        Box::new(input),
        bus.clone(),
        Arc::new(RouterClient::new(router)),
        TOPICS.map(String::from),
    );
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    bus.publish("news_input", b"/newsdetail/999".to_vec()).await.unwrap();
    bus.close("news_input").unwrap();
    bridge.run(shutdown_rx).await;

    let message = detail.recv().await.unwrap();
    assert_eq!(message.payload, api::NOT_FOUND_TEXT.as_bytes());
}

#[tokio::test]
async fn bridge_runs_as_its_own_task() {
    let router = api::router(store_with(2));
    let bus = Arc::new(ChannelBus::new(16));
    let input = bus.subscribe("news_input").unwrap();
    let mut list = bus.subscribe(TOPICS[1]).unwrap();

    let bridge = Bridge::new(
        Box::new(input),
        bus.clone(),
        Arc::new(RouterClient::new(router)),
        TOPICS.map(String::from),
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(bridge.run(shutdown_rx));

    bus.publish("news_input", b"/newslist/?n=2&page=1".to_vec()).await.unwrap();
    let message = list.recv().await.unwrap();
    assert_eq!(message.topic, "news_list");

    shutdown_tx.send(true).unwrap();
    let report = handle.await.unwrap();
    assert_eq!(report.received, 1);
    assert_eq!(report.republished, 1);
}

#[tokio::test]
async fn http_client_bridges_a_served_api() {
    let router = api::router(store_with(3));
    let in_process = RouterClient::new(router.clone()).get("/newsdetail/2").await.unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move { axum::serve(listener, router).await });

    let bus = Arc::new(ChannelBus::new(16));
    let input = bus.subscribe("news_input").unwrap();
    let mut detail = bus.subscribe(TOPICS[0]).unwrap();
    let client = HttpQueryClient::new(&format!("http://{}/", addr)).unwrap();

    let bridge = Bridge::new(Box::new(input), bus.clone(), Arc::new(client), TOPICS.map(String::from));
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    bus.publish("news_input", b"/newsdetail/2".to_vec()).await.unwrap();
    bus.close("news_input").unwrap();
    let report = bridge.run(shutdown_rx).await;
    assert_eq!(report.republished, 1);

    let message = detail.recv().await.unwrap();
    assert_eq!(message.payload, in_process.body);
    server.abort();
}
