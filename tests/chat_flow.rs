//! End-to-end chat flow over the in-memory transport.
//!
//! A message posted through the API reaches live subscribers; `/stock=`
//! commands travel to the stock bot and its answer comes back into the room.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::json;

use common::{create_test_server, Broken, Recorder};
use finchat::bot::{QuoteSource, StockBot};
use finchat::config::BotConfig;
use finchat::db::{MessageRepository, RoomRepository};
use finchat::messenger::{Envelope, MemoryTransport};
use finchat::{ChatError, CommandMessageHandler, CommandMessenger, QueueTransport, Result};

struct FixedQuotes;

#[async_trait]
impl QuoteSource for FixedQuotes {
    async fn quote(&self, symbol: &str) -> Result<String> {
        match symbol {
            "AAPL" => Ok("183.38".to_string()),
            _ => Err(ChatError::Quote("no data for symbol".to_string())),
        }
    }
}

#[tokio::test]
async fn test_stock_command_round_trip() {
    let (server, db, hub) = create_test_server().await;
    let room = RoomRepository::new(db.pool()).create("stocks").await.unwrap();

    let transport = Arc::new(MemoryTransport::new());
    let messenger = CommandMessenger::new(transport.clone(), "req_queue", "resp_queue");
    let handler = Arc::new(
        CommandMessageHandler::new(
            messenger.clone(),
            hub.clone(),
            db.clone(),
            &BotConfig::default(),
        )
        .await
        .unwrap(),
    );
    hub.add_subscriber(handler.clone());

    let bot = StockBot::new(Arc::new(FixedQuotes), transport.clone(), "req_queue", "resp_queue");
    tokio::spawn(async move { bot.run().await });

    let responder = handler.clone();
    tokio::spawn(async move {
        messenger
            .run_response_loop(move |response| {
                let handler = responder.clone();
                async move { handler.on_command_response(response).await }
            })
            .await
    });

    let watcher = Recorder::new("watcher");
    hub.add_subscriber(watcher.clone());

    server
        .post(&format!("/api/rooms/{}/messages", room.id))
        .json(&json!({ "username": "alice", "text": "/stock=AAPL" }))
        .await
        .assert_status(StatusCode::CREATED);

    let received = watcher.wait_for(2).await;
    assert_eq!(received[0].text, "/stock=AAPL");
    assert_eq!(received[0].username, "alice");
    assert_eq!(received[1].text, "AAPL quote is $183.38 per share");
    assert_eq!(received[1].username, "Bot");
    assert_eq!(received[1].room_id, room.id);

    let stored = MessageRepository::new(db.pool())
        .list_recent(room.id, 10)
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[1].user_id, handler.bot_user().id);
}

#[tokio::test]
async fn test_responses_reach_their_own_rooms() {
    let (_server, db, hub) = create_test_server().await;
    let rooms = RoomRepository::new(db.pool());
    let room_one = rooms.create("one").await.unwrap();
    let room_two = rooms.create("two").await.unwrap();

    let transport = Arc::new(MemoryTransport::new());
    let messenger = CommandMessenger::new(transport.clone(), "req", "resp");
    let handler = Arc::new(
        CommandMessageHandler::new(
            messenger.clone(),
            hub.clone(),
            db.clone(),
            &BotConfig::default(),
        )
        .await
        .unwrap(),
    );

    let watcher = Recorder::new("watcher");
    hub.add_subscriber(watcher.clone());

    transport
        .publish("resp", Envelope::new(room_two.id.to_string(), "for two"))
        .await
        .unwrap();
    transport
        .publish("resp", Envelope::new(room_one.id.to_string(), "for one"))
        .await
        .unwrap();
    transport.close("resp");

    let result = messenger
        .run_response_loop(|response| {
            let handler = handler.clone();
            async move { handler.on_command_response(response).await }
        })
        .await;
    assert!(matches!(result, Err(ChatError::Transport(_))));

    let received = watcher.wait_for(2).await;
    assert_eq!(received[0].room_id, room_two.id);
    assert_eq!(received[0].text, "for two");
    assert_eq!(received[1].room_id, room_one.id);
    assert_eq!(received[1].text, "for one");
}

#[tokio::test]
async fn test_broken_subscriber_evicted_others_unaffected() {
    let (server, db, hub) = create_test_server().await;
    let room = RoomRepository::new(db.pool()).create("general").await.unwrap();
    let path = format!("/api/rooms/{}/messages", room.id);

    let healthy = Recorder::new("healthy");
    hub.add_subscriber(healthy.clone());
    hub.add_subscriber(Arc::new(Broken("broken")));

    for text in ["first", "second"] {
        server
            .post(&path)
            .json(&json!({ "username": "carol", "text": text }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let received = healthy.wait_for(2).await;
    let texts: Vec<&str> = received.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second"]);
    assert_eq!(hub.subscriber_ids().await, vec!["healthy".to_string()]);
}
