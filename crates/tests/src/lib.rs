//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 配置 -> EventManager -> broker -> bridge 的 e2e 测试
//! - 注册表在并发修改下的行为

#[cfg(test)]
mod contract_tests {
    use contracts::Event;
    use serde_json::json;

    #[test]
    fn test_event_wire_format() {
        let event = Event::new("order.created", json!({ "id": 42 }));
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["name"], "order.created");
        assert_eq!(value["payload"]["id"], 42);
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_minimal_event_gets_defaults() {
        let event: Event = serde_json::from_str(r#"{"name":"ping"}"#).unwrap();
        assert_eq!(event.name(), "ping");
        assert!(event.payload().is_null());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use broker::{publish_event, BrokerChannel, EventBridge, InMemoryBroker};
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{Event, EventHandler, HandlerRef};
    use event_manager::{register_from_config, EventManager};
    use serde_json::json;

    /// Records every event it sees
    struct Recorder {
        name: String,
        seen: Mutex<Vec<Event>>,
    }

    impl Recorder {
        fn new(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<Event> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EventHandler for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        async fn handle(&self, event: &Event) {
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.seen.lock().unwrap().push(event.clone());
        }
    }

    /// Register A and B, dispatch, remove A, dispatch again
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_order_created_scenario() {
        let manager = EventManager::new();
        let a = Recorder::new("A");
        let b = Recorder::new("B");
        let a_ref = HandlerRef::from_arc(a.clone());
        let b_ref = HandlerRef::from_arc(b.clone());

        manager.register("order.created", a_ref.clone()).unwrap();
        manager.register("order.created", b_ref.clone()).unwrap();

        let event = Event::new("order.created", json!({ "id": 42 }));
        let outcome = manager.dispatch(event.clone()).await;

        // The barrier: both handlers are done when dispatch returns
        assert_eq!(outcome.handlers, 2);
        assert_eq!(a.seen(), vec![event.clone()]);
        assert_eq!(b.seen(), vec![event.clone()]);

        assert!(manager.has("order.created", &a_ref));
        manager.remove("order.created", &a_ref);
        assert!(!manager.has("order.created", &a_ref));

        manager.dispatch(event.clone()).await;
        assert_eq!(a.seen().len(), 1);
        assert_eq!(b.seen().len(), 2);
    }

    /// Config file -> handlers -> broker -> bridge -> journal file
    #[tokio::test]
    async fn test_e2e_config_to_journal() {
        let dir = tempfile::tempdir().unwrap();
        let journal = dir.path().join("out").join("orders.jsonl");
        let config_path = dir.path().join("events.toml");
        std::fs::write(
            &config_path,
            format!(
                r#"
[broker]
queue = "orders"
capacity = 2

[[handlers]]
name = "audit"
handler_type = "log"

[[handlers]]
name = "journal"
handler_type = "file"
params = {{ path = "{}" }}

[[subscriptions]]
event = "order.created"
handlers = ["audit", "journal"]

[[subscriptions]]
event = "order.cancelled"
handlers = ["journal"]
"#,
                journal.display()
            ),
        )
        .unwrap();

        let app = ConfigLoader::load_from_path(&config_path).unwrap();
        let manager = Arc::new(EventManager::new());
        assert_eq!(register_from_config(&manager, &app).unwrap(), 3);

        let broker = InMemoryBroker::from_config(&app.broker);
        let connection = broker.connect();
        let channel = connection.open_channel().unwrap();
        let consumer = channel.consume(&app.broker.queue).unwrap();

        let bridge = EventBridge::new(Arc::clone(&manager));
        let bridge_handle = tokio::spawn(async move { bridge.run(consumer).await });

        for id in 0..5 {
            let event = Event::new("order.created", json!({ "id": id }));
            publish_event(&channel, "orders", &event).await.unwrap();
        }
        publish_event(&channel, "orders", &Event::new("order.cancelled", json!({ "id": 0 })))
            .await
            .unwrap();
        publish_event(&channel, "orders", &Event::new("order.shipped", json!(null)))
            .await
            .unwrap();
        channel.close_queue("orders");

        let stats = tokio::time::timeout(Duration::from_secs(5), bridge_handle)
            .await
            .expect("bridge did not finish")
            .unwrap();

        assert_eq!(stats.received, 7);
        assert_eq!(stats.dispatched, 7);
        assert_eq!(stats.rejected, 0);
        assert_eq!(stats.dispatch.unrouted_events, 1);
        assert_eq!(broker.stats().acked(), 7);

        let metrics = manager.metrics().snapshot();
        assert_eq!(metrics.registrations, 3);
        assert_eq!(metrics.handler_invocations, 11);

        let lines = std::fs::read_to_string(&journal).unwrap();
        let names: Vec<String> = lines
            .lines()
            .map(|l| serde_json::from_str::<Event>(l).unwrap().name().to_string())
            .collect();
        assert_eq!(names.len(), 6);
        assert_eq!(names.last().map(String::as_str), Some("order.cancelled"));
    }

    /// Publishing after the connection is closed fails; nothing is dispatched
    #[tokio::test]
    async fn test_closed_connection_stops_the_flow() {
        let manager = Arc::new(EventManager::new());
        let broker = InMemoryBroker::new(8);
        let connection = broker.connect();
        let channel = connection.open_channel().unwrap();
        let consumer = channel.consume("events").unwrap();
        let bridge = EventBridge::new(Arc::clone(&manager));

        connection.close();

        let result = channel.publish("events", b"{}".to_vec().into()).await;
        assert!(result.is_err());

        let stats = bridge.run(consumer).await;
        assert_eq!(stats.received, 0);
        assert_eq!(manager.metrics().dispatch_count(), 0);
    }

    /// Handlers added and removed from inside other handlers while events flow
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_registry_mutation_during_dispatch() {
        struct Churn {
            manager: Arc<EventManager>,
            victim: HandlerRef,
            calls: AtomicUsize,
        }

        #[async_trait]
        impl EventHandler for Churn {
            fn name(&self) -> &str {
                "churn"
            }

            async fn handle(&self, event: &Event) {
                self.calls.fetch_add(1, Ordering::SeqCst);
                if self.manager.has(event.name(), &self.victim) {
                    self.manager.remove(event.name(), &self.victim);
                } else {
                    let _ = self.manager.register(event.name(), self.victim.clone());
                }
            }
        }

        let manager = Arc::new(EventManager::new());
        let victim = Recorder::new("victim");
        let victim_ref = HandlerRef::from_arc(victim.clone());
        let churn = Arc::new(Churn {
            manager: Arc::clone(&manager),
            victim: victim_ref.clone(),
            calls: AtomicUsize::new(0),
        });
        manager
            .register("tick", HandlerRef::from_arc(churn.clone()))
            .unwrap();

        let mut tasks = Vec::new();
        for i in 0..20 {
            let manager = Arc::clone(&manager);
            tasks.push(tokio::spawn(async move {
                manager.dispatch(Event::new("tick", json!(i))).await
            }));
        }
        for task in tasks {
            let outcome = task.await.unwrap();
            assert!(outcome.handlers >= 1 && outcome.handlers <= 2);
            assert_eq!(outcome.panicked, 0);
        }

        assert_eq!(churn.calls.load(Ordering::SeqCst), 20);
        // The churn handler never appears twice, whatever the interleaving
        let handlers = manager.handlers("tick");
        assert!(handlers.len() <= 2);
        assert!(victim.seen().len() <= 20);
    }
}
